//! Parameter file loading and validation.

use anyhow::{Context, Result};
use lib_bead::{Catalog, CatalogConfig, SelectionCriteria};
use lib_types::units::Bounds;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to select and where to look.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Size class in inch: 0201, 0402, 0603, 0805, 1206.
    pub size: String,

    /// |Z| at 100 MHz, ohms.
    pub impedance: Bounds,

    /// L at 1 MHz, henries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inductance: Option<Bounds>,

    /// Catalog file; the built-in vendor catalog when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// Directory the archive locations are relative to.
    #[serde(default = "default_archive_root")]
    pub archive_root: PathBuf,

    #[serde(default)]
    pub plot: PlotConfig,
}

fn default_archive_root() -> PathBuf { PathBuf::from("sparam") }

impl SelectionConfig {
    pub fn new(size: impl Into<String>, impedance: Bounds) -> Self {
        Self {
            size: size.into(),
            impedance,
            inductance: None,
            catalog: None,
            archive_root: default_archive_root(),
            plot: PlotConfig::default(),
        }
    }

    pub fn criteria(&self) -> SelectionCriteria {
        SelectionCriteria {
            size_class: self.size.clone(),
            impedance: self.impedance,
            inductance: self.inductance,
        }
    }

    /// Make relative paths relative to `base` (the parameter file's directory).
    fn resolve_paths(&mut self, base: &Path) {
        if self.archive_root.is_relative() {
            self.archive_root = base.join(&self.archive_root);
        }
        if let Some(catalog) = self.catalog.as_mut() {
            if catalog.is_relative() {
                *catalog = base.join(&*catalog);
            }
        }
    }
}

/// Diagram settings handed along with the plot series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Frequency axis limits in Hz.
    #[serde(default = "default_frequency_range")]
    pub frequency_range: Bounds,

    /// Lower limit of the ohm axis.
    #[serde(default = "default_min_resistance")]
    pub min_resistance: f64,

    #[serde(default)]
    pub scale: PlotScale,
}

fn default_frequency_range() -> Bounds { Bounds::new(1e6, 1e9) }
fn default_min_resistance() -> f64 { 1.0 }

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            frequency_range: default_frequency_range(),
            min_resistance: default_min_resistance(),
            scale: PlotScale::default(),
        }
    }
}

/// Axis scaling, x axis first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotScale {
    #[default]
    LogLog,
    LinLog,
    LogLin,
    LinLin,
}

impl PlotScale {
    /// `"log"` or `"linear"` for the frequency axis.
    pub fn x_axis(self) -> &'static str {
        match self {
            Self::LogLog | Self::LogLin => "log",
            Self::LinLog | Self::LinLin => "linear",
        }
    }

    /// `"log"` or `"linear"` for the ohm axis.
    pub fn y_axis(self) -> &'static str {
        match self {
            Self::LogLog | Self::LinLog => "log",
            Self::LogLin | Self::LinLin => "linear",
        }
    }
}

/// Load a TOML or JSON file, chosen by extension.
fn load_file<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {:?}", what, path))?;

    if path.extension().map_or(false, |e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as JSON", what))
    } else {
        // Assume TOML
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {} as TOML", what))
    }
}

/// Load a parameter file.
pub fn load_config(path: &Path) -> Result<SelectionConfig> {
    let mut config: SelectionConfig = load_file(path, "parameter")?;

    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load a catalog file, or the built-in catalog when `path` is `None`.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let catalog = match path {
        Some(path) => {
            let config: CatalogConfig = load_file(path, "catalog")?;
            Catalog::from_config(&config)
                .with_context(|| format!("Invalid catalog file: {:?}", path))?
        }
        None => Catalog::builtin().context("Invalid built-in catalog")?,
    };

    if catalog.is_empty() {
        tracing::warn!("Catalog has no archives");
    }
    Ok(catalog)
}

/// Validate configuration.
pub fn validate_config(config: &SelectionConfig) -> Result<()> {
    if config.size.trim().is_empty() {
        anyhow::bail!("Size class must not be empty");
    }

    validate_window(config.impedance, "Impedance")?;
    if let Some(inductance) = config.inductance {
        validate_window(inductance, "Inductance")?;
    }

    if let Some(ref catalog) = config.catalog {
        if !catalog.exists() {
            anyhow::bail!("Catalog file not found: {:?}", catalog);
        }
    }

    if !config.archive_root.is_dir() {
        tracing::warn!(
            "Archive directory {:?} does not exist, every archive will be reported missing",
            config.archive_root
        );
    }

    let plot = &config.plot;
    if plot.frequency_range.is_empty() {
        anyhow::bail!(
            "Plot frequency range is empty: [{}, {}]",
            plot.frequency_range.min,
            plot.frequency_range.max
        );
    }
    if plot.scale.x_axis() == "log" && plot.frequency_range.min <= 0.0 {
        anyhow::bail!("Logarithmic frequency axis needs a positive lower limit");
    }
    if plot.scale.y_axis() == "log" && plot.min_resistance <= 0.0 {
        anyhow::bail!("Logarithmic ohm axis needs a positive min_resistance");
    }

    Ok(())
}

fn validate_window(window: Bounds, label: &str) -> Result<()> {
    if window.is_empty() {
        anyhow::bail!("{} window is empty: [{}, {}]", label, window.min, window.max);
    }
    if window.min < 0.0 {
        anyhow::bail!("{} window must not be negative (got min={})", label, window.min);
    }
    Ok(())
}
