//! Selection orchestration.

use crate::config::{self, PlotConfig, SelectionConfig};
use anyhow::{Context, Result};
use lib_bead::{
    ArchiveStore, Catalog, ComponentCurve, CurveSummary, DirectoryStore, ScanReport,
    SelectionCriteria, SelectionEngine,
};
use lib_touchstone::TouchstoneDocument;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Selection orchestrator.
pub struct Orchestrator {
    config: SelectionConfig,
    engine: SelectionEngine<DirectoryStore>,
}

impl Orchestrator {
    /// Load the catalog and open the archive root.
    pub fn new(config: SelectionConfig) -> Result<Self> {
        let catalog = config::load_catalog(config.catalog.as_deref())?;
        let store = DirectoryStore::new(&config.archive_root);
        tracing::info!(
            "{} archives under {:?}",
            catalog.len(),
            store.root()
        );

        Ok(Self {
            engine: SelectionEngine::new(catalog, store),
            config,
        })
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Run the selection.
    pub fn run(&self) -> Result<SelectionResults> {
        let criteria = self.config.criteria();
        let report = self.engine.scan(&criteria);

        let summaries = report.curves.iter().map(ComponentCurve::summary).collect();
        Ok(SelectionResults {
            criteria,
            plot: self.config.plot.clone(),
            report,
            summaries,
        })
    }
}

/// Everything the output stage needs.
pub struct SelectionResults {
    pub criteria: SelectionCriteria,
    pub plot: PlotConfig,
    pub report: ScanReport,
    /// One per curve, in result order.
    pub summaries: Vec<CurveSummary>,
}

/// One catalog archive and whether it is available locally.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArchiveStatus {
    pub location: String,
    pub vendor: String,
    pub present: bool,
    pub url: Option<String>,
    pub sizes: Vec<String>,
}

/// Availability of every archive in the catalog.
pub fn catalog_status(catalog: &Catalog, store: &impl ArchiveStore) -> Vec<ArchiveStatus> {
    catalog
        .entries()
        .iter()
        .map(|entry| ArchiveStatus {
            location: entry.location.clone(),
            vendor: entry.convention.vendor().to_string(),
            present: store.contains(&entry.location),
            url: entry.download_url(),
            sizes: entry.convention.size_codes().keys().cloned().collect(),
        })
        .collect()
}

/// Load the catalog named on the command line and report its archives.
pub fn list_catalog(catalog: Option<&Path>, archive_root: &Path) -> Result<Vec<ArchiveStatus>> {
    let catalog = config::load_catalog(catalog)?;
    let store = DirectoryStore::new(archive_root);
    Ok(catalog_status(&catalog, &store))
}

/// Parse one measurement file.
pub fn load_curve(path: &Path) -> Result<(TouchstoneSummary, ComponentCurve)> {
    let mut document = TouchstoneDocument::open(path)
        .with_context(|| format!("Failed to open Touchstone file: {:?}", path))?;

    let header = document
        .header()
        .with_context(|| format!("Failed to parse Touchstone file: {:?}", path))?
        .map(ToString::to_string);
    let points = document.points()?;
    let summary = TouchstoneSummary {
        file: path.to_path_buf(),
        option_line: header,
        points: points.len(),
        ports: points.first().map(|p| p.port_count()),
        frequency_range: points
            .first()
            .zip(points.last())
            .map(|(first, last)| (first.frequency.0, last.frequency.0)),
    };

    let curve = ComponentCurve::build(document)?;
    Ok((summary, curve))
}

/// File level facts of a measurement file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TouchstoneSummary {
    pub file: PathBuf,
    pub option_line: Option<String>,
    pub points: usize,
    pub ports: Option<usize>,
    /// First and last frequency in Hz, in file order.
    pub frequency_range: Option<(f64, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::units::Bounds;
    use std::fs;
    use std::io::Write;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bead-cli-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    // 330 ohm resistive bead from 10 MHz up, inductive below
    const BEAD: &str = "# MHZ S RI R 50
1 0.0238 0.0952 0.9762 -0.0952 0.9762 -0.0952 0.0238 0.0952
10 0.7674 0 0.2326 0 0.2326 0 0.7674 0
100 0.7674 0 0.2326 0 0.2326 0 0.7674 0
";

    #[test]
    fn test_run_on_extracted_archive() {
        let root = scratch_dir("run");
        fs::create_dir_all(root.join("blm18-s-v17")).unwrap();
        fs::write(root.join("blm18-s-v17").join("BLM18AG331SN1.s2p"), BEAD).unwrap();

        let mut config = SelectionConfig::new("0603", Bounds::new(270.0, 360.0));
        config.archive_root = root.clone();

        let orchestrator = Orchestrator::new(config).unwrap();
        let results = orchestrator.run().unwrap();

        assert_eq!(results.report.curves.len(), 1);
        assert_eq!(results.summaries[0].name, "BLM18AG331SN1");
        assert_eq!(results.report.archives_scanned, 1);
        // every other 0603 archive of the built-in catalog is missing
        assert!(!results.report.warnings.is_empty());

        let status = list_catalog(None, &root).unwrap();
        let present: Vec<_> = status.iter().filter(|s| s.present).collect();
        assert_eq!(present.len(), 1);
        assert_eq!(present[0].location, "blm18-s-v17.zip");
        assert_eq!(present[0].vendor, "murata");
        assert!(present[0].sizes.contains(&"0603".to_string()));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_run_on_downloaded_zip() {
        let root = scratch_dir("zip");
        let file = fs::File::create(root.join("blm18-s-v17.zip")).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for name in ["BLM18AG331SN1.s2p", "BLM18AG102SN1.s2p"] {
            writer
                .start_file(name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(BEAD.as_bytes()).unwrap();
        }
        writer.finish().unwrap();

        let mut config = SelectionConfig::new("0603", Bounds::new(270.0, 360.0));
        config.archive_root = root.clone();
        let results = Orchestrator::new(config).unwrap().run().unwrap();

        // the 1 kohm code is filtered by name before it is opened
        assert_eq!(results.report.members_parsed, 1);
        assert_eq!(results.summaries.len(), 1);
        assert_eq!(results.summaries[0].name, "BLM18AG331SN1");

        let status = list_catalog(None, &root).unwrap();
        assert_eq!(status.iter().filter(|s| s.present).count(), 1);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_curve() {
        let root = scratch_dir("load");
        let path = root.join("BLM18AG331SN1.s2p");
        fs::write(&path, BEAD).unwrap();

        let (summary, curve) = load_curve(&path).unwrap();
        assert_eq!(summary.points, 3);
        assert_eq!(summary.ports, Some(2));
        assert_eq!(summary.frequency_range, Some((1e6, 100e6)));
        assert_eq!(summary.option_line.as_deref(), Some("# MHZ S RI R 50"));
        assert_eq!(curve.name(), "BLM18AG331SN1");
        assert_eq!(curve.len(), 3);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_curve_reports_parse_failure() {
        let root = scratch_dir("bad");
        let path = root.join("bad.s1p");
        fs::write(&path, "1 0 0\n").unwrap();

        let err = load_curve(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse Touchstone file"));

        fs::remove_dir_all(&root).unwrap();
    }
}
