//! Report formatting and plot series output.

use crate::orchestrator::{ArchiveStatus, SelectionResults, TouchstoneSummary};
use crate::OutputFormat;
use anyhow::Result;
use lib_bead::{ComponentCurve, CurveSummary};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "u", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];
const UNIT_PREFIX: usize = 8;

/// Engineering notation: mantissa in `[1, 1000)` and an SI prefix, e.g.
/// `2.2e-6` is `"2.200u"`. `None` prints as `"None"`.
pub fn eng_format(value: Option<f64>, precision: usize) -> String {
    let Some(mut value) = value else {
        return "None".to_string();
    };
    if value == 0.0 || !value.is_finite() {
        return format!("{:.*}", precision, value);
    }

    let mut n = UNIT_PREFIX;
    while !(1.0..1000.0).contains(&value.abs()) {
        if value.abs() < 1.0 {
            if n == 0 {
                break;
            }
            n -= 1;
            value *= 1e3;
        } else {
            if n == SI_PREFIXES.len() - 1 {
                break;
            }
            n += 1;
            value *= 1e-3;
        }
    }

    format!("{:.*}{}", precision, value, SI_PREFIXES[n])
}

fn fixed(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "None".to_string(), |v| format!("{:.*}", precision, v))
}

/// One report line per part.
pub fn summary_line(s: &CurveSummary) -> String {
    format!(
        "{:<20}: L = {:>8}H, X=R @ {:>7}Hz, Zmax = {:>6} @ {:>6}Hz, Z = {} @1MHz, {} @10MHz, {} @100MHz",
        s.name,
        eng_format(s.inductance_1mhz.map(|l| l.0), 3),
        eng_format(s.crossover.map(|f| f.0), 2),
        fixed(s.peak_impedance, 1),
        eng_format(s.peak_frequency.map(|f| f.0), 1),
        fixed(s.impedance_1mhz, 1),
        fixed(s.impedance_10mhz, 1),
        fixed(s.impedance_100mhz, 1),
    )
}

fn csv_field(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Write the selection report.
pub fn write_report(results: &SelectionResults, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let c = &results.criteria;
            writeln!(
                out,
                "Size {}, |Z| @ 100MHz in [{}, {}] ohm{}: {} parts",
                c.size_class,
                c.impedance.min,
                c.impedance.max,
                c.inductance
                    .map(|l| format!(", L @ 1MHz in [{}H, {}H]", eng_format(Some(l.min), 2), eng_format(Some(l.max), 2)))
                    .unwrap_or_default(),
                results.summaries.len()
            )?;
            for summary in &results.summaries {
                writeln!(out, "{}", summary_line(summary))?;
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "size": results.criteria.size_class,
                "impedance": results.criteria.impedance,
                "inductance": results.criteria.inductance,
                "archives_scanned": results.report.archives_scanned,
                "members_parsed": results.report.members_parsed,
                "parts": results.summaries,
                "warnings": results.report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "name,inductance_1mhz_h,crossover_hz,peak_ohm,peak_hz,z_1mhz_ohm,z_10mhz_ohm,z_100mhz_ohm")?;
            for s in &results.summaries {
                writeln!(
                    out,
                    "{},{},{},{},{},{},{},{}",
                    s.name,
                    csv_field(s.inductance_1mhz.map(|l| l.0)),
                    csv_field(s.crossover.map(|f| f.0)),
                    csv_field(s.peak_impedance),
                    csv_field(s.peak_frequency.map(|f| f.0)),
                    csv_field(s.impedance_1mhz),
                    csv_field(s.impedance_10mhz),
                    csv_field(s.impedance_100mhz),
                )?;
            }
        }
    }
    Ok(())
}

/// Write `MHz,R,X,|Z|` rows of one curve.
pub fn write_plot_series(curve: &ComponentCurve, out: &mut impl Write) -> Result<()> {
    let series = curve.plot_series();
    writeln!(out, "MHz,R,X,|Z|")?;
    for i in 0..series.mhz.len() {
        writeln!(
            out,
            "{},{},{},{}",
            series.mhz[i], series.resistance[i], series.reactance[i], series.magnitude[i]
        )?;
    }
    Ok(())
}

/// Write one series file per part plus `plot.json` with the diagram layout.
pub fn write_plot_files(results: &SelectionResults, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let mut files = Vec::with_capacity(results.report.curves.len());
    let mut taken = HashSet::new();
    for curve in &results.report.curves {
        let file_name = unique_file_name(curve.name(), &mut taken);
        let path = output_dir.join(&file_name);
        let mut f = std::io::BufWriter::new(std::fs::File::create(&path)?);
        write_plot_series(curve, &mut f)?;
        f.flush()?;
        files.push(serde_json::json!({ "name": curve.name(), "file": file_name }));
    }

    // grid of roughly square subplots, one per part
    let count = files.len();
    let columns = ((count as f64).sqrt() as usize).max(1);
    let rows = (count + columns - 1) / columns;

    let plot = &results.plot;
    let layout = serde_json::json!({
        "columns": columns,
        "rows": rows,
        "x_scale": plot.scale.x_axis(),
        "y_scale": plot.scale.y_axis(),
        "x_label": "MHz",
        "x_range_mhz": [plot.frequency_range.min * 1e-6, plot.frequency_range.max * 1e-6],
        "y_min": plot.min_resistance,
        "traces": {"R": "b", "X": "g", "|Z|": "r"},
        "parts": files,
    });

    let layout_path = output_dir.join("plot.json");
    std::fs::write(&layout_path, serde_json::to_string_pretty(&layout)?)?;

    tracing::info!("Wrote {} plot series to {:?}", count, output_dir);
    Ok(())
}

/// `NAME.csv`, or `NAME_2.csv`, `NAME_3.csv`, ... once that is taken. The same
/// part can sit in more than one vendor archive.
fn unique_file_name(name: &str, taken: &mut HashSet<String>) -> String {
    let mut file_name = format!("{}.csv", name);
    let mut n = 1;
    while !taken.insert(file_name.clone()) {
        n += 1;
        file_name = format!("{}_{}.csv", name, n);
    }
    file_name
}

/// Header facts and summary of one measurement file.
pub fn write_touchstone(
    summary: &TouchstoneSummary,
    curve: &ComponentCurve,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let part = curve.summary();
    match format {
        OutputFormat::Text => {
            writeln!(out, "Touchstone File: {:?}", summary.file)?;
            writeln!(out, "  Option line: {}", summary.option_line.as_deref().unwrap_or("None"))?;
            writeln!(out, "  Ports: {}", summary.ports.map_or("None".to_string(), |p| p.to_string()))?;
            writeln!(out, "  Frequency points: {}", summary.points)?;
            if let Some((f_min, f_max)) = summary.frequency_range {
                writeln!(
                    out,
                    "  Frequency range: {}Hz - {}Hz",
                    eng_format(Some(f_min), 2),
                    eng_format(Some(f_max), 2)
                )?;
            }
            writeln!(out, "{}", summary_line(&part))?;
        }
        OutputFormat::Json => {
            let json = serde_json::json!({ "file": summary, "part": part });
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Csv => write_plot_series(curve, out)?,
    }
    Ok(())
}

/// Catalog listing.
pub fn write_catalog(status: &[ArchiveStatus], format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for s in status {
                writeln!(
                    out,
                    "[{}] {:<12} {:<48} {}",
                    if s.present { "x" } else { " " },
                    s.vendor,
                    s.location,
                    s.url.as_deref().unwrap_or("-")
                )?;
            }
            let present = status.iter().filter(|s| s.present).count();
            writeln!(out, "{} of {} archives present", present, status.len())?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(status)?)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "vendor,location,present,url")?;
            for s in status {
                writeln!(
                    out,
                    "{},{},{},{}",
                    s.vendor,
                    s.location,
                    s.present,
                    s.url.as_deref().unwrap_or("")
                )?;
            }
        }
    }
    Ok(())
}
