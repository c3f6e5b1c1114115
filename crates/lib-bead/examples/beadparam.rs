//! Select 0603 beads with 270..360 ohm at 100 MHz.
//!
//! Expects the vendor archives (zip files or extracted directories) under
//! `sparam/`, or under the directory given as the first argument:
//!
//! ```text
//! cargo run -p lib-bead --example beadparam -- path/to/sparam
//! ```

use lib_bead::{ArchiveStore, Catalog, DirectoryStore, SelectionEngine};
use lib_types::units::Bounds;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let root = std::env::args().nth(1).unwrap_or_else(|| "sparam".to_string());
    let catalog = Catalog::builtin()?;
    let store = DirectoryStore::new(&root);

    let present = catalog
        .entries()
        .iter()
        .filter(|entry| store.contains(&entry.location))
        .count();
    println!("=== Chip bead selection: 0603, 270..360 ohm @ 100 MHz ===\n");
    println!("{} of {} catalog archives found under {:?}", present, catalog.len(), root);

    let engine = SelectionEngine::new(catalog, store);
    let curves = engine.filescan("0603", Bounds::new(270.0, 360.0), None);

    println!("{} parts match\n", curves.len());
    for curve in &curves {
        let summary = curve.summary();
        println!(
            "{:<20} L = {:<28} X=R @ {:<26} |Z| = {:.1} ohm @ 100 MHz",
            summary.name,
            show(summary.inductance_1mhz),
            show(summary.crossover),
            summary.impedance_100mhz.unwrap_or(f64::NAN),
        );
    }

    Ok(())
}

fn show<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}
