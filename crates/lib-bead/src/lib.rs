//! # lib-bead
//!
//! Ferrite chip bead models and the catalog search built on them.
//!
//! This crate provides:
//!
//! - **ComponentCurve**: series impedance over frequency, with interpolated
//!   impedance/inductance lookups, the X = R crossover and the impedance peak
//! - **Catalog**: vendor naming conventions and the archives to scan
//! - **ArchiveStore**: listing and opening archive members
//! - **SelectionEngine**: parallel search for parts inside an impedance window

pub mod error;
pub mod interpolation;
pub mod curve;
pub mod catalog;
pub mod store;
pub mod selection;

pub use error::{BeadError, BeadResult};
pub use curve::{ComponentCurve, CurveSummary, PlotSeries, INDUCTANCE_FREQUENCY, IMPEDANCE_FREQUENCY};
pub use catalog::{Catalog, CatalogConfig, CatalogEntry, NamingConvention};
pub use store::{ArchivePath, ArchiveStore, DirectoryStore, MemoryStore};
pub use selection::{ScanReport, ScanWarning, SelectionCriteria, SelectionEngine};
