//! Search the catalog for parts inside an impedance window.
//!
//! For each archive whose vendor has a code for the requested size class,
//! member names are matched against the vendor's naming convention. The
//! impedance code in the name, when there is one, rejects a member before it
//! is opened; otherwise the member is parsed and its impedance at 100 MHz is
//! checked. An optional inductance window at 1 MHz filters the survivors.
//!
//! Archives are scanned in parallel; the result is sorted by inductance at
//! 1 MHz with ties kept in catalog and member order.

use crate::catalog::{impedance_from_code, Catalog, CatalogEntry};
use crate::curve::{ComponentCurve, IMPEDANCE_FREQUENCY, INDUCTANCE_FREQUENCY};
use crate::error::BeadError;
use crate::store::ArchiveStore;
use lib_touchstone::TouchstoneDocument;
use lib_types::units::Bounds;
use rayon::prelude::*;
use std::fmt;

/// What to search for.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionCriteria {
    /// Size class such as `"0603"`.
    pub size_class: String,
    /// Accepted impedance at 100 MHz in ohms.
    pub impedance: Bounds,
    /// Accepted inductance at 1 MHz in henries.
    pub inductance: Option<Bounds>,
}

impl SelectionCriteria {
    pub fn new(size_class: impl Into<String>, impedance: Bounds) -> Self {
        Self {
            size_class: size_class.into(),
            impedance,
            inductance: None,
        }
    }

    pub fn with_inductance(mut self, inductance: Bounds) -> Self {
        self.inductance = Some(inductance);
        self
    }
}

/// Something skipped during a scan. None of these abort the scan.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanWarning {
    /// The archive is not available locally.
    MissingArchive {
        location: String,
        url: Option<String>,
    },
    /// The archive exists but its member list could not be read.
    UnreadableArchive { location: String, message: String },
    /// A member could not be opened or parsed.
    MemberFailed {
        location: String,
        member: String,
        message: String,
    },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArchive { location, url: Some(url) } => {
                write!(f, "archive '{}' does not exist, download it from {}", location, url)
            }
            Self::MissingArchive { location, url: None } => {
                write!(f, "archive '{}' does not exist", location)
            }
            Self::UnreadableArchive { location, message } => {
                write!(f, "archive '{}' could not be read: {}", location, message)
            }
            Self::MemberFailed {
                location,
                member,
                message,
            } => write!(f, "skipped '{}' in '{}': {}", member, location, message),
        }
    }
}

/// Outcome of a scan.
#[derive(Clone, Debug, Default)]
pub struct ScanReport {
    /// Matching parts, ascending by inductance at 1 MHz.
    pub curves: Vec<ComponentCurve>,
    pub warnings: Vec<ScanWarning>,
    /// Archives that were present and listed.
    pub archives_scanned: usize,
    /// Members that were opened and parsed.
    pub members_parsed: usize,
}

/// Per-archive partial result, merged in catalog order.
#[derive(Default)]
struct EntryScan {
    curves: Vec<ComponentCurve>,
    warnings: Vec<ScanWarning>,
    scanned: bool,
    parsed: usize,
}

/// Scans a catalog through an archive store.
pub struct SelectionEngine<S> {
    catalog: Catalog,
    store: S,
}

impl<S: ArchiveStore> SelectionEngine<S> {
    pub fn new(catalog: Catalog, store: S) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Matching parts, ascending by inductance at 1 MHz.
    pub fn filescan(
        &self,
        size_class: &str,
        impedance: Bounds,
        inductance: Option<Bounds>,
    ) -> Vec<ComponentCurve> {
        let criteria = SelectionCriteria {
            size_class: size_class.to_string(),
            impedance,
            inductance,
        };
        self.scan(&criteria).curves
    }

    /// Scan every archive and report matches together with what was skipped.
    pub fn scan(&self, criteria: &SelectionCriteria) -> ScanReport {
        tracing::info!(
            "Scanning {} archives for size {} with |Z| in [{}, {}]",
            self.catalog.len(),
            criteria.size_class,
            criteria.impedance.min,
            criteria.impedance.max
        );

        let partials: Vec<EntryScan> = self
            .catalog
            .entries()
            .par_iter()
            .map(|entry| self.scan_entry(entry, criteria))
            .collect();

        let mut report = ScanReport::default();
        for partial in partials {
            report.curves.extend(partial.curves);
            report.warnings.extend(partial.warnings);
            report.archives_scanned += usize::from(partial.scanned);
            report.members_parsed += partial.parsed;
        }
        report.curves = sort_by_inductance(report.curves);

        tracing::info!(
            "Found {} parts in {} archives ({} members parsed, {} warnings)",
            report.curves.len(),
            report.archives_scanned,
            report.members_parsed,
            report.warnings.len()
        );
        report
    }

    fn scan_entry(&self, entry: &CatalogEntry, criteria: &SelectionCriteria) -> EntryScan {
        let mut scan = EntryScan::default();

        // this vendor has no such size, nothing can match
        let Some(size_code) = entry.convention.size_code(&criteria.size_class) else {
            return scan;
        };

        let members = match self.store.member_names(&entry.location) {
            Ok(Some(members)) => members,
            Ok(None) => {
                let warning = ScanWarning::MissingArchive {
                    location: entry.location.clone(),
                    url: entry.download_url(),
                };
                tracing::warn!("{}", warning);
                scan.warnings.push(warning);
                return scan;
            }
            Err(e) => {
                let warning = ScanWarning::UnreadableArchive {
                    location: entry.location.clone(),
                    message: e.to_string(),
                };
                tracing::warn!("{}", warning);
                scan.warnings.push(warning);
                return scan;
            }
        };
        scan.scanned = true;
        tracing::debug!("'{}': {} members", entry.location, members.len());

        for member in &members {
            let Some(codes) = entry.convention.match_member(member) else {
                continue;
            };
            if codes.size_code.as_deref() != Some(size_code) {
                continue;
            }

            let coded_impedance = match codes.imp_code.as_deref() {
                Some(code) => match impedance_from_code(code) {
                    Some(z) => Some(z),
                    None => {
                        tracing::debug!("'{}': undecodable impedance code '{}'", member, code);
                        continue;
                    }
                },
                None => None,
            };
            if let Some(z) = coded_impedance {
                if !criteria.impedance.contains(z.0) {
                    continue;
                }
            }

            scan.parsed += 1;
            let curve = match self.load_curve(entry, member) {
                Ok(curve) => curve,
                Err(e) => {
                    let warning = ScanWarning::MemberFailed {
                        location: entry.location.clone(),
                        member: member.clone(),
                        message: e.to_string(),
                    };
                    tracing::warn!("{}", warning);
                    scan.warnings.push(warning);
                    continue;
                }
            };

            // no impedance code in the name, check the measured value instead
            if coded_impedance.is_none() {
                let measured = curve.impedance_at(IMPEDANCE_FREQUENCY).map(|z| z.norm());
                if !measured.map_or(false, |z| criteria.impedance.contains(z)) {
                    continue;
                }
            }

            if let Some(window) = criteria.inductance {
                let inductance = curve.inductance_at(INDUCTANCE_FREQUENCY);
                if !inductance.map_or(false, |l| window.contains(l.0)) {
                    continue;
                }
            }

            scan.curves.push(curve);
        }

        scan
    }

    fn load_curve(&self, entry: &CatalogEntry, member: &str) -> Result<ComponentCurve, BeadError> {
        let source = self.store.open_member(&entry.location, member)?;
        ComponentCurve::build(TouchstoneDocument::new(source)).map_err(|e| BeadError::parse(member, e))
    }
}

/// Stable sort by inductance at 1 MHz; parts without one go last.
pub fn sort_by_inductance(curves: Vec<ComponentCurve>) -> Vec<ComponentCurve> {
    let mut keyed: Vec<(f64, ComponentCurve)> = curves
        .into_iter()
        .map(|curve| {
            let key = curve
                .inductance_at(INDUCTANCE_FREQUENCY)
                .map_or(f64::INFINITY, |l| l.0);
            (key, curve)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, curve)| curve).collect()
}
