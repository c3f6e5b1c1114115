//! Vendor naming conventions and the catalog of archives to scan.

use crate::error::{BeadError, BeadResult};
use lib_types::units::Ohms;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How one vendor names its measurement files.
#[derive(Clone, Debug)]
pub struct NamingConvention {
    vendor: String,
    url_template: Option<String>,
    pattern: Regex,
    size_codes: BTreeMap<String, String>,
}

/// Codes extracted from a member name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberCodes {
    pub size_code: Option<String>,
    pub imp_code: Option<String>,
}

impl NamingConvention {
    /// Compile a convention.
    ///
    /// `pattern` must match from the start of a member name; it is anchored
    /// there but not at the end. Named groups `size_code` and `imp_code` are
    /// picked up when present.
    pub fn new(
        vendor: impl Into<String>,
        url_template: Option<String>,
        pattern: &str,
        size_codes: BTreeMap<String, String>,
    ) -> BeadResult<Self> {
        let vendor = vendor.into();
        let pattern = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| BeadError::Pattern {
            vendor: vendor.clone(),
            source,
        })?;

        Ok(Self {
            vendor,
            url_template,
            pattern,
            size_codes,
        })
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn url_template(&self) -> Option<&str> {
        self.url_template.as_deref()
    }

    pub fn size_codes(&self) -> &BTreeMap<String, String> {
        &self.size_codes
    }

    /// Vendor size code for a size class such as `"0603"`.
    pub fn size_code(&self, size_class: &str) -> Option<&str> {
        self.size_codes.get(size_class).map(String::as_str)
    }

    /// Codes of a matching member name, `None` if the name does not match.
    pub fn match_member(&self, member: &str) -> Option<MemberCodes> {
        let caps = self.pattern.captures(member)?;
        let group = |name| caps.name(name).map(|m| m.as_str().to_string());

        Some(MemberCodes {
            size_code: group("size_code"),
            imp_code: group("imp_code"),
        })
    }

    /// Download URL for an archive location.
    ///
    /// `{filename}` expands to the archive's file name and `{filename_ext}` to
    /// that name without its extension.
    pub fn download_url(&self, location: &str) -> Option<String> {
        let template = self.url_template.as_deref()?;
        let filename = location
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(location);
        let stem = match filename.rfind('.') {
            Some(idx) if idx > 0 => &filename[..idx],
            _ => filename,
        };

        Some(
            template
                .replace("{filename_ext}", stem)
                .replace("{filename}", filename),
        )
    }
}

/// Impedance encoded in a part number: two mantissa digits and one exponent
/// digit, e.g. `"331"` is 33 * 10^1 = 330 ohms.
pub fn impedance_from_code(code: &str) -> Option<Ohms> {
    let mantissa: f64 = code.get(..2)?.parse().ok()?;
    let exponent = code.get(2..3)?.chars().next()?.to_digit(10)?;
    Some(Ohms(mantissa * 10f64.powi(exponent as i32)))
}

/// One archive and the naming convention of its members.
#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub location: String,
    pub convention: Arc<NamingConvention>,
}

impl CatalogEntry {
    pub fn download_url(&self) -> Option<String> {
        self.convention.download_url(&self.location)
    }
}

/// Read-only list of archives to scan, in scan order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a catalog from its file form. Archives must name a declared vendor.
    pub fn from_config(config: &CatalogConfig) -> BeadResult<Self> {
        let mut vendors: BTreeMap<&str, Arc<NamingConvention>> = BTreeMap::new();
        for vendor in &config.vendors {
            let convention = NamingConvention::new(
                vendor.name.as_str(),
                vendor.url.clone(),
                &vendor.pattern,
                vendor.size_codes.clone(),
            )?;
            if vendors.insert(vendor.name.as_str(), Arc::new(convention)).is_some() {
                return Err(BeadError::InvalidCatalog(format!(
                    "vendor '{}' declared twice",
                    vendor.name
                )));
            }
        }

        let entries = config
            .archives
            .iter()
            .map(|archive| {
                let convention = vendors.get(archive.vendor.as_str()).ok_or_else(|| {
                    BeadError::InvalidCatalog(format!(
                        "archive '{}' refers to unknown vendor '{}'",
                        archive.location, archive.vendor
                    ))
                })?;
                Ok(CatalogEntry {
                    location: archive.location.clone(),
                    convention: Arc::clone(convention),
                })
            })
            .collect::<BeadResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Ferrite bead archives of Murata, TDK, Taiyo Yuden, Würth and Samsung.
    pub fn builtin() -> BeadResult<Self> {
        Self::from_config(&CatalogConfig::builtin())
    }
}

/// Catalog file contents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(rename = "vendor", default)]
    pub vendors: Vec<VendorConfig>,

    #[serde(rename = "archive", default)]
    pub archives: Vec<ArchiveConfig>,
}

/// `[[vendor]]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub pattern: String,

    /// Size class (e.g. `"0603"`) to vendor size code.
    pub size_codes: BTreeMap<String, String>,
}

/// `[[archive]]` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub location: String,
    pub vendor: String,
}

const MURATA: &str = "murata";
const SAMSUNG: &str = "samsung";
const TAIYO_YUDEN: &str = "taiyo_yuden";
const TDK: &str = "tdk";
const WUERTH: &str = "wuerth";

const BUILTIN_ARCHIVES: &[(&str, &str)] = &[
    ("blm03-s-v17.zip", MURATA),
    ("blm15-s-v17.zip", MURATA),
    ("blm18-s-v17.zip", MURATA),
    ("blm21-s-v17.zip", MURATA),
    ("beads_commercial_signal_mmz1005_spara.zip", TDK),
    ("beads_commercial_signal_mmz1005-h_spara.zip", TDK),
    ("beads_commercial_signal_mmz1005-e_spara.zip", TDK),
    ("beads_commercial_signal_mmz1005-v_spara.zip", TDK),
    ("beads_commercial_signal_mmz1608_spara.zip", TDK),
    ("beads_commercial_signal_mmz2012_spara.zip", TDK),
    ("beads_commercial_power_mpz1005_spara.zip", TDK),
    ("beads_commercial_power_mpz1608_spara.zip", TDK),
    ("beads_commercial_power_mpz2012_spara.zip", TDK),
    ("LSMC_LSMG.zip", TAIYO_YUDEN),
    ("S-Parameter_WE-CBF%20%28rev22a%29.zip", WUERTH),
    ("CIM05_Series.zip", SAMSUNG),
    ("CIM10_Series.zip", SAMSUNG),
    ("CIM21_Series.zip", SAMSUNG),
];

fn vendor(name: &str, url: &str, pattern: &str, size_codes: &[(&str, &str)]) -> VendorConfig {
    VendorConfig {
        name: name.to_string(),
        url: Some(url.to_string()),
        pattern: pattern.to_string(),
        size_codes: size_codes
            .iter()
            .map(|(class, code)| (class.to_string(), code.to_string()))
            .collect(),
    }
}

impl CatalogConfig {
    /// The built-in vendor list in file form.
    pub fn builtin() -> Self {
        let vendors = vec![
            vendor(
                MURATA,
                "https://www.murata.com/-/media/webrenewal/tool/sparameter/ferritebeads/{filename_ext}.ashx?la=en",
                r".*(?P<size_code>\d{2})[A-Z]{2}(?P<imp_code>\d{3}).*",
                &[("0201", "03"), ("0402", "15"), ("0603", "18"), ("0805", "21"), ("1206", "31")],
            ),
            // not offered as archives by the vendor, collected from their web library
            vendor(
                SAMSUNG,
                "https://github.com/kungpfui/engkit-chipbead/raw/master/sparam/{filename}",
                r".*(?P<size_code>\d{2})[A-Z](?P<imp_code>\d{3}).*",
                &[("0402", "05"), ("0603", "10"), ("0805", "21")],
            ),
            vendor(
                TAIYO_YUDEN,
                "https://www.yuden.co.jp/productdata/spara/{filename}",
                r".*(?P<size_code>\d{4})\d{2}[A-Z](?P<imp_code>\d{3}).*",
                &[("0402", "1005"), ("0603", "1608"), ("0805", "2012")],
            ),
            vendor(
                TDK,
                "https://product.tdk.com/system/files/dam/technicalsupport/tvcl/spara/{filename}",
                r".*(?P<size_code>\d{4})[A-Z](?P<imp_code>\d{3}).*",
                &[("0402", "1005"), ("0603", "1608"), ("0805", "2012")],
            ),
            vendor(
                WUERTH,
                "https://www.we-online.com/components/products/download/{filename}",
                r"^(?P<size_code>\d{7}).*",
                &[("0402", "7427927"), ("0603", "7427926"), ("0805", "7427920")],
            ),
        ];

        let archives = BUILTIN_ARCHIVES
            .iter()
            .map(|(location, vendor)| ArchiveConfig {
                location: location.to_string(),
                vendor: vendor.to_string(),
            })
            .collect();

        Self { vendors, archives }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn murata() -> NamingConvention {
        let config = CatalogConfig::builtin();
        let v = &config.vendors[0];
        NamingConvention::new(&v.name, v.url.clone(), &v.pattern, v.size_codes.clone()).unwrap()
    }

    #[test]
    fn test_impedance_from_code() {
        assert_eq!(impedance_from_code("331"), Some(Ohms(330.0)));
        assert_eq!(impedance_from_code("330"), Some(Ohms(33.0)));
        assert_eq!(impedance_from_code("102"), Some(Ohms(1000.0)));
        assert_eq!(impedance_from_code("600"), Some(Ohms(60.0)));
        assert_eq!(impedance_from_code("12"), None);
        assert_eq!(impedance_from_code("1x2"), None);
    }

    #[test]
    fn test_match_member_extracts_codes() {
        let conv = murata();
        let codes = conv.match_member("BLM18AG331SN1.s2p").unwrap();
        assert_eq!(codes.size_code.as_deref(), Some("18"));
        assert_eq!(codes.imp_code.as_deref(), Some("331"));
        assert_eq!(conv.size_code("0603"), Some("18"));
        assert_eq!(conv.size_code("2512"), None);
        assert_eq!(conv.match_member("readme.txt"), None);
    }

    #[test]
    fn test_pattern_is_anchored_at_start() {
        let conv = NamingConvention::new("x", None, r"(?P<size_code>\d{4})", BTreeMap::new()).unwrap();
        assert!(conv.match_member("1608.s2p").is_some());
        assert!(conv.match_member("MMZ1608.s2p").is_none());

        // not anchored at the end
        let codes = conv.match_member("1608Y601B.s2p").unwrap();
        assert_eq!(codes.size_code.as_deref(), Some("1608"));
        assert_eq!(codes.imp_code, None);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = NamingConvention::new("broken", None, r"(?P<size_code>\d{4}", BTreeMap::new()).unwrap_err();
        assert!(matches!(err, BeadError::Pattern { ref vendor, .. } if vendor == "broken"));
    }

    #[test]
    fn test_download_url() {
        let conv = murata();
        assert_eq!(
            conv.download_url("sparam/blm18-s-v17.zip").as_deref(),
            Some("https://www.murata.com/-/media/webrenewal/tool/sparameter/ferritebeads/blm18-s-v17.ashx?la=en")
        );

        let plain = NamingConvention::new("p", Some("https://x/{filename}".into()), ".*", BTreeMap::new()).unwrap();
        assert_eq!(plain.download_url("CIM10_Series.zip").as_deref(), Some("https://x/CIM10_Series.zip"));

        let offline = NamingConvention::new("o", None, ".*", BTreeMap::new()).unwrap();
        assert_eq!(offline.download_url("a.zip"), None);
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), BUILTIN_ARCHIVES.len());
        assert_eq!(catalog.entries()[0].location, "blm03-s-v17.zip");
        assert_eq!(catalog.entries()[0].convention.vendor(), MURATA);

        // entries of one vendor share a convention
        let tdk: Vec<_> = catalog
            .entries()
            .iter()
            .filter(|e| e.convention.vendor() == TDK)
            .collect();
        assert_eq!(tdk.len(), 9);
        assert!(Arc::ptr_eq(&tdk[0].convention, &tdk[8].convention));

        let wuerth = catalog.entries().iter().find(|e| e.convention.vendor() == WUERTH).unwrap();
        let codes = wuerth.convention.match_member("742792651.s2p").unwrap();
        assert_eq!(codes.size_code.as_deref(), Some("7427926"));
    }

    #[test]
    fn test_catalog_from_toml() {
        let text = r#"
[[vendor]]
name = "acme"
pattern = '.*(?P<size_code>\d{2})(?P<imp_code>\d{3})'
size_codes = { "0603" = "18" }

[[archive]]
location = "acme.zip"
vendor = "acme"
"#;
        let config: CatalogConfig = toml::from_str(text).unwrap();
        let catalog = Catalog::from_config(&config).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].download_url(), None);

        let mut bad = config.clone();
        bad.archives[0].vendor = "nobody".into();
        assert!(matches!(Catalog::from_config(&bad), Err(BeadError::InvalidCatalog(_))));

        let mut twice = config;
        twice.vendors.push(twice.vendors[0].clone());
        assert!(matches!(Catalog::from_config(&twice), Err(BeadError::InvalidCatalog(_))));
    }
}
