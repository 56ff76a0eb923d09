//! Vendor lookup by OUI prefix.
//!
//! Two repositories are provided: [`MacOuiRepo`] backed by the database embedded
//! in the `mac_oui` crate, and [`OuiFileRepo`] reading an IEEE `oui.txt` file.
//! Both load lazily on first lookup and degrade to "unknown vendor" when the
//! data is unavailable.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use mac_oui::Oui;
use pnet::util::MacAddr;

use crate::network::mac;

/// Defines the contract for resolving device manufacturers from MAC addresses.
pub trait VendorRepository: Send + Sync {
    /// `None` if the OUI is unknown.
    fn vendor_for(&self, mac: MacAddr) -> Option<String>;
}

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::debug!("embedded OUI database unavailable: {e}");
                None
            }
        })
        .as_ref()
}

pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn vendor_for(&self, mac: MacAddr) -> Option<String> {
        let db: &Oui = get_oui_db()?;
        match db.lookup_by_mac(&mac.to_string()) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            _ => None,
        }
    }
}

/// The file-backed repository when `oui_file` is given, the embedded one otherwise.
pub fn repository(oui_file: Option<&Path>) -> Box<dyn VendorRepository> {
    match oui_file {
        Some(path) => Box::new(OuiFileRepo::new(path)),
        None => Box::new(MacOuiRepo),
    }
}

/// Reads the IEEE registry text format, keyed by the `(base 16)` lines.
pub struct OuiFileRepo {
    path: PathBuf,
    table: OnceLock<HashMap<String, String>>,
}

impl OuiFileRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceLock::new(),
        }
    }

    fn table(&self) -> &HashMap<String, String> {
        self.table.get_or_init(|| match File::open(&self.path) {
            Ok(file) => parse_oui_text(BufReader::new(file)),
            Err(e) => {
                tracing::debug!("OUI file {} unavailable: {e}", self.path.display());
                HashMap::new()
            }
        })
    }
}

impl VendorRepository for OuiFileRepo {
    fn vendor_for(&self, mac: MacAddr) -> Option<String> {
        self.table().get(&mac::oui_prefix(mac)).cloned()
    }
}

/// Parses lines like `001A2B     (base 16)\t\tAyecom Technology Co., Ltd.`
pub fn parse_oui_text(reader: impl BufRead) -> HashMap<String, String> {
    const MARKER: &str = "(base 16)";

    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| {
            let (prefix, vendor) = line.split_once(MARKER)?;
            let prefix: String = prefix.trim().replace('-', "").to_uppercase();
            let vendor: &str = vendor.trim();
            let is_oui = prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_hexdigit());
            (is_oui && !vendor.is_empty()).then(|| (prefix, vendor.to_string()))
        })
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
