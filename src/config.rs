use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::language::VhdlStandard;
use crate::library::LibraryMap;

/// Name of the optional configuration file at the working root.
pub const CONFIG_FILE: &str = "hdl-order.toml";

/// Libraries whose unresolved references are expected and never reported.
pub const DEFAULT_EXTERNAL_LIBRARIES: &[&str] = &["ieee", "std"];

/// A `[libraries]` entry: one prefix or a list of prefixes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PrefixList {
    One(String),
    Many(Vec<String>),
}

impl PrefixList {
    fn prefixes(&self) -> &[String] {
        match self {
            Self::One(p) => std::slice::from_ref(p),
            Self::Many(ps) => ps,
        }
    }
}

/// Configuration loaded from `hdl-order.toml` at the working root.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct HdlOrderConfig {
    /// Default logical library (`""` stands for the work library).
    pub default_library: Option<String>,
    /// VHDL revision used for `file_type` strings.
    pub vhdl_std: Option<VhdlStandard>,
    /// Glob patterns excluded from discovery.
    pub exclude: Option<Vec<String>>,
    /// Library names treated as externally provided (not warned when unresolved).
    pub external_libraries: Option<Vec<String>>,
    /// `library = "prefix"` or `library = ["p1", "p2"]`.
    pub libraries: HashMap<String, PrefixList>,
    /// Dialect name -> list of extensions, replacing that dialect's defaults.
    pub extensions: HashMap<String, Vec<String>>,
}

impl HdlOrderConfig {
    /// Load configuration from `hdl-order.toml` in the given root directory.
    ///
    /// Returns a default (empty) configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("warning: failed to parse {CONFIG_FILE}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                eprintln!("warning: failed to read {CONFIG_FILE}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    /// Library rules from the `[libraries]` table.
    ///
    /// Library names are visited in sorted order so rule insertion is deterministic.
    pub fn library_map(&self) -> LibraryMap {
        let mut map = LibraryMap::new();
        let mut names: Vec<&String> = self.libraries.keys().collect();
        names.sort();
        for name in names {
            for prefix in self.libraries[name].prefixes() {
                map.insert(name, prefix);
            }
        }
        map
    }

    /// Configured external libraries, lowercased, or the built-in defaults.
    pub fn external_libraries(&self) -> Vec<String> {
        match &self.external_libraries {
            Some(libs) => libs.iter().map(|l| l.to_lowercase()).collect(),
            None => DEFAULT_EXTERNAL_LIBRARIES
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }
}
