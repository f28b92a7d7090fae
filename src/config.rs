// src/config.rs

use crate::claims::ScanWindows;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

/// Optional tool configuration. Every field has a default, so the tool runs
/// with no config file at all.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Where converted CSVs land; next to the input when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub scan: ScanSection,
}

/// Window overrides for the claim scanner. The defaults match the report
/// layout the scanner was built for; override only for unusual page sizes.
#[derive(Debug, Deserialize)]
pub struct ScanSection {
    #[serde(default = "default_forward")]
    pub forward_window: usize,
    #[serde(default = "default_backward")]
    pub backward_window: usize,
    #[serde(default = "default_summary")]
    pub summary_window: usize,
}

fn default_forward() -> usize {
    ScanWindows::default().forward
}

fn default_backward() -> usize {
    ScanWindows::default().backward
}

fn default_summary() -> usize {
    ScanWindows::default().summary
}

impl Default for ScanSection {
    fn default() -> Self {
        let w = ScanWindows::default();
        ScanSection {
            forward_window: w.forward,
            backward_window: w.backward,
            summary_window: w.summary,
        }
    }
}

impl ScanSection {
    pub fn windows(&self) -> ScanWindows {
        ScanWindows {
            forward: self.forward_window,
            backward: self.backward_window,
            summary: self.summary_window,
        }
    }
}

impl Config {
    /// Load the config file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
