//! Roster configuration (`roster.yaml`)
//!
//! ```yaml
//! cache:
//!   ttl_secs: 600
//!   capacity: 64
//!   verify_hash: true
//! divisions:
//!   support:
//!     schedule_file: data/support.xlsx
//!     duty_file: data/duty.xlsx
//! ```
//!
//! Relative file paths resolve against the directory of the config file.

use crate::cache::CacheOptions;
use crate::error::{RosterError, RosterResult};
use crate::header::Month;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "roster.yaml";
pub const DEFAULT_SCHEDULE_SHEET: &str = "ГРАФИК";
pub const DEFAULT_DUTY_PREFIX: &str = "Дежурство";
pub const DEFAULT_HEAD_PREFIX: &str = "Старшие";

fn default_schedule_sheet() -> String {
    DEFAULT_SCHEDULE_SHEET.to_string()
}

fn default_duty_prefix() -> String {
    DEFAULT_DUTY_PREFIX.to_string()
}

fn default_head_prefix() -> String {
    DEFAULT_HEAD_PREFIX.to_string()
}

fn default_ttl_secs() -> u64 {
    600
}

fn default_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_true")]
    pub verify_hash: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            capacity: default_capacity(),
            verify_hash: true,
        }
    }
}

impl CacheSettings {
    pub fn to_options(&self) -> CacheOptions {
        CacheOptions::new()
            .with_ttl(Duration::from_secs(self.ttl_secs))
            .with_capacity(self.capacity)
            .with_hash_verification(self.verify_hash)
    }
}

/// File set of one division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionConfig {
    pub schedule_file: PathBuf,
    #[serde(default = "default_schedule_sheet")]
    pub schedule_sheet: String,
    #[serde(default)]
    pub duty_file: Option<PathBuf>,
    #[serde(default = "default_duty_prefix")]
    pub duty_sheet_prefix: String,
    /// Defaults to `duty_file` when absent
    #[serde(default)]
    pub head_file: Option<PathBuf>,
    #[serde(default = "default_head_prefix")]
    pub head_sheet_prefix: String,
}

impl DivisionConfig {
    pub fn new(schedule_file: impl Into<PathBuf>) -> Self {
        Self {
            schedule_file: schedule_file.into(),
            schedule_sheet: default_schedule_sheet(),
            duty_file: None,
            duty_sheet_prefix: default_duty_prefix(),
            head_file: None,
            head_sheet_prefix: default_head_prefix(),
        }
    }

    pub fn with_duty_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.duty_file = Some(path.into());
        self
    }

    pub fn with_head_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.head_file = Some(path.into());
        self
    }

    /// e.g. `Дежурство Июль`
    pub fn duty_sheet(&self, month: Month) -> String {
        format!("{} {}", self.duty_sheet_prefix, month.title())
    }

    /// e.g. `Старшие Июль`
    pub fn head_sheet(&self, month: Month) -> String {
        format!("{} {}", self.head_sheet_prefix, month.title())
    }

    pub fn head_path(&self) -> Option<&Path> {
        self.head_file.as_deref().or(self.duty_file.as_deref())
    }

    /// Every distinct file this division reads.
    pub fn files(&self) -> Vec<&Path> {
        let mut files = vec![self.schedule_file.as_path()];
        for path in [self.duty_file.as_deref(), self.head_file.as_deref()]
            .into_iter()
            .flatten()
        {
            if !files.contains(&path) {
                files.push(path);
            }
        }
        files
    }

    fn resolve_against(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.schedule_file);
        if let Some(p) = self.duty_file.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.head_file.as_mut() {
            resolve(p);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub divisions: BTreeMap<String, DivisionConfig>,
}

impl RosterConfig {
    /// Read, resolve and validate a config file.
    pub fn load(path: &Path) -> RosterResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RosterError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml_str(&content, base)
    }

    pub fn from_yaml_str(content: &str, base: &Path) -> RosterResult<Self> {
        let mut config: RosterConfig = serde_yaml::from_str(content)?;
        for division in config.divisions.values_mut() {
            division.resolve_against(base);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_division(mut self, name: impl Into<String>, division: DivisionConfig) -> Self {
        self.divisions.insert(name.into(), division);
        self
    }

    pub fn validate(&self) -> RosterResult<()> {
        if self.cache.capacity == 0 {
            return Err(RosterError::Config(
                "cache.capacity must be at least 1".to_string(),
            ));
        }
        for (name, division) in &self.divisions {
            if division.schedule_file.as_os_str().is_empty() {
                return Err(RosterError::Config(format!(
                    "Division '{}' has an empty schedule_file",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn division(&self, name: &str) -> RosterResult<&DivisionConfig> {
        self.divisions
            .get(name)
            .ok_or_else(|| RosterError::UnknownDivision(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
cache:
  ttl_secs: 30
divisions:
  support:
    schedule_file: data/support.xlsx
    duty_file: /srv/duty.xlsx
  sales:
    schedule_file: sales.xlsx
    schedule_sheet: ГРАФИК 2
    head_file: heads.xlsx
    head_sheet_prefix: Руководители
"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = RosterConfig::from_yaml_str(SAMPLE, Path::new("/etc/roster")).unwrap();
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.capacity, 64);
        assert!(config.cache.verify_hash);

        let support = config.division("support").unwrap();
        assert_eq!(support.schedule_file, PathBuf::from("/etc/roster/data/support.xlsx"));
        assert_eq!(support.schedule_sheet, "ГРАФИК");
        assert_eq!(support.duty_file, Some(PathBuf::from("/srv/duty.xlsx")));
        assert_eq!(support.head_path(), Some(Path::new("/srv/duty.xlsx")));
        assert_eq!(support.duty_sheet(Month::July), "Дежурство Июль");
        assert_eq!(support.head_sheet(Month::May), "Старшие Май");

        let sales = config.division("sales").unwrap();
        assert_eq!(sales.schedule_sheet, "ГРАФИК 2");
        assert_eq!(sales.head_path(), Some(Path::new("/etc/roster/heads.xlsx")));
        assert_eq!(sales.head_sheet(Month::March), "Руководители Март");
        assert_eq!(sales.files().len(), 2);
    }

    #[test]
    fn test_unknown_division() {
        let config = RosterConfig::default();
        assert!(matches!(
            config.division("nope"),
            Err(RosterError::UnknownDivision(_))
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let yaml = "cache:\n  capacity: 0\n";
        assert!(matches!(
            RosterConfig::from_yaml_str(yaml, Path::new(".")),
            Err(RosterError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            RosterConfig::from_yaml_str("divisions: [", Path::new(".")),
            Err(RosterError::Yaml(_))
        ));
    }

    #[test]
    fn test_cache_settings_to_options() {
        let options = CacheSettings {
            ttl_secs: 5,
            capacity: 3,
            verify_hash: false,
        }
        .to_options();
        assert_eq!(options.ttl, Duration::from_secs(5));
        assert_eq!(options.capacity, 3);
        assert!(!options.verify_hash);
    }

    #[test]
    fn test_builder_and_files_dedup() {
        let config = RosterConfig::default().with_division(
            "ops",
            DivisionConfig::new("a.xlsx")
                .with_duty_file("b.xlsx")
                .with_head_file("b.xlsx"),
        );
        let ops = config.division("ops").unwrap();
        assert_eq!(ops.files(), vec![Path::new("a.xlsx"), Path::new("b.xlsx")]);
    }
}
