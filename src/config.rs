use crate::error::{Error, Result};
use crate::loader::TableSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default location of the STF Corte Aberta export
pub const DEFAULT_SOURCE: &str = "corte_aberta_stf.xlsx";
pub const DEFAULT_KEYWORDS: &str = "dano moral, repercussão geral, inconstitucionalidade";

pub const MIN_SYNTHETIC_COUNT: usize = 50;
pub const MAX_SYNTHETIC_COUNT: usize = 1000;
pub const SYNTHETIC_COUNT_STEP: usize = 50;
pub const DEFAULT_SYNTHETIC_COUNT: usize = 200;

pub const DEFAULT_SAMPLE_SIZE: usize = 5;
pub const DEFAULT_TOP_OUTCOMES: usize = 10;

/// Which courts to analyze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CourtSelector {
    /// Real STF export only (selector "A")
    Stf,
    /// Synthetic STJ records only (selector "B")
    Stj,
    /// STF export plus half as many synthetic STJ records
    Both,
}

impl FromStr for CourtSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" | "STF" => Ok(CourtSelector::Stf),
            "B" | "STJ" => Ok(CourtSelector::Stj),
            "BOTH" | "AMBOS" => Ok(CourtSelector::Both),
            other => Err(Error::Config(format!(
                "Invalid court '{}'. Allowed values are: STF (A), STJ (B), BOTH (AMBOS)",
                other
            ))),
        }
    }
}

impl fmt::Display for CourtSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CourtSelector::Stf => "STF",
            CourtSelector::Stj => "STJ",
            CourtSelector::Both => "BOTH",
        };
        f.write_str(s)
    }
}

/// Configuration for one analysis request
#[derive(Debug, Clone)]
pub struct Config {
    pub default_source: PathBuf,
    /// Table to try when the default location is unavailable
    pub alternate_source: Option<TableSource>,
    pub court: CourtSelector,
    pub synthetic_count: usize,
    /// Raw comma-separated keywords
    pub keywords: String,
    /// Fixes synthetic generation and sampling when set
    pub seed: Option<u64>,
    pub sample_size: usize,
    pub top_outcomes: usize,
}

impl Config {
    pub fn new(default_source: impl Into<PathBuf>) -> Self {
        Self {
            default_source: default_source.into(),
            alternate_source: None,
            court: CourtSelector::Stf,
            synthetic_count: DEFAULT_SYNTHETIC_COUNT,
            keywords: DEFAULT_KEYWORDS.to_string(),
            seed: None,
            sample_size: DEFAULT_SAMPLE_SIZE,
            top_outcomes: DEFAULT_TOP_OUTCOMES,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SYNTHETIC_COUNT..=MAX_SYNTHETIC_COUNT).contains(&self.synthetic_count)
            || self.synthetic_count % SYNTHETIC_COUNT_STEP != 0
        {
            return Err(Error::Config(format!(
                "Synthetic count must be between {} and {} in steps of {}, got {}",
                MIN_SYNTHETIC_COUNT, MAX_SYNTHETIC_COUNT, SYNTHETIC_COUNT_STEP, self.synthetic_count
            )));
        }

        if self.sample_size == 0 {
            return Err(Error::Config("Sample size must be at least 1".to_string()));
        }

        if self.top_outcomes == 0 {
            return Err(Error::Config("Outcome limit must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE)
    }
}

/// On-disk configuration (`jurisbot.yml`); every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub default_source: Option<PathBuf>,
    pub alternate_source: Option<PathBuf>,
    pub court: Option<String>,
    pub synthetic_count: Option<usize>,
    pub keywords: Option<String>,
    pub seed: Option<u64>,
    pub sample_size: Option<usize>,
    pub top_outcomes: Option<usize>,
}

impl FileConfig {
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}

/// Builder for creating configurations
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE)
    }
}

impl ConfigBuilder {
    /// Create a new builder with default settings
    pub fn new(default_source: impl Into<PathBuf>) -> Self {
        Self {
            config: Config::new(default_source),
        }
    }

    /// Apply every key present in a config file
    pub fn apply_file(mut self, file: FileConfig) -> Result<Self> {
        if let Some(path) = file.default_source {
            self = self.default_source(path);
        }
        if let Some(path) = file.alternate_source {
            self = self.alternate_source(TableSource::Path(path));
        }
        if let Some(court) = file.court {
            self = self.court_str(&court)?;
        }
        if let Some(count) = file.synthetic_count {
            self = self.synthetic_count(count);
        }
        if let Some(keywords) = file.keywords {
            self = self.keywords(keywords);
        }
        if let Some(seed) = file.seed {
            self = self.seed(seed);
        }
        if let Some(size) = file.sample_size {
            self = self.sample_size(size);
        }
        if let Some(top) = file.top_outcomes {
            self = self.top_outcomes(top);
        }
        Ok(self)
    }

    pub fn default_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.default_source = path.into();
        self
    }

    pub fn alternate_source(mut self, source: TableSource) -> Self {
        self.config.alternate_source = Some(source);
        self
    }

    pub fn court(mut self, court: CourtSelector) -> Self {
        self.config.court = court;
        self
    }

    /// Set the court selector from a string
    pub fn court_str(mut self, court: &str) -> Result<Self> {
        self.config.court = court.parse()?;
        Ok(self)
    }

    pub fn synthetic_count(mut self, count: usize) -> Self {
        self.config.synthetic_count = count;
        self
    }

    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.config.keywords = keywords.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    pub fn top_outcomes(mut self, top: usize) -> Self {
        self.config.top_outcomes = top;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
