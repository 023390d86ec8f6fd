//! Network and device configuration
//!
//! [`PmaConfig`] carries the five values `configure` writes; [`DeviceConfig`]
//! locates the register window for the MMIO bus. Both start from the chip's
//! power-on defaults and can be overridden from the environment:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `PMA_CONTEXT` | Global context (0-127) |
//! | `PMA_DISTANCE_MODE` | `l1` or `lsup` |
//! | `PMA_CLASSIFIER_MODE` | `rbf` or `knn` |
//! | `PMA_MIN_IF` / `PMA_MAX_IF` | Influence field bounds |
//! | `PMA_DEVICE` | Device node holding the register window |
//! | `PMA_BASE` | Window base (decimal or `0x` hex) |

use crate::error::{PmaError, Result};
use pma_chip::limits::{DEFAULT_CONTEXT, DEFAULT_MAX_IF, DEFAULT_MIN_IF};
use pma_chip::regs::{ncr, WINDOW_BASE, WINDOW_LEN};
use pma_chip::{ClassifierMode, DistanceMode};
use std::path::{Path, PathBuf};

/// Network configuration written by `configure`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmaConfig {
    /// Global context (7 bits, 0 matches every neuron)
    pub context: u16,
    /// Distance norm
    pub distance_mode: DistanceMode,
    /// Classifier mode
    pub classifier_mode: ClassifierMode,
    /// Minimum influence field
    pub min_influence: u16,
    /// Maximum influence field
    pub max_influence: u16,
}

impl Default for PmaConfig {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT,
            distance_mode: DistanceMode::L1,
            classifier_mode: ClassifierMode::Rbf,
            min_influence: DEFAULT_MIN_IF,
            max_influence: DEFAULT_MAX_IF,
        }
    }
}

impl PmaConfig {
    /// Set the global context
    #[must_use]
    pub const fn with_context(mut self, context: u16) -> Self {
        self.context = context;
        self
    }

    /// Set the distance norm
    #[must_use]
    pub const fn with_distance_mode(mut self, mode: DistanceMode) -> Self {
        self.distance_mode = mode;
        self
    }

    /// Set the classifier mode
    #[must_use]
    pub const fn with_classifier_mode(mut self, mode: ClassifierMode) -> Self {
        self.classifier_mode = mode;
        self
    }

    /// Set the influence field bounds
    #[must_use]
    pub const fn with_influence(mut self, min: u16, max: u16) -> Self {
        self.min_influence = min;
        self.max_influence = max;
        self
    }

    /// Defaults overridden by `PMA_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed, or the
    /// resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = env_var("PMA_CONTEXT") {
            config.context = parse_u16("PMA_CONTEXT", &v)?;
        }
        if let Some(v) = env_var("PMA_DISTANCE_MODE") {
            config.distance_mode = v.parse().map_err(PmaError::invalid_config)?;
        }
        if let Some(v) = env_var("PMA_CLASSIFIER_MODE") {
            config.classifier_mode = v.parse().map_err(PmaError::invalid_config)?;
        }
        if let Some(v) = env_var("PMA_MIN_IF") {
            config.min_influence = parse_u16("PMA_MIN_IF", &v)?;
        }
        if let Some(v) = env_var("PMA_MAX_IF") {
            config.max_influence = parse_u16("PMA_MAX_IF", &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check host-side sanity of the values.
    ///
    /// `configure` itself writes whatever it is given; the chip clamps or
    /// rejects out-of-range influence values on its own.
    ///
    /// # Errors
    ///
    /// Returns error if the context does not fit the 7-bit field or the
    /// minimum influence exceeds the maximum.
    pub fn validate(&self) -> Result<()> {
        if self.context & !ncr::CONTEXT != 0 {
            return Err(PmaError::invalid_config(format!(
                "context {} outside 0..={}",
                self.context,
                ncr::CONTEXT
            )));
        }
        if self.min_influence > self.max_influence {
            return Err(PmaError::invalid_config(format!(
                "min influence {} above max influence {}",
                self.min_influence, self.max_influence
            )));
        }
        Ok(())
    }
}

/// Location of the memory-mapped register window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Device node to map
    pub path: PathBuf,
    /// Offset of the window within the device node
    pub base: u64,
    /// Window length in bytes
    pub len: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/dev/mem"),
            base: WINDOW_BASE,
            len: WINDOW_LEN,
        }
    }
}

impl DeviceConfig {
    /// Window at `base` of `path`
    pub fn new(path: impl Into<PathBuf>, base: u64) -> Self {
        Self {
            path: path.into(),
            base,
            len: WINDOW_LEN,
        }
    }

    /// Replace the window base with a decimal or `0x` hex address
    ///
    /// # Errors
    ///
    /// Returns error if `base` is not a valid address.
    pub fn with_base_str(mut self, base: &str) -> Result<Self> {
        self.base = parse_address(base)
            .ok_or_else(|| PmaError::invalid_config(format!("bad base address '{base}'")))?;
        Ok(self)
    }

    /// Defaults overridden by `PMA_DEVICE` and `PMA_BASE`
    ///
    /// # Errors
    ///
    /// Returns error if `PMA_BASE` is set but is not a valid address.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env_var)
    }

    /// Device named by `flag` or, failing that, by `PMA_DEVICE`
    ///
    /// `None` when neither is set, meaning no hardware was asked for.
    ///
    /// # Errors
    ///
    /// Returns error if `PMA_BASE` is set but is not a valid address.
    pub fn requested(flag: Option<&Path>) -> Result<Option<Self>> {
        Self::requested_from(flag, env_var)
    }

    fn requested_from(
        flag: Option<&Path>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>> {
        if flag.is_none() && var("PMA_DEVICE").is_none() {
            return Ok(None);
        }
        let mut config = Self::from_vars(&var)?;
        if let Some(path) = flag {
            config.path = path.to_path_buf();
        }
        Ok(Some(config))
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = var("PMA_DEVICE") {
            config.path = PathBuf::from(path);
        }
        if let Some(base) = var("PMA_BASE") {
            config = config.with_base_str(&base)?;
        }
        Ok(config)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_u16(name: &str, value: &str) -> Result<u16> {
    parse_address(value)
        .and_then(|v| u16::try_from(v).ok())
        .ok_or_else(|| PmaError::invalid_config(format!("{name}: expected 16-bit value, got '{value}'")))
}

/// Parse decimal or `0x`-prefixed hex
pub(crate) fn parse_address(value: &str) -> Option<u64> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => value.replace('_', "").parse().ok(),
    }
}
