//! `VelesGraph` Configuration Module
//!
//! Provides configuration file support via `velesgraph.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (builder methods, tests)
//! 2. Environment variables (`VELESGRAPH_*`, sections split by `__`)
//! 3. Configuration file (`velesgraph.toml`)
//! 4. Default values
//!
//! Parameter keys keep the names used throughout the ANN graph literature
//! (`R`, `L_refine`, `A`, `n_try`, `ITER`, `S`, `C`, `alpha`, `K`,
//! `L_search`, `K_search`). Lower-case spellings are accepted as aliases so
//! that environment variables work.
//!
//! ```toml
//! family = "nsg"
//!
//! [refine]
//! R = 32
//! L_refine = 64
//! C = 200
//!
//! [search]
//! L_search = 100
//! K_search = 10
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::refine::GraphFamily;

/// Default seed for the pseudo-random parts of refinement.
pub const DEFAULT_SEED: u64 = 0x5DEE_CE66_D1A4_B5B5;

/// Default number of node ids handed to a worker at a time.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A key required by the selected graph family is absent.
    #[error("Missing required parameter '{0}'")]
    MissingKey(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Refinement parameters.
///
/// Every knob is optional here; which ones are required depends on the
/// [`GraphFamily`] and is checked by [`RefineParams::validate_for`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineParams {
    /// Out-degree cap.
    #[serde(rename = "R", alias = "r", skip_serializing_if = "Option::is_none")]
    pub r: Option<usize>,
    /// Beam width used while generating candidates.
    #[serde(
        rename = "L_refine",
        alias = "L",
        alias = "l_refine",
        alias = "l",
        skip_serializing_if = "Option::is_none"
    )]
    pub l: Option<usize>,
    /// Maximum number of pool entries the occlusion test examines (NSG).
    #[serde(rename = "C", alias = "c", skip_serializing_if = "Option::is_none")]
    pub c: Option<usize>,
    /// Neighbor count of k-NN style graphs (KGraph, DPG, EFANNA).
    #[serde(rename = "K", alias = "k", skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
    /// VAMANA relaxation factor for the second pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
    /// SSG angle threshold in degrees.
    #[serde(rename = "A", alias = "a", skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    /// Alternate propagation seeds per node (SSG).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_try: Option<usize>,
    /// Sample size of fresh neighbors per join round (NN-descent).
    #[serde(rename = "S", alias = "s", skip_serializing_if = "Option::is_none")]
    pub s: Option<usize>,
    /// Number of join/update rounds (NN-descent).
    #[serde(rename = "ITER", alias = "iter", skip_serializing_if = "Option::is_none")]
    pub iter: Option<usize>,
    /// Seed for sampling and beam padding.
    pub seed: u64,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            r: None,
            l: None,
            c: None,
            k: None,
            alpha: None,
            angle: None,
            n_try: None,
            s: None,
            iter: None,
            seed: DEFAULT_SEED,
        }
    }
}

/// Returns a positive value for `key` or the matching error.
pub(crate) fn require_positive(key: &str, value: Option<usize>) -> Result<usize, ConfigError> {
    match value {
        None => Err(ConfigError::MissingKey(key.to_string())),
        Some(0) => Err(ConfigError::invalid(key, "value must be positive")),
        Some(v) => Ok(v),
    }
}

impl RefineParams {
    /// Checks that every key the family needs is present and sane.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] for an absent key and
    /// [`ConfigError::InvalidValue`] for an out-of-range one.
    pub fn validate_for(&self, family: GraphFamily) -> Result<(), ConfigError> {
        match family {
            GraphFamily::Nsg => {
                require_positive("R", self.r)?;
                require_positive("L_refine", self.l)?;
                if let Some(c) = self.c {
                    require_positive("C", Some(c))?;
                }
            }
            GraphFamily::Ssg => {
                require_positive("R", self.r)?;
                require_positive("L_refine", self.l)?;
                require_positive("n_try", self.n_try)?;
                self.require_angle()?;
            }
            GraphFamily::Vamana => {
                require_positive("R", self.r)?;
                require_positive("L_refine", self.l)?;
                self.require_alpha()?;
            }
            GraphFamily::Fanng => {
                require_positive("R", self.r)?;
            }
            GraphFamily::Kgraph => {
                require_positive("K", self.k)?;
            }
            GraphFamily::Dpg => {
                let k = require_positive("K", self.k)?;
                if k < 2 {
                    return Err(ConfigError::invalid("K", "DPG keeps K / 2 edges, K must be >= 2"));
                }
            }
            GraphFamily::Efanna => {
                let k = require_positive("K", self.k)?;
                let l = require_positive("L_refine", self.l)?;
                require_positive("R", self.r)?;
                require_positive("S", self.s)?;
                require_positive("ITER", self.iter)?;
                if l < k {
                    return Err(ConfigError::invalid(
                        "L_refine",
                        format!("value {l} must be >= K ({k})"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns the angle threshold `A` in degrees.
    pub(crate) fn require_angle(&self) -> Result<f32, ConfigError> {
        let angle = self
            .angle
            .ok_or_else(|| ConfigError::MissingKey("A".to_string()))?;
        if !(angle > 0.0 && angle <= 180.0) {
            return Err(ConfigError::invalid(
                "A",
                format!("value {angle} is out of range (0, 180]"),
            ));
        }
        Ok(angle)
    }

    /// Returns the VAMANA relaxation factor.
    pub(crate) fn require_alpha(&self) -> Result<f32, ConfigError> {
        let alpha = self
            .alpha
            .ok_or_else(|| ConfigError::MissingKey("alpha".to_string()))?;
        if !(alpha >= 1.0 && alpha.is_finite()) {
            return Err(ConfigError::invalid(
                "alpha",
                format!("value {alpha} must be a finite number >= 1"),
            ));
        }
        Ok(alpha)
    }
}

/// Query-time parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Beam width.
    #[serde(rename = "L_search", alias = "l_search", skip_serializing_if = "Option::is_none")]
    pub l: Option<usize>,
    /// Number of results per query.
    #[serde(rename = "K_search", alias = "k_search", skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

impl SearchParams {
    /// Resolves `(L_search, K_search)`.
    ///
    /// # Errors
    ///
    /// Fails when a key is missing, zero, or when `L_search < K_search`.
    pub fn resolve(&self) -> Result<(usize, usize), ConfigError> {
        let l = require_positive("L_search", self.l)?;
        let k = require_positive("K_search", self.k)?;
        if l < k {
            return Err(ConfigError::invalid(
                "L_search",
                format!("value {l} must be >= K_search ({k})"),
            ));
        }
        Ok((l, k))
    }
}

/// Worker scheduling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Minimum number of consecutive node ids a worker takes at once.
    pub chunk_size: usize,
    /// Worker threads (0 = rayon global pool).
    pub num_threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            num_threads: 0,
        }
    }
}

/// Main `VelesGraph` configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph family to refine.
    pub family: GraphFamily,
    /// Refinement parameters.
    pub refine: RefineParams,
    /// Query parameters.
    pub search: SearchParams,
    /// Scheduling.
    pub parallel: ParallelConfig,
}

impl GraphConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("velesgraph.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VELESGRAPH_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration for the selected family.
    ///
    /// Search keys are only checked for consistency here; they become
    /// mandatory when a query is routed.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.refine.validate_for(self.family)?;

        if self.search.l.is_some() || self.search.k.is_some() {
            self.search.resolve()?;
        }

        if self.parallel.chunk_size == 0 {
            return Err(ConfigError::invalid(
                "parallel.chunk_size",
                "value must be positive",
            ));
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
