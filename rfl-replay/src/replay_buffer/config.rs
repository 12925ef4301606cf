//! Configuration of replay buffers.
//!
//! This module provides configuration structures for the replay buffers:
//! - Basic buffer configuration (capacity, seed)
//! - Prioritized sampling configuration
//! - Serialization to and from YAML files
use crate::error::ReplayError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fmt,
    fs::File,
    io::{BufReader, Write},
    path::Path,
    str::FromStr,
};

/// How prioritized replay turns priorities into sampling probabilities.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMethod {
    /// `P(i)` proportional to `(p_i + eps)^alpha`.
    Proportional,

    /// `P(i)` proportional to `(1 / r_i)^alpha`, with `r_i` the 1-based ascending rank of `p_i`.
    Rank,
}

impl SamplingMethod {
    /// Default prioritization exponent of the method.
    pub fn default_alpha(&self) -> f32 {
        match self {
            Self::Proportional => 0.6,
            Self::Rank => 0.7,
        }
    }

    /// Default importance sampling exponent of the method.
    pub fn default_beta(&self) -> f32 {
        match self {
            Self::Proportional => 0.4,
            Self::Rank => 0.5,
        }
    }
}

impl FromStr for SamplingMethod {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proportional" => Ok(Self::Proportional),
            "rank" => Ok(Self::Rank),
            _ => Err(ReplayError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for SamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proportional => write!(f, "proportional"),
            Self::Rank => write!(f, "rank"),
        }
    }
}

/// Configuration of prioritized sampling.
///
/// `alpha` and `beta` fall back to the defaults of `method` when not given.
///
/// ```rust
/// use rfl_replay::{PrioritizedConfig, SamplingMethod};
///
/// let config = PrioritizedConfig::default()
///     .method(SamplingMethod::Rank)
///     .beta(0.6);
/// assert_eq!(config.alpha_or_default(), 0.7);
/// assert_eq!(config.beta_or_default(), 0.6);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PrioritizedConfig {
    /// Sampling method.
    pub method: SamplingMethod,

    /// Exponent for prioritization. 0 results in uniform sampling.
    pub alpha: Option<f32>,

    /// Initial exponent of importance sampling weights.
    pub beta: Option<f32>,
}

impl Default for PrioritizedConfig {
    fn default() -> Self {
        Self {
            method: SamplingMethod::Proportional,
            alpha: None,
            beta: None,
        }
    }
}

impl PrioritizedConfig {
    /// Sets the sampling method.
    pub fn method(mut self, method: SamplingMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the prioritization exponent `alpha`.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Sets the initial importance sampling exponent `beta`.
    pub fn beta(mut self, beta: f32) -> Self {
        self.beta = Some(beta);
        self
    }

    /// Returns `alpha`, or the default of the sampling method.
    pub fn alpha_or_default(&self) -> f32 {
        self.alpha.unwrap_or_else(|| self.method.default_alpha())
    }

    /// Returns `beta`, or the default of the sampling method.
    pub fn beta_or_default(&self) -> f32 {
        self.beta.unwrap_or_else(|| self.method.default_beta())
    }
}

/// Selection policy of a replay buffer.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum ReplayKind {
    /// Uniform sampling with replacement.
    Uniform,

    /// Prioritized sampling.
    Prioritized(PrioritizedConfig),
}

/// Configuration of replay buffers.
///
/// # Examples
///
/// ```rust
/// use rfl_replay::{PrioritizedConfig, ReplayBufferConfig, ReplayKind};
///
/// // Uniform sampling
/// let config = ReplayBufferConfig::default()
///     .capacity(10000)
///     .seed(42);
///
/// // Prioritized sampling
/// let config = ReplayBufferConfig::default()
///     .capacity(10000)
///     .kind(ReplayKind::Prioritized(PrioritizedConfig::default()));
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of transitions kept in the buffer.
    pub capacity: usize,

    /// Random seed used for sampling.
    pub seed: u64,

    /// Selection policy.
    pub kind: ReplayKind,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            seed: 0,
            kind: ReplayKind::Uniform,
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the selection policy.
    pub fn kind(mut self, kind: ReplayKind) -> Self {
        self.kind = kind;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_replay_buffer_config() -> Result<()> {
        let config = ReplayBufferConfig::default()
            .capacity(500)
            .seed(7)
            .kind(ReplayKind::Prioritized(
                PrioritizedConfig::default()
                    .method(SamplingMethod::Rank)
                    .alpha(0.5),
            ));

        let dir = TempDir::new("replay_buffer_config")?;
        let path = dir.path().join("replay_buffer_config.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = ReplayBufferConfig::load(&path)?;
        assert_eq!(config, config_);

        let yaml = serde_yaml::to_string(&config)?;
        println!("{}", yaml);
        assert!(yaml.contains("rank"));

        Ok(())
    }

    #[test]
    fn test_method_defaults() {
        let config = PrioritizedConfig::default();
        assert_eq!(config.alpha_or_default(), 0.6);
        assert_eq!(config.beta_or_default(), 0.4);

        let config = config.method(SamplingMethod::Rank);
        assert_eq!(config.alpha_or_default(), 0.7);
        assert_eq!(config.beta_or_default(), 0.5);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!(
            "proportional".parse::<SamplingMethod>(),
            Ok(SamplingMethod::Proportional)
        );
        assert_eq!("rank".parse::<SamplingMethod>(), Ok(SamplingMethod::Rank));
        assert_eq!(
            "greedy".parse::<SamplingMethod>(),
            Err(ReplayError::UnsupportedMethod("greedy".to_string()))
        );
        assert_eq!(SamplingMethod::Rank.to_string(), "rank");
    }
}
