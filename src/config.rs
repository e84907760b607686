//! Configuration of the Bloom filter KEM.
//!
//! ```json
//! {
//!     "capacity": 1024,
//!     "false_positive_probability": 0.001,
//!     "keygen": { "threads": 4, "batch_size": 256 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::{core::bloom_filter::BloomFilterParameters, Error};

/// Default number of slots computed by a key generation task.
pub const DEFAULT_KEYGEN_BATCH_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KemConfig {
    /// Number of punctures the key is sized for.
    pub capacity: u64,
    /// Probability that a fresh ciphertext cannot be decapsulated once
    /// `capacity` ciphertexts have been punctured.
    pub false_positive_probability: f64,
    #[serde(default)]
    pub keygen: KeygenConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenConfig {
    /// Size of the dedicated thread pool. The global pool is used if none is
    /// given.
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_KEYGEN_BATCH_SIZE
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            threads: None,
            batch_size: DEFAULT_KEYGEN_BATCH_SIZE,
        }
    }
}

impl KemConfig {
    #[must_use]
    pub fn new(capacity: u64, false_positive_probability: f64) -> Self {
        Self {
            capacity,
            false_positive_probability,
            keygen: KeygenConfig::default(),
        }
    }

    #[must_use]
    pub fn with_keygen(mut self, keygen: KeygenConfig) -> Self {
        self.keygen = keygen;
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let config = serde_json::from_slice::<Self>(bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.parameters()?;
        if self.keygen.batch_size == 0 {
            return Err(Error::ParameterError(
                "the key generation batch size must be positive".to_string(),
            ));
        }
        if self.keygen.threads == Some(0) {
            return Err(Error::ParameterError(
                "the key generation thread pool cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Derives the Bloom filter parameters.
    pub fn parameters(&self) -> Result<BloomFilterParameters, Error> {
        BloomFilterParameters::new(self.capacity, self.false_positive_probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() -> Result<(), Error> {
        let config = KemConfig::parse(
            br#"{
                "capacity": 32,
                "false_positive_probability": 0.1,
                "keygen": { "threads": 2, "batch_size": 16 }
            }"#,
        )?;
        assert_eq!(config.capacity, 32);
        assert_eq!(config.keygen.threads, Some(2));
        assert_eq!(config.keygen.batch_size, 16);
        let params = config.parameters()?;
        assert_eq!(params.bitset_size(), 154);
        assert_eq!(params.hash_count(), 4);

        // The key generation settings are optional.
        let config = KemConfig::parse(br#"{ "capacity": 32, "false_positive_probability": 0.1 }"#)?;
        assert_eq!(config.keygen, KeygenConfig::default());
        let config =
            KemConfig::parse(br#"{ "capacity": 32, "false_positive_probability": 0.1, "keygen": {} }"#)?;
        assert_eq!(config.keygen, KeygenConfig::default());

        // The configuration serializes back to the same value.
        let bytes = serde_json::to_vec(&config)?;
        assert_eq!(KemConfig::parse(&bytes)?, config);
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            KemConfig::parse(br#"{ "capacity": 32 }"#),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            KemConfig::parse(br#"{ "capacity": 0, "false_positive_probability": 0.1 }"#),
            Err(Error::ParameterError(_))
        ));
        assert!(matches!(
            KemConfig::parse(br#"{ "capacity": 32, "false_positive_probability": 1.0 }"#),
            Err(Error::ParameterError(_))
        ));
        assert!(matches!(
            KemConfig::parse(
                br#"{ "capacity": 32, "false_positive_probability": 0.1, "keygen": { "batch_size": 0 } }"#
            ),
            Err(Error::ParameterError(_))
        ));
        assert!(matches!(
            KemConfig::parse(
                br#"{ "capacity": 32, "false_positive_probability": 0.1, "keygen": { "threads": 0 } }"#
            ),
            Err(Error::ParameterError(_))
        ));
    }
}
