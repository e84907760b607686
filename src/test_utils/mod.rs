use crate::{
    config::{KemConfig, KeygenConfig},
    core::{api::BloomFilterKem, PrivateKey, PublicKey},
    Error,
};

/// Secret length used by the tests, smaller than the default one to keep
/// ciphertexts short.
pub const TEST_KEY_LENGTH: usize = 16;

/// Configuration of a small key: 32 punctures with a 10% false-positive
/// probability, i.e. 154 slots and 4 hash functions.
#[must_use]
pub fn small_config() -> KemConfig {
    KemConfig::new(32, 0.1).with_keygen(KeygenConfig {
        threads: Some(2),
        batch_size: 16,
    })
}

/// Generates a small key pair.
pub fn small_keygen(
    kem: &BloomFilterKem,
) -> Result<(PrivateKey<TEST_KEY_LENGTH>, PublicKey<TEST_KEY_LENGTH>), Error> {
    kem.keygen(&small_config())
}
