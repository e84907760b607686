use std::sync::{atomic::AtomicBool, Mutex, MutexGuard, PoisonError};

use cosmian_crypto_core::{
    reexport::rand_core::{RngCore, SeedableRng},
    CsRng,
};
use tracing::debug;
use zeroize::Zeroizing;

use super::{
    pairing::PairingEngine,
    primitives::{decaps, encaps, keygen, puncture},
    Ciphertext, PrivateKey, PublicKey, SharedSecret,
};
use crate::{config::KemConfig, Error};

/// Key encapsulation mechanism whose decapsulation keys can be punctured on
/// the encapsulations they opened.
pub trait PuncturableKem {
    type Error: std::error::Error;

    /// Generates a new encapsulation of a fresh secret.
    fn encaps<const LENGTH: usize>(
        &self,
        pk: &PublicKey<LENGTH>,
    ) -> Result<(SharedSecret<LENGTH>, Ciphertext<LENGTH>), Self::Error>;

    /// Attempts opening the given encapsulation with the given key.
    ///
    /// Returns the encapsulated secret upon success or `None` if the key was
    /// punctured on this encapsulation, or if the encapsulation is invalid.
    fn decaps<const LENGTH: usize>(
        &self,
        sk: &PrivateKey<LENGTH>,
        ciphertext: &Ciphertext<LENGTH>,
    ) -> Result<Option<SharedSecret<LENGTH>>, Self::Error>;

    /// Punctures the given key on the given encapsulation. Returns the number
    /// of key slots erased.
    fn puncture<const LENGTH: usize>(
        &self,
        sk: &PrivateKey<LENGTH>,
        ciphertext: &Ciphertext<LENGTH>,
    ) -> usize;
}

/// Entry point of the Bloom filter KEM.
///
/// It owns the random number generator and the pairing engine; the keys it
/// generates can be shared across threads.
pub struct BloomFilterKem {
    rng: Mutex<CsRng>,
    engine: PairingEngine,
}

impl BloomFilterKem {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            rng: Mutex::new(CsRng::from_entropy()),
            engine: PairingEngine::acquire()?,
        })
    }

    pub fn rng(&self) -> MutexGuard<CsRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a new generator seeded from the shared one. The shared
    /// generator is only locked while the seed is drawn.
    fn fork_rng(&self) -> CsRng {
        let mut seed = Zeroizing::new([0; 32]);
        self.rng().fill_bytes(&mut *seed);
        CsRng::from_seed(*seed)
    }

    #[must_use]
    pub fn engine(&self) -> &PairingEngine {
        &self.engine
    }

    /// Generates a new key pair sized after the given configuration.
    pub fn keygen<const KEY_LENGTH: usize>(
        &self,
        config: &KemConfig,
    ) -> Result<(PrivateKey<KEY_LENGTH>, PublicKey<KEY_LENGTH>), Error> {
        self.keygen_with_cancellation(config, &AtomicBool::new(false))
    }

    /// Generates a new key pair sized after the given configuration.
    ///
    /// Setting the `cancel` flag interrupts the generation, which then
    /// returns [`Error::Cancelled`]. The partial key material is discarded.
    pub fn keygen_with_cancellation<const KEY_LENGTH: usize>(
        &self,
        config: &KemConfig,
        cancel: &AtomicBool,
    ) -> Result<(PrivateKey<KEY_LENGTH>, PublicKey<KEY_LENGTH>), Error> {
        config.validate()?;
        let params = config.parameters()?;
        let batch_size = config.keygen.batch_size;
        let mut rng = self.fork_rng();
        let rng = &mut rng;
        match config.keygen.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("bfkem-keygen-{i}"))
                    .build()?;
                debug!(threads, "using a dedicated key generation pool");
                pool.install(|| keygen(rng, &self.engine, params, batch_size, cancel))
            }
            None => keygen(rng, &self.engine, params, batch_size, cancel),
        }
    }
}

impl PuncturableKem for BloomFilterKem {
    type Error = Error;

    fn encaps<const KEY_LENGTH: usize>(
        &self,
        pk: &PublicKey<KEY_LENGTH>,
    ) -> Result<(SharedSecret<KEY_LENGTH>, Ciphertext<KEY_LENGTH>), Error> {
        encaps(&mut self.fork_rng(), &self.engine, pk)
    }

    fn decaps<const KEY_LENGTH: usize>(
        &self,
        sk: &PrivateKey<KEY_LENGTH>,
        ciphertext: &Ciphertext<KEY_LENGTH>,
    ) -> Result<Option<SharedSecret<KEY_LENGTH>>, Error> {
        decaps(&self.engine, sk, ciphertext)
    }

    fn puncture<const KEY_LENGTH: usize>(
        &self,
        sk: &PrivateKey<KEY_LENGTH>,
        ciphertext: &Ciphertext<KEY_LENGTH>,
    ) -> usize {
        puncture(sk, ciphertext)
    }
}
