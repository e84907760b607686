//! Implements the core functionalities of the Bloom filter KEM.

use std::{
    fmt,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use cosmian_crypto_core::SymmetricKey;
use zeroize::Zeroize;

#[macro_use]
pub mod macros;

pub mod api;
pub mod bloom_filter;
pub mod pairing;
pub mod primitives;

#[cfg(feature = "serialization")]
pub mod serialization;


use self::{
    bloom_filter::BloomFilterParameters,
    pairing::{PairingEngine, G1, G1_LENGTH, G2},
};
use crate::Error;

/// Default length of the encapsulated secret: 32 bytes.
pub const SHARED_SECRET_LENGTH: usize = 32;

/// Secret produced by an encapsulation.
pub type SharedSecret<const KEY_LENGTH: usize> = SymmetricKey<KEY_LENGTH>;

/// State of a single slot of the private key.
///
/// The only allowed transition is `Present -> Punctured`.
#[derive(Debug)]
pub enum KeySlot {
    Present(G2),
    Punctured,
}

impl KeySlot {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Punctures the slot. Returns `true` if the slot was still present.
    fn puncture(&mut self) -> bool {
        match self {
            Self::Present(share) => {
                share.zeroize();
                *self = Self::Punctured;
                true
            }
            Self::Punctured => false,
        }
    }
}

impl Drop for KeySlot {
    fn drop(&mut self) {
        if let Self::Present(share) = self {
            share.zeroize();
        }
    }
}

/// Private key of the Bloom filter KEM.
///
/// Each slot is independently locked: puncturing a slot never blocks the
/// decapsulations that do not use it.
pub struct PrivateKey<const KEY_LENGTH: usize> {
    params: BloomFilterParameters,
    slots: Vec<RwLock<KeySlot>>,
    master_public: G1,
}

impl<const KEY_LENGTH: usize> fmt::Debug for PrivateKey<KEY_LENGTH> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("params", &self.params)
            .field("punctured_count", &self.punctured_count())
            .finish_non_exhaustive()
    }
}

/// Public key of the Bloom filter KEM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey<const KEY_LENGTH: usize> {
    params: BloomFilterParameters,
    master_public: G1,
}

/// Ciphertext of the Bloom filter KEM: a tag and one masked seed per position
/// of the tag in the Bloom filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ciphertext<const KEY_LENGTH: usize> {
    tag: G1,
    tag_bytes: [u8; G1_LENGTH],
    shares: Vec<[u8; KEY_LENGTH]>,
}

impl<const KEY_LENGTH: usize> PrivateKey<KEY_LENGTH> {
    pub(crate) fn new(
        params: BloomFilterParameters,
        shares: impl IntoIterator<Item = G2>,
        master_public: G1,
    ) -> Result<Self, Error> {
        Self::from_slots(
            params,
            shares.into_iter().map(KeySlot::Present),
            master_public,
        )
    }

    /// Slots are moved straight into their locks: no intermediate buffer
    /// holds the secret shares.
    pub(crate) fn from_slots(
        params: BloomFilterParameters,
        slots: impl IntoIterator<Item = KeySlot>,
        master_public: G1,
    ) -> Result<Self, Error> {
        let locked_slots = slots.into_iter().map(RwLock::new).collect::<Vec<_>>();
        if locked_slots.len() != params.bitset_size() {
            return Err(Error::InvalidSize(format!(
                "private key holds {} slots, expected {}",
                locked_slots.len(),
                params.bitset_size()
            )));
        }
        Ok(Self {
            params,
            slots: locked_slots,
            master_public,
        })
    }

    #[must_use]
    pub fn params(&self) -> &BloomFilterParameters {
        &self.params
    }

    #[must_use]
    pub fn key_size(&self) -> usize {
        KEY_LENGTH
    }

    #[must_use]
    pub fn master_public(&self) -> &G1 {
        &self.master_public
    }

    /// Returns the public key associated to this private key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey<KEY_LENGTH> {
        PublicKey {
            params: self.params,
            master_public: self.master_public,
        }
    }

    // A slot is assigned in a single step, a poisoned lock therefore still
    // guards a consistent state.
    pub(crate) fn read_slot(&self, index: usize) -> Option<RwLockReadGuard<'_, KeySlot>> {
        self.slots
            .get(index)
            .map(|slot| slot.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write_slot(&self, index: usize) -> Option<RwLockWriteGuard<'_, KeySlot>> {
        self.slots
            .get(index)
            .map(|slot| slot.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns a copy of the secret share held at the given index, if any.
    pub(crate) fn secret_share(&self, index: usize) -> Option<G2> {
        match &*self.read_slot(index)? {
            KeySlot::Present(share) => Some(*share),
            KeySlot::Punctured => None,
        }
    }

    /// Punctures the slot at the given index. Returns `true` if the slot was
    /// still present. Out-of-range indices are ignored.
    pub(crate) fn puncture_slot(&self, index: usize) -> bool {
        self.write_slot(index)
            .map_or(false, |mut slot| slot.puncture())
    }

    /// Returns `true` if the key for the given index is still available.
    #[must_use]
    pub fn is_available(&self, index: usize) -> bool {
        self.read_slot(index)
            .map_or(false, |slot| slot.is_present())
    }

    /// Returns the number of punctured slots.
    #[must_use]
    pub fn punctured_count(&self) -> usize {
        (0..self.slots.len())
            .filter(|&index| !self.is_available(index))
            .count()
    }

    /// Returns the proportion of punctured slots.
    #[must_use]
    pub fn saturation(&self) -> f64 {
        self.punctured_count() as f64 / self.params.bitset_size() as f64
    }

    /// Returns `true` if at least one of the slots matching this ciphertext
    /// is still available. This does not check the validity of the
    /// ciphertext.
    #[must_use]
    pub fn can_decapsulate(&self, ciphertext: &Ciphertext<KEY_LENGTH>) -> bool {
        self.params
            .positions(ciphertext.tag_bytes())
            .into_iter()
            .any(|index| self.is_available(index))
    }
}

impl<const KEY_LENGTH: usize> PublicKey<KEY_LENGTH> {
    #[cfg_attr(not(feature = "serialization"), allow(dead_code))]
    pub(crate) fn new(params: BloomFilterParameters, master_public: G1) -> Self {
        Self {
            params,
            master_public,
        }
    }

    #[must_use]
    pub fn params(&self) -> &BloomFilterParameters {
        &self.params
    }

    #[must_use]
    pub fn key_size(&self) -> usize {
        KEY_LENGTH
    }

    #[must_use]
    pub fn master_public(&self) -> &G1 {
        &self.master_public
    }
}

impl<const KEY_LENGTH: usize> Ciphertext<KEY_LENGTH> {
    /// The given bytes must be the canonical encoding of the tag.
    pub(crate) fn new(
        tag: G1,
        tag_bytes: [u8; G1_LENGTH],
        shares: Vec<[u8; KEY_LENGTH]>,
    ) -> Self {
        Self {
            tag,
            tag_bytes,
            shares,
        }
    }

    #[must_use]
    pub fn tag(&self) -> &G1 {
        &self.tag
    }

    /// Canonical encoding of the tag, from which the positions of the
    /// ciphertext in the Bloom filter are derived.
    #[must_use]
    pub fn tag_bytes(&self) -> &[u8; G1_LENGTH] {
        &self.tag_bytes
    }

    #[must_use]
    pub fn shares(&self) -> &[[u8; KEY_LENGTH]] {
        &self.shares
    }

    /// Length of the wire encoding of this ciphertext.
    #[must_use]
    pub fn length(&self) -> usize {
        G1_LENGTH + self.shares.len() * KEY_LENGTH
    }

    /// Encodes the ciphertext as the compressed tag followed by the shares,
    /// in position order.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.length());
        bytes.extend_from_slice(&self.tag_bytes);
        for share in &self.shares {
            bytes.extend_from_slice(share);
        }
        bytes
    }

    /// Decodes a ciphertext from its wire encoding.
    ///
    /// The number of shares is deduced from the length of the input; it is
    /// checked against the key parameters upon decapsulation.
    pub fn try_from_bytes(engine: &PairingEngine, bytes: &[u8]) -> Result<Self, Error> {
        if KEY_LENGTH == 0
            || bytes.len() < G1_LENGTH
            || (bytes.len() - G1_LENGTH) % KEY_LENGTH != 0
        {
            return Err(Error::InvalidSize(format!(
                "a ciphertext is a {G1_LENGTH}-byte tag followed by {KEY_LENGTH}-byte shares, \
                 given {} bytes",
                bytes.len()
            )));
        }
        let (tag_bytes, shares) = bytes.split_at(G1_LENGTH);
        let shares = shares
            .chunks_exact(KEY_LENGTH)
            .map(<[u8; KEY_LENGTH]>::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            tag: engine.decode_g1(tag_bytes)?,
            tag_bytes: tag_bytes.try_into()?,
            shares,
        })
    }
}
