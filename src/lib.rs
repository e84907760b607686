//! This crate implements a Bloom filter key encapsulation mechanism (BF-KEM)
//! which allows to:
//! - encapsulate fresh shared secrets for a public key;
//! - decapsulate them with the associated private key;
//! - puncture the private key on a ciphertext, so that this ciphertext can
//! never be opened again, even if the key is later compromised.
//!
//! The private key holds one secret share per slot of a Bloom filter sized
//! after the number of expected punctures and the accepted false-positive
//! probability. Puncturing erases the slots matching a ciphertext; any other
//! ciphertext remains decapsulable as long as one of its slots was spared.
//!
//! The scheme is instantiated on the BLS12-381 pairing-friendly curve.
//!
//! The `core::api` module exposes the [`BloomFilterKem`] entry point.

mod error;

pub mod config;
pub mod core;
pub mod test_utils;

pub use error::Error;

pub use self::{
    config::{KemConfig, KeygenConfig},
    core::{
        api::{BloomFilterKem, PuncturableKem},
        bloom_filter::BloomFilterParameters,
        Ciphertext, KeySlot, PrivateKey, PublicKey, SharedSecret, SHARED_SECRET_LENGTH,
    },
};
