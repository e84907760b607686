//! Group arithmetic used by the scheme, instantiated on BLS12-381.
//!
//! The master public key and the ciphertext tags live in G1, the secret
//! shares and hashed positions in G2.

use ark_bls12_381::{g2, Bls12_381, Fr, G1Affine, G2Affine};
use ark_ec::{
    hashing::{
        curve_maps::wb::WBMap, map_to_curve_hasher::MapToCurveBasedHasher, HashToCurve,
    },
    pairing::{Pairing, PairingOutput},
    short_weierstrass::Projective,
    AffineRepr, CurveGroup,
};
use ark_ff::{field_hashers::DefaultFieldHasher, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use cosmian_crypto_core::reexport::rand_core::CryptoRngCore;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::Error;

pub type Scalar = Fr;
pub type Gt = PairingOutput<Bls12_381>;
pub use ark_bls12_381::{G1Affine as G1, G2Affine as G2};

/// Length of a compressed G1 element.
pub const G1_LENGTH: usize = 48;

/// Length of a compressed G2 element.
pub const G2_LENGTH: usize = 96;

/// Number of bytes reduced modulo the group order to get a scalar. Twice the
/// order length, so that the bias is negligible.
pub const WIDE_SCALAR_LENGTH: usize = 64;

/// Domain separation tag of the hash to G2.
const HASH_TO_G2_DOMAIN: &[u8] = b"BFE_BLS12381G2_XMD:SHA-256_SSWU_RO_";

type G2Hasher =
    MapToCurveBasedHasher<Projective<g2::Config>, DefaultFieldHasher<Sha256, 128>, WBMap<g2::Config>>;

/// Handle on the pairing arithmetic.
///
/// It is acquired once before any key generation or encapsulation and
/// released when dropped. Every group operation of the scheme goes through it.
pub struct PairingEngine {
    g2_hasher: G2Hasher,
}

impl PairingEngine {
    pub fn acquire() -> Result<Self, Error> {
        let g2_hasher = G2Hasher::new(HASH_TO_G2_DOMAIN)?;
        debug!("pairing engine acquired");
        Ok(Self { g2_hasher })
    }

    /// Samples a scalar uniformly modulo the group order.
    pub fn random_scalar(&self, rng: &mut impl CryptoRngCore) -> Scalar {
        let mut bytes = Zeroizing::new([0; WIDE_SCALAR_LENGTH]);
        rng.fill_bytes(&mut *bytes);
        Fr::from_le_bytes_mod_order(&*bytes)
    }

    /// Interprets the given bytes as a big-endian integer reduced modulo the
    /// group order.
    pub fn scalar_from_bytes(&self, bytes: &[u8]) -> Scalar {
        Fr::from_be_bytes_mod_order(bytes)
    }

    /// Returns `s·P1` where `P1` is the generator of G1.
    pub fn g1_base_mul(&self, s: &Scalar) -> G1Affine {
        (G1Affine::generator() * s).into_affine()
    }

    pub fn g1_mul(&self, p: &G1Affine, s: &Scalar) -> G1Affine {
        (*p * s).into_affine()
    }

    /// Maps the 8-byte little-endian encoding of the given index into G2.
    pub fn hash_index_to_g2(&self, index: u64) -> Result<G2Affine, Error> {
        Ok(self.g2_hasher.hash(&index.to_le_bytes())?)
    }

    /// Returns `s·H(i)` for all indices in `start..end`.
    pub fn extract_range(
        &self,
        start: u64,
        end: u64,
        s: &Scalar,
    ) -> Result<Zeroizing<Vec<G2Affine>>, Error> {
        let mut points: Zeroizing<Vec<Projective<g2::Config>>> =
            Zeroizing::new(Vec::with_capacity(end.saturating_sub(start) as usize));
        for index in start..end {
            points.push(self.hash_index_to_g2(index)? * s);
        }
        Ok(Zeroizing::new(Projective::normalize_batch(&points[..])))
    }

    pub fn pair(&self, p: &G1Affine, q: &G2Affine) -> Gt {
        Bls12_381::pairing(p, q)
    }

    pub fn encode_g1(&self, p: &G1Affine) -> Result<[u8; G1_LENGTH], Error> {
        encode_g1(p)
    }

    pub fn decode_g1(&self, bytes: &[u8]) -> Result<G1Affine, Error> {
        decode_g1(bytes)
    }

    pub fn encode_gt(&self, y: &Gt) -> Result<Zeroizing<Vec<u8>>, Error> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(y.compressed_size()));
        y.serialize_compressed(&mut *bytes)?;
        Ok(bytes)
    }
}

impl Drop for PairingEngine {
    fn drop(&mut self) {
        debug!("pairing engine released");
    }
}

/// Compressed encoding of a G1 element.
pub fn encode_g1(p: &G1Affine) -> Result<[u8; G1_LENGTH], Error> {
    let mut bytes = [0; G1_LENGTH];
    p.serialize_compressed(&mut bytes[..])?;
    Ok(bytes)
}

/// Decodes a compressed G1 element, checking it belongs to the prime order
/// subgroup.
pub fn decode_g1(bytes: &[u8]) -> Result<G1Affine, Error> {
    if bytes.len() != G1_LENGTH {
        return Err(Error::InvalidSize(format!(
            "G1 element: expected {G1_LENGTH} bytes, given {}",
            bytes.len()
        )));
    }
    Ok(G1Affine::deserialize_compressed(bytes)?)
}

pub fn encode_g2(q: &G2Affine) -> Result<Zeroizing<[u8; G2_LENGTH]>, Error> {
    let mut bytes = Zeroizing::new([0; G2_LENGTH]);
    q.serialize_compressed(&mut bytes[..])?;
    Ok(bytes)
}

pub fn decode_g2(bytes: &[u8]) -> Result<G2Affine, Error> {
    if bytes.len() != G2_LENGTH {
        return Err(Error::InvalidSize(format!(
            "G2 element: expected {G2_LENGTH} bytes, given {}",
            bytes.len()
        )));
    }
    Ok(G2Affine::deserialize_compressed(bytes)?)
}
