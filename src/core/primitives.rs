//! Implements the cryptographic primitives of the Bloom filter KEM, based on
//! Derler, Jager, Slamanig and Striecks, "Bloom Filter Encryption and
//! Applications to Efficient Forward-Secret 0-RTT Key Exchange",
//! EUROCRYPT 2018.

use std::sync::atomic::{AtomicBool, Ordering};

use cosmian_crypto_core::{reexport::rand_core::CryptoRngCore, FixedSizeCBytes};
use rayon::prelude::*;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use super::{
    bloom_filter::BloomFilterParameters,
    pairing::{Gt, PairingEngine, Scalar, G1, WIDE_SCALAR_LENGTH},
    Ciphertext, PrivateKey, PublicKey, SharedSecret,
};
use crate::Error;

/// Domain separation tag of the derivation of the encapsulation randomness
/// and the shared secret from the seed.
const SCALAR_AND_KEY_DOMAIN: &[u8] = b"BFE_BF_H_R";

/// Domain separation tag of the seed masks.
const MASK_DOMAIN: &[u8] = b"BFE_BF_G";

/// Xor the two given byte slices in place.
fn xor_in_place(a: &mut [u8], b: &[u8]) {
    for (a_i, b_i) in a.iter_mut().zip(b.iter()) {
        *a_i ^= b_i;
    }
}

/// Masks (or unmasks) the given message with a key stream derived from the
/// given pairing value.
fn hash_and_xor(engine: &PairingEngine, y: &Gt, message: &mut [u8]) -> Result<(), Error> {
    let mut stream = Zeroizing::new(vec![0; message.len()]);
    shake256!(
        &mut stream,
        MASK_DOMAIN,
        &engine.encode_gt(y)?,
        &(message.len() as u64).to_le_bytes()
    );
    xor_in_place(message, &stream);
    Ok(())
}

/// Derives the encapsulation randomness `r` and the shared secret from the
/// given seed.
fn derive_scalar_and_key<const KEY_LENGTH: usize>(
    engine: &PairingEngine,
    seed: &[u8; KEY_LENGTH],
) -> Result<(Scalar, SharedSecret<KEY_LENGTH>), Error> {
    let mut buffer = Zeroizing::new(vec![0; WIDE_SCALAR_LENGTH + KEY_LENGTH]);
    shake256!(&mut buffer, SCALAR_AND_KEY_DOMAIN, seed);
    let (r, key_bytes) = buffer.split_at(WIDE_SCALAR_LENGTH);
    let key = SharedSecret::<KEY_LENGTH>::try_from_slice(key_bytes)?;
    Ok((engine.scalar_from_bytes(r), key))
}

/// Masks the seed for each given position, using `pkr = r·mpk`.
fn mask_seed<const KEY_LENGTH: usize>(
    engine: &PairingEngine,
    pkr: &G1,
    positions: &[usize],
    seed: &[u8; KEY_LENGTH],
) -> Result<Vec<[u8; KEY_LENGTH]>, Error> {
    positions
        .iter()
        .map(|&index| {
            let mut share = *seed;
            let mut y = engine.pair(pkr, &engine.hash_index_to_g2(index as u64)?);
            hash_and_xor(engine, &y, &mut share)?;
            y.zeroize();
            Ok(share)
        })
        .collect()
}

/// Generates a new key pair.
///
/// The secret shares are computed in parallel on the current rayon pool, by
/// batches of `batch_size` slots. The `cancel` flag is checked before each
/// batch.
///
/// # Parameters
///
/// - `rng`         : secure random number generator
/// - `engine`      : pairing engine
/// - `params`      : Bloom filter parameters
/// - `batch_size`  : number of slots computed by a single task
/// - `cancel`      : cancellation flag
pub fn keygen<const KEY_LENGTH: usize>(
    rng: &mut impl CryptoRngCore,
    engine: &PairingEngine,
    params: BloomFilterParameters,
    batch_size: usize,
    cancel: &AtomicBool,
) -> Result<(PrivateKey<KEY_LENGTH>, PublicKey<KEY_LENGTH>), Error> {
    if KEY_LENGTH == 0 {
        return Err(Error::ParameterError(
            "the shared secret cannot be empty".to_string(),
        ));
    }
    let batch_size = batch_size.max(1);
    let m = params.bitset_size();
    info!(
        bitset_size = m,
        hash_count = params.hash_count(),
        key_size = KEY_LENGTH,
        threads = rayon::current_num_threads(),
        "generating Bloom filter KEM keys"
    );

    let mut x = engine.random_scalar(rng);
    let master_public = engine.g1_base_mul(&x);

    let res = (0..m.div_ceil(batch_size))
        .into_par_iter()
        .map(|batch| {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
            let start = batch * batch_size;
            let end = usize::min(start + batch_size, m);
            engine.extract_range(start as u64, end as u64, &x)
        })
        .collect::<Result<Vec<_>, Error>>();
    x.zeroize();
    let batches = res?;

    let sk = PrivateKey::new(
        params,
        batches.iter().flat_map(|batch| batch.iter().copied()),
        master_public,
    )?;
    let pk = sk.public_key();
    info!(bitset_size = m, "Bloom filter KEM keys generated");
    Ok((sk, pk))
}

/// Generates an encapsulation of a fresh shared secret.
/// Returns both the shared secret and its encapsulation.
///
/// # Parameters
///
/// - `rng`     : secure random number generator
/// - `engine`  : pairing engine
/// - `pk`      : public key
pub fn encaps<const KEY_LENGTH: usize>(
    rng: &mut impl CryptoRngCore,
    engine: &PairingEngine,
    pk: &PublicKey<KEY_LENGTH>,
) -> Result<(SharedSecret<KEY_LENGTH>, Ciphertext<KEY_LENGTH>), Error> {
    // The seed, not the shared secret, is masked: this allows re-encrypting
    // upon decapsulation.
    let mut seed = Zeroizing::new([0; KEY_LENGTH]);
    rng.fill_bytes(&mut *seed);

    let (mut r, key) = derive_scalar_and_key(engine, &seed)?;
    let tag = engine.g1_base_mul(&r);
    let pkr = engine.g1_mul(pk.master_public(), &r);
    r.zeroize();

    let tag_bytes = engine.encode_g1(&tag)?;
    let positions = pk.params().positions(&tag_bytes);
    let shares = mask_seed(engine, &pkr, &positions, &seed)?;

    Ok((key, Ciphertext::new(tag, tag_bytes, shares)))
}

/// Tries to decapsulate the given ciphertext.
///
/// Returns `None` if all the slots matching this ciphertext have been
/// punctured, or if the ciphertext is not the one an honest encapsulation of
/// its seed would produce. Both cases are indistinguishable.
///
/// # Error
///
/// An error is returned if the number of shares does not match the number
/// of hash functions of the key.
///
/// # Parameters
///
/// - `engine`      : pairing engine
/// - `sk`          : private key
/// - `ciphertext`  : ciphertext to open
pub fn decaps<const KEY_LENGTH: usize>(
    engine: &PairingEngine,
    sk: &PrivateKey<KEY_LENGTH>,
    ciphertext: &Ciphertext<KEY_LENGTH>,
) -> Result<Option<SharedSecret<KEY_LENGTH>>, Error> {
    let hash_count = sk.params().hash_count();
    if ciphertext.shares().len() != hash_count {
        return Err(Error::InvalidCiphertextLength {
            expected: hash_count,
            given: ciphertext.shares().len(),
        });
    }

    let positions = sk.params().positions(ciphertext.tag_bytes());

    // Use the first slot still available.
    let Some((mut secret_share, share)) = positions
        .iter()
        .zip(ciphertext.shares())
        .find_map(|(&index, share)| sk.secret_share(index).map(|secret| (secret, share)))
    else {
        debug!("decapsulation failed");
        return Ok(None);
    };

    let mut seed = Zeroizing::new(*share);
    let mut y = engine.pair(ciphertext.tag(), &secret_share);
    secret_share.zeroize();
    hash_and_xor(engine, &y, &mut *seed)?;
    y.zeroize();

    // Re-encrypt and compare.
    let (mut r, key) = derive_scalar_and_key(engine, &seed)?;
    let tag = engine.g1_base_mul(&r);
    let pkr = engine.g1_mul(sk.master_public(), &r);
    r.zeroize();
    if tag != *ciphertext.tag() {
        debug!("decapsulation failed");
        return Ok(None);
    }
    for (&index, share) in positions.iter().zip(ciphertext.shares()) {
        if mask_seed(engine, &pkr, &[index], &seed)?[0] != *share {
            debug!("decapsulation failed");
            return Ok(None);
        }
    }

    Ok(Some(key))
}

/// Punctures the private key on the given ciphertext: the key slots matching
/// its tag are irreversibly erased. Any other ciphertext matching only erased
/// slots can no longer be decapsulated.
///
/// Returns the number of slots that were still present.
pub fn puncture<const KEY_LENGTH: usize>(
    sk: &PrivateKey<KEY_LENGTH>,
    ciphertext: &Ciphertext<KEY_LENGTH>,
) -> usize {
    let n_punctured = sk
        .params()
        .positions(ciphertext.tag_bytes())
        .into_iter()
        .map(|index| sk.puncture_slot(index))
        .filter(|&was_present| was_present)
        .count();
    debug!(n_punctured, "private key punctured");
    n_punctured
}
