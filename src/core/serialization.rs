//! Implements the serialization methods for the Bloom filter KEM keys.
//!
//! Both keys start with the LEB128-encoded bitset size, hash count and
//! secret length, followed by the compressed master public key. The private
//! key then holds, for each slot, a LEB128 presence flag followed by the
//! compressed secret share if the slot was not punctured.

use cosmian_crypto_core::bytes_ser_de::{to_leb128_len, Deserializer, Serializable, Serializer};

use super::{
    bloom_filter::BloomFilterParameters,
    pairing::{decode_g1, decode_g2, encode_g1, encode_g2, G1, G1_LENGTH, G2_LENGTH},
    KeySlot, PrivateKey, PublicKey,
};
use crate::Error;

fn header_length(params: &BloomFilterParameters, key_length: usize) -> usize {
    to_leb128_len(params.bitset_size())
        + to_leb128_len(params.hash_count())
        + to_leb128_len(key_length)
        + G1_LENGTH
}

fn write_header(
    ser: &mut Serializer,
    params: &BloomFilterParameters,
    key_length: usize,
    master_public: &G1,
) -> Result<usize, Error> {
    let mut n = ser.write_leb128_u64(params.bitset_size() as u64)?;
    n += ser.write_leb128_u64(params.hash_count() as u64)?;
    n += ser.write_leb128_u64(key_length as u64)?;
    n += ser.write_array(&encode_g1(master_public)?)?;
    Ok(n)
}

fn read_header(
    de: &mut Deserializer,
    key_length: usize,
) -> Result<(BloomFilterParameters, G1), Error> {
    let bitset_size = usize::try_from(de.read_leb128_u64()?)?;
    let hash_count = usize::try_from(de.read_leb128_u64()?)?;
    let params = BloomFilterParameters::from_raw(bitset_size, hash_count)?;
    let serialized_key_length = usize::try_from(de.read_leb128_u64()?)?;
    if serialized_key_length != key_length {
        return Err(Error::ConversionFailed(format!(
            "key holds {serialized_key_length}-byte secrets, expected {key_length}"
        )));
    }
    let master_public = decode_g1(&de.read_array::<G1_LENGTH>()?)?;
    Ok((params, master_public))
}

impl<const KEY_LENGTH: usize> Serializable for PublicKey<KEY_LENGTH> {
    type Error = Error;

    fn length(&self) -> usize {
        header_length(self.params(), KEY_LENGTH)
    }

    fn write(&self, ser: &mut Serializer) -> Result<usize, Self::Error> {
        write_header(ser, self.params(), KEY_LENGTH, self.master_public())
    }

    fn read(de: &mut Deserializer) -> Result<Self, Self::Error> {
        let (params, master_public) = read_header(de, KEY_LENGTH)?;
        Ok(Self::new(params, master_public))
    }
}

impl<const KEY_LENGTH: usize> Serializable for PrivateKey<KEY_LENGTH> {
    type Error = Error;

    fn length(&self) -> usize {
        // Presence flags are single LEB128 bytes.
        header_length(self.params(), KEY_LENGTH)
            + self.params().bitset_size()
            + (self.params().bitset_size() - self.punctured_count()) * G2_LENGTH
    }

    fn write(&self, ser: &mut Serializer) -> Result<usize, Self::Error> {
        let mut n = write_header(ser, self.params(), KEY_LENGTH, self.master_public())?;
        for index in 0..self.params().bitset_size() {
            // The slot stays locked while its share is written, so that a
            // concurrent puncture cannot be missed.
            match self.read_slot(index).as_deref() {
                Some(KeySlot::Present(share)) => {
                    n += ser.write_leb128_u64(1)?;
                    n += ser.write_array(&*encode_g2(share)?)?;
                }
                _ => n += ser.write_leb128_u64(0)?,
            }
        }
        Ok(n)
    }

    fn read(de: &mut Deserializer) -> Result<Self, Self::Error> {
        let (params, master_public) = read_header(de, KEY_LENGTH)?;
        let slots = (0..params.bitset_size())
            .map(|_| match de.read_leb128_u64()? {
                0 => Ok(KeySlot::Punctured),
                1 => Ok(KeySlot::Present(decode_g2(&de.read_array::<G2_LENGTH>()?)?)),
                flag => Err(Error::ConversionFailed(format!(
                    "invalid key slot flag {flag}"
                ))),
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Self::from_slots(params, slots, master_public)
    }
}

#[cfg(test)]
mod tests {
    use cosmian_crypto_core::{reexport::rand_core::SeedableRng, CsRng};

    use super::*;
    use crate::core::{
        api::{BloomFilterKem, PuncturableKem},
        pairing::PairingEngine,
        primitives::keygen,
    };

    #[test]
    fn test_key_serialization() -> Result<(), Error> {
        let kem = BloomFilterKem::new()?;
        let params = BloomFilterParameters::new(8, 0.1)?;
        let (sk, pk) = keygen::<16>(
            &mut CsRng::from_entropy(),
            kem.engine(),
            params,
            16,
            &Default::default(),
        )?;

        let bytes = pk.serialize()?;
        assert_eq!(bytes.len(), pk.length());
        assert_eq!(PublicKey::<16>::deserialize(&bytes)?, pk);

        let (_, ct) = kem.encaps(&pk)?;
        let n_punctured = kem.puncture(&sk, &ct);
        assert!(n_punctured > 0);

        let bytes = sk.serialize()?;
        assert_eq!(bytes.len(), sk.length());
        let sk_ = PrivateKey::<16>::deserialize(&bytes)?;
        assert_eq!(sk_.params(), sk.params());
        assert_eq!(sk_.master_public(), sk.master_public());
        assert_eq!(sk_.punctured_count(), n_punctured);
        for index in 0..params.bitset_size() {
            assert_eq!(sk_.secret_share(index), sk.secret_share(index));
        }

        // The punctured state survives the serialization.
        assert!(kem.decaps(&sk_, &ct)?.is_none());
        let (ss, ct) = kem.encaps(&pk)?;
        if sk.can_decapsulate(&ct) {
            assert_eq!(kem.decaps(&sk_, &ct)?, Some(ss));
        }
        Ok(())
    }

    #[test]
    fn test_invalid_key_bytes() -> Result<(), Error> {
        let engine = PairingEngine::acquire()?;
        let params = BloomFilterParameters::new(8, 0.1)?;
        let (sk, pk) = keygen::<16>(
            &mut CsRng::from_entropy(),
            &engine,
            params,
            16,
            &Default::default(),
        )?;

        // Secret length mismatch.
        let bytes = pk.serialize()?;
        assert!(matches!(
            PublicKey::<32>::deserialize(&bytes),
            Err(Error::ConversionFailed(_))
        ));

        // Truncated key.
        let bytes = sk.serialize()?;
        assert!(PrivateKey::<16>::deserialize(&bytes[..bytes.len() - 1]).is_err());

        // Invalid slot flag: the first flag follows the header.
        let mut bytes = sk.serialize()?.to_vec();
        bytes[header_length(&params, 16)] = 2;
        assert!(matches!(
            PrivateKey::<16>::deserialize(&bytes),
            Err(Error::ConversionFailed(_))
        ));

        // More hash functions than slots.
        for hash_count in [params.bitset_size() as u64 + 1, 1 << 61] {
            let mut ser = Serializer::new();
            ser.write_leb128_u64(params.bitset_size() as u64)?;
            ser.write_leb128_u64(hash_count)?;
            ser.write_leb128_u64(16)?;
            ser.write_array(&encode_g1(pk.master_public())?)?;
            let bytes = ser.finalize();
            assert!(matches!(
                PublicKey::<16>::deserialize(&bytes),
                Err(Error::ParameterError(_))
            ));
            assert!(matches!(
                PrivateKey::<16>::deserialize(&bytes),
                Err(Error::ParameterError(_))
            ));
        }

        // Invalid master public key.
        let mut bytes = pk.serialize()?.to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(PublicKey::<16>::deserialize(&bytes).is_err());
        Ok(())
    }
}
