use std::{array::TryFromSliceError, fmt::Debug, num::TryFromIntError};

use ark_ec::hashing::HashToCurveError;
use ark_serialize::SerializationError;
use cosmian_crypto_core::CryptoCoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid Bloom filter parameters: {0}")]
    ParameterError(String),
    #[error("ciphertext holds {given} shares, expected {expected}")]
    InvalidCiphertextLength { expected: usize, given: usize },
    #[error("key generation cancelled")]
    Cancelled,
    #[error("invalid group element: {0}")]
    InvalidGroupElement(String),
    #[error("hash to curve failed: {0}")]
    HashToCurve(String),
    #[error("invalid size: {0}")]
    InvalidSize(String),
    #[error("conversion failed: {0}")]
    ConversionFailed(String),
    #[error("{0}")]
    CryptoCoreError(CryptoCoreError),
    #[error("cannot build the key generation thread pool: {0}")]
    ThreadPool(String),
    #[error("json parsing error: {0}")]
    Json(String),
}

impl From<CryptoCoreError> for Error {
    fn from(e: CryptoCoreError) -> Self {
        Self::CryptoCoreError(e)
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Self::InvalidGroupElement(e.to_string())
    }
}

impl From<HashToCurveError> for Error {
    fn from(e: HashToCurveError) -> Self {
        Self::HashToCurve(e.to_string())
    }
}

impl From<TryFromIntError> for Error {
    fn from(e: TryFromIntError) -> Self {
        Self::ConversionFailed(e.to_string())
    }
}

impl From<TryFromSliceError> for Error {
    fn from(e: TryFromSliceError) -> Self {
        Self::ConversionFailed(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(e.to_string())
    }
}
