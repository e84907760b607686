//! Defines useful macros.

pub use tiny_keccak::{Hasher, Shake};

/// Hashes the given bytes with SHAKE256 and squeezes enough output to fill
/// the given buffer.
///
/// # Parameters
///
/// - `res`     : output buffer
/// - `bytes`   : input bytes, absorbed in order
macro_rules! shake256 {
    ($res: expr, $($bytes: expr),+) => {
        {
            let mut hasher = $crate::core::macros::Shake::v256();
            $(
                <$crate::core::macros::Shake as $crate::core::macros::Hasher>::update(&mut hasher, $bytes);
            )*
            <$crate::core::macros::Shake as $crate::core::macros::Hasher>::finalize(hasher, $res);
        }
    };
}
