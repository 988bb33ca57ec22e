//! Key hashers for shard routing

use std::sync::Arc;

use sha2::{Digest, Sha256};

use coherence_core::{CacheError, Result};

/// Incremental hash over a key's bytes
pub trait KeyHasher: Send {
    /// Feed bytes into the hash
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Natural digest width in bytes
    fn size(&self) -> usize;

    /// Current digest, big-endian
    fn digest(&self) -> Vec<u8>;
}

/// Builds a fresh hasher for each key
pub type HashFactory = Arc<dyn Fn() -> Result<Box<dyn KeyHasher>> + Send + Sync>;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;
const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 32-bit FNV-1a
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a32(u32);

impl Default for Fnv1a32 {
    fn default() -> Self {
        Self(FNV32_OFFSET_BASIS)
    }
}

impl Fnv1a32 {
    pub fn sum32(&self) -> u32 {
        self.0
    }
}

impl KeyHasher for Fnv1a32 {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        for byte in bytes {
            self.0 ^= u32::from(*byte);
            self.0 = self.0.wrapping_mul(FNV32_PRIME);
        }
        Ok(())
    }

    fn size(&self) -> usize {
        4
    }

    fn digest(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }
}

/// 64-bit FNV-1a
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a64(u64);

impl Default for Fnv1a64 {
    fn default() -> Self {
        Self(FNV64_OFFSET_BASIS)
    }
}

impl Fnv1a64 {
    pub fn sum64(&self) -> u64 {
        self.0
    }
}

impl KeyHasher for Fnv1a64 {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(FNV64_PRIME);
        }
        Ok(())
    }

    fn size(&self) -> usize {
        8
    }

    fn digest(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }
}

/// SHA-256, routed on the first four digest bytes
#[derive(Clone, Default)]
pub struct Sha256Hasher(Sha256);

impl KeyHasher for Sha256Hasher {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.0.update(bytes);
        Ok(())
    }

    fn size(&self) -> usize {
        32
    }

    fn digest(&self) -> Vec<u8> {
        self.0.clone().finalize().to_vec()
    }
}

/// Factory for [`Fnv1a32`], the default
pub fn fnv1a32() -> HashFactory {
    Arc::new(|| Ok(Box::new(Fnv1a32::default()) as Box<dyn KeyHasher>))
}

/// Factory for [`Fnv1a64`]
pub fn fnv1a64() -> HashFactory {
    Arc::new(|| Ok(Box::new(Fnv1a64::default()) as Box<dyn KeyHasher>))
}

/// Factory for [`Sha256Hasher`]
pub fn sha256() -> HashFactory {
    Arc::new(|| Ok(Box::new(Sha256Hasher::default()) as Box<dyn KeyHasher>))
}

/// Map a digest onto `buckets` slots
///
/// 4-byte digests are read as `u32`, 8-byte digests as `u64`. Any other
/// width uses its first four bytes as a big-endian `u32`, or slot 0 when the
/// digest is shorter than that.
pub fn bucket_index(digest: &[u8], width: usize, buckets: usize) -> Result<usize> {
    if buckets == 0 {
        return Err(CacheError::Configuration("no buckets to route to".to_string()));
    }

    let index = match width {
        4 => {
            let bytes: [u8; 4] = digest.try_into().map_err(|_| digest_mismatch(width, digest))?;
            u64::from(u32::from_be_bytes(bytes)) % buckets as u64
        }
        8 => {
            let bytes: [u8; 8] = digest.try_into().map_err(|_| digest_mismatch(width, digest))?;
            u64::from_be_bytes(bytes) % buckets as u64
        }
        _ => match digest.first_chunk::<4>() {
            Some(head) => u64::from(u32::from_be_bytes(*head)) % buckets as u64,
            None => 0,
        },
    };
    Ok(index as usize)
}

fn digest_mismatch(width: usize, digest: &[u8]) -> CacheError {
    CacheError::Hash(format!(
        "hasher reports a {width}-byte digest but produced {} bytes",
        digest.len()
    ))
}
