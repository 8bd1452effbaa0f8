//! Fixed-length edge hash and Hamming distance.

use serde::{Deserialize, Serialize};

/// Number of bytes in every edge hash
pub const EDGE_HASH_BYTES: usize = 32;

/// Number of bits in every edge hash (16x16 grid)
pub const EDGE_HASH_BITS: u32 = (EDGE_HASH_BYTES * 8) as u32;

/// A 256-bit summary of where structural edges sit in an image.
///
/// The length is part of the type, so two hashes can always be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeHash([u8; EDGE_HASH_BYTES]);

impl EdgeHash {
    /// Create a hash from raw bytes
    pub fn new(bytes: [u8; EDGE_HASH_BYTES]) -> Self {
        Self(bytes)
    }

    /// Pack a row-major bit sequence, most significant bit first.
    ///
    /// Missing bits are zero, extra bits are ignored.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut bytes = [0u8; EDGE_HASH_BYTES];
        for (index, bit) in bits.into_iter().take(EDGE_HASH_BITS as usize).enumerate() {
            if bit {
                bytes[index / 8] |= 1 << (7 - index % 8);
            }
        }
        Self(bytes)
    }

    /// Hamming distance: count of differing bits
    pub fn distance(&self, other: &Self) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Get the raw hash bytes
    pub fn as_bytes(&self) -> &[u8; EDGE_HASH_BYTES] {
        &self.0
    }

    /// Get the total number of bits in this hash
    pub fn bit_count(&self) -> u32 {
        EDGE_HASH_BITS
    }

    /// Number of set bits (cells classified as edge-heavy)
    pub fn ones(&self) -> u32 {
        self.0.iter().map(|b| b.count_ones()).sum()
    }

    /// Fraction of bits that are set
    pub fn density(&self) -> f64 {
        self.ones() as f64 / EDGE_HASH_BITS as f64
    }

    /// Similarity in [0, 1]: `1 - distance / bit_count`
    pub fn similarity(&self, other: &Self) -> f64 {
        1.0 - self.distance(other) as f64 / EDGE_HASH_BITS as f64
    }

    /// Get the hash as a hexadecimal string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for EdgeHash {
    fn default() -> Self {
        Self([0u8; EDGE_HASH_BYTES])
    }
}

impl std::fmt::Display for EdgeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
