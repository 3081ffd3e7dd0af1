//! Deterministic pseudonym generation
//!
//! Pseudonyms are derived from a salted SHA-256 digest of the normalized
//! original value, so a fixed `(seed, salt)` always yields the same
//! pseudonym for the same input - within a run via the memo cache, and
//! across runs via cache hydration from the mapping store.
//!
//! The digest is truncated to 4 bytes before encoding. The resulting
//! theoretical collision risk is accepted and not detected at runtime.

use crate::deid::models::PhiType;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// RFC 4648 base32 alphabet
const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Length of the encoded identifier portion of a pseudonym
const ID_LEN: usize = 6;

/// Deterministic, memoizing pseudonym generator
///
/// Run-scoped instance state: the memo cache and per-type counters are owned
/// here, never module-level globals, so tests and composed engines stay
/// isolated.
pub struct PseudonymGenerator {
    salt: Vec<u8>,
    cache: HashMap<(PhiType, String), String>,
    counters: HashMap<PhiType, usize>,
}

impl PseudonymGenerator {
    /// Create a generator with the given salt.
    pub fn new(salt: impl Into<Vec<u8>>) -> Self {
        Self {
            salt: salt.into(),
            cache: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    /// Normalization applied before hashing and cache lookup: trim and
    /// casefold. `"John Doe"` and `" john doe "` map to one pseudonym.
    pub fn normalize(value: &str) -> String {
        value.trim().to_lowercase()
    }

    /// Produce the pseudonym for `(phi_type, original)`.
    ///
    /// Referentially transparent for a fixed salt: repeated calls with the
    /// same inputs return the identical string.
    pub fn generate(&mut self, phi_type: PhiType, original: &str) -> String {
        let normalized = Self::normalize(original);

        if let Some(hit) = self.cache.get(&(phi_type, normalized.clone())) {
            return hit.clone();
        }

        let mut hasher = Sha256::new();
        hasher.update(&self.salt);
        hasher.update(phi_type.token_prefix().as_bytes());
        hasher.update(normalized.as_bytes());
        let digest = hasher.finalize();

        let mut id = base32_encode(&digest[..4]);
        id.truncate(ID_LEN);

        let pseudonym = format!("{}-{}", phi_type.token_prefix(), id);

        *self.counters.entry(phi_type).or_insert(0) += 1;
        self.cache.insert((phi_type, normalized), pseudonym.clone());

        pseudonym
    }

    /// Pre-load a known mapping into the memo cache (store hydration).
    ///
    /// `normalized` must already be in normalized form; hydrated entries do
    /// not count toward the generation counters.
    pub fn hydrate(&mut self, phi_type: PhiType, normalized: &str, pseudonym: &str) {
        self.cache
            .insert((phi_type, normalized.to_string()), pseudonym.to_string());
    }

    /// Count of distinct values pseudonymized this run, per type.
    pub fn counters(&self) -> &HashMap<PhiType, usize> {
        &self.counters
    }

    /// Number of cached mappings (hydrated + generated).
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// RFC 4648 base32, no padding.
fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 8 / 5 + 1);
    let mut buffer: u64 = 0;
    let mut bits = 0u32;

    for &b in bytes {
        buffer = (buffer << 8) | u64::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}
