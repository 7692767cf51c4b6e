//! Combination fingerprints
//!
//! A baked game is identified by what went into it, never by its bytes:
//! the base type, the engine version and the ordered `(name, version)`
//! identity of every overlay. Same inputs in the same order always give the
//! same key; reordering, adding, removing or re-versioning an overlay gives
//! a different one.

use crate::error::{BakeError, BakeResult};
use crate::overlay::{ArtifactRef, OverlayRef};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Domain tag prefixed to every hashed combination
const DOMAIN_TAG: &[u8] = b"modbake/combination/v1";

/// Hex characters used in human-facing artifact names
pub const SHORT_HEX_LEN: usize = 16;

/// Prefix of every baked artifact name
pub const ARTIFACT_PREFIX: &str = "baked-";

/// SHA256 fingerprint of one exact (base, engine version, overlay list) tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombinationKey([u8; 32]);

impl CombinationKey {
    /// Full 64-char hex digest
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 16 hex chars, used in names
    pub fn short(&self) -> String {
        hex::encode(&self.0[..SHORT_HEX_LEN / 2])
    }

    /// Deterministic cache entry name (`baked-<short>`)
    pub fn artifact_name(&self) -> String {
        format!("{}{}", ARTIFACT_PREFIX, self.short())
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl FromStr for CombinationKey {
    type Err = BakeError;

    fn from_str(s: &str) -> BakeResult<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| BakeError::InvalidInput(format!("invalid combination key '{s}': {e}")))?;
        let digest: [u8; 32] = bytes.try_into().map_err(|_| {
            BakeError::InvalidInput(format!("combination key '{s}' must be 64 hex characters"))
        })?;
        Ok(Self(digest))
    }
}

impl Serialize for CombinationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

/// Compute the combination key.
///
/// Each field is written as a little-endian `u64` length followed by its
/// UTF-8 bytes, in a fixed order, so no two distinct inputs share an
/// encoding. Overlay paths are deliberately not part of the key.
pub fn fingerprint(base: &ArtifactRef, overlays: &[OverlayRef]) -> CombinationKey {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);

    update_field(&mut hasher, &base.base_type);
    update_field(&mut hasher, &base.engine_version);

    hasher.update((overlays.len() as u64).to_le_bytes());
    for overlay in overlays {
        update_field(&mut hasher, &overlay.name);
        update_field(&mut hasher, &overlay.version);
    }

    CombinationKey(hasher.finalize().into())
}

fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
