//! Content-addressed cache of baked games
//!
//! Entries are keyed by a fingerprint of the combination that produced
//! them, not by their bytes. Published entries are immutable; they only
//! disappear through an age-based sweep.
//!
//! # Entry States
//!
//! | State | Location | Visible to lookup |
//! |-------|----------|-------------------|
//! | Building | `.staging/baked-<key>-<uuid>` | no |
//! | Published | `baked-<key>` | yes |
//! | Failed | removed | no |

pub mod fingerprint;
pub mod store;

pub use fingerprint::{fingerprint, CombinationKey};
pub use store::{BakedArtifact, CacheStore, Staging, SweepReport};
