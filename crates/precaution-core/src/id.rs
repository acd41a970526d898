//! Identity handles for contracts.
//!
//! Interfaces and signatures are compared by identity, never by name. Every
//! `build()` draws a fresh id from a process-wide counter, so two contracts
//! with identical contents still have distinct identities.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_raw() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of a built interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceId(pub u64);

/// Identity of a built signature. Wrapped functions remember the id of the
/// signature that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureId(pub u64);

impl InterfaceId {
    /// Allocates an id that no other interface or signature holds.
    pub fn fresh() -> Self {
        InterfaceId(next_raw())
    }
}

impl SignatureId {
    /// Allocates an id that no other interface or signature holds.
    pub fn fresh() -> Self {
        SignatureId(next_raw())
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
