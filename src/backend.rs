//! Backend seam for the PQC primitives.
//!
//! Two interchangeable implementations sit behind [`CryptoBackend`]: the
//! native one delegating to real lattice primitives, and a simulated one that
//! preserves the protocol contract with pseudo-random bytes. The variant is
//! selected once, at process start, and never re-evaluated per call.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use crate::config::PqcConfig;
use crate::simulated::SimProfile;

/* ============================================================================
 * Errors
 * ========================================================================== */

#[derive(Debug, Error)]
pub enum PqcError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("invalid ciphertext: expected {expected} bytes, got {got}")]
    InvalidCiphertext { expected: usize, got: usize },
    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),
    #[error("native backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),
}

/* ============================================================================
 * Mode flag
 * ========================================================================== */

/// Which backend variant served an operation. Attached to every result so
/// consumers can tell demonstration output from real cryptographic output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Available,
    Simulated,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::Available => "available",
            BackendMode::Simulated => "simulated",
        }
    }
}

/* ============================================================================
 * Results
 * ========================================================================== */

/// Ciphertext plus the 32-byte shared secret it encapsulates.
///
/// The secret is zeroized on drop; the ciphertext is public material.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Encapsulation {
    pub ciphertext: Vec<u8>,
    pub shared_secret: Vec<u8>,
}

impl Zeroize for Encapsulation {
    fn zeroize(&mut self) {
        self.shared_secret.zeroize();
    }
}

impl Drop for Encapsulation {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/* ============================================================================
 * Backend trait
 * ========================================================================== */

/// The five primitives, as raw byte-buffer operations.
///
/// Implementations hold no mutable cross-call state and are safe to share
/// across threads. Key pairs are returned as `(public, secret)` byte vectors;
/// the engine layer wraps them with algorithm metadata.
pub trait CryptoBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    fn kem_keypair(&self) -> Result<(Vec<u8>, Vec<u8>), PqcError>;
    fn encapsulate(&self, public_key: &[u8]) -> Result<Encapsulation, PqcError>;

    /// Recover the shared secret. A well-formed but mismatched private key
    /// yields a garbage secret, not an error; real KEMs reject implicitly.
    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, PqcError>;

    fn sig_keypair(&self) -> Result<(Vec<u8>, Vec<u8>), PqcError>;
    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, PqcError>;

    /// `Ok(false)` for any well-formed but non-matching triple; errors only
    /// for malformed inputs.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, PqcError>;
}

/* ============================================================================
 * Startup selection
 * ========================================================================== */

/// Pick the backend for the process lifetime.
///
/// With native support compiled in, the primitives must also pass a self-test
/// round trip; any failure is logged as [`PqcError::BackendUnavailable`] and
/// permanently selects the simulated variant. There is no mid-session
/// fallback.
pub fn select_backend(config: &PqcConfig, profile: SimProfile) -> Box<dyn CryptoBackend> {
    #[cfg(feature = "native-pqc")]
    {
        match crate::native::NativeBackend::initialize(config.kem, config.sig) {
            Ok(backend) => return Box::new(backend),
            Err(err) => log::warn!("{err}; using simulated primitives for process lifetime"),
        }
    }

    #[cfg(not(feature = "native-pqc"))]
    log::warn!(
        "{}; using simulated primitives for process lifetime",
        PqcError::BackendUnavailable("native PQC support not compiled in".into())
    );

    Box::new(crate::simulated::SimulatedBackend::new(config.kem, config.sig, profile))
}
