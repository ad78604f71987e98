//! Startup configuration: pinned algorithm parameter sets and resource limits.
//!
//! Byte sizes are documented here, per parameter set, rather than scattered
//! through the backends. The simulated backend produces exactly these sizes;
//! the native backend produces whatever the real algorithm emits (which for
//! Falcon-512 means variable-length signatures up to [`SigAlgorithm::signature_bytes`]).

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Which of the two configured families a key pair belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmFamily {
    Kem,
    Signature,
}

/// KEM parameter set. Pinned to ML-KEM-768 (Kyber768), NIST level 3.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KemAlgorithm {
    #[default]
    Kyber768,
}

impl KemAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            KemAlgorithm::Kyber768 => "Kyber768",
        }
    }

    /// Public key size (1184 bytes)
    pub const fn public_key_bytes(&self) -> usize {
        match self {
            KemAlgorithm::Kyber768 => 1184,
        }
    }

    /// Secret key size (2400 bytes)
    pub const fn secret_key_bytes(&self) -> usize {
        match self {
            KemAlgorithm::Kyber768 => 2400,
        }
    }

    /// Ciphertext size (1088 bytes)
    pub const fn ciphertext_bytes(&self) -> usize {
        match self {
            KemAlgorithm::Kyber768 => 1088,
        }
    }

    /// Shared secret size (32 bytes for every ML-KEM parameter set)
    pub const fn shared_secret_bytes(&self) -> usize {
        32
    }
}

/// Signature parameter set. Pinned to Falcon-512, NIST level 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigAlgorithm {
    #[default]
    Falcon512,
}

impl SigAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SigAlgorithm::Falcon512 => "Falcon-512",
        }
    }

    /// Public key size (897 bytes)
    pub const fn public_key_bytes(&self) -> usize {
        match self {
            SigAlgorithm::Falcon512 => 897,
        }
    }

    /// Secret key size (1281 bytes)
    pub const fn secret_key_bytes(&self) -> usize {
        match self {
            SigAlgorithm::Falcon512 => 1281,
        }
    }

    /// Maximum detached signature size (666 bytes).
    ///
    /// Native Falcon-512 signatures are variable-length up to this bound;
    /// the simulated backend always emits exactly this length.
    pub const fn signature_bytes(&self) -> usize {
        match self {
            SigAlgorithm::Falcon512 => 666,
        }
    }
}

/// Process-wide resource ceilings, fixed at startup.
///
/// Both values must be positive; `new` enforces the invariant. Violations
/// observed at runtime are reported, never used to clamp or abort work.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub max_memory_mb: f64,
    pub max_cpu_percent: f64,
}

impl ResourceLimits {
    pub fn new(max_memory_mb: f64, max_cpu_percent: f64) -> Self {
        assert!(max_memory_mb > 0.0, "max_memory_mb must be positive");
        assert!(max_cpu_percent > 0.0, "max_cpu_percent must be positive");
        Self { max_memory_mb, max_cpu_percent }
    }
}

impl Default for ResourceLimits {
    /// 50 MB / 80 %, the constrained-device profile the demo simulates.
    fn default() -> Self {
        Self { max_memory_mb: 50.0, max_cpu_percent: 80.0 }
    }
}

/// Full startup configuration, read once and passed to the engine by value.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PqcConfig {
    pub limits: ResourceLimits,
    pub kem: KemAlgorithm,
    pub sig: SigAlgorithm,
}

/// Resolve a caller-supplied algorithm identifier against the configured
/// families. Accepts the family keyword or the concrete parameter-set name.
pub fn resolve_family(config: &PqcConfig, algorithm: &str) -> Option<AlgorithmFamily> {
    if algorithm.eq_ignore_ascii_case("kem") || algorithm == config.kem.name() {
        Some(AlgorithmFamily::Kem)
    } else if algorithm.eq_ignore_ascii_case("signature")
        || algorithm.eq_ignore_ascii_case("sig")
        || algorithm == config.sig.name()
    {
        Some(AlgorithmFamily::Signature)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kyber768_sizes() {
        let alg = KemAlgorithm::Kyber768;
        assert_eq!(alg.public_key_bytes(), 1184);
        assert_eq!(alg.secret_key_bytes(), 2400);
        assert_eq!(alg.ciphertext_bytes(), 1088);
        assert_eq!(alg.shared_secret_bytes(), 32);
    }

    #[test]
    fn falcon512_sizes() {
        let alg = SigAlgorithm::Falcon512;
        assert_eq!(alg.public_key_bytes(), 897);
        assert_eq!(alg.secret_key_bytes(), 1281);
        assert_eq!(alg.signature_bytes(), 666);
    }

    #[test]
    fn family_resolution() {
        let config = PqcConfig::default();
        assert_eq!(resolve_family(&config, "KEM"), Some(AlgorithmFamily::Kem));
        assert_eq!(resolve_family(&config, "Kyber768"), Some(AlgorithmFamily::Kem));
        assert_eq!(resolve_family(&config, "signature"), Some(AlgorithmFamily::Signature));
        assert_eq!(resolve_family(&config, "Falcon-512"), Some(AlgorithmFamily::Signature));
        assert_eq!(resolve_family(&config, "RSA-2048"), None);
    }

    #[test]
    #[should_panic(expected = "max_memory_mb must be positive")]
    fn limits_reject_zero_memory() {
        let _ = ResourceLimits::new(0.0, 80.0);
    }
}
