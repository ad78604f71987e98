//! Operation dispatcher: the one entry point callers and the HTTP layer use.
//!
//! Every call runs the same sequence (resource snapshot, timed execution on
//! the active backend, second snapshot, record emission) and returns a
//! structured outcome instead of propagating errors raw. No state survives
//! between calls; callers supply key material explicitly.

#![forbid(unsafe_code)]

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::backend::{BackendMode, CryptoBackend, Encapsulation, PqcError};
use crate::config::{resolve_family, AlgorithmFamily, PqcConfig};
use crate::resource::{ResourceMonitor, SystemInfo};
use crate::store::{OperationRecord, OperationStore, ResourceUsageRecord};
use crate::timer::OperationTimer;

/* ============================================================================
 * Caller-facing types
 * ========================================================================== */

/// A generated key pair. Caller-owned and immutable once returned; the
/// private key is zeroized on drop but otherwise unprotected (demo-grade).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: Vec<u8>,
    pub private_key: Vec<u8>,
    pub family: AlgorithmFamily,
    /// Parameter-set label, e.g. `"Kyber768"` or `"Kyber768 (simulated)"`.
    pub algorithm: String,
}

impl Zeroize for KeyPair {
    fn zeroize(&mut self) {
        self.private_key.zeroize();
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Structured result of one operation. The caller is never left without a
/// response: failures arrive as `success=false` plus a short error string.
#[derive(Clone, Debug, Serialize)]
pub struct OperationOutcome<T> {
    pub success: bool,
    pub result: Option<T>,
    pub execution_time_ms: f64,
    pub mode: BackendMode,
    pub error: Option<String>,
}

/* ============================================================================
 * Engine
 * ========================================================================== */

pub struct PqcEngine {
    config: PqcConfig,
    backend: Box<dyn CryptoBackend>,
    monitor: ResourceMonitor,
    store: Arc<dyn OperationStore>,
}

impl PqcEngine {
    pub fn new(
        config: PqcConfig,
        backend: Box<dyn CryptoBackend>,
        store: Arc<dyn OperationStore>,
    ) -> Self {
        Self { config, backend, monitor: ResourceMonitor::new(), store }
    }

    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    pub fn config(&self) -> &PqcConfig {
        &self.config
    }

    pub fn system_info(&self) -> SystemInfo {
        self.monitor.system_info()
    }

    /// Generate a key pair for one of the two configured families.
    ///
    /// `algorithm` may be the family keyword (`"KEM"`, `"SIGNATURE"`) or the
    /// configured parameter-set name; anything else is `UnsupportedAlgorithm`.
    pub fn generate_keypair(&self, algorithm: &str) -> OperationOutcome<KeyPair> {
        match resolve_family(&self.config, algorithm) {
            Some(AlgorithmFamily::Kem) => {
                self.instrument("kem_keygen", self.config.kem.name(), || {
                    let (public_key, private_key) = self.backend.kem_keypair()?;
                    Ok(KeyPair {
                        public_key,
                        private_key,
                        family: AlgorithmFamily::Kem,
                        algorithm: self.algorithm_label(self.config.kem.name()),
                    })
                })
            }
            Some(AlgorithmFamily::Signature) => {
                self.instrument("sig_keygen", self.config.sig.name(), || {
                    let (public_key, private_key) = self.backend.sig_keypair()?;
                    Ok(KeyPair {
                        public_key,
                        private_key,
                        family: AlgorithmFamily::Signature,
                        algorithm: self.algorithm_label(self.config.sig.name()),
                    })
                })
            }
            None => self.instrument("keygen", algorithm, || {
                Err(PqcError::UnsupportedAlgorithm(algorithm.to_string()))
            }),
        }
    }

    pub fn encapsulate(&self, public_key: &[u8]) -> OperationOutcome<Encapsulation> {
        self.instrument("kem_encapsulate", self.config.kem.name(), || {
            self.backend.encapsulate(public_key)
        })
    }

    /// Recover a shared secret. A well-formed but mismatched private key
    /// yields a wrong secret, not an error, mirroring real KEM behavior.
    pub fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> OperationOutcome<Vec<u8>> {
        self.instrument("kem_decapsulate", self.config.kem.name(), || {
            self.backend.decapsulate(private_key, ciphertext)
        })
    }

    pub fn sign(&self, private_key: &[u8], message: &[u8]) -> OperationOutcome<Vec<u8>> {
        self.instrument("sig_sign", self.config.sig.name(), || {
            self.backend.sign(private_key, message)
        })
    }

    /// A mismatched-but-well-formed triple is `success=true, result=false`;
    /// only malformed inputs produce an error outcome.
    pub fn verify(
        &self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> OperationOutcome<bool> {
        self.instrument("sig_verify", self.config.sig.name(), || {
            self.backend.verify(public_key, message, signature)
        })
    }

    fn algorithm_label(&self, name: &str) -> String {
        match self.backend.mode() {
            BackendMode::Available => name.to_string(),
            BackendMode::Simulated => format!("{name} (simulated)"),
        }
    }

    /// The per-call sequence: snapshot, timed execute, snapshot, record.
    /// Emits exactly one operation record and one usage record on every exit
    /// path; limit violations are logged and attached, never enforced.
    fn instrument<T>(
        &self,
        operation: &'static str,
        algorithm: &str,
        run: impl FnOnce() -> Result<T, PqcError>,
    ) -> OperationOutcome<T> {
        let before = self.monitor.snapshot();
        let timer = OperationTimer::start();
        let result = run();
        let execution_time_ms = timer.elapsed_ms();
        let after = self.monitor.snapshot();

        let compliance = self.monitor.check(&after, &self.config.limits);
        if let Some(advisory) = compliance.advisory(&after, &self.config.limits) {
            log::warn!("{operation}: {advisory}");
        }

        let (success, error) = match &result {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        };

        self.store.record_operation(OperationRecord {
            operation: operation.to_string(),
            algorithm: algorithm.to_string(),
            timestamp: Utc::now(),
            success,
            execution_time_ms,
            error: error.clone(),
        });
        self.store.record_usage(ResourceUsageRecord {
            operation: operation.to_string(),
            before,
            after,
            compliance,
        });

        OperationOutcome { success, result: result.ok(), execution_time_ms, mode: self.backend.mode(), error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{SimProfile, SimulatedBackend};
    use crate::store::MemoryStore;

    fn engine() -> (PqcEngine, Arc<MemoryStore>) {
        let config = PqcConfig::default();
        let backend = SimulatedBackend::new(config.kem, config.sig, SimProfile::instant().with_seed(42));
        let store = Arc::new(MemoryStore::new());
        (PqcEngine::new(config, Box::new(backend), store.clone()), store)
    }

    #[test]
    fn unsupported_algorithm_is_a_structured_failure() {
        let (engine, store) = engine();
        let outcome = engine.generate_keypair("RSA-2048");

        assert!(!outcome.success);
        assert!(outcome.result.is_none());
        assert!(outcome.error.unwrap().contains("RSA-2048"));
        // Failure still produced its record and sample pair.
        assert_eq!(store.operation_count(), 1);
        assert_eq!(store.usage_count(), 1);
        assert!(!store.recent_operations(1)[0].success);
    }

    #[test]
    fn every_call_emits_one_record_and_one_usage_pair() {
        let (engine, store) = engine();
        let keys = engine.generate_keypair("KEM").result.unwrap();
        let _ = engine.encapsulate(&keys.public_key);
        let _ = engine.encapsulate(&[0u8; 3]); // fails

        assert_eq!(store.operation_count(), 3);
        assert_eq!(store.usage_count(), 3);
        for record in store.recent_operations(3) {
            assert!(record.execution_time_ms >= 0.0);
        }
    }

    #[test]
    fn simulated_mode_is_flagged_on_every_outcome() {
        let (engine, _) = engine();
        assert_eq!(engine.generate_keypair("KEM").mode, BackendMode::Simulated);
        assert_eq!(engine.encapsulate(&[0u8; 3]).mode, BackendMode::Simulated);
        assert_eq!(engine.generate_keypair("nope").mode, BackendMode::Simulated);
    }

    #[test]
    fn simulated_keypair_carries_the_mode_label() {
        let (engine, _) = engine();
        let keys = engine.generate_keypair("KEM").result.unwrap();
        assert_eq!(keys.algorithm, "Kyber768 (simulated)");
    }

    #[test]
    fn verify_mismatch_is_success_false_result() {
        let (engine, _) = engine();
        let keys = engine.generate_keypair("SIGNATURE").result.unwrap();
        let sig = engine.sign(&keys.private_key, b"world").result.unwrap();

        let outcome = engine.verify(&keys.public_key, b"hello", &sig);
        assert!(outcome.success, "mismatch is not an error");
        assert_eq!(outcome.result, Some(false));
        assert!(outcome.error.is_none());
    }
}
