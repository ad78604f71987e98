//! pqc_edge: post-quantum crypto operations under simulated edge-device limits
//!
//! One stable entry point ([`PqcEngine`]) dispatches KEM and signature
//! primitives to whichever backend variant the process selected at startup:
//! - native Kyber-768 + Falcon-512 when the real primitives initialize,
//! - a protocol-correct simulation otherwise, flagged on every result.
//!
//! Around each call the engine captures resource samples and wall-clock
//! timing, checks them against configured constrained-device ceilings, and
//! appends one operation record plus one usage record to the storage sink.
//!
//! Modules:
//! - config: pinned algorithm parameter sets, resource limits
//! - resource: process memory/CPU sampling and limit compliance
//! - timer: scoped wall-clock measurement
//! - backend: error taxonomy, backend trait, startup selection
//! - kyber_kem / falcon_sigs / native: the real primitives (feature `native-pqc`)
//! - simulated: size- and protocol-correct stand-ins with realistic latency
//! - engine: per-call dispatch, metrics glue, structured outcomes
//! - store: append-only record sink plus the in-memory implementation

pub mod backend;
pub mod config;
pub mod engine;
pub mod resource;
pub mod simulated;
pub mod store;
pub mod timer;

#[cfg(feature = "native-pqc")]
pub mod falcon_sigs;
#[cfg(feature = "native-pqc")]
pub mod kyber_kem;
#[cfg(feature = "native-pqc")]
pub mod native;

// Re-export main types for convenience
pub use backend::{select_backend, BackendMode, CryptoBackend, Encapsulation, PqcError};
pub use config::{AlgorithmFamily, KemAlgorithm, PqcConfig, ResourceLimits, SigAlgorithm};
pub use engine::{KeyPair, OperationOutcome, PqcEngine};
pub use resource::{ComplianceResult, ResourceMonitor, ResourceSample, SystemInfo};
pub use simulated::{SimProfile, SimulatedBackend};
pub use store::{MemoryStore, OperationRecord, OperationStats, OperationStore, ResourceUsageRecord};
pub use timer::OperationTimer;

#[cfg(feature = "native-pqc")]
pub use native::NativeBackend;
