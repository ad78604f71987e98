//! Native backend: real lattice primitives behind the [`CryptoBackend`] seam.
//!
//! Selected at startup only if [`NativeBackend::initialize`] succeeds, which
//! requires both primitive families to pass a round-trip self-test. After
//! that, every operation delegates straight to the `pqcrypto` implementations
//! with no per-call availability checks.

#![forbid(unsafe_code)]

use crate::backend::{BackendMode, CryptoBackend, Encapsulation, PqcError};
use crate::config::{KemAlgorithm, SigAlgorithm};
use crate::falcon_sigs::{
    falcon_keypair, falcon_pk_from_bytes, falcon_pk_to_bytes, falcon_sign_detached,
    falcon_sk_from_bytes, falcon_sk_to_bytes, falcon_verify_detached,
};
use crate::kyber_kem::{
    kyber_ct_from_bytes, kyber_decapsulate, kyber_encapsulate, kyber_keypair, kyber_pk_from_bytes,
    kyber_pk_to_bytes, kyber_sk_from_bytes, kyber_sk_to_bytes,
};

/// Dispatches the five primitives to Kyber-768 and Falcon-512.
pub struct NativeBackend {
    kem: KemAlgorithm,
    sig: SigAlgorithm,
}

impl NativeBackend {
    /// Construct the backend, proving the primitives actually work here.
    ///
    /// A failed self-test is reported as [`PqcError::BackendUnavailable`] so
    /// the caller can fall back to the simulated variant at startup.
    pub fn initialize(kem: KemAlgorithm, sig: SigAlgorithm) -> Result<Self, PqcError> {
        let backend = Self { kem, sig };
        backend.self_test()?;
        log::info!(
            "native PQC backend ready ({} + {})",
            backend.kem.name(),
            backend.sig.name()
        );
        Ok(backend)
    }

    fn self_test(&self) -> Result<(), PqcError> {
        let (pk, sk) = kyber_keypair();
        let (ss, ct_bytes) = kyber_encapsulate(&pk);
        let ct = kyber_ct_from_bytes(&ct_bytes)
            .map_err(|e| PqcError::BackendUnavailable(format!("KEM self-test: {e}")))?;
        if kyber_decapsulate(&ct, &sk).as_slice() != ss.as_slice() {
            return Err(PqcError::BackendUnavailable(
                "KEM self-test round trip mismatch".into(),
            ));
        }

        let (pk, sk) = falcon_keypair();
        let sig = falcon_sign_detached(b"self-test", &sk);
        let ok = falcon_verify_detached(b"self-test", &sig, &pk)
            .map_err(|e| PqcError::BackendUnavailable(format!("signature self-test: {e}")))?;
        if !ok {
            return Err(PqcError::BackendUnavailable(
                "signature self-test rejected its own signature".into(),
            ));
        }
        Ok(())
    }
}

impl CryptoBackend for NativeBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Available
    }

    fn kem_keypair(&self) -> Result<(Vec<u8>, Vec<u8>), PqcError> {
        let (pk, sk) = kyber_keypair();
        Ok((kyber_pk_to_bytes(&pk).to_vec(), kyber_sk_to_bytes(&sk).to_vec()))
    }

    fn encapsulate(&self, public_key: &[u8]) -> Result<Encapsulation, PqcError> {
        let pk = kyber_pk_from_bytes(public_key)?;
        let (ss, ciphertext) = kyber_encapsulate(&pk);
        Ok(Encapsulation { ciphertext, shared_secret: ss.to_vec() })
    }

    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, PqcError> {
        let sk = kyber_sk_from_bytes(private_key)?;
        let ct = kyber_ct_from_bytes(ciphertext)?;
        Ok(kyber_decapsulate(&ct, &sk).to_vec())
    }

    fn sig_keypair(&self) -> Result<(Vec<u8>, Vec<u8>), PqcError> {
        let (pk, sk) = falcon_keypair();
        Ok((falcon_pk_to_bytes(&pk).to_vec(), falcon_sk_to_bytes(&sk).to_vec()))
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, PqcError> {
        let sk = falcon_sk_from_bytes(private_key)?;
        Ok(falcon_sign_detached(message, &sk))
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, PqcError> {
        let pk = falcon_pk_from_bytes(public_key)?;
        falcon_verify_detached(message, signature, &pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> NativeBackend {
        NativeBackend::initialize(KemAlgorithm::Kyber768, SigAlgorithm::Falcon512)
            .expect("native primitives should initialize")
    }

    #[test]
    fn reports_available_mode() {
        assert_eq!(backend().mode(), BackendMode::Available);
    }

    #[test]
    fn kem_roundtrip_through_trait() {
        let backend = backend();
        let (pk, sk) = backend.kem_keypair().unwrap();

        let enc = backend.encapsulate(&pk).unwrap();
        assert_eq!(enc.shared_secret.len(), 32);

        let ss = backend.decapsulate(&sk, &enc.ciphertext).unwrap();
        assert_eq!(ss, enc.shared_secret);
    }

    #[test]
    fn malformed_public_key_is_invalid_key() {
        let err = backend().encapsulate(&[0u8; 7]).unwrap_err();
        assert!(matches!(err, PqcError::InvalidKey(_)));
    }

    #[test]
    fn sign_verify_through_trait() {
        let backend = backend();
        let (pk, sk) = backend.sig_keypair().unwrap();

        let sig = backend.sign(&sk, b"hello").unwrap();
        assert!(backend.verify(&pk, b"hello", &sig).unwrap());
        assert!(!backend.verify(&pk, b"world", &sig).unwrap());
    }
}
