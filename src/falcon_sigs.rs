//! Falcon-512 Post-Quantum Signatures (native primitives)
//!
//! Thin typed wrappers over `pqcrypto_falcon`, used by the native backend.
//!
//! # Security Model
//! - **Detached signatures**: sign arbitrary messages, verify against the
//!   message and public key
//! - **Variable-length signatures**: up to 666 bytes; length alone does not
//!   identify a malformed signature
//!
//! Byte sizes are documented on [`crate::config::SigAlgorithm`].

#![forbid(unsafe_code)]

use pqcrypto_falcon::falcon512;
use pqcrypto_traits::sign::{
    DetachedSignature as PQDetachedSignature, PublicKey as PQPublicKey, SecretKey as PQSecretKey,
};
use zeroize::Zeroizing;

use crate::backend::PqcError;

/// Falcon-512 public key (897 bytes)
pub type FalconPublicKey = falcon512::PublicKey;

/// Falcon-512 secret key (1281 bytes)
pub type FalconSecretKey = falcon512::SecretKey;

/* ============================================================================
 * Key Generation
 * ========================================================================== */

/// Generate a new Falcon-512 keypair.
#[inline]
pub fn falcon_keypair() -> (FalconPublicKey, FalconSecretKey) {
    falcon512::keypair()
}

/// Import public key from bytes
pub fn falcon_pk_from_bytes(bytes: &[u8]) -> Result<FalconPublicKey, PqcError> {
    FalconPublicKey::from_bytes(bytes)
        .map_err(|_| PqcError::InvalidKey("malformed Falcon-512 public key".into()))
}

/// Import secret key from bytes
pub fn falcon_sk_from_bytes(bytes: &[u8]) -> Result<FalconSecretKey, PqcError> {
    FalconSecretKey::from_bytes(bytes)
        .map_err(|_| PqcError::InvalidKey("malformed Falcon-512 secret key".into()))
}

/// Export public key to bytes (897 bytes)
#[inline]
pub fn falcon_pk_to_bytes(pk: &FalconPublicKey) -> &[u8] {
    pk.as_bytes()
}

/// Export secret key to bytes (1281 bytes) - SENSITIVE!
#[inline]
pub fn falcon_sk_to_bytes(sk: &FalconSecretKey) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(sk.as_bytes().to_vec())
}

/* ============================================================================
 * Signing / Verification
 * ========================================================================== */

/// Sign a message, returning the detached signature bytes.
///
/// # Performance
/// ~10ms on modern CPU
pub fn falcon_sign_detached(message: &[u8], secret_key: &FalconSecretKey) -> Vec<u8> {
    falcon512::detached_sign(message, secret_key).as_bytes().to_vec()
}

/// Verify a detached signature.
///
/// A well-formed signature that does not match the (message, key) pair
/// returns `Ok(false)`; only an unparseable signature is an error.
///
/// # Performance
/// ~200 microseconds on modern CPU
pub fn falcon_verify_detached(
    message: &[u8],
    signature_bytes: &[u8],
    public_key: &FalconPublicKey,
) -> Result<bool, PqcError> {
    let sig = falcon512::DetachedSignature::from_bytes(signature_bytes)
        .map_err(|_| PqcError::InvalidSignatureFormat("unparseable Falcon-512 signature".into()))?;

    Ok(falcon512::verify_detached_signature(&sig, message, public_key).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigAlgorithm;

    #[test]
    fn keypair_has_documented_sizes() {
        let (pk, sk) = falcon_keypair();
        assert_eq!(pk.as_bytes().len(), SigAlgorithm::Falcon512.public_key_bytes());
        assert_eq!(sk.as_bytes().len(), SigAlgorithm::Falcon512.secret_key_bytes());
    }

    #[test]
    fn sign_verify_roundtrip() {
        let (pk, sk) = falcon_keypair();
        let message = b"edge device attestation payload";

        let sig = falcon_sign_detached(message, &sk);
        assert!(sig.len() <= SigAlgorithm::Falcon512.signature_bytes());

        assert!(falcon_verify_detached(message, &sig, &pk).unwrap());
    }

    #[test]
    fn altered_message_fails() {
        let (pk, sk) = falcon_keypair();
        let sig = falcon_sign_detached(b"original", &sk);

        assert!(!falcon_verify_detached(b"tampered", &sig, &pk).unwrap());
    }

    #[test]
    fn unrelated_keypair_fails() {
        let (_pk, sk) = falcon_keypair();
        let (other_pk, _other_sk) = falcon_keypair();
        let message = b"cross-key check";

        let sig = falcon_sign_detached(message, &sk);
        assert!(!falcon_verify_detached(message, &sig, &other_pk).unwrap());
    }

    #[test]
    fn key_import_export() {
        let (pk, sk) = falcon_keypair();

        let pk2 = falcon_pk_from_bytes(falcon_pk_to_bytes(&pk)).unwrap();
        let sk2 = falcon_sk_from_bytes(&falcon_sk_to_bytes(&sk)).unwrap();

        let sig = falcon_sign_detached(b"reimported keys", &sk2);
        assert!(falcon_verify_detached(b"reimported keys", &sig, &pk2).unwrap());
    }
}
