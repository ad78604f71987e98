//! Kyber-768 Key Encapsulation Mechanism (native primitives)
//!
//! Thin typed wrappers over `pqcrypto_kyber`, used by the native backend.
//!
//! # Security Model
//! - **IND-CCA2 secure**: chosen ciphertext attack resistant
//! - **Implicit rejection**: a mismatched secret key decapsulates to a
//!   garbage secret, never an error
//!
//! Byte sizes are documented on [`KemAlgorithm::Kyber768`].

#![forbid(unsafe_code)]

use pqcrypto_kyber::kyber768;
use pqcrypto_traits::kem::{
    Ciphertext as KemCiphertext, PublicKey as KemPublicKey, SecretKey as KemSecretKey,
    SharedSecret as KemSharedSecret,
};
use zeroize::Zeroizing;

use crate::backend::PqcError;
use crate::config::KemAlgorithm;

/// Kyber-768 public key (1184 bytes)
pub type KyberPublicKey = kyber768::PublicKey;

/// Kyber-768 secret key (2400 bytes)
pub type KyberSecretKey = kyber768::SecretKey;

/// Kyber-768 ciphertext (1088 bytes)
pub type KyberCiphertext = kyber768::Ciphertext;

/* ============================================================================
 * Key Generation
 * ========================================================================== */

/// Generate a new Kyber-768 keypair.
#[inline]
pub fn kyber_keypair() -> (KyberPublicKey, KyberSecretKey) {
    kyber768::keypair()
}

/// Import public key from bytes
pub fn kyber_pk_from_bytes(bytes: &[u8]) -> Result<KyberPublicKey, PqcError> {
    KyberPublicKey::from_bytes(bytes)
        .map_err(|_| PqcError::InvalidKey("malformed Kyber768 public key".into()))
}

/// Import secret key from bytes
pub fn kyber_sk_from_bytes(bytes: &[u8]) -> Result<KyberSecretKey, PqcError> {
    KyberSecretKey::from_bytes(bytes)
        .map_err(|_| PqcError::InvalidKey("malformed Kyber768 secret key".into()))
}

/// Export public key to bytes (1184 bytes)
#[inline]
pub fn kyber_pk_to_bytes(pk: &KyberPublicKey) -> &[u8] {
    pk.as_bytes()
}

/// Export secret key to bytes (2400 bytes) - SENSITIVE!
#[inline]
pub fn kyber_sk_to_bytes(sk: &KyberSecretKey) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(sk.as_bytes().to_vec())
}

/* ============================================================================
 * Encapsulation / Decapsulation
 * ========================================================================== */

/// Encapsulate a fresh shared secret to the given public key.
///
/// # Returns
/// (shared_secret_bytes, ciphertext_bytes)
pub fn kyber_encapsulate(public_key: &KyberPublicKey) -> (Zeroizing<Vec<u8>>, Vec<u8>) {
    let (ss, ct) = kyber768::encapsulate(public_key);
    (Zeroizing::new(ss.as_bytes().to_vec()), ct.as_bytes().to_vec())
}

/// Import ciphertext from bytes
pub fn kyber_ct_from_bytes(bytes: &[u8]) -> Result<KyberCiphertext, PqcError> {
    KyberCiphertext::from_bytes(bytes).map_err(|_| PqcError::InvalidCiphertext {
        expected: KemAlgorithm::Kyber768.ciphertext_bytes(),
        got: bytes.len(),
    })
}

/// Recover the shared secret from a ciphertext.
pub fn kyber_decapsulate(
    ciphertext: &KyberCiphertext,
    secret_key: &KyberSecretKey,
) -> Zeroizing<Vec<u8>> {
    let ss = kyber768::decapsulate(ciphertext, secret_key);
    Zeroizing::new(ss.as_bytes().to_vec())
}
