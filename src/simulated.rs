//! Simulated backend: protocol-correct PQC stand-ins without lattice math.
//!
//! Used for the whole process lifetime when the native primitives are absent
//! or fail their startup self-test. Outputs carry NO security guarantee;
//! every result is flagged [`BackendMode::Simulated`] so consumers can tell
//! demonstration output from real cryptographic output. What IS preserved:
//!
//! - byte lengths match the documented sizes of the real parameter sets;
//! - decapsulating a matching (secret key, ciphertext) pair reproduces the
//!   encapsulated secret, while a mismatched key silently yields garbage;
//! - sign/verify round-trips for matching key pairs and rejects altered
//!   messages, signatures, and unrelated keys;
//! - latency falls in an algorithm-specific realistic range.
//!
//! The trick is a SHAKE256 mask derived from the public key and embedded in
//! the head of the matching secret key: encapsulation XORs the fresh secret
//! into the ciphertext tail under the mask, signing tags the message under
//! the mask. Both sides of each protocol can recompute the mask only from
//! legitimate key material.

#![forbid(unsafe_code)]

use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tiny_keccak::{Hasher, Shake};

use crate::backend::{BackendMode, CryptoBackend, Encapsulation, PqcError};
use crate::config::{KemAlgorithm, SigAlgorithm};

const KEM_MASK_DOMAIN: &[u8] = b"PQE_KEM_MASK";
const SIG_MASK_DOMAIN: &[u8] = b"PQE_SIG_MASK";
const SIG_TAG_DOMAIN: &[u8] = b"PQE_SIG_TAG";
const SIG_PAD_DOMAIN: &[u8] = b"PQE_SIG_PAD";

const MASK_LEN: usize = 32;

/* ============================================================================
 * Timing / randomness profile
 * ========================================================================== */

/// Injectable latency and randomness strategy.
///
/// Production uses [`SimProfile::constrained_device`]; tests use
/// [`SimProfile::instant`] (zero delay) plus [`SimProfile::with_seed`] for a
/// deterministic generator, without touching the production code path.
#[derive(Clone, Debug)]
pub struct SimProfile {
    /// Seed for the byte generator; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Per-primitive delay ranges, microseconds.
    pub kem_keygen_us: Range<u64>,
    pub encapsulate_us: Range<u64>,
    pub decapsulate_us: Range<u64>,
    pub sig_keygen_us: Range<u64>,
    pub sign_us: Range<u64>,
    pub verify_us: Range<u64>,
}

impl SimProfile {
    /// Latency plausible for the IoT-class hardware the demo pretends to be.
    /// Falcon keygen dominates, as it does in the real algorithm.
    pub fn constrained_device() -> Self {
        Self {
            seed: None,
            kem_keygen_us: 8_000..20_000,
            encapsulate_us: 4_000..12_000,
            decapsulate_us: 4_000..10_000,
            sig_keygen_us: 60_000..150_000,
            sign_us: 15_000..40_000,
            verify_us: 2_000..8_000,
        }
    }

    /// Zero-delay profile for tests.
    pub fn instant() -> Self {
        Self {
            seed: None,
            kem_keygen_us: 0..1,
            encapsulate_us: 0..1,
            decapsulate_us: 0..1,
            sig_keygen_us: 0..1,
            sign_us: 0..1,
            verify_us: 0..1,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for SimProfile {
    fn default() -> Self {
        Self::constrained_device()
    }
}

/* ============================================================================
 * Backend
 * ========================================================================== */

pub struct SimulatedBackend {
    kem: KemAlgorithm,
    sig: SigAlgorithm,
    profile: SimProfile,
    rng: Mutex<StdRng>,
}

impl SimulatedBackend {
    pub fn new(kem: KemAlgorithm, sig: SigAlgorithm, profile: SimProfile) -> Self {
        let rng = match profile.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { kem, sig, profile, rng: Mutex::new(rng) }
    }

    fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        if let Ok(mut rng) = self.rng.lock() {
            rng.fill_bytes(&mut out);
        }
        out
    }

    /// Sleep for a duration drawn from the range. Draws under the rng lock,
    /// sleeps outside it.
    fn emulate_latency(&self, range: &Range<u64>) {
        let micros = match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(range.clone()),
            Err(_) => range.start,
        };
        if micros > 0 {
            std::thread::sleep(Duration::from_micros(micros));
        }
    }
}

fn shake256(domain: &[u8], inputs: &[&[u8]], out: &mut [u8]) {
    let mut sh = Shake::v256();
    sh.update(domain);
    for input in inputs {
        sh.update(input);
    }
    sh.finalize(out);
}

fn mask_for(domain: &[u8], public_key: &[u8]) -> [u8; MASK_LEN] {
    let mut mask = [0u8; MASK_LEN];
    shake256(domain, &[public_key], &mut mask);
    mask
}

impl CryptoBackend for SimulatedBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Simulated
    }

    fn kem_keypair(&self) -> Result<(Vec<u8>, Vec<u8>), PqcError> {
        self.emulate_latency(&self.profile.kem_keygen_us);

        let pk = self.random_bytes(self.kem.public_key_bytes());
        let mut sk = self.random_bytes(self.kem.secret_key_bytes());
        // The mask in the secret-key head is what links the pair.
        sk[..MASK_LEN].copy_from_slice(&mask_for(KEM_MASK_DOMAIN, &pk));
        Ok((pk, sk))
    }

    fn encapsulate(&self, public_key: &[u8]) -> Result<Encapsulation, PqcError> {
        if public_key.len() != self.kem.public_key_bytes() {
            return Err(PqcError::InvalidKey(format!(
                "expected {} byte {} public key, got {}",
                self.kem.public_key_bytes(),
                self.kem.name(),
                public_key.len()
            )));
        }
        self.emulate_latency(&self.profile.encapsulate_us);

        let shared_secret = self.random_bytes(self.kem.shared_secret_bytes());
        let mut ciphertext = self.random_bytes(self.kem.ciphertext_bytes());
        let mask = mask_for(KEM_MASK_DOMAIN, public_key);
        let tail = ciphertext.len() - MASK_LEN;
        for (i, byte) in shared_secret.iter().enumerate() {
            ciphertext[tail + i] = *byte ^ mask[i];
        }
        Ok(Encapsulation { ciphertext, shared_secret })
    }

    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, PqcError> {
        if private_key.len() != self.kem.secret_key_bytes() {
            return Err(PqcError::InvalidKey(format!(
                "expected {} byte {} secret key, got {}",
                self.kem.secret_key_bytes(),
                self.kem.name(),
                private_key.len()
            )));
        }
        if ciphertext.len() != self.kem.ciphertext_bytes() {
            return Err(PqcError::InvalidCiphertext {
                expected: self.kem.ciphertext_bytes(),
                got: ciphertext.len(),
            });
        }
        self.emulate_latency(&self.profile.decapsulate_us);

        // A mismatched key holds a different mask and silently produces
        // garbage, like a real KEM's implicit rejection.
        let tail = ciphertext.len() - MASK_LEN;
        let secret = ciphertext[tail..]
            .iter()
            .zip(&private_key[..MASK_LEN])
            .map(|(c, k)| c ^ k)
            .collect();
        Ok(secret)
    }

    fn sig_keypair(&self) -> Result<(Vec<u8>, Vec<u8>), PqcError> {
        self.emulate_latency(&self.profile.sig_keygen_us);

        let pk = self.random_bytes(self.sig.public_key_bytes());
        let mut sk = self.random_bytes(self.sig.secret_key_bytes());
        sk[..MASK_LEN].copy_from_slice(&mask_for(SIG_MASK_DOMAIN, &pk));
        Ok((pk, sk))
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, PqcError> {
        if private_key.len() != self.sig.secret_key_bytes() {
            return Err(PqcError::InvalidKey(format!(
                "expected {} byte {} secret key, got {}",
                self.sig.secret_key_bytes(),
                self.sig.name(),
                private_key.len()
            )));
        }
        self.emulate_latency(&self.profile.sign_us);

        let mut tag = [0u8; MASK_LEN];
        shake256(SIG_TAG_DOMAIN, &[&private_key[..MASK_LEN], message], &mut tag);

        let mut signature = vec![0u8; self.sig.signature_bytes()];
        signature[..MASK_LEN].copy_from_slice(&tag);
        shake256(SIG_PAD_DOMAIN, &[&tag, message], &mut signature[MASK_LEN..]);
        Ok(signature)
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, PqcError> {
        if public_key.len() != self.sig.public_key_bytes() {
            return Err(PqcError::InvalidKey(format!(
                "expected {} byte {} public key, got {}",
                self.sig.public_key_bytes(),
                self.sig.name(),
                public_key.len()
            )));
        }
        if signature.len() != self.sig.signature_bytes() {
            return Err(PqcError::InvalidSignatureFormat(format!(
                "expected {} byte signature, got {}",
                self.sig.signature_bytes(),
                signature.len()
            )));
        }
        self.emulate_latency(&self.profile.verify_us);

        let mask = mask_for(SIG_MASK_DOMAIN, public_key);
        let mut expected = [0u8; MASK_LEN];
        shake256(SIG_TAG_DOMAIN, &[&mask, message], &mut expected);
        Ok(signature[..MASK_LEN] == expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> SimulatedBackend {
        SimulatedBackend::new(
            KemAlgorithm::Kyber768,
            SigAlgorithm::Falcon512,
            SimProfile::instant().with_seed(0x5EED),
        )
    }

    #[test]
    fn reports_simulated_mode() {
        assert_eq!(backend().mode(), BackendMode::Simulated);
    }

    #[test]
    fn kem_sizes_match_the_real_parameter_set() {
        let backend = backend();
        let (pk, sk) = backend.kem_keypair().unwrap();
        assert_eq!(pk.len(), 1184);
        assert_eq!(sk.len(), 2400);

        let enc = backend.encapsulate(&pk).unwrap();
        assert_eq!(enc.ciphertext.len(), 1088);
        assert_eq!(enc.shared_secret.len(), 32);
    }

    #[test]
    fn kem_roundtrip_reproduces_the_secret() {
        let backend = backend();
        let (pk, sk) = backend.kem_keypair().unwrap();

        let enc = backend.encapsulate(&pk).unwrap();
        let ss = backend.decapsulate(&sk, &enc.ciphertext).unwrap();
        assert_eq!(ss, enc.shared_secret, "matching pair must round-trip");
    }

    #[test]
    fn mismatched_secret_key_yields_garbage_not_error() {
        let backend = backend();
        let (pk, _sk) = backend.kem_keypair().unwrap();
        let (_other_pk, other_sk) = backend.kem_keypair().unwrap();

        let enc = backend.encapsulate(&pk).unwrap();
        let ss = backend.decapsulate(&other_sk, &enc.ciphertext).unwrap();
        assert_eq!(ss.len(), 32);
        assert_ne!(ss, enc.shared_secret);
    }

    #[test]
    fn wrong_length_inputs_are_classified() {
        let backend = backend();
        let (pk, sk) = backend.kem_keypair().unwrap();

        assert!(matches!(backend.encapsulate(&pk[..100]), Err(PqcError::InvalidKey(_))));
        assert!(matches!(
            backend.decapsulate(&sk, &[0u8; 10]),
            Err(PqcError::InvalidCiphertext { got: 10, .. })
        ));
    }

    #[test]
    fn signature_roundtrip_and_sizes() {
        let backend = backend();
        let (pk, sk) = backend.sig_keypair().unwrap();
        assert_eq!(pk.len(), 897);
        assert_eq!(sk.len(), 1281);

        let sig = backend.sign(&sk, b"hello").unwrap();
        assert_eq!(sig.len(), 666);
        assert!(backend.verify(&pk, b"hello", &sig).unwrap());
    }

    #[test]
    fn verify_rejects_altered_message_and_foreign_key() {
        let backend = backend();
        let (pk, sk) = backend.sig_keypair().unwrap();
        let (other_pk, _) = backend.sig_keypair().unwrap();

        let sig = backend.sign(&sk, b"hello").unwrap();
        assert!(!backend.verify(&pk, b"world", &sig).unwrap());
        assert!(!backend.verify(&other_pk, b"hello", &sig).unwrap());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let backend = backend();
        let (pk, sk) = backend.sig_keypair().unwrap();

        let mut sig = backend.sign(&sk, b"hello").unwrap();
        sig[0] ^= 0x01;
        assert!(!backend.verify(&pk, b"hello", &sig).unwrap());
    }

    #[test]
    fn truncated_signature_is_a_format_error() {
        let backend = backend();
        let (pk, _sk) = backend.sig_keypair().unwrap();
        assert!(matches!(
            backend.verify(&pk, b"hello", &[0u8; 64]),
            Err(PqcError::InvalidSignatureFormat(_))
        ));
    }

    #[test]
    fn seeded_profiles_are_reproducible() {
        let a = backend().kem_keypair().unwrap();
        let b = backend().kem_keypair().unwrap();
        assert_eq!(a.0, b.0, "same seed, same first keypair");
    }
}
