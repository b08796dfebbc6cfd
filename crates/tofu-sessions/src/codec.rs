//! Authenticated encryption of session payloads
//!
//! Payloads are serialized to JSON, sealed with AES-256-GCM under a key
//! derived from the site secret (`SHA-256(secret)`), and stored as
//! `base64(nonce || ciphertext)`. Every call draws a fresh 96-bit nonce.

use crate::error::CodecError;
use aes_gcm::{
	Aes256Gcm, Nonce,
	aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use std::fmt;

const NONCE_LEN: usize = 12;

/// Session payload codec
///
/// Cheap to clone; build one at startup and share it.
///
/// # Examples
///
/// ```
/// use tofu_sessions::SessionCodec;
///
/// let codec = SessionCodec::new(b"site secret");
/// let sealed = codec.encrypt(&42u32).unwrap();
/// assert_eq!(codec.decrypt::<u32>(&sealed).unwrap(), 42);
///
/// let other = SessionCodec::new(b"another secret");
/// assert!(other.decrypt::<u32>(&sealed).is_err());
/// ```
#[derive(Clone)]
pub struct SessionCodec {
	cipher: Aes256Gcm,
}

impl SessionCodec {
	pub fn new(secret: &[u8]) -> Self {
		let key = Sha256::digest(secret);
		Self {
			cipher: Aes256Gcm::new(&key),
		}
	}

	pub fn from_secret(secret: &SecretString) -> Self {
		Self::new(secret.expose_secret().as_bytes())
	}

	/// Serialize and seal a value
	pub fn encrypt<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
		let plaintext =
			serde_json::to_vec(value).map_err(|e| CodecError::Serialization(e.to_string()))?;
		self.encrypt_bytes(&plaintext)
	}

	/// Open and deserialize a value sealed by [`SessionCodec::encrypt`]
	pub fn decrypt<T: DeserializeOwned>(&self, encoded: &str) -> Result<T, CodecError> {
		let plaintext = self.decrypt_bytes(encoded)?;
		serde_json::from_slice(&plaintext).map_err(|e| CodecError::Serialization(e.to_string()))
	}

	pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, CodecError> {
		let mut nonce_bytes = [0u8; NONCE_LEN];
		rand::rng().fill_bytes(&mut nonce_bytes);
		let nonce = Nonce::from(nonce_bytes);

		let ciphertext = self
			.cipher
			.encrypt(&nonce, plaintext)
			.map_err(|_| CodecError::Encryption)?;

		let mut sealed = nonce_bytes.to_vec();
		sealed.extend_from_slice(&ciphertext);
		Ok(STANDARD.encode(sealed))
	}

	pub fn decrypt_bytes(&self, encoded: &str) -> Result<Vec<u8>, CodecError> {
		let data = STANDARD
			.decode(encoded.trim())
			.map_err(|e| CodecError::Encoding(e.to_string()))?;
		if data.len() <= NONCE_LEN {
			return Err(CodecError::Truncated);
		}

		let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
		let nonce_array: [u8; NONCE_LEN] =
			nonce_bytes.try_into().map_err(|_| CodecError::Truncated)?;
		let nonce = Nonce::from(nonce_array);

		self.cipher
			.decrypt(&nonce, ciphertext)
			.map_err(|_| CodecError::Authentication)
	}
}

impl fmt::Debug for SessionCodec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionCodec").finish_non_exhaustive()
	}
}
