//! Password-based AES-CBC compatible with `openssl enc`.
//!
//! Key and IV come from OpenSSL's `EVP_BytesToKey` with a single iteration:
//!
//! ```text
//! D0 = ""
//! Di = digest(Di-1 || password || salt)
//! key || iv = D1 || D2 || ...
//! ```
//!
//! Ciphertext blobs are framed as `"Salted__" || salt(8) || AES-CBC(PKCS#7(plaintext))`.

use core::fmt;
use core::str::FromStr;

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand_core::{OsRng, RngCore};

use crate::digest::{Digest, DigestAlgorithm};
use crate::error::{PkiError, Result};

/// Literal marker preceding the salt in a salted blob.
pub const SALT_MARKER: &[u8; 8] = b"Salted__";

/// Length of the random salt in bytes.
pub const SALT_LEN: usize = 8;

/// AES block size, also the IV length.
pub const BLOCK_SIZE: usize = 16;

/// Key size of the AES-CBC cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherVariant {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl CipherVariant {
    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            CipherVariant::Aes128Cbc => 16,
            CipherVariant::Aes192Cbc => 24,
            CipherVariant::Aes256Cbc => 32,
        }
    }

    /// Name as printed by OpenSSL, e.g. `AES-256-CBC`.
    pub fn name(self) -> &'static str {
        match self {
            CipherVariant::Aes128Cbc => "AES-128-CBC",
            CipherVariant::Aes192Cbc => "AES-192-CBC",
            CipherVariant::Aes256Cbc => "AES-256-CBC",
        }
    }
}

impl FromStr for CipherVariant {
    type Err = PkiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AES-128-CBC" => Ok(CipherVariant::Aes128Cbc),
            "AES-192-CBC" => Ok(CipherVariant::Aes192Cbc),
            "AES-256-CBC" => Ok(CipherVariant::Aes256Cbc),
            _ => Err(PkiError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for CipherVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derives `key_len` bytes of key and `iv_len` bytes of IV from a password.
///
/// An empty `salt` reproduces the unsalted legacy derivation.
pub fn evp_bytes_to_key(
    digest: &dyn Digest,
    password: &[u8],
    salt: &[u8],
    key_len: usize,
    iv_len: usize,
) -> (Vec<u8>, Vec<u8>) {
    let mut material = Vec::with_capacity(key_len + iv_len + 64);
    let mut previous: Vec<u8> = Vec::new();
    while material.len() < key_len + iv_len {
        let mut input = Vec::with_capacity(previous.len() + password.len() + salt.len());
        input.extend_from_slice(&previous);
        input.extend_from_slice(password);
        input.extend_from_slice(salt);
        previous = digest.hash(&input);
        material.extend_from_slice(&previous);
    }
    let iv = material[key_len..key_len + iv_len].to_vec();
    material.truncate(key_len);
    (material, iv)
}

/// CBC-encrypts `data` with PKCS#7 padding. Aligned input gains a full padding block.
pub(crate) fn cbc_encrypt(
    variant: CipherVariant,
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>> {
    let ciphertext = match variant {
        CipherVariant::Aes128Cbc => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|e| PkiError::InvalidParameter(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        CipherVariant::Aes192Cbc => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|e| PkiError::InvalidParameter(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        CipherVariant::Aes256Cbc => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|e| PkiError::InvalidParameter(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
    };
    Ok(ciphertext)
}

/// CBC-decrypts block-aligned `data` and leaves any padding in place.
pub(crate) fn cbc_decrypt_raw(
    variant: CipherVariant,
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>> {
    let unpad = |_| PkiError::MalformedInput("ciphertext is not block aligned".to_string());
    match variant {
        CipherVariant::Aes128Cbc => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|e| PkiError::InvalidParameter(e.to_string()))?
            .decrypt_padded_vec_mut::<NoPadding>(data)
            .map_err(unpad),
        CipherVariant::Aes192Cbc => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|e| PkiError::InvalidParameter(e.to_string()))?
            .decrypt_padded_vec_mut::<NoPadding>(data)
            .map_err(unpad),
        CipherVariant::Aes256Cbc => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|e| PkiError::InvalidParameter(e.to_string()))?
            .decrypt_padded_vec_mut::<NoPadding>(data)
            .map_err(unpad),
    }
}

/// Password-based AES-CBC cipher producing `openssl enc` compatible blobs.
///
/// The password and variant are fixed at construction; share an instance across
/// threads only by shared reference.
#[derive(Clone)]
pub struct SymmetricCipher {
    password: String,
    variant: CipherVariant,
    digest: DigestAlgorithm,
}

impl fmt::Debug for SymmetricCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricCipher")
            .field("variant", &self.variant)
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl SymmetricCipher {
    /// Creates a cipher using MD5 for key derivation, matching `openssl enc -md md5`.
    pub fn new(password: impl Into<String>, variant: CipherVariant) -> Self {
        Self {
            password: password.into(),
            variant,
            digest: DigestAlgorithm::Md5,
        }
    }

    /// Creates a cipher from an OpenSSL algorithm name such as `AES-128-CBC`.
    pub fn from_algorithm_name(password: impl Into<String>, algorithm: &str) -> Result<Self> {
        Ok(Self::new(password, algorithm.parse()?))
    }

    /// Replaces the key-derivation digest.
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    pub fn variant(&self) -> CipherVariant {
        self.variant
    }

    fn derive(&self, salt: &[u8]) -> (Vec<u8>, Vec<u8>) {
        evp_bytes_to_key(
            self.digest.digest().as_ref(),
            self.password.as_bytes(),
            salt,
            self.variant.key_len(),
            BLOCK_SIZE,
        )
    }

    /// Encrypts `plaintext` under a fresh random salt.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        self.encrypt_with_salt(plaintext, &salt)
    }

    /// Encrypts `plaintext` under the given salt.
    pub fn encrypt_with_salt(&self, plaintext: &[u8], salt: &[u8; SALT_LEN]) -> Result<Vec<u8>> {
        let (key, iv) = self.derive(salt);
        let ciphertext = cbc_encrypt(self.variant, &key, &iv, plaintext)?;

        let mut blob = Vec::with_capacity(SALT_MARKER.len() + SALT_LEN + ciphertext.len());
        blob.extend_from_slice(SALT_MARKER);
        blob.extend_from_slice(salt);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypts a blob produced by [`SymmetricCipher::encrypt`] or `openssl enc`.
    ///
    /// The payload always starts at byte 16, whether or not the marker is present.
    /// Without the marker the salt is empty. Padding is stripped by the value of the
    /// final byte only.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() % BLOCK_SIZE != 0 {
            return Err(PkiError::MalformedInput(format!(
                "ciphertext length {} is not a multiple of {BLOCK_SIZE}",
                blob.len()
            )));
        }
        if blob.len() <= BLOCK_SIZE {
            return Err(PkiError::MalformedInput(
                "ciphertext holds no data blocks".to_string(),
            ));
        }

        let salt: &[u8] = if &blob[..SALT_MARKER.len()] == SALT_MARKER {
            &blob[SALT_MARKER.len()..SALT_MARKER.len() + SALT_LEN]
        } else {
            &[]
        };

        let (key, iv) = self.derive(salt);
        let mut plaintext = cbc_decrypt_raw(self.variant, &key, &iv, &blob[BLOCK_SIZE..])?;

        let padding = plaintext.last().copied().unwrap_or_default() as usize;
        if padding > plaintext.len() {
            return Err(PkiError::MalformedInput(format!(
                "padding length {padding} exceeds plaintext"
            )));
        }
        plaintext.truncate(plaintext.len() - padding);
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Md5;
    use rstest::rstest;

    const SALT: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    #[test]
    fn test_evp_bytes_to_key_matches_openssl() {
        let (key, iv) = evp_bytes_to_key(&Md5, b"pwd", &SALT, 16, 16);
        assert_eq!(hex::encode(key), "11642e337ab4804cc9d7089eb7a5957d");
        assert_eq!(hex::encode(iv), "2dce3847a6958767f028f22795c3b765");

        let (key, iv) = evp_bytes_to_key(&Md5, b"pwd", &SALT, 32, 16);
        assert_eq!(
            hex::encode(key),
            "11642e337ab4804cc9d7089eb7a5957d2dce3847a6958767f028f22795c3b765"
        );
        assert_eq!(hex::encode(iv), "5d64b0e4fe3d60fc1bea144fee974748");
    }

    #[test]
    fn test_encrypt_with_salt_matches_openssl() {
        let cipher = SymmetricCipher::new("pwd", CipherVariant::Aes128Cbc);
        let blob = cipher.encrypt_with_salt(b"HelloData", &SALT).unwrap();
        assert_eq!(&blob[..8], SALT_MARKER);
        assert_eq!(&blob[8..16], &SALT);
        assert_eq!(hex::encode(&blob[16..]), "e6268f0034c8c031996c70a77832bdea");

        let cipher = SymmetricCipher::new("pwd", CipherVariant::Aes256Cbc);
        let blob = cipher.encrypt_with_salt(b"HelloData", &SALT).unwrap();
        assert_eq!(hex::encode(&blob[16..]), "609e478e4b715d8c14a3f10162383aab");
    }

    #[test]
    fn test_hello_data() {
        let cipher = SymmetricCipher::from_algorithm_name("pwd", "AES-128-CBC").unwrap();
        let encrypted = cipher.encrypt(b"HelloData").unwrap();
        let decrypted = cipher.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, b"HelloData");
    }

    #[rstest]
    #[case(CipherVariant::Aes128Cbc)]
    #[case(CipherVariant::Aes192Cbc)]
    #[case(CipherVariant::Aes256Cbc)]
    fn test_round_trip_lengths(#[case] variant: CipherVariant) {
        let cipher = SymmetricCipher::new("correct horse", variant);
        for len in [0usize, 1, 15, 16, 17, 31, 32, 100] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let encrypted = cipher.encrypt(&payload).unwrap();
            assert_eq!(encrypted.len(), 16 + (len / 16 + 1) * 16);
            assert_eq!(cipher.decrypt(&encrypted).unwrap(), payload);
        }
    }

    #[test]
    fn test_aligned_plaintext_gets_full_padding_block() {
        let cipher = SymmetricCipher::new("pwd", CipherVariant::Aes128Cbc);
        let blob = cipher.encrypt_with_salt(&[0x41; 16], &SALT).unwrap();
        let (key, iv) = evp_bytes_to_key(&Md5, b"pwd", &SALT, 16, 16);
        let raw = cbc_decrypt_raw(CipherVariant::Aes128Cbc, &key, &iv, &blob[16..]).unwrap();
        assert_eq!(raw.len(), 32);
        assert_eq!(&raw[16..], &[16u8; 16]);
    }

    #[test]
    fn test_salts_differ_between_calls() {
        let cipher = SymmetricCipher::new("pwd", CipherVariant::Aes192Cbc);
        let a = cipher.encrypt(b"same").unwrap();
        let b = cipher.encrypt(b"same").unwrap();
        assert_ne!(a[8..16], b[8..16]);
    }

    #[test]
    fn test_unknown_algorithm() {
        assert!(matches!(
            SymmetricCipher::from_algorithm_name("pwd", "AES-512-CBC"),
            Err(PkiError::UnsupportedAlgorithm(_))
        ));
        assert_eq!(
            "aes-192-cbc".parse::<CipherVariant>().unwrap(),
            CipherVariant::Aes192Cbc
        );
    }

    #[test]
    fn test_unaligned_blob_is_malformed() {
        let cipher = SymmetricCipher::new("pwd", CipherVariant::Aes128Cbc);
        assert!(matches!(
            cipher.decrypt(&[0u8; 33]),
            Err(PkiError::MalformedInput(_))
        ));
        assert!(matches!(
            cipher.decrypt(&[0u8; 16]),
            Err(PkiError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_unsalted_blob_skips_first_block() {
        // Without the marker the salt is empty but the first 16 bytes are still skipped.
        let cipher = SymmetricCipher::new("pwd", CipherVariant::Aes128Cbc);
        let (key, iv) = evp_bytes_to_key(&Md5, b"pwd", &[], 16, 16);
        let ciphertext = cbc_encrypt(CipherVariant::Aes128Cbc, &key, &iv, b"legacy").unwrap();

        let mut blob = vec![0xAA; 16];
        blob.extend_from_slice(&ciphertext);
        assert_eq!(cipher.decrypt(&blob).unwrap(), b"legacy");
    }

    #[test]
    fn test_sha256_derivation_round_trip() {
        let cipher = SymmetricCipher::new("pwd", CipherVariant::Aes256Cbc)
            .with_digest(DigestAlgorithm::Sha256);
        let blob = cipher.encrypt(b"digest-agnostic").unwrap();
        assert_eq!(cipher.decrypt(&blob).unwrap(), b"digest-agnostic");
    }
}
