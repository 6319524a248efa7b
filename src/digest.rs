//! Message digests consumed by signing and key derivation.
//!
//! Callers depend only on the [`Digest`] capability: hash bytes to a fixed-size
//! fingerprint and report which algorithm did it. One unit struct per supported
//! algorithm implements it on top of the RustCrypto hash crates.

use rsa::Pkcs1v15Sign;

use crate::error::{PkiError, Result};

/// Identifies a digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Maps the numeric algorithm codes used by existing callers
    /// (11 = MD5, 21 = SHA-1, 22 = SHA-256, 23 = SHA-384, 24 = SHA-512).
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            11 => Ok(DigestAlgorithm::Md5),
            21 => Ok(DigestAlgorithm::Sha1),
            22 => Ok(DigestAlgorithm::Sha256),
            23 => Ok(DigestAlgorithm::Sha384),
            24 => Ok(DigestAlgorithm::Sha512),
            other => Err(PkiError::UnsupportedAlgorithm(format!(
                "digest code {other}"
            ))),
        }
    }

    /// Size of the fingerprint in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 16,
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Returns a boxed [`Digest`] implementation for this algorithm.
    pub fn digest(self) -> Box<dyn Digest> {
        match self {
            DigestAlgorithm::Md5 => Box::new(Md5),
            DigestAlgorithm::Sha1 => Box::new(Sha1),
            DigestAlgorithm::Sha256 => Box::new(Sha256),
            DigestAlgorithm::Sha384 => Box::new(Sha384),
            DigestAlgorithm::Sha512 => Box::new(Sha512),
        }
    }

    /// PKCS#1 v1.5 signature scheme carrying this algorithm's DigestInfo prefix.
    pub(crate) fn pkcs1v15_scheme(self) -> Pkcs1v15Sign {
        match self {
            DigestAlgorithm::Md5 => Pkcs1v15Sign::new::<md5::Md5>(),
            DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
            DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
            DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
            DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        }
    }
}

/// Hash bytes to a fixed-size fingerprint and report the algorithm identifier.
pub trait Digest {
    fn algorithm(&self) -> DigestAlgorithm;

    fn hash(&self, data: &[u8]) -> Vec<u8>;

    /// Lower-case hex rendering of [`Digest::hash`].
    fn hash_to_hex(&self, data: &[u8]) -> String {
        hex::encode(self.hash(data))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Md5;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha384;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha512;

impl Digest for Md5 {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Md5
    }

    fn hash(&self, data: &[u8]) -> Vec<u8> {
        <md5::Md5 as md5::Digest>::digest(data).to_vec()
    }
}

impl Digest for Sha1 {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Sha1
    }

    fn hash(&self, data: &[u8]) -> Vec<u8> {
        <sha1::Sha1 as sha1::Digest>::digest(data).to_vec()
    }
}

impl Digest for Sha256 {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Sha256
    }

    fn hash(&self, data: &[u8]) -> Vec<u8> {
        <sha2::Sha256 as sha2::Digest>::digest(data).to_vec()
    }
}

impl Digest for Sha384 {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Sha384
    }

    fn hash(&self, data: &[u8]) -> Vec<u8> {
        <sha2::Sha384 as sha2::Digest>::digest(data).to_vec()
    }
}

impl Digest for Sha512 {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Sha512
    }

    fn hash(&self, data: &[u8]) -> Vec<u8> {
        <sha2::Sha512 as sha2::Digest>::digest(data).to_vec()
    }
}
