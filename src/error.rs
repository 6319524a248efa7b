//! Error taxonomy shared by every pkikit operation.

use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur in the pkikit library.
///
/// Every operation reports the most specific kind at the point of failure.
/// Cryptographic failures are never transient, so nothing here is retried.
#[derive(Debug, Error)]
pub enum PkiError {
    /// A required input was missing or out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unknown cipher, digest or key-size variant.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Wrong-length ciphertext, bad PEM or corrupted DER.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Wrong password on a key or archive, or a corrupted RSA block.
    #[error("Decryption failure: {0}")]
    DecryptionFailure(String),

    /// A certificate or revocation list signature does not validate against its issuer.
    #[error("Signature verification failure: {0}")]
    SignatureVerificationFailure(String),

    /// Read, write or directory creation failed on a persistence path.
    #[error("File I/O error on {path}: {source}")]
    FileIO {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PkiError>;

impl PkiError {
    pub(crate) fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PkiError::FileIO {
            path: path.into(),
            source,
        }
    }
}

impl From<der::Error> for PkiError {
    /// Converts a `der::Error` into a `PkiError`.
    fn from(err: der::Error) -> Self {
        PkiError::MalformedInput(err.to_string())
    }
}

impl From<pem::PemError> for PkiError {
    fn from(err: pem::PemError) -> Self {
        PkiError::MalformedInput(err.to_string())
    }
}

impl From<x509_cert::spki::Error> for PkiError {
    fn from(err: x509_cert::spki::Error) -> Self {
        PkiError::MalformedInput(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for PkiError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        PkiError::MalformedInput(err.to_string())
    }
}

impl From<pkcs8::Error> for PkiError {
    fn from(err: pkcs8::Error) -> Self {
        PkiError::MalformedInput(err.to_string())
    }
}
