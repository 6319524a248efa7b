//! # PkiKit - RSA Certificate Authority Toolkit
//!
//! PkiKit is a small certificate-authority toolkit built on the RustCrypto libraries.
//! It issues role-based X.509 certificates, publishes revocation lists whose entries
//! carry descriptive metadata, bundles certificates with their private keys into
//! PKCS#12 archives, and provides an OpenSSL-compatible password-based AES-CBC cipher.
//!
//! ## Supported Algorithms
//!
//! - **RSA**: 1024, 2048, 3072 and 4096-bit keys, PKCS#1 v1.5 signatures and encryption
//! - **AES-CBC**: 128, 192 and 256-bit keys derived with OpenSSL's `EVP_BytesToKey`
//! - **Digests**: MD5, SHA-1, SHA-256, SHA-384 and SHA-512
//!
//! ## Supported Formats
//!
//! - **PEM**: certificates, `X509 CRL` revocation lists, PKCS#1 private keys
//!   (optionally encrypted with `DEK-Info` headers) and PKIX public keys
//! - **DER**: certificates and revocation lists
//! - **PKCS#12**: password-protected certificate and key archives
//! - **Salted ciphertext**: `Salted__` || salt || AES-CBC ciphertext
//!
//! ## Quick Start
//!
//! ### Issuing a Certificate Chain
//!
//! ```rust,no_run
//! use pkikit::{
//!     cert::{Certificate, template::CertificateTemplate},
//!     key::RsaKeyPair,
//! };
//!
//! # fn main() -> Result<(), pkikit::error::PkiError> {
//! let ca_key = RsaKeyPair::generate(2048)?;
//! let ca_template = CertificateTemplate::builder()
//!     .organization("ca")
//!     .organizational_unit("root")
//!     .expired_days(3650)
//!     .build()
//!     .to_tbs_certificate()?;
//! // A template is its own issuer when self-signing.
//! let ca = Certificate::create(&ca_template, &ca_template, ca_key.public_key(), &ca_key)?;
//!
//! let server_key = RsaKeyPair::generate(2048)?;
//! let server_template = CertificateTemplate::builder()
//!     .organization("server")
//!     .organizational_unit("gateway")
//!     .hosts(vec!["127.0.0.1".to_string(), "gateway.example.com".to_string()])
//!     .build()
//!     .to_tbs_certificate()?;
//! let server = Certificate::create(&server_template, &ca, server_key.public_key(), &ca_key)?;
//! server.verify(&ca)?;
//!
//! println!("{}", server.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Revoking Certificates
//!
//! ```rust,no_run
//! use pkikit::{cert::Certificate, crl::RevocationList, key::RsaKeyPair};
//!
//! # fn revoke(ca: &Certificate, ca_key: &RsaKeyPair, leaf: &Certificate) -> Result<(), pkikit::error::PkiError> {
//! let mut list = RevocationList::new();
//! list.add_certificate(leaf, None)?;
//! let pem = list.to_memory(ca, ca_key, None, None)?;
//!
//! let parsed = RevocationList::from_memory(pem.as_bytes())?;
//! parsed.verify(ca)?;
//! for entry in parsed.info().entries {
//!     println!("{} {:?}", entry.serial_number_hex(), entry.organization);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Encrypting Payloads
//!
//! ```rust
//! use pkikit::cipher::{CipherVariant, SymmetricCipher};
//!
//! # fn main() -> Result<(), pkikit::error::PkiError> {
//! let cipher = SymmetricCipher::new("pwd", CipherVariant::Aes128Cbc);
//! let sealed = cipher.encrypt(b"HelloData")?;
//! assert!(sealed.starts_with(b"Salted__"));
//! assert_eq!(cipher.decrypt(&sealed)?, b"HelloData");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::PkiError`], naming the most specific
//! failure at the point it happened:
//!
//! ```rust
//! use pkikit::{error::PkiError, key::RsaKeyPair};
//!
//! match RsaKeyPair::from_pem(b"invalid pem data", None) {
//!     Ok(_) => println!("Key imported successfully"),
//!     Err(PkiError::MalformedInput(msg)) => println!("Failed to decode key: {}", msg),
//!     Err(PkiError::DecryptionFailure(msg)) => println!("Wrong password: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]; the library never installs a subscriber.
//!
//! ## Module Organization
//!
//! - [`key`]: RSA key generation, chunked encryption, signing and PEM import/export
//! - [`cipher`]: OpenSSL-compatible password-based AES-CBC
//! - [`digest`]: Message digest catalogue
//! - [`cert`]: Certificate templates, creation, encoding and inspection
//! - [`issuer`]: Certificate issuing
//! - [`crl`]: Revocation lists with per-entry metadata
//! - [`pfx`]: PKCS#12 archives
//! - [`error`]: Error taxonomy
//! - [`tbs_certificate`]: Unsigned certificate descriptors
//! - [`pem_utils`]: PEM helpers and file persistence

pub mod cert;
pub mod cipher;
pub mod crl;
pub mod digest;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod pfx;
pub mod tbs_certificate;
