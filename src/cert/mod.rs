pub mod extensions;
pub mod params;
pub mod template;

use std::net::IpAddr;
use std::path::Path;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use extensions::{
    BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, FlagSet, KeyUsage, KeyUsages,
    SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use params::{DistinguishedName, join_values};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::ext::Extension;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::digest::DigestAlgorithm;
use crate::error::{PkiError, Result};
use crate::issuer::Issuer;
use crate::key::{PublicKey, RsaKeyPair};
use crate::pem_utils;
use crate::tbs_certificate::TbsCertificate;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

const SHA_1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
const SHA_256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const SHA_384_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
const SHA_512_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");

/// Represents the supported signature algorithms for certificates and revocation lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1WithRsa,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha1WithRsa => SHA_1_WITH_RSA,
            SignatureAlgorithm::Sha256WithRsa => SHA_256_WITH_RSA,
            SignatureAlgorithm::Sha384WithRsa => SHA_384_WITH_RSA,
            SignatureAlgorithm::Sha512WithRsa => SHA_512_WITH_RSA,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Result<Self> {
        match *oid {
            SHA_1_WITH_RSA => Ok(SignatureAlgorithm::Sha1WithRsa),
            SHA_256_WITH_RSA => Ok(SignatureAlgorithm::Sha256WithRsa),
            SHA_384_WITH_RSA => Ok(SignatureAlgorithm::Sha384WithRsa),
            SHA_512_WITH_RSA => Ok(SignatureAlgorithm::Sha512WithRsa),
            other => Err(PkiError::UnsupportedAlgorithm(format!(
                "signature algorithm {other}"
            ))),
        }
    }

    pub fn digest_algorithm(self) -> DigestAlgorithm {
        match self {
            SignatureAlgorithm::Sha1WithRsa => DigestAlgorithm::Sha1,
            SignatureAlgorithm::Sha256WithRsa => DigestAlgorithm::Sha256,
            SignatureAlgorithm::Sha384WithRsa => DigestAlgorithm::Sha384,
            SignatureAlgorithm::Sha512WithRsa => DigestAlgorithm::Sha512,
        }
    }

    /// Algorithm identifier with the NULL parameters RSA signatures carry.
    pub(crate) fn to_algorithm_identifier(self) -> Result<AlgorithmIdentifierOwned> {
        Ok(AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: Some(der::Any::new(der::Tag::Null, Vec::<u8>::new())?),
        })
    }
}

/// Checks an RSA signature over `tbs_der` made with `algorithm` by `issuer_key`.
pub(crate) fn verify_signature(
    issuer_key: &PublicKey,
    algorithm: &AlgorithmIdentifierOwned,
    tbs_der: &[u8],
    signature: &der::asn1::BitString,
) -> Result<()> {
    let algorithm = SignatureAlgorithm::from_oid(&algorithm.oid)?;
    let signature = signature.as_bytes().ok_or_else(|| {
        PkiError::MalformedInput("signature is not a whole number of bytes".into())
    })?;
    let digest = algorithm.digest_algorithm().digest();
    issuer_key.verify(tbs_der, signature, Some(digest.as_ref()))
}

/// Represents a signed X.509 certificate.
///
/// Read-only once created or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Signs `template` for `public_key` with `issuer_key`, naming `issuer` as issuer.
    ///
    /// Passing the template itself as `issuer` together with the subject's own key
    /// produces a self-signed root certificate.
    pub fn create(
        template: &TbsCertificate,
        issuer: &impl Issuer,
        public_key: &PublicKey,
        issuer_key: &RsaKeyPair,
    ) -> Result<Self> {
        issuer.issue(template, public_key, issuer_key)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der)?,
        })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    pub fn from_pem(data: &[u8]) -> Result<Self> {
        Self::from_der(&pem_utils::pem_to_der(data, CERTIFICATE_LABEL)?)
    }

    /// Encodes the certificate into a `CERTIFICATE` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(&self.to_der()?, CERTIFICATE_LABEL))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_pem(&pem_utils::read_file(path)?)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        pem_utils::write_file(path, self.to_pem()?.as_bytes())
    }

    /// Checks that `issuer` is a CA whose key made this certificate's signature.
    pub fn verify(&self, issuer: &Certificate) -> Result<()> {
        if !issuer.is_ca() {
            return Err(PkiError::SignatureVerificationFailure(format!(
                "issuer {} is not a certificate authority",
                issuer.common_name()
            )));
        }
        let tbs_der = self.inner.tbs_certificate.to_der()?;
        verify_signature(
            &issuer.public_key()?,
            &self.inner.signature_algorithm,
            &tbs_der,
            &self.inner.signature,
        )
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Unsigned big-endian serial number without leading zero bytes.
    pub fn serial_number(&self) -> Vec<u8> {
        trim_serial(self.inner.tbs_certificate.serial_number.as_bytes())
    }

    /// Serial number as lower-case hexadecimal without leading zeros.
    pub fn serial_number_hex(&self) -> String {
        serial_to_hex(&self.serial_number())
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn common_name(&self) -> String {
        self.subject().common_name
    }

    pub fn country(&self) -> String {
        join_values(&self.subject().country)
    }

    pub fn organization(&self) -> String {
        join_values(&self.subject().organization)
    }

    pub fn organizational_unit(&self) -> String {
        join_values(&self.subject().organizational_unit)
    }

    pub fn locality(&self) -> String {
        join_values(&self.subject().locality)
    }

    pub fn province(&self) -> String {
        join_values(&self.subject().province)
    }

    pub fn street_address(&self) -> String {
        join_values(&self.subject().street_address)
    }

    pub fn not_before(&self) -> OffsetDateTime {
        params::from_x509_time(&self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> OffsetDateTime {
        params::from_x509_time(&self.inner.tbs_certificate.validity.not_after)
    }

    pub fn is_ca(&self) -> bool {
        self.find_extension::<BasicConstraints>()
            .map(|bc| bc.is_ca)
            .unwrap_or(false)
    }

    pub fn key_usage(&self) -> FlagSet<KeyUsages> {
        self.find_extension::<KeyUsage>()
            .map(|ku| ku.0)
            .unwrap_or_else(FlagSet::empty)
    }

    pub fn extended_key_usage(&self) -> Vec<ExtendedKeyUsageOption> {
        self.find_extension::<ExtendedKeyUsage>()
            .map(|eku| eku.usage)
            .unwrap_or_default()
    }

    pub fn dns_names(&self) -> Vec<String> {
        self.find_extension::<SubjectAltName>()
            .map(|san| san.dns_names)
            .unwrap_or_default()
    }

    pub fn ip_addresses(&self) -> Vec<IpAddr> {
        self.find_extension::<SubjectAltName>()
            .map(|san| san.ip_addresses)
            .unwrap_or_default()
    }

    pub fn subject_key_identifier(&self) -> Option<Vec<u8>> {
        self.find_extension::<SubjectKeyIdentifier>().map(|ski| ski.0)
    }

    /// Raw extensions in certificate order.
    pub fn extensions(&self) -> &[Extension] {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
    }

    /// Decodes the first extension with `E`'s OID; undecodable values count as absent.
    pub fn find_extension<E: ToAndFromX509Extension>(&self) -> Option<E> {
        self.extensions()
            .iter()
            .find(|ext| ext.extn_id == E::OID)
            .and_then(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()).ok())
    }
}

pub(crate) fn trim_serial(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    if start == bytes.len() {
        vec![0]
    } else {
        bytes[start..].to_vec()
    }
}

pub(crate) fn serial_to_hex(serial: &[u8]) -> String {
    let hex = hex::encode(serial);
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: RsaKeyPair,
}

impl CertificateWithPrivateKey {
    /// Issues a certificate for `template` signed by this certificate's key.
    pub fn issue(&self, template: &TbsCertificate, public_key: &PublicKey) -> Result<Certificate> {
        Certificate::create(template, &self.cert, public_key, &self.key)
    }
}
