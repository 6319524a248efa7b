use der::Encode;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::Result;
use crate::key::{PublicKey, RsaKeyPair};
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// A descriptor that has not been signed yet can act as its own issuer, which
/// is how root certificates are produced.
pub trait Issuer {
    /// Returns the distinguished name written into the issuer field.
    fn issuer_name(&self) -> Result<Name>;

    /// Signs `request` for `subject_key` with `signing_key`.
    ///
    /// Certificates are always signed with SHA-256 and PKCS#1 v1.5 padding.
    fn issue(
        &self,
        request: &TbsCertificate,
        subject_key: &PublicKey,
        signing_key: &RsaKeyPair,
    ) -> Result<Certificate> {
        let algorithm = SignatureAlgorithm::Sha256WithRsa;
        let tbs_certificate = request.to_tbs_certificate_inner(
            &self.issuer_name()?,
            subject_key,
            signing_key.public_key(),
            algorithm,
        )?;

        let digest = algorithm.digest_algorithm().digest();
        let signature = signing_key.sign(&tbs_certificate.to_der()?, Some(digest.as_ref()))?;

        let inner = CertificateInner {
            tbs_certificate,
            signature_algorithm: algorithm.to_algorithm_identifier()?,
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };
        let certificate = Certificate { inner };
        tracing::debug!(
            serial = %certificate.serial_number_hex(),
            subject = %certificate.common_name(),
            is_ca = request.is_ca,
            "issued certificate"
        );
        Ok(certificate)
    }
}

impl Issuer for TbsCertificate {
    fn issuer_name(&self) -> Result<Name> {
        self.subject.as_x509_name()
    }
}

impl Issuer for Certificate {
    fn issuer_name(&self) -> Result<Name> {
        Ok(self.inner.tbs_certificate.subject.clone())
    }
}
