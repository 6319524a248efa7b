//! Password-protected PKCS#12 archives pairing a certificate with its private key.

use std::path::Path;

use p12::PFX;

use crate::cert::Certificate;
use crate::error::{PkiError, Result};
use crate::key::{PublicKey, RsaKeyPair};
use crate::pem_utils;

/// A certificate and its private key, as extracted from or destined for a
/// PKCS#12 archive.
///
/// Accessors return `None` until something has been loaded.
#[derive(Clone, Debug, Default)]
pub struct PfxBundle {
    certificate: Option<Certificate>,
    private_key: Option<RsaKeyPair>,
    ca_certificates: Vec<Certificate>,
}

impl PfxBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a bundle holding `certificate` only; the key is supplied to
    /// [`PfxBundle::to_memory`].
    pub fn from_certificate(certificate: Certificate) -> Self {
        Self {
            certificate: Some(certificate),
            ..Self::default()
        }
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    pub fn private_key(&self) -> Option<&RsaKeyPair> {
        self.private_key.as_ref()
    }

    /// Public half of the loaded private key.
    pub fn public_key(&self) -> Option<&PublicKey> {
        self.private_key.as_ref().map(RsaKeyPair::public_key)
    }

    /// Certificates in the archive other than the one matching the key.
    pub fn ca_certificates(&self) -> &[Certificate] {
        &self.ca_certificates
    }

    /// Opens an archive with `password`.
    ///
    /// A structurally broken archive is `MalformedInput`; an integrity check
    /// that fails under `password` is `DecryptionFailure`.
    pub fn from_memory(data: &[u8], password: &str) -> Result<Self> {
        let pfx = PFX::parse(data)
            .map_err(|e| PkiError::MalformedInput(format!("PKCS#12 archive: {e:?}")))?;
        if !pfx.verify_mac(password) {
            return Err(PkiError::DecryptionFailure(
                "PKCS#12 integrity check failed; wrong password?".into(),
            ));
        }

        let key_der = pfx
            .key_bags(password)
            .map_err(|e| PkiError::DecryptionFailure(format!("PKCS#12 key bag: {e:?}")))?
            .into_iter()
            .next()
            .ok_or_else(|| PkiError::MalformedInput("PKCS#12 archive holds no private key".into()))?;
        let private_key = RsaKeyPair::from_pkcs8_der(&key_der)?;

        let certificates = pfx
            .cert_x509_bags(password)
            .map_err(|e| PkiError::DecryptionFailure(format!("PKCS#12 certificate bag: {e:?}")))?
            .iter()
            .map(|der| Certificate::from_der(der))
            .collect::<Result<Vec<_>>>()?;

        let mut certificate = None;
        let mut ca_certificates = Vec::new();
        for cert in certificates {
            if certificate.is_none() && cert.public_key()? == *private_key.public_key() {
                certificate = Some(cert);
            } else {
                ca_certificates.push(cert);
            }
        }
        let certificate = certificate.ok_or_else(|| {
            PkiError::MalformedInput("PKCS#12 archive holds no certificate for its key".into())
        })?;

        tracing::debug!(
            subject = %certificate.common_name(),
            chain = ca_certificates.len(),
            "opened PKCS#12 archive"
        );
        Ok(Self {
            certificate: Some(certificate),
            private_key: Some(private_key),
            ca_certificates,
        })
    }

    pub fn from_file(path: impl AsRef<Path>, password: &str) -> Result<Self> {
        Self::from_memory(&pem_utils::read_file(path)?, password)
    }

    /// Encodes the held certificate, `private_key` and `issuer` into an archive
    /// protected by `password`.
    pub fn to_memory(
        &self,
        issuer: &Certificate,
        private_key: &RsaKeyPair,
        password: &str,
    ) -> Result<Vec<u8>> {
        let certificate = self.certificate.as_ref().ok_or_else(|| {
            PkiError::InvalidParameter("PKCS#12 bundle has no certificate".into())
        })?;
        if certificate.public_key()? != *private_key.public_key() {
            return Err(PkiError::InvalidParameter(format!(
                "private key does not match certificate {}",
                certificate.common_name()
            )));
        }

        let issuer_der = issuer.to_der()?;
        let pfx = PFX::new(
            &certificate.to_der()?,
            &private_key.to_pkcs8_der()?,
            Some(issuer_der.as_slice()),
            password,
            &certificate.common_name(),
        )
        .ok_or_else(|| PkiError::InvalidParameter("PKCS#12 encoding failed".into()))?;

        tracing::debug!(subject = %certificate.common_name(), "encoded PKCS#12 archive");
        Ok(pfx.to_der())
    }

    pub fn to_file(
        &self,
        path: impl AsRef<Path>,
        issuer: &Certificate,
        private_key: &RsaKeyPair,
        password: &str,
    ) -> Result<()> {
        pem_utils::write_file(path, &self.to_memory(issuer, private_key, password)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::template::CertificateTemplate;
    use crate::key::tests::shared_key;

    fn ca_and_leaf(leaf_key: &RsaKeyPair) -> (Certificate, Certificate) {
        let ca_key = shared_key();
        let ca_tbs = CertificateTemplate::builder()
            .organization("ca")
            .organizational_unit("root")
            .build()
            .to_tbs_certificate()
            .unwrap();
        let ca = Certificate::create(&ca_tbs, &ca_tbs, ca_key.public_key(), ca_key).unwrap();

        let leaf_tbs = CertificateTemplate::builder()
            .organization("client")
            .organizational_unit("alice")
            .build()
            .to_tbs_certificate()
            .unwrap();
        let leaf = Certificate::create(&leaf_tbs, &ca, leaf_key.public_key(), ca_key).unwrap();
        (ca, leaf)
    }

    #[test]
    fn test_empty_bundle_has_no_keys() {
        let bundle = PfxBundle::new();
        assert!(bundle.certificate().is_none());
        assert!(bundle.private_key().is_none());
        assert!(bundle.public_key().is_none());
    }

    #[test]
    fn test_round_trip_and_wrong_password() {
        let leaf_key = RsaKeyPair::generate(1024).unwrap();
        let (ca, leaf) = ca_and_leaf(&leaf_key);

        let archive = PfxBundle::from_certificate(leaf.clone())
            .to_memory(&ca, &leaf_key, "P@ssw0rd")
            .unwrap();

        let bundle = PfxBundle::from_memory(&archive, "P@ssw0rd").unwrap();
        assert_eq!(bundle.certificate(), Some(&leaf));
        assert_eq!(bundle.public_key(), Some(leaf_key.public_key()));
        assert_eq!(bundle.ca_certificates(), &[ca]);

        assert!(matches!(
            PfxBundle::from_memory(&archive, "wrong"),
            Err(PkiError::DecryptionFailure(_))
        ));
    }

    #[test]
    fn test_to_memory_requires_matching_key() {
        let leaf_key = RsaKeyPair::generate(1024).unwrap();
        let (ca, leaf) = ca_and_leaf(&leaf_key);

        assert!(matches!(
            PfxBundle::new().to_memory(&ca, &leaf_key, "pw"),
            Err(PkiError::InvalidParameter(_))
        ));
        assert!(matches!(
            PfxBundle::from_certificate(leaf).to_memory(&ca, shared_key(), "pw"),
            Err(PkiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            PfxBundle::from_memory(b"not an archive", "pw"),
            Err(PkiError::MalformedInput(_))
        ));
    }
}
