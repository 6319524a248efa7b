//! Certificate revocation lists carrying per-entry metadata.
//!
//! Entries are kept in append order. A list becomes a signed `X509 CRL` PEM
//! block through [`RevocationList::to_memory`]; parsing one back restores the
//! entries together with the signed form used by [`RevocationList::verify`].

pub mod entry;

use std::path::Path;

use der::{Decode, Encode};
use time::{Duration, OffsetDateTime};
use x509_cert::Version;
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};

use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::params::{self, ExtensionParam};
use crate::cert::{self, Certificate, SignatureAlgorithm};
use crate::error::{PkiError, Result};
use crate::key::{PublicKey, RsaKeyPair};
use crate::pem_utils;

pub use entry::RevokedEntry;

const CRL_LABEL: &str = "X509 CRL";

/// Decoded view of a revocation list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevokedInfo {
    /// Issue time of the signed list, absent until one has been loaded
    pub this_update: Option<OffsetDateTime>,
    pub next_update: Option<OffsetDateTime>,
    pub entries: Vec<RevokedEntry>,
}

#[derive(Clone, Debug, Default)]
pub struct RevocationList {
    revoked: Vec<RevokedCert>,
    signed: Option<CertificateList>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` after the existing ones.
    ///
    /// A previously loaded signed form no longer covers the entries, so it is
    /// dropped; [`RevocationList::verify`] fails until the list is signed again.
    pub fn add_entry(&mut self, entry: &RevokedEntry) -> Result<()> {
        self.revoked.push(entry.to_revoked_cert()?);
        self.signed = None;
        Ok(())
    }

    /// Appends an entry describing `cert`, revoked at `revocation_time` or now.
    pub fn add_certificate(
        &mut self,
        cert: &Certificate,
        revocation_time: Option<OffsetDateTime>,
    ) -> Result<()> {
        let revocation_time = revocation_time.unwrap_or_else(OffsetDateTime::now_utc);
        self.add_entry(&RevokedEntry::from_certificate(cert, revocation_time))
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    /// Parses a signed list from an `X509 CRL` PEM block or raw DER.
    pub fn from_memory(data: &[u8]) -> Result<Self> {
        let der = if data.trim_ascii_start().starts_with(b"-----BEGIN") {
            pem_utils::pem_to_der(data, CRL_LABEL)?
        } else {
            data.to_vec()
        };
        let list = CertificateList::from_der(&der)?;
        Ok(Self {
            revoked: list
                .tbs_cert_list
                .revoked_certificates
                .clone()
                .unwrap_or_default(),
            signed: Some(list),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_memory(&pem_utils::read_file(path)?)
    }

    /// Decodes every entry; metadata that cannot be decoded is reported as absent.
    pub fn info(&self) -> RevokedInfo {
        let (this_update, next_update) = match &self.signed {
            Some(list) => (
                Some(params::from_x509_time(&list.tbs_cert_list.this_update)),
                list.tbs_cert_list
                    .next_update
                    .as_ref()
                    .map(params::from_x509_time),
            ),
            None => (None, None),
        };
        RevokedInfo {
            this_update,
            next_update,
            entries: self
                .revoked
                .iter()
                .map(RevokedEntry::from_revoked_cert)
                .collect(),
        }
    }

    /// Signs the entries with `issuer_key` on behalf of `issuer` and returns the
    /// `X509 CRL` PEM block.
    ///
    /// `this_update` defaults to now and `next_update` to one year after now.
    pub fn to_memory(
        &self,
        issuer: &Certificate,
        issuer_key: &RsaKeyPair,
        this_update: Option<OffsetDateTime>,
        next_update: Option<OffsetDateTime>,
    ) -> Result<String> {
        let list = self.sign(issuer, issuer_key, this_update, next_update)?;
        tracing::debug!(
            issuer = %issuer.common_name(),
            entries = self.revoked.len(),
            "signed revocation list"
        );
        Ok(pem_utils::der_to_pem(&list.to_der()?, CRL_LABEL))
    }

    pub fn to_file(
        &self,
        path: impl AsRef<Path>,
        issuer: &Certificate,
        issuer_key: &RsaKeyPair,
        this_update: Option<OffsetDateTime>,
        next_update: Option<OffsetDateTime>,
    ) -> Result<()> {
        let pem = self.to_memory(issuer, issuer_key, this_update, next_update)?;
        pem_utils::write_file(path, pem.as_bytes())
    }

    /// Checks the signature of the loaded list against `issuer`'s public key.
    pub fn verify(&self, issuer: &Certificate) -> Result<()> {
        let list = self.signed.as_ref().ok_or_else(|| {
            PkiError::InvalidParameter("revocation list has not been loaded from a signed form".into())
        })?;
        cert::verify_signature(
            &issuer_public_key(issuer)?,
            &list.signature_algorithm,
            &list.tbs_cert_list.to_der()?,
            &list.signature,
        )
    }

    fn sign(
        &self,
        issuer: &Certificate,
        issuer_key: &RsaKeyPair,
        this_update: Option<OffsetDateTime>,
        next_update: Option<OffsetDateTime>,
    ) -> Result<CertificateList> {
        if issuer_public_key(issuer)? != *issuer_key.public_key() {
            return Err(PkiError::InvalidParameter(format!(
                "key does not belong to issuer {}",
                issuer.common_name()
            )));
        }

        let now = OffsetDateTime::now_utc();
        let this_update = this_update.unwrap_or(now);
        let next_update = next_update.unwrap_or_else(|| one_year_after(now));

        let key_identifier = match issuer.subject_key_identifier() {
            Some(ski) => ski,
            None => issuer_key.public_key().key_identifier()?,
        };
        let aki = ExtensionParam::from_extension(&AuthorityKeyIdentifier { key_identifier }, false)?;

        let algorithm = SignatureAlgorithm::Sha256WithRsa;
        let tbs_cert_list = TbsCertList {
            version: Version::V2,
            signature: algorithm.to_algorithm_identifier()?,
            issuer: issuer.inner.tbs_certificate.subject.clone(),
            this_update: params::to_x509_time(this_update)?,
            next_update: Some(params::to_x509_time(next_update)?),
            revoked_certificates: (!self.revoked.is_empty()).then(|| self.revoked.clone()),
            crl_extensions: Some(vec![aki.to_x509()?]),
        };

        let digest = algorithm.digest_algorithm().digest();
        let signature = issuer_key.sign(&tbs_cert_list.to_der()?, Some(digest.as_ref()))?;

        Ok(CertificateList {
            tbs_cert_list,
            signature_algorithm: algorithm.to_algorithm_identifier()?,
            signature: der::asn1::BitString::from_bytes(&signature)?,
        })
    }
}

fn issuer_public_key(issuer: &Certificate) -> Result<PublicKey> {
    issuer.public_key().map_err(|e| {
        PkiError::InvalidParameter(format!(
            "issuer {} has no usable RSA key: {e}",
            issuer.common_name()
        ))
    })
}

/// Same calendar date one year later; 29 February rolls to 365 days later.
fn one_year_after(value: OffsetDateTime) -> OffsetDateTime {
    value
        .replace_year(value.year() + 1)
        .unwrap_or(value + Duration::days(365))
}
