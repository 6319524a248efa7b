use std::net::IpAddr;

use der::flagset::FlagSet;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    KeyUsages, SubjectAltName, SubjectKeyIdentifier,
};
use crate::cert::params::{self, DistinguishedName, ExtensionParam, Validity};
use crate::error::Result;
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate before
/// issuer and key are known.
///
/// Produced by [`CertificateTemplate::to_tbs_certificate`](crate::cert::template::CertificateTemplate::to_tbs_certificate)
/// and consumed once by [`Certificate::create`](crate::cert::Certificate::create).
#[derive(Clone, Debug)]
pub struct TbsCertificate {
    /// Unsigned big-endian serial number without leading zero bytes
    pub serial_number: Vec<u8>,
    /// Certificate subject distinguished name
    pub subject: DistinguishedName,
    pub validity: Validity,
    pub is_ca: bool,
    pub key_usage: FlagSet<KeyUsages>,
    pub extended_key_usage: Vec<ExtendedKeyUsageOption>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    /// Extra extensions appended verbatim
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Collects the standard extensions implied by the descriptor, followed by the
    /// extra ones.
    fn standard_extensions(
        &self,
        subject_key: &PublicKey,
        issuer_key: &PublicKey,
    ) -> Result<Vec<ExtensionParam>> {
        let mut extensions = vec![ExtensionParam::from_extension(
            &BasicConstraints {
                is_ca: self.is_ca,
                max_path_length: None,
            },
            true,
        )?];

        if !self.key_usage.is_empty() {
            extensions.push(ExtensionParam::from_extension(
                &KeyUsage(self.key_usage),
                true,
            )?);
        }

        if !self.extended_key_usage.is_empty() {
            let eku = ExtendedKeyUsage {
                usage: self.extended_key_usage.clone(),
            };
            extensions.push(ExtensionParam::from_extension(&eku, false)?);
        }

        if !self.dns_names.is_empty() || !self.ip_addresses.is_empty() {
            let san = SubjectAltName {
                dns_names: self.dns_names.clone(),
                ip_addresses: self.ip_addresses.clone(),
            };
            extensions.push(ExtensionParam::from_extension(&san, false)?);
        }

        if self.is_ca {
            let ski = SubjectKeyIdentifier(subject_key.key_identifier()?);
            extensions.push(ExtensionParam::from_extension(&ski, false)?);
        }

        let aki = AuthorityKeyIdentifier {
            key_identifier: issuer_key.key_identifier()?,
        };
        extensions.push(ExtensionParam::from_extension(&aki, false)?);

        extensions.extend(self.extensions.iter().cloned());
        Ok(extensions)
    }

    /// Converts the descriptor into a `TbsCertificateInner` for DER encoding and signing.
    pub(crate) fn to_tbs_certificate_inner(
        &self,
        issuer: &Name,
        subject_key: &PublicKey,
        issuer_key: &PublicKey,
        signature_algorithm: SignatureAlgorithm,
    ) -> Result<TbsCertificateInner> {
        let extensions = self
            .standard_extensions(subject_key, issuer_key)?
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: params::to_x509_time(self.validity.not_before)?,
            not_after: params::to_x509_time(self.validity.not_after)?,
        };

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(&self.serial_number)?,
            signature: signature_algorithm.to_algorithm_identifier()?,
            issuer: issuer.clone(),
            validity,
            subject: self.subject.as_x509_name()?,
            subject_public_key_info: subject_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }
}
