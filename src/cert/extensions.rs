use std::net::IpAddr;

use const_oid::AssociatedOid;
use const_oid::db::rfc5912;
use der::asn1::{Ia5String, OctetString};
use der::oid::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::ext::pkix::{self, name::GeneralName};

use crate::error::{PkiError, Result};

pub use der::flagset::FlagSet;
pub use x509_cert::ext::pkix::KeyUsages;

/// Codec between a typed extension and the DER bytes stored in `extnValue`.
///
/// # Example
/// ```
/// use pkikit::cert::extensions::{SubjectAltName, ToAndFromX509Extension};
/// let san = SubjectAltName {
///     dns_names: vec!["example.com".to_string()],
///     ip_addresses: vec!["127.0.0.1".parse().unwrap()],
/// };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san, decoded);
/// ```
pub trait ToAndFromX509Extension {
    const OID: ObjectIdentifier;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// DNS names and IP addresses a server certificate answers for.
///
/// Other general name kinds are skipped when decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName {
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let dns = self.dns_names.iter().map(|name| -> Result<GeneralName> {
            Ia5String::new(name)
                .map(GeneralName::DnsName)
                .map_err(|e| PkiError::InvalidParameter(format!("DNS name {name}: {e}")))
        });
        let ips = self.ip_addresses.iter().map(|ip| -> Result<GeneralName> {
            let octets = match ip {
                IpAddr::V4(v4) => v4.octets().to_vec(),
                IpAddr::V6(v6) => v6.octets().to_vec(),
            };
            Ok(GeneralName::IpAddress(OctetString::new(octets)?))
        });
        let names = dns.chain(ips).collect::<Result<Vec<_>>>()?;
        Ok(pkix::SubjectAltName(names).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let mut decoded = SubjectAltName::default();
        for name in pkix::SubjectAltName::from_der(extension)?.0 {
            match name {
                GeneralName::DnsName(dns) => decoded.dns_names.push(dns.to_string()),
                GeneralName::IpAddress(octets) => {
                    if let Some(ip) = ip_from_octets(octets.as_bytes()) {
                        decoded.ip_addresses.push(ip);
                    }
                }
                _ => {}
            }
        }
        Ok(decoded)
    }
}

fn ip_from_octets(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

/// Marks certificate authorities. Written as critical on every issued certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let encoded = pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        }
        .to_der()?;
        Ok(encoded)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let pkix::BasicConstraints {
            ca,
            path_len_constraint,
        } = pkix::BasicConstraints::from_der(extension)?;
        Ok(Self {
            is_ca: ca,
            max_path_length: path_len_constraint,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <pkix::KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        Ok(pkix::KeyUsage(self.0).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        Ok(Self(pkix::KeyUsage::from_der(extension)?.0))
    }
}

/// Purposes the certified key may be used for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let oids = self.usage.iter().copied().map(ObjectIdentifier::from).collect();
        Ok(pkix::ExtendedKeyUsage(oids).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let usage = pkix::ExtendedKeyUsage::from_der(extension)?
            .0
            .into_iter()
            .map(ExtendedKeyUsageOption::from)
            .collect();
        Ok(Self { usage })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    Other(ObjectIdentifier),
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::ServerAuth => rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => rfc5912::ID_KP_EMAIL_PROTECTION,
            ExtendedKeyUsageOption::TimeStamping => rfc5912::ID_KP_TIME_STAMPING,
            ExtendedKeyUsageOption::OcspSigning => rfc5912::ID_KP_OCSP_SIGNING,
            ExtendedKeyUsageOption::Other(oid) => oid,
        }
    }
}

impl From<ObjectIdentifier> for ExtendedKeyUsageOption {
    fn from(oid: ObjectIdentifier) -> Self {
        [
            ExtendedKeyUsageOption::ServerAuth,
            ExtendedKeyUsageOption::ClientAuth,
            ExtendedKeyUsageOption::CodeSigning,
            ExtendedKeyUsageOption::EmailProtection,
            ExtendedKeyUsageOption::TimeStamping,
            ExtendedKeyUsageOption::OcspSigning,
        ]
        .into_iter()
        .find(|known| ObjectIdentifier::from(*known) == oid)
        .unwrap_or(ExtendedKeyUsageOption::Other(oid))
    }
}

/// Key identifier of the certified public key; written on CA certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let id = OctetString::new(self.0.as_slice())?;
        Ok(pkix::SubjectKeyIdentifier(id).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ski = pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.into_bytes()))
    }
}

/// Identifies the signing key of a certificate or revocation list.
///
/// Only the `keyIdentifier` field is produced or read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let aki = pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.as_slice())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };
        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let key_identifier = pkix::AuthorityKeyIdentifier::from_der(extension)?
            .key_identifier
            .map(OctetString::into_bytes)
            .unwrap_or_default();
        Ok(Self { key_identifier })
    }
}
