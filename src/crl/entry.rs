use bon::Builder;
use const_oid::ObjectIdentifier;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use x509_cert::crl::RevokedCert;
use x509_cert::ext::Extension;
use x509_cert::serial_number::SerialNumber;

use crate::cert::params::{self, ExtensionParam};
use crate::cert::{Certificate, serial_to_hex, trim_serial};
use crate::error::Result;

/// Private entry extension carrying the organization.
pub const OID_ENTRY_ORGANIZATION: ObjectIdentifier = params::OID_ORGANIZATION;
/// Private entry extension carrying the organizational unit.
pub const OID_ENTRY_ORGANIZATIONAL_UNIT: ObjectIdentifier = params::OID_ORGANIZATIONAL_UNIT;
/// Private entry extension carrying the common name.
pub const OID_ENTRY_COMMON_NAME: ObjectIdentifier = params::OID_COMMON_NAME;
/// Private entry extension carrying the locality.
pub const OID_ENTRY_LOCALITY: ObjectIdentifier = params::OID_LOCALITY;
/// Private entry extension carrying the province.
pub const OID_ENTRY_PROVINCE: ObjectIdentifier = params::OID_PROVINCE;
/// Private entry extension carrying the street address.
pub const OID_ENTRY_STREET_ADDRESS: ObjectIdentifier = params::OID_STREET_ADDRESS;
/// Private entry extension carrying the revoked certificate's notBefore.
pub const OID_ENTRY_NOT_BEFORE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.8.8.6.3.1.4");
/// Private entry extension carrying the revoked certificate's notAfter.
pub const OID_ENTRY_NOT_AFTER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.8.8.6.3.1.5");

/// One revoked certificate together with its descriptive metadata.
///
/// Only the serial number and revocation time map onto standard CRL entry
/// fields. Every other populated field travels as a private, non-critical entry
/// extension whose value is the field rendered as JSON.
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct RevokedEntry {
    /// Unsigned big-endian serial number
    #[builder(into)]
    pub serial_number: Vec<u8>,
    #[builder(default = OffsetDateTime::now_utc())]
    pub revocation_time: OffsetDateTime,
    #[builder(into)]
    pub organization: Option<String>,
    #[builder(into)]
    pub organizational_unit: Option<String>,
    #[builder(into)]
    pub common_name: Option<String>,
    #[builder(into)]
    pub locality: Option<String>,
    #[builder(into)]
    pub province: Option<String>,
    #[builder(into)]
    pub street_address: Option<String>,
    pub not_before: Option<OffsetDateTime>,
    pub not_after: Option<OffsetDateTime>,
}

impl RevokedEntry {
    /// Describes `cert` as revoked at `revocation_time`.
    pub fn from_certificate(cert: &Certificate, revocation_time: OffsetDateTime) -> Self {
        Self {
            serial_number: cert.serial_number(),
            revocation_time,
            organization: present(cert.organization()),
            organizational_unit: present(cert.organizational_unit()),
            common_name: present(cert.common_name()),
            locality: present(cert.locality()),
            province: present(cert.province()),
            street_address: present(cert.street_address()),
            not_before: Some(cert.not_before()),
            not_after: Some(cert.not_after()),
        }
    }

    /// Serial number as lower-case hexadecimal without leading zeros.
    pub fn serial_number_hex(&self) -> String {
        serial_to_hex(&trim_serial(&self.serial_number))
    }

    /// Encodes every populated descriptive field under its private OID.
    ///
    /// A field that fails to serialize is left out and reported through a
    /// `warn!` event instead of an error.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        let mut extensions = Vec::new();

        let text_fields = [
            (OID_ENTRY_ORGANIZATION, &self.organization),
            (OID_ENTRY_ORGANIZATIONAL_UNIT, &self.organizational_unit),
            (OID_ENTRY_COMMON_NAME, &self.common_name),
            (OID_ENTRY_LOCALITY, &self.locality),
            (OID_ENTRY_PROVINCE, &self.province),
            (OID_ENTRY_STREET_ADDRESS, &self.street_address),
        ];
        for (oid, value) in text_fields {
            if let Some(value) = value {
                push_encoded(&mut extensions, oid, encode_text(value));
            }
        }

        let time_fields = [
            (OID_ENTRY_NOT_BEFORE, self.not_before),
            (OID_ENTRY_NOT_AFTER, self.not_after),
        ];
        for (oid, value) in time_fields {
            if let Some(value) = value {
                push_encoded(&mut extensions, oid, encode_time(value));
            }
        }

        extensions
    }

    pub(crate) fn to_revoked_cert(&self) -> Result<RevokedCert> {
        let extensions = self
            .extensions()
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>>>()?;

        Ok(RevokedCert {
            serial_number: SerialNumber::new(&trim_serial(&self.serial_number))?,
            revocation_date: params::to_x509_time(self.revocation_time)?,
            crl_entry_extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Rebuilds an entry from its CRL form. Missing or undecodable private
    /// extensions leave the matching field empty.
    pub(crate) fn from_revoked_cert(revoked: &RevokedCert) -> Self {
        let extensions = revoked.crl_entry_extensions.as_deref().unwrap_or_default();
        Self {
            serial_number: trim_serial(revoked.serial_number.as_bytes()),
            revocation_time: params::from_x509_time(&revoked.revocation_date),
            organization: decode_text(extensions, OID_ENTRY_ORGANIZATION),
            organizational_unit: decode_text(extensions, OID_ENTRY_ORGANIZATIONAL_UNIT),
            common_name: decode_text(extensions, OID_ENTRY_COMMON_NAME),
            locality: decode_text(extensions, OID_ENTRY_LOCALITY),
            province: decode_text(extensions, OID_ENTRY_PROVINCE),
            street_address: decode_text(extensions, OID_ENTRY_STREET_ADDRESS),
            not_before: decode_time(extensions, OID_ENTRY_NOT_BEFORE),
            not_after: decode_time(extensions, OID_ENTRY_NOT_AFTER),
        }
    }
}

fn present(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn encode_text(value: &str) -> std::result::Result<Vec<u8>, String> {
    serde_json::to_vec(value).map_err(|e| e.to_string())
}

fn encode_time(value: OffsetDateTime) -> std::result::Result<Vec<u8>, String> {
    let formatted = value.format(&Rfc3339).map_err(|e| e.to_string())?;
    serde_json::to_vec(&formatted).map_err(|e| e.to_string())
}

fn push_encoded(
    extensions: &mut Vec<ExtensionParam>,
    oid: ObjectIdentifier,
    encoded: std::result::Result<Vec<u8>, String>,
) {
    match encoded {
        Ok(value) => extensions.push(ExtensionParam {
            oid,
            critical: false,
            value,
        }),
        Err(error) => {
            tracing::warn!(%oid, %error, "dropping revocation entry field that failed to serialize")
        }
    }
}

fn find_value(extensions: &[Extension], oid: ObjectIdentifier) -> Option<&[u8]> {
    extensions
        .iter()
        .find(|ext| ext.extn_id == oid)
        .map(|ext| ext.extn_value.as_bytes())
}

fn decode_text(extensions: &[Extension], oid: ObjectIdentifier) -> Option<String> {
    let value = find_value(extensions, oid)?;
    serde_json::from_slice::<Option<String>>(value)
        .ok()
        .flatten()
        .and_then(present)
}

fn decode_time(extensions: &[Extension], oid: ObjectIdentifier) -> Option<OffsetDateTime> {
    let value = find_value(extensions, oid)?;
    let text = serde_json::from_slice::<Option<String>>(value).ok().flatten()?;
    OffsetDateTime::parse(&text, &Rfc3339).ok()
}
