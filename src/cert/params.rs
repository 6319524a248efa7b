use core::time::Duration as StdDuration;

use const_oid::ObjectIdentifier;
use der::asn1::{GeneralizedTime, SetOfVec, UtcTime};
use der::{Any, Tag};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::time::Time;

use super::extensions::ToAndFromX509Extension;
use crate::error::{PkiError, Result};

pub const OID_COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub const OID_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
pub const OID_ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub const OID_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
pub const OID_PROVINCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
pub const OID_STREET_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9");

/// Separator used when a multi-valued name attribute is exposed as one string.
pub const MULTI_VALUE_SEPARATOR: &str = "\\";

/// Distinguished name of a certificate subject or issuer.
///
/// Every attribute except the common name may hold several values. Each value
/// becomes its own relative distinguished name when encoded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Vec<String>,
    pub organization: Vec<String>,
    pub organizational_unit: Vec<String>,
    pub locality: Vec<String>,
    pub province: Vec<String>,
    pub street_address: Vec<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Attributes are emitted in the order C, O, OU, L, ST, STREET, CN and empty
    /// values are skipped.
    pub fn as_x509_name(&self) -> Result<Name> {
        let mut rdns = Vec::new();
        let groups: [(ObjectIdentifier, &[String]); 6] = [
            (OID_COUNTRY, &self.country),
            (OID_ORGANIZATION, &self.organization),
            (OID_ORGANIZATIONAL_UNIT, &self.organizational_unit),
            (OID_LOCALITY, &self.locality),
            (OID_PROVINCE, &self.province),
            (OID_STREET_ADDRESS, &self.street_address),
        ];
        for (oid, values) in groups {
            for value in values.iter().filter(|v| !v.is_empty()) {
                rdns.push(rdn(oid, value)?);
            }
        }
        if !self.common_name.is_empty() {
            rdns.push(rdn(OID_COMMON_NAME, &self.common_name)?);
        }
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes that are not valid UTF-8 or carry an unknown type are ignored.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Ok(value) = std::str::from_utf8(attr.value.value()) else {
                    continue;
                };
                let value = value.to_string();
                match attr.oid {
                    OID_COMMON_NAME => dn.common_name = value,
                    OID_COUNTRY => dn.country.push(value),
                    OID_ORGANIZATION => dn.organization.push(value),
                    OID_ORGANIZATIONAL_UNIT => dn.organizational_unit.push(value),
                    OID_LOCALITY => dn.locality.push(value),
                    OID_PROVINCE => dn.province.push(value),
                    OID_STREET_ADDRESS => dn.street_address.push(value),
                    _ => {}
                }
            }
        }
        dn
    }
}

fn rdn(oid: ObjectIdentifier, value: &str) -> Result<RelativeDistinguishedName> {
    let tag = if oid == OID_COUNTRY {
        Tag::PrintableString
    } else {
        Tag::Utf8String
    };
    let atv = AttributeTypeAndValue {
        oid,
        value: Any::new(tag, value.as_bytes().to_vec())?,
    };
    Ok(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?))
}

/// Joins attribute values with a backslash, or returns an empty string.
pub fn join_values(values: &[String]) -> String {
    values.join(MULTI_VALUE_SEPARATOR)
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }
}

/// Encodes a timestamp as UTCTime before 2050 and GeneralizedTime from 2050 on.
pub(crate) fn to_x509_time(value: OffsetDateTime) -> Result<Time> {
    let seconds = u64::try_from(value.unix_timestamp()).map_err(|_| {
        PkiError::InvalidParameter(format!("timestamp {value} predates the Unix epoch"))
    })?;
    let date_time = der::DateTime::from_unix_duration(StdDuration::from_secs(seconds))?;
    if date_time.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_date_time(date_time)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(date_time)))
    }
}

pub(crate) fn from_x509_time(value: &Time) -> OffsetDateTime {
    let since_epoch = match value {
        Time::UtcTime(ut) => ut.to_unix_duration(),
        Time::GeneralTime(gt) => gt.to_unix_duration(),
    };
    OffsetDateTime::UNIX_EPOCH + since_epoch
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub(crate) fn to_x509(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: der::asn1::OctetString::new(self.value.clone())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip_keeps_multiple_values() {
        let dn = DistinguishedName {
            common_name: "sgw".to_string(),
            country: vec!["CN".to_string()],
            organization: vec!["ca".to_string()],
            organizational_unit: vec!["sgw".to_string()],
            locality: vec!["华东".to_string(), "east".to_string()],
            province: vec!["浙江".to_string()],
            street_address: vec!["杭州".to_string()],
        };
        let decoded = DistinguishedName::from_x509_name(&dn.as_x509_name().unwrap());
        assert_eq!(decoded, dn);
        assert_eq!(join_values(&decoded.locality), "华东\\east");
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let dn = DistinguishedName {
            common_name: "only".to_string(),
            organization: vec![String::new()],
            ..Default::default()
        };
        let name = dn.as_x509_name().unwrap();
        assert_eq!(name.0.len(), 1);
    }

    #[test]
    fn test_time_conversion_switches_to_generalized() {
        let early = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert!(matches!(to_x509_time(early).unwrap(), Time::UtcTime(_)));
        assert_eq!(from_x509_time(&to_x509_time(early).unwrap()), early);

        let late = OffsetDateTime::from_unix_timestamp(2_600_000_000).unwrap();
        assert!(matches!(to_x509_time(late).unwrap(), Time::GeneralTime(_)));
        assert_eq!(from_x509_time(&to_x509_time(late).unwrap()), late);
    }
}
