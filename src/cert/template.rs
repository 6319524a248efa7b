//! Role-driven certificate templates.
//!
//! | role     | CA  | key usage                                        | extended key usage | SAN   |
//! |----------|-----|--------------------------------------------------|--------------------|-------|
//! | `ca`     | yes | key encipherment, cert sign, digital signature   | none               | -     |
//! | `server` | no  | key encipherment, digital signature              | server auth        | hosts |
//! | other    | no  | key encipherment, digital signature              | client auth        | -     |

use std::net::IpAddr;

use bon::Builder;
use der::flagset::FlagSet;
use rand_core::{OsRng, RngCore};

use super::extensions::{ExtendedKeyUsageOption, KeyUsages};
use super::params::{DistinguishedName, ExtensionParam, Validity};
use super::trim_serial;
use crate::error::Result;
use crate::tbs_certificate::TbsCertificate;

/// Validity used when the template asks for a non-positive number of days.
pub const DEFAULT_EXPIRED_DAYS: i64 = 365;

/// Country written into every subject.
pub const DEFAULT_COUNTRY: &str = "CN";

/// Certificate role, taken case-insensitively from the template's organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Ca,
    Server,
    Client,
}

impl Role {
    pub fn from_organization(organization: &str) -> Self {
        match organization.to_ascii_lowercase().as_str() {
            "ca" => Role::Ca,
            "server" => Role::Server,
            _ => Role::Client,
        }
    }

    pub fn is_ca(self) -> bool {
        self == Role::Ca
    }

    pub fn key_usage(self) -> FlagSet<KeyUsages> {
        match self {
            Role::Ca => {
                KeyUsages::KeyEncipherment | KeyUsages::KeyCertSign | KeyUsages::DigitalSignature
            }
            Role::Server | Role::Client => KeyUsages::KeyEncipherment | KeyUsages::DigitalSignature,
        }
    }

    pub fn extended_key_usage(self) -> Vec<ExtendedKeyUsageOption> {
        match self {
            Role::Ca => Vec::new(),
            Role::Server => vec![ExtendedKeyUsageOption::ServerAuth],
            Role::Client => vec![ExtendedKeyUsageOption::ClientAuth],
        }
    }
}

/// Policy input for a new certificate.
///
/// `organization` selects the [`Role`]; `organizational_unit` names the entity
/// within that role and stands in for an empty common name.
#[derive(Clone, Debug, Builder)]
pub struct CertificateTemplate {
    #[builder(default, into)]
    pub common_name: String,
    #[builder(into)]
    pub organization: String,
    #[builder(default, into)]
    pub organizational_unit: String,
    #[builder(default, into)]
    pub locality: String,
    #[builder(default, into)]
    pub province: String,
    #[builder(default, into)]
    pub street_address: String,
    /// Host names or IP literals; only used for server certificates
    #[builder(default)]
    pub hosts: Vec<String>,
    /// Extra extensions appended verbatim
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
    #[builder(default = DEFAULT_EXPIRED_DAYS)]
    pub expired_days: i64,
}

impl CertificateTemplate {
    pub fn role(&self) -> Role {
        Role::from_organization(&self.organization)
    }

    /// Produces the unsigned certificate descriptor, drawing a fresh serial number
    /// and starting the validity window now.
    pub fn to_tbs_certificate(&self) -> Result<TbsCertificate> {
        let role = self.role();

        let common_name = if self.common_name.is_empty() {
            self.organizational_unit.clone()
        } else {
            self.common_name.clone()
        };
        let subject = DistinguishedName {
            common_name,
            country: vec![DEFAULT_COUNTRY.to_string()],
            organization: non_empty(&self.organization),
            organizational_unit: non_empty(&self.organizational_unit),
            locality: non_empty(&self.locality),
            province: non_empty(&self.province),
            street_address: non_empty(&self.street_address),
        };

        let days = if self.expired_days < 1 {
            DEFAULT_EXPIRED_DAYS
        } else {
            self.expired_days
        };
        let validity = Validity::for_days(days);

        let mut dns_names = Vec::new();
        let mut ip_addresses = Vec::new();
        if role == Role::Server {
            for host in &self.hosts {
                match host.parse::<IpAddr>() {
                    Ok(ip) => ip_addresses.push(ip),
                    Err(_) => dns_names.push(host.clone()),
                }
            }
        }

        Ok(TbsCertificate {
            serial_number: random_serial(),
            subject,
            validity,
            is_ca: role.is_ca(),
            key_usage: role.key_usage(),
            extended_key_usage: role.extended_key_usage(),
            dns_names,
            ip_addresses,
            extensions: self.extensions.clone(),
        })
    }
}

fn non_empty(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// Uniformly random 128-bit serial number from the operating system CSPRNG.
fn random_serial() -> Vec<u8> {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    trim_serial(&bytes)
}
