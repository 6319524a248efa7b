#![allow(dead_code)]

use std::sync::OnceLock;

use pkikit::cert::template::CertificateTemplate;
use pkikit::cert::{Certificate, CertificateWithPrivateKey};
use pkikit::key::RsaKeyPair;

pub const TEST_KEY_BITS: usize = 1024;

/// Root CA shared by every test in a binary; key generation dominates test time.
pub fn ca() -> &'static CertificateWithPrivateKey {
    static CA: OnceLock<CertificateWithPrivateKey> = OnceLock::new();
    CA.get_or_init(|| generate_ca_cert("myca"))
}

pub fn generate_ca_cert(unit: &str) -> CertificateWithPrivateKey {
    let ca_key = RsaKeyPair::generate(TEST_KEY_BITS).unwrap();
    let tbs = CertificateTemplate::builder()
        .organization("ca")
        .organizational_unit(unit)
        .province("Zhejiang")
        .locality("Hangzhou")
        .expired_days(3650)
        .build()
        .to_tbs_certificate()
        .unwrap();

    CertificateWithPrivateKey {
        cert: Certificate::create(&tbs, &tbs, ca_key.public_key(), &ca_key).unwrap(),
        key: ca_key,
    }
}

pub fn issue_leaf(
    issuer: &CertificateWithPrivateKey,
    organization: &str,
    unit: &str,
    hosts: &[&str],
) -> CertificateWithPrivateKey {
    let key = RsaKeyPair::generate(TEST_KEY_BITS).unwrap();
    let tbs = CertificateTemplate::builder()
        .organization(organization)
        .organizational_unit(unit)
        .locality("Hangzhou")
        .street_address("West Lake Road")
        .hosts(hosts.iter().map(|h| h.to_string()).collect())
        .build()
        .to_tbs_certificate()
        .unwrap();

    CertificateWithPrivateKey {
        cert: issuer.issue(&tbs, key.public_key()).unwrap(),
        key,
    }
}
