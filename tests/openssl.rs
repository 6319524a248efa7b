mod util;

use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::symm::{self, Cipher};
use openssl::x509::{X509, X509Crl};
use pkikit::cipher::{CipherVariant, SymmetricCipher};
use pkikit::crl::RevocationList;
use pkikit::key::RsaKeyPair;
use rsa::traits::PublicKeyParts;
use rstest::rstest;

fn openssl_cipher(variant: CipherVariant) -> Cipher {
    match variant {
        CipherVariant::Aes128Cbc => Cipher::aes_128_cbc(),
        CipherVariant::Aes192Cbc => Cipher::aes_192_cbc(),
        CipherVariant::Aes256Cbc => Cipher::aes_256_cbc(),
    }
}

/// Our salted blobs decrypt with OpenSSL's `EVP_BytesToKey` and AES-CBC.
#[rstest]
#[case(CipherVariant::Aes128Cbc)]
#[case(CipherVariant::Aes192Cbc)]
#[case(CipherVariant::Aes256Cbc)]
fn test_openssl_decrypts_salted_blob(#[case] variant: CipherVariant) {
    let plaintext = b"The quick brown fox jumps over the lazy dog";
    let blob = SymmetricCipher::new("pwd", variant).encrypt(plaintext).unwrap();
    assert_eq!(&blob[..8], b"Salted__");

    let cipher = openssl_cipher(variant);
    let derived =
        openssl::pkcs5::bytes_to_key(cipher, MessageDigest::md5(), b"pwd", Some(&blob[8..16]), 1)
            .unwrap();
    let decrypted = symm::decrypt(cipher, &derived.key, derived.iv.as_deref(), &blob[16..]).unwrap();
    assert_eq!(decrypted, plaintext);
}

/// OpenSSL-produced salted blobs decrypt with our cipher.
#[rstest]
#[case(CipherVariant::Aes128Cbc, 0)]
#[case(CipherVariant::Aes256Cbc, 16)]
#[case(CipherVariant::Aes256Cbc, 100)]
fn test_decrypts_openssl_blob(#[case] variant: CipherVariant, #[case] len: usize) {
    let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
    let salt = [9u8, 8, 7, 6, 5, 4, 3, 2];

    let cipher = openssl_cipher(variant);
    let derived =
        openssl::pkcs5::bytes_to_key(cipher, MessageDigest::md5(), b"secret", Some(&salt[..]), 1)
            .unwrap();
    let encrypted = symm::encrypt(cipher, &derived.key, derived.iv.as_deref(), &plaintext).unwrap();

    let mut blob = b"Salted__".to_vec();
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&encrypted);

    let decrypted = SymmetricCipher::new("secret", variant).decrypt(&blob).unwrap();
    assert_eq!(decrypted, plaintext);
}

#[test]
fn test_openssl_crate_validate_cert() {
    let ca = util::ca();
    let server = util::issue_leaf(ca, "server", "gateway", &["127.0.0.1", "gw.myca.local"]);

    let ca_x509 = X509::from_pem(ca.cert.to_pem().unwrap().as_bytes()).expect("Failed to parse CA PEM");
    let x509 = X509::from_pem(server.cert.to_pem().unwrap().as_bytes()).expect("Failed to parse PEM");

    let common_name = x509
        .subject_name()
        .entries_by_nid(openssl::nid::Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(common_name.to_string(), "gateway", "Subject CN mismatch");

    let issuer = x509
        .issuer_name()
        .entries_by_nid(openssl::nid::Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(issuer.to_string(), "myca", "Issuer CN mismatch");

    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");

    let serial = x509.serial_number().to_bn().unwrap().to_vec();
    assert_eq!(serial, server.cert.serial_number());

    assert_eq!(
        x509.signature_algorithm().object().nid(),
        openssl::nid::Nid::SHA256WITHRSAENCRYPTION
    );

    let sans: Vec<String> = x509
        .subject_alt_names()
        .unwrap()
        .iter()
        .filter_map(|name| name.dnsname().map(str::to_string))
        .collect();
    assert_eq!(sans, vec!["gw.myca.local".to_string()]);

    assert!(x509.verify(&ca_x509.public_key().unwrap()).unwrap());
    assert!(ca_x509.verify(&ca_x509.public_key().unwrap()).unwrap());
}

#[test]
fn test_openssl_crate_validate_crl() {
    let ca = util::ca();
    let leaf = util::issue_leaf(ca, "client", "alice", &[]);

    let mut list = RevocationList::new();
    list.add_certificate(&leaf.cert, None).unwrap();
    let pem = list.to_memory(&ca.cert, &ca.key, None, None).unwrap();

    let crl = X509Crl::from_pem(pem.as_bytes()).expect("Failed to parse CRL");
    let ca_x509 = X509::from_pem(ca.cert.to_pem().unwrap().as_bytes()).unwrap();
    assert!(crl.verify(&ca_x509.public_key().unwrap()).unwrap());

    let revoked = crl.get_revoked().expect("CRL has no revoked entries");
    assert_eq!(revoked.len(), 1);
    let serial = revoked
        .iter()
        .next()
        .unwrap()
        .serial_number()
        .to_bn()
        .unwrap()
        .to_vec();
    assert_eq!(serial, leaf.cert.serial_number());
}

/// Legacy encrypted PEM keys are readable in both directions.
#[test]
fn test_encrypted_private_key_interop() {
    let ca = util::ca();
    let modulus = ca.key.public_key().inner().n().to_bytes_be();

    let ours = ca.key.to_pem(Some("pw")).unwrap();
    assert!(ours.contains("Proc-Type: 4,ENCRYPTED"));
    let read_by_openssl = Rsa::private_key_from_pem_passphrase(ours.as_bytes(), b"pw").unwrap();
    assert_eq!(read_by_openssl.n().to_vec(), modulus);

    let pkey = PKey::from_rsa(read_by_openssl).unwrap();
    let theirs = pkey
        .rsa()
        .unwrap()
        .private_key_to_pem_passphrase(Cipher::aes_128_cbc(), b"pw")
        .unwrap();
    let key = RsaKeyPair::from_pem(&theirs, Some("pw")).unwrap();
    assert_eq!(key.public_key(), ca.key.public_key());
}
