//! Self-signed certificates packaged as password-protected PFX bundles.
//!
//! Used to produce realistic inputs for the converter, without any file being written:
//! the caller decides what to do with the returned bytes.
use crate::CertificateError;
use p12_keystore::Certificate;
use p12_keystore::KeyStore;
use p12_keystore::KeyStoreEntry;
use p12_keystore::PrivateKeyChain;
use rcgen::BasicConstraints;
use rcgen::CertificateParams;
use rcgen::DistinguishedName;
use rcgen::DnType;
use rcgen::IsCa;
use rcgen::KeyPair;
use rcgen::KeyUsagePurpose;
use rsa::pkcs8::EncodePrivateKey;
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;
use rustls_pki_types::PrivatePkcs8KeyDer;
use sha1::Digest;
use sha1::Sha1;
use time::Duration;
use time::OffsetDateTime;
use zeroize::Zeroizing;

/// Alias of the key chain entry in the generated bundles
pub const PFX_ENTRY_ALIAS: &str = "certificate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// RSA key of the given size, signed with SHA-256 (PKCS#1 v1.5)
    Rsa { bits: usize },

    /// ECDSA key on the P-256 curve, signed with SHA-256
    EcdsaP256,
}

#[derive(Debug, Clone)]
pub struct SelfSignedPfxConfig {
    pub common_name: String,
    pub key_algorithm: KeyAlgorithm,
    pub validity_period_days: u32,
}

impl Default for SelfSignedPfxConfig {
    fn default() -> Self {
        SelfSignedPfxConfig {
            common_name: "Test Certificate".into(),
            key_algorithm: KeyAlgorithm::Rsa { bits: 2048 },
            validity_period_days: 365,
        }
    }
}

/// Create a PFX bundle holding a new self-signed certificate and its private key,
/// the certificate being valid from yesterday.
pub fn new_selfsigned_pfx(
    config: &SelfSignedPfxConfig,
    password: &str,
) -> Result<Vec<u8>, CertificateError> {
    let today = OffsetDateTime::now_utc();
    let not_before = today - Duration::days(1); // Ensure the certificate is valid today
    new_selfsigned_pfx_at(config, password, not_before)
}

pub fn new_selfsigned_pfx_at(
    config: &SelfSignedPfxConfig,
    password: &str,
    not_before: OffsetDateTime,
) -> Result<Vec<u8>, CertificateError> {
    let not_after = not_before
        .checked_add(Duration::days(config.validity_period_days.into()))
        .ok_or(CertificateError::InvalidValidityPeriod {
            days: config.validity_period_days,
        })?;
    let key_pair = new_key_pair(config.key_algorithm)?;

    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, config.common_name.as_str());

    let mut params = CertificateParams::default();
    params.distinguished_name = distinguished_name;
    params.not_before = not_before;
    params.not_after = not_after;
    params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
    params.key_usages = vec![
        KeyUsagePurpose::KeyEncipherment,
        KeyUsagePurpose::DataEncipherment,
        KeyUsagePurpose::DigitalSignature,
    ];

    let certificate = params.self_signed(&key_pair)?;
    let certificate_der = certificate.der().to_vec();
    let private_key_der = Zeroizing::new(key_pair.serialize_der());

    let local_key_id = Sha1::digest(&certificate_der).to_vec();
    let chain = PrivateKeyChain::new(
        private_key_der.to_vec(),
        &local_key_id,
        vec![Certificate::from_der(&certificate_der)?],
    );

    let mut keystore = KeyStore::new();
    keystore.add_entry(PFX_ENTRY_ALIAS, KeyStoreEntry::PrivateKeyChain(chain));

    Ok(keystore.writer(password).write()?)
}

fn new_key_pair(algorithm: KeyAlgorithm) -> Result<KeyPair, CertificateError> {
    match algorithm {
        KeyAlgorithm::Rsa { bits } => {
            // rcgen can sign with RSA keys, but cannot generate them
            let private_key = RsaPrivateKey::new(&mut OsRng, bits)?;
            let pkcs8 = private_key.to_pkcs8_der()?;
            let key_pair = KeyPair::from_pkcs8_der_and_sign_algo(
                &PrivatePkcs8KeyDer::from(pkcs8.as_bytes()),
                &rcgen::PKCS_RSA_SHA256,
            )?;
            Ok(key_pair)
        }
        KeyAlgorithm::EcdsaP256 => Ok(KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert_pfx_to_cer;
    use crate::DerCertificate;
    use assert_matches::assert_matches;
    use time::macros::datetime;
    use x509_parser::certificate::X509Certificate;
    use x509_parser::prelude::FromDer;

    fn ecdsa_config(common_name: &str) -> SelfSignedPfxConfig {
        SelfSignedPfxConfig {
            common_name: common_name.to_owned(),
            key_algorithm: KeyAlgorithm::EcdsaP256,
            ..Default::default()
        }
    }

    #[test]
    fn default_config_matches_the_test_certificate() {
        let config = SelfSignedPfxConfig::default();

        assert_eq!(config.common_name, "Test Certificate");
        assert_eq!(config.key_algorithm, KeyAlgorithm::Rsa { bits: 2048 });
        assert_eq!(config.validity_period_days, 365);
    }

    #[test]
    fn the_bundle_holds_the_certificate_and_its_key() {
        let pfx = new_selfsigned_pfx(&ecdsa_config("my-service"), "test123").unwrap();

        let keystore = KeyStore::from_pkcs12(&pfx, "test123").unwrap();
        let entries: Vec<_> = keystore.entries().collect();
        assert_eq!(entries.len(), 1);

        let (alias, entry) = &entries[0];
        assert_eq!(alias.to_string(), PFX_ENTRY_ALIAS);
        match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => {
                assert_eq!(chain.chain().len(), 1);
                assert!(!chain.key().is_empty());
            }
            _ => panic!("Expected a private key chain"),
        }
    }

    #[test]
    fn certificate_is_a_constrained_ca() {
        let pfx = new_selfsigned_pfx(&ecdsa_config("my-service"), "test123").unwrap();
        let der = convert_pfx_to_cer(&pfx, "test123").unwrap();
        let (_, x509) = X509Certificate::from_der(&der).unwrap();

        let basic_constraints = x509.basic_constraints().unwrap().unwrap();
        assert!(basic_constraints.critical);
        assert!(basic_constraints.value.ca);
        assert_eq!(basic_constraints.value.path_len_constraint, Some(0));
    }

    #[test]
    fn certificate_key_usage_is_for_signature_and_encipherment() {
        let pfx = new_selfsigned_pfx(&ecdsa_config("my-service"), "test123").unwrap();
        let der = convert_pfx_to_cer(&pfx, "test123").unwrap();
        let (_, x509) = X509Certificate::from_der(&der).unwrap();

        let key_usage = x509.key_usage().unwrap().unwrap();
        assert!(key_usage.critical);
        assert!(key_usage.value.digital_signature());
        assert!(key_usage.value.key_encipherment());
        assert!(key_usage.value.data_encipherment());
        assert!(!key_usage.value.key_cert_sign());
    }

    #[test]
    fn validity_period_starts_at_the_given_date() {
        let config = SelfSignedPfxConfig {
            validity_period_days: 10,
            ..ecdsa_config("some-id")
        };
        let birthdate = datetime!(2021-03-31 16:39:57 +01:00);

        let pfx = new_selfsigned_pfx_at(&config, "test123", birthdate).unwrap();
        let cert = DerCertificate::from_der(convert_pfx_to_cer(&pfx, "test123").unwrap()).unwrap();

        assert_eq!(cert.not_before().unwrap(), "Wed, 31 Mar 2021 15:39:57 +0000");
        assert_eq!(cert.not_after().unwrap(), "Sat, 10 Apr 2021 15:39:57 +0000");
    }

    #[test]
    fn a_validity_period_beyond_the_calendar_is_rejected() {
        let config = SelfSignedPfxConfig {
            validity_period_days: 4_000_000,
            ..ecdsa_config("some-id")
        };

        let err = new_selfsigned_pfx(&config, "test123").unwrap_err();

        assert_matches!(
            err,
            CertificateError::InvalidValidityPeriod { days: 4_000_000 }
        );
    }

    #[test]
    fn a_new_certificate_is_valid_today() {
        let pfx = new_selfsigned_pfx(&ecdsa_config("some-id"), "test123").unwrap();
        let der = convert_pfx_to_cer(&pfx, "test123").unwrap();
        let (_, x509) = X509Certificate::from_der(&der).unwrap();

        assert!(x509.validity().is_valid());
    }

    #[test]
    fn each_bundle_gets_a_fresh_key() {
        let config = ecdsa_config("some-id");

        let first = new_selfsigned_pfx(&config, "test123").unwrap();
        let second = new_selfsigned_pfx(&config, "test123").unwrap();

        assert_ne!(
            convert_pfx_to_cer(&first, "test123").unwrap(),
            convert_pfx_to_cer(&second, "test123").unwrap()
        );
    }
}
