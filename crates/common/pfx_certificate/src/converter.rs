use crate::DerCertificate;
use der::Decode;
use p12_keystore::error::Error as KeyStoreError;
use p12_keystore::KeyStore;
use p12_keystore::KeyStoreEntry;
use pkcs12::pfx::Pfx;
use zeroize::Zeroizing;

/// The class of a conversion failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorKind {
    /// No bundle content has been provided
    InvalidFileFormat,

    /// The bundle is a PKCS#12 container, but cannot be opened with the given password
    InvalidPassword,

    /// Anything else going wrong while parsing, decrypting or re-encoding the bundle
    ConversionError,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("PFX file content is empty")]
    InvalidFileFormat,

    #[error("Failed to convert PFX to CER: {reason}")]
    InvalidPassword { reason: String },

    #[error("Failed to convert PFX to CER: {reason}")]
    ConversionFailed { reason: String },
}

impl ConversionError {
    pub fn kind(&self) -> ConversionErrorKind {
        match self {
            ConversionError::InvalidFileFormat => ConversionErrorKind::InvalidFileFormat,
            ConversionError::InvalidPassword { .. } => ConversionErrorKind::InvalidPassword,
            ConversionError::ConversionFailed { .. } => ConversionErrorKind::ConversionError,
        }
    }

    fn failed(reason: impl ToString) -> Self {
        ConversionError::ConversionFailed {
            reason: reason.to_string(),
        }
    }

    /// Classify an error returned by the PKCS#12 parser.
    ///
    /// A MAC mismatch is the symptom of a wrong password, as is a decryption failure.
    /// Without a MAC (`integrity_checked` being `false`), a wrong password can also decrypt
    /// into garbage that is then rejected by the DER decoder.
    fn from_keystore_error(err: KeyStoreError, integrity_checked: bool) -> Self {
        let reason = err.to_string();
        match err {
            KeyStoreError::MacError(_) | KeyStoreError::Pkcs5Error(_) | KeyStoreError::UnpadError => {
                ConversionError::InvalidPassword { reason }
            }
            KeyStoreError::DerError(_) if !integrity_checked => {
                ConversionError::InvalidPassword { reason }
            }
            _ => ConversionError::ConversionFailed { reason },
        }
    }
}

/// Tell if a bundle carries a MAC, i.e. if a wrong password is detected before any decryption.
///
/// Returns `true` for content that is not even a PFX structure,
/// so the parser errors on such content are not mistaken for a wrong password.
fn has_integrity_check(pfx: &[u8]) -> bool {
    Pfx::from_der(pfx)
        .map(|pfx| pfx.mac_data.is_some())
        .unwrap_or(true)
}

/// Extract the leaf certificate of a PKCS#12 bundle, DER encoded.
///
/// The bundle is decrypted with `password`, used verbatim (an empty password is a valid password).
/// When the bundle holds a private key, the leaf is the first certificate of the key chain.
/// Otherwise, the first trusted certificate is used.
/// Entries of the same rank are considered in alias order, so the same bundle always gives the same certificate.
pub fn convert_pfx_to_cer(pfx: &[u8], password: &str) -> Result<Vec<u8>, ConversionError> {
    if pfx.is_empty() {
        return Err(ConversionError::InvalidFileFormat);
    }

    let keystore = KeyStore::from_pkcs12(pfx, password)
        .map_err(|err| ConversionError::from_keystore_error(err, has_integrity_check(pfx)))?;

    let der = leaf_certificate(&keystore)
        .ok_or_else(|| ConversionError::failed("no certificate found in the PFX bundle"))?;

    let certificate = DerCertificate::from_der(der).map_err(ConversionError::failed)?;
    Ok(certificate.into_der())
}

/// Same as [convert_pfx_to_cer], but decrypting the bundle on the blocking thread pool,
/// so the calling task can keep serving other requests.
///
/// Must be called from a tokio runtime.
pub async fn convert_pfx_to_cer_async(
    pfx: Vec<u8>,
    password: Zeroizing<String>,
) -> Result<Vec<u8>, ConversionError> {
    if pfx.is_empty() {
        return Err(ConversionError::InvalidFileFormat);
    }

    tokio::task::spawn_blocking(move || convert_pfx_to_cer(&pfx, &password))
        .await
        .map_err(ConversionError::failed)?
}

fn leaf_certificate(keystore: &KeyStore) -> Option<Vec<u8>> {
    let mut key_chain_leaves = Vec::new();
    let mut trusted_certificates = Vec::new();

    for (alias, entry) in keystore.entries() {
        match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => {
                if let Some(leaf) = chain.chain().first() {
                    key_chain_leaves.push((alias.to_string(), leaf.as_der().to_vec()));
                }
            }
            KeyStoreEntry::Certificate(cert) => {
                trusted_certificates.push((alias.to_string(), cert.as_der().to_vec()));
            }
            KeyStoreEntry::Secret(_) => {}
        }
    }

    first_by_alias(key_chain_leaves).or_else(|| first_by_alias(trusted_certificates))
}

fn first_by_alias(candidates: Vec<(String, Vec<u8>)>) -> Option<Vec<u8>> {
    candidates
        .into_iter()
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, der)| der)
}

/// A service converting PFX bundles into DER certificates.
///
/// Abstracted as a trait so HTTP handlers can be tested without real certificates.
#[async_trait::async_trait]
pub trait CertificateConverter: Send + Sync {
    async fn convert_pfx_to_cer(
        &self,
        pfx: Vec<u8>,
        password: Zeroizing<String>,
    ) -> Result<Vec<u8>, ConversionError>;
}

/// The [CertificateConverter] backed by [convert_pfx_to_cer_async]
#[derive(Debug, Clone, Copy, Default)]
pub struct PfxConverter;

#[async_trait::async_trait]
impl CertificateConverter for PfxConverter {
    async fn convert_pfx_to_cer(
        &self,
        pfx: Vec<u8>,
        password: Zeroizing<String>,
    ) -> Result<Vec<u8>, ConversionError> {
        convert_pfx_to_cer_async(pfx, password).await
    }
}
