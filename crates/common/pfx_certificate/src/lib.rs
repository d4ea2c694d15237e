//! Conversion of password-protected PKCS#12 (PFX) bundles into bare X.509 certificates.
//!
//! The entry point is [convert_pfx_to_cer]: it decrypts a PFX bundle with the given password,
//! picks the leaf certificate and returns it DER encoded, i.e. in the `.cer` format.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! let pfx = std::fs::read("certificate.pfx")?;
//! let cer = pfx_certificate::convert_pfx_to_cer(&pfx, "test123")?;
//! std::fs::write("certificate.cer", cer)?;
//! # Ok(())
//! # }
//! ```
//!
//! Failures are classified with a [ConversionErrorKind], so callers can tell an empty upload
//! from a wrong password or from a file that is not a PKCS#12 bundle at all.
use sha1::Digest;
use sha1::Sha1;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

mod converter;
pub mod self_signed;

pub use converter::convert_pfx_to_cer;
pub use converter::convert_pfx_to_cer_async;
pub use converter::CertificateConverter;
pub use converter::ConversionError;
pub use converter::ConversionErrorKind;
pub use converter::PfxConverter;

/// A DER encoded X.509 certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerCertificate {
    der: Vec<u8>,
}

impl DerCertificate {
    /// Wrap DER bytes, checking they actually hold a single X.509 certificate
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<DerCertificate, CertificateError> {
        let der = der.into();
        DerCertificate::extract_certificate(&der)?;
        Ok(DerCertificate { der })
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    pub fn subject(&self) -> Result<String, CertificateError> {
        let x509 = DerCertificate::extract_certificate(&self.der)?;
        Ok(x509.tbs_certificate.subject.to_string())
    }

    pub fn subject_common_name(&self) -> Result<String, CertificateError> {
        let x509 = DerCertificate::extract_certificate(&self.der)?;
        let subject = x509.tbs_certificate.subject;
        let cn = subject.iter_common_name().next().map(|cn| cn.as_str());

        match cn {
            None => Ok(String::from("")),
            Some(Ok(name)) => Ok(name.to_owned()),
            Some(Err(err)) => Err(CertificateError::X509Error(err.to_string())),
        }
    }

    pub fn issuer(&self) -> Result<String, CertificateError> {
        let x509 = DerCertificate::extract_certificate(&self.der)?;
        Ok(x509.tbs_certificate.issuer.to_string())
    }

    pub fn not_before(&self) -> Result<String, CertificateError> {
        let x509 = DerCertificate::extract_certificate(&self.der)?;
        x509.tbs_certificate
            .validity
            .not_before
            .to_rfc2822()
            .map_err(CertificateError::X509Error)
    }

    pub fn not_after(&self) -> Result<String, CertificateError> {
        let x509 = DerCertificate::extract_certificate(&self.der)?;
        x509.tbs_certificate
            .validity
            .not_after
            .to_rfc2822()
            .map_err(CertificateError::X509Error)
    }

    /// The serial number as upper-case hexadecimal digits
    pub fn serial_hex(&self) -> Result<String, CertificateError> {
        let x509 = DerCertificate::extract_certificate(&self.der)?;
        Ok(upper_hex(x509.tbs_certificate.raw_serial()))
    }

    /// The SHA-1 fingerprint of the DER encoding, as shown by most certificate viewers
    pub fn thumbprint(&self) -> String {
        upper_hex(Sha1::digest(&self.der).as_slice())
    }

    fn extract_certificate(der: &[u8]) -> Result<X509Certificate<'_>, CertificateError> {
        // The x509 error is wrapped into a `nom::Err`,
        // hence the string conversion to avoid a dependency on `nom`.
        let (remaining, x509) = X509Certificate::from_der(der)
            .map_err(|err| CertificateError::X509Error(err.to_string()))?;
        if !remaining.is_empty() {
            return Err(CertificateError::X509Error(format!(
                "{} unexpected bytes after the certificate",
                remaining.len()
            )));
        }
        Ok(x509)
    }
}

fn upper_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

#[derive(thiserror::Error, Debug)]
pub enum CertificateError {
    #[error("Cryptography related error")]
    CryptographyError(#[from] rcgen::Error),

    #[error("Fail to generate the RSA private key")]
    RsaKeyGeneration(#[from] rsa::Error),

    #[error("Fail to encode the private key as PKCS#8")]
    PrivateKeyEncoding(#[from] rsa::pkcs8::Error),

    #[error("PKCS#12 encoding error: {0}")]
    Pkcs12Error(#[from] p12_keystore::error::Error),

    #[error("Invalid validity period of {days} days: the certificate would expire beyond year 9999")]
    InvalidValidityPeriod { days: u32 },

    #[error("X509 file format error: {0}")]
    X509Error(String),
}
