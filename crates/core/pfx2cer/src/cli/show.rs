use crate::command::Command;
use anyhow::Context;
use camino::Utf8PathBuf;
use pfx_certificate::DerCertificate;
use tokio::io::AsyncWriteExt;

macro_rules! print_async {
    ($out:expr, $fmt:literal) => (
        let _ = $out.write_all($fmt.as_bytes()).await;
    );
    ($out:expr, $fmt:literal, $($arg:tt)*) => (
        let _ = $out.write_all(format!($fmt, $($arg)*).as_bytes()).await;
    );
}

/// Show the content of a DER encoded certificate
pub struct ShowCertCmd {
    pub cert_path: Utf8PathBuf,
}

#[async_trait::async_trait]
impl Command for ShowCertCmd {
    fn description(&self) -> String {
        format!("show the certificate {}", self.cert_path)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let cert = self.read_certificate().await?;

        let mut stdout = tokio::io::stdout();
        print_async!(stdout, "Certificate:   {}\n", self.cert_path);
        print_async!(stdout, "Subject:       {}\n", cert.subject()?);
        print_async!(stdout, "Issuer:        {}\n", cert.issuer()?);
        print_async!(stdout, "Valid from:    {}\n", cert.not_before()?);
        print_async!(stdout, "Valid until:   {}\n", cert.not_after()?);
        print_async!(stdout, "Serial number: 0x{}\n", cert.serial_hex()?);
        print_async!(stdout, "Thumbprint:    {}\n", cert.thumbprint());
        let _ = stdout.flush().await;

        Ok(())
    }
}

impl ShowCertCmd {
    async fn read_certificate(&self) -> anyhow::Result<DerCertificate> {
        let cert_path = &self.cert_path;
        let der = tokio::fs::read(cert_path)
            .await
            .with_context(|| format!("reading certificate from {cert_path}"))?;
        let cert = DerCertificate::from_der(der)
            .with_context(|| format!("decoding certificate from {cert_path}"))?;
        Ok(cert)
    }
}
