use crate::command::Command;
use anyhow::Context;
use camino::Utf8PathBuf;
use pfx_certificate::convert_pfx_to_cer_async;
use pfx_certificate::DerCertificate;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use zeroize::Zeroizing;

/// Extract the certificate of a PFX file into a CER file
pub struct ConvertCmd {
    pub pfx_path: Utf8PathBuf,
    pub cer_path: Utf8PathBuf,
    pub password: Zeroizing<String>,
}

#[async_trait::async_trait]
impl Command for ConvertCmd {
    fn description(&self) -> String {
        format!("convert {} into {}", self.pfx_path, self.cer_path)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let pfx = tokio::fs::read(&self.pfx_path)
            .await
            .with_context(|| format!("reading PFX file {}", self.pfx_path))?;
        self.check_output_is_not_input().await?;
        debug!(path = %self.pfx_path, size = pfx.len(), "PFX file loaded");

        let cer = convert_pfx_to_cer_async(pfx, self.password.clone()).await?;
        let cert = DerCertificate::from_der(cer)?;

        tokio::fs::write(&self.cer_path, cert.as_der())
            .await
            .with_context(|| format!("writing certificate to {}", self.cer_path))?;

        let mut stdout = tokio::io::stdout();
        let _ = stdout
            .write_all(
                format!(
                    "Certificate written to {}\nSubject:    {}\nThumbprint: {}\n",
                    self.cer_path,
                    cert.subject()?,
                    cert.thumbprint()
                )
                .as_bytes(),
            )
            .await;
        let _ = stdout.flush().await;
        Ok(())
    }
}

impl ConvertCmd {
    async fn check_output_is_not_input(&self) -> anyhow::Result<()> {
        let pfx_path = tokio::fs::canonicalize(&self.pfx_path)
            .await
            .with_context(|| format!("resolving {}", self.pfx_path))?;
        // An output file that doesn't exist yet cannot be the input
        if let Ok(cer_path) = tokio::fs::canonicalize(&self.cer_path).await {
            if cer_path == pfx_path {
                anyhow::bail!(
                    "the output file {} would overwrite the PFX file",
                    self.cer_path
                );
            }
        }
        Ok(())
    }
}
