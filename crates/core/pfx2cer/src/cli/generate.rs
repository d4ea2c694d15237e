use crate::command::Command;
use anyhow::Context;
use camino::Utf8PathBuf;
use pfx_certificate::self_signed::new_selfsigned_pfx;
use pfx_certificate::self_signed::KeyAlgorithm;
use pfx_certificate::self_signed::SelfSignedPfxConfig;
use tokio::io::AsyncWriteExt;
use tracing::info;
use zeroize::Zeroizing;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    Ecdsa,
}

impl KeyType {
    /// The key algorithm for this type, the size being only meaningful for RSA keys
    pub fn with_size(self, bits: usize) -> KeyAlgorithm {
        match self {
            KeyType::Rsa => KeyAlgorithm::Rsa { bits },
            KeyType::Ecdsa => KeyAlgorithm::EcdsaP256,
        }
    }
}

/// Create a PFX file holding a new self-signed certificate and its private key
pub struct GenerateTestPfxCmd {
    pub pfx_path: Utf8PathBuf,
    pub password: Zeroizing<String>,
    pub common_name: String,
    pub key_algorithm: KeyAlgorithm,
    pub validity_period_days: u32,
}

#[async_trait::async_trait]
impl Command for GenerateTestPfxCmd {
    fn description(&self) -> String {
        format!("generate the test PFX file {}", self.pfx_path)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let config = SelfSignedPfxConfig {
            common_name: self.common_name.clone(),
            key_algorithm: self.key_algorithm,
            validity_period_days: self.validity_period_days,
        };
        let password = self.password.clone();

        // RSA key generation takes a while
        let pfx = tokio::task::spawn_blocking(move || new_selfsigned_pfx(&config, &password))
            .await
            .context("generating the certificate")??;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.pfx_path)
            .await
            .with_context(|| format!("creating {}", self.pfx_path))?;
        file.write_all(&pfx)
            .await
            .with_context(|| format!("writing {}", self.pfx_path))?;
        file.flush().await?;
        info!(path = %self.pfx_path, algorithm = ?self.key_algorithm, "Test PFX file created");

        let mut stdout = tokio::io::stdout();
        let _ = stdout
            .write_all(
                format!(
                    "Test certificate created: {}\nPassword: {}\n",
                    self.pfx_path,
                    self.password.as_str()
                )
                .as_bytes(),
            )
            .await;
        let _ = stdout.flush().await;
        Ok(())
    }
}
