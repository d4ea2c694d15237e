mod convert;
mod generate;
mod serve;
mod show;

pub use convert::ConvertCmd;
pub use generate::GenerateTestPfxCmd;
pub use generate::KeyType;
pub use serve::ServeCmd;
pub use show::ShowCertCmd;

use crate::command::BuildCommand;
use crate::command::Command;
use crate::config::Pfx2CerConfig;
use camino::Utf8PathBuf;
use clap::Parser;
use std::net::IpAddr;
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[clap(
    name = clap::crate_name!(),
    version = clap::crate_version!(),
    about = clap::crate_description!(),
    arg_required_else_help(true)
)]
pub struct Opt {
    /// Turn-on the DEBUG log level.
    ///
    /// If off only reports ERROR, WARN, and INFO
    /// If on also reports DEBUG
    #[clap(long, global = true)]
    pub debug: bool,

    /// Path to the configuration file
    ///
    /// [default: /etc/pfx2cer/pfx2cer.toml, ignored when missing]
    #[clap(long, global = true)]
    pub config_file: Option<Utf8PathBuf>,

    #[clap(subcommand)]
    pub cmd: Pfx2CerCli,
}

#[derive(clap::Subcommand, Debug)]
pub enum Pfx2CerCli {
    /// Extract the certificate of a PFX file into a DER encoded CER file
    Convert {
        /// The PFX file to convert
        pfx: Utf8PathBuf,

        /// The password protecting the PFX file
        #[clap(long, env = "PFX2CER_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,

        /// Where to write the certificate [default: the PFX path with a .cer extension]
        #[clap(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Show the content of a DER encoded certificate
    Show {
        /// The CER file to display
        cer: Utf8PathBuf,
    },

    /// Create a password-protected PFX file holding a new self-signed certificate
    GenerateTestPfx {
        /// Where to write the PFX file, that must not exist yet
        #[clap(long, short, default_value = "test.pfx")]
        output: Utf8PathBuf,

        /// The password protecting the PFX file
        #[clap(long, default_value = "test123")]
        password: String,

        /// The common name of the certificate subject
        #[clap(long, default_value = "Test Certificate")]
        common_name: String,

        /// The type of the private key
        #[clap(long, value_enum, default_value_t = KeyType::Rsa)]
        key_type: KeyType,

        /// The size in bits of an RSA key
        #[clap(long, default_value_t = 2048)]
        key_size: usize,

        /// How many days the certificate is valid
        #[clap(long, default_value_t = 365)]
        days: u32,
    },

    /// Serve PFX conversion requests over HTTP until interrupted
    Serve {
        /// The address to listen on [default: http.bind_address]
        #[clap(long)]
        bind: Option<IpAddr>,

        /// The port to listen on [default: http.port]
        #[clap(long)]
        port: Option<u16>,
    },
}

impl BuildCommand for Pfx2CerCli {
    fn build_command(self, config: &Pfx2CerConfig) -> Box<dyn Command> {
        match self {
            Pfx2CerCli::Convert {
                pfx,
                password,
                output,
            } => {
                let cer = output.unwrap_or_else(|| pfx.with_extension("cer"));
                ConvertCmd {
                    pfx_path: pfx,
                    cer_path: cer,
                    password: Zeroizing::new(password),
                }
                .into_boxed()
            }

            Pfx2CerCli::Show { cer } => ShowCertCmd { cert_path: cer }.into_boxed(),

            Pfx2CerCli::GenerateTestPfx {
                output,
                password,
                common_name,
                key_type,
                key_size,
                days,
            } => GenerateTestPfxCmd {
                pfx_path: output,
                password: Zeroizing::new(password),
                common_name,
                key_algorithm: key_type.with_size(key_size),
                validity_period_days: days,
            }
            .into_boxed(),

            Pfx2CerCli::Serve { bind, port } => {
                let mut settings = config.http.clone();
                if let Some(bind) = bind {
                    settings.bind_address = bind;
                }
                if let Some(port) = port {
                    settings.port = port;
                }
                ServeCmd { settings }.into_boxed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfx_certificate::self_signed::KeyAlgorithm;

    fn build(args: &[&str], config: &Pfx2CerConfig) -> Box<dyn Command> {
        let opt = Opt::try_parse_from(args).unwrap();
        opt.cmd.build_command(config)
    }

    #[test]
    fn the_cer_file_defaults_to_the_pfx_path_with_a_cer_extension() {
        let opt = Opt::try_parse_from(["pfx2cer", "convert", "/tmp/device.pfx"]).unwrap();

        let Pfx2CerCli::Convert { pfx, output, .. } = opt.cmd else {
            panic!("unexpected sub-command")
        };
        assert_eq!(pfx, "/tmp/device.pfx");
        assert_eq!(output, None);

        let cmd = build(&["pfx2cer", "convert", "/tmp/device.pfx"], &Pfx2CerConfig::default());
        assert_eq!(
            cmd.description(),
            "convert /tmp/device.pfx into /tmp/device.cer"
        );
    }

    #[test]
    fn the_cer_file_can_be_given() {
        let cmd = build(
            &["pfx2cer", "convert", "device.pfx", "--output", "out/cert.der"],
            &Pfx2CerConfig::default(),
        );

        assert_eq!(cmd.description(), "convert device.pfx into out/cert.der");
    }

    #[test]
    fn generator_defaults() {
        let opt = Opt::try_parse_from(["pfx2cer", "generate-test-pfx"]).unwrap();

        let Pfx2CerCli::GenerateTestPfx {
            output,
            password,
            common_name,
            key_type,
            key_size,
            days,
        } = opt.cmd
        else {
            panic!("unexpected sub-command")
        };
        assert_eq!(output, "test.pfx");
        assert_eq!(password, "test123");
        assert_eq!(common_name, "Test Certificate");
        assert_eq!(key_type.with_size(key_size), KeyAlgorithm::Rsa { bits: 2048 });
        assert_eq!(days, 365);
    }

    #[test]
    fn an_ecdsa_key_ignores_the_key_size() {
        let opt = Opt::try_parse_from([
            "pfx2cer",
            "generate-test-pfx",
            "--key-type",
            "ecdsa",
            "--key-size",
            "4096",
        ])
        .unwrap();

        let Pfx2CerCli::GenerateTestPfx {
            key_type, key_size, ..
        } = opt.cmd
        else {
            panic!("unexpected sub-command")
        };
        assert_eq!(key_type.with_size(key_size), KeyAlgorithm::EcdsaP256);
    }

    #[test]
    fn serve_options_override_the_config_file() {
        let config = Pfx2CerConfig::default();

        let cmd = build(&["pfx2cer", "serve", "--port", "9000"], &config);
        assert_eq!(cmd.description(), "serve PFX conversions on 127.0.0.1:9000");

        let cmd = build(&["pfx2cer", "serve", "--bind", "0.0.0.0"], &config);
        assert_eq!(cmd.description(), "serve PFX conversions on 0.0.0.0:8000");
    }

    #[test]
    fn global_flags_are_accepted_after_the_sub_command() {
        let opt = Opt::try_parse_from([
            "pfx2cer",
            "show",
            "cert.cer",
            "--debug",
            "--config-file",
            "/tmp/pfx2cer.toml",
        ])
        .unwrap();

        assert!(opt.debug);
        assert_eq!(
            opt.config_file,
            Some(Utf8PathBuf::from("/tmp/pfx2cer.toml"))
        );
    }
}
