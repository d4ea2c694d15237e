use crate::config::Pfx2CerConfig;

/// A trait to be implemented by all pfx2cer sub-commands.
///
/// A command is built from the parsed command line arguments and the configuration,
/// then executed by `main` which reports any error as `failed to <description>`.
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Display that command to the user, telling what will be done.
    ///
    /// This description is displayed to the end user in case of an error, to give the context of that error.
    fn description(&self) -> String;

    /// Run this command.
    async fn execute(&self) -> anyhow::Result<()>;

    fn into_boxed(self) -> Box<dyn Command>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

pub trait BuildCommand {
    fn build_command(self, config: &Pfx2CerConfig) -> Box<dyn Command>;
}
