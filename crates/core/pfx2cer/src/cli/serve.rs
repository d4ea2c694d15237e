use crate::command::Command;
use crate::config::HttpSettings;
use crate::http_server;

/// Serve PFX conversion requests over HTTP
pub struct ServeCmd {
    pub settings: HttpSettings,
}

#[async_trait::async_trait]
impl Command for ServeCmd {
    fn description(&self) -> String {
        format!(
            "serve PFX conversions on {}:{}",
            self.settings.bind_address, self.settings.port
        )
    }

    async fn execute(&self) -> anyhow::Result<()> {
        http_server::serve(self.settings.clone()).await
    }
}
