//! Serve command handler.

use crate::app::App;
use crate::server;
use clap::Args;
use docqa_core::config::AppConfig;
use std::sync::Arc;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default: server.bind, then 127.0.0.1:8000)
    #[arg(long, env = "DOCQA_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let bind = self.bind.as_deref().unwrap_or(&config.server.bind);
        let app = Arc::new(App::from_config(config)?);

        server::run_server(app, bind).await
    }
}
