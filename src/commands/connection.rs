use crate::{
    client::ConsoleClient,
    models::connection::{ConnectionConfig, DEFAULT_PORT, DEFAULT_REGION},
};
use anyhow::Result;
use clap::Parser;
use console::style;

#[derive(Parser)]
pub struct ConnectCli {
    /// Storage server host name, without scheme
    pub endpoint: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "S3_CONSOLE_ACCESS_KEY")]
    pub access_key: String,

    #[arg(long, env = "S3_CONSOLE_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Talk HTTPS to the storage server
    #[arg(long)]
    pub tls: bool,

    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,
}

impl ConnectCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let config = ConnectionConfig {
            endpoint: self.endpoint.clone(),
            port: self.port,
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            use_tls: self.tls,
            region: self.region.clone(),
        };

        let response = client.connect(&config).await?;
        println!("{} {}", style("✓").green(), response.message);
        println!("  session {}", style(response.session_id).dim());
        Ok(())
    }
}

#[derive(Parser)]
pub struct DisconnectCli;

impl DisconnectCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let response = client.disconnect().await?;
        println!("{} {}", style("✓").green(), response.message);
        Ok(())
    }
}

#[derive(Parser)]
pub struct StatusCli;

impl StatusCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let status = client.status().await?;
        match status.config {
            Some(config) if status.connected => {
                let scheme = if config.use_tls { "https" } else { "http" };
                println!(
                    "{} {}://{}:{} ({})",
                    style("connected").green(),
                    scheme,
                    config.endpoint,
                    config.port,
                    config.region
                );
                if let Some(at) = status.connected_at {
                    println!("  since {}", at.to_rfc3339());
                }
            }
            _ => println!("{}", style("not connected").yellow()),
        }
        Ok(())
    }
}
