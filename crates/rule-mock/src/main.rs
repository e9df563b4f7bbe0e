use anyhow::Context;
use clap::Parser;
use rule_mock::{Config, TestServer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rule-mock", version, about = "Serve ordered HTTP mock rules from a config file")]
struct Args {
    /// Rules file (YAML, or JSON with a .json extension)
    #[arg(short, long, env = "RULE_MOCK_CONFIG")]
    config: Option<PathBuf>,
    /// Port to listen on, overriding the config file
    #[arg(short, long, env = "RULE_MOCK_PORT")]
    port: Option<u16>,
    /// Interface to bind, overriding the config file
    #[arg(long, env = "RULE_MOCK_HOST")]
    host: Option<String>,
    /// Dispatch every path instead of only `/`
    #[arg(long)]
    catch_all: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if let Some(host) = args.host {
        config.listen.host = host;
    }
    config.catch_all |= args.catch_all;

    let server = TestServer::from_config(&config)?;
    info!("Loaded {} rules", server.rule_set().len());

    let handle = server.spawn().await?;
    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;
    Ok(())
}
