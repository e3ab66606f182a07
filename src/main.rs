use std::net::{Ipv4Addr, SocketAddr};

use agent_relay_chat::adapter::build_adapter;
use agent_relay_chat::client::{self, PollPolicy};
use agent_relay_chat::config::{self, AdapterKind, AppConfig};
use agent_relay_chat::server::{self, RelayContext};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(
    name = "agent-relay-chat",
    version,
    about = "Web relay between a chat UI and a conversational-agent backend"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
    /// Which agent adapter answers messages
    #[arg(long, value_enum)]
    adapter: Option<AdapterKind>,
    /// Base URL of the agent backend's direct-client API
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the HTTP relay (default)
    Serve,
    /// Chat from the terminal with a running relay
    Chat {
        #[arg(long, default_value = "http://127.0.0.1:8080", value_name = "URL")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match &cli.mode {
        Some(Mode::Chat { url }) => client::run_terminal_chat(url, PollPolicy::default()).await,
        Some(Mode::Serve) | None => run_server(&cli).await,
    }
}

async fn run_server(cli: &Cli) -> anyhow::Result<()> {
    let app_config = resolve_config(cli);
    app_config.warn_missing_backend();

    let adapter = build_adapter(&app_config);
    log::info!("Using `{}` agent adapter", adapter.name());

    let context = RelayContext::new(adapter, app_config.relay.clone());
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, app_config.port));
    server::serve(context, addr).await
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut app_config = AppConfig::load(&cli.config);
    if let Some(port) = cli.port {
        app_config.port = port;
    }
    if let Some(kind) = cli.adapter {
        app_config.adapter = kind;
    }
    if let Some(url) = &cli.backend_url {
        app_config.backend.url = Some(url.clone());
    }
    app_config
}
