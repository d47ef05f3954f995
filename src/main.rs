use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use scim_graph_bridge::logging::init_tracing;
use scim_graph_bridge::{build_router, AppConfig, BackendFactory};

#[derive(Parser, Debug)]
#[command(name = "scim-graph-bridge")]
#[command(about = "SCIM 2.0 PATCH bridge to a Graph-style directory")]
struct Args {
    /// Configuration file path (default: config.yaml)
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides config file)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (mut app_config, using_defaults) =
        if args.config == "config.yaml" && !std::path::Path::new("config.yaml").exists() {
            (AppConfig::default_config(), true)
        } else {
            let config = AppConfig::load_from_file(&args.config)
                .map_err(|e| format!("Failed to load configuration: {}", e))?;
            (config, false)
        };

    if let Some(port) = args.port {
        app_config.server.port = port;
    }
    if let Some(host) = args.host {
        app_config.server.host = host;
    }

    init_tracing(&app_config.logging);
    if using_defaults {
        warn!("no config.yaml found, using an empty in-memory directory");
    }

    let directory = BackendFactory::create(&app_config.directory).await?;
    let app_config = Arc::new(app_config);
    let app = build_router(directory, app_config.clone());

    let host: std::net::IpAddr = app_config.server.host.parse().unwrap_or_else(|_| {
        warn!(host = %app_config.server.host, "invalid host address, using 127.0.0.1");
        [127, 0, 0, 1].into()
    });
    let addr = SocketAddr::from((host, app_config.server.port));
    info!(
        %addr,
        base_path = %app_config.server.base_path,
        directory = %app_config.directory.directory_type,
        "SCIM bridge listening"
    );

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
