use clap::{Arg, Command};
use std::net::IpAddr;
use std::str::FromStr;
use tracing::info;

mod config;
mod error;
mod node;

use config::Config;
use error::GatewayError;
use node::Node;

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    tracing_subscriber::fmt::init();

    let matches = Command::new("shardgate")
        .version("0.1.0")
        .about("Gateway that shards file uploads across a pool of storage nodes")
        .arg(
            Arg::new("ip")
                .long("ip")
                .help("IP address to bind")
                .default_value("127.0.0.1"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .help("Port to listen on")
                .default_value("8080"),
        )
        .arg(
            Arg::new("chunk-count")
                .long("chunk-count")
                .help("Number of chunks each file is split into")
                .default_value("6"),
        )
        .arg(
            Arg::new("servers")
                .long("servers")
                .help("Comma-separated id=address storage server list")
                .required(false),
        )
        .arg(
            Arg::new("max-upload-size")
                .long("max-upload-size")
                .help("Maximum accepted upload size in bytes")
                .required(false),
        )
        .get_matches();

    info!("starting shardgate");

    let ip = IpAddr::from_str(matches.get_one::<String>("ip").unwrap())
        .map_err(|e| GatewayError::InvalidConfig(format!("invalid IP address: {e}")))?;

    let port = matches
        .get_one::<String>("port")
        .unwrap()
        .parse::<u16>()
        .map_err(|e| GatewayError::InvalidConfig(format!("invalid port: {e}")))?;

    let mut config = Config::new(ip, port);

    config.chunk_count = matches
        .get_one::<String>("chunk-count")
        .unwrap()
        .parse::<usize>()
        .map_err(|e| GatewayError::InvalidConfig(format!("invalid chunk count: {e}")))?;
    if config.chunk_count == 0 {
        return Err(GatewayError::InvalidConfig(
            "chunk count must be at least 1".to_string(),
        ));
    }

    if let Some(raw) = matches.get_one::<String>("servers") {
        config.servers = Config::parse_servers(raw).map_err(GatewayError::InvalidConfig)?;
    }

    if let Some(raw) = matches.get_one::<String>("max-upload-size") {
        config.max_upload_size = raw
            .parse::<u64>()
            .map_err(|e| GatewayError::InvalidConfig(format!("invalid max upload size: {e}")))?;
    }

    info!("node configuration: {:?}", config);

    let node = Node::new(config).await?;
    node.start().await?;

    Ok(())
}
