use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::config::GatehouseConfig;
use crate::server;

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen address, overrides server.address
    #[arg(long)]
    pub address: Option<IpAddr>,

    /// Listen port, overrides server.port
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn cmd_serve(args: ServeArgs, config: GatehouseConfig) -> Result<()> {
    let address = match args.address {
        Some(address) => address,
        None => config
            .server
            .address
            .parse()
            .with_context(|| format!("invalid server.address '{}'", config.server.address))?,
    };
    let addr = SocketAddr::new(address, args.port.unwrap_or(config.server.port));

    let parts = server::build(&config).await?;
    info!(
        rate_limiters = config.server.rate_limits.len(),
        auth_provider = %config.auth.provider,
        slow_request = %humantime::format_duration(config.server.slow_request()),
        "admission pipeline ready"
    );
    server::serve(parts, addr).await
}
