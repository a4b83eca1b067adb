use anyhow::Result;

use super::runtime::LoadedConfig;
use crate::server;

/// Builds the full server state, without binding, so every limiter, the
/// identity provider and the seed data are checked exactly as `serve` would.
pub async fn cmd_check_config(loaded: &LoadedConfig) -> Result<()> {
    let parts = server::build(&loaded.config).await?;
    let source = if loaded.from_file {
        loaded.path.display().to_string()
    } else {
        format!("defaults ({} not found)", loaded.path.display())
    };
    println!("configuration OK: {source}");
    println!(
        "  rate limiters: {}",
        parts.admission.pipeline().limiters().len()
    );
    println!("  api prefixes:  {}", loaded.config.server.api_prefixes.join(", "));
    println!("  auth provider: {}", loaded.config.auth.provider);
    println!(
        "  seed:          {} users, {} roles, {} groups, {} bindings",
        parts.seed.users, parts.seed.roles, parts.seed.groups, parts.seed.bindings
    );
    Ok(())
}
