use anyhow::Result;
use clap::Args;
use gatehouse_request_info::RequestInfoFactory;

use super::output::{render, OutputFormat};
use crate::config::GatehouseConfig;

#[derive(Args, Clone)]
pub struct ClassifyArgs {
    /// HTTP method, e.g. GET
    pub method: String,

    /// Request path, e.g. /api/v1/namespaces/teamA/users
    pub path: String,

    /// Known API prefix (repeat for several); defaults to server.apiPrefixes
    #[arg(long = "prefix", value_name = "PREFIX")]
    pub prefixes: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,
}

pub fn cmd_classify(args: ClassifyArgs, config: &GatehouseConfig) -> Result<()> {
    let factory = if args.prefixes.is_empty() {
        RequestInfoFactory::new(config.server.api_prefixes.iter().cloned())
    } else {
        RequestInfoFactory::new(args.prefixes.iter().cloned())
    };
    let info = factory.classify(&args.method.to_uppercase(), &args.path);

    if let Some(rendered) = render(args.output, &info)? {
        println!("{rendered}");
        return Ok(());
    }

    println!("{} {}", args.method.to_uppercase(), info.path);
    if !info.is_resource_request {
        println!("  non-resource request (not authorized by role)");
        return Ok(());
    }
    println!("  prefix:      {}", info.api_prefix);
    println!("  version:     {}", info.api_version);
    println!("  namespace:   {}", display_or_dash(&info.namespace));
    println!("  resource:    {}", info.resource);
    println!("  subresource: {}", display_or_dash(&info.subresource));
    println!("  name:        {}", display_or_dash(&info.name));
    println!("  verb:        {}", display_or_dash(&info.verb));
    Ok(())
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
