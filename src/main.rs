use anyhow::Result;
use clap::Parser;
use gatehouse::cli::{dispatch, init_logging, CliArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&args.log_level, args.debug, args.log_format)?;
    dispatch(args).await
}
