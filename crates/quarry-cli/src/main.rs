use anyhow::Result;
use quarry::Config;
use quarry_cli::Invocation;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let invocation = Invocation::parse()?;
    let config = Config::from_env()?;
    let output = quarry_cli::run(invocation, config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
