use clap::Parser;
use capctl::{Config, telemetry};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Install rustls crypto provider before anything else that might build a TLS client
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Parse CLI args
    let args = capctl::config::Args::parse();

    // Load configuration
    let config = Config::load(&args)?;

    // If --validate flag is set, exit successfully after config validation
    if args.validate {
        println!("Configuration is valid.");
        return Ok(ExitCode::SUCCESS);
    }

    // Logs go to stderr so JSON output stays clean
    telemetry::init_telemetry(config.enable_otel_export)?;

    tracing::debug!("{:?}", args);

    let Some(command) = args.command else {
        anyhow::bail!("no command given; run with --help to see the available commands");
    };

    let code = match capctl::run(config, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            let (code, message) = capctl::failure_report(&err);
            eprintln!("Error: {message}");
            ExitCode::from(code)
        }
    };

    telemetry::shutdown_telemetry();
    Ok(code)
}
