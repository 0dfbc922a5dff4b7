//! SSO Bridge - Allaccess single-sign-on adapter
//!
//! Main entry point for the ssobridge binary.

use anyhow::Result;

use ssobridge::cli::{Cli, Commands};
use ssobridge::commands;
use ssobridge::config::Config;
use ssobridge::logging;
use ssobridge::server;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    logging::init_logging(&config.logging)?;

    match cli.command() {
        Commands::Serve { .. } => {
            config.validate()?;
            tracing::info!("Starting SSO bridge");
            server::serve(config).await
        }
        Commands::Candidates { json } => {
            let mut stdout = std::io::stdout().lock();
            commands::print_candidates(&config, json, &mut stdout)
        }
        Commands::VerifyToken { token } => {
            let mut stdout = std::io::stdout().lock();
            commands::verify_token(&config, &token, &mut stdout)
        }
    }
}
