//! Command-line interface definition for SSO Bridge
//!
//! This module defines the CLI structure using clap's derive API. Running
//! without a subcommand is the same as `serve`.

use clap::{Parser, Subcommand};

/// SSO Bridge - Allaccess single-sign-on adapter
///
/// Brokers logins with the Allaccess identity provider and issues
/// short-lived session tokens for partner sites.
#[derive(Parser, Debug, Clone)]
#[command(name = "ssobridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for SSO Bridge
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the redirect-URL/platform candidates the login flow will try
    Candidates {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Verify a session token with the configured secret and print its claims
    VerifyToken {
        /// Session token to verify
        token: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run, defaulting to `serve`.
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Serve { port: None })
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert_eq!(cli.command(), Commands::Serve { port: None });
    }

    #[test]
    fn test_cli_parse_without_subcommand_serves() {
        let cli = Cli::try_parse_from(["ssobridge"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.command(), Commands::Serve { port: None });
    }

    #[test]
    fn test_cli_parse_serve_with_port() {
        let cli = Cli::try_parse_from(["ssobridge", "serve", "--port", "8080"]).unwrap();
        assert_eq!(cli.command(), Commands::Serve { port: Some(8080) });
    }

    #[test]
    fn test_cli_parse_candidates_json() {
        let cli = Cli::try_parse_from(["ssobridge", "candidates", "--json"]).unwrap();
        assert_eq!(cli.command(), Commands::Candidates { json: true });
    }

    #[test]
    fn test_cli_parse_verify_token() {
        let cli = Cli::try_parse_from(["ssobridge", "verify-token", "abc.def.ghi"]).unwrap();
        assert_eq!(
            cli.command(),
            Commands::VerifyToken {
                token: "abc.def.ghi".to_string()
            }
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ssobridge", "serve", "--json-logs", "-v"]).unwrap();
        assert!(cli.json_logs);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_rejects_invalid_port() {
        assert!(Cli::try_parse_from(["ssobridge", "serve", "--port", "99999"]).is_err());
    }

    #[test]
    fn test_cli_custom_config_path() {
        let cli = Cli::try_parse_from(["ssobridge", "--config", "/etc/sso.yaml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/etc/sso.yaml"));
    }
}
