//! deposit-gate CLI
//!
//! Run modes:
//!   deposit-gate serve [--port <port>]   - Start the REST API
//!   deposit-gate check-config            - Print the resolved configuration

use clap::{Parser, Subcommand};
use deposit_gate::api::{start_server, AppState};
use deposit_gate::common::{init_from_config, log_system_event, GatewayConfig, GatewayError, LogLevel};
use serde_json::json;

#[derive(Parser)]
#[command(name = "deposit-gate")]
#[command(about = "Deposit verification, payment intent and signup profile API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Listen port (overrides API_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load configuration from the environment and print a summary
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = GatewayConfig::from_env()?;

    match cli.command {
        Commands::Serve { port } => {
            init_from_config(&config)?;
            config.print_summary();

            if let Err(e) = serve(&config, port.unwrap_or(config.port)).await {
                log_system_event(
                    LogLevel::Error,
                    "server stopped",
                    json!({}),
                    Some((e.error_code(), &e.to_string())),
                );
                return Err(e);
            }
        }
        Commands::CheckConfig => {
            config.print_summary();
        }
    }

    Ok(())
}

async fn serve(config: &GatewayConfig, port: u16) -> Result<(), GatewayError> {
    let state = AppState::from_config(config)?;

    let collaborators = [
        ("exchange", state.verifier.as_ref().err()),
        ("payments", state.payments.as_ref().err()),
        ("profiles", state.profiles.as_ref().err()),
    ];
    for (name, err) in collaborators {
        if let Some(e) = err {
            log_system_event(
                LogLevel::Warn,
                "collaborator disabled",
                json!({ "collaborator": name }),
                Some(("CONFIG_ERROR", &e.to_string())),
            );
        }
    }

    log_system_event(
        LogLevel::Info,
        "starting server",
        json!({ "port": port, "environment": format!("{:?}", config.environment).to_lowercase() }),
        None,
    );

    start_server(state.shared(), port).await?;
    Ok(())
}
