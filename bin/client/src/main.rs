use boxoffice_api::ApiClient;
use boxoffice_client::commands::{self, Command};
use boxoffice_client::config::ClientConfig;
use boxoffice_client::error::ClientError;
use boxoffice_client::shell::Shell;
use boxoffice_session::SessionManager;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Book event tickets from the terminal.
#[derive(Debug, Parser)]
#[command(name = "boxoffice", version, about)]
struct Cli {
    /// Keep the session in memory only; nothing is read from or written to
    /// the credential file.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so command output stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let config = ClientConfig::from_env().map_err(|error| {
        tracing::error!(%error, "failed to load configuration");
        ClientError::Configuration {
            details: error.to_string(),
        }
    })?;
    let store = config.credential_store(cli.ephemeral)?;
    let api = ApiClient::new(&config.api).map_err(|error| {
        tracing::error!(%error, "failed to build HTTP client");
        ClientError::Configuration {
            details: "could not set up the HTTP client".to_string(),
        }
    })?;
    tracing::debug!(base_url = api.base_url(), "loaded configuration");

    let session = SessionManager::new(store, Arc::new(api.clone()));
    session.initialize();
    let mut shell = Shell::new(session, api);

    let result = match cli.command {
        Command::Interactive => {
            commands::interactive(&mut shell).await;
            Ok(())
        }
        command => commands::execute(&mut shell, command).await,
    };
    shell.session().shutdown();
    result
}
