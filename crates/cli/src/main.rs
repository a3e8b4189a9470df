//! Metra CLI - Database migrations, staff users and the dashboard client.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront, admin, or all database migrations
//! metra-cli migrate storefront
//! metra-cli migrate admin
//! metra-cli migrate all
//!
//! # Create a staff user
//! metra-cli admin create -u alice -e alice@example.com -p 'a long passphrase'
//!
//! # Dashboard
//! metra-cli dashboard login -u alice -p 'a long passphrase'
//! metra-cli dashboard overview --days 30
//! metra-cli dashboard requests
//! metra-cli dashboard analytics
//! metra-cli dashboard upload ./release.zip --title "Spring release" --version 1.2.0
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create staff users
//! - `dashboard` - Talk to the admin API

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use metra_cli::ApiClient;
use metra_cli::client::DEFAULT_API_URL;
use metra_core::UpdateType;
use metra_core::analytics::DEFAULT_SALES_DAYS;

mod commands;

#[derive(Parser)]
#[command(name = "metra-cli")]
#[command(author, version, about = "Metra CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Manage staff users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Admin dashboard client
    Dashboard {
        /// Admin API address
        #[arg(long, env = "METRA_API_URL", default_value = DEFAULT_API_URL)]
        url: String,

        /// API token from `dashboard login`
        #[arg(long, env = "METRA_API_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[command(subcommand)]
        action: DashboardAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
    /// Run admin database migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new staff user
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "METRA_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum DashboardAction {
    /// Exchange credentials for an API token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "METRA_API_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sales stats, top products and sales by category
    Overview {
        /// Trailing window in days
        #[arg(long, default_value_t = DEFAULT_SALES_DAYS)]
        days: i64,
    },
    /// Customer requests
    Requests,
    /// Product analytics
    Analytics,
    /// Upload an update file
    Upload {
        file: PathBuf,

        /// Defaults to "Update <timestamp>"
        #[arg(long)]
        title: Option<String>,

        #[arg(long, default_value = "system")]
        update_type: UpdateType,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, default_value = "1.0.0")]
        version: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metra_cli=warn,metra_admin=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                password,
            } => {
                commands::admin::create_user(&username, &email, &password).await?;
            }
        },
        Commands::Dashboard { url, token, action } => {
            let client = ApiClient::new(&url, token.map(SecretString::from))?;
            let output = dashboard(&client, action).await?;
            #[allow(clippy::print_stdout)]
            {
                print!("{output}");
            }
        }
    }
    Ok(())
}

async fn dashboard(
    client: &ApiClient,
    action: DashboardAction,
) -> Result<String, metra_cli::ClientError> {
    use commands::dashboard;

    match action {
        DashboardAction::Login { username, password } => {
            dashboard::login(client, &username, &password)
                .await
                .map(|line| line + "\n")
        }
        DashboardAction::Overview { days } => dashboard::overview(client, days).await,
        DashboardAction::Requests => dashboard::requests(client).await,
        DashboardAction::Analytics => dashboard::analytics(client).await,
        DashboardAction::Upload {
            file,
            title,
            update_type,
            description,
            version,
        } => {
            dashboard::upload(
                client,
                dashboard::UploadArgs {
                    file: &file,
                    title,
                    update_type,
                    description,
                    version,
                },
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_upload_parses_update_type() {
        let cli = Cli::try_parse_from([
            "metra-cli",
            "dashboard",
            "--url",
            "http://admin.test",
            "upload",
            "release.zip",
            "--update-type",
            "security",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        let Commands::Dashboard { url, action, .. } = cli.command else {
            panic!("expected dashboard command");
        };
        assert_eq!(url, "http://admin.test");
        assert!(matches!(
            action,
            DashboardAction::Upload {
                update_type: UpdateType::Security,
                ..
            }
        ));
    }

    #[test]
    fn test_upload_rejects_unknown_update_type() {
        let result = Cli::try_parse_from([
            "metra-cli",
            "dashboard",
            "upload",
            "release.zip",
            "--update-type",
            "firmware",
        ]);
        assert!(result.is_err());
    }
}
