use anyhow::{Context, Result};
use brake_core::conversation::ConversationManager;
use brake_core::storage::{KeyValueStore, keys};
use brake_infrastructure::{
    AppConfig, AuthClient, FileKeyValueStore, GraphqlConversationClient, HttpReplyGenerator,
    RegisterRequest, StoredCredentialProvider, TrackPreviewClient,
};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod chat;

#[derive(Parser)]
#[command(name = "brake")]
#[command(about = "Take a Brake - conversation companion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the companion (default command)
    Chat {
        /// Start a new conversation instead of continuing the last one
        #[arg(long)]
        new: bool,
    },
    /// Log in and store the session token
    Login {
        email: String,
    },
    /// Register a new account
    Register {
        nombre: String,
        apellido: String,
        email: String,
    },
    /// List saved conversations
    History,
}

fn base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot find home directory")?;
    Ok(home.join(".brake"))
}

fn prompt_password() -> Result<String> {
    print!("Contraseña: ");
    io::stdout().flush().ok();
    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    Ok(password.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let base_dir = base_dir()?;
    let config = AppConfig::load(&base_dir)?;
    let store = Arc::new(FileKeyValueStore::new(&base_dir)?);

    match cli.command.unwrap_or(Commands::Chat { new: false }) {
        Commands::Chat { new } => {
            let manager = build_manager(&config, store)?;
            if new {
                manager.start().await?;
            } else {
                manager.restore().await?;
            }
            let previews = TrackPreviewClient::new(config.request_timeout());
            chat::ChatCli::new(manager, previews).run().await?;
        }
        Commands::Login { email } => {
            let password = prompt_password()?;
            let client = AuthClient::new(config.auth_url.as_str(), config.request_timeout())?;
            let token = client.login(&email, &password).await?;
            store.set(keys::AUTH_TOKEN, &token).await?;
            // A different account must not continue the previous one's
            // conversation.
            store.remove(keys::ACTIVE_CONVERSATION).await?;
            println!("Sesión iniciada.");
        }
        Commands::Register {
            nombre,
            apellido,
            email,
        } => {
            let password = prompt_password()?;
            let client = AuthClient::new(config.auth_url.as_str(), config.request_timeout())?;
            client
                .register(&RegisterRequest::new(nombre, apellido, email, password))
                .await?;
            println!("Registro exitoso. Por favor inicia sesión.");
        }
        Commands::History => {
            let manager = build_manager(&config, store)?;
            let conversations = manager.list_conversations().await?;
            if conversations.is_empty() {
                println!("No hay conversaciones guardadas.");
            }
            for conversation in conversations {
                let first = conversation
                    .messages
                    .first()
                    .map(|m| m.text.clone())
                    .unwrap_or_default();
                println!(
                    "{}  {}  {}",
                    conversation.id,
                    conversation.created_at.format("%Y-%m-%d %H:%M"),
                    first
                );
            }
        }
    }

    Ok(())
}

fn build_manager(
    config: &AppConfig,
    store: Arc<FileKeyValueStore>,
) -> Result<ConversationManager> {
    let generator = Arc::new(HttpReplyGenerator::new(
        config.generator_url.as_str(),
        config.request_timeout(),
    )?);
    let backend = Arc::new(GraphqlConversationClient::new(
        config.graphql_url.as_str(),
        config.request_timeout(),
    )?);
    let credentials = Arc::new(StoredCredentialProvider::new(store.clone()));
    Ok(ConversationManager::new(
        generator,
        backend.clone(),
        backend,
        credentials,
        store,
    ))
}
