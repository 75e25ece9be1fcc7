//! Interactive chat loop.
//!
//! A thin terminal front over `ConversationManager`: read a line, send the
//! exchange, print the reply (with emotion tag and any track preview
//! cards). All conversation state lives in the manager; this module only
//! renders.

use anyhow::Result;
use brake_core::BrakeError;
use brake_core::conversation::{ChatMessage, ConversationManager};
use brake_infrastructure::track_preview::{
    TrackPreviewClient, extract_track_links, strip_track_links,
};
use std::io::{self, Write};

/// Greeting shown at the top of a fresh conversation. Local only; it is
/// never persisted.
const GREETING: &str = "¡Hola! ¿En qué puedo ayudarte hoy?";

/// Interactive REPL over a conversation session.
pub struct ChatCli {
    manager: ConversationManager,
    previews: Option<TrackPreviewClient>,
}

impl ChatCli {
    /// Creates the REPL over `manager`.
    pub fn new(manager: ConversationManager, previews: Option<TrackPreviewClient>) -> Self {
        Self { manager, previews }
    }

    /// Runs the interactive loop.
    pub async fn run(&self) -> Result<()> {
        let snapshot = self.manager.snapshot().await;
        if snapshot.is_empty() {
            println!("{GREETING}");
        } else {
            println!("(continuando conversación guardada)");
            for message in &snapshot {
                self.render_message(message).await;
            }
        }
        println!("(escribe 'salir' para terminar, 'nueva' para empezar de cero)");
        println!();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("> ");
            stdout.flush().ok();

            let mut input = String::new();
            if stdin.read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            match input {
                "" => continue,
                "salir" | "exit" => break,
                "nueva" | "new" => {
                    self.manager.start().await?;
                    println!("{GREETING}");
                    continue;
                }
                _ => {}
            }

            match self.manager.send_exchange(input).await {
                Ok(exchange) => self.render_message(&exchange.assistant).await,
                Err(err) => report_error(&err),
            }
        }

        Ok(())
    }

    async fn render_message(&self, message: &ChatMessage) {
        let links = extract_track_links(&message.text);
        let prose = if links.is_empty() {
            message.text.clone()
        } else {
            strip_track_links(&message.text)
        };

        if message.emotion != brake_core::conversation::DEFAULT_EMOTION {
            println!("[{}] {prose}", message.emotion);
        } else {
            println!("{prose}");
        }

        for link in links {
            self.render_track_card(&link).await;
        }
    }

    async fn render_track_card(&self, link: &str) {
        let metadata = match &self.previews {
            Some(client) => client.lookup(link).await,
            None => None,
        };
        match metadata {
            Some(meta) => println!("  ♪ {} ({}): {link}", meta.title, meta.provider),
            None => println!("  ♪ {link}"),
        }
    }
}

fn report_error(err: &BrakeError) {
    match err {
        BrakeError::Generation { .. } => eprintln!("No se pudo obtener una respuesta."),
        BrakeError::AuthenticationMissing => {
            eprintln!("Inicia sesión primero: brake login <email>")
        }
        BrakeError::Persistence { .. } => eprintln!("No se pudo guardar la conversación."),
        other => eprintln!("Error: {other}"),
    }
}
