//! CLI command execution.
//!
//! The chat commands are thin clients: conversation state lives in the data
//! directory and every turn goes through the proxy server.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::config::{ClientConfig, ServerConfig};
use crate::models::Role;
use crate::proxy::HttpProxy;
use crate::server;
use crate::session::{LoadOutcome, SessionController, SessionView, TurnOutcome};
use crate::storage::FileStore;

use super::args::{Cli, Commands};

/// A line typed into the interactive chat.
#[derive(Debug, PartialEq, Eq)]
enum ChatLine<'a> {
    Reset,
    Quota,
    History,
    Quit,
    Help,
    Message(&'a str),
}

impl<'a> ChatLine<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/reset" => Self::Reset,
            "/quota" => Self::Quota,
            "/history" => Self::History,
            "/quit" | "/exit" => Self::Quit,
            "/help" => Self::Help,
            _ => Self::Message(line),
        }
    }
}

pub async fn execute(cli: Cli) -> Result<()> {
    let Cli {
        proxy_url,
        data_dir,
        command,
        ..
    } = cli;
    let session = move || open_session(&ClientConfig::new(proxy_url, data_dir)?);

    match command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat(&session()?).await,
        Commands::Send { message } => send(&session()?, &message.join(" ")).await,
        Commands::History => history(&session()?).await,
        Commands::Reset => {
            session()?.reset()?;
            println!("Conversation cleared.");
            Ok(())
        }
        Commands::Quota => {
            print_quota(&session()?.view());
            Ok(())
        }
        Commands::Serve {
            port,
            upstream_url,
            api_key,
            model,
            instructions_file,
        } => {
            let config = ServerConfig::new(port, upstream_url, api_key, model, instructions_file)?;
            server::start_server(config).await
        }
    }
}

/// Build a controller over the data directory and the configured proxy.
fn open_session(config: &ClientConfig) -> Result<SessionController> {
    let store = FileStore::open_at(&config.data_dir).with_context(|| {
        format!(
            "Failed to open data directory {}",
            config.data_dir.display()
        )
    })?;
    debug!(dir = %store.dir().display(), proxy = %config.proxy_url, "opening session");

    let proxy = HttpProxy::new(config.proxy_url.clone());
    Ok(SessionController::new(Arc::new(store), Arc::new(proxy)))
}

/// Restore the stored conversation, reporting a failed restore without
/// aborting; the stored handle is still used for the next turn.
async fn restore(controller: &SessionController) -> Option<LoadOutcome> {
    match controller.load().await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            eprintln!("Could not restore the previous conversation: {e}");
            None
        }
    }
}

async fn chat(controller: &SessionController) -> Result<()> {
    if restore(controller).await == Some(LoadOutcome::Restored) {
        print_transcript(&controller.view());
    }
    println!("Type a message, or /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        match ChatLine::parse(&line) {
            ChatLine::Quit => break,
            ChatLine::Help => print_help(),
            ChatLine::Quota => print_quota(&controller.view()),
            ChatLine::History => print_transcript(&controller.view()),
            ChatLine::Reset => match controller.reset() {
                Ok(()) => println!("Conversation cleared."),
                Err(e) => eprintln!("Conversation cleared, but: {e}"),
            },
            ChatLine::Message(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                match controller.submit(text).await {
                    Ok(TurnOutcome::Replied { reply }) => println!("assistant> {reply}"),
                    Ok(TurnOutcome::Discarded) => {}
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }
    Ok(())
}

async fn send(controller: &SessionController, message: &str) -> Result<()> {
    restore(controller).await;

    match controller.submit(message).await? {
        TurnOutcome::Replied { reply } => println!("{reply}"),
        TurnOutcome::Discarded => {}
    }
    if let Some(error) = controller.view().error {
        eprintln!("{error}");
    }
    Ok(())
}

async fn history(controller: &SessionController) -> Result<()> {
    match controller.load().await? {
        LoadOutcome::Empty => println!("No stored conversation."),
        LoadOutcome::Restored | LoadOutcome::Discarded => print_transcript(&controller.view()),
    }
    Ok(())
}

fn prompt() -> Result<()> {
    print!("you> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

fn print_transcript(view: &SessionView) {
    for item in view.transcript.items() {
        let speaker = match item.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!("{speaker}> {}", item.text);
    }
    if let Some(reply) = &view.pending_reply {
        println!("assistant> {reply}");
    }
}

fn print_quota(view: &SessionView) {
    println!("{} requests left this hour.", view.remaining_requests);
}

fn print_help() {
    println!("Commands:");
    println!("  /history   Show the conversation so far");
    println!("  /quota     Show remaining requests this hour");
    println!("  /reset     Start a new conversation");
    println!("  /quit      Leave");
}
