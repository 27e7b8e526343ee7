use clap::Subcommand;
use tokio_util::sync::CancellationToken;

use chat_sync_client::common::{Credentials, Message};
use chat_sync_client::conversation::{ConversationCache, HistoryState, Mutation};
use chat_sync_client::network::Gateway;
use chat_sync_client::routing::{Access, RouteGuard};
use chat_sync_client::session::auth;
use chat_sync_client::{SyncError, SyncResult};

#[derive(Subcommand, Clone, Debug)]
pub enum Mode {
    /// Create an account
    Register {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and remember the session token
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Print the conversation history
    History,
    /// Send a message and print the bot's reply
    Send { content: String },
}

pub async fn run(mode: Mode, gateway: Gateway) -> SyncResult<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted; cancelling request");
            on_interrupt.cancel();
        }
    });

    match mode {
        Mode::Register { username, password } => {
            let profile =
                auth::register(&gateway, &Credentials::new(username, password), &cancel).await?;
            println!("Created user {}", profile.username);
        }
        Mode::Login { username, password } => {
            auth::login(&gateway, &Credentials::new(username.clone(), password), &cancel).await?;
            println!("Logged in as {}", username.trim());
        }
        Mode::Logout => {
            auth::logout(&gateway)?;
            println!("Logged out");
        }
        Mode::History => {
            require_session(&gateway)?;
            let cache = ConversationCache::new(gateway);
            let messages = cache.fetch_history(&cancel).await?;
            if messages.is_empty() {
                println!("No messages yet.");
            }
            messages.iter().for_each(print_message);
        }
        Mode::Send { content } => {
            require_session(&gateway)?;
            let cache = ConversationCache::new(gateway);
            match cache.send_message(&content, &cancel).await? {
                Mutation::Skipped => println!("Nothing to send."),
                Mutation::Applied => {
                    let history = cache.snapshot();
                    match latest_exchange(&history) {
                        Ok(messages) => messages.iter().for_each(print_message),
                        Err(err) => {
                            eprintln!("Message sent, but the history could not be reloaded");
                            return Err(err);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn require_session(gateway: &Gateway) -> SyncResult<()> {
    match RouteGuard::resolve(gateway.session()) {
        Access::Allow => Ok(()),
        Access::DenyRedirect(_) => Err(SyncError::Unauthorized),
    }
}

/// The user's message and the bot reply at the end of a freshly fetched history.
fn latest_exchange(history: &HistoryState) -> SyncResult<&[Message]> {
    match history {
        HistoryState::Failed { error } => Err(error.clone()),
        history => {
            let messages = history.messages();
            Ok(&messages[messages.len().saturating_sub(2)..])
        }
    }
}

fn print_message(message: &Message) {
    let author = if message.is_from_user { "you" } else { "bot" };
    println!("#{} {author}: {}", message.id, message.content);
    if !message.buttons().is_empty() {
        println!("    [{}]", message.buttons().join("] ["));
    }
}
