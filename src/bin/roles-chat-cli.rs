//! Terminal chat client
//!
//! Pick a persona, then chat with it through the relay. Without a relay
//! (`ROLES_CHAT_DEMO=1`) replies come from the demo backend.
//!
//! Commands while chatting: `/back` returns to role selection, `/usage`
//! prints token usage and estimated cost, `/models` lists models. `/quit`
//! exits from anywhere.

use chrono::Local;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roles_chat::completion::{CompletionBackend, MockBackend, RelayClient};
use roles_chat::config::ClientConfig;
use roles_chat::conversation::{Sender, Turn};
use roles_chat::roles::{self, Role};
use roles_chat::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roles_chat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let backend: Box<dyn CompletionBackend> = match config.relay_url {
        Some(ref url) => {
            let mut client = RelayClient::new(url.clone());
            if let Some(ref token) = config.access_token {
                client = client.with_access_token(token.expose());
            }
            tracing::info!("Using relay at {}", client.url());
            Box::new(client)
        }
        None => {
            println!("Demo mode: replies are canned.");
            Box::new(MockBackend::new())
        }
    };

    if config.relay_url.is_some() && !backend.check_connection().await {
        println!("Warning: the relay did not accept the connection check. Replies may fail.");
    }

    let mut session = Session::with_options(config.options);
    let mut printed = 0;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if session.active_role().is_none() {
            print_catalog();
            prompt("Pick a role: ").await?;
        } else {
            prompt("> ").await?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        let Some(role) = session.active_role() else {
            match pick_role(input) {
                Selection::Quit => break,
                Selection::Role(role) => {
                    session.start(role);
                    printed = print_new_turns(&session, role.name, 0);
                }
                Selection::Unknown => println!("Unknown role: {}", input),
            }
            continue;
        };

        match Command::parse(input) {
            Command::Quit => break,
            Command::Back => {
                session.reset();
                printed = 0;
            }
            Command::Usage => {
                let usage = session.usage_total();
                println!("{}", usage.summary());
                println!(
                    "Estimated cost: ${:.4}",
                    usage.estimate_cost(&session.options().model)
                );
            }
            Command::Models => {
                for model in backend.available_models().await {
                    println!("  {}", model);
                }
            }
            Command::Say(text) => {
                session.send(text, backend.as_ref()).await;
                printed = print_new_turns(&session, role.name, printed);
            }
        }
    }

    Ok(())
}

fn print_catalog() {
    println!();
    for (i, role) in roles::list_roles().iter().enumerate() {
        println!("{}. {} ({}) - {}", i + 1, role.name, role.id, role.description);
    }
}

#[derive(Debug, PartialEq)]
enum Selection {
    Role(&'static Role),
    Quit,
    Unknown,
}

/// Accepts a 1-based catalog number or a role id
fn pick_role(input: &str) -> Selection {
    if input == "/quit" {
        return Selection::Quit;
    }
    let role = match input.parse::<usize>() {
        Ok(n) => n.checked_sub(1).and_then(|i| roles::list_roles().get(i)),
        Err(_) => roles::select_role(input).ok(),
    };
    role.map_or(Selection::Unknown, Selection::Role)
}

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Quit,
    Back,
    Usage,
    Models,
    Say(&'a str),
}

impl<'a> Command<'a> {
    fn parse(input: &'a str) -> Self {
        match input {
            "/quit" => Command::Quit,
            "/back" => Command::Back,
            "/usage" => Command::Usage,
            "/models" => Command::Models,
            text => Command::Say(text),
        }
    }
}

fn print_new_turns(session: &Session, assistant_name: &str, from: usize) -> usize {
    let turns = session.turns();
    for turn in turns.iter().skip(from) {
        print_turn(turn, assistant_name);
    }
    turns.len()
}

fn print_turn(turn: &Turn, assistant_name: &str) {
    let time = turn.timestamp.with_timezone(&Local).format("%H:%M");
    let who = match turn.sender {
        Sender::User => "You",
        Sender::Assistant => assistant_name,
    };
    println!("[{}] {}: {}", time, who, turn.content);
}

async fn prompt(text: &str) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use roles_chat::roles::RoleId;

    #[test]
    fn test_quit_during_role_selection() {
        assert_eq!(pick_role("/quit"), Selection::Quit);
    }

    #[test]
    fn test_pick_role() {
        assert_eq!(pick_role("3"), Selection::Role(Role::get(RoleId::Tutor)));
        assert_eq!(pick_role("developer"), Selection::Role(Role::get(RoleId::Developer)));
        assert_eq!(pick_role("0"), Selection::Unknown);
        assert_eq!(pick_role("7"), Selection::Unknown);
        assert_eq!(pick_role("/back"), Selection::Unknown);
    }

    #[test]
    fn test_chat_commands() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/back"), Command::Back);
        assert_eq!(Command::parse("/usage"), Command::Usage);
        assert_eq!(Command::parse("/models"), Command::Models);
        assert_eq!(Command::parse("hello"), Command::Say("hello"));
    }
}
