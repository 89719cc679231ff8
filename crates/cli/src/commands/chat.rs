//! Conversation with the shopping assistant.
//!
//! In interactive mode, typing the number of a suggestion sends its reply
//! text. `/quit` or end of input leaves the session.

#![allow(clippy::print_stdout)]

use std::io::Write;

use glt_client::ClientState;
use glt_core::{Message, Suggestion};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::CliError;

pub async fn one_shot(state: &ClientState, text: &str) -> Result<(), CliError> {
    let reply = state.chat().send_message(text).await?;
    render(&reply);
    announce_badges(state);
    Ok(())
}

pub async fn interactive(state: &ClientState) -> Result<(), CliError> {
    if !state.session().is_authenticated() {
        tracing::warn!("Not logged in; replies will fail until you run `glt login`");
    }
    println!("Chatting with the Girlz Love Tech assistant. Type /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut suggestions: Vec<Suggestion> = Vec::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let text = pick_suggestion(&suggestions, line).unwrap_or(line);
        let reply = state.chat().send_message(text).await?;
        render(&reply);
        announce_badges(state);
        suggestions = reply.suggestions;
    }

    Ok(())
}

/// Reply text for a 1-based suggestion number, if `input` is one.
fn pick_suggestion<'a>(suggestions: &'a [Suggestion], input: &str) -> Option<&'a str> {
    let index = input.parse::<usize>().ok()?.checked_sub(1)?;
    suggestions.get(index).map(|s| s.reply.as_str())
}

fn render(message: &Message) {
    println!("[{}] {}", message.display_time(), message.text);

    for product in &message.products {
        let stock = if product.in_stock { "" } else { " (out of stock)" };
        println!("  #{} {} {}{stock}", product.id, product.title, product.price);
    }
    for (n, suggestion) in message.suggestions.iter().enumerate() {
        println!("  {}) {}", n + 1, suggestion.label);
    }
}

fn announce_badges(state: &ClientState) {
    for badge in state.chat().take_badge_notifications() {
        println!("Badge earned: {}!", badge.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_suggestion_by_number() {
        let suggestions = vec![
            Suggestion::new("Cheaper", "anything under $20?"),
            Suggestion::new("Add", "add it to my cart"),
        ];
        assert_eq!(pick_suggestion(&suggestions, "2"), Some("add it to my cart"));
        assert_eq!(pick_suggestion(&suggestions, "0"), None);
        assert_eq!(pick_suggestion(&suggestions, "3"), None);
        assert_eq!(pick_suggestion(&suggestions, "hello"), None);
    }
}
