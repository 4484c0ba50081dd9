use anyhow::{Context, Result};
use colored::*;
use scheduler_agent::ConversationController;
use std::io::{self, Write};
use tracing::{debug, error, info};

use crate::output::{print_chat_commands, print_error, print_history, print_response};

const RETRY_HINT: &str = "This looks temporary. Send your message again to retry.";

/// Input lines the chat loop handles itself instead of sending to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatCommand {
    Exit,
    History,
    Reset,
    Tokens,
}

impl ChatCommand {
    fn parse(input: &str) -> Option<Self> {
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            return Some(Self::Exit);
        }
        match input {
            "/history" => Some(Self::History),
            "/reset" => Some(Self::Reset),
            "/tokens" => Some(Self::Tokens),
            _ => None,
        }
    }
}

/// Sends one request and prints the assistant's answer
pub async fn run_single_query(prompt: String, controller: &mut ConversationController) -> Result<()> {
    info!("Running single query: {}", prompt);

    let answer = controller
        .run_turn(&prompt)
        .await
        .context("Failed to get a reply from the assistant")?;
    print_response(&answer);

    Ok(())
}

/// Runs an interactive chat session until `exit`, `quit` or end of input
pub async fn run_interactive_chat(controller: &mut ConversationController) -> Result<()> {
    println!("Starting interactive scheduling session.");
    print_chat_commands();

    loop {
        print!("{}: ", "You".green().bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            println!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match ChatCommand::parse(input) {
            Some(ChatCommand::Exit) => {
                println!("Exiting chat session.");
                break;
            }
            Some(ChatCommand::History) => print_history(controller.transcript()),
            Some(ChatCommand::Reset) => {
                controller.reset();
                println!("{}", "Conversation cleared.".dimmed());
            }
            Some(ChatCommand::Tokens) => println!(
                "{} tokens across {} turns (condenses above {})",
                controller.size_estimate(),
                controller.transcript().len(),
                controller.settings().summarization_threshold
            ),
            None => {
                debug!("Sending request to assistant: {}", input);
                match controller.run_turn(input).await {
                    Ok(answer) => print_response(&answer),
                    Err(e) => {
                        error!("Turn failed: {}", e);
                        print_error(&e.to_string());
                        if e.is_transient() {
                            println!("{}", RETRY_HINT.dimmed());
                        }
                    }
                }
            }
        }

        println!(); // Add spacing between interactions
    }

    Ok(())
}
