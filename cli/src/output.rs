use colored::*;
use scheduler_memory::{Role, Transcript, Turn};

/// Print the assistant's answer with a colored prefix
pub fn print_response(response: &str) {
    println!("{}: {}", "Assistant".blue().bold(), response.trim());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

/// Dump every turn with its role, oldest first
pub fn print_history(transcript: &Transcript) {
    if transcript.is_empty() {
        println!("{}", "(no conversation yet)".dimmed());
        return;
    }
    for (index, turn) in transcript.iter().enumerate() {
        println!("{:>3} {}", index.to_string().dimmed(), format_turn(turn));
    }
}

fn format_turn(turn: &Turn) -> String {
    let role = match turn.role() {
        Role::User => "user".green().bold(),
        Role::Assistant => "assistant".blue().bold(),
        Role::Tool => "tool".yellow(),
        Role::System if turn.is_summary() => "summary".magenta().bold(),
        Role::System => "system".magenta(),
    };

    let mut line = format!("{}: {}", role, turn.content());
    for request in turn.action_requests() {
        line.push_str(&format!(
            "\n      {} {}({})",
            "->".dimmed(),
            request.name.cyan(),
            request.arguments
        ));
    }
    line
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "scheduler \"your request\"".green().bold());
    println!("    Send a single request to the assistant");
    println!();
    println!("  {}", "scheduler -i".green().bold());
    println!("    Start an interactive chat session");
    println!();
    println!("{}", "Options:".cyan());
    println!("  -c, --config <PATH>    Use a specific configuration file");
    println!("  -k, --api-key <KEY>    Gemini API key (or set GEMINI_API_KEY)");
    println!("  -m, --model <MODEL>    Gemini model name");
    println!("  -v, --verbose          Log debug output to stderr");
    println!("  --help                 Show this help message");
    println!();
}

pub fn print_chat_commands() {
    println!("Type 'exit' or 'quit' to end the session.");
    println!(
        "{} show the transcript, {} start over, {} show the token estimate",
        "/history".cyan(),
        "/reset".cyan(),
        "/tokens".cyan()
    );
    println!();
}
