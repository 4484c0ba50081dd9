use clap::Parser;
use std::path::PathBuf;

/// Calendar scheduling assistant backed by Gemini
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The request to send to the assistant
    #[arg(index = 1)] // Positional argument
    pub prompt: Option<String>,

    /// Enter interactive chat mode
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gemini API key, overrides the config file and environment
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// Model name, overrides the config file and environment
    #[arg(short, long)]
    pub model: Option<String>,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_prompt_and_overrides() {
        let args = Args::parse_from([
            "scheduler",
            "book lunch with Sarah",
            "-k",
            "secret",
            "-m",
            "gemini-2.0-flash",
            "-v",
        ]);
        assert_eq!(args.prompt.as_deref(), Some("book lunch with Sarah"));
        assert_eq!(args.api_key.as_deref(), Some("secret"));
        assert_eq!(args.model.as_deref(), Some("gemini-2.0-flash"));
        assert!(args.verbose);
        assert!(!args.interactive);
    }

    #[test]
    fn test_interactive_without_prompt() {
        let args = Args::parse_from(["scheduler", "-i", "-c", "/tmp/scheduler.toml"]);
        assert!(args.interactive);
        assert!(args.prompt.is_none());
        assert_eq!(args.config, Some(PathBuf::from("/tmp/scheduler.toml")));
    }
}
