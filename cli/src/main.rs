use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use scheduler_agent::{
    render_system_prompt, ControllerSettings, ConversationController, GeminiModelAdapter,
};
use scheduler_core::config::{get_default_config_file, SchedulerConfig, TokenizerKind};
use scheduler_core::GeminiClient;
use scheduler_memory::{Cl100kTokenizer, Tokenizer, WordTokenizer};
use scheduler_tools::actions::current_date_time;
use scheduler_tools::calendar::parse_timezone;
use scheduler_tools::{default_registry, InMemoryCalendar};
use std::sync::Arc;
use tracing::{debug, info};

mod app;
mod cli;
mod logging;
mod output;

use crate::cli::Args;
use crate::logging::init_logging;
use crate::output::{print_error, print_usage_instructions};

const APP_NAME: &str = "gemini-scheduler";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(args.verbose);

    if !args.interactive && args.prompt.is_none() {
        print_usage_instructions();
        return Ok(());
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            print_error(&format!("{:#}", e));
            return Err(e);
        }
    };

    let mut controller = match build_controller(&config) {
        Ok(controller) => controller,
        Err(e) => {
            print_error(&format!("{:#}", e));
            return Err(e);
        }
    };

    if args.interactive {
        if let Err(e) = app::run_interactive_chat(&mut controller).await {
            print_error(&format!("Interactive chat failed: {:#}", e));
            return Err(e);
        }
    } else if let Some(prompt) = args.prompt {
        if let Err(e) = app::run_single_query(prompt, &mut controller).await {
            print_error(&format!("{:#}", e));
            return Err(e);
        }
    }

    Ok(())
}

/// File config, then environment, then command line flags
fn load_config(args: &Args) -> Result<SchedulerConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file(APP_NAME)?,
    };
    debug!("Loading configuration from {}", path.display());

    let mut config = SchedulerConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        .with_env_overrides();

    if let Some(key) = &args.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(model) = &args.model {
        config.model_name = Some(model.clone());
    }
    Ok(config)
}

fn build_tokenizer(kind: TokenizerKind) -> Result<Arc<dyn Tokenizer>> {
    Ok(match kind {
        TokenizerKind::Cl100k => Arc::new(Cl100kTokenizer::new()?),
        TokenizerKind::Words => Arc::new(WordTokenizer),
    })
}

/// Wires the Gemini model, calendar actions and tokenizer into one conversation
fn build_controller(config: &SchedulerConfig) -> Result<ConversationController> {
    let zone: Tz = parse_timezone(config.timezone())?;

    let client = GeminiClient::new(config).context("Failed to initialize Gemini client")?;
    info!("Using model {}", client.model_name());
    let model = Arc::new(GeminiModelAdapter::new(client));

    let calendar = Arc::new(InMemoryCalendar::new(zone));
    let registry = default_registry(calendar);
    let tokenizer = build_tokenizer(config.tokenizer())?;

    let now = current_date_time(Utc::now(), zone, "datetime")?;
    let system_instruction = render_system_prompt(&config.resolve_system_prompt()?, &now);

    Ok(ConversationController::new(
        model,
        registry,
        tokenizer,
        system_instruction,
        ControllerSettings::from_config(config),
    ))
}
