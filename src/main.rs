use anyhow::Context;
use clap::Parser;
use docqa::cli::handle_ask_command;
use docqa::cli::handle_chat_command;
use docqa::cli::handle_config_command;
use docqa::cli::handle_index_command;
use docqa::cli::handle_search_command;
use docqa::cli::AskOptions;
use docqa::cli::Cli;
use docqa::cli::Commands;
use docqa::config::AppConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::load().context("failed to load configuration")?,
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    // Initialize logging; the guard flushes the file writer on exit
    let _guard = docqa::logging::init_logging(&config.logging)?;
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Index { files, output } => {
            handle_index_command(&config, &files, output.as_deref()).await?;
        }
        Commands::Ask {
            question,
            reference,
            rating,
            top_k,
            json,
        } => {
            let options = AskOptions {
                reference,
                rating,
                top_k,
                json,
                verbose: cli.verbose,
            };
            handle_ask_command(&config, &question, options).await?;
        }
        Commands::Search { query, top_k } => {
            handle_search_command(&config, &query, top_k).await?;
        }
        Commands::Chat { files } => {
            handle_chat_command(&config, &files, cli.verbose).await?;
        }
        Commands::Config => handle_config_command(&config),
    }

    Ok(())
}
