//! Docket CLI - Extract structured JSON from folders of text documents.

use clap::Parser;
use docket_cli::{app, interactive, logging, Cli, Config, Formatter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> docket_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config, then let flags and environment win
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => interactive::ask_for_root()?,
    };
    app::check_root(&root)?;

    // Dry runs leave the tree untouched, log file included
    let log_file = (config.settings.log_file && !cli.dry_run)
        .then(|| root.join(&config.settings.log_file_name));
    logging::init(cli.log_level.as_deref(), log_file.as_deref())?;

    let formatter = Formatter::new(config.settings.format, config.settings.color);
    let output = app::execute(&config, &root, cli.dry_run, &formatter).await?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
