use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gov_navigator::config::{BackendKind, Settings};
use gov_navigator::{chat, constants, detect_language, render, web_server, Language};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Per-run overrides of the environment defaults.
#[derive(clap::Args, Debug)]
struct Overrides {
    #[arg(long, global = true, help = "Path to the services catalog JSON file.")]
    catalog: Option<PathBuf>,
    #[arg(long, global = true, help = "Model identifier passed to the model command.")]
    model: Option<String>,
    #[arg(long, global = true, help = "Model backend: 'cli' or 'http'.")]
    backend: Option<BackendKind>,
    #[arg(long = "command", global = true, help = "Program used to run the model (cli backend).")]
    model_command: Option<String>,
    #[arg(
        long = "command-arg",
        global = true,
        allow_hyphen_values = true,
        help = "Argument placed before the model name; repeat for several."
    )]
    command_args: Vec<String>,
    #[arg(long, global = true, help = "Seconds to wait for the model before giving up.")]
    timeout: Option<u64>,
    #[arg(long, global = true, help = "Base URL of the Ollama server (http backend).")]
    ollama_url: Option<String>,
}

impl Overrides {
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(catalog) = self.catalog {
            settings.catalog_path = catalog;
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        if let Some(backend) = self.backend {
            settings.backend = backend;
        }
        if let Some(command) = self.model_command {
            settings.command = command;
        }
        if !self.command_args.is_empty() {
            settings.command_args = self.command_args;
        }
        if let Some(secs) = self.timeout {
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(url) = self.ollama_url {
            settings.ollama_url = url;
        }
        settings
    }
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Classify a single question and print the matching services.
    Ask {
        query: String,
        #[arg(long, help = "Render the answer in this language instead of the detected one.")]
        lang: Option<Language>,
        #[arg(long, help = "Print the outcome as JSON instead of text.")]
        json: bool,
    },
    /// Engage in an interactive chat session.
    Chat,
    /// Serve the classification API over HTTP.
    Serve {
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
    },
    /// List the services in the catalog.
    Services {
        #[arg(long, default_value = "ar", help = "Language for service titles.")]
        lang: Language,
    },
    /// Print the prompt that would be sent to the model for a question.
    Prompt { query: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (model command, catalog path, timeouts)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,gov_navigator=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Navigator starting with command: {:?}", cli.command);

    let settings = cli.overrides.apply(Settings::from_env());

    match cli.command {
        Commands::Ask { query, lang, json } => {
            let navigator = settings.build_navigator()?;
            let outcome = navigator.classify(&query).await;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
                );
            } else {
                let lang = lang.unwrap_or_else(|| detect_language(&query));
                let rendered = navigator.format_for(&outcome, lang);
                print!("{}", render::render_text(&rendered, lang));
            }
        }
        Commands::Chat => {
            let navigator = settings.build_navigator()?;
            chat::run_chat(&navigator)
                .await
                .context("Chat session failed")?;
        }
        Commands::Serve { port } => {
            let navigator = Arc::new(settings.build_navigator()?);
            info!("Starting navigator API on port {}...", port);
            tokio::select! {
                res = web_server::start_web_server(port, navigator) => res?,
                _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down."),
            }
        }
        Commands::Services { lang } => {
            let catalog = settings.load_catalog()?;
            for svc in catalog.iter() {
                println!("{}\t{}\t{}", svc.key, svc.title(lang), svc.category);
            }
        }
        Commands::Prompt { query } => {
            let navigator = settings.build_navigator()?;
            let prompt = navigator
                .prompt_for(&query)
                .context("Failed to build prompt")?;
            println!("{}", prompt);
        }
    }

    Ok(())
}
