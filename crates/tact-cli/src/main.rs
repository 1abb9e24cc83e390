mod clock;
mod console;
mod demo;
mod repl;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use tact_core::{
    Collaborators, DemoScenario, HapticSignature, MockTransport, Session, SendTransport,
};
use tact_store::{Config, DataDir, SharedStore, Store};

use crate::clock::TokioScheduler;
use crate::console::ConsoleHaptics;

#[derive(Parser)]
#[command(name = "tact", about = "Tactile-first message reading core: CLI and session runner")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a signature's frames and blended output
    Signature {
        /// urgent, calm, empathy, anger or neutral
        name: HapticSignature,

        /// Number of ticks to show
        #[arg(long, default_value_t = 12)]
        ticks: u64,

        /// Raised-dot density under the reading point (0-6)
        #[arg(long, default_value_t = 0)]
        density: i32,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print per-character burst plans for text
    Burst {
        text: String,

        #[arg(long)]
        json: bool,
    },

    /// Run a scripted session on the virtual clock and print what it emitted
    Demo {
        /// bankFraud, momBirthday or overloadFilter
        scenario: DemoScenario,

        /// Make the reply transport fail
        #[arg(long)]
        fail_send: bool,

        /// Print only the cue sequence
        #[arg(long)]
        cues_only: bool,
    },

    /// Interactive session over stdin, backed by the store
    Run {
        /// Load a demo message set instead of stored messages
        #[arg(long)]
        scenario: Option<DemoScenario>,

        /// Make the reply transport fail
        #[arg(long)]
        fail_send: bool,
    },

    /// Import messages from a JSON file
    Import { path: PathBuf },

    /// Export stored messages as JSON
    Export {
        /// Output file (stdout when omitted)
        path: Option<PathBuf>,
    },

    /// List stored messages
    Messages {
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit saved drafts
    Draft {
        #[command(subcommand)]
        command: DraftCommand,
    },

    /// Show the data directory and effective configuration
    Config,
}

#[derive(Subcommand)]
enum DraftCommand {
    Get { key: String },
    Set { key: String, text: String },
    Clear { key: String },
    List,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(data: &DataDir) -> Result<Config> {
    data.load_config()
        .with_context(|| format!("failed to load {}", data.config_path().display()))
}

fn open_store() -> Result<(Store, Config)> {
    let data = DataDir::resolve();
    let config = load_config(&data)?;
    let store = data
        .open_store(&config)
        .with_context(|| format!("failed to open store in {}", data.root().display()))?;
    Ok((store, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Signature {
            name,
            ticks,
            density,
            json,
        } => cmd_signature(name, ticks, density, json),
        Commands::Burst { text, json } => cmd_burst(&text, json),
        Commands::Demo {
            scenario,
            fail_send,
            cues_only,
        } => cmd_demo(scenario, fail_send, cues_only).await,
        Commands::Run {
            scenario,
            fail_send,
        } => cmd_run(scenario, fail_send).await,
        Commands::Import { path } => cmd_import(&path),
        Commands::Export { path } => cmd_export(path.as_deref()),
        Commands::Messages { json } => cmd_messages(json),
        Commands::Draft { command } => cmd_draft(command),
        Commands::Config => cmd_config(),
    }
}

fn cmd_signature(signature: HapticSignature, ticks: u64, density: i32, json: bool) -> Result<()> {
    let rows = report::signature_rows(signature, ticks, density);
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", report::format_signature_table(signature, &rows));
    }
    Ok(())
}

fn cmd_burst(text: &str, json: bool) -> Result<()> {
    let plans = report::burst_plans(text);
    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        println!("{}", report::format_burst(&plans));
    }
    Ok(())
}

async fn cmd_demo(scenario: DemoScenario, fail_send: bool, cues_only: bool) -> Result<()> {
    let report = demo::run(scenario, fail_send).await;
    if cues_only {
        for cue in &report.cues {
            println!("{cue}");
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

async fn cmd_run(scenario: Option<DemoScenario>, fail_send: bool) -> Result<()> {
    let (store, config) = open_store()?;
    let shared = SharedStore::new(store);
    let transport: Arc<dyn SendTransport> = if fail_send {
        Arc::new(MockTransport::failing())
    } else {
        Arc::new(MockTransport::new())
    };

    let collaborators = Collaborators::new(Arc::new(TokioScheduler::current()))
        .with_repository(shared.clone())
        .with_drafts(shared)
        .with_transport(transport)
        .with_cues(Arc::new(ConsoleHaptics))
        .with_actuator(Arc::new(ConsoleHaptics));
    let session = Session::new(config.to_session_config(), collaborators);
    if let Some(scenario) = scenario {
        session.select_demo_scenario(scenario);
    }

    tracing::info!(scenario = scenario.map(DemoScenario::as_str), "interactive session");
    session.enter();
    println!("{}", repl::status_line(&session));
    println!("(type 'help' for commands)");

    repl::run(&session, BufReader::new(tokio::io::stdin())).await
}

fn cmd_import(path: &Path) -> Result<()> {
    let (store, _) = open_store()?;
    let count = store
        .import_json_file(path)
        .with_context(|| format!("failed to import {}", path.display()))?;
    println!(
        "imported {count} messages from {}. total={}",
        path.display(),
        store.message_count()?
    );
    Ok(())
}

fn cmd_export(path: Option<&Path>) -> Result<()> {
    let (store, _) = open_store()?;
    let json = store
        .export_json_string()
        .context("failed to export messages")?;
    match path {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("exported to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_messages(json: bool) -> Result<()> {
    let (store, _) = open_store()?;
    let messages = store.list_messages().context("failed to load messages")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }
    if messages.is_empty() {
        println!("(no messages)");
        return Ok(());
    }
    for m in &messages {
        let mark = if m.is_read { ' ' } else { '*' };
        println!(
            "{mark} {:<8} {:<8} {:.2} {:<14} {}",
            m.category,
            m.tone,
            m.urgency(),
            m.sender,
            m.summary()
        );
    }
    Ok(())
}

fn cmd_draft(command: DraftCommand) -> Result<()> {
    let (store, _) = open_store()?;
    match command {
        DraftCommand::Get { key } => match store.load_draft(&key)? {
            Some(text) => println!("{text}"),
            None => println!("(no draft for {key})"),
        },
        DraftCommand::Set { key, text } => {
            store.save_draft(&key, &text)?;
            println!("saved draft for {key}");
        }
        DraftCommand::Clear { key } => {
            store.clear_draft(&key)?;
            println!("cleared draft for {key}");
        }
        DraftCommand::List => {
            for (key, text) in store.list_drafts()? {
                println!("{key}: {text}");
            }
        }
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let data = DataDir::resolve();
    let config = load_config(&data)?;
    println!("data_dir: {}", data.root().display());
    println!("database: {}", data.db_path(&config).display());
    print!("{}", toml::to_string(&config).context("failed to render config")?);
    Ok(())
}
