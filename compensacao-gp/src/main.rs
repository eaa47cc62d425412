//! Ponto de entrada CLI

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use compensacao_gp::cli::{self, Commands};

// Carregar .env no início
fn load_env() {
    if dotenvy::dotenv().is_err() {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Cliente da calculadora de compensação ambiental
#[derive(Parser)]
#[command(name = "compensacao-gp")]
#[command(author, version)]
#[command(about = "Submete áreas propostas à análise de compensação via geoprocessamento")]
struct Cli {
    /// Aumentar a verbosidade (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Modo silencioso
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analisar { zip, idea, config } => {
            cli::cmd_analisar(&zip, idea, config.as_deref()).await?;
        }
        Commands::Validar { zip } => {
            cli::cmd_validar(&zip)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
