use clap::{Parser, Subcommand};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

mod keys;
mod runner;

#[derive(Parser)]
#[command(name = "calmvox", version, about = "Sentence-by-sentence text narrator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Narrate a text file (or stdin with `-`), sentence by sentence
    Narrate {
        /// Path to the text to narrate, or `-` for stdin
        file: String,
        /// Voice id to pin (see `calmvox voices`)
        #[arg(long)]
        voice: Option<String>,
        /// Speaking-rate multiplier (1.0 is normal speed)
        #[arg(long, default_value_t = 1.0)]
        rate: f32,
        /// Preferred language for automatic voice selection
        #[arg(long, default_value = "en", env = "CALMVOX_LANGUAGE")]
        language: String,
        /// Disable interactive keyboard controls
        #[arg(long)]
        no_input: bool,
    },
    /// List the voices the synthesis engine reports
    Voices {
        /// Emit the voice list as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "calmvox.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    // Logs go to the file only; stdout belongs to the narration display.
    tracing_subscriber::fmt()
        .with_writer(non_blocking_file)
        .with_env_filter(log_level)
        .init();
    std::mem::forget(_guard);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging()?;
    tracing::info!("Starting CalmVox");

    match cli.command {
        Commands::Narrate {
            file,
            voice,
            rate,
            language,
            no_input,
        } => {
            runner::narrate(&file, voice, rate, language, no_input).await?;
        }
        Commands::Voices { json } => {
            runner::list_voices(json).await?;
        }
    }

    tracing::info!("CalmVox exiting");
    Ok(())
}
