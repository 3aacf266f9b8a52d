//! Main Entrypoint for the Bankvoice Widget
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Wiring the backend client, reply store, and voice session.
//! 4. Running the requested flow: a one-shot message, a recording (via the
//!    transcription endpoint or the live voice session), or the prompt loop.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use bankvoice_core::backend::HttpBackendClient;
use bankvoice_session::VoiceChatSession;
use bankvoice_widget::{chat, config::Config, store::ReplyStore, voice};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Terminal front-end for the banking chatbot.
#[derive(Parser, Debug)]
#[command(name = "widget", version, about)]
struct Cli {
    /// Customer identifier presented to the backend.
    #[arg(long)]
    customer_id: String,

    /// Send a single message and exit instead of starting the prompt loop.
    #[arg(long)]
    message: Option<String>,

    /// A finished WAV recording to send instead of typed text.
    #[arg(long)]
    recording: Option<PathBuf>,

    /// Stream the recording over the live voice session instead of the
    /// transcription endpoint.
    #[arg(long, requires = "recording")]
    live: bool,

    /// Ask the backend to speak replies that come back text-only.
    #[arg(long)]
    speak: bool,

    /// Override the configured segment window for live streaming.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    window_secs: Option<u64>,
}

/// How long the live flow waits on a quiet server before hanging up.
const LIVE_IDLE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!(api = %config.api_base_url, "Configuration loaded.");

    // --- 3. Wire Shared Services ---
    let backend = HttpBackendClient::new(config.api_base_url.as_str());
    let mut store = ReplyStore::new(&config.output_dir)?;
    let window_secs = cli.window_secs.unwrap_or(config.segment_secs);

    // --- 4. Run the Requested Flow ---
    if let Some(path) = &cli.recording {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read recording {}", path.display()))?;
        if cli.live {
            let mut session = VoiceChatSession::new(config.voice_url.clone());
            let exchange = voice::run_live_exchange(
                &mut session,
                &mut store,
                &cli.customer_id,
                &bytes,
                window_secs,
                LIVE_IDLE,
            )
            .await?;
            for reply in &exchange.replies {
                println!("Bot: {reply}");
            }
            for path in &exchange.saved_audio {
                println!("(spoken reply stored at {})", path.display());
            }
            if exchange.connection_lost {
                bail!("voice connection lost before the exchange finished");
            }
        } else {
            let turn = chat::run_voice_file_turn(
                &backend,
                &mut store,
                &cli.customer_id,
                bytes,
                cli.speak,
            )
            .await?;
            if let Some(transcription) = &turn.transcription {
                println!("You (transcribed): {transcription}");
            }
            print_turn(&turn);
        }
        return Ok(());
    }

    if let Some(message) = &cli.message {
        let turn =
            chat::run_text_turn(&backend, &mut store, &cli.customer_id, message, cli.speak)
                .await?;
        print_turn(&turn);
        return Ok(());
    }

    // Prompt loop: one chat turn per line, empty line or EOF to quit.
    println!(
        "Connected as {}. Type a message, or an empty line to quit.",
        cli.customer_id
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            break;
        }
        match chat::run_text_turn(&backend, &mut store, &cli.customer_id, message, cli.speak)
            .await
        {
            Ok(turn) => print_turn(&turn),
            // A failed turn should not end the conversation.
            Err(e) => eprintln!("Error: unable to fetch a reply ({e:#})"),
        }
    }
    Ok(())
}

fn print_turn(turn: &chat::ChatTurn) {
    println!("Bot: {}", turn.response);
    if let Some(path) = &turn.saved_audio {
        println!("(spoken reply stored at {})", path.display());
    }
    if let Some(url) = &turn.audio_url {
        println!("(spoken reply available at {url})");
    }
}
