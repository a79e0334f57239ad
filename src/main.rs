use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use savor_gateway::bridge::{self, BackendSynthesizer, ScriptedBridge};
use savor_gateway::{
    BackendClient, BridgeEvent, Config, GeolocationProvider, IntentParser, InteractionController,
    KeywordTable, LocationCache, SpeechBridge, UiEvent,
};

/// Savor - voice ordering gateway
#[derive(Parser)]
#[command(name = "savor", version, about)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "SAVOR_BACKEND_URL")]
    backend_url: Option<String>,

    /// Interaction language ("en", "pl")
    #[arg(long, env = "SAVOR_LANG")]
    lang: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a phrase and print the resulting intent
    Classify {
        /// Phrase to classify
        text: String,
    },
    /// Interactive session: stdin lines are treated as final transcripts
    Listen,
    /// Synthesize a phrase via the backend and report the audio size
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the ordering assistant.")]
        text: String,
    },
    /// Find places near the resolved location
    Nearby {
        /// What to look for
        query: String,
    },
    /// Run the backend's NLU over a phrase and print the parsed structure
    Nlu {
        /// Phrase to parse
        text: String,
    },
    /// Probe the backend health endpoint
    Health,
}

/// Device geolocation stand-in for the CLI: reads `SAVOR_LAT` / `SAVOR_LNG`
struct EnvProvider;

#[async_trait]
impl GeolocationProvider for EnvProvider {
    async fn current_position(&self) -> savor_gateway::Result<(f64, f64)> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
        };
        match (read("SAVOR_LAT"), read("SAVOR_LNG")) {
            (Some(lat), Some(lng)) => Ok((lat, lng)),
            _ => Err(savor_gateway::Error::CapabilityUnavailable(
                "SAVOR_LAT/SAVOR_LNG not set".to_string(),
            )),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,savor_gateway=info",
        1 => "info,savor_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }
    if let Some(lang) = cli.lang {
        config.voice.lang = lang;
    }

    match cli.command {
        Command::Classify { text } => {
            let parser = IntentParser::new(KeywordTable::for_language(&config.voice.lang))?;
            let intent = parser.classify(&text);
            println!("{}", serde_json::to_string_pretty(&intent)?);
            Ok(())
        }
        Command::Listen => listen(config).await,
        Command::Say { text } => {
            let backend = BackendClient::new(&config.backend.base_url);
            let audio = backend.speak(&text, &config.voice.lang).await?;
            println!("synthesized {} bytes of audio", audio.len());
            Ok(())
        }
        Command::Nearby { query } => {
            let backend = BackendClient::new(&config.backend.base_url);
            let cache = LocationCache::new(Box::new(EnvProvider), &config.data_dir);
            let location = cache.get_location().await;
            let places = backend.places(&query, location.lat, location.lng).await?;
            if places.is_empty() {
                println!("nothing found near {:.4}, {:.4}", location.lat, location.lng);
            }
            for place in places {
                let rating = place
                    .rating
                    .map_or_else(String::new, |r| format!("  ({r:.1})"));
                let address = place.address.unwrap_or_default();
                println!("{}{rating}  {address}", place.name);
            }
            Ok(())
        }
        Command::Nlu { text } => {
            let backend = BackendClient::new(&config.backend.base_url);
            let parsed = backend.nlu(&text).await?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(())
        }
        Command::Health => {
            let backend = BackendClient::new(&config.backend.base_url);
            let health = backend.health().await?;
            println!("{}: {}", backend.base_url(), health.status);
            Ok(())
        }
    }
}

/// One interactive session: every stdin line is fed through the controller as
/// a final transcript; EOF ends the session
async fn listen(config: Config) -> anyhow::Result<()> {
    let backend = Arc::new(BackendClient::new(&config.backend.base_url));
    let parser = IntentParser::new(KeywordTable::for_language(&config.voice.lang))?;
    let synth = Arc::new(BackendSynthesizer::new(
        Arc::clone(&backend),
        config.voice.lang.clone(),
    ));

    let (events_tx, mut events_rx) = bridge::event_channel();
    let scripted = Arc::new(ScriptedBridge::new(events_tx));

    let (ui_tx, mut ui_rx) = tokio::sync::mpsc::channel(32);
    let speech: Arc<dyn SpeechBridge> = scripted.clone();
    let mut controller = InteractionController::new(speech, synth, backend, parser, ui_tx);

    let ui_task = tokio::spawn(async move {
        while let Some(event) = ui_rx.recv().await {
            render(&event);
        }
    });

    let feeder = {
        let scripted = Arc::clone(&scripted);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if scripted.final_transcript(line).await.is_err() {
                    return;
                }
            }
            let _ = scripted.stop().await;
        })
    };

    println!("say something (ctrl-d to stop)");
    controller.toggle().await;

    while let Some(event) = events_rx.recv().await {
        let ended = matches!(event, BridgeEvent::Ended);
        controller.handle_event(event).await;
        if ended {
            break;
        }
    }

    feeder.abort();
    drop(controller);
    ui_task.await?;
    Ok(())
}

/// Render a controller UI event to the terminal
fn render(event: &UiEvent) {
    match event {
        UiEvent::ListeningChanged(active) => {
            println!("[{}]", if *active { "listening" } else { "idle" });
        }
        UiEvent::TranscriptUpdated(text) => println!("> {text}"),
        UiEvent::PlaceholderRestored => println!("(say something)"),
        UiEvent::LoadingChanged(loading) => {
            if *loading {
                println!("...");
            }
        }
        UiEvent::ResultsRendered(results) => {
            for result in results {
                println!("  {} - {}", result.title, result.link);
            }
        }
        UiEvent::Banner(message) => println!("! {message}"),
        UiEvent::SummaryShown(summary) => {
            let dish = summary.dish.as_deref().unwrap_or("-");
            let time = summary.time.as_deref().unwrap_or("-");
            println!("order: {dish} @ {time}");
        }
        UiEvent::SummaryHidden => println!("(summary hidden)"),
    }
}
