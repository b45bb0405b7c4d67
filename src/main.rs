//! Slidedeck - terminal driver for the presentation engine.
//!
//! Loads `deck.yaml` from a config directory, initializes an [`Engine`] on a
//! [`StdoutSurface`] and reads one command per line from stdin:
//!
//! | command            | effect                                  |
//! |--------------------|-----------------------------------------|
//! | `n`, empty line    | next slide                              |
//! | `p`                | previous slide                          |
//! | `g N`              | go to slide N (1-based)                 |
//! | `first`, `last`    | jump to either end                      |
//! | `o`                | toggle overview                         |
//! | `theme NAME`       | switch theme                            |
//! | `plugin NAME on`   | enable or disable (`off`) a plugin      |
//! | `q`                | quit                                    |
//!
//! Themes are read from `<CONFIG_DIR>/themes/<name>.css` when that directory
//! exists, otherwise the built-in themes are used.

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use slidedeck::engine::Topic;
use slidedeck::logging::{self, LogOptions};
use slidedeck::plugins::builtin::EFFECT_TOPIC;
use slidedeck::services::{DirectoryThemes, FileFetcher};
use slidedeck::{
    APP_NAME, ConfigManager, Engine, EngineEvent, EngineServices, StdoutSurface, VERSION,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "slidedeck", version, about = "Present a markdown slide deck")]
struct Cli {
    /// Directory containing deck.yaml
    #[arg(default_value = ".")]
    config_dir: Utf8PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: Utf8PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Next,
    Previous,
    GoTo(usize),
    First,
    Last,
    Overview,
    Theme(String),
    Plugin { name: String, enabled: bool },
    Quit,
}

fn parse_command(line: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let command = match (words.next(), words.next(), words.next()) {
        (None, _, _) | (Some("n"), None, _) => Command::Next,
        (Some("p"), None, _) => Command::Previous,
        (Some("g"), Some(number), None) => {
            let number: usize = number
                .parse()
                .with_context(|| format!("Not a slide number: {number}"))?;
            match number.checked_sub(1) {
                Some(index) => Command::GoTo(index),
                None => bail!("Slide numbers start at 1"),
            }
        }
        (Some("first"), None, _) => Command::First,
        (Some("last"), None, _) => Command::Last,
        (Some("o"), None, _) => Command::Overview,
        (Some("theme"), Some(name), None) => Command::Theme(name.to_string()),
        (Some("plugin"), Some(name), Some(state)) if words.next().is_none() => {
            let enabled = match state {
                "on" => true,
                "off" => false,
                other => bail!("Expected on or off, got {other}"),
            };
            Command::Plugin {
                name: name.to_string(),
                enabled,
            }
        }
        (Some("q"), None, _) => Command::Quit,
        _ => bail!("Unknown command: {}", line.trim()),
    };
    Ok(command)
}

async fn run_command(engine: &Engine, command: Command) -> Result<()> {
    match command {
        Command::Next => engine.next_slide().map(|_| ())?,
        Command::Previous => engine.previous_slide().map(|_| ())?,
        Command::GoTo(index) => engine.go_to_slide(index).map(|_| ())?,
        Command::First => engine.first_slide().map(|_| ())?,
        Command::Last => engine.last_slide().map(|_| ())?,
        Command::Overview => engine.toggle_overview().map(|_| ())?,
        Command::Theme(name) => engine.apply_theme(&name).await?,
        Command::Plugin { name, enabled } => engine.set_plugin_enabled(&name, enabled)?,
        Command::Quit => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(&LogOptions {
        dir: cli.log_dir.clone(),
        debug: cli.debug,
        console: cli.debug,
        ..LogOptions::default()
    })?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Everything runs on the main thread; the engine never needs more
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(present(cli))
}

async fn present(cli: Cli) -> Result<()> {
    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let deck = config_manager.load_deck_config()?;

    let mut services =
        EngineServices::default().with_fetcher(FileFetcher::with_base_dir(cli.config_dir.clone()));
    let themes_dir = cli.config_dir.join("themes");
    if themes_dir.is_dir() {
        tracing::info!("Loading themes from {}", themes_dir);
        services = services.with_themes(DirectoryThemes::new(themes_dir));
    }

    let engine = Engine::with_services(StdoutSurface::new(), services);
    engine.on(Topic::custom(EFFECT_TOPIC), |event| {
        if let EngineEvent::Custom { payload, .. } = event {
            println!("*** effect: {} ***", serde_yaml_ng::to_string(payload)?.trim());
        }
        Ok(())
    })?;

    let report = engine
        .initialize(&deck)
        .await
        .context("Failed to initialize the deck")?;
    if let Some(error) = &report.theme_error {
        eprintln!("theme not applied: {error}");
    }
    for failure in &report.plugin_failures {
        eprintln!("plugin {} disabled: {}", failure.name, failure.error);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = run_command(&engine, command).await {
            eprintln!("{e}");
        }
    }

    engine.destroy();
    tracing::info!("Application shutdown complete");
    Ok(())
}
