#![deny(clippy::all)]

mod adapters;
mod audio;
mod cli;
mod clipboard;
mod config;
mod error;
mod gemini;
mod history;
mod keychain;
mod preferences;
mod prompts;
mod render;
mod response;
mod session;
mod shell;
mod storage;

use adapters::Adapters;
use anyhow::Context;
use audio::{CapturedAudio, MicrophoneSource};
use clap::Parser;
use cli::{joined, Cli, Commands, HistoryAction};
use config::Config;
use error::{KeychainError, ValidationError};
use history::{FileHistoryPort, HistoryPort, HistoryStore, MemoryHistoryPort};
use keychain::GeminiCredentials;
use session::{Notice, SessionController};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Where API keys can be created
const API_KEY_URL: &str = "https://aistudio.google.com/apikey";

/// Log to stderr; `-v`/`-vv` take precedence over `RUST_LOG`
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_history(config: &Config, ephemeral: bool) -> HistoryStore {
    let port: Box<dyn HistoryPort> = if ephemeral {
        info!("Using in-memory history");
        Box::new(MemoryHistoryPort::new())
    } else {
        match FileHistoryPort::default_location() {
            Ok(port) => {
                info!("Using history file: {:?}", port.path());
                Box::new(port)
            }
            Err(e) => {
                warn!("History will not be saved: {}", e);
                Box::new(MemoryHistoryPort::new())
            }
        }
    };
    let store = HistoryStore::open(port, config.history.max_entries);
    debug!(entries = store.len(), "History loaded");
    store
}

/// Ask for an API key on the terminal and store it
fn prompt_for_api_key() -> anyhow::Result<Option<GeminiCredentials>> {
    println!("Create a Gemini API key at {}", API_KEY_URL);
    let raw = rpassword::prompt_password("Gemini API key (leave empty to skip): ")?;
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let creds = keychain::validate_api_key(&raw)?;
    match keychain::store_gemini_credentials(&creds) {
        Ok(()) => println!("{}", render::notice(&Notice::success("API key saved."))),
        Err(e) => warn!("API key could not be stored, using it for this run only: {}", e),
    }
    Ok(Some(creds))
}

/// Install Gemini adapters, running the credential-entry flow if needed
///
/// Without a key the controller keeps rejecting network actions with
/// a missing-credential notice.
fn connect_adapters(controller: &mut SessionController, config: &Config) -> anyhow::Result<()> {
    let creds = match keychain::find_credentials() {
        Ok((creds, source)) => {
            info!(?source, "Gemini credentials found");
            Some(creds)
        }
        Err(e) => {
            debug!("No Gemini credentials: {}", e);
            if std::io::stdin().is_terminal() {
                prompt_for_api_key()?
            } else {
                None
            }
        }
    };

    if let Some(creds) = creds {
        let adapters = Adapters::gemini(&config.gemini, &creds)
            .context("Failed to set up the Gemini client")?;
        controller.install_adapters(adapters);
    }
    Ok(())
}

fn login() -> anyhow::Result<()> {
    if prompt_for_api_key()?.is_none() {
        println!(
            "{}",
            render::notice(&Notice::Invalid(ValidationError::MissingCredential))
        );
    }
    Ok(())
}

fn logout() -> anyhow::Result<()> {
    match keychain::delete_gemini_credentials() {
        Ok(()) => println!("{}", render::notice(&Notice::success("API key removed."))),
        Err(KeychainError::NotFound) => {
            println!("{}", render::notice(&Notice::info("No API key stored.")))
        }
        Err(e) => return Err(e).context("Failed to remove API key"),
    }
    Ok(())
}

fn image_dir(path: Option<PathBuf>, reset: bool) -> anyhow::Result<()> {
    if reset || path.is_some() {
        preferences::set_image_location(path).context("Failed to save preferences")?;
    }
    match storage::images_dir() {
        Some(dir) => println!("Images are saved to {}", dir.display()),
        None => println!("{}", storage::StorageError::NoImagesDir),
    }
    Ok(())
}

/// Print a notice and report whether it was an error
fn report(notice: &Notice) -> bool {
    println!("{}", render::notice(notice));
    !notice.is_error()
}

/// Record until Enter is pressed, then transcribe
async fn dictate_from_microphone(controller: &mut SessionController) -> anyhow::Result<Notice> {
    let started = controller.start_dictation();
    if !controller.is_recording() {
        return Ok(started);
    }
    report(&started);
    println!("Press Enter to stop recording.");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read from stdin")?;

    println!("Transcribing...");
    Ok(controller.stop_dictation().await)
}

/// Run a one-shot command; returns whether it succeeded
async fn run_command(controller: &mut SessionController, command: Commands) -> anyhow::Result<bool> {
    let ok = match command {
        Commands::Analyze { prompt } => {
            let notice = match joined(&prompt) {
                Some(text) => controller.submit_prompt(text).await,
                None => controller.analyze_current().await,
            };
            let ok = report(&notice);
            if let (true, Some(analysis)) = (ok, controller.current_analysis()) {
                print!("\n{}", render::analysis(analysis));
            }
            ok
        }
        Commands::Dictate { file } => {
            let notice = match file {
                Some(path) => {
                    let clip = CapturedAudio::from_file(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    controller.transcribe_clip(clip).await
                }
                None => dictate_from_microphone(controller).await?,
            };
            let ok = report(&notice);
            if matches!(notice, Notice::Success(_)) {
                println!("{}", controller.prompt());
            }
            ok
        }
        Commands::History { action } => match action.unwrap_or(HistoryAction::List) {
            HistoryAction::List => {
                print!(
                    "{}",
                    render::history(controller.history().records(), chrono::Utc::now())
                );
                true
            }
            HistoryAction::Show { id } => match controller.history().get(&id) {
                Some(record) => {
                    print!("{}", render::record(record));
                    true
                }
                None => report(&Notice::Invalid(ValidationError::UnknownHistoryId(id))),
            },
            HistoryAction::Select { id } => {
                let ok = report(&controller.select_history(&id));
                if ok {
                    print!("{}", shell::render_draft(controller));
                }
                ok
            }
            HistoryAction::Delete { id } => report(&controller.delete_history(&id)),
            HistoryAction::Clear => report(&controller.clear_history()),
        },
        Commands::Image { prompt, save, open } => {
            if let Some(text) = joined(&prompt) {
                controller.set_prompt(text);
            }
            let count = controller.images().len();
            let ok = report(&controller.generate_image().await);
            if ok && (save || open) && controller.images().len() > count {
                report(&shell::save_image(controller, controller.images().len(), open))
            } else {
                ok
            }
        }
        Commands::Simulate { prompt } => {
            if let Some(text) = joined(&prompt) {
                controller.set_prompt(text);
            }
            let notice = controller.run_simulation().await;
            let ok = report(&notice);
            if let (true, Some(result)) = (ok, controller.last_simulation()) {
                print!("\n{}", render::simulation(result));
            }
            ok
        }
        Commands::Examples { number } => match number {
            Some(n) => report(&controller.load_example(n)),
            None => {
                print!("{}", render::examples());
                true
            }
        },
        Commands::Show => {
            print!("{}", shell::render_draft(controller));
            true
        }
        Commands::Apply => report(&controller.apply_improved_prompt()),
        Commands::Copy => report(&shell::copy_improved(controller)),
        Commands::Clear => {
            controller.clear_prompt();
            report(&Notice::info("Draft cleared."))
        }
        Commands::Shell => {
            shell::run(controller).await?;
            true
        }
        Commands::Login | Commands::Logout | Commands::ImageDir { .. } => true,
    };
    Ok(ok)
}

/// Whether a command talks to the Gemini service
fn needs_adapters(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Analyze { .. }
            | Commands::Dictate { .. }
            | Commands::Image { .. }
            | Commands::Simulate { .. }
            | Commands::Shell
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load_config().context("Failed to load configuration")?;
    let command = cli.command.unwrap_or(Commands::Shell);

    // Commands that never touch the session
    match &command {
        Commands::Login => return login(),
        Commands::Logout => return logout(),
        Commands::ImageDir { path, reset } => return image_dir(path.clone(), *reset),
        _ => {}
    }

    let history = open_history(&config, cli.ephemeral);
    let mut controller = SessionController::new(history, Box::new(MicrophoneSource));

    // Draft carried over from the previous invocation
    let prefs = preferences::load_preferences();
    controller.restore(
        prefs.draft_prompt.unwrap_or_default(),
        prefs.current_analysis,
    );

    if needs_adapters(&command) {
        connect_adapters(&mut controller, &config)?;
    }

    let ok = run_command(&mut controller, command).await?;

    let (prompt, analysis) = controller.snapshot();
    if let Err(e) = preferences::save_draft(&prompt, analysis.as_ref()) {
        warn!("Failed to save draft: {}", e);
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_adapters() {
        assert!(needs_adapters(&Commands::Analyze { prompt: vec![] }));
        assert!(needs_adapters(&Commands::Shell));
        assert!(!needs_adapters(&Commands::History { action: None }));
        assert!(!needs_adapters(&Commands::Examples { number: Some(1) }));
    }

    #[test]
    fn test_ephemeral_history_starts_empty() {
        let config = config::load_config().expect("config");
        let store = open_history(&config, true);
        assert!(store.is_empty());
    }
}
