//! Interactive shell
//!
//! Reads one command per line and runs it against the session controller.
//! Commands run one at a time; dictation spans two commands (`dictate` to
//! start, `dictate` or `stop` to finish).

use crate::clipboard;
use crate::render;
use crate::session::{ActionKind, Notice, SessionController};
use crate::storage;
use chrono::Utc;
use colored::*;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  prompt <text>     replace the draft prompt
  show              show the draft and its analysis
  clear             clear the draft
  analyze [text]    analyze the draft (or the given text)
  dictate           start recording; run again (or `stop`) to transcribe
  cancel            stop recording without transcribing
  simulate [text]   run the prompt and show the answer
  image [text]      generate an image
  images            list images generated this session
  save <n>          save image n to the images folder
  open <n>          save image n and open it
  apply             use the improved prompt as the draft
  copy              copy the improved prompt to the clipboard
  examples          list prompt starters
  example <n>       load prompt starter n
  history           list analyzed prompts
  select <id>       load a history entry
  delete <id>       delete a history entry
  clear-history     delete all history
  help              show this help
  quit              leave the shell";

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    Help,
    Prompt(String),
    Show,
    ClearPrompt,
    Analyze(Option<String>),
    Dictate,
    Stop,
    Cancel,
    Simulate(Option<String>),
    Image(Option<String>),
    Images,
    Save(usize),
    Open(usize),
    Apply,
    Copy,
    Examples,
    Example(usize),
    History,
    Select(String),
    Delete(String),
    ClearHistory,
    Quit,
}

fn optional_text(rest: &str) -> Option<String> {
    Some(rest.to_string()).filter(|text| !text.is_empty())
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    optional_text(rest).ok_or_else(|| format!("Usage: {}", usage))
}

fn number(rest: &str, usage: &str) -> Result<usize, String> {
    rest.parse().map_err(|_| format!("Usage: {}", usage))
}

/// Parse a line; `Ok(None)` for blank lines
pub(crate) fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));

    let command = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => ShellCommand::Help,
        "prompt" | "set" => ShellCommand::Prompt(required(rest, "prompt <text>")?),
        "show" => ShellCommand::Show,
        "clear" => ShellCommand::ClearPrompt,
        "analyze" | "a" => ShellCommand::Analyze(optional_text(rest)),
        "dictate" | "d" => ShellCommand::Dictate,
        "stop" => ShellCommand::Stop,
        "cancel" => ShellCommand::Cancel,
        "simulate" | "sim" => ShellCommand::Simulate(optional_text(rest)),
        "image" | "img" => ShellCommand::Image(optional_text(rest)),
        "images" => ShellCommand::Images,
        "save" => ShellCommand::Save(number(rest, "save <n>")?),
        "open" => ShellCommand::Open(number(rest, "open <n>")?),
        "apply" => ShellCommand::Apply,
        "copy" => ShellCommand::Copy,
        "examples" => ShellCommand::Examples,
        "example" => ShellCommand::Example(number(rest, "example <n>")?),
        "history" | "h" => ShellCommand::History,
        "select" => ShellCommand::Select(required(rest, "select <id>")?),
        "delete" | "rm" => ShellCommand::Delete(required(rest, "delete <id>")?),
        "clear-history" => ShellCommand::ClearHistory,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("Unknown command '{}'. Type `help` for a list.", other)),
    };
    Ok(Some(command))
}

/// Save image `number` (1-based) from the session, optionally opening it
pub(crate) fn save_image(controller: &SessionController, number: usize, open_after: bool) -> Notice {
    let Some(image) = number
        .checked_sub(1)
        .and_then(|i| controller.images().get(i))
    else {
        return Notice::failed(format!("No image number {}", number));
    };
    let Some(dir) = storage::images_dir() else {
        return Notice::failed(storage::StorageError::NoImagesDir.to_string());
    };

    match storage::save_image(image, &dir) {
        Ok(path) => {
            if open_after {
                if let Err(e) = open::that(&path) {
                    return Notice::failed(format!(
                        "Saved to {} but could not open it: {}",
                        path.display(),
                        e
                    ));
                }
            }
            Notice::success(format!("Saved to {}", path.display()))
        }
        Err(e) => Notice::failed(format!("Failed to save image: {}", e)),
    }
}

/// Copy the current improved prompt to the clipboard
pub(crate) fn copy_improved(controller: &SessionController) -> Notice {
    match controller.current_analysis() {
        Some(analysis) if clipboard::copy_to_clipboard(&analysis.improved_prompt) => {
            Notice::success("Improved prompt copied to clipboard.")
        }
        Some(_) => Notice::failed("Could not copy to the clipboard."),
        None => Notice::Invalid(crate::error::ValidationError::NothingToApply),
    }
}

/// Draft and analysis as shown by `show`
pub(crate) fn render_draft(controller: &SessionController) -> String {
    let mut out = if controller.prompt().is_empty() {
        format!("{}\n", "The draft is empty.".dimmed())
    } else {
        format!(
            "{} ({} chars)\n{}\n",
            "Draft".bold(),
            controller.prompt().chars().count(),
            controller.prompt()
        )
    };
    if let Some(analysis) = controller.current_analysis() {
        out.push('\n');
        out.push_str(&render::analysis(analysis));
    }
    out
}

fn print_notice(notice: &Notice) {
    println!("{}", render::notice(notice));
}

/// Run one command; returns `false` when the shell should exit
async fn execute(controller: &mut SessionController, command: ShellCommand) -> bool {
    match command {
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Prompt(text) => {
            controller.set_prompt(text);
            print_notice(&Notice::info("Draft updated."));
        }
        ShellCommand::Show => print!("{}", render_draft(controller)),
        ShellCommand::ClearPrompt => {
            controller.clear_prompt();
            print_notice(&Notice::info("Draft cleared."));
        }
        ShellCommand::Analyze(text) => {
            println!("{}", "Analyzing prompt...".dimmed());
            let notice = match text {
                Some(text) => controller.submit_prompt(text).await,
                None => controller.analyze_current().await,
            };
            print_notice(&notice);
            if let (false, Some(analysis)) = (notice.is_error(), controller.current_analysis()) {
                print!("\n{}", render::analysis(analysis));
            }
        }
        ShellCommand::Dictate | ShellCommand::Stop if controller.is_recording() => {
            println!("{}", "Transcribing...".dimmed());
            let notice = controller.stop_dictation().await;
            print_notice(&notice);
            if matches!(notice, Notice::Success(_)) {
                println!("{}", controller.prompt());
            }
        }
        ShellCommand::Dictate => {
            let notice = controller.start_dictation();
            print_notice(&notice);
            if controller.is_recording() {
                println!("{}", "Type `dictate` or `stop` to finish, `cancel` to discard.".dimmed());
            }
        }
        ShellCommand::Stop | ShellCommand::Cancel => print_notice(&controller.cancel_dictation()),
        ShellCommand::Simulate(text) => {
            if let Some(text) = text {
                controller.set_prompt(text);
            }
            println!("{}", "Running prompt...".dimmed());
            let notice = controller.run_simulation().await;
            print_notice(&notice);
            if let (false, Some(result)) = (notice.is_error(), controller.last_simulation()) {
                print!("\n{}", render::simulation(result));
            }
        }
        ShellCommand::Image(text) => {
            if let Some(text) = text {
                controller.set_prompt(text);
            }
            println!("{}", "Generating image...".dimmed());
            print_notice(&controller.generate_image().await);
        }
        ShellCommand::Images => print!("{}", render::images(controller.images())),
        ShellCommand::Save(n) => print_notice(&save_image(controller, n, false)),
        ShellCommand::Open(n) => print_notice(&save_image(controller, n, true)),
        ShellCommand::Apply => print_notice(&controller.apply_improved_prompt()),
        ShellCommand::Copy => print_notice(&copy_improved(controller)),
        ShellCommand::Examples => print!("{}", render::examples()),
        ShellCommand::Example(n) => print_notice(&controller.load_example(n)),
        ShellCommand::History => {
            print!("{}", render::history(controller.history().records(), Utc::now()))
        }
        ShellCommand::Select(id) => {
            let notice = controller.select_history(&id);
            print_notice(&notice);
            if !notice.is_error() {
                print!("{}", render_draft(controller));
            }
        }
        ShellCommand::Delete(id) => print_notice(&controller.delete_history(&id)),
        ShellCommand::ClearHistory => print_notice(&controller.clear_history()),
        ShellCommand::Quit => return false,
    }
    true
}

fn print_prompt(controller: &SessionController) {
    let marker = if controller.is_pending(ActionKind::Dictate) {
        "forgeiq (rec)> ".red().bold()
    } else {
        "forgeiq> ".purple().bold()
    };
    print!("{}", marker);
    let _ = std::io::stdout().flush();
}

/// Read-eval loop until `quit` or end of input
pub(crate) async fn run(controller: &mut SessionController) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "ForgeIQ".purple().bold(),
        "interactive shell. Type `help` for commands.".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(controller);
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_line(&line) {
            Ok(Some(command)) => {
                debug!(?command, "Shell command");
                if !execute(controller, command).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => println!("{}", message.yellow()),
        }
    }

    if controller.is_recording() {
        controller.cancel_dictation();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_line("  "), Ok(None));
        assert_eq!(parse_line("help"), Ok(Some(ShellCommand::Help)));
        assert_eq!(parse_line("ANALYZE"), Ok(Some(ShellCommand::Analyze(None))));
        assert_eq!(
            parse_line("analyze Write a haiku about rain"),
            Ok(Some(ShellCommand::Analyze(Some(
                "Write a haiku about rain".to_string()
            ))))
        );
        assert_eq!(parse_line("quit"), Ok(Some(ShellCommand::Quit)));
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_line("save 2"), Ok(Some(ShellCommand::Save(2))));
        assert_eq!(
            parse_line("select 18f-0a"),
            Ok(Some(ShellCommand::Select("18f-0a".to_string())))
        );
        assert!(parse_line("save two").is_err());
        assert!(parse_line("select").is_err());
        assert!(parse_line("prompt").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let err = parse_line("frobnicate").unwrap_err();
        assert!(err.contains("frobnicate"));
    }
}
