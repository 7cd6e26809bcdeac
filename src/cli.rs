//! Command-line interface definition

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "forgeiq")]
#[command(about = "Analyze, improve and test LLM prompts with Gemini.

Run without a subcommand to open the interactive shell.")]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    /// Keep history in memory only for this run
    #[arg(long, global = true)]
    pub(crate) ephemeral: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub(crate) enum Commands {
    /// Score a prompt and suggest an improved version
    Analyze {
        /// Prompt text (defaults to the current draft)
        prompt: Vec<String>,
    },
    /// Record from the microphone and append the transcript to the draft
    Dictate {
        /// Transcribe an existing audio file instead of recording
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
    /// Browse and manage analyzed prompts
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Generate an image from a prompt
    Image {
        /// Prompt text (defaults to the current draft)
        prompt: Vec<String>,
        /// Save the image to the images folder
        #[arg(long)]
        save: bool,
        /// Open the saved image (implies --save)
        #[arg(long)]
        open: bool,
    },
    /// Run a prompt directly and show the answer with its sources
    Simulate {
        /// Prompt text (defaults to the current draft)
        prompt: Vec<String>,
    },
    /// List prompt starters, or load one into the draft
    Examples {
        /// Number of the example to load
        number: Option<usize>,
    },
    /// Show the current draft and its analysis
    Show,
    /// Replace the draft with the last improved prompt
    Apply,
    /// Copy the last improved prompt to the clipboard
    Copy,
    /// Clear the draft prompt
    Clear,
    /// Store a Gemini API key
    Login,
    /// Remove the stored Gemini API key
    Logout,
    /// Show or change where images are saved
    ImageDir {
        /// New folder for saved images
        path: Option<PathBuf>,
        /// Go back to the default folder
        #[arg(long, conflicts_with = "path")]
        reset: bool,
    },
    /// Start the interactive shell
    Shell,
}

#[derive(Subcommand, Debug, PartialEq)]
pub(crate) enum HistoryAction {
    /// List stored analyses, newest first
    #[command(visible_alias = "ls")]
    List,
    /// Show one stored analysis
    Show { id: String },
    /// Load a stored prompt and analysis into the draft
    Select { id: String },
    /// Delete one entry
    #[command(visible_alias = "rm")]
    Delete { id: String },
    /// Delete all entries
    Clear,
}

/// Words of a prompt argument joined back into one string
pub(crate) fn joined(words: &[String]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_words() {
        let cli = Cli::parse_from(["forgeiq", "analyze", "Write", "a", "haiku"]);
        match cli.command {
            Some(Commands::Analyze { prompt }) => {
                assert_eq!(joined(&prompt).as_deref(), Some("Write a haiku"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_subcommand_means_shell() {
        let cli = Cli::parse_from(["forgeiq", "-vv"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_history_actions() {
        let cli = Cli::parse_from(["forgeiq", "history", "rm", "abc"]);
        assert_eq!(
            cli.command,
            Some(Commands::History {
                action: Some(HistoryAction::Delete {
                    id: "abc".to_string()
                })
            })
        );
        let cli = Cli::parse_from(["forgeiq", "--ephemeral", "history"]);
        assert!(cli.ephemeral);
        assert_eq!(cli.command, Some(Commands::History { action: None }));
    }

    #[test]
    fn test_image_dir_reset_conflicts_with_path() {
        assert!(Cli::try_parse_from(["forgeiq", "image-dir", "/tmp", "--reset"]).is_err());
    }

    #[test]
    fn test_joined_empty() {
        assert_eq!(joined(&[]), None);
    }
}
