//! Terminal rendering of notices, analyses, history and results

use crate::history::PromptRecord;
use crate::prompts::EXAMPLE_PROMPTS;
use crate::response::{AnalysisResult, GeneratedImage, SimulationResult, MAX_QUALITY_SCORE};
use crate::session::Notice;
use chrono::{DateTime, Local, Utc};
use colored::*;

/// Longest prompt preview shown in history listings
const PREVIEW_CHARS: usize = 60;

pub(crate) fn notice(notice: &Notice) -> String {
    match notice {
        Notice::Success(msg) => format!("{} {}", "✓".green().bold(), msg),
        Notice::Info(msg) => format!("{} {}", "i".cyan().bold(), msg),
        Notice::Invalid(err) => format!("{} {}", "!".yellow().bold(), err),
        Notice::Failed(msg) => format!("{} {}", "✗".red().bold(), msg.red()),
    }
}

/// Score coloured by band: 8+ green, 5+ yellow, else red
fn score(value: u8) -> ColoredString {
    let text = format!("{}/{}", value, MAX_QUALITY_SCORE);
    if value >= 8 {
        text.green().bold()
    } else if value >= 5 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

fn bullet_section(out: &mut String, title: ColoredString, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}\n", title));
    for item in items {
        out.push_str(&format!("  • {}\n", item));
    }
}

pub(crate) fn analysis(result: &AnalysisResult) -> String {
    let mut out = format!(
        "{} {}   {} {}\n\n{}\n",
        "Score:".bold(),
        score(result.quality_score),
        "Level:".bold(),
        result.difficulty_level.to_string().cyan(),
        result.summary
    );
    bullet_section(&mut out, "Strengths".green().bold(), &result.strengths);
    bullet_section(&mut out, "Weaknesses".red().bold(), &result.weaknesses);
    bullet_section(&mut out, "Suggestions".yellow().bold(), &result.suggestions);
    out.push_str(&format!(
        "\n{}\n{}\n",
        "Improved prompt".purple().bold(),
        result.improved_prompt
    ));
    out
}

/// "Just now", "5m ago", "3h ago", "2d ago", or the date after a week
pub(crate) fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d")
            .to_string()
    }
}

/// First line of a prompt, shortened for listings
fn preview(prompt: &str) -> String {
    let line = prompt.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS || prompt.lines().nth(1).is_some() {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut.trim_end())
    } else {
        line.to_string()
    }
}

pub(crate) fn history(records: &[PromptRecord], now: DateTime<Utc>) -> String {
    if records.is_empty() {
        return "No history yet. Your analyzed prompts will appear here.\n".dimmed().to_string();
    }

    let mut out = format!("{} ({})\n", "History".bold(), records.len());
    for record in records {
        let score_text = record
            .analysis
            .as_ref()
            .map(|a| score(a.quality_score).to_string())
            .unwrap_or_else(|| "-".dimmed().to_string());
        out.push_str(&format!(
            "  {}  {:>9}  {:>6}  {}\n",
            record.id.dimmed(),
            relative_time(record.created_at, now),
            score_text,
            preview(&record.original_prompt)
        ));
    }
    out
}

pub(crate) fn record(record: &PromptRecord) -> String {
    let mut out = format!(
        "{} {}\n{}\n\n",
        "Prompt".bold(),
        record.id.dimmed(),
        record.original_prompt
    );
    match &record.analysis {
        Some(result) => out.push_str(&analysis(result)),
        None => out.push_str(&"No analysis stored.\n".dimmed().to_string()),
    }
    out
}

pub(crate) fn simulation(result: &SimulationResult) -> String {
    let mut out = format!("{}\n{}\n", "Output".blue().bold(), result.output);
    if !result.citations.is_empty() {
        out.push_str(&format!("\n{}\n", "Sources".bold()));
        for (i, citation) in result.citations.iter().enumerate() {
            out.push_str(&format!(
                "  [{}] {} {}\n",
                i + 1,
                citation.title,
                citation.uri.dimmed()
            ));
        }
    }
    out
}

pub(crate) fn images(images: &[GeneratedImage]) -> String {
    if images.is_empty() {
        return "No images generated this session.\n".dimmed().to_string();
    }
    let mut out = String::new();
    for (i, image) in images.iter().enumerate() {
        let kind = if image.url.starts_with("data:") {
            "inline"
        } else {
            "external"
        };
        out.push_str(&format!(
            "  {}. {} ({}, {})\n",
            i + 1,
            preview(&image.prompt),
            kind,
            image.created_at.with_timezone(&Local).format("%H:%M:%S")
        ));
    }
    out
}

pub(crate) fn examples() -> String {
    let mut out = format!("{}\n", "Prompt starters".bold());
    for (i, example) in EXAMPLE_PROMPTS.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {}  {}\n",
            i + 1,
            example.title.cyan(),
            preview(example.prompt).dimmed()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::history::tests::sample_analysis;
    use crate::response::Citation;
    use chrono::Duration;

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::seconds(30), now), "Just now");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2d ago");

        let old = now - Duration::days(30);
        assert_eq!(
            relative_time(old, now),
            old.with_timezone(&Local).format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview("line one\nline two"), "line one…");
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 1);
    }

    #[test]
    fn test_analysis_contains_sections() {
        let text = analysis(&sample_analysis(7));
        assert!(text.contains("7/10"));
        assert!(text.contains("Intermediate"));
        assert!(text.contains("concise"));
        assert!(text.contains("no imagery constraint"));
        assert!(text.contains("improved 7"));
    }

    #[test]
    fn test_simulation_numbers_citations() {
        let text = simulation(&SimulationResult {
            output: "answer".to_string(),
            citations: vec![
                Citation {
                    title: "A".to_string(),
                    uri: "https://a.example".to_string(),
                },
                Citation {
                    title: "B".to_string(),
                    uri: "https://b.example".to_string(),
                },
            ],
        });
        assert!(text.contains("[1] A"));
        assert!(text.contains("[2] B"));
    }

    #[test]
    fn test_notice_includes_message() {
        assert!(notice(&Notice::Invalid(ValidationError::EmptyPrompt))
            .contains("Please enter a prompt to analyze."));
        assert!(notice(&Notice::success("Analysis complete!")).contains("Analysis complete!"));
    }

    #[test]
    fn test_empty_history_message() {
        assert!(history(&[], Utc::now()).contains("No history yet"));
    }
}
