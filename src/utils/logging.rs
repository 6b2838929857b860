// file: src/utils/logging.rs
// description: Tracing subscriber initialization and colored console output

use crate::models::QueryResult;
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins over the verbosity flag when set.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    colored::control::set_override(colored_output);
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

pub fn format_step(step: usize, total: usize, msg: &str) -> String {
    format!("{} {}", format!("[{}/{}]", step, total).cyan().bold(), msg)
}

/// Renders one ranked match: title, content, then the percentage score.
pub fn format_match(rank: usize, result: &QueryResult) -> String {
    let title = result.document.title().unwrap_or("(untitled)");
    format!(
        "{} {}\n{}\n{} {:.2} %",
        format!("{}.", rank).cyan().bold(),
        title.bold(),
        result.document.content,
        "Match score:".dimmed(),
        result.score_percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, DocumentId, NewDocument};

    #[test]
    fn test_format_match_contains_score_and_title() {
        colored::control::set_override(false);
        let doc = Document::from_new(
            DocumentId(0),
            NewDocument::new("Faiss content").with_meta("title", "Faiss"),
        );
        let line = format_match(1, &QueryResult::new(doc, 0.4321));
        assert!(line.contains("1. Faiss"));
        assert!(line.contains("Match score: 43.21 %"));
    }

    #[test]
    fn test_format_step() {
        colored::control::set_override(false);
        assert_eq!(format_step(2, 4, "embed"), "[2/4] embed");
    }
}
