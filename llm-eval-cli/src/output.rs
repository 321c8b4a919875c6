//! Output formatting for CLI

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use llm_eval_core::{EvalReport, Sample};
use llm_eval_workflow::Shard;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Output writer that handles different formats
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn write_report(&self, report: &EvalReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => print_json(report),
            OutputFormat::Table => {
                if report.metrics.is_empty() {
                    println!("{}", "No metrics computed.".dimmed());
                } else {
                    let mut table = new_table(&["Metric", "Score"]);
                    for (key, score) in &report.metrics {
                        table.add_row(vec![Cell::new(key), score_cell(*score)]);
                    }
                    println!("{table}");
                }
                if !report.output_files.is_empty() {
                    print_section("Artifacts");
                    for path in &report.output_files {
                        println!("  {}", path.display());
                    }
                }
                Ok(())
            }
        }
    }

    /// Writes at most `limit` samples; the total is always reported.
    pub fn write_samples(&self, samples: &[Sample], limit: Option<usize>) -> Result<()> {
        let shown = &samples[..limit.unwrap_or(samples.len()).min(samples.len())];
        match self.format {
            OutputFormat::Json => print_json(shown),
            OutputFormat::Table => {
                if samples.is_empty() {
                    println!("{}", "No samples found.".dimmed());
                    return Ok(());
                }
                let mut table = new_table(&["Index", "Question", "Reference", "Hypothesis"]);
                for sample in shown {
                    table.add_row(sample.to_row());
                }
                println!("{table}");
                println!(
                    "\n{} {} of {} sample(s)",
                    "Shown:".bold(),
                    shown.len().to_string().green(),
                    samples.len()
                );
                Ok(())
            }
        }
    }

    pub fn write_shard(&self, shard: &Shard) -> Result<()> {
        match self.format {
            OutputFormat::Json => print_json(shard),
            OutputFormat::Table => {
                let mut table = new_table(&["Batch", "Indices"]);
                for (n, batch) in shard.batches().enumerate() {
                    table.add_row(vec![Cell::new(n), Cell::new(format_indices(batch))]);
                }
                println!("{table}");
                println!(
                    "\n{} rank {} owns {} index(es) in {} batch(es)",
                    "Total:".bold(),
                    shard.rank,
                    shard.len().to_string().green(),
                    shard.num_batches()
                );
                Ok(())
            }
        }
    }

    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("{} {}", "✓".green(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("{} {}", "ℹ".blue(), message);
        }
    }
}

/// Trait for displaying items in a table
pub trait TableDisplay {
    fn to_row(&self) -> Vec<Cell>;
}

impl TableDisplay for Sample {
    fn to_row(&self) -> Vec<Cell> {
        let hypothesis = if self.hypothesis.trim() == self.reference.trim() {
            Cell::new(truncate(&self.hypothesis, 60)).fg(Color::Green)
        } else {
            Cell::new(truncate(&self.hypothesis, 60))
        };
        vec![
            Cell::new(self.index),
            Cell::new(truncate(&self.question, 60)),
            Cell::new(truncate(&self.reference, 60)),
            hypothesis,
        ]
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect::<Vec<_>>());
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", title.bold().underline());
}

fn score_cell(score: f64) -> Cell {
    let color = if score >= 0.8 {
        Color::Green
    } else if score >= 0.5 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{:.4}", score)).fg(color)
}

/// Shortens on a char boundary and marks the cut with `…`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}

/// Collapses consecutive runs: `[0, 1, 2, 6, 7]` → `0-2, 6-7`.
pub fn format_indices(indices: &[usize]) -> String {
    let mut parts = Vec::new();
    let mut iter = indices.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("午後3時です", 3), "午後…");
    }

    #[test]
    fn test_format_indices() {
        assert_eq!(format_indices(&[]), "");
        assert_eq!(format_indices(&[4]), "4");
        assert_eq!(format_indices(&[0, 1, 2, 6, 7]), "0-2, 6-7");
        assert_eq!(format_indices(&[0, 2, 4]), "0, 2, 4");
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
