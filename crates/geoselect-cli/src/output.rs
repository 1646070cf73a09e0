use console::{style, StyledObject};
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl Level {
    fn status(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }

    fn marker(self) -> StyledObject<&'static str> {
        match self {
            Level::Success => style("✓").green().bold(),
            Level::Info => style("ℹ").blue().bold(),
            Level::Warning => style("⚠").yellow().bold(),
            Level::Error => style("✗").red().bold(),
        }
    }

    /// Warnings and errors stay off stdout
    fn to_stderr(self) -> bool {
        matches!(self, Level::Warning | Level::Error)
    }
}

/// Writes command results either as styled text or as JSON envelopes
/// (`{"status": ..., "data": ...}` / `{"status": ..., "message": ...}`)
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        let format = if json { OutputFormat::Json } else { OutputFormat::Human };
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    fn message(&self, level: Level, message: impl Display) {
        let line = match self.format {
            OutputFormat::Human => format!("{} {}", level.marker(), message),
            OutputFormat::Json => {
                let envelope = serde_json::json!({
                    "status": level.status(),
                    "message": message.to_string(),
                });
                serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| envelope.to_string())
            }
        };

        if level.to_stderr() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    pub fn success(&self, message: impl Display) {
        self.message(Level::Success, message);
    }

    pub fn info(&self, message: impl Display) {
        self.message(Level::Info, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.message(Level::Warning, message);
    }

    pub fn error(&self, message: impl Display) {
        self.message(Level::Error, message);
    }

    /// Rows as a rounded table, or as the `data` array in JSON mode
    pub fn table<T: Tabled + Serialize>(&self, rows: Vec<T>) -> anyhow::Result<()> {
        if self.is_json() {
            return self.result(rows);
        }

        if rows.is_empty() {
            println!("{}", style("(no data)").dim());
        } else {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
        Ok(())
    }

    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let rendered = match self.format {
            OutputFormat::Human => serde_json::to_string_pretty(&data)?,
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "status": "success",
                "data": data,
            }))?,
        };
        println!("{}", rendered);
        Ok(())
    }

    /// Human mode only; JSON output carries these fields in `result`
    pub fn kv(&self, key: impl Display, value: impl Display) {
        if !self.is_json() {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if !self.is_json() {
            println!("\n{}", style(title).bold().underlined());
        }
    }
}
