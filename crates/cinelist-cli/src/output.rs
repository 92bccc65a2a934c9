use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

#[derive(Debug, Clone, Copy)]
enum MessageKind {
    Success,
    Info,
    Warning,
    Error,
}

impl MessageKind {
    fn label(self) -> &'static str {
        match self {
            MessageKind::Success => "success",
            MessageKind::Info => "info",
            MessageKind::Warning => "warning",
            MessageKind::Error => "error",
        }
    }
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message(MessageKind::Success, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message(MessageKind::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message(MessageKind::Warning, msg.as_ref());
    }

    /// Errors are shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        self.message(MessageKind::Error, msg.as_ref());
    }

    /// Print a human-readable block (tables, detail views); ignored for JSON output
    pub fn block(&self, text: impl AsRef<str>) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("{}", text.as_ref());
    }

    /// Print a JSON document; ignored for human output
    pub fn json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Human => {}
            OutputFormat::Json => println!("{}", serde_json::to_string(data).unwrap_or_default()),
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default())
            }
        }
    }

    fn message(&self, kind: MessageKind, msg: &str) {
        if self.quiet && !matches!(kind, MessageKind::Error) {
            return;
        }

        match self.format {
            OutputFormat::Human => match kind {
                MessageKind::Success => println!("{} {}", "✓".green(), msg),
                MessageKind::Info => println!("{}", msg),
                MessageKind::Warning => println!("{} {}", "⚠".yellow(), msg),
                MessageKind::Error => eprintln!("{} {}", "✗".red(), msg),
            },
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.json(&json!({
                    "type": kind.label(),
                    "message": msg,
                }));
            }
        }
    }
}
