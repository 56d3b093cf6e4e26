//! Categorised user-facing messages
//!
//! Info and success go to stdout, warnings and errors to stderr, each with
//! its own colour and marker.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn marker(&self) -> &'static str {
        match self {
            Level::Info => "ℹ",
            Level::Success => "✓",
            Level::Warning => "⚠",
            Level::Error => "✗",
        }
    }

    fn color(&self) -> Color {
        match self {
            Level::Info => Color::Cyan,
            Level::Success => Color::Green,
            Level::Warning => Color::Yellow,
            Level::Error => Color::Red,
        }
    }
}

pub struct Console {
    choice: ColorChoice,
}

impl Default for Console {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

impl Console {
    pub fn new(choice: ColorChoice) -> Self {
        Self { choice }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.emit(Level::Info, msg.as_ref());
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.emit(Level::Success, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.emit(Level::Warning, msg.as_ref());
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.emit(Level::Error, msg.as_ref());
    }

    /// Indented continuation line without a marker
    pub fn detail(&self, msg: impl AsRef<str>) {
        let mut stdout = StandardStream::stdout(self.choice);
        let _ = writeln!(stdout, "   {}", msg.as_ref());
    }

    fn emit(&self, level: Level, msg: &str) {
        let mut stream = match level {
            Level::Info | Level::Success => StandardStream::stdout(self.choice),
            Level::Warning | Level::Error => StandardStream::stderr(self.choice),
        };
        let bold = matches!(level, Level::Error | Level::Success);
        let _ = stream.set_color(ColorSpec::new().set_fg(Some(level.color())).set_bold(bold));
        let _ = write!(stream, "{} ", level.marker());
        let _ = stream.reset();
        let _ = writeln!(stream, "{msg}");
    }
}
