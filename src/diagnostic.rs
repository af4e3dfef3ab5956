use crate::token::{Position, PositionedToken};
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Severity::Fatal => "Fatal",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        f.write_str(label)
    }
}

/// A message anchored, when possible, to the token that caused it.
#[derive(Debug, PartialEq, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub usage: Option<String>,
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            severity,
            message: message.into(),
            usage: None,
            position,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, message, None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message, None)
    }

    pub fn error_at(token: &PositionedToken, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message, Some(token.position.clone()))
    }

    pub fn warning_at(token: &PositionedToken, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message, Some(token.position.clone()))
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn line_number(&self) -> Option<usize> {
        self.position.as_ref().map(|p| p.line_number)
    }

    /// Sends the diagnostic through the `log` facade at its severity.
    pub fn report(&self) {
        match self.severity {
            Severity::Fatal | Severity::Error => log::error!("{}", self),
            Severity::Warning => log::warn!("{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;

        if let Some(position) = &self.position {
            let number = position.line_number.to_string();
            let gutter = " ".repeat(number.len());
            let width = position.end.saturating_sub(position.start).max(1);
            // Tabs are kept so the caret stays under the token.
            let padding: String = position
                .line
                .chars()
                .take(position.start)
                .map(|c| if c == '\t' { '\t' } else { ' ' })
                .collect();

            write!(
                f,
                "\n{}--> line {}, column {}\n{} |\n{} | {}\n{} | {}{}",
                gutter,
                position.line_number,
                position.start + 1,
                gutter,
                number,
                position.line,
                gutter,
                padding,
                "^".repeat(width),
            )?;
        }

        if let Some(usage) = &self.usage {
            write!(f, "\nUsage: {}", usage)?;
        }

        Ok(())
    }
}
