use crate::diagnostic::Diagnostic;
use crate::fetch::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AxiError {
    #[error("FileNotFoundError: {0}")]
    FileNotFound(String),
    #[error("EmptyFileError: '{0}' is empty")]
    EmptyFile(String),
    #[error("IOError: {0}")]
    IO(#[from] std::io::Error),
    #[error("LexingError: {} unknown token(s)", .0.len())]
    Lexing(Vec<Diagnostic>),
    #[error("{0}")]
    Command(Diagnostic),
    #[error("FetchError: {0}")]
    Fetch(#[from] FetchError),
    #[error("DriverError: {0}")]
    Driver(String),
    #[error("ReadlineError: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl AxiError {
    /// Fatal errors end the process in every mode; the rest only end it in
    /// strict mode.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AxiError::Command(_) | AxiError::Lexing(_))
    }
}
