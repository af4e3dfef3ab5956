//! AxiLang: a small scripting language for sequencing AxiDraw plotter
//! operations, run either as a batch file or as an interactive session.
//!
//! Text goes through the [`lexer`] into a [`token::FileState`], the
//! [`dispatcher::Dispatcher`] executes it against a [`driver::Driver`], and
//! the [`interpreter::Interpreter`] wraps both in a read-eval-print loop.

pub mod command;
pub mod config;
pub mod diagnostic;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod interpreter;
pub mod lexer;
pub mod token;

pub use config::Config;
pub use diagnostic::{Diagnostic, Severity};
pub use dispatcher::{Dispatcher, Progress};
pub use driver::{Driver, DriverError, Mode, SimulatedDriver};
pub use error::AxiError;
pub use fetch::Fetcher;
pub use interpreter::{Flow, Interpreter};
pub use lexer::{lex_line, Lexer};
