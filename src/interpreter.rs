use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::dispatcher::{Dispatcher, Progress};
use crate::driver::Driver;
use crate::error::AxiError;
use crate::fetch::is_url;
use crate::lexer::lex_line;
use crate::token::{FileState, Kind};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow {
    Continue,
    Exit,
}

/// Turns whitespace control characters into spaces, drops the other
/// non-printable ones and trims the result.
pub fn sanitize(line: &str) -> String {
    line.chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() {
                None
            } else {
                Some(c)
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// A read-eval-print session over one long-lived dispatcher. Mode, options
/// and history survive from one line to the next.
pub struct Interpreter<D: Driver> {
    dispatcher: Dispatcher<D>,
    state: FileState,
    dispatched: usize,
    pending: bool,
    history: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    line_number: usize,
    prompt: String,
    continuation_prompt: String,
}

impl<D: Driver> Interpreter<D> {
    pub fn new(dispatcher: Dispatcher<D>, config: &Config) -> Self {
        Self {
            dispatcher,
            state: FileState::new(),
            dispatched: 0,
            pending: false,
            history: Vec::new(),
            diagnostics: Vec::new(),
            line_number: 0,
            prompt: config.prompt.clone(),
            continuation_prompt: config.continuation_prompt(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<D> {
        &self.dispatcher
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Problems found by the session itself (lexing, `source`); command
    /// errors are kept by the dispatcher.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn file_state(&self) -> &FileState {
        &self.state
    }

    /// True while an OPTS/UOPTS block is waiting for its terminator.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn prompt(&self) -> &str {
        if self.pending {
            &self.continuation_prompt
        } else {
            &self.prompt
        }
    }

    pub fn run(&mut self) -> Result<(), AxiError> {
        let mut editor = DefaultEditor::new()?;
        log::info!("Type 'help' for a list of commands.");

        loop {
            match editor.readline(self.prompt()) {
                Ok(line) => {
                    let input = sanitize(&line);
                    if !input.is_empty() {
                        let _ = editor.add_history_entry(input.as_str());
                    }
                    if self.handle_line(&input)? == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => self.interrupt(),
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::info!("Exiting interpreter.");
        Ok(())
    }

    /// Drops any half-entered option block; the session itself stays intact.
    pub fn interrupt(&mut self) {
        if self.pending {
            log::info!("Discarded unfinished option block.");
        }
        self.dispatcher.abandon_block();
        self.pending = false;
        self.dispatched = self.state.len();
        log::info!("Interrupted. Type 'exit' to leave the interpreter.");
    }

    pub fn handle_line(&mut self, line: &str) -> Result<Flow, AxiError> {
        let input = sanitize(line);
        if input.is_empty() {
            return Ok(Flow::Continue);
        }

        let (word, rest) = match input.split_once(' ') {
            Some((word, rest)) => (word, rest.trim()),
            None => (input.as_str(), ""),
        };

        match word.to_lowercase().as_str() {
            "help" if rest.is_empty() => self.print_help(),
            "history" if rest.is_empty() => self.print_history(),
            "clear" if rest.is_empty() => self.clear_history(),
            "exit" if rest.is_empty() => return Ok(Flow::Exit),
            "eol" if rest.is_empty() => {
                if let Some(last) = self.history.last().cloned() {
                    self.history.push(last.clone());
                    self.run_script_line(&last)?;
                }
            }
            "source" => {
                let target = rest.to_string();
                self.source(&target)?;
            }
            _ => {
                self.history.push(input.clone());
                self.run_script_line(&input)?;
            }
        }

        Ok(Flow::Continue)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.report();
        self.diagnostics.push(diagnostic);
    }

    fn run_script_line(&mut self, text: &str) -> Result<(), AxiError> {
        self.line_number += 1;
        let output = lex_line(text, self.line_number);

        let runnable = output
            .tokens
            .tokens()
            .iter()
            .any(|t| !matches!(t.kind(), Kind::EndOfFile | Kind::Unknown));
        if !runnable {
            for diagnostic in output.diagnostics {
                self.report(diagnostic);
            }
            return Ok(());
        }

        self.state.extend(
            output
                .tokens
                .into_iter()
                .filter(|t| t.kind() != Kind::EndOfFile),
        );

        let seen = self.dispatcher.diagnostics().len();
        let result = self.dispatcher.dispatch(self.state.slice_from(self.dispatched));

        // Unknown tokens that recovery skipped over were never reported.
        let fresh = &self.dispatcher.diagnostics()[seen..];
        let skipped: Vec<Diagnostic> = output
            .diagnostics
            .into_iter()
            .filter(|d| !fresh.iter().any(|f| f.position == d.position))
            .collect();
        for diagnostic in skipped {
            self.report(diagnostic);
        }

        match result {
            Ok(Progress::Incomplete { resume_at }) => {
                self.dispatched += resume_at;
                self.pending = true;
            }
            Ok(Progress::Discarding) => {
                self.dispatched = self.state.len();
                self.pending = true;
            }
            Ok(Progress::Complete) => {
                self.dispatched = self.state.len();
                self.pending = false;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {
                self.dispatched = self.state.len();
                self.pending = false;
            }
        }

        Ok(())
    }

    /// Runs every non-empty line of a file (or downloaded URL) as script text.
    pub fn source(&mut self, target: &str) -> Result<(), AxiError> {
        let target = target.trim_matches('"');
        if target.is_empty() {
            self.report(Diagnostic::error("No file specified.").with_usage("source <PATH|URL>"));
            return Ok(());
        }

        let downloaded = is_url(target);
        let path = if downloaded {
            self.dispatcher.fetcher().fetch(target)?
        } else {
            PathBuf::from(target)
        };

        let result = self.source_file(&path);
        if downloaded {
            let _ = fs::remove_file(&path);
        }
        result
    }

    fn source_file(&mut self, path: &Path) -> Result<(), AxiError> {
        let file = match fs::metadata(path) {
            Err(_) => Err(format!("File '{}' does not exist.", path.display())),
            Ok(metadata) if !metadata.is_file() => {
                Err(format!("'{}' is not a regular file.", path.display()))
            }
            Ok(_) => File::open(path)
                .map_err(|e| format!("Could not open file '{}': {}", path.display(), e)),
        };

        let file = match file {
            Ok(file) => file,
            Err(message) => {
                self.report(Diagnostic::error(message));
                return Ok(());
            }
        };

        let mut count = 0;
        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.report(Diagnostic::error(format!("Could not read '{}': {}", path.display(), e)));
                    break;
                }
            };

            let text = sanitize(&line);
            if text.is_empty() {
                continue;
            }
            self.run_script_line(&text)?;
            count += 1;
        }

        log::info!("Sourced {} line(s) from {}.", count, path.display());
        Ok(())
    }

    fn print_help(&self) {
        log::info!("AxiLang {}", env!("CARGO_PKG_VERSION"));
        log::info!("Available commands:");
        log::info!("  exit: Exit the interpreter.");
        log::info!("  history: Show the command history.");
        log::info!("  clear: Clear the command history.");
        log::info!("  eol: Run the last command again.");
        log::info!("  source <path|url>: Run every line of a script file.");
        log::info!("  help: Show this help message.");
        log::info!("Script commands:");
        log::info!("  MODE <I|P>, OPTS ... END_OPTS, UOPTS ... END_UOPTS");
        log::info!("  CONNECT, DISCONNECT, PENUP, PENDOWN, PENTOGGLE, HOME");
        log::info!("  GOTO <X> <Y>, GOTO_REL <X> <Y>, DRAW <X> <Y> ..., WAIT <MS>");
        log::info!("  GETPOS, GETPEN, SETPLOT \"<PATH|URL>\", PLOT");
    }

    fn print_history(&self) {
        if self.history.is_empty() {
            log::info!("Command history is empty.");
            return;
        }

        log::info!("Command history:");
        for (i, line) in self.history.iter().enumerate() {
            log::info!("  {}: {}", i + 1, line);
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
        log::info!("Cleared command history.");
    }
}
