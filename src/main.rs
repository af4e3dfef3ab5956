use axilang::diagnostic::Diagnostic;
use axilang::fetch::is_url;
use axilang::{AxiError, Config, Dispatcher, Fetcher, Interpreter, Lexer, Progress, SimulatedDriver};
use clap::Parser as ClapParser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(
    author,
    about = "AxiLang (unofficial) - A scripting language for controlling the AxiDraw plotter.",
    disable_version_flag = true
)]
struct Cli {
    /// Script file or http(s) URL to run
    #[arg(short, long, value_name = "PATH|URL")]
    file: Option<String>,
    /// Script file, when --file is not given
    #[arg(value_name = "FILE", conflicts_with = "file")]
    input: Option<String>,
    /// Start an interactive session
    #[arg(short, long)]
    interactive: bool,
    /// Print debug output
    #[arg(short, long)]
    debug: bool,
    /// Print version number
    #[arg(short = 'v', long)]
    version: bool,
}

fn init_logger() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Debug).init() {
        eprintln!("Could not start logger: {}", e);
    }
}

fn run_path(path: &Path, fetcher: Fetcher, config: &Config) -> Result<(), AxiError> {
    let metadata = fs::metadata(path).map_err(|_| {
        AxiError::FileNotFound(format!("File '{}' does not exist.", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(AxiError::FileNotFound(format!(
            "'{}' is not a regular file.",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(AxiError::EmptyFile(path.display().to_string()));
    }

    if config.debug {
        log::debug!("Parsing file '{}'.", path.display());
    }

    let file = File::open(path)?;
    let output = Lexer::new(BufReader::new(file)).tokenize()?;
    if !output.diagnostics.is_empty() {
        for diagnostic in &output.diagnostics {
            diagnostic.report();
        }
        return Err(AxiError::Lexing(output.diagnostics));
    }

    let mut dispatcher = Dispatcher::new(SimulatedDriver::new(), fetcher, true, config);
    match dispatcher.dispatch(output.tokens.tokens())? {
        Progress::Complete => Ok(()),
        Progress::Incomplete { .. } | Progress::Discarding => {
            let diagnostic = Diagnostic::error("Script ended inside an option block.");
            diagnostic.report();
            Err(AxiError::Command(diagnostic))
        }
    }
}

fn run_file(target: &str, config: &Config) -> Result<(), AxiError> {
    let fetcher = Fetcher::new(config);
    let downloaded = is_url(target);
    let path = if downloaded {
        fetcher.fetch(target)?
    } else {
        PathBuf::from(target)
    };

    let result = run_path(&path, fetcher, config);
    if downloaded {
        let _ = fs::remove_file(&path);
    }
    result
}

fn run_interactive(script: Option<&str>, config: &Config) -> Result<(), AxiError> {
    let dispatcher = Dispatcher::new(SimulatedDriver::new(), Fetcher::new(config), false, config);
    let mut interpreter = Interpreter::new(dispatcher, config);

    if let Some(script) = script {
        interpreter.source(script)?;
    }
    interpreter.run()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("Version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_logger();
    let mut config = Config::load();
    config.debug |= cli.debug;
    log::set_max_level(if config.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let script = cli.file.or(cli.input);
    let result = match (script.as_deref(), cli.interactive) {
        (script, true) => run_interactive(script, &config),
        (Some(script), false) => run_file(script, &config),
        (None, false) => {
            Diagnostic::fatal("No input file specified.")
                .with_usage("axilang [--file] <PATH|URL> [--interactive] [--debug]")
                .report();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Command and lexing errors were reported where they happened.
            if e.is_fatal() {
                Diagnostic::fatal(e.to_string()).report();
            }
            ExitCode::FAILURE
        }
    }
}
