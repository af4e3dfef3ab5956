use crate::command::{Command, OptionBlock, Setting};
use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::driver::{Driver, DriverError, DriverResult, Mode, Model, PathPoint, Point, Units};
use crate::error::AxiError;
use crate::fetch::{is_url, Fetcher};
use crate::token::{Kind, PositionedToken};
use std::fs::{self, File};
use std::path::PathBuf;

const MODE_USAGE: &str = "MODE <I|P>";
const DRAW_USAGE: &str = "DRAW <X> <Y> <X> <Y> ...";
const SETPLOT_USAGE: &str = "SETPLOT \"<PATH|URL>\"";
const GENERAL_OPTIONS: &str =
    "ACCEL, PENU_POS, PEND_POS, PENU_DELAY, PEND_DELAY, PENU_SPEED, PEND_SPEED, PENU_RATE, PEND_RATE, MODEL, PORT";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Progress {
    Complete,
    /// The tokens ran out inside an option block that starts at `resume_at`.
    Incomplete { resume_at: usize },
    /// A rejected option block is still open; later tokens are dropped until
    /// its terminator arrives.
    Discarding,
}

enum Step {
    Run(Command),
    Incomplete,
    EndOfFile,
}

enum Fault {
    Warning(Diagnostic),
    Error(Diagnostic),
    Fatal(AxiError),
}

fn driver_fault(error: DriverError, anchor: &PositionedToken) -> Fault {
    match error {
        DriverError::Unsupported(_) => Fault::Warning(Diagnostic::warning_at(anchor, error.to_string())),
        DriverError::Rejected(message) => Fault::Error(Diagnostic::error_at(anchor, message)),
        DriverError::Fatal(message) => Fault::Fatal(AxiError::Driver(message)),
    }
}

fn number(token: Option<&PositionedToken>) -> Option<f64> {
    token
        .filter(|t| t.kind() == Kind::Number)
        .and_then(|t| t.value().parse().ok())
}

fn integer(token: &PositionedToken) -> Option<u32> {
    if token.kind() == Kind::Number {
        token.value().parse().ok()
    } else {
        None
    }
}

/// Index just past the next block terminator, or of the `EndOfFile` token.
/// `None` when the tokens run out first.
fn skip_block(tokens: &[PositionedToken], mut index: usize) -> Option<usize> {
    while let Some(token) = tokens.get(index) {
        match token.kind() {
            Kind::EndOpts | Kind::EndUOpts => return Some(index + 1),
            Kind::EndOfFile => return Some(index),
            _ => index += 1,
        }
    }
    None
}

/// Executes positioned tokens against a `Driver`.
///
/// In strict mode the first error stops dispatch and is returned. Otherwise
/// the error is reported, the rest of the offending line is skipped and
/// dispatch carries on. Fatal errors are always returned.
pub struct Dispatcher<D: Driver> {
    driver: D,
    fetcher: Fetcher,
    strict: bool,
    debug: bool,
    mode: Mode,
    plot_ready: bool,
    discarding: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<D: Driver> Dispatcher<D> {
    pub fn new(driver: D, fetcher: Fetcher, strict: bool, config: &Config) -> Self {
        Self {
            driver,
            fetcher,
            strict,
            debug: config.debug,
            mode: Mode::Unset,
            plot_ready: false,
            discarding: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_mode_set(&self) -> bool {
        self.mode != Mode::Unset
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// True while the remainder of a rejected option block is being dropped.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Forgets a rejected option block that was never closed.
    pub fn abandon_block(&mut self) {
        self.discarding = false;
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Every error and warning reported so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn dispatch(&mut self, tokens: &[PositionedToken]) -> Result<Progress, AxiError> {
        let mut index = 0;

        if self.discarding {
            match skip_block(tokens, 0) {
                Some(next) => {
                    self.discarding = false;
                    index = next;
                }
                None => return Ok(Progress::Discarding),
            }
        }

        while index < tokens.len() {
            let start = index;
            let anchor = &tokens[start];

            let step = match self.read_command(tokens, &mut index) {
                Ok(step) => step,
                Err(diagnostic) => {
                    index = self.recover(diagnostic, anchor, tokens, index.max(start + 1))?;
                    continue;
                }
            };

            let command = match step {
                Step::Run(command) => command,
                Step::Incomplete => return Ok(Progress::Incomplete { resume_at: start }),
                Step::EndOfFile => return Ok(Progress::Complete),
            };

            if self.debug {
                log::debug!(
                    "Line {}: {} ({})",
                    anchor.line_number(),
                    command.name(),
                    anchor.kind().type_name()
                );
            }

            match self.execute(command, anchor) {
                Ok(()) => {}
                Err(Fault::Warning(diagnostic)) => self.warn(diagnostic),
                Err(Fault::Error(diagnostic)) => {
                    index = self.recover(diagnostic, anchor, tokens, index)?
                }
                Err(Fault::Fatal(error)) => return Err(error),
            }
        }

        if self.discarding {
            return Ok(Progress::Discarding);
        }
        Ok(Progress::Complete)
    }

    fn warn(&mut self, diagnostic: Diagnostic) {
        diagnostic.report();
        self.diagnostics.push(diagnostic);
    }

    /// Skips what is left of the line `command` starts on.
    fn recover(
        &mut self,
        diagnostic: Diagnostic,
        command: &PositionedToken,
        tokens: &[PositionedToken],
        mut index: usize,
    ) -> Result<usize, AxiError> {
        diagnostic.report();
        self.diagnostics.push(diagnostic.clone());

        if self.strict {
            return Err(AxiError::Command(diagnostic));
        }

        while let Some(token) = tokens.get(index) {
            if token.kind() == Kind::EndOfFile || token.line_number() > command.line_number() {
                break;
            }
            index += 1;
        }

        Ok(index)
    }

    fn require_mode(&self, token: &PositionedToken) -> Result<(), Diagnostic> {
        if self.is_mode_set() {
            Ok(())
        } else {
            Err(Diagnostic::error_at(token, "No mode specified. Please set a mode first.")
                .with_usage(MODE_USAGE))
        }
    }

    fn require_interactive(&self, token: &PositionedToken) -> Result<(), Diagnostic> {
        self.require_mode(token)?;

        if self.mode != Mode::Interactive || self.driver.current_mode() != Mode::Interactive {
            return Err(Diagnostic::error_at(
                token,
                format!("{} can only be used in interactive mode.", token.value()),
            ));
        }
        Ok(())
    }

    fn require_plot(&self, token: &PositionedToken) -> Result<(), Diagnostic> {
        self.require_mode(token)?;

        if self.mode != Mode::Plot {
            return Err(Diagnostic::error_at(
                token,
                format!("{} can only be used in plot mode.", token.value()),
            ));
        }
        Ok(())
    }

    fn read_command(
        &mut self,
        tokens: &[PositionedToken],
        index: &mut usize,
    ) -> Result<Step, Diagnostic> {
        let token = &tokens[*index];
        *index += 1;

        if token.kind().is_interactive_command() {
            self.require_interactive(token)?;
        }

        let command = match token.kind() {
            Kind::EndOfFile => return Ok(Step::EndOfFile),
            Kind::Mode => self.read_mode(token, tokens, index)?,
            Kind::Opts => {
                self.require_mode(token)?;
                return self.read_options(OptionBlock::Opts, token, tokens, index);
            }
            Kind::UOpts => {
                self.require_interactive(token)?;
                return self.read_options(OptionBlock::UOpts, token, tokens, index);
            }
            Kind::Connect => Command::Connect,
            Kind::Disconnect => Command::Disconnect,
            Kind::PenUp => Command::PenUp,
            Kind::PenDown => Command::PenDown,
            Kind::PenToggle => Command::PenToggle,
            Kind::Home => Command::Home,
            Kind::GetPos => Command::GetPosition,
            Kind::GetPen => Command::GetPen,
            Kind::GoTo => Command::GoTo(self.read_point(token, tokens, index, "GOTO <X> <Y>")?),
            Kind::GoToRelative => {
                Command::GoToRelative(self.read_point(token, tokens, index, "GOTO_REL <X> <Y>")?)
            }
            Kind::Draw => Command::Draw(self.read_path(token, tokens, index)?),
            Kind::Wait => {
                let ms = number(tokens.get(*index)).ok_or_else(|| {
                    Diagnostic::error_at(tokens.get(*index).unwrap_or(token), "Invalid wait time specified.")
                        .with_usage("WAIT <MS>")
                })?;
                *index += 1;
                Command::Wait(ms)
            }
            Kind::SetPlot => {
                self.require_plot(token)?;
                match tokens.get(*index) {
                    Some(path) if path.kind() == Kind::String && !path.value().is_empty() => {
                        *index += 1;
                        Command::SetPlot(path.value().to_string())
                    }
                    next => {
                        return Err(Diagnostic::error_at(
                            next.unwrap_or(token),
                            "No file path/internet URL specified.",
                        )
                        .with_usage(SETPLOT_USAGE))
                    }
                }
            }
            Kind::Plot => {
                self.require_plot(token)?;
                Command::Plot
            }
            Kind::Unknown => {
                return Err(Diagnostic::error_at(
                    token,
                    format!("Unknown token '{}'", token.value()),
                ))
            }
            Kind::PlotMode
            | Kind::InteractiveMode
            | Kind::EndOpts
            | Kind::EndUOpts
            | Kind::Acceleration
            | Kind::PenUpPosition
            | Kind::PenDownPosition
            | Kind::PenUpDelay
            | Kind::PenDownDelay
            | Kind::PenUpSpeed
            | Kind::PenDownSpeed
            | Kind::PenUpRate
            | Kind::PenDownRate
            | Kind::Model
            | Kind::Port
            | Kind::Units
            | Kind::Number
            | Kind::String => {
                return Err(Diagnostic::error_at(
                    token,
                    format!("Unexpected token '{}'", token.value()),
                ))
            }
        };

        Ok(Step::Run(command))
    }

    fn read_mode(
        &self,
        token: &PositionedToken,
        tokens: &[PositionedToken],
        index: &mut usize,
    ) -> Result<Command, Diagnostic> {
        let argument = tokens.get(*index);
        let mode = match argument.map(|t| t.kind()) {
            Some(Kind::PlotMode) => Mode::Plot,
            Some(Kind::InteractiveMode) => Mode::Interactive,
            _ => {
                return Err(Diagnostic::error_at(argument.unwrap_or(token), "Invalid mode specified.")
                    .with_usage(MODE_USAGE))
            }
        };
        *index += 1;

        if self.is_mode_set() {
            return Err(Diagnostic::error_at(
                token,
                format!("Mode is already set to {}.", self.mode),
            ));
        }

        Ok(Command::Mode(mode))
    }

    fn options_usage(&self, block: OptionBlock) -> String {
        let units = if self.mode == Mode::Interactive { ", UNITS" } else { "" };
        format!(
            "{} <OPTION> <VALUE> ... {}\nOptions: {}{}",
            block.keyword(),
            block.terminator_keyword(),
            GENERAL_OPTIONS,
            units
        )
    }

    fn read_options(
        &mut self,
        block: OptionBlock,
        opener: &PositionedToken,
        tokens: &[PositionedToken],
        index: &mut usize,
    ) -> Result<Step, Diagnostic> {
        let mut settings = Vec::new();
        let mut warnings = Vec::new();

        match self.collect_settings(block, opener, tokens, index, &mut settings, &mut warnings) {
            Ok(true) => {}
            Ok(false) => return Ok(Step::Incomplete),
            Err(diagnostic) => {
                *index = match skip_block(tokens, *index) {
                    Some(next) => next,
                    None => {
                        self.discarding = !self.strict;
                        tokens.len()
                    }
                };
                return Err(diagnostic);
            }
        }

        for warning in warnings {
            self.warn(warning);
        }

        Ok(Step::Run(Command::Options { block, settings }))
    }

    /// Returns `Ok(false)` when the tokens end before the block is closed.
    fn collect_settings(
        &self,
        block: OptionBlock,
        opener: &PositionedToken,
        tokens: &[PositionedToken],
        index: &mut usize,
        settings: &mut Vec<Setting>,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<bool, Diagnostic> {
        let mut seen: Vec<Kind> = Vec::new();

        loop {
            let name = match tokens.get(*index) {
                Some(name) => name,
                None => return Ok(false),
            };

            match name.kind() {
                kind if kind == block.terminator() => {
                    *index += 1;
                    return Ok(true);
                }
                Kind::EndOfFile => {
                    return Err(Diagnostic::error_at(
                        opener,
                        format!("{} block is never closed.", block.keyword()),
                    )
                    .with_usage(self.options_usage(block)))
                }
                Kind::EndOpts | Kind::EndUOpts => {
                    return Err(Diagnostic::error_at(
                        name,
                        format!("{} cannot close a block opened with {}.", name.value(), block.keyword()),
                    )
                    .with_usage(self.options_usage(block)))
                }
                kind if kind.is_option() => {
                    if kind == Kind::Units && self.mode != Mode::Interactive {
                        return Err(Diagnostic::error_at(
                            name,
                            "UNITS can only be set in interactive mode.",
                        ));
                    }

                    let value = match tokens.get(*index + 1) {
                        Some(value) => value,
                        None => return Ok(false),
                    };
                    *index += 1;
                    let setting = self.read_setting(name, value)?;
                    *index += 1;

                    if seen.contains(&kind) {
                        warnings.push(Diagnostic::warning_at(
                            name,
                            format!("{} is set more than once; the last value is used.", name.value()),
                        ));
                    } else {
                        seen.push(kind);
                    }
                    settings.push(setting);
                }
                _ => {
                    return Err(Diagnostic::error_at(name, "Invalid option specified.")
                        .with_usage(self.options_usage(block)))
                }
            }
        }
    }

    fn read_setting(&self, name: &PositionedToken, value: &PositionedToken) -> Result<Setting, Diagnostic> {
        let kind = name.kind();
        let invalid = || {
            Diagnostic::error_at(value, format!("Invalid {} specified.", Setting::description(kind)))
                .with_usage(Setting::usage(kind))
        };
        let numeric = || number(Some(value)).ok_or_else(invalid);

        let setting = match kind {
            Kind::Acceleration => Setting::Acceleration(numeric()?),
            Kind::PenUpPosition => Setting::PenUpPosition(numeric()?),
            Kind::PenDownPosition => Setting::PenDownPosition(numeric()?),
            Kind::PenUpDelay => Setting::PenUpDelay(numeric()?),
            Kind::PenDownDelay => Setting::PenDownDelay(numeric()?),
            Kind::PenUpSpeed => Setting::PenUpSpeed(numeric()?),
            Kind::PenDownSpeed => Setting::PenDownSpeed(numeric()?),
            Kind::PenUpRate => Setting::PenUpRate(numeric()?),
            Kind::PenDownRate => Setting::PenDownRate(numeric()?),
            Kind::Model => {
                let raw = integer(value).ok_or_else(invalid)?;
                Setting::Model(Model::try_from(raw).map_err(|_| invalid())?)
            }
            Kind::Units => {
                let raw = integer(value).ok_or_else(invalid)?;
                Setting::Units(Units::try_from(raw).map_err(|_| invalid())?)
            }
            Kind::Port => {
                if value.kind() != Kind::String {
                    return Err(invalid());
                }
                Setting::Port(value.value().to_string())
            }
            _ => return Err(Diagnostic::error_at(name, "Invalid option specified.")),
        };

        Ok(setting)
    }

    fn read_point(
        &self,
        command: &PositionedToken,
        tokens: &[PositionedToken],
        index: &mut usize,
        usage: &str,
    ) -> Result<Point, Diagnostic> {
        let mut coordinate = |axis: &str| {
            let token = tokens.get(*index);
            match number(token) {
                Some(value) => {
                    *index += 1;
                    Ok(value)
                }
                None => Err(Diagnostic::error_at(
                    token.unwrap_or(command),
                    format!("Invalid {} coordinate specified.", axis),
                )
                .with_usage(usage)),
            }
        };

        let x = coordinate("X")?;
        let y = coordinate("Y")?;
        Ok(Point::new(x, y))
    }

    /// Greedy: takes numbers until the first non-number and pairs them up.
    fn read_path(
        &self,
        command: &PositionedToken,
        tokens: &[PositionedToken],
        index: &mut usize,
    ) -> Result<Vec<PathPoint>, Diagnostic> {
        let mut values = Vec::new();
        while let Some(value) = number(tokens.get(*index)) {
            values.push(value);
            *index += 1;
        }

        if values.is_empty() {
            return Err(Diagnostic::error_at(
                tokens.get(*index).unwrap_or(command),
                "Invalid X coordinate specified.",
            )
            .with_usage(DRAW_USAGE));
        }

        if values.len() % 2 != 0 {
            let anchor = tokens
                .get(*index)
                .filter(|t| t.kind() != Kind::EndOfFile)
                .unwrap_or(&tokens[*index - 1]);
            return Err(Diagnostic::error_at(anchor, "Invalid Y coordinate specified.").with_usage(DRAW_USAGE));
        }

        let path = values
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| {
                let point = Point::new(pair[0], pair[1]);
                if i == 0 {
                    PathPoint::Move(point)
                } else {
                    PathPoint::Line(point)
                }
            })
            .collect();

        Ok(path)
    }

    fn apply_setting(&mut self, setting: &Setting) -> DriverResult {
        match setting {
            Setting::Acceleration(v) => self.driver.set_acceleration(*v),
            Setting::PenUpPosition(v) => self.driver.set_pen_up_position(*v),
            Setting::PenDownPosition(v) => self.driver.set_pen_down_position(*v),
            Setting::PenUpDelay(v) => self.driver.set_pen_up_delay(*v),
            Setting::PenDownDelay(v) => self.driver.set_pen_down_delay(*v),
            Setting::PenUpSpeed(v) => self.driver.set_pen_up_speed(*v),
            Setting::PenDownSpeed(v) => self.driver.set_pen_down_speed(*v),
            Setting::PenUpRate(v) => self.driver.set_pen_up_rate(*v),
            Setting::PenDownRate(v) => self.driver.set_pen_down_rate(*v),
            Setting::Model(model) => self.driver.set_model(*model),
            Setting::Port(port) => self.driver.set_port(port),
            Setting::Units(units) => self.driver.set_units(*units),
        }
    }

    fn execute(&mut self, command: Command, anchor: &PositionedToken) -> Result<(), Fault> {
        let fault = |e| driver_fault(e, anchor);

        match command {
            Command::Mode(Mode::Interactive) => {
                self.driver.enter_interactive_mode().map_err(fault)?;
                self.mode = Mode::Interactive;
            }
            Command::Mode(mode) => self.mode = mode,
            Command::Options { settings, .. } => {
                for setting in &settings {
                    if let Err(e) = self.apply_setting(setting) {
                        match fault(e) {
                            Fault::Warning(diagnostic) => self.warn(diagnostic),
                            other => return Err(other),
                        }
                    }
                }
                self.driver.commit_options().map_err(fault)?;
            }
            Command::Connect => self.driver.connect().map_err(fault)?,
            Command::Disconnect => self.driver.disconnect().map_err(fault)?,
            Command::PenUp => self.driver.pen_up().map_err(fault)?,
            Command::PenDown => self.driver.pen_down().map_err(fault)?,
            Command::PenToggle => self.driver.pen_toggle().map_err(fault)?,
            Command::Home => self.driver.home().map_err(fault)?,
            Command::GoTo(point) => self.driver.go_to(point.x, point.y).map_err(fault)?,
            Command::GoToRelative(point) => {
                self.driver.go_to_relative(point.x, point.y).map_err(fault)?
            }
            Command::Draw(path) => self.driver.draw_path(&path).map_err(fault)?,
            Command::Wait(ms) => self.driver.wait(ms).map_err(fault)?,
            Command::GetPosition => {
                let position = self.driver.get_position().map_err(fault)?;
                println!("X: {} Y: {}", position.x, position.y);
            }
            Command::GetPen => {
                let down = self.driver.get_pen_down().map_err(fault)?;
                println!("Pen is {}.", if down { "down" } else { "up" });
            }
            Command::SetPlot(target) => {
                let path = if is_url(&target) {
                    self.fetcher
                        .fetch(&target)
                        .map_err(|e| Fault::Fatal(AxiError::from(e)))?
                } else {
                    PathBuf::from(&target)
                };

                let readable = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false)
                    && File::open(&path).is_ok();
                if !readable {
                    return Err(Fault::Error(Diagnostic::error_at(
                        anchor,
                        format!("Could not open file '{}'.", path.display()),
                    )));
                }

                self.driver.setup_plot(&path).map_err(fault)?;
                self.plot_ready = true;
            }
            Command::Plot => {
                if !self.plot_ready {
                    return Err(Fault::Error(
                        Diagnostic::error_at(anchor, "No plot file set. Use SETPLOT first.")
                            .with_usage(SETPLOT_USAGE),
                    ));
                }
                self.driver.run_plot().map_err(fault)?;
            }
        }

        Ok(())
    }
}
