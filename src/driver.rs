use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    Unset,
    Interactive,
    Plot,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Mode::Unset => "unset",
            Mode::Interactive => "interactive",
            Mode::Plot => "plot",
        };
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A path step handed to `Driver::draw_path`. The first step is always a move.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PathPoint {
    Move(Point),
    Line(Point),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Model {
    V2V3SeA4 = 1,
    V3A3SeA3 = 2,
    V3Xlx = 3,
    MiniKit = 4,
    SeA1 = 5,
    SeA2 = 6,
    V3B6 = 7,
}

impl TryFrom<u32> for Model {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Model::V2V3SeA4),
            2 => Ok(Model::V3A3SeA3),
            3 => Ok(Model::V3Xlx),
            4 => Ok(Model::MiniKit),
            5 => Ok(Model::SeA1),
            6 => Ok(Model::SeA2),
            7 => Ok(Model::V3B6),
            other => Err(other),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Units {
    Inches = 0,
    Centimeters = 1,
    Millimeters = 2,
}

impl TryFrom<u32> for Units {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Units::Inches),
            1 => Ok(Units::Centimeters),
            2 => Ok(Units::Millimeters),
            other => Err(other),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DriverError {
    /// The command exists but this driver cannot do it. Reported as a warning.
    #[error("{0} is not supported by this driver")]
    Unsupported(String),
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Fatal(String),
}

pub type DriverResult<T = ()> = Result<T, DriverError>;

/// The plotter control surface the dispatcher drives.
pub trait Driver {
    fn enter_interactive_mode(&mut self) -> DriverResult;
    fn current_mode(&self) -> Mode;

    fn set_acceleration(&mut self, value: f64) -> DriverResult;
    fn set_pen_up_position(&mut self, value: f64) -> DriverResult;
    fn set_pen_down_position(&mut self, value: f64) -> DriverResult;
    fn set_pen_up_delay(&mut self, value: f64) -> DriverResult;
    fn set_pen_down_delay(&mut self, value: f64) -> DriverResult;
    fn set_pen_up_speed(&mut self, value: f64) -> DriverResult;
    fn set_pen_down_speed(&mut self, value: f64) -> DriverResult;
    fn set_pen_up_rate(&mut self, value: f64) -> DriverResult;
    fn set_pen_down_rate(&mut self, value: f64) -> DriverResult;
    fn set_model(&mut self, model: Model) -> DriverResult;
    fn set_port(&mut self, port: &str) -> DriverResult;
    fn set_units(&mut self, units: Units) -> DriverResult;
    fn commit_options(&mut self) -> DriverResult;

    fn connect(&mut self) -> DriverResult;
    fn disconnect(&mut self) -> DriverResult;
    fn pen_up(&mut self) -> DriverResult;
    fn pen_down(&mut self) -> DriverResult;
    fn pen_toggle(&mut self) -> DriverResult;
    fn home(&mut self) -> DriverResult;
    fn go_to(&mut self, x: f64, y: f64) -> DriverResult;
    fn go_to_relative(&mut self, x: f64, y: f64) -> DriverResult;
    fn draw_path(&mut self, path: &[PathPoint]) -> DriverResult;
    fn wait(&mut self, ms: f64) -> DriverResult;
    fn get_position(&mut self) -> DriverResult<Point>;
    fn get_pen_down(&mut self) -> DriverResult<bool>;

    fn setup_plot(&mut self, path: &Path) -> DriverResult;
    fn run_plot(&mut self) -> DriverResult;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub acceleration: f64,
    pub pen_up_position: f64,
    pub pen_down_position: f64,
    pub pen_up_delay: f64,
    pub pen_down_delay: f64,
    pub pen_up_speed: f64,
    pub pen_down_speed: f64,
    pub pen_up_rate: f64,
    pub pen_down_rate: f64,
    pub model: Model,
    /// `None` selects the first plotter found.
    pub port: Option<String>,
    pub units: Units,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            acceleration: 75.0,
            pen_up_position: 60.0,
            pen_down_position: 30.0,
            pen_up_delay: 0.0,
            pen_down_delay: 0.0,
            pen_up_speed: 75.0,
            pen_down_speed: 25.0,
            pen_up_rate: 75.0,
            pen_down_rate: 50.0,
            model: Model::V2V3SeA4,
            port: None,
            units: Units::Inches,
        }
    }
}

/// A plotter that only exists in memory. Every action is logged at debug
/// level so scripts can be dry-run without hardware.
#[derive(Debug, Default)]
pub struct SimulatedDriver {
    interactive: bool,
    connected: bool,
    pen_down: bool,
    position: (f64, f64),
    pending: Options,
    options: Options,
    plot_file: Option<PathBuf>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn require_connection(&self, action: &str) -> DriverResult {
        if self.connected {
            Ok(())
        } else {
            Err(DriverError::Rejected(format!(
                "Cannot {} before CONNECT.",
                action
            )))
        }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.position = (x, y);
        log::debug!("Moved to ({}, {}).", x, y);
    }
}

impl Driver for SimulatedDriver {
    fn enter_interactive_mode(&mut self) -> DriverResult {
        self.interactive = true;
        log::debug!("Mode is set to interactive.");
        Ok(())
    }

    fn current_mode(&self) -> Mode {
        if self.interactive {
            Mode::Interactive
        } else if self.plot_file.is_some() {
            Mode::Plot
        } else {
            Mode::Unset
        }
    }

    fn set_acceleration(&mut self, value: f64) -> DriverResult {
        self.pending.acceleration = value;
        log::debug!("Set accel to {}.", value);
        Ok(())
    }

    fn set_pen_up_position(&mut self, value: f64) -> DriverResult {
        self.pending.pen_up_position = value;
        log::debug!("Set pen_pos_up to {}.", value);
        Ok(())
    }

    fn set_pen_down_position(&mut self, value: f64) -> DriverResult {
        self.pending.pen_down_position = value;
        log::debug!("Set pen_pos_down to {}.", value);
        Ok(())
    }

    fn set_pen_up_delay(&mut self, value: f64) -> DriverResult {
        self.pending.pen_up_delay = value;
        log::debug!("Set pen_delay_up to {}.", value);
        Ok(())
    }

    fn set_pen_down_delay(&mut self, value: f64) -> DriverResult {
        self.pending.pen_down_delay = value;
        log::debug!("Set pen_delay_down to {}.", value);
        Ok(())
    }

    fn set_pen_up_speed(&mut self, value: f64) -> DriverResult {
        self.pending.pen_up_speed = value;
        log::debug!("Set speed_penup to {}.", value);
        Ok(())
    }

    fn set_pen_down_speed(&mut self, value: f64) -> DriverResult {
        self.pending.pen_down_speed = value;
        log::debug!("Set speed_pendown to {}.", value);
        Ok(())
    }

    fn set_pen_up_rate(&mut self, value: f64) -> DriverResult {
        self.pending.pen_up_rate = value;
        log::debug!("Set pen_rate_raise to {}.", value);
        Ok(())
    }

    fn set_pen_down_rate(&mut self, value: f64) -> DriverResult {
        self.pending.pen_down_rate = value;
        log::debug!("Set pen_rate_lower to {}.", value);
        Ok(())
    }

    fn set_model(&mut self, model: Model) -> DriverResult {
        self.pending.model = model;
        log::debug!("Set model to {:?} ({}).", model, model as u32);
        Ok(())
    }

    fn set_port(&mut self, port: &str) -> DriverResult {
        self.pending.port = if port == "auto" {
            None
        } else {
            Some(port.to_string())
        };
        log::debug!("Set port to {}.", port);
        Ok(())
    }

    fn set_units(&mut self, units: Units) -> DriverResult {
        self.pending.units = units;
        log::debug!("Set units to {:?}.", units);
        Ok(())
    }

    fn commit_options(&mut self) -> DriverResult {
        self.options = self.pending.clone();
        log::debug!("Updated options.");
        Ok(())
    }

    fn connect(&mut self) -> DriverResult {
        if !self.interactive {
            return Err(DriverError::Fatal(String::from(
                "Could not connect to AxiDraw: driver is not in interactive mode.",
            )));
        }
        self.connected = true;
        log::debug!(
            "Connected to AxiDraw on {}.",
            self.options.port.as_deref().unwrap_or("the first available port")
        );
        Ok(())
    }

    fn disconnect(&mut self) -> DriverResult {
        self.connected = false;
        log::debug!("Disconnected from AxiDraw.");
        Ok(())
    }

    fn pen_up(&mut self) -> DriverResult {
        self.require_connection("raise the pen")?;
        if self.pen_down {
            self.pen_down = false;
            log::debug!("Pen is up.");
        }
        Ok(())
    }

    fn pen_down(&mut self) -> DriverResult {
        self.require_connection("lower the pen")?;
        if !self.pen_down {
            self.pen_down = true;
            log::debug!("Pen is down.");
        }
        Ok(())
    }

    fn pen_toggle(&mut self) -> DriverResult {
        if self.pen_down {
            self.pen_up()?;
        } else {
            self.pen_down()?;
        }
        log::debug!("Pen toggled to {}.", if self.pen_down { "down" } else { "up" });
        Ok(())
    }

    fn home(&mut self) -> DriverResult {
        self.require_connection("move home")?;
        self.move_to(0.0, 0.0);
        Ok(())
    }

    fn go_to(&mut self, x: f64, y: f64) -> DriverResult {
        self.require_connection("move")?;
        self.move_to(x, y);
        Ok(())
    }

    fn go_to_relative(&mut self, x: f64, y: f64) -> DriverResult {
        self.require_connection("move")?;
        let (cx, cy) = self.position;
        self.position = (cx + x, cy + y);
        log::debug!("Moved by ({}, {}) relatively.", x, y);
        Ok(())
    }

    fn draw_path(&mut self, path: &[PathPoint]) -> DriverResult {
        self.require_connection("draw")?;
        for step in path {
            match step {
                PathPoint::Move(point) => {
                    self.pen_down = false;
                    self.move_to(point.x, point.y);
                }
                PathPoint::Line(point) => {
                    self.pen_down = true;
                    self.position = (point.x, point.y);
                    log::debug!("Drew line to ({}, {}).", point.x, point.y);
                }
            }
        }
        self.pen_down = false;
        Ok(())
    }

    fn wait(&mut self, ms: f64) -> DriverResult {
        log::debug!("Waited for {} ms.", ms);
        Ok(())
    }

    fn get_position(&mut self) -> DriverResult<Point> {
        let (x, y) = self.position;
        log::debug!("Current position is ({}, {}).", x, y);
        Ok(Point::new(x, y))
    }

    fn get_pen_down(&mut self) -> DriverResult<bool> {
        Ok(self.pen_down)
    }

    fn setup_plot(&mut self, path: &Path) -> DriverResult {
        self.plot_file = Some(path.to_path_buf());
        log::debug!("Plot file set to {}.", path.display());
        Ok(())
    }

    fn run_plot(&mut self) -> DriverResult {
        match &self.plot_file {
            Some(path) => {
                log::info!("Plotting {}.", path.display());
                Ok(())
            }
            None => Err(DriverError::Rejected(String::from(
                "No plot file has been set up.",
            ))),
        }
    }
}
