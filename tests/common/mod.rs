#![allow(dead_code)]

use axilang::driver::{Driver, DriverError, DriverResult, Mode, Model, PathPoint, Point, Units};
use axilang::fetch::{FetchError, Reply, Transport};
use axilang::token::PositionedToken;
use axilang::{AxiError, Config, Dispatcher, Fetcher, Lexer, Progress};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Clone)]
pub enum Call {
    EnterInteractive,
    SetAcceleration(f64),
    SetPenUpPosition(f64),
    SetPenDownPosition(f64),
    SetPenUpDelay(f64),
    SetPenDownDelay(f64),
    SetPenUpSpeed(f64),
    SetPenDownSpeed(f64),
    SetPenUpRate(f64),
    SetPenDownRate(f64),
    SetModel(Model),
    SetPort(String),
    SetUnits(Units),
    CommitOptions,
    Connect,
    Disconnect,
    PenUp,
    PenDown,
    PenToggle,
    Home,
    GoTo(f64, f64),
    GoToRelative(f64, f64),
    DrawPath(Vec<PathPoint>),
    Wait(f64),
    GetPosition,
    GetPenDown,
    SetupPlot(PathBuf),
    RunPlot,
}

/// Records every call. Calls listed in `unsupported` answer with
/// `DriverError::Unsupported`, and `fatal_connect` makes CONNECT fail fatally.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pub calls: Vec<Call>,
    pub interactive: bool,
    pub unsupported: Vec<&'static str>,
    pub fatal_connect: bool,
}

impl RecordingDriver {
    fn record(&mut self, name: &'static str, call: Call) -> DriverResult {
        if self.unsupported.contains(&name) {
            return Err(DriverError::Unsupported(name.to_string()));
        }
        self.calls.push(call);
        Ok(())
    }
}

impl Driver for RecordingDriver {
    fn enter_interactive_mode(&mut self) -> DriverResult {
        self.interactive = true;
        self.record("enter_interactive_mode", Call::EnterInteractive)
    }

    fn current_mode(&self) -> Mode {
        if self.interactive {
            Mode::Interactive
        } else {
            Mode::Unset
        }
    }

    fn set_acceleration(&mut self, value: f64) -> DriverResult {
        self.record("set_acceleration", Call::SetAcceleration(value))
    }

    fn set_pen_up_position(&mut self, value: f64) -> DriverResult {
        self.record("set_pen_up_position", Call::SetPenUpPosition(value))
    }

    fn set_pen_down_position(&mut self, value: f64) -> DriverResult {
        self.record("set_pen_down_position", Call::SetPenDownPosition(value))
    }

    fn set_pen_up_delay(&mut self, value: f64) -> DriverResult {
        self.record("set_pen_up_delay", Call::SetPenUpDelay(value))
    }

    fn set_pen_down_delay(&mut self, value: f64) -> DriverResult {
        self.record("set_pen_down_delay", Call::SetPenDownDelay(value))
    }

    fn set_pen_up_speed(&mut self, value: f64) -> DriverResult {
        self.record("set_pen_up_speed", Call::SetPenUpSpeed(value))
    }

    fn set_pen_down_speed(&mut self, value: f64) -> DriverResult {
        self.record("set_pen_down_speed", Call::SetPenDownSpeed(value))
    }

    fn set_pen_up_rate(&mut self, value: f64) -> DriverResult {
        self.record("set_pen_up_rate", Call::SetPenUpRate(value))
    }

    fn set_pen_down_rate(&mut self, value: f64) -> DriverResult {
        self.record("set_pen_down_rate", Call::SetPenDownRate(value))
    }

    fn set_model(&mut self, model: Model) -> DriverResult {
        self.record("set_model", Call::SetModel(model))
    }

    fn set_port(&mut self, port: &str) -> DriverResult {
        self.record("set_port", Call::SetPort(port.to_string()))
    }

    fn set_units(&mut self, units: Units) -> DriverResult {
        self.record("set_units", Call::SetUnits(units))
    }

    fn commit_options(&mut self) -> DriverResult {
        self.record("commit_options", Call::CommitOptions)
    }

    fn connect(&mut self) -> DriverResult {
        if self.fatal_connect {
            return Err(DriverError::Fatal(String::from("Could not connect to AxiDraw.")));
        }
        self.record("connect", Call::Connect)
    }

    fn disconnect(&mut self) -> DriverResult {
        self.record("disconnect", Call::Disconnect)
    }

    fn pen_up(&mut self) -> DriverResult {
        self.record("pen_up", Call::PenUp)
    }

    fn pen_down(&mut self) -> DriverResult {
        self.record("pen_down", Call::PenDown)
    }

    fn pen_toggle(&mut self) -> DriverResult {
        self.record("pen_toggle", Call::PenToggle)
    }

    fn home(&mut self) -> DriverResult {
        self.record("home", Call::Home)
    }

    fn go_to(&mut self, x: f64, y: f64) -> DriverResult {
        self.record("go_to", Call::GoTo(x, y))
    }

    fn go_to_relative(&mut self, x: f64, y: f64) -> DriverResult {
        self.record("go_to_relative", Call::GoToRelative(x, y))
    }

    fn draw_path(&mut self, path: &[PathPoint]) -> DriverResult {
        self.record("draw_path", Call::DrawPath(path.to_vec()))
    }

    fn wait(&mut self, ms: f64) -> DriverResult {
        self.record("wait", Call::Wait(ms))
    }

    fn get_position(&mut self) -> DriverResult<Point> {
        self.record("get_position", Call::GetPosition)?;
        Ok(Point::new(0.0, 0.0))
    }

    fn get_pen_down(&mut self) -> DriverResult<bool> {
        self.record("get_pen_down", Call::GetPenDown)?;
        Ok(false)
    }

    fn setup_plot(&mut self, path: &Path) -> DriverResult {
        self.record("setup_plot", Call::SetupPlot(path.to_path_buf()))
    }

    fn run_plot(&mut self) -> DriverResult {
        self.record("run_plot", Call::RunPlot)
    }
}

/// Serves canned replies; anything else is a 404.
#[derive(Default)]
pub struct FakeTransport {
    pub replies: HashMap<String, Reply>,
}

impl FakeTransport {
    pub fn serve(mut self, url: &str, body: &str) -> Self {
        self.replies.insert(
            url.to_string(),
            Reply {
                status: 200,
                location: None,
                body: body.as_bytes().to_vec(),
            },
        );
        self
    }

    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.replies.insert(
            from.to_string(),
            Reply {
                status: 301,
                location: Some(to.to_string()),
                body: Vec::new(),
            },
        );
        self
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<Reply, FetchError> {
        Ok(self.replies.get(url).cloned().unwrap_or(Reply {
            status: 404,
            ..Reply::default()
        }))
    }
}

pub fn dispatcher_with(
    driver: RecordingDriver,
    transport: FakeTransport,
    strict: bool,
) -> Dispatcher<RecordingDriver> {
    let config = Config::default();
    let fetcher = Fetcher::with_transport(Box::new(transport), &config);
    Dispatcher::new(driver, fetcher, strict, &config)
}

pub fn dispatcher(strict: bool) -> Dispatcher<RecordingDriver> {
    dispatcher_with(RecordingDriver::default(), FakeTransport::default(), strict)
}

pub fn tokens(source: &str) -> Vec<PositionedToken> {
    Lexer::new(Cursor::new(source.to_string()))
        .tokenize()
        .unwrap()
        .tokens
        .into_iter()
        .collect()
}

pub fn run(
    dispatcher: &mut Dispatcher<RecordingDriver>,
    source: &str,
) -> Result<Progress, AxiError> {
    dispatcher.dispatch(&tokens(source))
}

/// A file under the temp dir that is unique to this test process.
pub fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("axilang-test-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}
