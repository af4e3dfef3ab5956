use crate::driver::{Mode, Model, PathPoint, Point, Units};
use crate::token::Kind;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OptionBlock {
    Opts,
    UOpts,
}

impl OptionBlock {
    pub fn keyword(&self) -> &'static str {
        match self {
            OptionBlock::Opts => "OPTS",
            OptionBlock::UOpts => "UOPTS",
        }
    }

    pub fn terminator(&self) -> Kind {
        match self {
            OptionBlock::Opts => Kind::EndOpts,
            OptionBlock::UOpts => Kind::EndUOpts,
        }
    }

    pub fn terminator_keyword(&self) -> &'static str {
        match self {
            OptionBlock::Opts => "END_OPTS",
            OptionBlock::UOpts => "END_UOPTS",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Setting {
    Acceleration(f64),
    PenUpPosition(f64),
    PenDownPosition(f64),
    PenUpDelay(f64),
    PenDownDelay(f64),
    PenUpSpeed(f64),
    PenDownSpeed(f64),
    PenUpRate(f64),
    PenDownRate(f64),
    Model(Model),
    Port(String),
    Units(Units),
}

impl Setting {
    pub fn usage(kind: Kind) -> &'static str {
        match kind {
            Kind::Acceleration => "ACCEL <VALUE>",
            Kind::PenUpPosition => "PENU_POS <VALUE>",
            Kind::PenDownPosition => "PEND_POS <VALUE>",
            Kind::PenUpDelay => "PENU_DELAY <VALUE>",
            Kind::PenDownDelay => "PEND_DELAY <VALUE>",
            Kind::PenUpSpeed => "PENU_SPEED <VALUE>",
            Kind::PenDownSpeed => "PEND_SPEED <VALUE>",
            Kind::PenUpRate => "PENU_RATE <VALUE>",
            Kind::PenDownRate => "PEND_RATE <VALUE>",
            Kind::Model => "MODEL <1-7>",
            Kind::Port => "PORT \"<VALUE>\"",
            Kind::Units => "UNITS <0|1|2>",
            _ => "<OPTION> <VALUE>",
        }
    }

    pub fn description(kind: Kind) -> &'static str {
        match kind {
            Kind::Acceleration => "acceleration",
            Kind::PenUpPosition => "raised pen position",
            Kind::PenDownPosition => "lowered pen position",
            Kind::PenUpDelay => "pen raise delay",
            Kind::PenDownDelay => "pen lower delay",
            Kind::PenUpSpeed => "pen raise speed",
            Kind::PenDownSpeed => "pen lower speed",
            Kind::PenUpRate => "pen raise rate",
            Kind::PenDownRate => "pen lower rate",
            Kind::Model => "model",
            Kind::Port => "port",
            Kind::Units => "units",
            _ => "option",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    Mode(Mode),
    Options {
        block: OptionBlock,
        settings: Vec<Setting>,
    },
    Connect,
    Disconnect,
    PenUp,
    PenDown,
    PenToggle,
    Home,
    GoTo(Point),
    GoToRelative(Point),
    Draw(Vec<PathPoint>),
    Wait(f64),
    GetPosition,
    GetPen,
    SetPlot(String),
    Plot,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Mode(_) => "MODE",
            Command::Options { block, .. } => block.keyword(),
            Command::Connect => "CONNECT",
            Command::Disconnect => "DISCONNECT",
            Command::PenUp => "PENUP",
            Command::PenDown => "PENDOWN",
            Command::PenToggle => "PENTOGGLE",
            Command::Home => "HOME",
            Command::GoTo(_) => "GOTO",
            Command::GoToRelative(_) => "GOTO_REL",
            Command::Draw(_) => "DRAW",
            Command::Wait(_) => "WAIT",
            Command::GetPosition => "GETPOS",
            Command::GetPen => "GETPEN",
            Command::SetPlot(_) => "SETPLOT",
            Command::Plot => "PLOT",
        }
    }
}
