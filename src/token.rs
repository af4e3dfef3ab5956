use std::rc::Rc;

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: Kind,
    pub value: String,
}

impl Token {
    pub fn new(kind: Kind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Kind {
    // General commands
    Mode,        // MODE
    Opts,        // OPTS
    EndOpts,     // END_OPTS
    UOpts,       // UOPTS
    EndUOpts,    // END_UOPTS

    // Modes
    PlotMode,        // P
    InteractiveMode, // I

    // General options
    Acceleration,    // ACCEL
    PenUpPosition,   // PENU_POS
    PenDownPosition, // PEND_POS
    PenUpDelay,      // PENU_DELAY
    PenDownDelay,    // PEND_DELAY
    PenUpSpeed,      // PENU_SPEED
    PenDownSpeed,    // PEND_SPEED
    PenUpRate,       // PENU_RATE
    PenDownRate,     // PEND_RATE
    Model,           // MODEL
    Port,            // PORT

    // Interactive options
    Units, // UNITS

    // Interactive commands
    Connect,      // CONNECT
    Disconnect,   // DISCONNECT
    PenUp,        // PENUP
    PenDown,      // PENDOWN
    PenToggle,    // PENTOGGLE
    Home,         // HOME
    GoTo,         // GOTO
    GoToRelative, // GOTO_REL
    Draw,         // DRAW
    Wait,         // WAIT
    GetPos,       // GETPOS
    GetPen,       // GETPEN

    // Plot commands
    SetPlot, // SETPLOT
    Plot,    // PLOT

    // Literals
    Number, // 42
    String, // "text"

    Unknown,
    EndOfFile,
}

impl Kind {
    /// Looks up the fixed keyword table. Matching is exact and case-sensitive.
    pub fn from_keyword(text: &str) -> Option<Kind> {
        let kind = match text {
            "MODE" => Kind::Mode,
            "OPTS" => Kind::Opts,
            "END_OPTS" => Kind::EndOpts,
            "UOPTS" => Kind::UOpts,
            "END_UOPTS" => Kind::EndUOpts,
            "P" => Kind::PlotMode,
            "I" => Kind::InteractiveMode,
            "ACCEL" => Kind::Acceleration,
            "PENU_POS" => Kind::PenUpPosition,
            "PEND_POS" => Kind::PenDownPosition,
            "PENU_DELAY" => Kind::PenUpDelay,
            "PEND_DELAY" => Kind::PenDownDelay,
            "PENU_SPEED" => Kind::PenUpSpeed,
            "PEND_SPEED" => Kind::PenDownSpeed,
            "PENU_RATE" => Kind::PenUpRate,
            "PEND_RATE" => Kind::PenDownRate,
            "MODEL" => Kind::Model,
            "PORT" => Kind::Port,
            "UNITS" => Kind::Units,
            "CONNECT" => Kind::Connect,
            "DISCONNECT" => Kind::Disconnect,
            "PENUP" => Kind::PenUp,
            "PENDOWN" => Kind::PenDown,
            "PENTOGGLE" => Kind::PenToggle,
            "HOME" => Kind::Home,
            "GOTO" => Kind::GoTo,
            "GOTO_REL" => Kind::GoToRelative,
            "DRAW" => Kind::Draw,
            "WAIT" => Kind::Wait,
            "GETPOS" => Kind::GetPos,
            "GETPEN" => Kind::GetPen,
            "SETPLOT" => Kind::SetPlot,
            "PLOT" => Kind::Plot,
            _ => return None,
        };
        Some(kind)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Kind::Mode => "Mode",
            Kind::Opts => "Opts",
            Kind::EndOpts => "EndOpts",
            Kind::UOpts => "UOpts",
            Kind::EndUOpts => "EndUOpts",
            Kind::PlotMode => "PlotMode",
            Kind::InteractiveMode => "InteractiveMode",
            Kind::Acceleration => "Acceleration",
            Kind::PenUpPosition => "PenUpPosition",
            Kind::PenDownPosition => "PenDownPosition",
            Kind::PenUpDelay => "PenUpDelay",
            Kind::PenDownDelay => "PenDownDelay",
            Kind::PenUpSpeed => "PenUpSpeed",
            Kind::PenDownSpeed => "PenDownSpeed",
            Kind::PenUpRate => "PenUpRate",
            Kind::PenDownRate => "PenDownRate",
            Kind::Model => "Model",
            Kind::Port => "Port",
            Kind::Units => "Units",
            Kind::Connect => "Connect",
            Kind::Disconnect => "Disconnect",
            Kind::PenUp => "PenUp",
            Kind::PenDown => "PenDown",
            Kind::PenToggle => "PenToggle",
            Kind::Home => "Home",
            Kind::GoTo => "GoTo",
            Kind::GoToRelative => "GoToRelative",
            Kind::Draw => "Draw",
            Kind::Wait => "Wait",
            Kind::GetPos => "GetPos",
            Kind::GetPen => "GetPen",
            Kind::SetPlot => "SetPlot",
            Kind::Plot => "Plot",
            Kind::Number => "Number",
            Kind::String => "String",
            Kind::Unknown => "Unknown",
            Kind::EndOfFile => "EndOfFile",
        }
    }

    pub fn is_option(&self) -> bool {
        matches!(
            self,
            Kind::Acceleration
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
        )
    }

    pub fn is_interactive_command(&self) -> bool {
        matches!(
            self,
            Kind::Connect
                | Kind::Disconnect
                | Kind::PenUp
                | Kind::PenDown
                | Kind::PenToggle
                | Kind::Home
                | Kind::GoTo
                | Kind::GoToRelative
                | Kind::Draw
                | Kind::Wait
                | Kind::GetPos
                | Kind::GetPen
        )
    }
}

/// Where a token came from. Columns count chars, `end` is exclusive.
#[derive(Debug, PartialEq, Clone)]
pub struct Position {
    pub line: Rc<str>,
    pub line_number: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PositionedToken {
    pub token: Token,
    pub position: Position,
}

impl PositionedToken {
    pub fn kind(&self) -> Kind {
        self.token.kind
    }

    pub fn value(&self) -> &str {
        &self.token.value
    }

    pub fn line_number(&self) -> usize {
        self.position.line_number
    }
}

/// Tokens of one file or of a whole interactive session, each carrying its
/// own position record.
#[derive(Debug, Default, Clone)]
pub struct FileState {
    tokens: Vec<PositionedToken>,
}

impl FileState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: PositionedToken) {
        self.tokens.push(token);
    }

    pub fn extend(&mut self, tokens: impl IntoIterator<Item = PositionedToken>) {
        self.tokens.extend(tokens);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[PositionedToken] {
        &self.tokens
    }

    pub fn slice_from(&self, index: usize) -> &[PositionedToken] {
        &self.tokens[index.min(self.tokens.len())..]
    }

    pub fn kinds(&self) -> Vec<Kind> {
        self.tokens.iter().map(|t| t.kind()).collect()
    }
}

impl IntoIterator for FileState {
    type Item = PositionedToken;
    type IntoIter = std::vec::IntoIter<PositionedToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}
