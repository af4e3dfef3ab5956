use crate::diagnostic::Diagnostic;
use crate::token::{FileState, Kind, Position, PositionedToken, Token};
use std::io::{self, BufRead};
use std::rc::Rc;

const LINE_COMMENT: char = '%';
const BLOCK_OPEN: char = '=';

#[derive(Debug, PartialEq, Clone, Copy)]
enum Scan {
    Code,
    BlockComment,
}

/// Result of lexing a whole file or a single line.
#[derive(Debug, Default)]
pub struct LexOutput {
    pub tokens: FileState,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Lexer<R> {
    source: R,
    single_line: bool,
    line: Rc<str>,
    chars: Vec<char>,
    line_number: usize,
    cursor: usize,
    scan: Scan,
    exhausted: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<R: BufRead> Lexer<R> {
    /// Streaming lexer, pulls lines from `source` as tokens are requested.
    pub fn new(source: R) -> Self {
        Self {
            source,
            single_line: false,
            line: Rc::from(""),
            chars: Vec::new(),
            line_number: 0,
            cursor: 0,
            scan: Scan::Code,
            exhausted: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn at(&self) -> char {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> char {
        self.chars.get(self.cursor + offset).copied().unwrap_or('\0')
    }

    fn at_line_end(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    fn refill(&mut self) -> io::Result<bool> {
        let mut buffer = String::new();
        if self.source.read_line(&mut buffer)? == 0 {
            return Ok(false);
        }

        let text = buffer.trim_end_matches(['\n', '\r']);
        self.line_number += 1;
        self.set_line(text);
        Ok(true)
    }

    fn set_line(&mut self, text: &str) {
        self.line = Rc::from(text);
        self.chars = text.chars().collect();
        self.cursor = 0;
    }

    fn position(&self, start: usize) -> Position {
        Position {
            line: Rc::clone(&self.line),
            line_number: self.line_number,
            start,
            end: self.cursor,
        }
    }

    fn end_of_file(&self) -> PositionedToken {
        PositionedToken {
            token: Token::new(Kind::EndOfFile, ""),
            position: Position {
                line: Rc::clone(&self.line),
                line_number: self.line_number,
                start: self.chars.len(),
                end: self.chars.len(),
            },
        }
    }

    pub fn next_token(&mut self) -> io::Result<PositionedToken> {
        loop {
            if self.exhausted {
                return Ok(self.end_of_file());
            }

            if self.at_line_end() {
                if self.single_line || !self.refill()? {
                    self.exhausted = true;
                }
                continue;
            }

            if self.scan == Scan::BlockComment {
                self.skip_block_comment();
                continue;
            }

            while !self.at_line_end() && self.at().is_whitespace() {
                self.cursor += 1;
            }
            if self.at_line_end() {
                continue;
            }

            if self.at() == LINE_COMMENT {
                if self.peek(1) == BLOCK_OPEN {
                    self.cursor += 2;
                    self.scan = Scan::BlockComment;
                } else {
                    self.cursor = self.chars.len();
                }
                continue;
            }

            let start = self.cursor;
            while !self.at_line_end() && !self.at().is_whitespace() {
                self.cursor += 1;
            }

            let value: String = self.chars[start..self.cursor].iter().collect();
            if value.is_empty() {
                continue;
            }

            return Ok(self.classify(value, start));
        }
    }

    /// Moves past the closing `=%` on this line, or to the end of the line.
    fn skip_block_comment(&mut self) {
        while !self.at_line_end() {
            if self.at() == BLOCK_OPEN && self.peek(1) == LINE_COMMENT {
                self.cursor += 2;
                self.scan = Scan::Code;
                return;
            }
            self.cursor += 1;
        }
    }

    fn classify(&mut self, value: String, start: usize) -> PositionedToken {
        let position = self.position(start);

        let token = if let Some(kind) = Kind::from_keyword(&value) {
            Token::new(kind, value)
        } else if value.chars().all(|c| c.is_ascii_digit()) {
            Token::new(Kind::Number, value)
        } else if let Some(rest) = value.strip_prefix('"') {
            let inner = rest.strip_suffix('"').unwrap_or(rest);
            Token::new(Kind::String, inner)
        } else {
            let token = PositionedToken {
                token: Token::new(Kind::Unknown, value.clone()),
                position: position.clone(),
            };
            self.diagnostics
                .push(Diagnostic::error_at(&token, format!("Unknown token '{}'", value)));
            token.token
        };

        PositionedToken { token, position }
    }

    /// Drains the source. The returned stream ends with exactly one
    /// `EndOfFile` token.
    pub fn tokenize(mut self) -> io::Result<LexOutput> {
        let mut tokens = FileState::new();

        loop {
            let token = self.next_token()?;
            let done = token.kind() == Kind::EndOfFile;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(LexOutput {
            tokens,
            diagnostics: self.diagnostics,
        })
    }
}

impl Lexer<io::Empty> {
    /// Lexer over one line of text. It never reads past `text`.
    pub fn for_line(text: &str, line_number: usize) -> Self {
        let mut lexer = Lexer::new(io::empty());
        lexer.single_line = true;
        lexer.line_number = line_number;
        lexer.set_line(text.trim_end_matches(['\n', '\r']));
        lexer
    }
}

/// Tokenizes a single line; the result ends with `EndOfFile`.
pub fn lex_line(text: &str, line_number: usize) -> LexOutput {
    let mut lexer = Lexer::for_line(text, line_number);
    let mut tokens = FileState::new();

    loop {
        // io::Empty never fails and single-line mode never reads from it.
        let token = match lexer.next_token() {
            Ok(token) => token,
            Err(_) => lexer.end_of_file(),
        };
        let done = token.kind() == Kind::EndOfFile;
        tokens.push(token);
        if done {
            break;
        }
    }

    LexOutput {
        tokens,
        diagnostics: lexer.diagnostics,
    }
}
