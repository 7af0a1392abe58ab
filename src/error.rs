//! The error taxonomy reportable to a collaborator.
//!
//! Every fallible entry point returns `Result<T, Report<CoreError>>`.
//! `rootcause::Report` wraps a `CoreError` and lets the crate attach a
//! human-readable message on propagation without losing the underlying
//! variant a caller might want to match on.

use std::fmt;

use rootcause::Report;

/// Where in the input an error was noticed, when known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub game_number: Option<u32>,
    pub ply: Option<u32>,
    pub move_text: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_game_number(mut self, n: u32) -> Self {
        self.game_number = Some(n);
        self
    }

    pub fn with_ply(mut self, ply: u32) -> Self {
        self.ply = Some(ply);
        self
    }

    pub fn with_move_text(mut self, text: impl Into<String>) -> Self {
        self.move_text = Some(text.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        let mut sep = |f: &mut fmt::Formatter<'_>, wrote: &mut bool| -> fmt::Result {
            if *wrote {
                f.write_str(", ")?;
            }
            *wrote = true;
            Ok(())
        };
        if let Some(file) = &self.file {
            sep(f, &mut wrote)?;
            write!(f, "file={file}")?;
        }
        if let Some(line) = self.line {
            sep(f, &mut wrote)?;
            write!(f, "line={line}")?;
        }
        if let Some(n) = self.game_number {
            sep(f, &mut wrote)?;
            write!(f, "game={n}")?;
        }
        if let Some(ply) = self.ply {
            sep(f, &mut wrote)?;
            write!(f, "ply={ply}")?;
        }
        if let Some(text) = &self.move_text {
            sep(f, &mut wrote)?;
            write!(f, "move={text}")?;
        }
        Ok(())
    }
}

/// The closed error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A FEN string was malformed (wrong field count, illegal rank
    /// string, out-of-range numeric field).
    InvalidFen { reason: String, context: ErrorContext },
    /// A move could not be played on the current position.
    IllegalMove { reason: String, context: ErrorContext },
    /// A lexical or grammatical error in the PGN stream.
    ParseFailure { reason: String, context: ErrorContext },
    /// One of the seven mandatory tags was missing during validation.
    MissingTag { tag: &'static str, context: ErrorContext },
    /// Move text could not be classified by the decoder.
    UnknownMove { text: String, context: ErrorContext },
}

impl CoreError {
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::InvalidFen { context, .. }
            | Self::IllegalMove { context, .. }
            | Self::ParseFailure { context, .. }
            | Self::MissingTag { context, .. }
            | Self::UnknownMove { context, .. } => context,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFen { reason, context } => {
                write!(f, "invalid FEN: {reason} ({context})")
            }
            Self::IllegalMove { reason, context } => {
                write!(f, "illegal move: {reason} ({context})")
            }
            Self::ParseFailure { reason, context } => {
                write!(f, "parse failure: {reason} ({context})")
            }
            Self::MissingTag { tag, context } => {
                write!(f, "missing tag {tag} ({context})")
            }
            Self::UnknownMove { text, context } => {
                write!(f, "unknown move {text:?} ({context})")
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// The crate-wide result alias: all fallible entry points funnel through
/// this, keeping a single typed error with an attachable context instead
/// of ad-hoc `bool`/print mixtures.
pub type CoreResult<T> = Result<T, Report<CoreError>>;

pub(crate) fn invalid_fen(reason: impl Into<String>, context: ErrorContext) -> Report<CoreError> {
    Report::new(CoreError::InvalidFen { reason: reason.into(), context })
}

pub(crate) fn illegal_move(reason: impl Into<String>, context: ErrorContext) -> Report<CoreError> {
    Report::new(CoreError::IllegalMove { reason: reason.into(), context })
}

/// Diagnostics observed but not fatal to the run: lexer/parser
/// recovery, ambiguity warnings, etc. These are handed to a
/// caller-supplied sink rather than returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    LexError { message: String, line: u32 },
    UnmatchedVariation { line: u32 },
    NullMoveDisallowed { line: u32 },
    /// `b`-prefixed pawn captures (`bxc6`) collide with the Bishop
    /// letter (§9 Open Question). The decoder always reads them as a
    /// pawn capture, but when a bishop could *also* reach the target
    /// square the analyser raises this instead of silently guessing.
    /// Reported by ply index rather than source line, since it's only
    /// detectable once a board replay resolves the position.
    AmbiguousBPrefix { ply: usize, text: String },
    GameBroken { game_number: u32, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexError { message, line } => write!(f, "line {line}: {message}"),
            Self::UnmatchedVariation { line } => {
                write!(f, "line {line}: unterminated variation, closed at end of input")
            }
            Self::NullMoveDisallowed { line } => {
                write!(f, "line {line}: null move retained despite allow_null_moves=false")
            }
            Self::AmbiguousBPrefix { ply, text } => {
                write!(f, "ply {ply}: '{text}' read as a pawn capture but a bishop move is also possible")
            }
            Self::GameBroken { game_number, reason } => {
                write!(f, "game {game_number}: {reason}")
            }
        }
    }
}

/// Caller-supplied sink for non-fatal diagnostics — the log stream is
/// supplied by the caller. The core never imports a logging crate
/// itself; it only ever writes through this trait.
pub trait Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// A `Diagnostics` sink that discards everything, for callers that
/// don't care about recoverable errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// A `Diagnostics` sink that collects everything into a `Vec`, handy for
/// tests and for callers happy to inspect the whole run after the fact.
#[derive(Debug, Default, Clone)]
pub struct CollectingDiagnostics(pub Vec<Diagnostic>);

impl Diagnostics for CollectingDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }
}
