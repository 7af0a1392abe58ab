//! Core of a PGN reader/formatter: lexer and parser, chess engine and
//! board, move-token decoder, and notation formatter. The CLI, file
//! walking, and duplicate-detection policy that would sit on top of
//! this crate are left to the collaborator that embeds it.
//!
//! Three entry points tie the components together:
//! [`parse_games`] reads a PGN stream into a sequence of [`Game`]s,
//! [`analyze_game`] replays one against the engine to validate and
//! annotate it, and [`format_game`] (or [`json::JsonFormatter`] for
//! JSON output) re-emit a game in a chosen notation.

pub mod analysis;
pub mod config;
pub mod error;
pub mod json;
pub mod model;
pub mod notation;
pub mod pgn;

pub use analysis::{analyze_game, Analysis};
pub use config::{AnnotationConfig, NotationFormat, OutputConfig, ParserConfig};
pub use error::{CollectingDiagnostics, CoreError, CoreResult, Diagnostic, Diagnostics, NullDiagnostics};
pub use model::board::Board;
pub use pgn::game::Game;

use std::io::{BufRead, Write};

/// Parse every game in `reader` into a sequence of [`Game`]s.
/// Recoverable lexer/parser errors are routed to `diagnostics` rather
/// than aborting the run; the games returned may individually be
/// flagged [`Game::broken`].
pub fn parse_games<R: BufRead, D: Diagnostics>(reader: R, config: ParserConfig, diagnostics: D) -> (Vec<Game>, D) {
    pgn::parser::parse_games(reader, config, diagnostics)
}

/// Format `game` onto `writer` in the notation and style `config`
/// selects.
pub fn format_game<W: Write>(writer: &mut W, game: &Game, config: &OutputConfig) -> std::io::Result<()> {
    writer.write_all(pgn::writer::format_pgn(game, config).as_bytes())
}
