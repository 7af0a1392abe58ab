//! Configuration contract: plain values a collaborator supplies to the
//! parser and formatter. Defaults are pure functions — there is no
//! process-wide singleton and no initialization-order hazard.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

/// Move notation a game is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, VariantNames)]
pub enum NotationFormat {
    /// Re-emit the literal text as seen in the input.
    Source,
    /// Standard Algebraic Notation, e.g. `Nf3`, `exd5`, `O-O`.
    San,
    /// Long algebraic, e.g. `e2e4`.
    Lalg,
    /// Hyphenated long algebraic, e.g. `e2-e4` / `e2xe4`.
    Halg,
    /// Piece-prefixed long algebraic, e.g. `Ng1f3`.
    Elalg,
    /// UCI notation, e.g. `e1g1`, `e7e8q`, `0000` for null.
    Uci,
    /// Forsyth-Edwards Notation of the position reached.
    Fen,
}

impl Default for NotationFormat {
    fn default() -> Self {
        Self::San
    }
}

/// Which tags to emit ahead of the move text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
pub enum TagFormat {
    #[default]
    All,
    SevenOnly,
    None,
}

/// JSON formatter output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
pub enum JsonMode {
    #[default]
    Batch,
    Single,
}

/// Formatter configuration ("Output").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: NotationFormat,
    pub max_line_length: usize,
    pub keep_move_numbers: bool,
    pub keep_results: bool,
    pub keep_checks: bool,
    pub keep_nags: bool,
    pub keep_comments: bool,
    pub keep_variations: bool,
    pub strip_clock_annotations: bool,
    pub tag_format: TagFormat,
    pub json_mode: JsonMode,
    /// When set, emit the en-passant target in FEN whenever the last
    /// move was a double push, even when no enemy pawn could actually
    /// capture there. Default is the conservative "only when legally
    /// capturable" behaviour.
    pub permissive_ep_fen: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: NotationFormat::default(),
            max_line_length: 80,
            keep_move_numbers: true,
            keep_results: true,
            keep_checks: true,
            keep_nags: true,
            keep_comments: true,
            keep_variations: true,
            strip_clock_annotations: false,
            tag_format: TagFormat::default(),
            json_mode: JsonMode::default(),
            permissive_ep_fen: false,
        }
    }
}

/// Parser configuration ("Parser").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub allow_null_moves: bool,
    pub allow_nested_comments: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { allow_null_moves: false, allow_nested_comments: false }
    }
}

/// Annotation pass-through hints the formatter must honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnnotationConfig {
    pub add_fen_comments: bool,
    pub output_final_fen: bool,
}
