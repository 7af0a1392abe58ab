//! PGN formatter (PGN mode): turns a [`Game`] back into PGN text
//! through a line-wrapping writer, honouring the per-move policy
//! toggles in [`OutputConfig`].
//!
//! Per spec §2's data flow, C5 "walks the Game against a fresh C2
//! board, consulting C2 to disambiguate or rewrite moves in the
//! configured notation" — this formatter replays the game on a real
//! [`Board`] as it writes, exactly the way [`crate::json`]'s builder
//! does, so that LALG/HALG/ELALG/UCI/FEN output gets fully-resolved
//! source squares even when the decoder (C3) left them unresolved.
//! No existing formatter in this crate's lineage serialises a game
//! back to text, so the line-wrap idiom itself is written fresh.

use std::fmt::Write as _;

use regex::Regex;
use static_init::Lazy;

use crate::config::{NotationFormat, OutputConfig, TagFormat};
use crate::model::board::Board;
use crate::model::Color;
use crate::notation::render::render;
use crate::pgn::game::{Game, MoveNode, SEVEN_TAG_ROSTER};

static CLOCK_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[%clk\s+\d+:\d{2}:\d{2}(?:\.\d+)?\]").expect("clock annotation pattern is valid"));

/// Render `game` as PGN text, tags then a blank line then the
/// line-wrapped move stream, per `config`.
pub fn format_pgn(game: &Game, config: &OutputConfig) -> String {
    let mut out = String::new();
    write_tags(&mut out, game, config.tag_format);
    if config.tag_format != TagFormat::None {
        out.push('\n');
    }

    let mut writer = LineWriter::new(config.max_line_length.max(1));
    let mut board = starting_board(game);
    write_move_list(&mut writer, &game.moves, game.head, &mut board, config);
    if config.keep_results {
        writer.push_token(&game.result);
    }
    out.push_str(&writer.finish());
    out.push('\n');
    out
}

fn write_tags(out: &mut String, game: &Game, tag_format: TagFormat) {
    if tag_format == TagFormat::None {
        return;
    }
    for key in SEVEN_TAG_ROSTER {
        let value = game.tags.get(key).map(String::as_str).unwrap_or("?");
        write_tag_line(out, key, value);
    }
    if tag_format == TagFormat::All {
        for (key, value) in &game.tags {
            if SEVEN_TAG_ROSTER.contains(&key.as_str()) {
                continue;
            }
            write_tag_line(out, key, value);
        }
    }
}

fn write_tag_line(out: &mut String, key: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    let _ = writeln!(out, "[{key} \"{escaped}\"]");
}

/// The board a game's replay starts from, following a `[FEN "..."]`
/// tag when one is present and parseable. A malformed FEN tag is
/// fatal to that game's replay only (§7): the writer falls back to
/// the initial position, under which every move will simply fail to
/// resolve and fall back to its literal text — the game is still
/// emitted, just without notation rewriting.
fn starting_board(game: &Game) -> Board {
    match game.tags.get("FEN") {
        Some(fen) => crate::model::fen::parse(fen).unwrap_or_else(|_| Board::new_initial()),
        None => Board::new_initial(),
    }
}

fn strip_check_suffix(token: &str) -> String {
    token.trim_end_matches(['+', '#']).to_string()
}

fn render_comment(text: &str, strip_clock: bool) -> Option<String> {
    let working = if strip_clock { CLOCK_ANNOTATION.replace_all(text, "") } else { std::borrow::Cow::Borrowed(text) };
    let trimmed = working.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn write_move_list(writer: &mut LineWriter, moves: &[MoveNode], head: Option<usize>, board: &mut Board, config: &OutputConfig) {
    let mut cursor = head;
    let mut first = true;
    let first_is_black = board.side_to_move() == Color::Black;
    while let Some(ix) = cursor {
        let node = &moves[ix];
        let color = board.side_to_move();
        let number = board.fullmove_number();

        if config.keep_move_numbers {
            if color == Color::White {
                writer.push_token(&format!("{number}."));
            } else if first && first_is_black {
                writer.push_token(&format!("{number}..."));
            }
        }

        // Branch the variation from the position as it stood *before*
        // this move, per PGN semantics (a RAV is an alternative to the
        // move it's attached to, not a continuation after it).
        let pre_move = board.checkpoint();
        let mut mv = node.mv.clone();
        let resolved = board.apply_move(&mut mv);
        if !resolved {
            // apply_move never partially mutates `mv` on failure except
            // possibly from_file/from_rank when find_source succeeded
            // but a later legality check failed; discard that and fall
            // back to the decoder's own (unresolved) descriptor.
            mv = node.mv.clone();
        }

        writer.push_token(&render_token(&mv, board, config, resolved));

        if config.keep_nags {
            for nag in &node.nags {
                writer.push_token(&format!("${nag}"));
            }
        }
        if config.keep_comments {
            for comment in &node.comments {
                if let Some(text) = render_comment(comment, config.strip_clock_annotations) {
                    writer.push_token(&format!("{{{text}}}"));
                }
            }
        }
        if config.keep_variations {
            for variation in &node.variations {
                writer.open_paren();
                for comment in &variation.prefix_comments {
                    if let Some(text) = render_comment(comment, config.strip_clock_annotations) {
                        writer.push_token(&format!("{{{text}}}"));
                    }
                }
                let mut var_board = pre_move.clone();
                write_move_list(writer, &variation.moves, variation.head, &mut var_board, config);
                if let Some(result) = &variation.result {
                    writer.push_token(result);
                }
                writer.close_paren();
                for comment in &variation.suffix_comments {
                    if let Some(text) = render_comment(comment, config.strip_clock_annotations) {
                        writer.push_token(&format!("{{{text}}}"));
                    }
                }
            }
        }

        cursor = node.next;
        first = false;
    }
}

/// Render one move's token. [`NotationFormat::Fen`] is the one format
/// the per-move [`render`] function can't produce on its own — it
/// names the *position reached*, not the move — so it's handled here
/// against the post-move `board` instead.
fn render_token(mv: &crate::model::RawMove, board: &Board, config: &OutputConfig, resolved: bool) -> String {
    if config.format == NotationFormat::Fen {
        return if resolved { board.to_fen(config.permissive_ep_fen) } else { mv.text.clone() };
    }
    let mut token = render(mv, config.format);
    if !config.keep_checks && matches!(config.format, NotationFormat::Source | NotationFormat::San) {
        token = strip_check_suffix(&token);
    }
    token
}

/// Emits one space between tokens unless that would exceed the
/// configured width, in which case it starts a new line instead.
struct LineWriter {
    out: String,
    column: usize,
    max: usize,
    /// Set after an opening `(` so the following token attaches with no
    /// separating space; closing `)` always attaches to its predecessor
    /// the same way.
    suppress_separator: bool,
}

impl LineWriter {
    fn new(max: usize) -> Self {
        Self { out: String::new(), column: 0, max, suppress_separator: false }
    }

    fn push_token(&mut self, token: &str) {
        let width = token.chars().count();
        if self.column == 0 || self.suppress_separator {
            self.out.push_str(token);
            self.column += width;
        } else if self.column + 1 + width > self.max {
            self.out.push('\n');
            self.out.push_str(token);
            self.column = width;
        } else {
            self.out.push(' ');
            self.out.push_str(token);
            self.column += 1 + width;
        }
        self.suppress_separator = false;
    }

    fn open_paren(&mut self) {
        self.push_token("(");
        self.suppress_separator = true;
    }

    fn close_paren(&mut self) {
        self.out.push(')');
        self.column += 1;
        self.suppress_separator = false;
    }

    fn finish(self) -> String {
        self.out
    }
}
