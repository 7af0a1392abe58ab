//! JSON formatter (JSON mode). Walks a [`Game`] against a fresh
//! [`Board`] exactly the way the PGN writer does — consulting the
//! board to resolve each move's source square and, for variations,
//! checkpointing before stepping off the main line — but builds
//! `serde`-derived structs instead of wrapped text.
//!
//! Nothing upstream serialises a game to any text format;
//! `serde`/`serde_json` are the natural extension of the crate's
//! existing (until now formatter-less) `serde` dependency.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{AnnotationConfig, JsonMode, NotationFormat, OutputConfig};
use crate::error::CoreResult;
use crate::model::board::Board;
use crate::model::{Color, Piece};
use crate::notation::render::render;
use crate::pgn::game::{Game, MoveNode, SEVEN_TAG_ROSTER};

#[derive(Debug, Serialize)]
struct JsonMove {
    #[serde(rename = "moveNumber", skip_serializing_if = "Option::is_none")]
    move_number: Option<u32>,
    color: &'static str,
    san: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uci: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    piece: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    captured: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    promotion: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nags: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    comments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    variations: Vec<Vec<JsonMove>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fen: Option<String>,
}

#[derive(Debug, Serialize)]
struct JsonGame {
    tags: IndexMap<String, String>,
    #[serde(rename = "initialFEN", skip_serializing_if = "Option::is_none")]
    initial_fen: Option<String>,
    moves: Vec<JsonMove>,
    result: String,
    #[serde(rename = "plyCount")]
    ply_count: usize,
    #[serde(rename = "finalFEN", skip_serializing_if = "Option::is_none")]
    final_fen: Option<String>,
}

#[derive(Debug, Serialize)]
struct Envelope {
    games: Vec<JsonGame>,
}

/// Accumulates formatted games under [`JsonMode::Batch`]; under
/// [`JsonMode::Single`] each call to [`JsonFormatter::format_game`]
/// hands back its own object immediately and nothing is buffered.
pub struct JsonFormatter {
    output: OutputConfig,
    annotation: AnnotationConfig,
    batch: Vec<JsonGame>,
}

impl JsonFormatter {
    pub fn new(output: OutputConfig, annotation: AnnotationConfig) -> Self {
        Self { output, annotation, batch: Vec::new() }
    }

    /// Format one game. In [`JsonMode::Single`] the game's own JSON
    /// text comes back immediately; in [`JsonMode::Batch`] it's
    /// buffered and `Ok(None)` is returned — the text only appears
    /// from [`JsonFormatter::flush`].
    pub fn format_game(&mut self, game: &Game) -> CoreResult<Option<String>> {
        let json_game = build_game(game, &self.output, &self.annotation)?;
        match self.output.json_mode {
            JsonMode::Single => Ok(Some(serde_json::to_string(&json_game).expect("JsonGame always serializes"))),
            JsonMode::Batch => {
                self.batch.push(json_game);
                Ok(None)
            }
        }
    }

    /// Emit the buffered `{games:[...]}` envelope and clear it.
    /// A no-op in [`JsonMode::Single`], where nothing is ever buffered.
    pub fn flush(&mut self) -> Option<String> {
        if self.output.json_mode == JsonMode::Single || self.batch.is_empty() {
            return None;
        }
        let envelope = Envelope { games: std::mem::take(&mut self.batch) };
        Some(serde_json::to_string(&envelope).expect("Envelope always serializes"))
    }
}

fn build_game(game: &Game, output: &OutputConfig, annotation: &AnnotationConfig) -> CoreResult<JsonGame> {
    let mut tags = IndexMap::new();
    for key in SEVEN_TAG_ROSTER {
        tags.insert(key.to_string(), game.tags.get(key).cloned().unwrap_or_else(|| "?".to_string()));
    }
    for (key, value) in &game.tags {
        if !SEVEN_TAG_ROSTER.contains(&key.as_str()) {
            tags.insert(key.clone(), value.clone());
        }
    }

    let initial_fen = game.tags.get("FEN").cloned();
    let mut board = match &initial_fen {
        Some(fen) => crate::model::fen::parse(fen)?,
        None => Board::new_initial(),
    };

    let moves = build_move_list(&game.moves, game.head, &mut board, output, annotation);
    let final_fen = annotation.output_final_fen.then(|| board.to_fen(output.permissive_ep_fen));

    Ok(JsonGame { tags, initial_fen, ply_count: game.ply_count(), moves, result: game.result.clone(), final_fen })
}

fn build_move_list(
    moves: &[MoveNode],
    head: Option<usize>,
    board: &mut Board,
    output: &OutputConfig,
    annotation: &AnnotationConfig,
) -> Vec<JsonMove> {
    let mut out = Vec::new();
    let mut cursor = head;
    while let Some(ix) = cursor {
        let node = &moves[ix];
        let pre_move = board.checkpoint();
        let move_number = board.fullmove_number();
        let color = board.side_to_move();

        let mut mv = node.mv.clone();
        let applied = board.apply_move(&mut mv);

        let san = render(&mv, NotationFormat::San);
        let uci = applied.then(|| render(&mv, NotationFormat::Uci));
        let from = mv.from_square().map(|sq| sq.to_string());
        let to = mv.to_square().map(|sq| sq.to_string());

        let variations = node
            .variations
            .iter()
            .map(|variation| {
                let mut var_board = pre_move.clone();
                build_move_list(&variation.moves, variation.head, &mut var_board, output, annotation)
            })
            .collect();

        let fen = annotation.add_fen_comments.then(|| board.to_fen(output.permissive_ep_fen));

        out.push(JsonMove {
            move_number: Some(move_number),
            color: color_name(color),
            san,
            uci,
            from,
            to,
            piece: mv.piece.map(piece_name),
            captured: mv.captured.map(piece_name),
            promotion: mv.promotion.map(piece_name),
            nags: node.nags.clone(),
            comments: node.comments.clone(),
            variations,
            fen,
        });

        cursor = node.next;
    }
    out
}

fn color_name(color: Color) -> &'static str {
    if color.is_white() {
        "white"
    } else {
        "black"
    }
}

fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::error::NullDiagnostics;
    use crate::pgn::parser::parse_games;

    fn single_game(pgn: &str) -> Game {
        let (mut games, _) = parse_games(pgn.as_bytes(), ParserConfig::default(), NullDiagnostics);
        games.remove(0)
    }

    #[test]
    fn batch_mode_buffers_until_flush() {
        let game = single_game("1. e4 e5 1-0\n");
        let mut formatter = JsonFormatter::new(OutputConfig::default(), AnnotationConfig::default());
        assert_eq!(formatter.format_game(&game).unwrap(), None);
        let flushed = formatter.flush().expect("one game buffered");
        assert!(flushed.starts_with(r#"{"games":[{"#));
        assert!(flushed.contains(r#""san":"e4""#));
        assert!(flushed.contains(r#""result":"1-0""#));
    }

    #[test]
    fn single_mode_emits_immediately() {
        let game = single_game("1. e4 e5 1-0\n");
        let mut output = OutputConfig::default();
        output.json_mode = JsonMode::Single;
        let mut formatter = JsonFormatter::new(output, AnnotationConfig::default());
        let text = formatter.format_game(&game).unwrap().expect("single mode emits immediately");
        assert!(text.starts_with('{'));
        assert!(formatter.flush().is_none());
    }

    #[test]
    fn resolved_coordinates_and_piece_names_are_present() {
        let game = single_game("1. Nf3 Nf6 *\n");
        let mut formatter = JsonFormatter::new(OutputConfig::default(), AnnotationConfig::default());
        let text = formatter.format_game(&game).unwrap();
        formatter.flush();
        let _ = text;
        let json_game = build_game(&game, &OutputConfig::default(), &AnnotationConfig::default()).unwrap();
        assert_eq!(json_game.moves[0].from.as_deref(), Some("g1"));
        assert_eq!(json_game.moves[0].to.as_deref(), Some("f3"));
        assert_eq!(json_game.moves[0].piece, Some("knight"));
    }

    #[test]
    fn per_move_fen_only_when_configured() {
        let game = single_game("1. e4 *\n");
        let mut annotation = AnnotationConfig::default();
        annotation.add_fen_comments = true;
        let json_game = build_game(&game, &OutputConfig::default(), &annotation).unwrap();
        assert!(json_game.moves[0].fen.is_some());

        let json_game_plain = build_game(&game, &OutputConfig::default(), &AnnotationConfig::default()).unwrap();
        assert!(json_game_plain.moves[0].fen.is_none());
    }

    #[test]
    fn variations_nest_as_move_arrays() {
        let game = single_game("1. e4 e5 (1... c5 2. Nf3 *) 2. Nf3 *\n");
        let json_game = build_game(&game, &OutputConfig::default(), &AnnotationConfig::default()).unwrap();
        let variations = &json_game.moves[1].variations;
        assert_eq!(variations.len(), 1);
        assert_eq!(variations[0].len(), 2);
        assert_eq!(variations[0][0].san, "c5");
    }

    #[test]
    fn malformed_starting_fen_is_an_error() {
        let game = single_game("[FEN \"not a fen\"]\n\n1. e4 *\n");
        let mut formatter = JsonFormatter::new(OutputConfig::default(), AnnotationConfig::default());
        assert!(formatter.format_game(&game).is_err());
    }
}
