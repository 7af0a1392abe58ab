//! Per-game analysis/validation pass: replays a [`Game`] on a fresh
//! [`Board`], resolving any from-squares left unresolved by the
//! decoder, and reports the draw/handicap/underpromotion predicates a
//! collaborator needs to annotate or filter games with.
//!
//! Nothing upstream has a replay-validation pass over parsed text, so
//! this is written fresh, following the board/move-list shapes
//! elsewhere in this crate.

use indexmap::IndexMap;
use rootcause::Report;

use crate::error::{CoreError, Diagnostic, ErrorContext};
use crate::model::board::Board;
use crate::model::{Color, MoveClass, Piece};
use crate::pgn::game::{Game, MoveNode, SEVEN_TAG_ROSTER};

/// Outcome of replaying one game through the engine.
#[derive(Debug)]
pub struct Analysis {
    /// The board reached after the last successfully applied ply —
    /// the final position if replay completed, or the last legal
    /// position if it stopped early.
    pub final_board: Board,
    /// Set when an `[FEN "..."]` tag was present but malformed — an
    /// invalid FEN tag is fatal to that game's replay only. No replay
    /// is attempted when this is set.
    pub start_fen_error: Option<Report<CoreError>>,
    /// Ply index (0-based) at which `apply_move` first failed, if any.
    /// The game object itself is left untouched; the caller decides
    /// whether to drop, pass through, or warn.
    pub stopped_at_ply: Option<usize>,
    /// True when the starting position's material differs from the
    /// standard 16-man, 39-point army on both sides (handicap game).
    pub material_odds: bool,
    /// True when the final position has insufficient mating material.
    pub insufficient_material: bool,
    /// A same position (by Zobrist identity) recurred a third time.
    pub threefold_repetition: bool,
    /// A same position recurred a fifth time.
    pub fivefold_repetition: bool,
    /// Ply indices where a pawn promoted to anything other than a
    /// queen.
    pub underpromotions: Vec<usize>,
    /// Non-fatal observations gathered during replay — currently just
    /// the `b`-prefix pawn/Bishop ambiguity (§9 Open Question).
    pub diagnostics: Vec<Diagnostic>,
    /// One [`CoreError::MissingTag`] per seven-tag-roster entry that was
    /// never actually supplied by the source — i.e. still carries the
    /// `"?"` placeholder [`Game::ensure_seven_tag_roster`] fills in.
    /// The game still parses and replays normally; this is validation
    /// feedback for a collaborator that wants to flag or reject it.
    pub missing_tags: Vec<Report<CoreError>>,
}

fn missing_roster_tags(game: &Game) -> Vec<Report<CoreError>> {
    SEVEN_TAG_ROSTER
        .iter()
        .filter(|&&tag| game.tags.get(tag).map(String::as_str) == Some("?"))
        .map(|&tag| {
            let context = ErrorContext::new().with_line(game.start_line);
            Report::new(CoreError::MissingTag { tag, context })
        })
        .collect()
}

/// Replay `game`'s main line and report the predicates above, funneled
/// through a single typed result rather than a grab-bag of
/// out-parameters.
pub fn analyze_game(game: &Game) -> Analysis {
    let missing_tags = missing_roster_tags(game);
    let start_board = match starting_board(game) {
        Ok(board) => board,
        Err(err) => {
            return Analysis {
                final_board: Board::new_initial(),
                start_fen_error: Some(err),
                stopped_at_ply: None,
                material_odds: false,
                insufficient_material: false,
                threefold_repetition: false,
                fivefold_repetition: false,
                underpromotions: Vec::new(),
                diagnostics: Vec::new(),
                missing_tags,
            };
        }
    };
    let material_odds = start_board.check_material_odds();

    let mut board = start_board;
    let mut position_counts: IndexMap<u64, u32> = IndexMap::new();
    *position_counts.entry(board.zobrist()).or_insert(0) += 1;

    let mut stopped_at_ply = None;
    let mut underpromotions = Vec::new();
    let mut diagnostics = Vec::new();
    let mut threefold_repetition = false;
    let mut fivefold_repetition = false;

    let mut cursor = game.head;
    let mut ply = 0usize;
    while let Some(ix) = cursor {
        let node: &MoveNode = &game.moves[ix];
        let mut mv = node.mv.clone();
        if let Some(diag) = check_b_prefix_ambiguity(&board, &mv, ply) {
            diagnostics.push(diag);
        }
        if !board.apply_move(&mut mv) {
            stopped_at_ply = Some(ply);
            break;
        }
        if mv.class == MoveClass::PawnMoveWithPromotion && mv.promotion != Some(Piece::Queen) {
            underpromotions.push(ply);
        }
        let count = position_counts.entry(board.zobrist()).or_insert(0);
        *count += 1;
        if *count >= 3 {
            threefold_repetition = true;
        }
        if *count >= 5 {
            fivefold_repetition = true;
        }
        cursor = node.next;
        ply += 1;
    }

    Analysis {
        insufficient_material: board.has_insufficient_material(),
        final_board: board,
        start_fen_error: None,
        stopped_at_ply,
        material_odds,
        threefold_repetition,
        fivefold_repetition,
        underpromotions,
        diagnostics,
        missing_tags,
    }
}

/// A decoded `bxc6`-style pawn capture is always read as the pawn move
/// the spec requires, but when the side to move also has a bishop that
/// could reach the same square, flag it rather than guess silently.
fn check_b_prefix_ambiguity(board: &Board, mv: &crate::model::RawMove, ply: usize) -> Option<Diagnostic> {
    if mv.piece != Some(Piece::Pawn) || !mv.is_capture_notation {
        return None;
    }
    if !mv.text.starts_with('b') {
        return None;
    }
    let to = mv.to_square()?;
    let mover: Color = board.side_to_move();
    if board.any_piece_can_reach(mover, Piece::Bishop, to) {
        return Some(Diagnostic::AmbiguousBPrefix { ply, text: mv.text.clone() });
    }
    None
}

fn starting_board(game: &Game) -> Result<Board, Report<CoreError>> {
    match game.tags.get("FEN") {
        Some(fen) => crate::model::fen::parse(fen),
        None => Ok(Board::new_initial()),
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
    fn underpromotion_to_knight_is_flagged() {
        let game = single_game("1. e4 d5 2. exd5 c6 3. dxc6 Nf6 4. cxb7 Bd7 5. bxa8=N 1-0\n");
        let analysis = analyze_game(&game);
        assert!(analysis.start_fen_error.is_none());
        assert_eq!(analysis.stopped_at_ply, None);
        assert_eq!(analysis.underpromotions.len(), 1);
    }

    #[test]
    fn threefold_is_flagged_but_not_fivefold() {
        let game = single_game(
            "1. Nf3 Nf6 2. Ng1 Ng8 3. Nf3 Nf6 4. Ng1 Ng8 5. Nf3 Nf6 1/2-1/2\n",
        );
        let analysis = analyze_game(&game);
        assert!(analysis.threefold_repetition);
        assert!(!analysis.fivefold_repetition);
    }

    #[test]
    fn starting_fen_tag_seeds_the_replay() {
        let game = single_game(
            "[FEN \"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1\"]\n[SetUp \"1\"]\n\n1... e5 *\n",
        );
        let analysis = analyze_game(&game);
        assert!(analysis.start_fen_error.is_none());
        use crate::model::{Cell, File, Piece as P, Rank};
        let cp = analysis.final_board.get(File::from_char('e').unwrap(), Rank::from_char('5').unwrap());
        assert!(matches!(cp, Cell::Occupied(p) if p.piece() == P::Pawn));
    }

    #[test]
    fn malformed_fen_tag_is_fatal_to_replay_only() {
        let game = single_game("[FEN \"not a fen\"]\n\n1. e4 *\n");
        let analysis = analyze_game(&game);
        assert!(analysis.start_fen_error.is_some());
    }

    #[test]
    fn untagged_game_reports_all_seven_roster_tags_missing() {
        let game = single_game("1. e4 e5 *\n");
        let analysis = analyze_game(&game);
        assert_eq!(analysis.missing_tags.len(), SEVEN_TAG_ROSTER.len());
    }

    #[test]
    fn supplying_some_tags_narrows_which_are_reported_missing() {
        // Event, White, and Result (via the terminating token) are all
        // genuinely supplied; the other four roster entries still carry
        // the "?" placeholder and should each produce a report.
        let game = single_game("[Event \"Test\"]\n[White \"Tal\"]\n\n1. e4 e5 1-0\n");
        assert_eq!(game.tags.get("Event").map(String::as_str), Some("Test"));
        assert_eq!(game.tags.get("Site").map(String::as_str), Some("?"));
        let analysis = analyze_game(&game);
        assert_eq!(analysis.missing_tags.len(), SEVEN_TAG_ROSTER.len() - 2);
    }

    #[test]
    fn b_prefix_pawn_capture_is_flagged_when_a_bishop_could_also_reach_the_square() {
        let game = single_game(
            "[FEN \"4k3/8/2n5/1P6/8/5B2/8/4K3 w - - 0 1\"]\n[SetUp \"1\"]\n\n1. bxc6 *\n",
        );
        let analysis = analyze_game(&game);
        assert!(analysis.start_fen_error.is_none());
        assert!(
            analysis
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::AmbiguousBPrefix { ply: 0, text } if text == "bxc6"))
        );
    }

    #[test]
    fn b_prefix_pawn_capture_with_no_bishop_in_play_is_not_flagged() {
        let game = single_game("1. b4 e5 2. bxa5 *\n");
        let analysis = analyze_game(&game);
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn knight_odds_start_is_flagged() {
        let game = single_game(
            "[FEN \"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/R1BQKBNR w KQkq - 0 1\"]\n[SetUp \"1\"]\n\n1. e4 *\n",
        );
        let analysis = analyze_game(&game);
        assert!(analysis.material_odds);
    }
}
