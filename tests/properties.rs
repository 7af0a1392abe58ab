//! Seven universal properties of the parse/replay/format pipeline,
//! exercised at the public crate surface.

use pgn_core::config::{OutputConfig, ParserConfig};
use pgn_core::error::NullDiagnostics;
use pgn_core::model::board::Board;
use pgn_core::notation::decode::decode_move_token;
use pgn_core::{analyze_game, format_game, parse_games};
use pretty_assertions::assert_eq;

fn parse_one(pgn: &str) -> pgn_core::Game {
    let (mut games, _) = parse_games(pgn.as_bytes(), ParserConfig::default(), NullDiagnostics);
    assert_eq!(games.len(), 1);
    games.remove(0)
}

fn play(board: &mut Board, texts: &[&str]) {
    for text in texts {
        let mut mv = decode_move_token(text);
        assert!(board.apply_move(&mut mv), "'{text}' should be legal");
    }
}

/// 1. FEN round-trip: for every board reachable by a legal sequence,
/// `from_fen(to_fen(b)) == b` on observable state.
#[test]
fn fen_round_trip_after_legal_sequence() {
    let mut board = Board::new_initial();
    play(&mut board, &["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6", "O-O", "Be7"]);
    let fen = board.to_fen(false);
    let reparsed = Board::from_fen(&fen).expect("round-tripped FEN must parse");
    assert_eq!(reparsed, board);
    assert_eq!(reparsed.to_fen(false), fen);
}

/// 2. Replay determinism: parsing and replaying a certified-legal game
/// never raises `IllegalMove`.
#[test]
fn replay_determinism_on_a_legal_game() {
    let pgn = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 6. Re1 b5 7. Bb3 d6 1/2-1/2\n";
    let game = parse_one(pgn);
    let analysis = analyze_game(&game);
    assert!(analysis.start_fen_error.is_none());
    assert_eq!(analysis.stopped_at_ply, None, "a legal game must replay to completion");
}

/// 3. Zobrist identity: returning to the starting position by a
/// different move order hashes identically to a fresh board, even
/// though the halfmove clock differs.
#[test]
fn zobrist_identity_after_returning_to_start() {
    let mut board = Board::new_initial();
    play(&mut board, &["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"]);
    assert_eq!(board.zobrist(), Board::new_initial().zobrist());
    assert_ne!(board.halfmove_clock(), Board::new_initial().halfmove_clock());
}

/// 4. Tokeniser idempotence: re-lexing the `Source`-formatted output
/// yields the same move texts as the original parse.
#[test]
fn tokeniser_idempotence_through_source_round_trip() {
    let pgn = "[Event \"Test\"]\n[White \"Tal\"]\n[Black \"Botvinnik\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Bb5 1-0\n";
    let original = parse_one(pgn);
    let mut config = OutputConfig::default();
    config.format = pgn_core::config::NotationFormat::Source;
    let mut out = Vec::new();
    format_game(&mut out, &original, &config).unwrap();
    let reformatted = String::from_utf8(out).unwrap();

    let reparsed = parse_one(&reformatted);
    let original_texts: Vec<&str> = collect_texts(&original);
    let reparsed_texts: Vec<&str> = collect_texts(&reparsed);
    assert_eq!(original_texts, reparsed_texts);
}

fn collect_texts(game: &pgn_core::Game) -> Vec<&str> {
    let mut out = Vec::new();
    let mut cursor = game.head;
    while let Some(ix) = cursor {
        let node = &game.moves[ix];
        out.push(node.mv.text.as_str());
        cursor = node.next;
    }
    out
}

/// 5. Move-list invariant: `m.next.prev == m` for every move with a
/// `next`, across both the main line and nested variations.
#[test]
fn move_list_links_are_consistent_including_variations() {
    let game = parse_one("1. e4 e5 (1... c5 2. Nf3 Nc6 *) 2. Nf3 *\n");
    assert!(game.move_list_is_consistent());
    for node in &game.moves {
        for variation in &node.variations {
            assert!(variation_is_consistent(variation));
        }
    }
}

fn variation_is_consistent(variation: &pgn_core::pgn::game::Variation) -> bool {
    variation.moves.iter().enumerate().all(|(ix, node)| match node.next {
        Some(next) => variation.moves[next].prev == Some(ix),
        None => true,
    })
}

/// 6. Seven-tag roster: after parsing, every game's tag table has
/// exactly the seven canonical keys populated (real value or `"?"`).
#[test]
fn seven_tag_roster_always_present_after_parsing() {
    let game = parse_one("1. e4 e5 *\n");
    for key in pgn_core::pgn::game::SEVEN_TAG_ROSTER {
        assert!(game.tags.contains_key(key));
    }
    assert_eq!(game.tags.get("Event").map(String::as_str), Some("?"));
}

/// 7. Variation isolation: formatting with `keep_variations` true vs.
/// false leaves the main-line move sequence identical.
#[test]
fn variation_isolation_leaves_main_line_untouched() {
    let game = parse_one("1. e4 e5 (1... c5 2. Nf3 *) 2. Nf3 Nc6 *\n");

    let mut with_variations = OutputConfig::default();
    with_variations.keep_variations = true;
    let mut without_variations = OutputConfig::default();
    without_variations.keep_variations = false;

    let mut out_with = Vec::new();
    format_game(&mut out_with, &game, &with_variations).unwrap();
    let mut out_without = Vec::new();
    format_game(&mut out_without, &game, &without_variations).unwrap();

    let with_text = String::from_utf8(out_with).unwrap();
    let without_text = String::from_utf8(out_without).unwrap();
    let main_line_only = with_text.replace("(1... c5 2. Nf3 *) ", "");
    assert_eq!(main_line_only, without_text);
}
