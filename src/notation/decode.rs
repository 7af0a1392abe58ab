//! Single-move-token decoder. One-pass with a positional cursor over
//! the token's characters; no backtracking.
//!
//! Grounded in the `notation::stdalg` / `notation::coord_notation`
//! combinator shapes this crate's move syntax descends from,
//! generalised from a single English SAN dialect to a multilingual
//! piece-letter set. `trie_rs` was declared but never called upstream;
//! this is the first real use, recognising piece letters across
//! English, German, Dutch, and Russian PGN dialects.

use static_init::Lazy;
use trie_rs::{Trie, TrieBuilder};

use crate::model::board::Board;
use crate::model::{Cell, File, MoveClass, Piece, Rank, RawMove};

/// `(letter, piece)` pairs recognised as a piece-move prefix. English,
/// German (`K D T L S`), Dutch (`K D T L P`), and single-character
/// Russian letters share this table; the Russian letters are plain
/// Cyrillic characters, which is why they take two bytes in UTF-8 even
/// though they're a single move-text character.
const PIECE_LETTERS: &[(&str, Piece)] = &[
    ("N", Piece::Knight),
    ("B", Piece::Bishop),
    ("R", Piece::Rook),
    ("Q", Piece::Queen),
    ("K", Piece::King),
    ("S", Piece::Knight),  // German Springer
    ("L", Piece::Bishop),  // German Läufer / Dutch Loper
    ("T", Piece::Rook),    // German Turm / Dutch Toren
    ("D", Piece::Queen),   // German/Dutch Dame
    ("P", Piece::Knight),  // Dutch Paard
    ("С", Piece::Bishop),  // Russian Slon
    ("Л", Piece::Rook),    // Russian Ladya
    ("Ф", Piece::Queen),   // Russian Ferz
    ("Кр", Piece::King),   // Russian Korol
    ("Кон", Piece::Knight), // Russian Kon'
];

static PIECE_LETTER_TRIE: Lazy<Trie<u8>> = Lazy::new(|| {
    let mut builder = TrieBuilder::new();
    for (letter, _) in PIECE_LETTERS {
        builder.push(letter.as_bytes());
    }
    builder.build()
});

fn match_piece_letter(text: &str) -> Option<(Piece, usize)> {
    let chars: Vec<char> = text.chars().collect();
    for len in (1..=3.min(chars.len())).rev() {
        let candidate: String = chars[..len].iter().collect();
        if PIECE_LETTER_TRIE.exact_match(candidate.as_bytes()) {
            if let Some((_, piece)) = PIECE_LETTERS.iter().find(|(l, _)| *l == candidate) {
                return Some((*piece, len));
            }
        }
    }
    None
}

fn is_castle_char(c: char) -> bool {
    matches!(c, 'O' | 'o' | '0')
}

fn is_separator(c: char) -> bool {
    matches!(c, 'x' | ':' | '-')
}

/// Index one-past the last character before any trailing run of
/// `+`/`#`, plus whether each was seen.
fn trailing_check_mate(chars: &[char]) -> (usize, bool, bool) {
    let mut end = chars.len();
    let (mut check, mut mate) = (false, false);
    while end > 0 {
        match chars[end - 1] {
            '+' => {
                check = true;
                end -= 1;
            }
            '#' => {
                mate = true;
                end -= 1;
            }
            _ => break,
        }
    }
    (end, check, mate)
}

/// `=Q`, bare trailing `Q`, or the non-standard bare trailing `b`
/// (bishop). Returns `(piece, chars consumed)`.
fn parse_promotion(chars: &[char]) -> (Option<Piece>, usize) {
    if chars.is_empty() {
        return (None, 0);
    }
    if chars[0] == '=' {
        if let Some(&letter) = chars.get(1) {
            if let Some(piece) = promotion_letter(letter) {
                return (Some(piece), 2);
            }
        }
        return (None, 0);
    }
    if let Some(piece) = promotion_letter(chars[0]) {
        return (Some(piece), 1);
    }
    (None, 0)
}

fn promotion_letter(c: char) -> Option<Piece> {
    match c.to_ascii_uppercase() {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        _ => None,
    }
}

/// `ep` or `e.p.`, case-insensitive. Returns chars consumed.
fn parse_ep_suffix(chars: &[char]) -> usize {
    let rest: String = chars.iter().collect();
    let lower = rest.to_ascii_lowercase();
    if lower.starts_with("e.p.") {
        4
    } else if lower.starts_with("ep") {
        2
    } else {
        0
    }
}

/// Decode one move token. Always returns a descriptor, even
/// for malformed input — unrecognised text comes back as
/// [`MoveClass::UnknownMove`] with the literal text preserved so the
/// caller can still log and continue.
pub fn decode_move_token(text: &str) -> RawMove {
    if text == "--" || text.eq_ignore_ascii_case("z0") {
        let mut mv = RawMove::unknown(text);
        mv.class = MoveClass::NullMove;
        return mv;
    }
    let chars: Vec<char> = text.chars().collect();
    let Some(&first) = chars.first() else {
        return RawMove::unknown(text);
    };
    if is_castle_char(first) {
        return decode_castle(text, &chars);
    }
    if File::from_char(first).is_some() {
        return decode_pawn(text, &chars);
    }
    if let Some((piece, consumed)) = match_piece_letter(text) {
        return decode_piece(text, &chars, piece, consumed);
    }
    RawMove::unknown(text)
}

fn decode_castle(text: &str, chars: &[char]) -> RawMove {
    let (core_end, check, mate) = trailing_check_mate(chars);
    let letters: usize = chars[..core_end].iter().filter(|&&c| is_castle_char(c)).count();
    let mut mv = RawMove::unknown(text);
    mv.piece = Some(Piece::King);
    mv.check = check;
    mv.mate = mate;
    mv.class = match letters {
        2 => MoveClass::KingsideCastle,
        3 => MoveClass::QueensideCastle,
        _ => MoveClass::UnknownMove,
    };
    mv
}

fn decode_pawn(text: &str, chars: &[char]) -> RawMove {
    let (core_end, check, mate) = trailing_check_mate(chars);
    let mut idx = 1usize; // first char already known to be a file letter
    let first_file = File::from_char(chars[0]).expect("caller verified file letter");

    let mut from_file = None;
    let mut from_rank = None;
    let mut to_file = None;
    let mut to_rank = None;
    let mut is_capture = false;

    match chars.get(idx).copied() {
        Some(c) if c.is_ascii_digit() && idx < core_end => {
            let rank1 = Rank::from_char(c);
            idx += 1;
            match chars.get(idx).copied() {
                Some(sep) if is_separator(sep) && idx < core_end => {
                    is_capture = matches!(sep, 'x' | ':');
                    idx += 1;
                    if let (Some(f2), Some(r2)) =
                        (chars.get(idx).and_then(|&c| File::from_char(c)), chars.get(idx + 1).and_then(|&c| Rank::from_char(c)))
                    {
                        from_file = Some(first_file);
                        from_rank = rank1;
                        to_file = Some(f2);
                        to_rank = Some(r2);
                        idx += 2;
                    }
                }
                Some(f) if File::from_char(f).is_some() && idx < core_end => {
                    let f2 = File::from_char(f).unwrap();
                    if let Some(r2) = chars.get(idx + 1).and_then(|&c| Rank::from_char(c)) {
                        from_file = Some(first_file);
                        from_rank = rank1;
                        to_file = Some(f2);
                        to_rank = Some(r2);
                        idx += 2;
                    } else {
                        to_file = Some(first_file);
                        to_rank = rank1;
                    }
                }
                _ => {
                    to_file = Some(first_file);
                    to_rank = rank1;
                }
            }
        }
        Some(sep) if is_separator(sep) => {
            is_capture = matches!(sep, 'x' | ':');
            idx += 1;
            if let (Some(f2), Some(r2)) =
                (chars.get(idx).and_then(|&c| File::from_char(c)), chars.get(idx + 1).and_then(|&c| Rank::from_char(c)))
            {
                from_file = Some(first_file);
                to_file = Some(f2);
                to_rank = Some(r2);
                idx += 2;
            } else if let Some(f2) = chars.get(idx).and_then(|&c| File::from_char(c)) {
                from_file = Some(first_file);
                to_file = Some(f2);
                idx += 1;
            }
        }
        Some(c) if File::from_char(c).is_some() => {
            let f2 = File::from_char(c).unwrap();
            idx += 1;
            from_file = Some(first_file);
            to_file = Some(f2);
            if let Some(r2) = chars.get(idx).and_then(|&c| Rank::from_char(c)) {
                to_rank = Some(r2);
                idx += 1;
            }
        }
        _ => {}
    }

    let mut mv = RawMove::unknown(text);
    mv.piece = Some(Piece::Pawn);
    mv.class = MoveClass::PawnMove;
    mv.from_file = from_file;
    mv.from_rank = from_rank;
    mv.to_file = to_file;
    mv.to_rank = to_rank;
    mv.is_capture_notation = is_capture;
    mv.check = check;
    mv.mate = mate;

    if idx <= core_end {
        let (promotion, consumed) = parse_promotion(&chars[idx..core_end]);
        mv.promotion = promotion;
        idx += consumed;
        if promotion.is_some() {
            mv.class = MoveClass::PawnMoveWithPromotion;
        }
    }

    if idx <= core_end {
        let consumed = parse_ep_suffix(&chars[idx..core_end]);
        if consumed > 0 {
            mv.class = MoveClass::EnPassantPawnMove;
            idx += consumed;
        }
    }

    if idx != core_end || to_file.is_none() {
        mv.class = MoveClass::UnknownMove;
    }

    mv
}

fn decode_piece(text: &str, chars: &[char], piece: Piece, consumed: usize) -> RawMove {
    let (core_end, check, mate) = trailing_check_mate(chars);
    let mut mv = RawMove::unknown(text);
    mv.piece = Some(piece);
    mv.check = check;
    mv.mate = mate;

    if core_end < consumed + 2 {
        return mv;
    }
    let body = &chars[consumed..core_end];
    let n = body.len();
    let (Some(target_file), Some(target_rank)) = (File::from_char(body[n - 2]), Rank::from_char(body[n - 1])) else {
        return mv;
    };

    let mut from_file = None;
    let mut from_rank = None;
    let mut is_capture = false;
    for &c in &body[..n - 2] {
        if is_separator(c) {
            is_capture = true;
        } else if let Some(f) = File::from_char(c) {
            from_file = Some(f);
        } else if let Some(r) = Rank::from_char(c) {
            from_rank = Some(r);
        } else {
            return mv; // unrecognised character in the disambiguation prefix
        }
    }

    mv.class = MoveClass::PieceMove;
    mv.from_file = from_file;
    mv.from_rank = from_rank;
    mv.to_file = Some(target_file);
    mv.to_rank = Some(target_rank);
    mv.is_capture_notation = is_capture;
    mv
}

/// Board-context refinement: a fully resolved long-algebraic king move
/// of two files is reclassified as
/// castling when a king actually occupies the source square, regardless
/// of what the decoder's first-character classification guessed.
///
/// Called from [`Board::apply_move`](crate::model::board::Board::apply_move)
/// whenever a move arrives with both squares already resolved — the
/// `e1g1` spelling of kingside castling decodes as a two-file pawn move
/// off the `e1`-is-a-file-letter branch, and nothing else downstream
/// would otherwise catch that it's really a king hopping with its rook.
pub fn refine_with_board(mv: &mut RawMove, board: &Board) {
    let (Some(from), Some(to)) = (mv.from_square(), mv.to_square()) else { return };
    let Cell::Occupied(cp) = board.get(from.file, from.rank) else { return };
    if cp.piece() != Piece::King || from.rank != to.rank {
        return;
    }
    let delta = to.file.ix() as i32 - from.file.ix() as i32;
    if delta == 2 {
        mv.piece = Some(Piece::King);
        mv.class = MoveClass::KingsideCastle;
    } else if delta == -2 {
        mv.piece = Some(Piece::King);
        mv.class = MoveClass::QueensideCastle;
    }
}
