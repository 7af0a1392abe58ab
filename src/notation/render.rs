//! Move rendering: turn a resolved [`RawMove`] back into text in the
//! configured notation. Check/mate suffixes are deliberately *not*
//! appended here — that's the PGN writer's job, since only the
//! SAN-like notations traditionally carry them.
//!
//! Grounded in the `notation::mod` `Display` impls for
//! `StdAlgPawn`/`StdAlgOfficer`/`StdAlgCastling` and the alternate-flag
//! idiom in `model::notation::mod` (`AlgPawn`/`AlgPiece`), generalised
//! from a single alternate-notation toggle to the full
//! Source/SAN/LALG/HALG/ELALG/UCI set.

use crate::config::NotationFormat;
use crate::model::{MoveClass, Piece, RawMove};

/// Render `mv` in `format`. Falls back to the literal source text when
/// a move's coordinates aren't fully resolved (an `UnknownMove` or an
/// un-replayed move) — there's nothing else truthful to print.
pub fn render(mv: &RawMove, format: NotationFormat) -> String {
    if mv.class == MoveClass::NullMove {
        return if format == NotationFormat::Uci { "0000".to_string() } else { "--".to_string() };
    }
    match format {
        NotationFormat::Source | NotationFormat::San | NotationFormat::Fen => mv.text.clone(),
        NotationFormat::Lalg => render_long(mv, None, false),
        NotationFormat::Halg => render_long(mv, Some(if mv.is_capture_notation { 'x' } else { '-' }), false),
        NotationFormat::Elalg => render_long(mv, None, true),
        NotationFormat::Uci => render_uci(mv),
    }
}

fn is_castle(mv: &RawMove) -> bool {
    matches!(mv.class, MoveClass::KingsideCastle | MoveClass::QueensideCastle)
}

fn render_long(mv: &RawMove, separator: Option<char>, piece_prefix: bool) -> String {
    let (Some(from), Some(to)) = (mv.from_square(), mv.to_square()) else {
        return mv.text.clone();
    };
    if is_castle(mv) {
        return format!("{from}{to}");
    }
    let mut out = String::new();
    if piece_prefix {
        if let Some(piece) = mv.piece {
            if piece != Piece::Pawn {
                out.push_str(piece.letter());
            }
        }
    }
    out.push_str(&from.to_string());
    if let Some(sep) = separator {
        out.push(sep);
    }
    out.push_str(&to.to_string());
    if let Some(promo) = mv.promotion {
        out.push('=');
        out.push_str(promo.letter());
    }
    out
}

fn render_uci(mv: &RawMove) -> String {
    let (Some(from), Some(to)) = (mv.from_square(), mv.to_square()) else {
        return mv.text.clone();
    };
    let mut out = format!("{from}{to}");
    if let Some(promo) = mv.promotion {
        if let Some(letter) = promo.letter().chars().next() {
            out.push(letter.to_ascii_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{File, Rank};

    fn resolved_move(piece: Piece, from: (u8, u8), to: (u8, u8), capture: bool, promotion: Option<Piece>) -> RawMove {
        RawMove {
            text: "irrelevant".to_string(),
            class: MoveClass::PieceMove,
            piece: Some(piece),
            promotion,
            from_file: Some(File::new(from.0)),
            from_rank: Some(Rank::new(from.1)),
            to_file: Some(File::new(to.0)),
            to_rank: Some(Rank::new(to.1)),
            captured: None,
            is_capture_notation: capture,
            check: false,
            mate: false,
        }
    }

    #[test]
    fn lalg_has_no_separator() {
        let mv = resolved_move(Piece::Pawn, (4, 1), (4, 3), false, None);
        assert_eq!(render(&mv, NotationFormat::Lalg), "e2e4");
    }

    #[test]
    fn halg_uses_x_for_captures() {
        let mv = resolved_move(Piece::Pawn, (4, 3), (3, 4), true, None);
        assert_eq!(render(&mv, NotationFormat::Halg), "e4xd5");
    }

    #[test]
    fn halg_uses_hyphen_for_quiet_moves() {
        let mv = resolved_move(Piece::Pawn, (4, 1), (4, 3), false, None);
        assert_eq!(render(&mv, NotationFormat::Halg), "e2-e4");
    }

    #[test]
    fn elalg_prefixes_the_piece_letter() {
        let mv = resolved_move(Piece::Knight, (6, 0), (5, 2), false, None);
        assert_eq!(render(&mv, NotationFormat::Elalg), "Ng1f3");
    }

    #[test]
    fn uci_lowercases_promotion() {
        let mv = resolved_move(Piece::Pawn, (4, 6), (4, 7), false, Some(Piece::Queen));
        assert_eq!(render(&mv, NotationFormat::Uci), "e7e8q");
    }

    #[test]
    fn castling_renders_as_king_travel_in_uci() {
        let mut mv = resolved_move(Piece::King, (4, 0), (6, 0), false, None);
        mv.class = MoveClass::KingsideCastle;
        assert_eq!(render(&mv, NotationFormat::Uci), "e1g1");
    }

    #[test]
    fn null_move_is_dashes_except_in_uci() {
        let mut mv = resolved_move(Piece::Pawn, (0, 0), (0, 0), false, None);
        mv.class = MoveClass::NullMove;
        assert_eq!(render(&mv, NotationFormat::Lalg), "--");
        assert_eq!(render(&mv, NotationFormat::Uci), "0000");
    }
}
