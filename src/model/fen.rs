//! FEN parsing and encoding ("Forsyth-Edwards Notation").
//!
//! A small, bounded grammar, so — unlike the PGN lexer/parser — this is
//! built with `chumsky`, the same way an earlier `notation::fen::mod`
//! piece table and rank parsers were built (`choice`, `just`,
//! `group(...).map_group(...)`). A stray `fen.rs` scratch file in that
//! lineage didn't compile (an empty promotion-letter closure); only
//! the working `fen/mod.rs` combinators are carried forward,
//! generalised from Chess960/shredder dialects down to plain standard
//! FEN.

use chumsky::prelude::*;

use crate::error::{invalid_fen, CoreResult, ErrorContext};
use crate::model::board::{Board, KINGSIDE, QUEENSIDE};
use crate::model::{Cell, Color, ColoredPiece, File, Piece, Rank, Square};

enum RankToken {
    Gap(u8),
    Piece(Color, Piece),
}

fn piece_letter<'s>() -> impl Parser<'s, &'s str, (Color, Piece), extra::Err<Rich<'s, char>>> {
    choice((
        just('P').to((Color::White, Piece::Pawn)),
        just('N').to((Color::White, Piece::Knight)),
        just('B').to((Color::White, Piece::Bishop)),
        just('R').to((Color::White, Piece::Rook)),
        just('Q').to((Color::White, Piece::Queen)),
        just('K').to((Color::White, Piece::King)),
        just('p').to((Color::Black, Piece::Pawn)),
        just('n').to((Color::Black, Piece::Knight)),
        just('b').to((Color::Black, Piece::Bishop)),
        just('r').to((Color::Black, Piece::Rook)),
        just('q').to((Color::Black, Piece::Queen)),
        just('k').to((Color::Black, Piece::King)),
    ))
    .labelled("piece letter")
}

/// One rank of the placement field: a run of pieces and digit gaps.
fn rank_field<'s>() -> impl Parser<'s, &'s str, Vec<RankToken>, extra::Err<Rich<'s, char>>> {
    choice((
        piece_letter().map(|(color, piece)| RankToken::Piece(color, piece)),
        one_of("12345678").map(|c: char| RankToken::Gap(c.to_digit(10).unwrap() as u8)),
    ))
    .repeated()
    .collect::<Vec<_>>()
    .labelled("rank")
}

/// Parse a full `placement active castling ep halfmove fullmove` FEN
/// string. Lenient on the trailing fields — they may be omitted,
/// defaulting halfmove to 0 and fullmove to 1, the way most
/// PGN-adjacent tools accept "shortened" FEN in comments.
pub fn parse(s: &str) -> CoreResult<Board> {
    let mut fields = s.split_whitespace();
    let placement = fields.next().ok_or_else(|| {
        invalid_fen("empty FEN string", ErrorContext::new())
    })?;
    let active = fields.next().unwrap_or("w");
    let castling = fields.next().unwrap_or("-");
    let ep = fields.next().unwrap_or("-");
    let halfmove = fields.next().unwrap_or("0");
    let fullmove = fields.next().unwrap_or("1");

    let mut board = Board::empty();
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid_fen(
            format!("placement field has {} ranks, expected 8", ranks.len()),
            ErrorContext::new(),
        ));
    }
    for (row, rank_str) in ranks.iter().enumerate() {
        let rank = Rank::new((7 - row) as u8);
        let tokens = rank_field()
            .parse(rank_str)
            .into_result()
            .map_err(|errs| {
                let msg = errs.first().map(|e| e.to_string()).unwrap_or_default();
                invalid_fen(format!("rank '{rank_str}' is malformed: {msg}"), ErrorContext::new())
            })?;
        let mut file_ix = 0usize;
        for token in tokens {
            match token {
                RankToken::Gap(n) => file_ix += n as usize,
                RankToken::Piece(color, piece) => {
                    if file_ix >= 8 {
                        return Err(invalid_fen(format!("rank '{rank_str}' overflows the board"), ErrorContext::new()));
                    }
                    board.set(File::new(file_ix as u8), rank, Some(ColoredPiece::new(color, piece)));
                    file_ix += 1;
                }
            }
        }
        if file_ix != 8 {
            return Err(invalid_fen(format!("rank '{rank_str}' does not sum to 8 files"), ErrorContext::new()));
        }
    }
    sync_king_squares(&mut board);

    board.set_side_to_move(match active {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(invalid_fen(format!("'{other}' is not 'w' or 'b'"), ErrorContext::new())),
    });

    if castling != "-" {
        for c in castling.chars() {
            match c {
                'K' => board.set_castling_right(Color::White, KINGSIDE, Some(File::new(7))),
                'Q' => board.set_castling_right(Color::White, QUEENSIDE, Some(File::new(0))),
                'k' => board.set_castling_right(Color::Black, KINGSIDE, Some(File::new(7))),
                'q' => board.set_castling_right(Color::Black, QUEENSIDE, Some(File::new(0))),
                other => {
                    return Err(invalid_fen(format!("'{other}' is not a valid castling letter"), ErrorContext::new()))
                }
            }
        }
    }

    if ep != "-" {
        let square = Square::from_str(ep).ok_or_else(|| {
            invalid_fen(format!("'{ep}' is not a valid en-passant square"), ErrorContext::new())
        })?;
        board.set_en_passant_square(Some(square));
    }

    let halfmove: u32 = halfmove
        .parse()
        .map_err(|_| invalid_fen(format!("'{halfmove}' is not a valid halfmove clock"), ErrorContext::new()))?;
    board.set_halfmove_clock(halfmove);

    let fullmove: u32 = fullmove
        .parse()
        .map_err(|_| invalid_fen(format!("'{fullmove}' is not a valid fullmove number"), ErrorContext::new()))?;
    if fullmove == 0 {
        return Err(invalid_fen("fullmove number must be at least 1", ErrorContext::new()));
    }
    board.set_fullmove_number(fullmove);

    Ok(board)
}

fn find_king(board: &Board, color: Color) -> Option<Square> {
    for rank in Rank::ALL {
        for file in File::ALL {
            if let Cell::Occupied(cp) = board.get(file, rank) {
                if cp.color() == color && cp.piece() == Piece::King {
                    return Some(Square::new(file, rank));
                }
            }
        }
    }
    None
}

fn sync_king_squares(board: &mut Board) {
    for color in [Color::White, Color::Black] {
        if let Some(sq) = find_king(board, color) {
            board.force_king_square(color, sq);
        }
    }
}

/// Render a board as standard FEN.
///
/// `permissive_ep_fen` controls whether the en-passant field is
/// emitted unconditionally: when `false` (the default), the field is
/// only populated when an enemy pawn could legally capture there right
/// now; when `true`, any double
/// push populates it regardless of capturability, matching the looser
/// behaviour some PGN tools expect.
pub fn encode(board: &Board, permissive_ep_fen: bool) -> String {
    let mut placement = String::new();
    for row in 0..8 {
        let rank = Rank::new((7 - row) as u8);
        let mut gap = 0u32;
        for file in File::ALL {
            match board.get(file, rank) {
                Cell::Occupied(cp) => {
                    if gap > 0 {
                        placement.push_str(&gap.to_string());
                        gap = 0;
                    }
                    placement.push(piece_fen_letter(cp));
                }
                _ => gap += 1,
            }
        }
        if gap > 0 {
            placement.push_str(&gap.to_string());
        }
        if row != 7 {
            placement.push('/');
        }
    }

    let active = if board.side_to_move().is_white() { "w" } else { "b" };

    let mut castling = String::new();
    if board.castling_right(Color::White, KINGSIDE).is_some() {
        castling.push('K');
    }
    if board.castling_right(Color::White, QUEENSIDE).is_some() {
        castling.push('Q');
    }
    if board.castling_right(Color::Black, KINGSIDE).is_some() {
        castling.push('k');
    }
    if board.castling_right(Color::Black, QUEENSIDE).is_some() {
        castling.push('q');
    }
    if castling.is_empty() {
        castling.push('-');
    }

    let ep = match board.en_passant_square() {
        Some(sq) if permissive_ep_fen || board.en_passant_is_capturable() => sq.to_string(),
        _ => "-".to_string(),
    };

    format!(
        "{placement} {active} {castling} {ep} {} {}",
        board.halfmove_clock(),
        board.fullmove_number()
    )
}

fn piece_fen_letter(cp: ColoredPiece) -> char {
    let upper = match cp.piece() {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    };
    if cp.color().is_white() {
        upper
    } else {
        upper.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_position_round_trips() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let board = parse(fen).expect("valid FEN");
        assert_eq!(board.to_fen(false), fen);
    }

    #[test]
    fn en_passant_only_emitted_when_capturable() {
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3";
        let board = parse(fen).expect("valid FEN");
        assert_eq!(board.to_fen(false), fen);
    }

    #[test]
    fn rejects_wrong_rank_count() {
        assert!(parse("8/8/8 w - - 0 1").is_err());
    }
}
