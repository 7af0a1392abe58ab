//! Zobrist hashing — a position identity suitable for repetition
//! detection. Builds its random table the way an earlier `model::hash`
//! module did: a fixed-seed `SmallRng` behind a `static_init::Lazy`,
//! so the table (and therefore
//! every hash value) is identical across runs and across machines —
//! required for repetition counts computed incrementally during replay
//! to agree with ones computed from scratch.

use rand::{Rng, SeedableRng};
use rand::rngs::SmallRng;
use static_init::Lazy;

use crate::model::board::Board;
use crate::model::{Cell, File, Rank};

const SEED: [u8; 32] = *b"pgn_core zobrist table seed.....";

struct Tables {
    /// `[color][piece_ix][square_ix]`
    piece_square: [[[u64; 64]; 6]; 2],
    /// `[color][kingside | queenside]`
    castling: [[u64; 2]; 2],
    en_passant_file: [u64; 8],
    side_to_move: u64,
}

static TABLES: Lazy<Tables> = Lazy::new(|| {
    let mut rng = SmallRng::from_seed(SEED);
    let mut piece_square = [[[0u64; 64]; 6]; 2];
    for color in piece_square.iter_mut() {
        for piece in color.iter_mut() {
            for square in piece.iter_mut() {
                *square = rng.random();
            }
        }
    }
    let mut castling = [[0u64; 2]; 2];
    for color in castling.iter_mut() {
        for side in color.iter_mut() {
            *side = rng.random();
        }
    }
    let mut en_passant_file = [0u64; 8];
    for file in en_passant_file.iter_mut() {
        *file = rng.random();
    }
    Tables { piece_square, castling, en_passant_file, side_to_move: rng.random() }
});

pub fn zobrist(board: &Board) -> u64 {
    let tables = &*TABLES;
    let mut hash = 0u64;
    for rank in Rank::ALL {
        for file in File::ALL {
            if let Cell::Occupied(cp) = board.get(file, rank) {
                let square_ix = rank.ix() * 8 + file.ix();
                hash ^= tables.piece_square[cp.color().ix()][cp.piece().ix()][square_ix];
            }
        }
    }
    for color in [crate::model::Color::White, crate::model::Color::Black] {
        for side in [crate::model::board::KINGSIDE, crate::model::board::QUEENSIDE] {
            if board.castling_right(color, side).is_some() {
                hash ^= tables.castling[color.ix()][side];
            }
        }
    }
    // Only folded in when a pawn could actually recapture there, matching
    // `Board::to_fen`'s conservative default — otherwise two positions the
    // FEN encoder treats as identical would hash differently and silently
    // corrupt repetition counting.
    if board.en_passant_is_capturable() {
        if let Some(ep) = board.en_passant_square() {
            hash ^= tables.en_passant_file[ep.file.ix()];
        }
    }
    if board.side_to_move().is_black() {
        hash ^= tables.side_to_move;
    }
    hash
}
