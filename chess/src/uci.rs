//! UCI (Universal Chess Interface) move codec.
//!
//! The codec is the filter between the device line channel and the rest of
//! the bridge: a line either parses as a move here or is treated as plain
//! diagnostic text by the caller.

use cozy_chess::{File, Move, Rank, Square};

use crate::converters::{
    file_from_char, format_piece, format_square, promotion_from_char, rank_from_char,
};

/// Parse strict UCI move notation.
///
/// Exactly 4 characters (`file rank file rank`, files `a-h`, ranks `1-8`),
/// optionally followed by exactly one promotion piece from `qrbn`.
/// Case-sensitive; no whitespace handling — callers trim upstream.
/// Returns `None` for anything else.
pub fn parse_uci(s: &str) -> Option<Move> {
    let mut chars = s.chars();
    let from = Square::new(
        file_from_char(chars.next()?)?,
        rank_from_char(chars.next()?)?,
    );
    let to = Square::new(
        file_from_char(chars.next()?)?,
        rank_from_char(chars.next()?)?,
    );
    let promotion = match chars.next() {
        Some(c) => Some(promotion_from_char(c)?),
        None => None,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(Move {
        from,
        to,
        promotion,
    })
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q").
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// Convert UCI castling notation to cozy_chess notation.
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8.
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8.
///
/// Checks whether the move looks like UCI castling and converts it by
/// finding the matching legal move; anything else passes through unchanged.
pub fn normalize_castling(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let target_square = match (mv.from.rank(), mv.to.file()) {
            (Rank::First, File::G) => Square::new(File::H, Rank::First),
            (Rank::First, File::C) => Square::new(File::A, Rank::First),
            (Rank::Eighth, File::G) => Square::new(File::H, Rank::Eighth),
            (Rank::Eighth, File::C) => Square::new(File::A, Rank::Eighth),
            _ => return mv,
        };

        let converted = Move {
            from: mv.from,
            to: target_square,
            promotion: None,
        };

        // Only convert if the king-to-rook form is actually legal here;
        // a plain king move to g/c stays as-is.
        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}
