use cozy_chess::{Board, Move, Piece};

use crate::types::PlayerSide;

/// Game state wrapper around a cozy-chess Board.
///
/// This is the rules oracle for the bridge: legality, capture detection and
/// move application all go through here. The position is replayed only
/// forward; history is append-only.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
}

/// One applied move, recorded as the engine folds the remote history.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub mv: Move,
    /// Whether the move captured a piece (en passant included).
    pub capture: bool,
}

impl Game {
    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
        }
    }

    /// Get the current board position.
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the applied-move history.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Number of moves folded into the position so far.
    pub fn moves_applied(&self) -> usize {
        self.history.len()
    }

    /// Make a move on the board.
    ///
    /// The move must already be in cozy-chess notation (castling as
    /// king-takes-rook, see [`crate::uci::normalize_castling`]).
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if !self.legal_moves().contains(&mv) {
            return Err(GameError::IllegalMove);
        }

        // Capture info needs the pre-move position.
        let capture = self.is_capture(mv);

        // cozy_chess boards are cheap to mutate in place; legality was
        // checked above so play_unchecked is fine.
        let mut new_position = self.position.clone();
        new_position.play_unchecked(mv);
        self.position = new_position;

        let entry = HistoryEntry { mv, capture };
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Get all legal moves for the current position.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    /// Whether `mv` would capture a piece in the current position.
    ///
    /// En passant counts (pawn changing file onto an empty square).
    /// Castling does not: in cozy-chess notation the king "takes" its own
    /// rook, which is not a capture.
    pub fn is_capture(&self, mv: Move) -> bool {
        let stm = self.position.side_to_move();
        if let Some(color) = self.position.color_on(mv.to) {
            return color != stm;
        }
        self.position.piece_on(mv.from) == Some(Piece::Pawn) && mv.from.file() != mv.to.file()
    }

    /// Get the side to move.
    pub fn side_to_move(&self) -> PlayerSide {
        PlayerSide::from(self.position.side_to_move())
    }

    /// Whether the side to move is currently in check.
    pub fn in_check(&self) -> bool {
        !self.position.checkers().is_empty()
    }

    /// The last applied move, if any.
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|e| e.mv)
    }

    /// Export position to a FEN string.
    pub fn to_fen(&self) -> String {
        self.position.to_string()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move")]
    IllegalMove,
}
