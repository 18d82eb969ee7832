pub mod board_display;
pub mod converters;
pub mod game;
pub mod types;
pub mod uci;

pub use board_display::{DisplayBoard, DisplayBoardError};
pub use converters::{format_piece, format_square};
pub use game::{Game, GameError, HistoryEntry};
pub use types::{PieceKind, PlayerSide};
pub use uci::{format_uci_move, normalize_castling, parse_uci};
