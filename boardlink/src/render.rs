//! Terminal view of the watched game.
//!
//! Pure presentation: the watcher calls [`draw`] after every published
//! state change. Orientation follows our seat, the last move is shown in
//! inverse video, and the header carries turn and check info.

use chess::{DisplayBoard, Game, PieceKind, PlayerSide};
use cozy_chess::Move;

const INVERSE: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";
const CLEAR: &str = "\x1b[2J\x1b[H";
const FILES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

pub fn draw(game: &Game, my_side: Option<PlayerSide>) {
    print!("{CLEAR}{}", render_to_string(game, my_side));
}

pub fn render_to_string(game: &Game, my_side: Option<PlayerSide>) -> String {
    let board = match DisplayBoard::from_fen(&game.to_fen()) {
        Ok(b) => b,
        // The FEN comes from our own position; a parse failure here is a
        // bug, but rendering must never take the bridge down.
        Err(_) => return String::new(),
    };

    let orient_white = my_side != Some(PlayerSide::Black);
    let last = game.last_move().map(|mv| (square_index(mv, true), square_index(mv, false)));

    let mut out = String::new();
    out.push_str("boardlink — terminal view\n");
    out.push_str("-------------------------\n");

    let turn = game.side_to_move();
    let you = if my_side == Some(turn) { "  (YOU)" } else { "" };
    out.push_str(&format!("Turn: {turn}{you}\n"));
    if game.in_check() {
        let who = if my_side == Some(turn) { "YOU" } else { "OPPONENT" };
        out.push_str(&format!("CHECK! ({who})\n"));
    }
    out.push('\n');

    let ranks: Vec<u8> = if orient_white {
        (0..8).rev().collect()
    } else {
        (0..8).collect()
    };
    let files: Vec<u8> = if orient_white {
        (0..8).collect()
    } else {
        (0..8).rev().collect()
    };

    for rank in &ranks {
        out.push_str(&format!("{} ", rank + 1));
        for file in &files {
            let glyph = board
                .piece_at(*file, *rank)
                .map(|(kind, side)| piece_glyph(kind, side))
                .unwrap_or('·');
            let cell = format!(" {glyph} ");
            let here = (*file, *rank);
            if last.map_or(false, |(from, to)| here == from || here == to) {
                out.push_str(&format!("{INVERSE}{cell}{RESET}"));
            } else {
                out.push_str(&cell);
            }
        }
        out.push('\n');
    }

    out.push_str("  ");
    for file in &files {
        out.push_str(&format!(" {} ", FILES[*file as usize]));
    }
    out.push('\n');
    out
}

fn square_index(mv: Move, from: bool) -> (u8, u8) {
    let sq = if from { mv.from } else { mv.to };
    (sq.file() as u8, sq.rank() as u8)
}

fn piece_glyph(kind: PieceKind, side: PlayerSide) -> char {
    match (side, kind) {
        (PlayerSide::White, PieceKind::Pawn) => '♙',
        (PlayerSide::White, PieceKind::Knight) => '♘',
        (PlayerSide::White, PieceKind::Bishop) => '♗',
        (PlayerSide::White, PieceKind::Rook) => '♖',
        (PlayerSide::White, PieceKind::Queen) => '♕',
        (PlayerSide::White, PieceKind::King) => '♔',
        (PlayerSide::Black, PieceKind::Pawn) => '♟',
        (PlayerSide::Black, PieceKind::Knight) => '♞',
        (PlayerSide::Black, PieceKind::Bishop) => '♝',
        (PlayerSide::Black, PieceKind::Rook) => '♜',
        (PlayerSide::Black, PieceKind::Queen) => '♛',
        (PlayerSide::Black, PieceKind::King) => '♚',
    }
}
