//! Typed wire model for the Board API.
//!
//! The server speaks ndjson: one JSON object per line, tagged by `type`.
//! The per-game stream opens with a `gameFull` (seat assignments plus the
//! cumulative move history) followed by `gameState` updates that always
//! carry the *complete* move history observed so far, never deltas.

use serde::Deserialize;

/// The authenticated account, used to resolve which seat is ours.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
}

/// An in-progress game reported by the server at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OngoingGame {
    pub game_id: String,
}

/// Top-level account events ("game started" notifications and friends).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingEvent {
    GameStart { game: GameRef },
    GameFinish { game: GameRef },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameRef {
    pub id: String,
}

/// A seat assignment in a `gameFull` event. Anonymous seats have no id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seat {
    pub id: Option<String>,
}

/// Per-game stream events.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    GameFull {
        white: Seat,
        black: Seat,
        state: GameStateBody,
    },
    GameState(GameStateBody),
    #[serde(other)]
    Other,
}

/// The cumulative game state carried by `gameFull` and every `gameState`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameStateBody {
    /// Space-separated UCI move history from the start of the game.
    #[serde(default)]
    pub moves: String,
    #[serde(default)]
    pub status: Option<String>,
    /// "white" or "black" when the game ended decisively.
    #[serde(default)]
    pub winner: Option<String>,
}

impl GameStateBody {
    /// Split the cumulative move string into individual UCI tokens.
    pub fn move_list(&self) -> Vec<&str> {
        self.moves.split_whitespace().collect()
    }

    /// Whether this state carries a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_deref(),
            Some("mate" | "resign" | "outoftime" | "stalemate" | "draw" | "aborted")
        )
    }
}
