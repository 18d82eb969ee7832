//! Shared live-game state between the watcher and the submitter.
//!
//! Single-writer discipline: only the watcher publishes or clears the
//! session; everyone else gets an immutable snapshot clone. The lock is
//! held only for the copy in or out — never across I/O or rules-oracle
//! calls.

use std::sync::{Arc, Mutex};

use chess::{Game, PlayerSide};
use cozy_chess::Move;

/// One watched remote game.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Server-assigned game id.
    pub id: String,
    /// Canonical local fold of the remote move history.
    pub game: Game,
    /// Our seat, or None when neither reported seat matched the account.
    pub my_side: Option<PlayerSide>,
    /// Most recently applied move.
    pub last_move: Option<Move>,
}

impl GameSession {
    /// Moves folded into the position so far.
    pub fn moves_applied(&self) -> usize {
        self.game.moves_applied()
    }

    /// Whether it is our turn in this snapshot.
    pub fn our_turn(&self) -> bool {
        self.my_side == Some(self.game.side_to_move())
    }
}

/// Handle to the at-most-one active session.
#[derive(Clone, Default)]
pub struct SharedGame {
    inner: Arc<Mutex<Option<GameSession>>>,
}

impl SharedGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the current session. Watcher only.
    pub fn publish(&self, session: GameSession) {
        *self.inner.lock().unwrap() = Some(session);
    }

    /// Clear the session when a game ends or the stream drops. Watcher only.
    pub fn clear(&self) {
        *self.inner.lock().unwrap() = None;
    }

    /// Take an immutable snapshot of the active session, if any.
    pub fn snapshot(&self) -> Option<GameSession> {
        self.inner.lock().unwrap().clone()
    }
}
