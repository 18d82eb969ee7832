//! The move submitter.
//!
//! Validates a candidate line from the device against a snapshot of the
//! live game and submits it to the server at most once. All outcomes are
//! values; nothing here mutates the session — the server's echo of the
//! move comes back through the watcher.

use std::sync::Arc;

use board_client::{ApiError, BoardApi};
use chess::{normalize_castling, parse_uci};

use crate::live::SharedGame;

/// Result of one submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Move accepted by the server.
    Sent,
    /// Input is not in move notation; surface it as a diagnostic line.
    NotAMove,
    /// No game is being watched right now.
    NoActiveGame,
    /// We never figured out which seat is ours.
    SideUnresolved,
    /// It is the opponent's turn.
    NotMyTurn,
    /// The rules oracle rejected the move locally; never sent.
    Illegal,
    /// The server call failed.
    Failed(ApiError),
}

impl std::fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::NotAMove => write!(f, "not a move"),
            Self::NoActiveGame => write!(f, "no active game"),
            Self::SideUnresolved => write!(f, "our side is unresolved"),
            Self::NotMyTurn => write!(f, "not your turn"),
            Self::Illegal => write!(f, "illegal move"),
            Self::Failed(e) => write!(f, "submission failed: {e}"),
        }
    }
}

pub struct Submitter<A> {
    api: Arc<A>,
    shared: SharedGame,
}

impl<A: BoardApi> Submitter<A> {
    pub fn new(api: Arc<A>, shared: SharedGame) -> Self {
        Self { api, shared }
    }

    /// Validate and submit one candidate move.
    ///
    /// Exactly one network attempt per call, and only after every local
    /// gate passed. Validation runs against a snapshot taken up front; a
    /// retry is a fresh call re-validated from scratch, because the game
    /// may have advanced in between.
    pub async fn submit(&self, candidate: &str) -> SubmitOutcome {
        let Some(mv) = parse_uci(candidate) else {
            return SubmitOutcome::NotAMove;
        };

        let Some(snapshot) = self.shared.snapshot() else {
            return SubmitOutcome::NoActiveGame;
        };
        let Some(my_side) = snapshot.my_side else {
            return SubmitOutcome::SideUnresolved;
        };
        if snapshot.game.side_to_move() != my_side {
            return SubmitOutcome::NotMyTurn;
        }

        let legal = snapshot.game.legal_moves();
        if !legal.contains(&normalize_castling(mv, &legal)) {
            return SubmitOutcome::Illegal;
        }

        // The server expects plain UCI, so send the candidate as typed,
        // not the normalized internal form.
        match self.api.make_move(&snapshot.id, candidate).await {
            Ok(()) => SubmitOutcome::Sent,
            Err(e) => SubmitOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::GameSession;
    use board_client::mock::MockBoardApi;
    use chess::{Game, PlayerSide};

    fn setup(session: Option<GameSession>) -> (Submitter<MockBoardApi>, Arc<MockBoardApi>) {
        let api = Arc::new(MockBoardApi::new());
        let shared = SharedGame::new();
        if let Some(s) = session {
            shared.publish(s);
        }
        (Submitter::new(api.clone(), shared), api)
    }

    fn session(my_side: Option<PlayerSide>) -> GameSession {
        GameSession {
            id: "g1".to_string(),
            game: Game::new(),
            my_side,
            last_move: None,
        }
    }

    #[tokio::test]
    async fn test_non_move_lines_pass_through() {
        let (submitter, api) = setup(Some(session(Some(PlayerSide::White))));
        for line in ["hello", "e2", "e2e4x", "E2E4"] {
            assert!(matches!(
                submitter.submit(line).await,
                SubmitOutcome::NotAMove
            ));
        }
        assert!(api.submitted_moves().is_empty());
    }

    #[tokio::test]
    async fn test_no_active_game_never_touches_network() {
        let (submitter, api) = setup(None);
        assert!(matches!(
            submitter.submit("e2e4").await,
            SubmitOutcome::NoActiveGame
        ));
        assert!(api.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_not_my_turn() {
        let (submitter, api) = setup(Some(session(Some(PlayerSide::Black))));
        assert!(matches!(
            submitter.submit("e7e5").await,
            SubmitOutcome::NotMyTurn
        ));
        assert!(api.submitted_moves().is_empty());
    }

    #[tokio::test]
    async fn test_side_unresolved() {
        let (submitter, api) = setup(Some(session(None)));
        assert!(matches!(
            submitter.submit("e2e4").await,
            SubmitOutcome::SideUnresolved
        ));
        assert!(api.submitted_moves().is_empty());
    }

    #[tokio::test]
    async fn test_illegal_move_stays_local() {
        let (submitter, api) = setup(Some(session(Some(PlayerSide::White))));
        assert!(matches!(
            submitter.submit("e2e5").await,
            SubmitOutcome::Illegal
        ));
        // Parses fine, but queening on a non-promoting move is illegal.
        assert!(matches!(
            submitter.submit("e2e4q").await,
            SubmitOutcome::Illegal
        ));
        assert!(api.submitted_moves().is_empty());
    }

    #[tokio::test]
    async fn test_legal_move_submitted_exactly_once() {
        let (submitter, api) = setup(Some(session(Some(PlayerSide::White))));
        assert!(matches!(submitter.submit("e2e4").await, SubmitOutcome::Sent));
        assert_eq!(
            api.submitted_moves(),
            vec![("g1".to_string(), "e2e4".to_string())]
        );
    }

    #[tokio::test]
    async fn test_castling_submitted_in_uci_notation() {
        let mut game = Game::new();
        for uci in ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"] {
            let mv = normalize_castling(parse_uci(uci).unwrap(), &game.legal_moves());
            game.make_move(mv).unwrap();
        }
        let s = GameSession {
            id: "g1".to_string(),
            game,
            my_side: Some(PlayerSide::White),
            last_move: None,
        };
        let (submitter, api) = setup(Some(s));

        assert!(matches!(submitter.submit("e1g1").await, SubmitOutcome::Sent));
        // The wire keeps standard UCI, not the internal king-takes-rook form.
        assert_eq!(
            api.submitted_moves(),
            vec![("g1".to_string(), "e1g1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_server_rejection_reported_once() {
        let api = Arc::new(MockBoardApi::new().with_move_result(Err(ApiError::Rejected {
            status: 400,
            message: "Not your turn".to_string(),
        })));
        let shared = SharedGame::new();
        shared.publish(session(Some(PlayerSide::White)));
        let submitter = Submitter::new(api.clone(), shared);

        assert!(matches!(
            submitter.submit("e2e4").await,
            SubmitOutcome::Failed(_)
        ));
        // One attempt, no retry.
        assert_eq!(api.submitted_moves().len(), 1);
    }
}
