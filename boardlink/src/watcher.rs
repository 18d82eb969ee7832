//! The synchronization engine.
//!
//! One long-lived task that folds the remote event streams into the shared
//! game session and drives the device signals. At most one game is watched
//! at a time; the watcher is the only writer of [`SharedGame`].
//!
//! Move application is keyed by the number of moves already folded: every
//! event carries the cumulative history, so only the suffix past
//! `moves_applied` is applied. Replaying an event we have already seen is a
//! no-op, which makes the fold idempotent against duplicate or overlapping
//! events.

use std::sync::Arc;

use board_client::{BoardApi, GameEvent, GameStateBody, IncomingEvent, Seat};
use chess::{normalize_castling, parse_uci, Game, PlayerSide};
use futures::StreamExt;
use tracing::Instrument;

use crate::live::{GameSession, SharedGame};
use crate::render;
use crate::signals::{SignalCommand, SignalSink};

/// Why watching a game stopped early. Neither case is process-fatal: the
/// watcher clears the session and waits for the next game.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("event stream ended or failed while watching: {0}")]
    StreamDisrupted(String),
    #[error("remote history contained a move the rules oracle rejected: {0}")]
    BadRemoteData(String),
}

pub struct Watcher<A, S> {
    api: Arc<A>,
    shared: SharedGame,
    sink: S,
    /// true: signal check for either side; false: only when it is our turn
    /// and we are in check.
    any_check: bool,
    render: bool,
}

impl<A, S> Watcher<A, S>
where
    A: BoardApi,
    S: SignalSink,
{
    pub fn new(api: Arc<A>, shared: SharedGame, sink: S, any_check: bool) -> Self {
        Self {
            api,
            shared,
            sink,
            any_check,
            render: false,
        }
    }

    /// Draw the terminal board after every state change.
    pub fn with_render(mut self) -> Self {
        self.render = true;
        self
    }

    /// Main loop: resume any game already in progress, then watch each
    /// incoming game notification in turn.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let account = self.api.account().await?;
        let my_id = account.id.to_lowercase();
        tracing::info!(username = %account.username, "logged in");

        match self.api.ongoing_games().await {
            Ok(games) => {
                if let Some(game) = games.first() {
                    let game_id = game.game_id.clone();
                    self.watch_game(&my_id, &game_id).await;
                }
            }
            Err(e) => tracing::warn!("ongoing games query failed: {e}"),
        }

        let mut events = self.api.stream_events().await?;
        while let Some(ev) = events.next().await {
            match ev {
                Ok(IncomingEvent::GameStart { game }) => {
                    self.watch_game(&my_id, &game.id).await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("incoming event stream failed: {e}");
                    break;
                }
            }
        }

        tracing::info!("incoming event stream ended");
        Ok(())
    }

    /// Watch one game to completion. Always clears the published session on
    /// the way out, whatever happened.
    async fn watch_game(&mut self, my_id: &str, game_id: &str) {
        let result = self
            .watch_game_inner(my_id, game_id)
            .instrument(tracing::info_span!("game", id = %game_id))
            .await;
        self.shared.clear();
        if let Err(e) = result {
            tracing::warn!(game_id, "stopped watching: {e}");
        }
    }

    async fn watch_game_inner(&mut self, my_id: &str, game_id: &str) -> Result<(), WatchError> {
        let mut stream = self
            .api
            .stream_game(game_id)
            .await
            .map_err(|e| WatchError::StreamDisrupted(e.to_string()))?;

        tracing::info!("watching game");

        let mut game = Game::new();
        let mut my_side: Option<PlayerSide> = None;
        // Last emitted check value; emissions are edge-triggered on this.
        let mut last_check: Option<bool> = None;

        while let Some(ev) = stream.next().await {
            let ev = ev.map_err(|e| WatchError::StreamDisrupted(e.to_string()))?;
            match ev {
                GameEvent::GameFull {
                    white,
                    black,
                    state,
                } => {
                    my_side = resolve_side(my_id, &white, &black);
                    match my_side {
                        Some(side) => tracing::info!(side = %side, "seat resolved"),
                        None => {
                            tracing::warn!("neither seat matches our account id; side unresolved")
                        }
                    }

                    // Catch-up replay: these moves already happened, so no
                    // capture signals for them.
                    self.apply_suffix(&mut game, &state, false).await?;
                    self.publish(game_id, &game, my_side);
                    self.update_check(&game, my_side, &mut last_check).await;

                    if state.is_terminal() {
                        self.finish(my_side, &state).await;
                        return Ok(());
                    }
                }
                GameEvent::GameState(state) => {
                    if state.move_list().len() > game.moves_applied() {
                        self.apply_suffix(&mut game, &state, true).await?;
                        self.publish(game_id, &game, my_side);
                        self.update_check(&game, my_side, &mut last_check).await;
                    }

                    if state.is_terminal() {
                        self.finish(my_side, &state).await;
                        return Ok(());
                    }
                }
                GameEvent::Other => {}
            }
        }

        Err(WatchError::StreamDisrupted(
            "game stream ended without a terminal status".to_string(),
        ))
    }

    /// Apply the not-yet-seen tail of the cumulative move list.
    /// Capture signals go out *before* the capturing move is applied, since
    /// capture detection needs the pre-move position.
    async fn apply_suffix(
        &mut self,
        game: &mut Game,
        state: &GameStateBody,
        signal_captures: bool,
    ) -> Result<(), WatchError> {
        let moves = state.move_list();
        if moves.len() <= game.moves_applied() {
            return Ok(());
        }

        for uci in &moves[game.moves_applied()..] {
            let mv =
                parse_uci(uci).ok_or_else(|| WatchError::BadRemoteData((*uci).to_string()))?;
            let mv = normalize_castling(mv, &game.legal_moves());
            if signal_captures && game.is_capture(mv) {
                self.sink.emit(SignalCommand::Capture).await;
            }
            game.make_move(mv)
                .map_err(|_| WatchError::BadRemoteData((*uci).to_string()))?;
        }

        Ok(())
    }

    /// Publish a fresh session snapshot. Lock is held only for the copy.
    fn publish(&self, game_id: &str, game: &Game, my_side: Option<PlayerSide>) {
        self.shared.publish(GameSession {
            id: game_id.to_string(),
            game: game.clone(),
            my_side,
            last_move: game.last_move(),
        });
        if self.render {
            render::draw(game, my_side);
        }
    }

    /// Recompute the check signal and emit only on a change of value.
    async fn update_check(
        &mut self,
        game: &Game,
        my_side: Option<PlayerSide>,
        last_check: &mut Option<bool>,
    ) {
        let in_check = game.in_check();
        let target = if self.any_check {
            in_check
        } else {
            in_check && my_side == Some(game.side_to_move())
        };

        if Some(target) != *last_check {
            let cmd = if target {
                SignalCommand::CheckOn
            } else {
                SignalCommand::CheckOff
            };
            self.sink.emit(cmd).await;
            *last_check = Some(target);
        }
    }

    /// Handle a terminal status: win/lose signal when a winner is reported
    /// and our seat is resolved, nothing for draws and aborts.
    async fn finish(&mut self, my_side: Option<PlayerSide>, state: &GameStateBody) {
        let status = state.status.as_deref().unwrap_or("unknown");
        let winner = state
            .winner
            .as_deref()
            .and_then(PlayerSide::from_str_loose);

        match (winner, my_side) {
            (Some(winner), Some(side)) => {
                let won = winner == side;
                self.sink
                    .emit(if won {
                        SignalCommand::Win
                    } else {
                        SignalCommand::Lose
                    })
                    .await;
                tracing::info!(status, winner = %winner, "game over: {}", if won { "you win" } else { "you lose" });
            }
            (Some(winner), None) => {
                tracing::info!(status, winner = %winner, "game over (side unresolved, no signal)");
            }
            (None, _) => tracing::info!(status, "game over"),
        }
    }
}

/// Match our account id against the reported seat ids, case-insensitively.
/// No match means the side stays unresolved rather than guessing.
fn resolve_side(my_id: &str, white: &Seat, black: &Seat) -> Option<PlayerSide> {
    let is_me = |seat: &Seat| {
        seat.id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(my_id))
    };
    if is_me(white) {
        Some(PlayerSide::White)
    } else if is_me(black) {
        Some(PlayerSide::Black)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_client::mock::{MockBoardApi, MockCall};
    use board_client::ApiResult;
    use crate::signals::RecordingSink;
    use SignalCommand::{Capture, CheckOff, CheckOn, Lose, Win};

    fn seat(id: &str) -> Seat {
        Seat {
            id: Some(id.to_string()),
        }
    }

    fn body(moves: &str, status: Option<&str>, winner: Option<&str>) -> GameStateBody {
        GameStateBody {
            moves: moves.to_string(),
            status: status.map(str::to_string),
            winner: winner.map(str::to_string),
        }
    }

    fn full(white: &str, black: &str, moves: &str) -> ApiResult<GameEvent> {
        Ok(GameEvent::GameFull {
            white: seat(white),
            black: seat(black),
            state: body(moves, Some("started"), None),
        })
    }

    fn update(moves: &str) -> ApiResult<GameEvent> {
        Ok(GameEvent::GameState(body(moves, Some("started"), None)))
    }

    fn terminal(moves: &str, status: &str, winner: Option<&str>) -> ApiResult<GameEvent> {
        Ok(GameEvent::GameState(body(moves, Some(status), winner)))
    }

    fn watcher(
        api: MockBoardApi,
        any_check: bool,
    ) -> (Watcher<MockBoardApi, RecordingSink>, SharedGame) {
        let shared = SharedGame::new();
        let w = Watcher::new(
            Arc::new(api),
            shared.clone(),
            RecordingSink::default(),
            any_check,
        );
        (w, shared)
    }

    #[tokio::test]
    async fn test_side_resolves_black_and_quiet_move_emits_nothing_extra() {
        // Scenario: we are black; white plays a quiet move. No capture
        // signal, and the check signal does not flip.
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![full("alice", "ME", ""), update("e2e4")],
        );
        let (mut w, shared) = watcher(api, false);

        let err = w.watch_game_inner("me", "g1").await.unwrap_err();
        assert!(matches!(err, WatchError::StreamDisrupted(_)));

        let snap = shared.snapshot().unwrap();
        assert_eq!(snap.my_side, Some(PlayerSide::Black));
        assert_eq!(snap.moves_applied(), 1);
        // One initial CHECK_OFF, then edge-suppressed.
        assert_eq!(w.sink.emitted, vec![CheckOff]);
    }

    #[tokio::test]
    async fn test_suffix_only_application() {
        // History ["e2e4"] then ["e2e4","e7e5"]: exactly e7e5 is applied on
        // the second event. A duplicate event is a no-op.
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![
                full("me", "bob", ""),
                update("e2e4"),
                update("e2e4 e7e5"),
                update("e2e4 e7e5"),
            ],
        );
        let (mut w, shared) = watcher(api, false);

        let _ = w.watch_game_inner("me", "g1").await;

        let snap = shared.snapshot().unwrap();
        assert_eq!(snap.moves_applied(), 2);
        assert_eq!(snap.last_move, parse_uci("e7e5"));
        assert_eq!(w.sink.emitted, vec![CheckOff]);
    }

    #[tokio::test]
    async fn test_initial_replay_catches_up_without_capture_signals() {
        // Reconnecting mid-game: the gameFull history contains a capture,
        // but catch-up replay must not re-signal it.
        let api = MockBoardApi::new()
            .with_game_stream("g1", vec![full("me", "bob", "e2e4 d7d5 e4d5")]);
        let (mut w, shared) = watcher(api, false);

        let _ = w.watch_game_inner("me", "g1").await;

        assert_eq!(shared.snapshot().unwrap().moves_applied(), 3);
        assert_eq!(w.sink.emitted, vec![CheckOff]);
    }

    #[tokio::test]
    async fn test_capture_signal_before_apply() {
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![full("me", "bob", ""), update("e2e4 d7d5 e4d5")],
        );
        let (mut w, _shared) = watcher(api, false);

        let _ = w.watch_game_inner("me", "g1").await;

        assert_eq!(w.sink.emitted, vec![CheckOff, Capture]);
    }

    #[tokio::test]
    async fn test_check_edge_any_check_policy() {
        // 1.e4 f5 2.Qh5 puts black in check; g6 blocks it again.
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![
                full("me", "bob", ""),
                update("e2e4 f7f5 d1h5"),
                update("e2e4 f7f5 d1h5"),
                update("e2e4 f7f5 d1h5 g7g6"),
            ],
        );
        let (mut w, _shared) = watcher(api, true);

        let _ = w.watch_game_inner("me", "g1").await;

        assert_eq!(w.sink.emitted, vec![CheckOff, CheckOn, CheckOff]);
    }

    #[tokio::test]
    async fn test_check_suppressed_under_self_check_policy() {
        // Same line, but we are white and only self-check signals: the
        // opponent being in check must not light the indicator.
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![full("me", "bob", ""), update("e2e4 f7f5 d1h5")],
        );
        let (mut w, _shared) = watcher(api, false);

        let _ = w.watch_game_inner("me", "g1").await;

        assert_eq!(w.sink.emitted, vec![CheckOff]);
    }

    #[tokio::test]
    async fn test_win_emitted_and_session_cleared() {
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![
                full("me", "bob", ""),
                terminal("e2e4 f7f6 d1h5 g7g6 h5g6", "mate", Some("white")),
            ],
        );
        let (mut w, shared) = watcher(api, false);

        w.watch_game("me", "g1").await;

        assert!(w.sink.emitted.contains(&Win));
        assert!(!w.sink.emitted.contains(&Lose));
        assert!(shared.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_lose_emitted_when_winner_is_opponent() {
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![full("me", "bob", ""), terminal("", "resign", Some("black"))],
        );
        let (mut w, _shared) = watcher(api, false);

        w.watch_game("me", "g1").await;

        assert!(w.sink.emitted.contains(&Lose));
    }

    #[tokio::test]
    async fn test_draw_emits_no_win_lose() {
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![full("me", "bob", ""), terminal("", "draw", None)],
        );
        let (mut w, shared) = watcher(api, false);

        w.watch_game("me", "g1").await;

        assert!(!w.sink.emitted.contains(&Win));
        assert!(!w.sink.emitted.contains(&Lose));
        assert!(shared.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_unresolved_side_emits_no_win_lose() {
        // Neither seat id matches: deliberate behavior change from guessing
        // a side — no WIN/LOSE can be derived.
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![
                full("alice", "bob", ""),
                terminal("", "mate", Some("white")),
            ],
        );
        let (mut w, _shared) = watcher(api, false);

        w.watch_game("me", "g1").await;

        assert_eq!(w.sink.emitted, vec![CheckOff]);
    }

    #[tokio::test]
    async fn test_bad_remote_move_aborts_watching() {
        let api = MockBoardApi::new()
            .with_game_stream("g1", vec![full("me", "bob", ""), update("e2e5")]);
        let (mut w, shared) = watcher(api, false);

        w.watch_game("me", "g1").await;

        // Corrupt remote data abandons the game and clears the session;
        // the process stays alive for the next one.
        assert!(shared.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_malformed_remote_move_aborts_watching() {
        let api = MockBoardApi::new()
            .with_game_stream("g1", vec![full("me", "bob", "zzzz")]);
        let (mut w, _shared) = watcher(api, false);

        let err = w.watch_game_inner("me", "g1").await.unwrap_err();
        assert!(matches!(err, WatchError::BadRemoteData(_)));
    }

    #[tokio::test]
    async fn test_run_resumes_ongoing_game_before_event_loop() {
        let api = MockBoardApi::new()
            .with_account("me")
            .with_ongoing("g-old")
            .with_game_stream("g-old", vec![full("me", "bob", ""), terminal("", "aborted", None)])
            .with_incoming(vec![]);
        let (w, _shared) = watcher(api, false);
        let api = w.api.clone();

        w.run().await.unwrap();

        let calls = api.get_calls();
        let stream_game_pos = calls
            .iter()
            .position(|c| matches!(c, MockCall::StreamGame { game_id } if game_id == "g-old"))
            .expect("ongoing game watched");
        let stream_events_pos = calls
            .iter()
            .position(|c| matches!(c, MockCall::StreamEvents))
            .expect("event loop entered");
        assert!(stream_game_pos < stream_events_pos);
    }

    #[tokio::test]
    async fn test_run_watches_each_incoming_game() {
        let api = MockBoardApi::new()
            .with_account("me")
            .with_incoming(vec![Ok(IncomingEvent::GameStart {
                game: board_client::GameRef {
                    id: "g-new".to_string(),
                },
            })])
            .with_game_stream("g-new", vec![full("me", "bob", ""), terminal("", "draw", None)]);
        let (w, _shared) = watcher(api, false);
        let api = w.api.clone();

        w.run().await.unwrap();

        assert!(api
            .get_calls()
            .iter()
            .any(|c| matches!(c, MockCall::StreamGame { game_id } if game_id == "g-new")));
    }

    #[tokio::test]
    async fn test_castling_in_remote_history_applies() {
        let api = MockBoardApi::new().with_game_stream(
            "g1",
            vec![full("me", "bob", "e2e4 e7e5 g1f3 b8c6 f1c4 g8f6 e1g1")],
        );
        let (mut w, shared) = watcher(api, false);

        w.watch_game_inner("me", "g1").await.unwrap_err();
        assert_eq!(shared.snapshot().unwrap().moves_applied(), 7);
    }

    #[test]
    fn test_resolve_side_case_insensitive() {
        assert_eq!(
            resolve_side("me", &seat("ME"), &seat("bob")),
            Some(PlayerSide::White)
        );
        assert_eq!(
            resolve_side("me", &seat("alice"), &seat("Me")),
            Some(PlayerSide::Black)
        );
        assert_eq!(resolve_side("me", &seat("alice"), &seat("bob")), None);
        assert_eq!(resolve_side("me", &Seat::default(), &Seat::default()), None);
    }
}
