//! BoardApi trait abstraction for client implementations

use crate::error::ApiResult;
use crate::events::{Account, GameEvent, IncomingEvent, OngoingGame};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Top-level account event stream ("game started" notifications).
pub type EventStream = BoxStream<'static, ApiResult<IncomingEvent>>;

/// Per-game event stream (`gameFull`, then `gameState` updates).
pub type GameStream = BoxStream<'static, ApiResult<GameEvent>>;

/// Remote Board API surface the bridge is written against.
/// Implemented by the real [`crate::HttpBoardApi`] and the test mock.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// The authenticated account (used for seat resolution).
    async fn account(&self) -> ApiResult<Account>;

    /// Games already in progress for this account.
    async fn ongoing_games(&self) -> ApiResult<Vec<OngoingGame>>;

    /// Open the top-level incoming event stream.
    async fn stream_events(&self) -> ApiResult<EventStream>;

    /// Open the event stream for one game.
    async fn stream_game(&self, game_id: &str) -> ApiResult<GameStream>;

    /// Submit a move. Exactly one attempt; the server does not guarantee
    /// idempotency, so callers must not retry blindly.
    async fn make_move(&self, game_id: &str, uci: &str) -> ApiResult<()>;
}
