//! Mock BoardApi implementation for testing
//!
//! Scripts the account, the ongoing-game list and the event streams, and
//! records every call so tests can assert on exactly what was sent.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::{ApiError, ApiResult};
use crate::events::{Account, GameEvent, IncomingEvent, OngoingGame};
use crate::traits::{BoardApi, EventStream, GameStream};

#[derive(Default)]
struct MockScript {
    account: Option<Account>,
    ongoing: Vec<OngoingGame>,
    incoming: VecDeque<Vec<ApiResult<IncomingEvent>>>,
    game_streams: HashMap<String, VecDeque<Vec<ApiResult<GameEvent>>>>,
    move_results: VecDeque<ApiResult<()>>,
}

/// Recorded calls for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Account,
    OngoingGames,
    StreamEvents,
    StreamGame { game_id: String },
    MakeMove { game_id: String, uci: String },
}

#[derive(Default)]
pub struct MockBoardApi {
    script: Arc<Mutex<MockScript>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockBoardApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the authenticated account.
    pub fn with_account(self, id: &str) -> Self {
        self.script.lock().unwrap().account = Some(Account {
            id: id.to_string(),
            username: id.to_string(),
        });
        self
    }

    /// Add an already-in-progress game to the ongoing list.
    pub fn with_ongoing(self, game_id: &str) -> Self {
        self.script.lock().unwrap().ongoing.push(OngoingGame {
            game_id: game_id.to_string(),
        });
        self
    }

    /// Script one incoming-event stream. Each call to `stream_events`
    /// consumes one scripted stream; further calls fail.
    pub fn with_incoming(self, events: Vec<ApiResult<IncomingEvent>>) -> Self {
        self.script.lock().unwrap().incoming.push_back(events);
        self
    }

    /// Script one per-game stream for `game_id`. Streams are consumed in
    /// the order they were scripted.
    pub fn with_game_stream(self, game_id: &str, events: Vec<ApiResult<GameEvent>>) -> Self {
        self.script
            .lock()
            .unwrap()
            .game_streams
            .entry(game_id.to_string())
            .or_default()
            .push_back(events);
        self
    }

    /// Queue a result for the next `make_move` call (defaults to Ok).
    pub fn with_move_result(self, result: ApiResult<()>) -> Self {
        self.script.lock().unwrap().move_results.push_back(result);
        self
    }

    /// Get recorded calls for verification.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// The moves submitted so far, as (game_id, uci) pairs.
    pub fn submitted_moves(&self) -> Vec<(String, String)> {
        self.get_calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::MakeMove { game_id, uci } => Some((game_id, uci)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) {
        self.call_log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BoardApi for MockBoardApi {
    async fn account(&self) -> ApiResult<Account> {
        self.record(MockCall::Account);
        self.script
            .lock()
            .unwrap()
            .account
            .clone()
            .ok_or_else(|| ApiError::NotConfigured("account".to_string()))
    }

    async fn ongoing_games(&self) -> ApiResult<Vec<OngoingGame>> {
        self.record(MockCall::OngoingGames);
        Ok(self.script.lock().unwrap().ongoing.clone())
    }

    async fn stream_events(&self) -> ApiResult<EventStream> {
        self.record(MockCall::StreamEvents);
        let events = self
            .script
            .lock()
            .unwrap()
            .incoming
            .pop_front()
            .ok_or_else(|| ApiError::NotConfigured("stream_events".to_string()))?;
        Ok(futures::stream::iter(events).boxed())
    }

    async fn stream_game(&self, game_id: &str) -> ApiResult<GameStream> {
        self.record(MockCall::StreamGame {
            game_id: game_id.to_string(),
        });
        let events = self
            .script
            .lock()
            .unwrap()
            .game_streams
            .get_mut(game_id)
            .and_then(|q| q.pop_front())
            .ok_or_else(|| ApiError::NotConfigured(format!("stream_game {game_id}")))?;
        Ok(futures::stream::iter(events).boxed())
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> ApiResult<()> {
        self.record(MockCall::MakeMove {
            game_id: game_id.to_string(),
            uci: uci.to_string(),
        });
        self.script
            .lock()
            .unwrap()
            .move_results
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
