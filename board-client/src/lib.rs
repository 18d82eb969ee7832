//! Remote Board API client library
//!
//! Typed access to the server's ndjson event streams and move submission
//! endpoint. The [`BoardApi`] trait is the seam the bridge is written
//! against; [`HttpBoardApi`] talks to the real server, and the mock (behind
//! the `mock` feature) scripts streams for tests.

mod error;
mod events;
mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod traits;

pub use error::{ApiError, ApiResult};
pub use events::{Account, GameEvent, GameRef, GameStateBody, IncomingEvent, OngoingGame, Seat};
pub use http::HttpBoardApi;
pub use traits::{BoardApi, EventStream, GameStream};
