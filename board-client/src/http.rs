//! HTTP/ndjson implementation of the Board API.

use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::events::{Account, GameEvent, IncomingEvent, OngoingGame};
use crate::traits::{BoardApi, EventStream, GameStream};

/// Network client for the remote board server.
///
/// Streams are ndjson: one JSON object per line, with blank keep-alive
/// lines in between.
pub struct HttpBoardApi {
    http: reqwest::Client,
    base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NowPlaying {
    now_playing: Vec<OngoingGame>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpBoardApi {
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.base, path))
            .bearer_auth(&self.token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let resp = self.get(path).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn open_stream<T>(&self, path: &str) -> ApiResult<BoxedLines<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let resp = self.get(path).send().await?.error_for_status()?;
        Ok(ndjson_stream(resp))
    }
}

type BoxedLines<T> = futures::stream::BoxStream<'static, ApiResult<T>>;

/// Split a byte stream into lines and decode each non-blank line as JSON.
/// Blank lines are keep-alives and are skipped.
fn ndjson_stream<T>(resp: reqwest::Response) -> BoxedLines<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let mut body = resp.bytes_stream();
    let stream = async_stream::stream! {
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(ApiError::from(e));
                    return;
                }
            };
            buf.extend_from_slice(&chunk);
            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line);
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                yield serde_json::from_str::<T>(text).map_err(ApiError::from);
            }
        }
    };
    Box::pin(stream)
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn account(&self) -> ApiResult<Account> {
        self.get_json("/api/account").await
    }

    async fn ongoing_games(&self) -> ApiResult<Vec<OngoingGame>> {
        let playing: NowPlaying = self.get_json("/api/account/playing").await?;
        Ok(playing.now_playing)
    }

    async fn stream_events(&self) -> ApiResult<EventStream> {
        self.open_stream::<IncomingEvent>("/api/stream/event").await
    }

    async fn stream_game(&self, game_id: &str) -> ApiResult<GameStream> {
        self.open_stream::<GameEvent>(&format!("/api/board/game/stream/{game_id}"))
            .await
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> ApiResult<()> {
        let resp = self
            .http
            .post(format!(
                "{}/api/board/game/{}/move/{}",
                self.base, game_id, uci
            ))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::debug!(game_id, uci, "move submitted");
            return Ok(());
        }

        // The server reports rejection reasons as {"error": "..."}.
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
