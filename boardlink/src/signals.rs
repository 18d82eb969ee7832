//! Device signal commands and the sink they are written to.
//!
//! The signal channel is one-way and fire-and-forget: commands are written
//! as lines, write failures are logged and never escalated.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Discrete commands understood by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCommand {
    /// A capture just occurred.
    Capture,
    /// Edge-triggered check indicator.
    CheckOn,
    CheckOff,
    Win,
    Lose,
}

impl SignalCommand {
    pub fn as_line(self) -> &'static str {
        match self {
            Self::Capture => "CAP",
            Self::CheckOn => "CHECK_ON",
            Self::CheckOff => "CHECK_OFF",
            Self::Win => "WIN",
            Self::Lose => "LOSE",
        }
    }
}

/// One-way command channel to the device.
#[async_trait]
pub trait SignalSink: Send {
    /// Emit a command. Must not fail the caller; transport errors are the
    /// sink's problem to log.
    async fn emit(&mut self, cmd: SignalCommand);
}

/// Writes commands as newline-terminated lines to the device write half.
pub struct LineSignalSink<W> {
    writer: W,
}

impl<W> LineSignalSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W> SignalSink for LineSignalSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&mut self, cmd: SignalCommand) {
        let line = format!("{}\n", cmd.as_line());
        match self.writer.write_all(line.as_bytes()).await {
            Ok(()) => {
                tracing::debug!(command = cmd.as_line(), "signal sent");
                if let Err(e) = self.writer.flush().await {
                    tracing::warn!("signal flush failed: {e}");
                }
            }
            Err(e) => tracing::warn!(command = cmd.as_line(), "signal write failed: {e}"),
        }
    }
}

/// Test sink that records every emitted command.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    pub emitted: Vec<SignalCommand>,
}

#[cfg(test)]
#[async_trait]
impl SignalSink for RecordingSink {
    async fn emit(&mut self, cmd: SignalCommand) {
        self.emitted.push(cmd);
    }
}
