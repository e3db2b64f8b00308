use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;

/// Error carried inside a byte stream. Cloneable so one source failure
/// can be forwarded to every chunk stream fed from that source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("stream read failed: {0}")]
    Read(String),

    #[error("source ended after {received} of {expected} bytes")]
    UnexpectedEof { expected: u64, received: u64 },
}

type Frames = Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>;

/// A lazy sequence of byte frames, consumable exactly once.
///
/// This is the currency between the HTTP layer, the chunk manager and
/// the storage clients: request bodies, per-chunk streams and
/// reassembled downloads are all `ByteStream`s.
pub struct ByteStream {
    inner: Frames,
}

impl ByteStream {
    pub fn new(stream: impl Stream<Item = Result<Bytes, StreamError>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Stream fed by a bounded channel; ends when every sender is gone.
    pub fn from_receiver(receiver: mpsc::Receiver<Result<Bytes, StreamError>>) -> Self {
        Self::new(futures::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }))
    }

    /// Single-frame stream over already-materialized bytes.
    pub fn from_bytes(data: Bytes) -> Self {
        if data.is_empty() {
            Self::empty()
        } else {
            Self::new(futures::stream::once(async move { Ok(data) }))
        }
    }

    pub fn empty() -> Self {
        Self::new(futures::stream::empty())
    }

    /// Drains the stream into one buffer. Intended for storage clients
    /// and tests; download paths should consume frames incrementally.
    pub async fn collect(mut self) -> Result<Bytes, StreamError> {
        let mut buf = BytesMut::new();
        while let Some(frame) = self.next().await {
            buf.extend_from_slice(&frame?);
        }
        Ok(buf.freeze())
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ByteStream")
    }
}
