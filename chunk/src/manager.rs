use std::collections::VecDeque;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::debug;

use crate::stream::{ByteStream, StreamError};

/// Frames buffered per chunk before the transfer task blocks. Request
/// bodies typically arrive in 64 KiB frames, so this bounds each chunk
/// at roughly half a megabyte of in-flight data.
const CHANNEL_CAPACITY: usize = 8;

/// One contiguous byte range of a file in flight. Exists only for the
/// duration of an upload or download; the bytes are consumed through
/// `data` exactly once.
pub struct Chunk {
    pub id: String,
    pub data: ByteStream,
    pub size: u64,
}

/// Splits one source stream into fixed-count chunk streams and joins
/// retrieved chunk streams back into one ordered stream.
#[derive(Clone)]
pub struct ChunkManager {
    chunk_count: usize,
}

impl ChunkManager {
    pub fn new(chunk_count: usize) -> Self {
        Self {
            chunk_count: chunk_count.max(1),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Divides `[0, total_size)` into contiguous ranges: every range
    /// but the last is `total_size / n`, the last absorbs the
    /// remainder. Files smaller than the configured chunk count shrink
    /// the effective count so no interior chunk is empty; a zero-byte
    /// file is a single empty chunk.
    fn plan(&self, total_size: u64) -> Vec<u64> {
        let n = if total_size == 0 {
            1
        } else {
            self.chunk_count
                .min(usize::try_from(total_size).unwrap_or(usize::MAX))
        };
        let base = total_size / n as u64;
        let mut sizes = vec![base; n];
        if let Some(last) = sizes.last_mut() {
            *last = total_size - base * (n as u64 - 1);
        }
        sizes
    }

    /// Splits `source` into independently consumable chunk streams.
    ///
    /// Exactly one transfer task reads the source and routes each frame
    /// slice to the chunk it belongs to, in strict source order, over
    /// bounded channels. Draining the chunk streams in any order (or
    /// concurrently) is safe; no consumer ever touches the source.
    pub fn split(&self, source: ByteStream, total_size: u64, file_id: &str) -> Vec<Chunk> {
        let sizes = self.plan(total_size);
        let mut chunks = Vec::with_capacity(sizes.len());
        let mut feeds = VecDeque::with_capacity(sizes.len());

        for (i, &size) in sizes.iter().enumerate() {
            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            feeds.push_back((tx, size));
            chunks.push(Chunk {
                id: format!("{file_id}-chunk-{i}"),
                data: ByteStream::from_receiver(rx),
                size,
            });
        }

        tokio::spawn(transfer(source, feeds, total_size));
        chunks
    }

    /// Concatenates the given streams strictly in order into one
    /// output stream. A read error on any input aborts the join and
    /// propagates downstream; there is no silent truncation. Each
    /// input is dropped as soon as it is fully drained.
    pub fn join(&self, readers: Vec<ByteStream>) -> ByteStream {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            for mut reader in readers {
                while let Some(frame) = reader.next().await {
                    match frame {
                        Ok(frame) => {
                            // downstream gone; stop pumping
                            if tx.send(Ok(frame)).await.is_err() {
                                return;
                            }
                        }
                        Err(err) => {
                            let _ = tx.send(Err(err)).await;
                            return;
                        }
                    }
                }
            }
        });

        ByteStream::from_receiver(rx)
    }
}

type ChunkFeed = (mpsc::Sender<Result<Bytes, StreamError>>, u64);

/// The one task allowed to read the shared source. Routes bytes to the
/// chunk currently being filled and awaits channel capacity, which
/// backpressures the source when a chunk's consumer is slow. A dropped
/// consumer has its remaining bytes discarded without stalling the
/// chunks behind it.
async fn transfer(mut source: ByteStream, mut feeds: VecDeque<ChunkFeed>, total_size: u64) {
    let mut delivered: u64 = 0;

    'frames: loop {
        while matches!(feeds.front(), Some((_, 0))) {
            feeds.pop_front();
        }
        if feeds.is_empty() {
            break;
        }

        let mut frame = match source.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                fail_remaining(feeds, err).await;
                return;
            }
            None => {
                let err = StreamError::UnexpectedEof {
                    expected: total_size,
                    received: delivered,
                };
                fail_remaining(feeds, err).await;
                return;
            }
        };

        while !frame.is_empty() {
            let Some((tx, remaining)) = feeds.front_mut() else {
                debug!(extra = frame.len(), "discarding bytes past declared size");
                break 'frames;
            };

            let take = (*remaining).min(frame.len() as u64) as usize;
            let piece = frame.split_to(take);
            *remaining -= take as u64;
            delivered += take as u64;

            let _ = tx.send(Ok(piece)).await;
            if *remaining == 0 {
                feeds.pop_front();
            }
        }
    }
}

/// Source failed or ended early: every chunk stream that has not been
/// fully fed must observe the error instead of hanging or ending short.
async fn fail_remaining(mut feeds: VecDeque<ChunkFeed>, err: StreamError) {
    while let Some((tx, _)) = feeds.pop_front() {
        let _ = tx.send(Err(err.clone())).await;
    }
}
