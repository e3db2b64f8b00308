use bytes::Bytes;
use chunk::{ByteStream, ChunkManager, StreamError};
use futures::future::join_all;
use futures::stream;

fn payload(len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>())
}

/// Source delivering `data` in frames of `frame_size` bytes.
fn framed_source(data: Bytes, frame_size: usize) -> ByteStream {
    let frames: Vec<Result<Bytes, StreamError>> = data
        .chunks(frame_size)
        .map(|frame| Ok(Bytes::copy_from_slice(frame)))
        .collect();
    ByteStream::new(stream::iter(frames))
}

#[tokio::test]
async fn split_sizes_cover_file_exactly() {
    for (total, count) in [(12_000u64, 6), (10u64, 3), (7u64, 2), (1u64, 1), (100u64, 7)] {
        let manager = ChunkManager::new(count);
        let chunks = manager.split(ByteStream::from_bytes(payload(total as usize)), total, "f");

        assert_eq!(chunks.len(), count);
        let sizes: Vec<u64> = chunks.iter().map(|c| c.size).collect();
        assert_eq!(sizes.iter().sum::<u64>(), total);

        let base = total / count as u64;
        for size in &sizes[..sizes.len() - 1] {
            assert_eq!(*size, base);
        }
        assert!(*sizes.last().unwrap() >= base);
    }
}

#[tokio::test]
async fn split_assigns_indexed_chunk_ids() {
    let manager = ChunkManager::new(3);
    let chunks = manager.split(ByteStream::from_bytes(payload(30)), 30, "abc123");
    let ids: Vec<_> = chunks.iter().map(|c| c.id.clone()).collect();
    assert_eq!(ids, ["abc123-chunk-0", "abc123-chunk-1", "abc123-chunk-2"]);
}

#[tokio::test]
async fn small_file_shrinks_effective_chunk_count() {
    let manager = ChunkManager::new(6);

    let chunks = manager.split(ByteStream::from_bytes(payload(3)), 3, "f");
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.size == 1));

    let chunks = manager.split(ByteStream::empty(), 0, "f");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].size, 0);
    let bytes = chunks
        .into_iter()
        .next()
        .unwrap()
        .data
        .collect()
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn chunks_carry_contiguous_source_ranges() {
    let data = payload(10_000);
    let manager = ChunkManager::new(6);
    let chunks = manager.split(framed_source(data.clone(), 997), 10_000, "f");

    let collected = join_all(chunks.into_iter().map(|c| c.data.collect())).await;

    let mut reassembled = Vec::new();
    for part in collected {
        reassembled.extend_from_slice(&part.unwrap());
    }
    assert_eq!(Bytes::from(reassembled), data);
}

#[tokio::test]
async fn backpressure_does_not_deadlock_concurrent_drains() {
    // Far more frames per chunk than the channel buffers.
    let data = payload(64_000);
    let manager = ChunkManager::new(2);
    let chunks = manager.split(framed_source(data.clone(), 1_000), 64_000, "f");

    let collected = join_all(chunks.into_iter().map(|c| c.data.collect())).await;
    let mut reassembled = Vec::new();
    for part in collected {
        reassembled.extend_from_slice(&part.unwrap());
    }
    assert_eq!(Bytes::from(reassembled), data);
}

#[tokio::test]
async fn source_error_fails_unfinished_chunks() {
    let frames: Vec<Result<Bytes, StreamError>> = vec![
        Ok(payload(100)),
        Err(StreamError::Read("connection reset".into())),
    ];
    let manager = ChunkManager::new(4);
    let chunks = manager.split(ByteStream::new(stream::iter(frames)), 400, "f");

    let results = join_all(chunks.into_iter().map(|c| c.data.collect())).await;

    // chunk 0 was fully fed before the failure; every later chunk
    // observes the error instead of hanging or ending short
    assert!(results[0].is_ok());
    for result in &results[1..] {
        assert!(matches!(result, Err(StreamError::Read(_))));
    }
}

#[tokio::test]
async fn premature_end_of_source_is_an_error() {
    let manager = ChunkManager::new(2);
    let chunks = manager.split(framed_source(payload(200), 100), 1_000, "f");

    let results = join_all(chunks.into_iter().map(|c| c.data.collect())).await;
    for result in results {
        assert!(matches!(
            result,
            Err(StreamError::UnexpectedEof {
                expected: 1_000,
                ..
            })
        ));
    }
}

#[tokio::test]
async fn dropped_consumer_does_not_stall_other_chunks() {
    let data = payload(3_000);
    let manager = ChunkManager::new(3);
    let mut chunks = manager.split(framed_source(data.clone(), 500), 3_000, "f");

    let third = chunks.pop().unwrap();
    let second = chunks.pop().unwrap();
    let first = chunks.pop().unwrap();
    drop(second);

    let first_bytes = first.data.collect().await.unwrap();
    let third_bytes = third.data.collect().await.unwrap();
    assert_eq!(&first_bytes[..], &data[..1_000]);
    assert_eq!(&third_bytes[..], &data[2_000..]);
}

#[tokio::test]
async fn join_concatenates_in_order() {
    let manager = ChunkManager::new(3);
    let readers = vec![
        ByteStream::from_bytes(Bytes::from_static(b"alpha-")),
        ByteStream::from_bytes(Bytes::from_static(b"beta-")),
        ByteStream::from_bytes(Bytes::from_static(b"gamma")),
    ];

    let joined = manager.join(readers).collect().await.unwrap();
    assert_eq!(&joined[..], b"alpha-beta-gamma");
}

#[tokio::test]
async fn join_aborts_on_reader_error() {
    let manager = ChunkManager::new(3);
    let failing = ByteStream::new(stream::iter(vec![
        Ok(Bytes::from_static(b"partial")),
        Err(StreamError::Read("chunk connection lost".into())),
    ]));
    let readers = vec![
        ByteStream::from_bytes(Bytes::from_static(b"head")),
        failing,
        ByteStream::from_bytes(Bytes::from_static(b"tail")),
    ];

    let result = manager.join(readers).collect().await;
    assert!(matches!(result, Err(StreamError::Read(_))));
}
