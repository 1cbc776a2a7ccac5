//! Stress tests for concurrent emission
//!
//! These tests verify:
//! - Records from many threads reach a shared sink whole
//! - The buffer pool never hands one buffer to two borrowers
//! - Gated emission under load stays free of pool traffic

use parking_lot::Mutex;
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use zlog::prelude::*;

const THREADS: usize = 8;
const RECORDS_PER_THREAD: usize = 500;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_concurrent_records_are_not_interleaved() {
    let capture = Capture::default();
    let pool = BufferPool::new().shared();
    let logger = Logger::builder()
        .pool(Arc::clone(&pool))
        .sink(capture.clone())
        .field("svc", "stress")
        .build();

    thread::scope(|scope| {
        for thread_id in 0..THREADS {
            let logger = &logger;
            scope.spawn(move || {
                for seq in 0..RECORDS_PER_THREAD {
                    logger
                        .info("tick")
                        .attr("thread", &thread_id)
                        .attr("seq", &seq)
                        .send();
                }
            });
        }
    });

    let bytes = capture.0.lock();
    let text = std::str::from_utf8(&bytes).expect("records are UTF-8");
    let mut seen = HashSet::new();
    for line in text.lines() {
        let record: serde_json::Value = serde_json::from_str(line).expect("record is a whole JSON object");
        assert_eq!(record["svc"], "stress");
        let key = (record["thread"].as_u64().unwrap(), record["seq"].as_u64().unwrap());
        assert!(seen.insert(key), "duplicate record {:?}", key);
    }

    assert_eq!(seen.len(), THREADS * RECORDS_PER_THREAD);
    assert_eq!(logger.metrics().records_written(), (THREADS * RECORDS_PER_THREAD) as u64);
    assert_eq!(pool.borrowed(), (THREADS * RECORDS_PER_THREAD) as u64);
    assert!(pool.allocated() <= THREADS as u64);
    assert_eq!(pool.idle() as u64, pool.allocated());
}

#[test]
fn test_pool_never_shares_a_buffer() {
    let pool = BufferPool::new().shared();

    thread::scope(|scope| {
        for thread_id in 0..THREADS {
            let pool = &pool;
            scope.spawn(move || {
                for round in 0..2_000u32 {
                    let mut buf = pool.acquire();
                    assert!(buf.is_empty(), "borrowed a buffer that was not cleared");

                    let marker = [thread_id as u8; 16];
                    buf.extend_from_slice(&marker);
                    if round % 64 == 0 {
                        thread::yield_now();
                    }
                    assert_eq!(&buf[..], &marker[..], "buffer written by another borrower");
                }
            });
        }
    });

    assert_eq!(pool.borrowed(), THREADS as u64 * 2_000);
    assert!(pool.allocated() <= THREADS as u64);
    assert_eq!(pool.idle() as u64, pool.allocated());
}

#[test]
fn test_gated_emission_under_load() {
    let pool = BufferPool::new().shared();
    let logger = Logger::with_pool(Arc::clone(&pool), LoggerOptions::new().with_level(Level::Error));

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let logger = &logger;
            scope.spawn(move || {
                for i in 0..RECORDS_PER_THREAD {
                    logger.debug("hidden").attr("i", &i).send();
                }
            });
        }
    });

    assert_eq!(pool.borrowed(), 0);
    assert_eq!(
        logger.metrics().entries_gated(),
        (THREADS * RECORDS_PER_THREAD) as u64
    );
    assert_eq!(logger.metrics().records_written(), 0);
}
