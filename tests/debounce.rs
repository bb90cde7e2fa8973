//! Debounced watch cells on a paused clock.

use context_optimizer::debounce::debounce_watch;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

const DELAY: Duration = Duration::from_millis(500);

#[tokio::test(start_paused = true)]
async fn test_only_the_settled_value_propagates() {
    let (tx, rx) = watch::channel(String::new());
    let mut debounced = debounce_watch(rx, DELAY);
    assert_eq!(*debounced.borrow_and_update(), "");

    let start = Instant::now();
    for text in ["h", "he", "hel", "hell", "hello"] {
        tx.send(text.to_string()).unwrap();
        sleep(Duration::from_millis(100)).await;
        assert!(!debounced.has_changed().unwrap());
    }

    debounced.changed().await.unwrap();
    assert_eq!(*debounced.borrow_and_update(), "hello");
    assert!(start.elapsed() >= Duration::from_millis(900));

    // nothing else was queued behind it
    sleep(Duration::from_secs(2)).await;
    assert!(!debounced.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_separate_quiet_periods_each_propagate() {
    let (tx, rx) = watch::channel(0u32);
    let mut debounced = debounce_watch(rx, DELAY);

    tx.send(1).unwrap();
    debounced.changed().await.unwrap();
    assert_eq!(*debounced.borrow_and_update(), 1);

    tx.send(2).unwrap();
    debounced.changed().await.unwrap();
    assert_eq!(*debounced.borrow_and_update(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_source_discards_pending_value() {
    let (tx, rx) = watch::channel(0u32);
    let mut debounced = debounce_watch(rx, DELAY);

    tx.send(7).unwrap();
    sleep(Duration::from_millis(100)).await;
    drop(tx);

    assert!(debounced.changed().await.is_err());
    assert_eq!(*debounced.borrow(), 0);
}
