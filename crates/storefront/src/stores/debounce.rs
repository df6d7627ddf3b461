//! Trailing-edge debounce for search input.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

/// Forward only the last value of every burst.
///
/// A value is emitted once `delay` passes without a newer one. When the input
/// closes, a pending value is flushed immediately and the output closes.
#[must_use]
pub fn debounce<T: Send + 'static>(delay: Duration, mut input: mpsc::Receiver<T>) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        while let Some(mut latest) = input.recv().await {
            let mut deadline = Instant::now() + delay;
            loop {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(value) => {
                            latest = value;
                            deadline = Instant::now() + delay;
                        }
                        None => {
                            let _ = tx.send(latest).await;
                            return;
                        }
                    },
                    () = sleep_until(deadline) => {
                        if tx.send(latest).await.is_err() {
                            return;
                        }
                        break;
                    }
                }
            }
        }
    });

    rx
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_only_final_value() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(DELAY, rx);

        for text in ["m", "mi", "mil", "milk"] {
            tx.send(text.to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(DELAY).await;
        assert_eq!(out.recv().await.as_deref(), Some("milk"));

        drop(tx);
        assert!(out.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_emit_separately() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(DELAY, rx);

        tx.send("eggs").await.unwrap();
        tokio::time::sleep(DELAY * 2).await;
        tx.send("bread").await.unwrap();
        tokio::time::sleep(DELAY * 2).await;
        drop(tx);

        assert_eq!(out.recv().await, Some("eggs"));
        assert_eq!(out.recv().await, Some("bread"));
        assert_eq!(out.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_value() {
        let (tx, rx) = mpsc::channel(8);
        let mut out = debounce(DELAY, rx);

        tx.send("rice").await.unwrap();
        drop(tx);

        assert_eq!(out.recv().await, Some("rice"));
        assert_eq!(out.recv().await, None);
    }
}
