use std::time::Duration;

use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::time::{timeout_at, Instant};

use crate::model::Collection;
use crate::store::ChangeEvent;

/// List views reload at most twice a second no matter how bursty writes are.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Consumer-side coalescing over the store's change feed.
///
/// `changed` resolves once per burst: the first matching event arms the
/// window, further events inside it are absorbed, and the signal fires
/// after the feed has been quiet for the window. Delivery is at-least-once;
/// a lagged receiver still produces a signal.
pub struct Watcher {
    rx: Receiver<ChangeEvent>,
    collection: Option<Collection>,
    window: Duration,
}

impl Watcher {
    pub fn new(rx: Receiver<ChangeEvent>) -> Self {
        Watcher {
            rx,
            collection: None,
            window: DEFAULT_DEBOUNCE,
        }
    }

    /// Only react to changes of one collection.
    pub fn for_collection(mut self, collection: Collection) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    fn matches(&self, collection: Collection) -> bool {
        self.collection.map_or(true, |c| c == collection)
    }

    /// Wait for the next coalesced invalidation. `None` means the store's
    /// change feed closed and no further signals will arrive.
    pub async fn changed(&mut self) -> Option<()> {
        loop {
            match self.rx.recv().await {
                Ok(ev) if self.matches(ev.collection) => break,
                Ok(_) => continue,
                // Dropped events count as changes we failed to observe.
                Err(RecvError::Lagged(_)) => break,
                Err(RecvError::Closed) => return None,
            }
        }

        // Trailing debounce: wait for the watched feed to go quiet. Only
        // matching events push the deadline; filtered-out traffic must not
        // hold the window open.
        let mut deadline = Instant::now() + self.window;
        loop {
            match timeout_at(deadline, self.rx.recv()).await {
                Err(_) => return Some(()),
                Ok(Ok(ev)) if self.matches(ev.collection) => {
                    deadline = Instant::now() + self.window;
                }
                Ok(Ok(_)) => continue,
                Ok(Err(RecvError::Lagged(_))) => {
                    deadline = Instant::now() + self.window;
                }
                Ok(Err(RecvError::Closed)) => return Some(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;

    fn event(collection: Collection) -> ChangeEvent {
        ChangeEvent { collection }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_coalesces_into_one_signal() {
        let (tx, rx) = broadcast::channel(16);
        let mut watcher = Watcher::new(rx);

        tx.send(event(Collection::Items)).unwrap();
        tx.send(event(Collection::Items)).unwrap();
        tx.send(event(Collection::Activities)).unwrap();

        assert_eq!(watcher.changed().await, Some(()));
        // Nothing else pending: the next wait ends when the feed closes.
        drop(tx);
        assert_eq!(watcher.changed().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn filter_ignores_other_collections() {
        let (tx, rx) = broadcast::channel(16);
        let mut watcher = Watcher::new(rx).for_collection(Collection::Items);

        tx.send(event(Collection::Tasks)).unwrap();
        drop(tx);
        assert_eq!(watcher.changed().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_traffic_does_not_hold_the_window_open() {
        let (tx, rx) = broadcast::channel(64);
        let mut watcher = Watcher::new(rx)
            .for_collection(Collection::Items)
            .with_window(Duration::from_millis(500));

        tx.send(event(Collection::Items)).unwrap();
        // Steady off-collection chatter, each arrival inside the window.
        let feeder = tokio::spawn({
            let tx = tx.clone();
            async move {
                for _ in 0..25 {
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    let _ = tx.send(event(Collection::Tasks));
                }
            }
        });

        let signal = tokio::time::timeout(Duration::from_secs(5), watcher.changed()).await;
        assert_eq!(signal.expect("signal despite unrelated traffic"), Some(()));
        feeder.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_gap_yields_second_signal() {
        let (tx, rx) = broadcast::channel(16);
        let mut watcher = Watcher::new(rx).with_window(Duration::from_millis(500));

        tx.send(event(Collection::Items)).unwrap();
        assert_eq!(watcher.changed().await, Some(()));

        tx.send(event(Collection::Items)).unwrap();
        assert_eq!(watcher.changed().await, Some(()));
    }
}
