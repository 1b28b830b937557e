//! Single-flight coordination for cache fills.
//!
//! Concurrent misses for the same signature queue behind one leader. Callers
//! re-check the cache after [`SingleFlight::acquire`] returns, so followers
//! reuse the value the leader stored.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default, Clone)]
pub struct SingleFlight {
    flights: Arc<DashMap<u64, Arc<Mutex<()>>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other caller holds `signature`, then hold it.
    pub async fn acquire(&self, signature: u64) -> FlightGuard {
        let slot = Arc::clone(
            self.flights
                .entry(signature)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let permit = slot.lock_owned().await;
        FlightGuard {
            signature,
            permit: Some(permit),
            flights: Arc::clone(&self.flights),
        }
    }

    /// Number of signatures with a leader or waiters.
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }
}

pub struct FlightGuard {
    signature: u64,
    permit: Option<OwnedMutexGuard<()>>,
    flights: Arc<DashMap<u64, Arc<Mutex<()>>>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        drop(self.permit.take());
        self.flights
            .remove_if(&self.signature, |_, slot| Arc::strong_count(slot) == 1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn guard_releases_slot_on_drop() {
        let flights = SingleFlight::new();
        let guard = flights.acquire(7).await;
        assert_eq!(flights.in_flight(), 1);
        drop(guard);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn different_signatures_do_not_block_each_other() {
        let flights = SingleFlight::new();
        let _first = flights.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(200), flights.acquire(2)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn same_signature_runs_one_at_a_time() {
        let flights = SingleFlight::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let flights = flights.clone();
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _guard = flights.acquire(42).await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.expect("task");
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }
}
