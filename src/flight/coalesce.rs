use anyhow::{Result, anyhow, bail};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;

/// One in-flight (or just-completed) call.
///
/// The result slot is written exactly once, before waiters are notified.
/// Joiners that grab the entry after completion read the slot directly.
struct Call<T> {
    done: Notify,
    result: OnceLock<Result<T, String>>,
}

/// Per-key duplicate-call suppression.
///
/// `run` guarantees at most one concurrently executing unit of work per key.
/// Completion does not memoize: once the leader removes the entry, the next
/// caller starts a new flight.
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, Arc<Call<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `work` for `key`, or joins an already in-flight call.
    ///
    /// The leader executes `work` inline and every caller in the burst gets
    /// the same value or an error equal to the leader's. An empty key is
    /// rejected without creating an entry.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if key.is_empty() {
            bail!("flight key must not be empty");
        }

        let (call, is_leader) = {
            let mut calls = self.calls.lock();
            match calls.get(key) {
                Some(call) => (call.clone(), false),
                None => {
                    let call = Arc::new(Call {
                        done: Notify::new(),
                        result: OnceLock::new(),
                    });
                    calls.insert(key.to_string(), call.clone());
                    (call, true)
                }
            }
        };

        if !is_leader {
            return self.join(&call).await;
        }

        // The guard releases waiters and clears the entry even if `work`
        // unwinds or this task is cancelled mid-flight.
        let guard = LeaderGuard {
            flight: self,
            key: key.to_string(),
            call: call.clone(),
        };

        let outcome = work().await;
        let _ = call.result.set(match &outcome {
            Ok(value) => Ok(value.clone()),
            Err(error) => Err(format!("{error:#}")),
        });
        drop(guard);

        outcome
    }

    async fn join(&self, call: &Call<T>) -> Result<T> {
        let notified = call.done.notified();
        tokio::pin!(notified);
        // Register for the wakeup before re-checking the slot; otherwise a
        // leader finishing in between would be missed.
        notified.as_mut().enable();

        if call.result.get().is_none() {
            notified.await;
        }

        match call.result.get() {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(anyhow!(message.clone())),
            None => Err(anyhow!("in-flight call aborted")),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct LeaderGuard<'a, T> {
    flight: &'a SingleFlight<T>,
    key: String,
    call: Arc<Call<T>>,
}

impl<T> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        // Publish before release, release before delete: woken joiners must
        // find a result, and the entry stays visible until the call is no
        // longer running so late arrivals join instead of starting a second
        // flight.
        let _ = self
            .call
            .result
            .set(Err("in-flight call aborted".to_string()));
        self.call.done.notify_waiters();
        self.flight.calls.lock().remove(&self.key);
    }
}
