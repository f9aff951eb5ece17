//! Observable state for UI read-back.
//!
//! Each effect publishes the clamped value of every control it applies into a
//! [`ParamState`]. Interested parties subscribe with a callback: it is invoked
//! once with every current value on subscription and again on each publish.
//! [`ParamState::complete`] (called on dispose) drops all subscribers and
//! freezes the state.
//!
//! [`Observable`] is the single-value form of the same contract.
//!
//! Callbacks run after the lock is released, so they may read the state back.

use crate::snapshot::{ParamMap, ParamValue};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

fn next_subscription() -> SubscriptionId {
    SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
}

type ParamCallback = Arc<dyn Fn(&str, &ParamValue) + Send + Sync>;

struct ParamInner {
    values: ParamMap,
    subscribers: Vec<(SubscriptionId, ParamCallback)>,
    completed: bool,
}

/// Last-applied control values of one effect plus their subscribers.
pub struct ParamState {
    inner: Mutex<ParamInner>,
}

impl ParamState {
    /// Empty state.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ParamInner {
                values: ParamMap::new(),
                subscribers: Vec::new(),
                completed: false,
            }),
        }
    }

    /// Record `value` under `name` and notify subscribers.
    ///
    /// Ignored once the state is completed.
    pub fn publish(&self, name: &str, value: ParamValue) {
        let callbacks: Vec<ParamCallback> = {
            let mut inner = self.inner.lock();
            if inner.completed {
                return;
            }
            inner.values.insert(name.to_string(), value.clone());
            inner.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for callback in callbacks {
            callback(name, &value);
        }
    }

    /// Last value published under `name`.
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.inner.lock().values.get(name).cloned()
    }

    /// Last numeric value published under `name`.
    pub fn get_number(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(|v| v.as_number())
    }

    /// Copy of every current value.
    pub fn values(&self) -> ParamMap {
        self.inner.lock().values.clone()
    }

    /// Register `callback`; it is called at once for every current value.
    ///
    /// Returns `None` if the state is already completed.
    pub fn subscribe<F>(&self, callback: F) -> Option<SubscriptionId>
    where
        F: Fn(&str, &ParamValue) + Send + Sync + 'static,
    {
        let callback: ParamCallback = Arc::new(callback);
        let id = next_subscription();
        let current = {
            let mut inner = self.inner.lock();
            if inner.completed {
                return None;
            }
            inner.subscribers.push((id, Arc::clone(&callback)));
            inner.values.clone()
        };
        for (name, value) in &current {
            callback(name, value);
        }
        Some(id)
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Drop all subscribers and refuse further publishes.
    pub fn complete(&self) {
        let mut inner = self.inner.lock();
        inner.completed = true;
        inner.subscribers.clear();
    }

    /// Whether [`complete`](Self::complete) has been called.
    pub fn is_completed(&self) -> bool {
        self.inner.lock().completed
    }
}

impl Default for ParamState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ParamState")
            .field("values", &inner.values)
            .field("subscribers", &inner.subscribers.len())
            .field("completed", &inner.completed)
            .finish()
    }
}

type ValueCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ObservableInner<T> {
    value: T,
    subscribers: Vec<(SubscriptionId, ValueCallback<T>)>,
    completed: bool,
}

/// A single value with subscribers, safe to publish from any thread.
pub struct Observable<T> {
    inner: Mutex<ObservableInner<T>>,
}

impl<T: Clone + Send + 'static> Observable<T> {
    /// Observable starting at `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(ObservableInner {
                value,
                subscribers: Vec::new(),
                completed: false,
            }),
        }
    }

    /// Replace the value and notify subscribers. Ignored once completed.
    pub fn set(&self, value: T) {
        let callbacks: Vec<ValueCallback<T>> = {
            let mut inner = self.inner.lock();
            if inner.completed {
                return;
            }
            inner.value = value.clone();
            inner.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for callback in callbacks {
            callback(&value);
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.lock().value.clone()
    }

    /// Register `callback`; it is called at once with the current value.
    pub fn subscribe<F>(&self, callback: F) -> Option<SubscriptionId>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: ValueCallback<T> = Arc::new(callback);
        let id = next_subscription();
        let current = {
            let mut inner = self.inner.lock();
            if inner.completed {
                return None;
            }
            inner.subscribers.push((id, Arc::clone(&callback)));
            inner.value.clone()
        };
        callback(&current);
        Some(id)
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Drop all subscribers and refuse further updates.
    pub fn complete(&self) {
        let mut inner = self.inner.lock();
        inner.completed = true;
        inner.subscribers.clear();
    }

    /// Whether the observable is completed.
    pub fn is_completed(&self) -> bool {
        self.inner.lock().completed
    }
}
