//! Polling snapshot subscriptions over a document store.
//!
//! # Responsibility
//! - Expose live collection views as a lazy, restartable iterator of
//!   snapshots that the caller explicitly cancels.
//!
//! # Invariants
//! - The first pull always yields the current snapshot.
//! - Later pulls yield only after the collection revision changed.
//! - After cancellation the iterator is exhausted and never blocks again.

use crate::model::record::Record;
use crate::store::records::fetch_records;
use crate::store::{DocumentFilter, DocumentStore, StoreResult};
use log::debug;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Cloneable handle that terminates a subscription.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Live view of one collection filtered by `DocumentFilter`.
///
/// Revisions are per collection, so a write to any document of the collection
/// produces a new snapshot even when the filtered result is unchanged.
pub struct Subscription<'s, T> {
    store: &'s dyn DocumentStore,
    filter: DocumentFilter,
    poll_interval: Duration,
    last_revision: Option<u64>,
    cancel: CancelHandle,
    _record: PhantomData<fn() -> T>,
}

/// Subscribes to typed snapshots of `T::COLLECTION`.
pub fn subscribe<T: Record>(
    store: &dyn DocumentStore,
    filter: DocumentFilter,
    poll_interval: Duration,
) -> Subscription<'_, T> {
    debug!(
        "event=subscribe module=store status=start collection={}",
        T::COLLECTION
    );
    Subscription {
        store,
        filter,
        poll_interval,
        last_revision: None,
        cancel: CancelHandle::default(),
        _record: PhantomData,
    }
}

impl<T: Record> Subscription<'_, T> {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Non-blocking pull.
    ///
    /// Returns `Ok(None)` when cancelled or when nothing changed since the
    /// last snapshot.
    pub fn poll(&mut self) -> StoreResult<Option<Vec<T>>> {
        if self.is_cancelled() {
            return Ok(None);
        }

        let revision = self.store.revision(T::COLLECTION)?;
        if self.last_revision == Some(revision) {
            return Ok(None);
        }

        let snapshot = fetch_records::<T, _>(self.store, &self.filter)?;
        self.last_revision = Some(revision);
        Ok(Some(snapshot))
    }

    /// Forces the next pull to yield the current snapshot.
    pub fn restart(&mut self) {
        self.last_revision = None;
    }

    /// Ends the subscription.
    pub fn unsubscribe(self) {
        self.cancel.cancel();
        debug!(
            "event=subscribe module=store status=cancelled collection={}",
            T::COLLECTION
        );
    }
}

impl<T: Record> Iterator for Subscription<'_, T> {
    type Item = StoreResult<Vec<T>>;

    /// Blocks, polling at the configured interval, until a new snapshot is
    /// available or the subscription is cancelled.
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_cancelled() {
                return None;
            }
            match self.poll() {
                Ok(Some(snapshot)) => return Some(Ok(snapshot)),
                Ok(None) => thread::sleep(self.poll_interval),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
