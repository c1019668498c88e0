//! Tag-keyed query cache and invalidation engine.
//!
//! The cache is an explicit, constructed object: one instance per
//! application root, cloneable handle, no process-wide singleton. Entries
//! are keyed by request fingerprint; queries register their result under the
//! tags they declare, and mutations mark every matching fingerprint stale.
//! Subscribed stale entries re-fetch immediately (exactly once per
//! invalidation burst); unsubscribed ones re-fetch lazily on the next
//! subscription.
//!
//! Locking: all state lives behind a `std::sync::Mutex` that is never held
//! across an await point. Fetches run on spawned tasks and report back
//! through [`QueryCache::complete`]; per fingerprint the latest-issued fetch
//! wins and superseded results are discarded on arrival.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

use super::state::{QueryState, Snapshot};
use crate::endpoint::Fingerprint;
use crate::tags::Tag;
use crate::transport::ApiError;

pub type FetchFuture = BoxFuture<'static, Result<Value, ApiError>>;

/// Fetch function stored per entry so the engine can re-execute the query
/// on invalidation.
pub type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Box an async closure into a [`Fetcher`].
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
{
  Arc::new(move || Box::pin(f()))
}

struct Entry {
  tx: watch::Sender<Snapshot>,
  tags: Vec<Tag>,
  /// Set after the first successful fetch; errored fetches provide no tags
  /// and are invisible to invalidation.
  provided: bool,
  subscribers: usize,
  /// Sequence number of the latest issued fetch.
  seq: u64,
  inflight: bool,
  /// When stale: the first fetch sequence guaranteed to observe the
  /// invalidating write. Completions below this keep the entry stale.
  stale_mark: Option<u64>,
  fetcher: Fetcher,
  /// Set when the subscriber count drops to zero; starts the GC clock.
  unused_since: Option<Instant>,
}

impl Entry {
  fn is_stale(&self) -> bool {
    self.stale_mark.is_some()
  }
}

/// The shared query cache.
#[derive(Clone)]
pub struct QueryCache {
  inner: Arc<Mutex<HashMap<Fingerprint, Entry>>>,
  gc_delay: Duration,
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryCache {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(HashMap::new())),
      gc_delay: Duration::from_secs(60),
    }
  }

  /// Override the delay before an unsubscribed entry becomes evictable.
  pub fn with_gc_delay(mut self, gc_delay: Duration) -> Self {
    self.gc_delay = gc_delay;
    self
  }

  /// Register a subscriber for a query.
  ///
  /// The first subscription issues the fetch; concurrent subscriptions with
  /// the same fingerprint share it. A stale or errored entry with no fetch
  /// in flight is re-fetched. Must be called within a Tokio runtime.
  pub fn subscribe(&self, fingerprint: Fingerprint, tags: Vec<Tag>, fetch: Fetcher) -> Subscription {
    let mut inner = self.inner.lock().expect("cache lock poisoned");
    Self::sweep(&mut inner, self.gc_delay);

    let entry = inner.entry(fingerprint.clone()).or_insert_with(|| {
      let (tx, _rx) = watch::channel(Snapshot::loading());
      Entry {
        tx,
        tags,
        provided: false,
        subscribers: 0,
        seq: 0,
        inflight: false,
        stale_mark: None,
        fetcher: fetch,
        unused_since: None,
      }
    });

    entry.subscribers += 1;
    entry.unused_since = None;

    let errored = entry.tx.borrow().state.is_error();
    if !entry.inflight && (entry.seq == 0 || entry.is_stale() || errored) {
      self.start_fetch(&fingerprint, entry);
    }

    let rx = entry.tx.subscribe();
    drop(inner);

    Subscription {
      cache: self.clone(),
      fingerprint,
      rx,
    }
  }

  /// One-shot fetch: subscribe, await a settled post-invalidation outcome,
  /// unsubscribe. De-duplicated against concurrent identical queries.
  pub async fn fetch(
    &self,
    fingerprint: Fingerprint,
    tags: Vec<Tag>,
    fetch: Fetcher,
  ) -> Result<Value, ApiError> {
    let mut subscription = self.subscribe(fingerprint, tags, fetch);
    subscription.resolved().await
  }

  /// Mark every entry matching any of `tags` stale.
  ///
  /// Runs synchronously: by the time this returns (and therefore before a
  /// mutation's future resolves), every matching subscribed entry has a
  /// re-fetch in flight and every unsubscribed one is flagged for lazy
  /// re-fetch. Invalidating an already-stale entry is a no-op, so a burst
  /// of overlapping invalidations yields exactly one re-fetch.
  pub fn invalidate(&self, tags: &[Tag]) {
    if tags.is_empty() {
      return;
    }

    let mut inner = self.inner.lock().expect("cache lock poisoned");
    Self::sweep(&mut inner, self.gc_delay);

    for (fingerprint, entry) in inner.iter_mut() {
      if !entry.provided || entry.is_stale() {
        continue;
      }
      let matched = tags
        .iter()
        .any(|t| entry.tags.iter().any(|p| t.invalidates(p)));
      if !matched {
        continue;
      }

      debug!(fingerprint = fingerprint.as_str(), "invalidating cache entry");
      entry.stale_mark = Some(entry.seq + 1);
      let state = entry.tx.borrow().state.clone();
      entry.tx.send_replace(Snapshot { state, stale: true });

      if entry.subscribers > 0 && !entry.inflight {
        self.start_fetch(fingerprint, entry);
      }
    }
  }

  /// Force a re-fetch, superseding any fetch in flight.
  pub fn refetch(&self, fingerprint: &Fingerprint) {
    let mut inner = self.inner.lock().expect("cache lock poisoned");
    if let Some(entry) = inner.get_mut(fingerprint) {
      self.start_fetch(fingerprint, entry);
    }
  }

  /// Drop every entry (logout).
  pub fn clear(&self) {
    self.inner.lock().expect("cache lock poisoned").clear();
  }

  fn unsubscribe(&self, fingerprint: &Fingerprint) {
    let mut inner = self.inner.lock().expect("cache lock poisoned");
    if let Some(entry) = inner.get_mut(fingerprint) {
      entry.subscribers = entry.subscribers.saturating_sub(1);
      if entry.subscribers == 0 {
        entry.unused_since = Some(Instant::now());
      }
    }
  }

  /// Issue a fetch for an entry. Caller holds the lock; this only bumps the
  /// sequence and spawns the task.
  fn start_fetch(&self, fingerprint: &Fingerprint, entry: &mut Entry) {
    entry.seq += 1;
    entry.inflight = true;

    let future = (entry.fetcher)();
    let cache = self.clone();
    let fingerprint = fingerprint.clone();
    let seq = entry.seq;

    tokio::spawn(async move {
      let result = future.await;
      cache.complete(&fingerprint, seq, result);
    });
  }

  /// Record the outcome of fetch `seq`. Superseded completions and
  /// completions for evicted entries are discarded.
  fn complete(&self, fingerprint: &Fingerprint, seq: u64, result: Result<Value, ApiError>) {
    let mut inner = self.inner.lock().expect("cache lock poisoned");
    let Some(entry) = inner.get_mut(fingerprint) else {
      return;
    };
    if seq != entry.seq {
      return;
    }
    entry.inflight = false;

    match result {
      Ok(value) => {
        entry.provided = true;
        if entry.stale_mark.is_some_and(|mark| seq < mark) {
          // This fetch was issued before the invalidation landed; its data
          // may predate the write. Publish it but keep the entry stale, and
          // run the guaranteed post-write re-fetch for live subscribers.
          entry.tx.send_replace(Snapshot {
            state: QueryState::Success(value),
            stale: true,
          });
          if entry.subscribers > 0 {
            self.start_fetch(fingerprint, entry);
          }
        } else {
          entry.stale_mark = None;
          entry.tx.send_replace(Snapshot {
            state: QueryState::Success(value),
            stale: false,
          });
        }
      }
      Err(error) => {
        // Surface the error; no automatic retry. The entry stays invisible
        // to invalidation until a fetch succeeds again.
        entry.stale_mark = None;
        entry.tx.send_replace(Snapshot {
          state: QueryState::Error(error),
          stale: false,
        });
      }
    }
  }

  fn sweep(inner: &mut HashMap<Fingerprint, Entry>, gc_delay: Duration) {
    inner.retain(|_, entry| {
      entry.subscribers > 0 || entry.unused_since.map_or(true, |t| t.elapsed() < gc_delay)
    });
  }
}

/// Live subscription to a cached query. Dropping it releases the
/// subscriber slot; the entry itself survives until the GC delay elapses.
pub struct Subscription {
  cache: QueryCache,
  fingerprint: Fingerprint,
  rx: watch::Receiver<Snapshot>,
}

impl Subscription {
  pub fn fingerprint(&self) -> &Fingerprint {
    &self.fingerprint
  }

  /// Current entry state.
  pub fn snapshot(&self) -> Snapshot {
    self.rx.borrow().clone()
  }

  /// Wait for the next state change. Returns `false` if the entry was
  /// evicted from the cache.
  pub async fn changed(&mut self) -> bool {
    self.rx.changed().await.is_ok()
  }

  /// Wait until the entry holds a settled, post-invalidation outcome and
  /// return it.
  pub async fn resolved(&mut self) -> Result<Value, ApiError> {
    loop {
      if let Some(outcome) = self.snapshot().fresh() {
        return outcome;
      }
      if self.rx.changed().await.is_err() {
        return Err(ApiError::transport("query evicted while in flight"));
      }
    }
  }

  /// Force a re-fetch of this query.
  pub fn refetch(&self) {
    self.cache.refetch(&self.fingerprint);
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.cache.unsubscribe(&self.fingerprint);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tags::TagType;
  use serde_json::json;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn fp(name: &str) -> Fingerprint {
    Fingerprint::of(name, "/", &json!({}))
  }

  /// Fetcher returning the invocation count, with an optional per-call
  /// delay to keep requests in flight while the test acts.
  fn counting_fetcher(counter: Arc<AtomicU32>, delay: Duration) -> Fetcher {
    fetcher(move || {
      let counter = counter.clone();
      async move {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(delay).await;
        Ok(json!({ "fetch": n }))
      }
    })
  }

  async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
  }

  #[tokio::test]
  async fn concurrent_identical_queries_share_one_request() {
    let cache = QueryCache::new();
    let count = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(count.clone(), Duration::from_millis(20));
    let tags = vec![Tag::bare(TagType::Plans)];

    let mut a = cache.subscribe(fp("plans"), tags.clone(), fetch.clone());
    let mut b = cache.subscribe(fp("plans"), tags, fetch);

    let (ra, rb) = tokio::join!(a.resolved(), b.resolved());
    assert_eq!(ra.unwrap(), rb.unwrap());
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn invalidation_refetches_subscribers_exactly_once() {
    let cache = QueryCache::new();
    let count = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(count.clone(), Duration::ZERO);

    let mut sub = cache.subscribe(fp("plans"), vec![Tag::bare(TagType::Plans)], fetch);
    sub.resolved().await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // Two invalidations in rapid succession: one re-fetch, not two.
    cache.invalidate(&[Tag::bare(TagType::Plans)]);
    cache.invalidate(&[Tag::bare(TagType::Plans)]);
    settle().await;

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(!sub.snapshot().stale);
    assert_eq!(sub.resolved().await.unwrap(), json!({ "fetch": 2 }));
  }

  #[tokio::test]
  async fn keyed_tags_invalidate_exact_pair_only() {
    let cache = QueryCache::new();
    let count = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(count.clone(), Duration::ZERO);

    let mut sub = cache.subscribe(
      fp("planDetails:42"),
      vec![Tag::keyed(TagType::PlanDetails, "42")],
      fetch,
    );
    sub.resolved().await.unwrap();

    // A different id must not touch this entry.
    cache.invalidate(&[Tag::keyed(TagType::PlanDetails, "7")]);
    settle().await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // The exact pair must.
    cache.invalidate(&[Tag::keyed(TagType::PlanDetails, "42")]);
    settle().await;
    assert_eq!(count.load(Ordering::SeqCst), 2);

    // And so must the bare type.
    cache.invalidate(&[Tag::bare(TagType::PlanDetails)]);
    settle().await;
    assert_eq!(count.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn unsubscribed_stale_entry_refetches_on_next_subscription() {
    let cache = QueryCache::new();
    let count = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(count.clone(), Duration::ZERO);
    let tags = vec![Tag::bare(TagType::Bookings)];

    let mut sub = cache.subscribe(fp("bookings"), tags.clone(), fetch.clone());
    sub.resolved().await.unwrap();
    drop(sub);

    cache.invalidate(&[Tag::bare(TagType::Bookings)]);
    settle().await;
    // Nobody is listening: no eager re-fetch.
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let mut sub = cache.subscribe(fp("bookings"), tags, fetch);
    assert_eq!(sub.resolved().await.unwrap(), json!({ "fetch": 2 }));
  }

  #[tokio::test]
  async fn latest_issued_fetch_wins() {
    let cache = QueryCache::new();
    let count = Arc::new(AtomicU32::new(0));
    // First call is slow, second fast: the slow result arrives last but is
    // superseded and must be discarded.
    let fetch = fetcher({
      let count = count.clone();
      move || {
        let n = count.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
          let delay = if n == 1 { 80 } else { 10 };
          tokio::time::sleep(Duration::from_millis(delay)).await;
          Ok(json!(n))
        }
      }
    });

    let sub = cache.subscribe(fp("teams"), vec![Tag::bare(TagType::Teams)], fetch);
    sub.refetch();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(sub.snapshot().state.data(), Some(&json!(2)));
  }

  #[tokio::test]
  async fn invalidation_during_flight_still_refetches_after_the_write() {
    let cache = QueryCache::new();
    let count = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(count.clone(), Duration::from_millis(40));

    let mut sub = cache.subscribe(fp("calendar"), vec![Tag::bare(TagType::Calendar)], fetch);
    sub.resolved().await.unwrap();

    // Force a re-fetch, then invalidate while it is in flight. The data
    // from the in-flight fetch may predate the write, so a further fetch
    // must run.
    sub.refetch();
    tokio::time::sleep(Duration::from_millis(5)).await;
    cache.invalidate(&[Tag::bare(TagType::Calendar)]);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert!(!sub.snapshot().stale);
  }

  #[tokio::test]
  async fn errored_entry_does_not_poison_and_retries_on_resubscribe() {
    let cache = QueryCache::new();
    let count = Arc::new(AtomicU32::new(0));
    let fetch = fetcher({
      let count = count.clone();
      move || {
        let n = count.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
          if n == 1 {
            Err(ApiError::transport("backend unreachable"))
          } else {
            Ok(json!({ "ok": true }))
          }
        }
      }
    });
    let tags = vec![Tag::bare(TagType::Farmers)];

    let mut sub = cache.subscribe(fp("farmers"), tags.clone(), fetch.clone());
    assert!(sub.resolved().await.is_err());

    // Errored entries provide no tags: invalidation ignores them.
    cache.invalidate(&[Tag::bare(TagType::Farmers)]);
    settle().await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // A new subscription retries.
    drop(sub);
    let mut sub = cache.subscribe(fp("farmers"), tags, fetch);
    assert_eq!(sub.resolved().await.unwrap(), json!({ "ok": true }));
  }

  #[tokio::test]
  async fn entry_survives_until_gc_delay_elapses() {
    let cache = QueryCache::new().with_gc_delay(Duration::from_millis(60));
    let count = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(count.clone(), Duration::ZERO);
    let tags = vec![Tag::bare(TagType::Assets)];

    let mut sub = cache.subscribe(fp("assets"), tags.clone(), fetch.clone());
    sub.resolved().await.unwrap();
    drop(sub);

    // Within the delay the cached value is reused.
    let mut sub = cache.subscribe(fp("assets"), tags.clone(), fetch.clone());
    assert_eq!(sub.resolved().await.unwrap(), json!({ "fetch": 1 }));
    drop(sub);

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Past the delay the entry is collected and the query runs again.
    let mut sub = cache.subscribe(fp("assets"), tags, fetch);
    assert_eq!(sub.resolved().await.unwrap(), json!({ "fetch": 2 }));
  }

  #[tokio::test]
  async fn live_subscriber_pins_entry_past_gc_delay() {
    let cache = QueryCache::new().with_gc_delay(Duration::ZERO);
    let count = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(count.clone(), Duration::ZERO);
    let tags = vec![Tag::bare(TagType::Drones)];

    let mut sub = cache.subscribe(fp("drones"), tags.clone(), fetch.clone());
    sub.resolved().await.unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    let mut other = cache.subscribe(fp("drones"), tags, fetch);
    assert_eq!(other.resolved().await.unwrap(), json!({ "fetch": 1 }));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    drop(sub);
  }
}
