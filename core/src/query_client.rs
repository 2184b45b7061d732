//! Asynchronous query client with a response cache and live subscriptions.
//!
//! # Design
//! `QueryClient` is a cheap handle around shared state: the stateless
//! `GraphQlClient`, a `Transport`, the response cache and a registry of live
//! subscriptions. It is constructed explicitly and cloned into consumers.
//!
//! A `Subscription` owns a `tokio::sync::watch` channel. Every fetch cycle
//! publishes `Pending` and then the outcome, so observers see each refresh
//! without re-subscribing. The registry only holds type-erased handles used
//! by `invalidate`; dropping the `Subscription` removes its handle.
//!
//! Fetch cycles of one subscription may overlap (a slow first load and a
//! refresh after a mutation). Each cycle takes a generation number when it
//! starts and only the newest cycle may publish. The cache applies the same
//! rule per operation through its eviction epoch, so a response that was
//! requested before an `invalidate` is never stored after it.
//!
//! Blocking transport calls run on `spawn_blocking`. Registry and cache
//! locks are never held across an await.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::cache::{CacheKey, ResponseCache};
use crate::client::GraphQlClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::operations::{Operation, OperationKind};
use crate::result::OperationResult;
use crate::transport::{Transport, UreqTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPolicy {
    CacheFirst,
    NetworkOnly,
}

/// Options for `QueryClient::query_once`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Skip the cache and always go to the network. The fresh result is
    /// still written back to the cache.
    pub bypass_cache: bool,
}

impl QueryOptions {
    pub fn network_only() -> Self {
        Self { bypass_cache: true }
    }
}

struct Inner {
    client: GraphQlClient,
    transport: Arc<dyn Transport>,
    cache: Mutex<ResponseCache>,
    watches: Mutex<HashMap<u64, Arc<dyn Watch>>>,
    next_watch_id: AtomicU64,
}

type RefetchFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Type-erased view of a live subscription, as seen by `invalidate`.
trait Watch: Send + Sync {
    fn operation(&self) -> &'static str;
    fn refetch(self: Arc<Self>, inner: Arc<Inner>) -> RefetchFuture;
}

struct WatchState<O: Operation> {
    variables: O::Variables,
    tx: watch::Sender<OperationResult<O::Response>>,
    generation: AtomicU64,
}

impl<O: Operation> WatchState<O> {
    /// One fetch cycle. Its outcome is dropped if a newer cycle started
    /// while it was in flight.
    async fn run(&self, inner: &Inner, policy: FetchPolicy) {
        // Generation bumps and publishes both happen under the channel's
        // write lock, so a superseded cycle can never publish after a newer
        // one has started.
        let mut generation = 0;
        self.tx.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = OperationResult::Pending;
        });

        let is_current = || self.generation.load(Ordering::SeqCst) == generation;
        let result = fetch::<O>(inner, &self.variables, policy, &is_current).await;
        let published = self.tx.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = result.into();
            true
        });
        if !published {
            tracing::debug!(operation = O::NAME, generation, "superseded fetch dropped");
        }
    }

    /// Run a cycle, then wait for whichever cycle is newest to settle.
    async fn refresh(&self, inner: &Inner, policy: FetchPolicy) -> OperationResult<O::Response> {
        self.run(inner, policy).await;
        let mut rx = self.tx.subscribe();
        let settled = rx.wait_for(|result| !result.is_pending()).await;
        match settled {
            Ok(result) => result.clone(),
            Err(_) => self.tx.borrow().clone(),
        }
    }
}

impl<O: Operation> Watch for WatchState<O> {
    fn operation(&self) -> &'static str {
        O::NAME
    }

    fn refetch(self: Arc<Self>, inner: Arc<Inner>) -> RefetchFuture {
        Box::pin(async move {
            self.refresh(&inner, FetchPolicy::NetworkOnly).await;
        })
    }
}

#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    /// Client over HTTP using `ureq`, configured from `config`.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(&config.endpoint, UreqTransport::new(config.timeout()))
    }

    pub fn with_transport(endpoint: &str, transport: impl Transport) -> Self {
        Self {
            inner: Arc::new(Inner {
                client: GraphQlClient::new(endpoint),
                transport: Arc::new(transport),
                cache: Mutex::new(ResponseCache::new()),
                watches: Mutex::new(HashMap::new()),
                next_watch_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.inner.client.endpoint()
    }

    /// Register a live subscription to `O` and start its first fetch in the
    /// background. The first fetch is served from the cache when possible.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch<O: Operation>(&self, variables: O::Variables) -> Subscription<O> {
        let (tx, rx) = watch::channel(OperationResult::Pending);
        let state = Arc::new(WatchState::<O> {
            variables,
            tx,
            generation: AtomicU64::new(0),
        });
        let id = self.inner.next_watch_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .watches
            .lock()
            .insert(id, Arc::clone(&state) as Arc<dyn Watch>);
        tracing::debug!(operation = O::NAME, id, "subscription registered");

        let inner = Arc::clone(&self.inner);
        let initial = Arc::clone(&state);
        tokio::spawn(async move { initial.run(&inner, FetchPolicy::CacheFirst).await });

        Subscription {
            id,
            state,
            rx,
            inner: Arc::clone(&self.inner),
        }
    }

    /// A subscription that performs no request until its first `trigger`.
    pub fn watch_lazy<O: Operation>(&self, variables: O::Variables) -> LazyQuery<O> {
        LazyQuery {
            client: self.clone(),
            variables,
            subscription: None,
        }
    }

    /// Single request/response with no ongoing subscription.
    pub async fn query_once<O: Operation>(
        &self,
        variables: O::Variables,
        options: QueryOptions,
    ) -> Result<O::Response, ApiError> {
        let policy = if options.bypass_cache {
            FetchPolicy::NetworkOnly
        } else {
            FetchPolicy::CacheFirst
        };
        fetch::<O>(&self.inner, &variables, policy, &always_current).await
    }

    /// Send a mutation. Never cached; never retried.
    pub async fn mutate<O: Operation>(&self, variables: O::Variables) -> Result<O::Response, ApiError> {
        fetch::<O>(&self.inner, &variables, FetchPolicy::NetworkOnly, &always_current).await
    }

    /// Evict cached results of `operation` and re-fetch every live
    /// subscription to it. Resolves once every refreshed subscription has
    /// settled and returns how many subscriptions were refreshed.
    pub async fn invalidate(&self, operation: &str) -> usize {
        let evicted = self.inner.cache.lock().evict(operation);
        let watches: Vec<Arc<dyn Watch>> = self
            .inner
            .watches
            .lock()
            .values()
            .filter(|w| w.operation() == operation)
            .cloned()
            .collect();
        tracing::debug!(operation, evicted, subscriptions = watches.len(), "invalidate");

        let refreshed = watches.len();
        for watch in watches {
            watch.refetch(Arc::clone(&self.inner)).await;
        }
        refreshed
    }

    /// Number of live subscriptions.
    pub fn active_watches(&self) -> usize {
        self.inner.watches.lock().len()
    }

    pub fn cached_entries(&self) -> usize {
        self.inner.cache.lock().len()
    }
}

fn always_current() -> bool {
    true
}

/// Resolve `O` from the cache or the network. A query response is cached
/// only if `is_current` still holds when it arrives and the operation was
/// not evicted in the meantime.
async fn fetch<O: Operation>(
    inner: &Inner,
    variables: &O::Variables,
    policy: FetchPolicy,
    is_current: &(dyn Fn() -> bool + Sync),
) -> Result<O::Response, ApiError> {
    let key = CacheKey::new(O::NAME, variables)?;
    let (cached, epoch) = {
        let cache = inner.cache.lock();
        let cached = match policy {
            FetchPolicy::CacheFirst => cache.get(&key).cloned(),
            FetchPolicy::NetworkOnly => None,
        };
        (cached, cache.epoch(O::NAME))
    };
    if let Some(data) = cached {
        tracing::debug!(operation = O::NAME, "cache hit");
        return inner.client.decode::<O>(data);
    }

    let request = inner.client.build::<O>(variables)?;
    let transport = Arc::clone(&inner.transport);
    tracing::debug!(operation = O::NAME, endpoint = inner.client.endpoint(), "sending request");
    let response = tokio::task::spawn_blocking(move || transport.execute(request))
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))??;

    let data = inner.client.parse_data(response)?;
    if O::KIND == OperationKind::Query && is_current() {
        let stored = inner.cache.lock().insert_if_current(key, data.clone(), epoch);
        if !stored {
            tracing::debug!(operation = O::NAME, "response predates invalidation, not cached");
        }
    }
    inner.client.decode::<O>(data)
}

/// Live binding to the result of a query.
///
/// The subscription stays registered with its `QueryClient` until dropped.
pub struct Subscription<O: Operation> {
    id: u64,
    state: Arc<WatchState<O>>,
    rx: watch::Receiver<OperationResult<O::Response>>,
    inner: Arc<Inner>,
}

impl<O: Operation> Subscription<O> {
    pub fn current(&self) -> OperationResult<O::Response> {
        self.rx.borrow().clone()
    }

    /// Wait for the next published state.
    pub async fn changed(&mut self) -> OperationResult<O::Response> {
        // The sender lives in `self.state`, so the channel cannot close
        // while `self` exists.
        let _ = self.rx.changed().await;
        self.rx.borrow_and_update().clone()
    }

    /// Wait until the current fetch cycle has settled.
    pub async fn resolved(&mut self) -> OperationResult<O::Response> {
        if let Ok(result) = self.rx.wait_for(|result| !result.is_pending()).await {
            return result.clone();
        }
        self.current()
    }

    /// Force a network fetch and wait until the subscription settles. If
    /// another cycle overtook this one, its outcome is returned instead.
    pub async fn refetch(&mut self) -> OperationResult<O::Response> {
        let result = self.state.refresh(&self.inner, FetchPolicy::NetworkOnly).await;
        self.rx.borrow_and_update();
        result
    }
}

impl<O: Operation> Drop for Subscription<O> {
    fn drop(&mut self) {
        self.inner.watches.lock().remove(&self.id);
        tracing::debug!(operation = O::NAME, id = self.id, "subscription released");
    }
}

/// Subscription armed on demand: nothing is fetched until `trigger`.
pub struct LazyQuery<O: Operation> {
    client: QueryClient,
    variables: O::Variables,
    subscription: Option<Subscription<O>>,
}

impl<O: Operation> LazyQuery<O> {
    /// First call registers the subscription and waits for its fetch; later
    /// calls re-fetch from the network.
    pub async fn trigger(&mut self) -> OperationResult<O::Response> {
        if let Some(subscription) = self.subscription.as_mut() {
            return subscription.refetch().await;
        }
        let subscription = self.client.watch::<O>(self.variables.clone());
        self.subscription.insert(subscription).resolved().await
    }

    /// `None` until the first trigger.
    pub fn current(&self) -> Option<OperationResult<O::Response>> {
        self.subscription.as_ref().map(Subscription::current)
    }

    pub fn is_armed(&self) -> bool {
        self.subscription.is_some()
    }
}
