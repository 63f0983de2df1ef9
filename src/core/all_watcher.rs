//! The single-owner dispatch loop driving the shared projection.
//!
//! Exactly one task owns the [`AllInfo`] and mutates it; the backing and
//! every client communicate with the loop through channels only, so the
//! projection's invariants are preserved without locks.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;

use crate::AllInfo;
use crate::Backing;
use crate::BackingError;
use crate::Change;
use crate::Delta;
use crate::EntityId;
use crate::Result;
use crate::StateWatcher;
use crate::WatcherConfig;

/// Identity of one attached client, assigned by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(pub(crate) u64);

pub(crate) type ReplySender = oneshot::Sender<Option<Vec<Delta>>>;

/// One client request: a `next` poll carrying its reply channel, or the
/// stop sentinel when `reply` is absent.
#[derive(Debug)]
pub(crate) struct AllRequest {
    pub(crate) watcher: WatcherId,
    pub(crate) reply: Option<ReplySender>,
}

#[derive(Debug, Default)]
pub(crate) struct ClientState {
    /// Revision cursor: highest revno whose deltas have been delivered.
    pub(crate) revno: i64,
    pub(crate) stopped: bool,
}

/// The aggregator: consumes backing changes, applies them to its
/// [`AllInfo`], and answers queued client requests with the deltas they
/// have not yet seen.
pub struct AllWatcher<B: Backing> {
    backing: B,
    config: WatcherConfig,
    pub(crate) all: AllInfo,
    request_rx: mpsc::UnboundedReceiver<AllRequest>,
    /// Pending requests per client, newest at the back. All of them are
    /// retained, but only the newest is answered per respond pass.
    pub(crate) waiting: HashMap<WatcherId, Vec<AllRequest>>,
    pub(crate) clients: HashMap<WatcherId, ClientState>,
    sticky: Arc<OnceCell<BackingError>>,
    shutdown: watch::Receiver<()>,
}

/// Cloneable handle for attaching client watchers to a running
/// [`AllWatcher`] and for stopping its loop.
#[derive(Clone)]
pub struct AllWatcherHandle {
    pub(crate) request_tx: mpsc::UnboundedSender<AllRequest>,
    sticky: Arc<OnceCell<BackingError>>,
    shutdown_tx: Arc<watch::Sender<()>>,
    next_watcher_id: Arc<AtomicU64>,
}

impl AllWatcherHandle {
    /// Attaches a new client watcher with a fresh revision cursor.
    pub fn watcher(&self) -> StateWatcher {
        StateWatcher::new(
            WatcherId(self.next_watcher_id.fetch_add(1, Ordering::Relaxed)),
            self.request_tx.clone(),
            self.sticky.clone(),
        )
    }

    /// Signals the dispatch loop to exit. Pending requests across all
    /// clients are refused; they observe the sticky backing error if one
    /// was recorded, [`WatcherError::Stopped`] otherwise.
    ///
    /// [`WatcherError::Stopped`]: crate::WatcherError::Stopped
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl<B: Backing> AllWatcher<B> {
    pub fn new(
        backing: B,
        config: WatcherConfig,
    ) -> (Self, AllWatcherHandle) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let sticky = Arc::new(OnceCell::new());
        let handle = AllWatcherHandle {
            request_tx,
            sticky: sticky.clone(),
            shutdown_tx: Arc::new(shutdown_tx),
            next_watcher_id: Arc::new(AtomicU64::new(0)),
        };
        let watcher = AllWatcher {
            backing,
            config,
            all: AllInfo::new(),
            request_rx,
            waiting: HashMap::new(),
            clients: HashMap::new(),
            sticky,
            shutdown: shutdown_rx,
        };
        (watcher, handle)
    }

    /// Runs the dispatch loop to completion: bulk snapshot first, then one
    /// input per iteration until stopped or the backing fails.
    pub async fn run(mut self) -> Result<()> {
        let result = self.watch_loop().await;
        if let Err(e) = &result {
            error!(error = %e, "all-watcher loop terminated");
            let _ = self.sticky.set(e.clone());
        }
        // Nothing will answer outstanding requests once the loop is gone.
        self.flush_pending();
        result?;
        Ok(())
    }

    async fn watch_loop(&mut self) -> std::result::Result<(), BackingError> {
        let (change_tx, mut change_rx) = mpsc::channel(self.config.change_buffer_capacity);
        self.backing.watch(change_tx);
        let result = self.dispatch(&mut change_rx).await;
        self.backing.unwatch();
        result
    }

    async fn dispatch(
        &mut self,
        changes: &mut mpsc::Receiver<Change>,
    ) -> std::result::Result<(), BackingError> {
        // Changes racing the bulk load are harmless: update is idempotent
        // for both refreshes and removals.
        self.backing.get_all(&mut self.all).await?;
        info!(entities = self.all.len(), "initial snapshot loaded");
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => {
                    info!("all-watcher shutdown signal received");
                    return Ok(());
                }
                Some(change) = changes.recv() => {
                    trace!(collection = %change.collection, id = %change.id, "backing change");
                    self.backing.changed(&mut self.all, change).await?;
                    self.respond();
                }
                Some(req) = self.request_rx.recv() => {
                    self.handle(req);
                    self.respond();
                }
                else => return Ok(()),
            }
        }
    }

    /// Queues or retires one client request. The stop sentinel flushes the
    /// client's pending queue and releases its entry holds.
    pub(crate) fn handle(
        &mut self,
        req: AllRequest,
    ) {
        let state = self.clients.entry(req.watcher).or_default();
        if state.stopped {
            if let Some(reply) = req.reply {
                let _ = reply.send(None);
            }
            return;
        }
        if req.reply.is_none() {
            state.stopped = true;
            let cursor = state.revno;
            debug!(watcher = ?req.watcher, cursor, "client stopped");
            if let Some(pending) = self.waiting.remove(&req.watcher) {
                for r in pending {
                    if let Some(reply) = r.reply {
                        let _ = reply.send(None);
                    }
                }
            }
            self.leave(cursor);
        } else {
            self.waiting.entry(req.watcher).or_default().push(req);
        }
    }

    /// Answers the newest pending request of every client for which new
    /// deltas exist, adjusting entry reference counts as the deltas are
    /// delivered. Clients with nothing new stay queued.
    pub(crate) fn respond(&mut self) {
        let ready: Vec<WatcherId> = self.waiting.keys().copied().collect();
        for w in ready {
            let cursor = self.clients.get(&w).map_or(0, |c| c.revno);
            let changes: Vec<Delta> = self.all.changes_since(cursor).collect();
            if changes.is_empty() {
                continue;
            }
            for delta in &changes {
                let id = self.backing.id_for_info(&delta.entity);
                if delta.removed {
                    // The client has now seen the removal and releases its
                    // hold.
                    self.all.dec_ref(&id);
                } else if self.all.lookup(&id).map_or(false, |e| e.creation_revno > cursor) {
                    // First observation of this entity by this client.
                    self.all.inc_ref(&id);
                }
            }
            let latest = self.all.latest_revno();
            if let Some(state) = self.clients.get_mut(&w) {
                state.revno = latest;
            }
            let queue = self.waiting.get_mut(&w).expect("client missing from waiting set");
            let req = queue.pop().expect("empty pending queue");
            if queue.is_empty() {
                self.waiting.remove(&w);
            }
            trace!(watcher = ?w, deltas = changes.len(), revno = latest, "answering request");
            if let Some(reply) = req.reply {
                let _ = reply.send(Some(changes));
            }
        }
    }

    /// Releases the reference a departing client holds on every entry it
    /// observed live and was not yet told was removed. Entries the client
    /// never saw, or whose removal it already saw, are untouched.
    fn leave(
        &mut self,
        cursor: i64,
    ) {
        let ids: Vec<EntityId> = self
            .all
            .entries()
            .filter(|e| e.creation_revno <= cursor && (!e.removed || e.revno > cursor))
            .map(|e| self.backing.id_for_info(&e.info))
            .collect();
        for id in &ids {
            self.all.dec_ref(id);
        }
    }

    fn flush_pending(&mut self) {
        for (_, pending) in self.waiting.drain() {
            for req in pending {
                if let Some(reply) = req.reply {
                    let _ = reply.send(None);
                }
            }
        }
    }
}
