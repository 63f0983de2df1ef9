//! Client-side handle onto the aggregator.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::BackingError;
use crate::Delta;
use crate::Error;
use crate::Result;
use crate::WatcherError;

use super::all_watcher::AllRequest;
use super::all_watcher::WatcherId;

/// One client's view of the projection, advancing through the revision
/// stream at its own pace.
///
/// Created with [`AllWatcherHandle::watcher`](crate::AllWatcherHandle::watcher).
pub struct StateWatcher {
    id: WatcherId,
    request_tx: mpsc::UnboundedSender<AllRequest>,
    sticky: Arc<OnceCell<BackingError>>,
    stopped: bool,
}

impl StateWatcher {
    pub(crate) fn new(
        id: WatcherId,
        request_tx: mpsc::UnboundedSender<AllRequest>,
        sticky: Arc<OnceCell<BackingError>>,
    ) -> Self {
        StateWatcher {
            id,
            request_tx,
            sticky,
            stopped: false,
        }
    }

    pub fn id(&self) -> WatcherId {
        self.id
    }

    /// Waits until deltas newer than this client's cursor are available
    /// and returns them; the batch is never empty.
    ///
    /// Once the watcher or the dispatch loop has stopped, reports the
    /// loop's sticky backing error if one was recorded, and
    /// [`WatcherError::Stopped`] otherwise.
    pub async fn next(&mut self) -> Result<Vec<Delta>> {
        if self.stopped {
            return Err(WatcherError::Stopped.into());
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        let req = AllRequest {
            watcher: self.id,
            reply: Some(reply_tx),
        };
        if self.request_tx.send(req).is_err() {
            return Err(self.dispatch_error());
        }
        match reply_rx.await {
            Ok(Some(deltas)) => Ok(deltas),
            Ok(None) | Err(_) => Err(self.dispatch_error()),
        }
    }

    /// Detaches this client from the aggregator, releasing any entry holds
    /// its cursor accounts for. Idempotent; any pending or later [`next`]
    /// reports [`WatcherError::Stopped`].
    ///
    /// [`next`]: StateWatcher::next
    pub fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        // The loop may already be gone, in which case there is nothing
        // left to release.
        let _ = self.request_tx.send(AllRequest {
            watcher: self.id,
            reply: None,
        });
        Ok(())
    }

    fn dispatch_error(&self) -> Error {
        match self.sticky.get() {
            Some(e) => e.clone().into(),
            None => WatcherError::Stopped.into(),
        }
    }
}
