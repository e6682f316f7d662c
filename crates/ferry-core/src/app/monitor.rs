//! ConnectivityMonitor - 接続状態の購読
//!
//! subscribe した時点の状態を最初に流し、その後は ConnectivitySource が
//! 報告する online/offline イベントをそのまま（重複も含めて）流します。

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::ports::ConnectivitySource;

#[derive(Clone)]
pub struct ConnectivityMonitor {
    source: Arc<dyn ConnectivitySource>,
}

impl ConnectivityMonitor {
    pub fn new(source: Arc<dyn ConnectivitySource>) -> Self {
        Self { source }
    }

    /// Current connectivity flag.
    pub fn check_internet(&self) -> bool {
        self.source.is_online()
    }

    /// Current status first, then every transition event.
    pub fn subscribe(&self) -> StatusStream {
        // subscribe before taking the snapshot so nothing falls in between
        let events = self.source.subscribe();
        StatusStream {
            initial: Some(self.source.is_online()),
            events,
        }
    }
}

pub struct StatusStream {
    initial: Option<bool>,
    events: broadcast::Receiver<bool>,
}

impl StatusStream {
    /// Next status value; `None` once the source is gone.
    pub async fn next(&mut self) -> Option<bool> {
        if let Some(status) = self.initial.take() {
            return Some(status);
        }
        loop {
            match self.events.recv().await {
                Ok(status) => return Some(status),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "connectivity subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
