//! ManualConnectivity - 手動で切り替える ConnectivitySource
//!
//! テストや CLI デモで、ホスト環境の online/offline イベントの代わりに使います。

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

use crate::ports::ConnectivitySource;

const EVENT_BUFFER: usize = 64;

pub struct ManualConnectivity {
    online: AtomicBool,
    events: broadcast::Sender<bool>,
}

impl ManualConnectivity {
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            online: AtomicBool::new(initially_online),
            events,
        }
    }

    /// Update the flag and emit the event, even if the value did not change.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        // no subscribers yet is fine
        let _ = self.events.send(online);
    }

    pub fn go_online(&self) {
        self.set_online(true);
    }

    pub fn go_offline(&self) {
        self.set_online(false);
    }
}

impl ConnectivitySource for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.events.subscribe()
    }
}
