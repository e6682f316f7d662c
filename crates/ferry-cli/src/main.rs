use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::{Duration, timeout};
use tracing_subscriber::EnvFilter;

use ferry_core::impls::{InMemoryStore, JsonFileStore, ManualConnectivity};
use ferry_core::ports::KeyValueStore;
use ferry_core::{ExecuteError, Handler, HandlerError, OfflineQueueBuilder, Operation};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaveNote {
    id: u64,
    body: String,
}

impl Operation for SaveNote {
    const TYPE: &'static str = "notes.save.v1";
}

/// Stand-in for a remote API that rejects the first `n` calls.
struct SaveNoteHandler {
    remaining_failures: AtomicU32,
}

impl SaveNoteHandler {
    fn new(n: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
        }
    }
}

#[async_trait]
impl Handler<SaveNote> for SaveNoteHandler {
    async fn handle(&self, note: SaveNote) -> Result<(), HandlerError> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if let Ok(left) = failing {
            return Err(HandlerError::new(format!("intentional failure (left={left})")));
        }

        println!("saved note {}: {}", note.id, note.body);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // (A) store: JSON file if a path is given, in-memory otherwise
    let store: Arc<dyn KeyValueStore> = match std::env::args().nth(1) {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(InMemoryStore::new()),
    };
    let net = Arc::new(ManualConnectivity::new(false));

    // (B) the handler fails once so the first sweep halts
    let queue = match OfflineQueueBuilder::new(store, net.clone())
        .register::<SaveNote, _>(SaveNoteHandler::new(1))
        .expect_operations(&[SaveNote::TYPE])
        .build()
    {
        Ok(queue) => queue,
        Err(e) => {
            eprintln!("failed to start: {e}");
            std::process::exit(1);
        }
    };
    let mut reports = queue.sweep_reports();

    // (C) offline: nothing is attempted, everything is queued
    for (id, body) in [(1, "buy milk"), (2, "call bob"), (3, "book flights")] {
        let note = SaveNote {
            id,
            body: body.to_string(),
        };
        let result = queue
            .execute(&note, || async { Ok::<_, std::io::Error>(()) })
            .await;
        match result {
            Ok(()) => println!("note {id} saved directly"),
            Err(ExecuteError::QueuedOffline) => println!("note {id} queued (offline)"),
            Err(e) => println!("note {id}: {e}"),
        }
    }
    match queue.pending_operations().await {
        Ok(pending) => println!("pending: {}", pending.len()),
        Err(e) => eprintln!("could not read queue: {e}"),
    }

    // (D) back online twice: the first sweep halts, the duplicate tick retries
    for _ in 0..2 {
        net.go_online();
        match timeout(Duration::from_secs(5), reports.recv()).await {
            Ok(Ok(report)) => println!(
                "sweep: replayed={} skipped={} halted={:?}",
                report.replayed, report.skipped, report.halted
            ),
            Ok(Err(e)) => eprintln!("report channel: {e}"),
            Err(_) => eprintln!("sweep timed out"),
        }
    }

    // (E) teardown
    queue.shutdown().await;
}
