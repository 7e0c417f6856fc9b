//! Asynchronous task submission used for write-behind persistence.
//!
//! Durability work must never block request-serving threads, so the
//! persistent store hands each file operation to a [`TaskRunner`] and
//! returns immediately. The default implementation runs tasks in order on a
//! single background thread fed by a message channel; tests can substitute
//! [`ImmediateRunner`] to make persistence fully deterministic.

use async_channel::{Receiver, Sender};
use crossbeam_utils::atomic::AtomicCell;
use futures_lite::future::block_on;
use std::{fmt, io, sync::Mutex, thread};

static NEXT_RUNNER_ID: AtomicCell<usize> = AtomicCell::new(0);

/// A unit of persistence work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An executor for fire-and-forget persistence tasks.
///
/// Implementations must accept submissions from many threads concurrently
/// and run every submitted task exactly once. Completion is not reported
/// back through this trait; callers that need a barrier track completion
/// themselves (see
/// [`PersistentCookieStore::shutdown`](crate::PersistentCookieStore::shutdown)).
pub trait TaskRunner: Send + Sync {
    /// Submit a task for eventual execution.
    ///
    /// Submission must not block on the task itself. Whether the task has
    /// already run by the time this returns is implementation-defined.
    fn submit(&self, task: Task);
}

/// A message sent from a handle to the runner thread.
enum Message {
    /// Requests the runner to stop once earlier tasks have been drained.
    Close,

    /// Run a task.
    Run(Task),
}

/// Runs submitted tasks in order on a single background thread.
///
/// Dropping the runner closes its mailbox and waits for the thread to
/// finish draining any tasks that were already submitted.
pub struct BackgroundRunner {
    /// Used to send messages to the runner thread.
    message_tx: Sender<Message>,

    /// A join handle for the runner thread.
    join_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl BackgroundRunner {
    /// Spawn a new runner thread.
    pub fn spawn() -> io::Result<Self> {
        let id = NEXT_RUNNER_ID.fetch_add(1);
        let (message_tx, message_rx) = async_channel::unbounded();

        let join_handle = thread::Builder::new()
            .name(format!("morsel-runner-{}", id))
            .spawn(move || run(message_rx))?;

        Ok(Self {
            message_tx,
            join_handle: Mutex::new(Some(join_handle)),
        })
    }

    fn try_join(&self) {
        if let Some(join_handle) = self.join_handle.lock().unwrap().take() {
            if join_handle.join().is_err() {
                tracing::error!("task runner thread panicked");
            }
        }
    }
}

impl TaskRunner for BackgroundRunner {
    fn submit(&self, task: Task) {
        // The channel is unbounded, so sending only fails once the runner
        // thread has shut down. Persistence is best-effort; the hot path
        // must not panic over it.
        if self.message_tx.try_send(Message::Run(task)).is_err() {
            tracing::error!("task submitted after runner thread terminated");
        }
    }
}

impl fmt::Debug for BackgroundRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundRunner").finish_non_exhaustive()
    }
}

impl Drop for BackgroundRunner {
    fn drop(&mut self) {
        // Request the runner thread to shut down. The close message queues
        // behind any submitted tasks, so those still run first.
        if self.message_tx.try_send(Message::Close).is_err() {
            tracing::error!("runner thread terminated prematurely");
        }

        self.try_join();
    }
}

/// Runner thread main loop: drain messages until closed.
fn run(message_rx: Receiver<Message>) {
    tracing::debug!("task runner thread started");

    while let Ok(message) = block_on(message_rx.recv()) {
        match message {
            Message::Run(task) => task(),
            Message::Close => break,
        }
    }

    tracing::debug!("task runner thread shutting down");
}

/// Runs every submitted task immediately on the calling thread.
///
/// Useful in tests, where deterministic persistence is worth more than
/// keeping I/O off the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateRunner;

impl TaskRunner for ImmediateRunner {
    fn submit(&self, task: Task) {
        task();
    }
}
