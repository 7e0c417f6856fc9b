//! Write-behind durable wrapper around the in-memory store.

use super::{
    memory::{InMemoryCookieStore, Mutation},
    record, CookieStore,
};
use crate::{
    cookie::Cookie,
    error::Error,
    runner::{BackgroundRunner, Task, TaskRunner},
};
use chrono::Utc;
use crossbeam_utils::sync::WaitGroup;
use http::Uri;
use std::{
    fmt, fs, io, mem,
    path::PathBuf,
    sync::{Arc, Mutex},
};

/// A cookie store that survives restarts by mirroring each cookie into a
/// file under a configured directory.
///
/// All logical operations delegate synchronously to an inner
/// [`InMemoryCookieStore`], so readers observe writes immediately; the file
/// work happens afterwards on the injected [`TaskRunner`], and no request
/// path ever blocks on disk I/O. Durability is therefore eventual: a crash
/// between a mutation and the completion of its persistence task can lose
/// that one cookie's record, and nothing more.
///
/// Each surviving, non-discard cookie maps onto exactly one record file,
/// named by a stable hash of its (name, domain, path) identity. The
/// directory is reconciled with memory at construction time and then only
/// touched by persistence tasks.
///
/// [`shutdown`](PersistentCookieStore::shutdown) waits for all previously
/// submitted persistence tasks and is the only synchronization barrier the
/// store offers.
///
/// Cloning returns a new handle to the same store.
#[derive(Clone)]
pub struct PersistentCookieStore {
    memory: InMemoryCookieStore,
    directory: Arc<PathBuf>,
    runner: Arc<dyn TaskRunner>,
    tasks: Arc<TaskGroup>,
}

impl PersistentCookieStore {
    /// Open a store backed by the given directory, spawning a dedicated
    /// background thread for persistence work.
    ///
    /// The directory is created if it does not exist. Each readable record
    /// in it becomes a cookie; unreadable or corrupt records are skipped
    /// with a warning, and records for cookies that have already expired
    /// are scheduled for deletion.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, Error> {
        let runner = BackgroundRunner::spawn()?;

        Self::with_runner(directory, Arc::new(runner))
    }

    /// Open a store backed by the given directory that hands persistence
    /// work to the provided runner.
    pub fn with_runner(
        directory: impl Into<PathBuf>,
        runner: Arc<dyn TaskRunner>,
    ) -> Result<Self, Error> {
        let directory = directory.into();

        fs::create_dir_all(&directory)?;

        let store = Self {
            memory: InMemoryCookieStore::new(),
            directory: Arc::new(directory),
            runner,
            tasks: Arc::new(TaskGroup::default()),
        };

        store.load_directory()?;

        Ok(store)
    }

    /// Reconcile the in-memory table with the directory contents.
    fn load_directory(&self) -> Result<(), Error> {
        let now = Utc::now();
        let mut loaded = 0usize;

        for entry in fs::read_dir(self.directory.as_ref())? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!("skipping unreadable directory entry: {}", e);
                    continue;
                }
            };

            if path.extension().map_or(true, |ext| ext != record::EXTENSION) {
                continue;
            }

            match record::load(&path) {
                Ok(record) => {
                    if record.domain.is_empty() {
                        tracing::warn!("skipping cookie record with no domain: {:?}", path);
                        continue;
                    }

                    let cookie = record.into_cookie();

                    // Stale records self-heal: anything already expired, and
                    // any discard cookie that should never have been
                    // written, is queued for deletion instead of loaded.
                    if cookie.is_expired_at(now) || cookie.is_discard() {
                        self.submit_delete_path(path);
                        continue;
                    }

                    self.memory.restore(cookie);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!("skipping corrupt cookie record {:?}: {}", path, e);
                }
            }
        }

        tracing::debug!("loaded {} cookie(s) from {:?}", loaded, self.directory);

        Ok(())
    }

    /// Wait until every persistence task submitted so far has completed,
    /// guaranteeing the directory reflects the in-memory state at this
    /// synchronization point.
    ///
    /// Surfaces the most recent persistence failure, if any task has failed
    /// since the last drain. This is the only barrier the store offers;
    /// everything else is fire-and-forget.
    pub fn shutdown(&self) -> Result<(), Error> {
        self.tasks.drain().map_err(Error::Io)
    }

    fn submit_save(&self, cookie: Cookie) {
        let directory = Arc::clone(&self.directory);

        self.runner
            .submit(TaskGroup::track(&self.tasks, move || {
                record::save(&directory, &cookie)
            }));
    }

    fn submit_delete(&self, cookie: Cookie) {
        let directory = Arc::clone(&self.directory);

        self.runner
            .submit(TaskGroup::track(&self.tasks, move || {
                record::delete(&directory, &cookie)
            }));
    }

    fn submit_delete_path(&self, path: PathBuf) {
        self.runner
            .submit(TaskGroup::track(&self.tasks, move || record::delete_path(&path)));
    }

    fn submit_delete_all(&self) {
        let directory = Arc::clone(&self.directory);

        self.runner
            .submit(TaskGroup::track(&self.tasks, move || record::delete_all(&directory)));
    }
}

impl CookieStore for PersistentCookieStore {
    fn add(&self, uri: &Uri, cookie: Cookie) -> Result<(), Error> {
        let discard = cookie.is_discard();

        match self.memory.upsert(uri, cookie)? {
            // Discard cookies live in memory only.
            Mutation::Stored(stored) if !discard => self.submit_save(stored),
            // An expire-delete must also retire the durable record.
            Mutation::Deleted(previous) => self.submit_delete(previous),
            _ => {}
        }

        Ok(())
    }

    fn get(&self, uri: &Uri) -> Result<Vec<Cookie>, Error> {
        let lookup = self.memory.lookup(uri)?;

        // Retire the records of anything the scan purged; queueing the
        // deletion is the only extra work done on the request path.
        for cookie in lookup.purged {
            self.submit_delete(cookie);
        }

        Ok(lookup.matched)
    }

    fn cookies(&self) -> Vec<Cookie> {
        self.memory.cookies()
    }

    fn uris(&self) -> Vec<Uri> {
        self.memory.uris()
    }

    fn remove(&self, uri: Option<&Uri>, cookie: &Cookie) -> bool {
        match self.memory.take(uri, cookie) {
            Some(removed) => {
                self.submit_delete(removed);
                true
            }
            None => false,
        }
    }

    fn remove_all(&self) -> bool {
        let had_cookies = self.memory.clear();

        self.submit_delete_all();

        had_cookies
    }
}

impl fmt::Debug for PersistentCookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentCookieStore")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

/// Tracks outstanding persistence tasks so a drain can wait for them.
struct TaskGroup {
    /// Every in-flight task holds a clone; draining swaps in a fresh group
    /// and waits for the old one's clones to drop.
    wait_group: Mutex<WaitGroup>,

    /// Most recent task failure, surfaced at the next drain.
    last_error: Mutex<Option<io::Error>>,
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self {
            wait_group: Mutex::new(WaitGroup::new()),
            last_error: Mutex::new(None),
        }
    }
}

impl TaskGroup {
    /// Wrap a unit of persistence work with completion and failure
    /// tracking.
    fn track(
        group: &Arc<Self>,
        work: impl FnOnce() -> io::Result<()> + Send + 'static,
    ) -> Task {
        let guard = group.wait_group.lock().unwrap().clone();
        let group = Arc::clone(group);

        Box::new(move || {
            if let Err(e) = work() {
                // The original caller has long since returned; log the
                // failure and hold onto it for the next drain.
                tracing::error!("cookie persistence task failed: {}", e);
                *group.last_error.lock().unwrap() = Some(e);
            }

            drop(guard);
        })
    }

    fn drain(&self) -> Result<(), io::Error> {
        let wait_group = {
            let mut guard = self.wait_group.lock().unwrap();

            mem::replace(&mut *guard, WaitGroup::new())
        };

        wait_group.wait();

        match self.last_error.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
