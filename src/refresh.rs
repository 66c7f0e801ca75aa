use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use jiff::Timestamp;
use tracing::trace;

use crate::models::Comment;
use crate::relative_time::{self, Locale};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Runs a callback immediately and then once per period on a background
/// thread until cancelled or dropped.
pub struct RefreshTimer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    pub fn spawn<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            loop {
                tick();
                match stopped.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    // Explicit stop, or the timer handle went away.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Stop ticking and wait for the background thread to exit.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A displayed comment whose relative time label keeps itself current.
pub struct CommentView {
    index: usize,
    comment: Comment,
    label: Arc<Mutex<String>>,
    _timer: RefreshTimer,
}

impl CommentView {
    pub fn new(index: usize, comment: Comment, locale: Locale, period: Duration) -> Self {
        let created = comment.created_time();
        let label = Arc::new(Mutex::new(relative_time::format(
            created,
            Timestamp::now(),
            locale,
        )));

        let shared = Arc::clone(&label);
        let timer = RefreshTimer::spawn(period, move || {
            let text = relative_time::format(created, Timestamp::now(), locale);
            trace!(index, label = %text, "Refreshed label");
            *shared.lock().unwrap_or_else(PoisonError::into_inner) = text;
        });

        Self {
            index,
            comment,
            label,
            _timer: timer,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    pub fn label(&self) -> String {
        self.label
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
