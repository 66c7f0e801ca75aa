use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::debug;

use crate::Store;
use crate::config::Config;
use crate::models::Comment;
use crate::output::Output;
use crate::refresh::CommentView;
use crate::relative_time::Locale;

fn build_views(comments: &[Comment], locale: Locale, period: Duration) -> Vec<CommentView> {
    comments
        .iter()
        .enumerate()
        .map(|(index, comment)| CommentView::new(index, comment.clone(), locale, period))
        .collect()
}

/// Redraw the list once per period. Each displayed comment keeps its own
/// label fresh; when the stored sequence changes underneath us the old views
/// are dropped, which cancels their timers.
pub fn run(
    interval: Option<u64>,
    ticks: Option<u64>,
    config: &Config,
    store: &mut Store,
    output: &Output,
) -> Result<()> {
    let period = interval.map_or_else(|| config.refresh_interval(), Duration::from_secs);
    if period.is_zero() {
        bail!("Refresh interval must be at least 1 second");
    }

    let mut views = build_views(store.comments(), config.locale, period);
    let mut rendered: u64 = 0;

    loop {
        output.watch_frame(&views)?;
        rendered += 1;

        if ticks.is_some_and(|limit| rendered >= limit) {
            return Ok(());
        }

        thread::sleep(period);

        let previous = store.comments().to_vec();
        if store.reload() != previous.as_slice() {
            debug!(count = store.len(), "Comments changed, rebuilding views");
            views = build_views(store.comments(), config.locale, period);
        }
    }
}
