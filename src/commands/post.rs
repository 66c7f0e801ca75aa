use anyhow::{Context, Result};

use crate::Store;
use crate::models::Comment;

/// Post `content`, as `username` if given or else as the remembered user.
///
/// A username given here is remembered even if the comment itself is then
/// rejected, the same as typing a name into the box and leaving the field.
pub fn run(content: String, username: Option<String>, store: &mut Store) -> Result<Comment> {
    let remembered = store.load_last_username();

    let username = match username {
        Some(name) => {
            store
                .update_username(&name)
                .context("Failed to remember username")?;
            name
        }
        None => remembered.unwrap_or_default(),
    };

    Ok(store.submit(&username, &content)?)
}
