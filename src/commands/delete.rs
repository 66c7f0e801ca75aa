use anyhow::Result;

use crate::Store;
use crate::models::Comment;

pub fn run(index: usize, store: &mut Store) -> Result<Comment> {
    Ok(store.delete_at(index)?)
}
