use crate::Store;
use crate::models::Comment;

pub fn run(store: &Store) -> Vec<Comment> {
    store.comments().to_vec()
}
