use anyhow::{Result, bail};

use crate::Store;

/// Outcome of `username`: what is remembered now, and whether it changed.
#[derive(Debug)]
pub struct UsernameResult {
    pub username: Option<String>,
    pub changed: bool,
}

pub fn run(name: Option<String>, store: &mut Store) -> Result<UsernameResult> {
    let current = store.load_last_username();

    let Some(name) = name else {
        return Ok(UsernameResult {
            username: current,
            changed: false,
        });
    };

    if name.is_empty() {
        bail!("please enter a username");
    }

    let changed = store.update_username(&name)?;
    Ok(UsernameResult {
        username: Some(name),
        changed,
    })
}
