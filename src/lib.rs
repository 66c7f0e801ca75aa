#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod output;
pub mod refresh;
pub mod relative_time;
pub mod sanitize;
pub mod store;

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

use cli::{Cli, Commands};
use config::Config;
use db::CommentStore;
use output::{Format, Output};
use store::FileStore;

pub const COMMENTBOX_DIR: &str = ".commentbox";

/// The comment store every command works against.
pub type Store = CommentStore<FileStore>;

/// Finds the `.commentbox/` directory by walking up from the current directory.
/// Returns `None` if no `.commentbox/` directory is found.
pub fn find_commentbox_dir() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    let mut dir = current_dir.as_path();

    loop {
        let path = dir.join(COMMENTBOX_DIR);
        if path.is_dir() {
            return Some(path);
        }

        dir = dir.parent()?;
    }
}

fn ensure_initialized() -> Result<(Store, Config)> {
    let dir = find_commentbox_dir()
        .ok_or_else(|| anyhow!("commentbox not initialized. Run 'cb init' first."))?;

    let config = Config::load(&dir)?;
    let file_store = FileStore::open(&dir).context("Failed to open comment store")?;
    Ok((CommentStore::open(file_store), config))
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { stealth } => commands::init::run(stealth),
        Commands::Post {
            content,
            username,
            json,
        } => {
            let (mut store, config) = ensure_initialized()?;
            let comment = commands::post::run(content, username, &mut store)?;
            Output::new(json)
                .locale(config.locale)
                .comment_posted(&comment, store.len() - 1)
        }
        Commands::List { json, html, locale } => {
            let (store, config) = ensure_initialized()?;
            let config = config.with_locale(locale);
            let comments = commands::list::run(&store);
            let format = if json {
                Format::Json
            } else if html {
                Format::Html
            } else {
                Format::Plain
            };
            Output::with_format(format)
                .locale(config.locale)
                .comment_list(&comments)
        }
        Commands::Delete { index } => {
            let (mut store, _) = ensure_initialized()?;
            let removed = commands::delete::run(index, &mut store)?;
            Output::new(false).comment_deleted(index, &removed)
        }
        Commands::Username { name } => {
            let (mut store, _) = ensure_initialized()?;
            let result = commands::username::run(name, &mut store)?;
            Output::new(false).username(&result)
        }
        Commands::Watch {
            interval,
            ticks,
            locale,
        } => {
            let (mut store, config) = ensure_initialized()?;
            let config = config.with_locale(locale);
            let output = Output::new(false).locale(config.locale);
            commands::watch::run(interval, ticks, &config, &mut store, &output)
        }
    }
}
