use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::COMMENTBOX_DIR;
use crate::config::{CONFIG_FILE, Config};
use crate::store::atomic_write;

pub fn run(stealth: bool) -> Result<()> {
    let dir = PathBuf::from(COMMENTBOX_DIR);

    if dir.exists() {
        println!("Comment box already initialized in {}", dir.display());
        return Ok(());
    }

    fs::create_dir_all(&dir).context("Failed to create .commentbox directory")?;
    write_default_config(&dir)?;

    if stealth {
        add_to_gitignore()?;
    }

    println!("Initialized comment box in {}", dir.display());
    Ok(())
}

fn write_default_config(dir: &Path) -> Result<()> {
    let content =
        toml::to_string(&Config::default()).context("Failed to serialize default config")?;
    atomic_write(&dir.join(CONFIG_FILE), content.as_bytes())
}

/// Adds `.commentbox` to git exclusions.
/// Prefers `.git/info/exclude` if it exists (truly local), otherwise uses `.gitignore`.
fn add_to_gitignore() -> Result<()> {
    let exclude_path = Path::new(".git/info/exclude");
    let gitignore_path = Path::new(".gitignore");

    // Prefer .git/info/exclude so nothing shows up in the repo's history
    let target_path = if exclude_path.exists() {
        exclude_path
    } else if gitignore_path.exists() || Path::new(".git").is_dir() {
        // Inside a git repo without an exclude file: create/use .gitignore
        gitignore_path
    } else {
        // Not a git repo
        return Ok(());
    };

    // Skip if already excluded
    let existing = fs::read_to_string(target_path).unwrap_or_default();
    if existing
        .lines()
        .any(|line| line.trim() == COMMENTBOX_DIR || line.trim() == ".commentbox/")
    {
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(target_path)
        .context("Failed to open git exclusion file")?;

    // Keep the entry on its own line
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{COMMENTBOX_DIR}")?;

    println!("Added {COMMENTBOX_DIR} to {}", target_path.display());
    Ok(())
}
