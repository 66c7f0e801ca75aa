use clap::{Parser, Subcommand};

use crate::relative_time::Locale;

#[derive(Parser)]
#[command(name = "commentbox")]
#[command(about = "A small persistent comment box", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a comment box in the current directory
    Init {
        /// Initialize without committing to the repo (adds .commentbox to .gitignore or .git/info/exclude)
        #[arg(long)]
        stealth: bool,
    },

    /// Post a new comment
    Post {
        /// The comment text (backtick spans render as inline code)
        content: String,

        /// Post as this user (defaults to the last username used)
        #[arg(short, long)]
        username: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all comments, oldest first
    List {
        /// Output as JSON
        #[arg(long, conflicts_with = "html")]
        json: bool,

        /// Output as HTML with escaped content
        #[arg(long)]
        html: bool,

        /// Language for time labels: en or zh (overrides the config)
        #[arg(long)]
        locale: Option<Locale>,
    },

    /// Delete the comment at the given position
    Delete {
        /// Position of the comment as shown by `list`
        index: usize,
    },

    /// Show or set the remembered username
    Username {
        /// The new username
        name: Option<String>,
    },

    /// Keep the comment list on screen with live time labels
    Watch {
        /// Seconds between refreshes (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<u64>,

        /// Language for time labels: en or zh (overrides the config)
        #[arg(long)]
        locale: Option<Locale>,
    },
}
