#![allow(clippy::needless_pass_by_value)]

pub mod delete;
pub mod init;
pub mod list;
pub mod post;
pub mod username;
pub mod watch;
