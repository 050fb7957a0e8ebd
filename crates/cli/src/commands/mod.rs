//! CLI commands

pub mod compile;
pub mod completion;
pub mod eval;
pub mod init;
pub mod pull;
pub mod rewrite;
pub mod serve;
pub mod sync;
pub mod validate;
pub mod watch;
