// NOTE: kvadm reads a snapshot, never the cluster
//
// Gathering per-node responses is a separate step that writes a snapshot file (the
// source set plus common values such as the principal). Every command here renders
// from that file, so reports are reproducible and work offline.

mod args;
mod commands;
pub mod config;
pub mod context;
mod handlers;
pub mod logging;
pub mod terminal;

pub use args::{Cli, Commands, InfoCommand, LogLevel, MappingBy, NamespaceView, ShowCommand};
pub use commands::run;
