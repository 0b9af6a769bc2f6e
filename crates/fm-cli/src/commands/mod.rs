//! Command implementations for the FerroMap CLI

pub mod check;
pub mod common;
pub mod dispatch;
pub mod map;

pub use check::check_command;
pub use common::{load_mapper_file, validate_paths_exist};
pub use dispatch::dispatch_command;
pub use map::map_command;
