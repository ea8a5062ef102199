//! Command implementations, one `run()` per subcommand.

pub mod completions;
pub mod install;
pub mod list;
pub mod menu;
pub mod status;
pub mod version;
