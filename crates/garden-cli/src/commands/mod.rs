//! Command implementations for the CLI.

mod alias;
mod config;
mod devices;
mod members;
mod rename;
mod show;
mod toggle;

pub use alias::cmd_alias;
pub use config::cmd_config;
pub use devices::{cmd_devices, cmd_garden};
pub use members::cmd_members;
pub use rename::cmd_rename;
pub use show::cmd_show;
pub use toggle::cmd_toggle;
