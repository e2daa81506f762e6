pub mod hex_command;
pub mod hex_plugin;

pub use hex_command::{InvocationPlan, MIX_PROGRAM, PUBLISH_TASK, normalize_version};
pub use hex_plugin::HexPlugin;
