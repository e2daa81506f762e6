pub mod core;
pub mod plugins;
pub mod security;

pub use crate::core::*;
pub use plugins::{HexPlugin, InvocationPlan};
pub use security::{
    CommandError, CommandExecutor, RecordedCall, RecordingExecutor, SystemCommandExecutor,
};
