pub mod command_executor;
pub mod input_validator;
pub mod token_manager;

pub use command_executor::{
    CommandError, CommandExecutor, RecordedCall, RecordingExecutor, SystemCommandExecutor,
};
pub use input_validator::{validate_organization, validate_work_dir};
pub use token_manager::{HEX_API_KEY_ENV, mask_secret_in, mask_token};
