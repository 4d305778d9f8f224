pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{action_log::ActionLog, openai::OpenAiClient, storage::LocalStorage, whop::WhopClient};
pub use config::AutomationConfig;
pub use core::{
    generator::ProductGenerator, launcher::AutoLauncher, scheduler::Schedule, uploader::BatchUploader,
};
pub use utils::error::{AutomationError, Result};
