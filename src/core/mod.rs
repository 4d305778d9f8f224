pub mod generator;
pub mod launcher;
pub mod listing;
pub mod pricing;
pub mod render;
pub mod scheduler;
pub mod text;
pub mod uploader;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{Product, ProductKind};
pub use crate::domain::ports::{ConfigProvider, LanguageModel, Marketplace, Storage};
pub use crate::utils::error::Result;
