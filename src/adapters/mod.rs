// Adapters layer: concrete implementations for external systems (filesystem, language model, marketplace).

pub mod action_log;
pub mod openai;
pub mod storage;
pub mod whop;
