//! Chat assistant: keyword lookup with an optional remote generator.

mod generator;
mod service;

pub use generator::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, RemoteGenerator, RemoteGeneratorConfig,
    TextGenerator,
};
pub use service::{AssistantReply, AssistantService, DEGRADED_NOTICE, PendingReply, ReplySource};
