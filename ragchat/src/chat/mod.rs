//! Chat session controller and the client for the remote answer endpoint.

mod client;
mod controller;
mod error;
mod samples;

pub use client::{ChatReply, ChatRequest, RagClient, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
pub use controller::{SessionController, FALLBACK_ANSWER};
pub use error::{ApiError, TransportFailure};
pub use samples::{sample, samples, SampleQuestion};
