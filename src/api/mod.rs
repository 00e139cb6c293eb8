//! REST surface of the IAM backend: the challenge client and its wire
//! types.

pub mod client;
pub mod types;

pub use client::{basic_authorization, ApiError, ChallengeClient};
