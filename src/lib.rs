//! # Claviger (IAM console client)
//!
//! `claviger` is a client for an identity and access management backend. It
//! drives the two ceremonies that involve a hardware or platform
//! authenticator:
//!
//! - **Login**: username and password first; when the account has an
//!   enrolled authenticator the server answers with a one-time challenge and
//!   the login is resubmitted with the authenticator's assertion.
//! - **Enrollment**: register a new authenticator onto an account by
//!   fetching creation options, running the platform ceremony, and
//!   submitting the resulting attestation.
//!
//! The platform credential capability itself is a seam
//! ([`ceremony::authenticator::Authenticator`]); this crate never talks to
//! USB/NFC/BLE hardware. Each ceremony attempt owns a session value that is
//! discarded on its terminal state; a consumed challenge is never replayed
//! and no step is retried without a fresh user action.
//!
//! ## Encoding contract
//!
//! The server defines challenge and user-handle values as UTF-8 text;
//! credential ids are base64url (no padding) transport strings; binary
//! attestation and assertion fields travel as JSON integer arrays. The
//! conversions live in [`ceremony::codec`] and must be bit-exact: any
//! mismatch makes the server's signature verification fail for every
//! ceremony.

pub mod api;
pub mod ceremony;
pub mod cli;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
