//! Records consumed from the remote source.
//!
//! Remote rows arrive as loosely shaped JSON. Every record passes through
//! [`Record::decode`] before it reaches a store, so a missing or mistyped
//! field fails with a [`DecodeError`] instead of leaking into the UI.

mod decode;
mod post;

pub use decode::{decode_records, DecodeError, Record};
pub use post::{AuthorSummary, Post};
