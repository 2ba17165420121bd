//! Request handlers.

pub mod ask;
