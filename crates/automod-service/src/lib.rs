//! Automod Service
//!
//! The persistent moderation service: a long-lived process that loads the
//! classification model once and serves moderation decisions over HTTP
//! until it idles out or receives a termination signal.

pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod routes;
pub mod server;
