//! HTTP request handlers for the web adapter.
//!
//! Handlers are thin: they extract state and delegate to
//! `pmtail-runtime` collaborators or hand the socket to the session.

pub mod config;
pub mod home;
pub mod logs;
pub mod services;
