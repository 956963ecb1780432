//! Service layer: orchestration and cookie plumbing.

pub mod auth;
pub mod cookies;
