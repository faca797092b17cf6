//! Canvas LMS Integration
//!
//! Upstream client used by the `/api/canvas/*` proxy routes and the CLI.

mod client;

pub use client::{CanvasClient, CanvasConfig, CanvasError, PAGE_SIZE};
