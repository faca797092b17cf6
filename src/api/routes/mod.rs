//! API Routes
//!
//! Route handlers organized by functionality.

pub mod auth;
pub mod canvas;
pub mod health;
pub mod pages;
