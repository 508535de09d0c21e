//! Perfume Quiz: client for the perfume recommendation service.

pub mod api;
pub mod config;
pub mod error;
pub mod quiz;
pub mod terminal;
