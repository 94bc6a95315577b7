//! Heroine Builder — expands a character sheet into a finished prompt document.
//!
//! A generative text service is asked to expand the character; its reply is
//! split into a variable mapping and a narrative section, which are then
//! merged into a base template or assembled into a standalone document.

pub mod config;
pub mod core;
pub mod schema;
