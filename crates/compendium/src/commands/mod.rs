//! Command implementations for the compendium CLI
//!
//! Each command module handles the CLI interface and delegates to
//! compendium-records and compendium-markup for the actual work.

pub mod pipeline;
pub mod render;
