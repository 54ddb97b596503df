//! Creature Forge - blueprint compiler for creature actors
//!
//! Loads versioned creature blueprints, migrates and validates them, derives
//! health, natural weapons and progression, and writes the result onto an
//! actor as a single patch.

pub mod actor;
pub mod blueprints;
pub mod core;
pub mod rules;
pub mod synthesis;
