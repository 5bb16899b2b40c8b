//! # Composition Engine
//!
//! The engine drives videos through their build lifecycle: hooks, handler
//! chains, and materialization of the final artifact.

pub mod engine;

// Re-exports for convenience
pub use engine::LocalEngine;
