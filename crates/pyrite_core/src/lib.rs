//! pyrite_core: Core utilities for the pyrite static analyzer.
//!
//! Provides name interning, text ranges and line maps, and the
//! execution-environment description shared by the analysis passes.
//! Syntax trees themselves are allocated straight from a `bumpalo::Bump`
//! owned by whoever produces the tree.

pub mod env;
pub mod names;
pub mod text;

// Re-export commonly used types
pub use env::{ExecutionEnvironment, PythonPlatform, PythonVersion};
pub use names::{KnownNames, Name, NameTable};
pub use text::{LineMap, TextRange};
