//! geostacks-engine — automation-engine client for GeoStacks.
//!
//! Provides the [`StackEngine`] capability trait (create, list, select,
//! outputs, destroy, remove) and two implementations:
//!
//! - [`PulumiEngine`] drives the `pulumi` CLI with a generated declarative
//!   YAML program, one workspace directory per stack under a shared data
//!   directory. All provisioning, state tracking, and dependency-ordered
//!   teardown happen inside the engine; this crate only classifies its
//!   failures and parses its JSON output.
//! - [`MemoryEngine`] keeps stacks in a process-local map, for testing the
//!   layers above without a provisioning backend.

pub mod engine;
pub mod error;
pub mod memory;
pub mod program;
pub mod pulumi;

pub use engine::{Outputs, StackEngine, WEBSITE_URL_OUTPUT};
pub use error::{EngineError, EngineResult};
pub use memory::MemoryEngine;
pub use program::SiteProgram;
pub use pulumi::PulumiEngine;
