//! The stack lifecycle capability trait.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::program::SiteProgram;

/// Named output values recorded by a stack after provisioning.
pub type Outputs = HashMap<String, serde_json::Value>;

/// The output key holding a site's public endpoint.
pub const WEBSITE_URL_OUTPUT: &str = "website_url";

/// Capability interface over the automation engine.
///
/// The HTTP layer only ever talks to `Arc<dyn StackEngine>`, so handlers can
/// be exercised against [`crate::MemoryEngine`] instead of a real
/// provisioning backend.
#[async_trait]
pub trait StackEngine: Send + Sync {
    /// Create the named stack bound to `program` under the project
    /// namespace, provision it synchronously, and return its outputs.
    ///
    /// Fails with `Conflict` if a stack of that name already exists. A
    /// provisioning failure after stack creation leaves the stack entry in
    /// place; the engine tracks partial state for later cleanup.
    async fn create(&self, name: &str, program: &SiteProgram) -> EngineResult<Outputs>;

    /// All stack names in the project namespace, in the engine's order.
    async fn list(&self) -> EngineResult<Vec<String>>;

    /// Select an existing stack without executing any program.
    ///
    /// Fails with `NotFound` if the stack does not exist.
    async fn select(&self, name: &str) -> EngineResult<()>;

    /// Read the recorded outputs of an existing stack.
    async fn outputs(&self, name: &str) -> EngineResult<Outputs>;

    /// Tear down every resource the stack created, in the engine's own
    /// dependency order.
    async fn destroy(&self, name: &str) -> EngineResult<()>;

    /// Drop the stack entry after a destroy, freeing the name for reuse.
    async fn remove(&self, name: &str) -> EngineResult<()>;
}
