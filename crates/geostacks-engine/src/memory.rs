//! In-memory engine for tests.
//!
//! Mirrors the real engine's observable semantics: create conflicts on an
//! existing name, select/outputs/destroy fail on a missing one, destroy
//! clears outputs but keeps the stack entry until remove drops it.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::engine::{Outputs, StackEngine, WEBSITE_URL_OUTPUT};
use crate::error::{EngineError, EngineResult};
use crate::program::SiteProgram;

#[derive(Default)]
pub struct MemoryEngine {
    stacks: Mutex<Vec<(String, Outputs)>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_stacks<T>(&self, f: impl FnOnce(&mut Vec<(String, Outputs)>) -> T) -> T {
        let mut stacks = self.stacks.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut stacks)
    }
}

#[async_trait]
impl StackEngine for MemoryEngine {
    async fn create(&self, name: &str, program: &SiteProgram) -> EngineResult<Outputs> {
        let url = format!(
            "{}demo.s3-website-us-west-2.amazonaws.com",
            program.bucket_prefix().unwrap_or_default()
        );
        self.with_stacks(|stacks| {
            if stacks.iter().any(|(n, _)| n == name) {
                return Err(EngineError::Conflict(name.to_string()));
            }
            let mut outputs = Outputs::new();
            outputs.insert(WEBSITE_URL_OUTPUT.to_string(), json!(url));
            stacks.push((name.to_string(), outputs.clone()));
            Ok(outputs)
        })
    }

    async fn list(&self) -> EngineResult<Vec<String>> {
        Ok(self.with_stacks(|stacks| stacks.iter().map(|(n, _)| n.clone()).collect()))
    }

    async fn select(&self, name: &str) -> EngineResult<()> {
        self.with_stacks(|stacks| {
            if stacks.iter().any(|(n, _)| n == name) {
                Ok(())
            } else {
                Err(EngineError::NotFound(name.to_string()))
            }
        })
    }

    async fn outputs(&self, name: &str) -> EngineResult<Outputs> {
        self.with_stacks(|stacks| {
            stacks
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, outputs)| outputs.clone())
                .ok_or_else(|| EngineError::NotFound(name.to_string()))
        })
    }

    async fn destroy(&self, name: &str) -> EngineResult<()> {
        self.with_stacks(|stacks| {
            match stacks.iter_mut().find(|(n, _)| n == name) {
                Some((_, outputs)) => {
                    outputs.clear();
                    Ok(())
                }
                None => Err(EngineError::NotFound(name.to_string())),
            }
        })
    }

    async fn remove(&self, name: &str) -> EngineResult<()> {
        self.with_stacks(|stacks| {
            let before = stacks.len();
            stacks.retain(|(n, _)| n != name);
            if stacks.len() == before {
                return Err(EngineError::NotFound(name.to_string()));
            }
            Ok(())
        })
    }
}
