//! Application root and deployment units.
//!
//! An `App` owns context values (deployment tier, project, region); a
//! `Stack` is one deployment unit holding the recorded resource graph and
//! its outputs. All creation is synchronous: a call either records a graph
//! node or fails with `SynthError` before any mutation.

use super::graph::{Output, ResourceNode};
use super::tags::TagSet;
use crate::error::SynthError;
use indexmap::IndexMap;

const DEFAULT_REGION: &str = "us-east-1";

/// Application root — context shared by all stacks created from it.
#[derive(Debug, Clone, Default)]
pub struct App {
    context: IndexMap<String, String>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a context value, e.g. `environment` or `project`.
    pub fn set_context(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.context.insert(key.into(), value.into());
    }
}

/// One deployment unit: a named scope holding resources and outputs.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    region: String,
    context: IndexMap<String, String>,
    resources: IndexMap<String, ResourceNode>,
    outputs: IndexMap<String, Output>,
}

impl Stack {
    /// Create a stack scoped to an app, inheriting its context.
    pub fn new(app: &App, name: impl Into<String>) -> Self {
        let context = app.context.clone();
        let region = context
            .get("region")
            .cloned()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        Self {
            name: name.into(),
            region,
            context,
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Look up a context value. Returns None when unset.
    pub fn try_get_context(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// Record a resource node under a construct path.
    /// Fails without mutating the graph when the path is taken.
    pub fn add_resource(&mut self, path: &str, node: ResourceNode) -> Result<(), SynthError> {
        if self.resources.contains_key(path) {
            return Err(SynthError::DuplicateId(path.to_string()));
        }
        self.resources.insert(path.to_string(), node);
        Ok(())
    }

    /// Merge tags into an already-recorded resource. Unknown paths are a
    /// no-op: tags only ever target nodes the caller just created.
    pub fn apply_tags(&mut self, path: &str, tags: &TagSet) {
        if let Some(node) = self.resources.get_mut(path) {
            for (k, v) in tags.iter() {
                node.tags.insert(k, v);
            }
        }
    }

    /// Record an exported output under a unique id.
    pub fn add_output(&mut self, id: &str, output: Output) -> Result<(), SynthError> {
        if self.outputs.contains_key(id) {
            return Err(SynthError::DuplicateId(id.to_string()));
        }
        self.outputs.insert(id.to_string(), output);
        Ok(())
    }

    pub fn resource(&self, path: &str) -> Option<&ResourceNode> {
        self.resources.get(path)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &ResourceNode)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn output(&self, id: &str) -> Option<&Output> {
        self.outputs.get(id)
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.outputs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render the recorded graph to a JSON template. Order follows
    /// insertion order, so repeated synthesis is byte-identical.
    pub fn synth(&self) -> serde_json::Value {
        serde_json::json!({
            "stack": self.name,
            "region": self.region,
            "resources": self.resources,
            "outputs": self.outputs,
        })
    }
}
