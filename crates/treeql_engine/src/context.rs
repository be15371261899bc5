//! The read-only inputs shared by synthesis, rendering and editing.

use treeql_schema::{ScalarKinds, Schema};

use crate::config::{EditorConfig, DEFAULT_MAX_DEPTH};
use crate::hooks::Hooks;
use crate::synthesize::Synthesizer;

/// Schema, hooks and scalar classification, passed down explicitly.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub schema: &'a Schema,
    pub hooks: &'a Hooks,
    pub scalars: &'a ScalarKinds,
    pub max_depth: usize,
}

impl<'a> Context<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema, hooks: &'a Hooks, scalars: &'a ScalarKinds) -> Self {
        Self {
            schema,
            hooks,
            scalars,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// A context using the scalar classification and depth bound of a config.
    #[must_use]
    pub const fn from_config(schema: &'a Schema, hooks: &'a Hooks, config: &'a EditorConfig) -> Self {
        Self {
            schema,
            hooks,
            scalars: &config.scalars,
            max_depth: config.max_depth,
        }
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn synthesizer(self) -> Synthesizer<'a> {
        Synthesizer::new(self)
    }
}
