use super::component::Component;
use super::module::Module;
use log::trace;
use std::ops::Deref;

/// Root module of a component tree; the object a scheduler attaches to
#[derive(Debug, Clone, Default)]
pub struct Agent {
    module: Module,
}

impl Agent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Every component in the tree, each appearing exactly once
    pub fn get_all_components(&self) -> Vec<Component> {
        self.module.get_all_components()
    }

    /// Clear the step timestamps of every component in the tree
    pub fn reset(&self) {
        let components = self.get_all_components();
        trace!("resetting {} components of {}", components.len(), self.module.id());
        for component in &components {
            component.reset();
        }
    }
}

impl From<Module> for Agent {
    fn from(module: Module) -> Self {
        Self { module }
    }
}

impl Deref for Agent {
    type Target = Module;

    fn deref(&self) -> &Module {
        &self.module
    }
}
