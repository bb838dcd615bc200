use super::component::Component;
use crate::core::errors::{EngineError, LookupKind};
use crate::core::ports::Unit;
use crate::core::sync::{lock, read, write};
use crate::core::types::{ComponentId, ModuleId};
use log::warn;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, RwLock};

/// Held while a submodule is checked for cycles and inserted
static COMPOSITION: Mutex<()> = Mutex::new(());

#[derive(Default)]
struct Children {
    components: BTreeMap<String, Component>,
    submodules: BTreeMap<String, Module>,
}

/// A unit that owns named child components and named child modules.
///
/// Modules nest to any depth, and [`Module::add_submodule`] refuses to create
/// a cycle. A module's own ports are usually aliases of its children's ports.
#[derive(Clone)]
pub struct Module {
    id: ModuleId,
    unit: Unit,
    children: Arc<RwLock<Children>>,
}

impl Module {
    pub fn new() -> Self {
        Self {
            id: ModuleId::new(),
            unit: Unit::new(),
            children: Arc::new(RwLock::new(Children::default())),
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Insert `component` under `name`, replacing any component already there
    pub fn add_component(&self, name: &str, component: Component) {
        write(&self.children)
            .components
            .insert(name.to_string(), component);
    }

    pub fn get_component(&self, name: &str) -> Result<Component, EngineError> {
        read(&self.children)
            .components
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::not_found(LookupKind::Component, name))
    }

    pub fn remove_component(&self, name: &str) -> Option<Component> {
        write(&self.children).components.remove(name)
    }

    /// Immediate child components, ordered by name
    pub fn get_components(&self) -> Vec<Component> {
        read(&self.children).components.values().cloned().collect()
    }

    /// Insert `submodule` under `name`, replacing any submodule already there.
    ///
    /// Fails with `CyclicComposition` if `submodule` is this module or already
    /// contains it. Concurrent calls are serialized, so two threads cannot
    /// each insert one half of a cycle.
    pub fn add_submodule(&self, name: &str, submodule: Module) -> Result<(), EngineError> {
        let _composing = lock(&COMPOSITION);
        // Checked before taking our own write lock: the walk reads every descendant.
        if submodule.ptr_eq(self) || submodule.contains_module(self) {
            return Err(EngineError::CyclicComposition {
                name: name.to_string(),
            });
        }
        write(&self.children)
            .submodules
            .insert(name.to_string(), submodule);
        Ok(())
    }

    pub fn get_submodule(&self, name: &str) -> Result<Module, EngineError> {
        read(&self.children)
            .submodules
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::not_found(LookupKind::Submodule, name))
    }

    pub fn remove_submodule(&self, name: &str) -> Option<Module> {
        write(&self.children).submodules.remove(name)
    }

    /// Immediate child modules, ordered by name
    pub fn get_submodules(&self) -> Vec<Module> {
        read(&self.children).submodules.values().cloned().collect()
    }

    /// Every module nested below this one, depth first
    pub fn get_all_submodules(&self) -> Vec<Module> {
        let mut all = Vec::new();
        for submodule in self.get_submodules() {
            let nested = submodule.get_all_submodules();
            all.push(submodule);
            all.extend(nested);
        }
        all
    }

    /// Whether `other` appears anywhere below this module
    pub fn contains_module(&self, other: &Module) -> bool {
        self.get_submodules()
            .iter()
            .any(|child| child.ptr_eq(other) || child.contains_module(other))
    }

    /// Depth-first flattening of every component owned by this module or its descendants.
    ///
    /// A component registered under several names or modules appears once.
    pub fn get_all_components(&self) -> Vec<Component> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        self.collect_components(&mut seen, &mut all);
        all
    }

    fn collect_components(&self, seen: &mut HashSet<ComponentId>, all: &mut Vec<Component>) {
        for component in self.get_components() {
            if seen.insert(component.id()) {
                all.push(component);
            } else {
                warn!("{} is registered more than once; scheduling it once", component.id());
            }
        }
        for submodule in self.get_submodules() {
            submodule.collect_components(seen, all);
        }
    }

    /// Whether both handles refer to the same module
    pub fn ptr_eq(&self, other: &Module) -> bool {
        Arc::ptr_eq(&self.children, &other.children)
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Module {
    type Target = Unit;

    fn deref(&self) -> &Unit {
        &self.unit
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children = read(&self.children);
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("unit", &self.unit)
            .field("components", &children.components.keys().collect::<Vec<_>>())
            .field("submodules", &children.submodules.keys().collect::<Vec<_>>())
            .finish()
    }
}
