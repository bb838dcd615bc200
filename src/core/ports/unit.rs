use super::port::Port;
use crate::core::errors::{EngineError, LookupKind};
use crate::core::sync::{read, write};
use log::trace;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct PortTable {
    in_ports: BTreeMap<String, Port>,
    out_ports: BTreeMap<String, Port>,
}

/// Handle to a named set of input ports and output ports.
///
/// Input and output ids live in separate namespaces. Cloning a `Unit` clones
/// the handle, so ports created through one clone are visible through all.
#[derive(Clone, Default)]
pub struct Unit {
    ports: Arc<RwLock<PortTable>>,
}

impl Unit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input port holding `T::default()`; an existing id is overwritten
    pub fn make_in_port<T: Default + Send + Sync + Clone + 'static>(&self, key: &str) -> Port {
        let port = Port::typed::<T>();
        self.set_in_port(key, port.clone());
        port
    }

    pub fn get_in_port(&self, key: &str) -> Result<Port, EngineError> {
        read(&self.ports)
            .in_ports
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::not_found(LookupKind::InPort, key))
    }

    /// Install `port` under `key`, replacing any port already there
    pub fn set_in_port(&self, key: &str, port: Port) {
        write(&self.ports).in_ports.insert(key.to_string(), port);
    }

    pub fn remove_in_port(&self, key: &str) -> Option<Port> {
        write(&self.ports).in_ports.remove(key)
    }

    pub fn has_in_port(&self, key: &str) -> bool {
        read(&self.ports).in_ports.contains_key(key)
    }

    pub fn in_port_ids(&self) -> Vec<String> {
        read(&self.ports).in_ports.keys().cloned().collect()
    }

    /// Expose `from_unit`'s input port `from_id` as this unit's input `to_id`.
    ///
    /// Both units then hold the same port.
    pub fn alias_in_port(&self, from_unit: &Unit, from_id: &str, to_id: &str) -> Result<(), EngineError> {
        let port = from_unit.get_in_port(from_id)?;
        trace!("aliasing input port '{}' as '{}'", from_id, to_id);
        self.set_in_port(to_id, port);
        Ok(())
    }

    /// Create an output port holding `T::default()`; an existing id is overwritten
    pub fn make_out_port<T: Default + Send + Sync + Clone + 'static>(&self, key: &str) -> Port {
        let port = Port::typed::<T>();
        self.set_out_port(key, port.clone());
        port
    }

    pub fn get_out_port(&self, key: &str) -> Result<Port, EngineError> {
        read(&self.ports)
            .out_ports
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::not_found(LookupKind::OutPort, key))
    }

    pub fn set_out_port(&self, key: &str, port: Port) {
        write(&self.ports).out_ports.insert(key.to_string(), port);
    }

    pub fn remove_out_port(&self, key: &str) -> Option<Port> {
        write(&self.ports).out_ports.remove(key)
    }

    pub fn has_out_port(&self, key: &str) -> bool {
        read(&self.ports).out_ports.contains_key(key)
    }

    pub fn out_port_ids(&self) -> Vec<String> {
        read(&self.ports).out_ports.keys().cloned().collect()
    }

    /// Expose `from_unit`'s output port `from_id` as this unit's output `to_id`
    pub fn alias_out_port(&self, from_unit: &Unit, from_id: &str, to_id: &str) -> Result<(), EngineError> {
        let port = from_unit.get_out_port(from_id)?;
        trace!("aliasing output port '{}' as '{}'", from_id, to_id);
        self.set_out_port(to_id, port);
        Ok(())
    }

    /// Bind this unit's input `to_id` to pull from `from_unit`'s output `from_id`
    pub fn connect(&self, from_unit: &Unit, from_id: &str, to_id: &str) -> Result<(), EngineError> {
        let from = from_unit.get_out_port(from_id)?;
        let to = self.get_in_port(to_id)?;
        trace!("connecting output '{}' -> input '{}'", from_id, to_id);
        to.connect(&from);
        Ok(())
    }

    /// Whether both handles refer to the same unit
    pub fn ptr_eq(&self, other: &Unit) -> bool {
        Arc::ptr_eq(&self.ports, &other.ports)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = read(&self.ports);
        f.debug_struct("Unit")
            .field("in_ports", &table.in_ports.keys().collect::<Vec<_>>())
            .field("out_ports", &table.out_ports.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// [`Unit::connect`] in "from -> to" reading order
pub fn connect(from: &Unit, from_id: &str, to: &Unit, to_id: &str) -> Result<(), EngineError> {
    to.connect(from, from_id, to_id)
}
