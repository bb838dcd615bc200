use super::behavior::{Behavior, FireResult};
use super::component::Component;
use crate::core::errors::{EngineError, LookupKind};
use crate::core::sync::{read, write};
use crate::core::values::ValueMap;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, RwLock};

#[derive(Clone)]
struct Member {
    priority: i32,
    component: Component,
}

type Members = Arc<RwLock<BTreeMap<String, Member>>>;

/// Runs every member through input, fire and output, lowest priority first
struct MemberSequence {
    members: Members,
}

impl MemberSequence {
    fn run(&self, times: Option<(f64, f64)>, states: &ValueMap) -> FireResult {
        for member in ordered(&self.members) {
            let (input_time, output_time) = times
                .unwrap_or_else(|| (member.last_input_time(), member.last_output_time()));
            member.input(input_time)?;
            member.fire()?;
            member.output(output_time)?;
        }
        Ok((ValueMap::new(), states.clone()))
    }
}

impl Behavior for MemberSequence {
    /// Without a clock, members run at their own latest times
    fn fire(&self, _inputs: &ValueMap, states: &ValueMap) -> FireResult {
        self.run(None, states)
    }

    fn fire_at(
        &self,
        input_time: f64,
        output_time: f64,
        _inputs: &ValueMap,
        states: &ValueMap,
    ) -> FireResult {
        self.run(Some((input_time, output_time)), states)
    }
}

fn ordered(members: &Members) -> Vec<Component> {
    let members = read(members);
    let mut entries: Vec<(&String, &Member)> = members.iter().collect();
    // Stable sort: equal priorities keep name order
    entries.sort_by_key(|(_, member)| member.priority);
    entries
        .into_iter()
        .map(|(_, member)| member.component.clone())
        .collect()
}

/// A component that fires a group of member components one after another.
///
/// When the set fires, each member runs `input`, `fire` and `output` in turn,
/// ordered by ascending priority (ties by name), using the set's own input
/// and output times. A member therefore sees, within the same step, whatever
/// an earlier member published. Members should not also be registered with
/// the agent, or they would run twice per step.
///
/// A set must not contain itself, directly or through another set.
#[derive(Clone)]
pub struct ComponentSet {
    component: Component,
    members: Members,
}

impl ComponentSet {
    pub fn new() -> Self {
        let members: Members = Arc::default();
        let component = Component::new(MemberSequence {
            members: Arc::clone(&members),
        });
        Self { component, members }
    }

    /// Insert `component` under `name` with `priority`, replacing any member
    /// already there
    pub fn add_component(
        &self,
        name: &str,
        component: Component,
        priority: i32,
    ) -> Result<(), EngineError> {
        if component.ptr_eq(&self.component) {
            return Err(EngineError::CyclicComposition {
                name: name.to_string(),
            });
        }
        write(&self.members).insert(
            name.to_string(),
            Member {
                priority,
                component,
            },
        );
        Ok(())
    }

    pub fn get_component(&self, name: &str) -> Result<Component, EngineError> {
        read(&self.members)
            .get(name)
            .map(|member| member.component.clone())
            .ok_or_else(|| EngineError::not_found(LookupKind::Component, name))
    }

    pub fn remove_component(&self, name: &str) -> Option<Component> {
        write(&self.members)
            .remove(name)
            .map(|member| member.component)
    }

    pub fn priority(&self, name: &str) -> Option<i32> {
        read(&self.members).get(name).map(|member| member.priority)
    }

    /// Members in firing order
    pub fn get_components(&self) -> Vec<Component> {
        ordered(&self.members)
    }

    /// The component that stands for this set in a module
    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn into_component(self) -> Component {
        self.component
    }
}

impl Default for ComponentSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ComponentSet {
    type Target = Component;

    fn deref(&self) -> &Component {
        &self.component
    }
}

impl From<ComponentSet> for Component {
    fn from(set: ComponentSet) -> Self {
        set.component
    }
}

impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = read(&self.members);
        f.debug_struct("ComponentSet")
            .field("component", &self.component)
            .field(
                "members",
                &members
                    .iter()
                    .map(|(name, member)| (name.as_str(), member.priority))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ports::connect;

    /// Adds one to input `x` and publishes it as `y`
    fn increment() -> Component {
        let component = Component::new(|inputs: &ValueMap, states: &ValueMap| -> FireResult {
            let x = *inputs.require_as::<i32>("x")?;
            let mut outputs = ValueMap::new();
            outputs.set("y", x + 1);
            Ok((outputs, states.clone()))
        });
        component.make_in_port::<i32>("x");
        component.make_out_port::<i32>("y");
        component
    }

    #[test]
    fn test_members_fire_in_priority_order() {
        let first = increment();
        let second = increment();
        let third = increment();
        connect(&first, "y", &second, "x").unwrap();
        connect(&second, "y", &third, "x").unwrap();

        let set = ComponentSet::new();
        // names deliberately out of priority order
        set.add_component("c", first.clone(), 0).unwrap();
        set.add_component("b", second.clone(), 1).unwrap();
        set.add_component("a", third.clone(), 2).unwrap();
        let order = set.get_components();
        assert!(order[0].ptr_eq(&first));
        assert!(order[2].ptr_eq(&third));

        set.input(1.0).unwrap();
        set.fire().unwrap();
        // 0 -> 1 -> 2 -> 3 within a single firing
        let out = third.get_out_port("y").unwrap().get_buffer();
        assert_eq!(out.cloned::<i32>().unwrap(), 3);
        assert_eq!(first.last_input_time(), 1.0);
        assert_eq!(first.last_output_time(), 0.0);
    }

    #[test]
    fn test_equal_priorities_fire_by_name() {
        let set = ComponentSet::new();
        let (x, y) = (increment(), increment());
        set.add_component("y", y.clone(), 5).unwrap();
        set.add_component("x", x.clone(), 5).unwrap();
        let order = set.get_components();
        assert!(order[0].ptr_eq(&x));
        assert!(order[1].ptr_eq(&y));
        assert_eq!(set.priority("y"), Some(5));
    }

    #[test]
    fn test_set_rejects_itself() {
        let set = ComponentSet::new();
        let err = set
            .add_component("me", set.component().clone(), 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::CyclicComposition { .. }));
    }

    #[test]
    fn test_member_lookup_and_removal() {
        let set = ComponentSet::new();
        let member = increment();
        set.add_component("m", member.clone(), 0).unwrap();
        assert!(set.get_component("m").unwrap().ptr_eq(&member));
        assert!(set.remove_component("m").unwrap().ptr_eq(&member));
        assert!(matches!(
            set.get_component("m"),
            Err(EngineError::NotFound { kind: LookupKind::Component, .. })
        ));
        assert!(set.priority("m").is_none());
    }

    #[test]
    fn test_member_errors_surface_from_the_set() {
        let set = ComponentSet::new();
        let member = increment();
        // an inputs entry with no port behind it
        member.remove_in_port("x");
        member.set_input("x", 1i32);
        set.add_component("m", member, 0).unwrap();
        assert!(matches!(
            set.fire(),
            Err(EngineError::NotFound { kind: LookupKind::InPort, .. })
        ));
    }
}
