//! Pushes prototype edits down to heirs.
//!
//! When a variable changes on a component, every object inheriting from the
//! component's owner receives the new value on its first component of the
//! same type, unless:
//!
//! - the heir divorced the variable, or
//! - the heir's value no longer equals the old prototype value. Such an heir
//!   diverged without being divorced; it is left untouched and a warning is
//!   logged.
//!
//! Only the first component of the type takes part, so an heir with two
//! `Light`s keeps its second one to itself. Values are copied as they are:
//! a `ComponentRef` that points at one of the prototype's own components
//! still points there on the heir, not at the heir's copy of it.
//!
//! Skipped heirs are still walked, so their own heirs keep receiving
//! updates. Heirs that take the value go through the regular edit path,
//! which carries the change further down the chain.

use std::collections::HashSet;

use crate::edit::{SetOptions, WriteOrigin};
use crate::ids::{ComponentId, GameObjectId};
use crate::value::Value;
use crate::variable::VariableDescriptor;
use crate::world::World;

struct Change<'a> {
    type_name: &'static str,
    descriptor: &'a VariableDescriptor,
    old: &'a Value,
    new: &'a Value,
    finished: bool,
}

pub(crate) fn propagate(
    world: &mut World,
    source: ComponentId,
    descriptor: &VariableDescriptor,
    old: &Value,
    new: &Value,
    finished: bool,
    visited: &mut HashSet<ComponentId>,
) {
    let Some(instance) = world.component(source) else {
        return;
    };
    let prototype = instance.owner();
    let change = Change {
        type_name: instance.type_name(),
        descriptor,
        old,
        new,
        finished,
    };
    cascade(world, prototype, &change, visited, false);
}

/// `lenient` is set below a skipped heir, where values that differ from
/// the old prototype value are expected.
fn cascade(
    world: &mut World,
    prototype: GameObjectId,
    change: &Change<'_>,
    visited: &mut HashSet<ComponentId>,
    lenient: bool,
) {
    let variable = change.descriptor.name();
    for heir in world.heirs_of(prototype) {
        let Some(target) = world
            .object(heir)
            .and_then(|o| o.first_component_of_type(change.type_name))
            .map(|c| c.id())
        else {
            log::warn!(
                "{heir} inherits from {prototype} but has no '{}' component",
                change.type_name
            );
            cascade(world, heir, change, visited, true);
            continue;
        };
        if !visited.insert(target) {
            log::warn!("propagation of '{variable}' reached {target} twice; stopping there");
            continue;
        }

        let Some(instance) = world.component(target) else {
            continue;
        };
        if instance.divorce_tracker().is_divorced(change.descriptor.index()) {
            log::trace!("'{variable}' is divorced on {target}; skipping");
            cascade(world, heir, change, visited, true);
            continue;
        }

        let current = instance.read(change.descriptor);
        if !current.as_ref().is_some_and(|v| v.matches(change.old)) {
            if lenient {
                log::debug!("'{variable}' on {target} differs below an override; skipping");
            } else {
                log::warn!(
                    "'{variable}' on {target} diverged from its prototype without being divorced \
                     ({current:?} != {:?}); skipping",
                    change.old
                );
            }
            cascade(world, heir, change, visited, true);
            continue;
        }

        let options = SetOptions {
            changed_by_interface: false,
            finished: change.finished,
        };
        if let Err(err) = world.write_variable(
            target,
            variable,
            change.new.clone(),
            options,
            WriteOrigin::Propagated,
            visited,
        ) {
            log::error!("propagating '{variable}' to {target} failed: {err}");
        }
    }
}
