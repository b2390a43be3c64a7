//! Deferred structural changes.
//!
//! Components cannot attach or detach while a mapper is being swept. They
//! record the change here instead and the world applies the queue, in record
//! order, at the next maintenance point.

use crate::component::{Component, ComponentType};
use crate::entity::EntityHandle;
use crate::world::World;

type AttachFn = Box<dyn FnOnce(&mut World) -> bool>;

/// A structural change waiting for the next maintenance point.
pub(crate) enum Command {
    /// Attach a component to a live entity.
    Attach {
        entity: EntityHandle,
        component: ComponentType,
        apply: AttachFn,
    },
    /// Drop a component from an entity.
    Detach {
        entity: EntityHandle,
        component: ComponentType,
    },
}

impl Command {
    pub fn entity(&self) -> EntityHandle {
        match self {
            Command::Attach { entity, .. } | Command::Detach { entity, .. } => *entity,
        }
    }

    pub fn component(&self) -> ComponentType {
        match self {
            Command::Attach { component, .. } | Command::Detach { component, .. } => *component,
        }
    }
}

/// Ordered queue of deferred commands.
#[derive(Default)]
pub(crate) struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    pub fn attach<T: Component>(&mut self, entity: EntityHandle, value: T) {
        self.commands.push(Command::Attach {
            entity,
            component: ComponentType::of::<T>(),
            apply: Box::new(move |world: &mut World| world.attach_component(entity, value)),
        });
    }

    pub fn detach<T: Component>(&mut self, entity: EntityHandle) {
        self.commands.push(Command::Detach {
            entity,
            component: ComponentType::of::<T>(),
        });
    }

    /// Take every queued command, in record order.
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of queued commands touching component type `id`.
    #[cfg(test)]
    pub fn count_for(&self, id: std::any::TypeId) -> usize {
        self.commands
            .iter()
            .filter(|command| command.component().id() == id)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;

    struct Marker;
    impl Component for Marker {}

    #[test]
    fn commands_keep_record_order() {
        let mut queue = CommandQueue::default();
        let a = EntityHandle::from_raw(0, 0);
        let b = EntityHandle::from_raw(1, 0);
        queue.attach(a, Marker);
        queue.detach::<Marker>(b);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.count_for(TypeId::of::<Marker>()), 2);

        let drained = queue.drain();
        assert!(queue.is_empty());
        assert!(matches!(drained[0], Command::Attach { .. }));
        assert_eq!(drained[0].entity(), a);
        assert!(matches!(drained[1], Command::Detach { .. }));
        assert_eq!(drained[1].entity(), b);
    }
}
