//! Views of the world handed to component hooks.
//!
//! Components never own a reference to the world. Instead each hook receives a
//! context naming the owning entity and exposing the lookups a component may
//! need. Structural changes requested from inside a sweep are queued and
//! applied at the next [`World::maintain`](crate::World::maintain).

use std::collections::HashMap;

use sprig_core::{TimeResource, Transform};
use tracing::warn;

use crate::command::CommandQueue;
use crate::component::Component;
use crate::entity::{EntityArena, EntityHandle};
use crate::registry::ComponentRegistry;
use crate::resource::Resources;
use crate::world::World;

/// Mutable view passed to [`Component::init`] and [`Component::update`].
///
/// The component being called is moved out of its mapper for the duration of
/// the call, so looking up the owner's own component of that type returns
/// `None`. Every other entity's components stay visible.
pub struct UpdateContext<'w> {
    pub(crate) owner: EntityHandle,
    pub(crate) entities: &'w mut EntityArena,
    pub(crate) transforms: &'w mut [Transform],
    pub(crate) components: &'w ComponentRegistry,
    pub(crate) resources: &'w Resources,
    pub(crate) tags: &'w HashMap<String, EntityHandle>,
    pub(crate) commands: &'w mut CommandQueue,
}

impl<'w> UpdateContext<'w> {
    /// The entity owning the component being called.
    pub fn owner(&self) -> EntityHandle {
        self.owner
    }

    /// The owner's transform.
    pub fn transform(&self) -> &Transform {
        &self.transforms[self.owner.index as usize]
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transforms[self.owner.index as usize]
    }

    /// Another entity's transform, `None` if the handle is not live.
    pub fn transform_of(&self, handle: EntityHandle) -> Option<&Transform> {
        if !self.entities.is_live(handle) {
            return None;
        }
        self.transforms.get(handle.index as usize)
    }

    pub fn is_live(&self, handle: EntityHandle) -> bool {
        self.entities.is_live(handle)
    }

    /// A component of another type on `handle`.
    pub fn component<T: Component>(&self, handle: EntityHandle) -> Option<&T> {
        if !self.entities.is_live(handle) {
            return None;
        }
        self.components.mapper::<T>()?.get(handle)
    }

    pub fn resource<R: 'static>(&self) -> Option<&R> {
        self.resources.get::<R>()
    }

    pub fn time(&self) -> Option<&TimeResource> {
        self.resources.get::<TimeResource>()
    }

    pub fn tagged_entity(&self, name: &str) -> EntityHandle {
        self.tags.get(name).copied().unwrap_or(EntityHandle::NULL)
    }

    /// Queue `handle` for deletion at the next maintenance point.
    pub fn delete_entity(&mut self, handle: EntityHandle) -> bool {
        self.entities.queue_delete(handle)
    }

    /// Queue the owner for deletion at the next maintenance point.
    pub fn delete_self(&mut self) -> bool {
        self.entities.queue_delete(self.owner)
    }

    /// Queue attaching `component` to `handle` at the next maintenance point.
    pub fn attach<T: Component>(&mut self, handle: EntityHandle, component: T) -> bool {
        if !self.entities.is_live(handle) {
            warn!("Tried to queue a component for non active entity {handle:?}");
            return false;
        }
        self.commands.attach(handle, component);
        true
    }

    /// Queue detaching `T` from `handle` at the next maintenance point.
    pub fn detach<T: Component>(&mut self, handle: EntityHandle) -> bool {
        if !self.entities.is_live(handle) {
            warn!("Tried to queue a detach for non active entity {handle:?}");
            return false;
        }
        self.commands.detach::<T>(handle);
        true
    }
}

/// Read-only view passed to [`Component::render`].
pub struct RenderContext<'w> {
    owner: EntityHandle,
    world: &'w World,
}

impl<'w> RenderContext<'w> {
    pub(crate) fn new(owner: EntityHandle, world: &'w World) -> Self {
        Self { owner, world }
    }

    pub fn owner(&self) -> EntityHandle {
        self.owner
    }

    pub fn transform(&self) -> &'w Transform {
        &self.world.transforms()[self.owner.index as usize]
    }

    pub fn transform_of(&self, handle: EntityHandle) -> Option<&'w Transform> {
        self.world.transform(handle)
    }

    pub fn component<T: Component>(&self, handle: EntityHandle) -> Option<&'w T> {
        self.world.component::<T>(handle)
    }

    pub fn resource<R: 'static>(&self) -> Option<&'w R> {
        self.world.resource::<R>()
    }

    pub fn time(&self) -> Option<&'w TimeResource> {
        self.world.time()
    }

    pub fn world(&self) -> &'w World {
        self.world
    }
}
