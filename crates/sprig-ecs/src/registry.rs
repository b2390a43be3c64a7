use std::any::TypeId;
use std::collections::HashMap;

use crate::component::{Component, ComponentMapper, ComponentStorage, ComponentType};
use crate::entity::EntityHandle;
use crate::world::World;

/// Per-type sweep entry points, monomorphized at registration.
#[derive(Clone, Copy)]
pub(crate) struct SweepHooks {
    pub init: fn(&mut World, usize),
    pub update: fn(&mut World, usize, f32),
}

/// Owns every component mapper, keyed by type, plus the two capability
/// dispatch lists built at registration time.
pub(crate) struct ComponentRegistry {
    capacity: usize,
    /// Mappers in registration order.
    storages: Vec<Box<dyn ComponentStorage>>,
    hooks: Vec<SweepHooks>,
    types: Vec<ComponentType>,
    by_type: HashMap<TypeId, usize>,
    updaters: Vec<usize>,
    renderers: Vec<usize>,
}

impl ComponentRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            storages: Vec::new(),
            hooks: Vec::new(),
            types: Vec::new(),
            by_type: HashMap::new(),
            updaters: Vec::new(),
            renderers: Vec::new(),
        }
    }

    /// Add a mapper for `T`. Returns `false` if `T` was already registered.
    pub fn register<T: Component>(&mut self) -> bool {
        let id = TypeId::of::<T>();
        if self.by_type.contains_key(&id) {
            return false;
        }
        let slot = self.storages.len();
        self.storages
            .push(Box::new(ComponentMapper::<T>::with_capacity(self.capacity)));
        self.hooks.push(SweepHooks {
            init: World::init_mapper::<T>,
            update: World::update_mapper::<T>,
        });
        self.types.push(ComponentType::of::<T>());
        self.by_type.insert(id, slot);
        if T::UPDATES {
            self.updaters.push(slot);
        }
        if T::RENDERS {
            self.renderers.push(slot);
        }
        true
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    pub fn mapper<T: Component>(&self) -> Option<&ComponentMapper<T>> {
        self.storage(TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentMapper<T>>()
    }

    pub fn mapper_mut<T: Component>(&mut self) -> Option<&mut ComponentMapper<T>> {
        self.storage_mut(TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentMapper<T>>()
    }

    pub fn storage(&self, id: TypeId) -> Option<&dyn ComponentStorage> {
        let slot = *self.by_type.get(&id)?;
        self.storage_at(slot)
    }

    pub fn storage_mut(&mut self, id: TypeId) -> Option<&mut (dyn ComponentStorage + 'static)> {
        let slot = *self.by_type.get(&id)?;
        self.storages.get_mut(slot).map(|storage| &mut **storage)
    }

    pub fn storage_at(&self, slot: usize) -> Option<&dyn ComponentStorage> {
        self.storages.get(slot).map(|storage| &**storage)
    }

    /// The mapper registered at `slot`, if it stores `T`.
    pub fn mapper_at<T: Component>(&self, slot: usize) -> Option<&ComponentMapper<T>> {
        self.storages.get(slot)?.as_any().downcast_ref()
    }

    pub fn mapper_at_mut<T: Component>(&mut self, slot: usize) -> Option<&mut ComponentMapper<T>> {
        self.storages.get_mut(slot)?.as_any_mut().downcast_mut()
    }

    pub(crate) fn hooks(&self, slot: usize) -> Option<SweepHooks> {
        self.hooks.get(slot).copied()
    }

    /// Drop `handle`'s component of every registered type.
    pub fn remove_entity(&mut self, handle: EntityHandle) {
        for storage in &mut self.storages {
            storage.remove(handle);
        }
    }

    pub fn updaters(&self) -> &[usize] {
        &self.updaters
    }

    pub fn renderers(&self) -> &[usize] {
        &self.renderers
    }

    /// Registered types in registration order.
    pub fn types(&self) -> &[ComponentType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.storages.len()
    }
}
