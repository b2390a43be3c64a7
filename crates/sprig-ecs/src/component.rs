use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::context::{RenderContext, UpdateContext};
use crate::entity::EntityHandle;
use crate::render::RenderTarget;
use crate::world::World;

/// A typed data/behavior fragment attached to at most one entity per type.
///
/// The two capabilities are declared with `UPDATES` and `RENDERS` and read
/// once when the type is registered. A type that sets `UPDATES` receives one
/// [`Component::update`] call per simulation step; a type that sets `RENDERS`
/// receives one [`Component::render`] call per frame.
pub trait Component: 'static {
    const UPDATES: bool = false;
    const RENDERS: bool = false;

    /// Called once when the world starts, or right away when attached to a
    /// running world.
    fn init(&mut self, _ctx: &mut UpdateContext<'_>) {}

    fn update(&mut self, _ctx: &mut UpdateContext<'_>, _dt: f32) {}

    fn render(&self, _ctx: &RenderContext<'_>, _target: &mut dyn RenderTarget) {}
}

/// Stable identifier of a component type, used to build queries.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
}

impl ComponentType {
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased component storage interface.
pub(crate) trait ComponentStorage: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove(&mut self, handle: EntityHandle) -> bool;
    fn contains(&self, handle: EntityHandle) -> bool;
    fn active(&self) -> &[EntityHandle];
    fn render_all(&self, world: &World, target: &mut dyn RenderTarget);
}

/// Dense storage for one component type.
///
/// Values live in `slots`, indexed by entity slot index and sized to the world
/// capacity. `active` lists the owning handles in insertion order (perturbed
/// only by removals) and `positions` maps a slot to its place in `active` for
/// O(1) membership checks.
pub struct ComponentMapper<T> {
    slots: Vec<Option<T>>,
    positions: Vec<Option<usize>>,
    active: Vec<EntityHandle>,
}

impl<T: Component> ComponentMapper<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            positions: vec![None; capacity],
            active: Vec::new(),
        }
    }

    /// Whether this exact handle currently owns a component here.
    pub fn contains(&self, handle: EntityHandle) -> bool {
        handle
            .slot()
            .and_then(|slot| self.positions.get(slot).copied().flatten())
            .map_or(false, |position| self.active[position] == handle)
    }

    /// Store a component for `handle`. Returns `false` without touching the
    /// existing value if the handle already has one.
    pub(crate) fn attach(&mut self, handle: EntityHandle, value: T) -> bool {
        let Some(slot) = handle.slot().filter(|&slot| slot < self.slots.len()) else {
            return false;
        };
        if self.positions[slot].is_some() {
            return false;
        }
        self.slots[slot] = Some(value);
        self.positions[slot] = Some(self.active.len());
        self.active.push(handle);
        true
    }

    /// Remove and return the component owned by `handle`, if any.
    pub(crate) fn detach(&mut self, handle: EntityHandle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let slot = handle.index as usize;
        let position = self.positions[slot].take()?;

        // Swap-remove: the last active handle takes the freed position.
        self.active.swap_remove(position);
        if let Some(moved) = self.active.get(position) {
            self.positions[moved.index as usize] = Some(position);
        }
        self.slots[slot].take()
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&T> {
        if !self.contains(handle) {
            return None;
        }
        self.slots[handle.index as usize].as_ref()
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        if !self.contains(handle) {
            return None;
        }
        self.slots[handle.index as usize].as_mut()
    }

    /// Visit every active component in active-set order.
    pub fn for_each_active(&self, mut f: impl FnMut(EntityHandle, &T)) {
        for &owner in &self.active {
            if let Some(value) = self.slots[owner.index as usize].as_ref() {
                f(owner, value);
            }
        }
    }

    /// Visit every active component mutably in active-set order.
    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(EntityHandle, &mut T)) {
        let Self { slots, active, .. } = self;
        for &owner in active.iter() {
            if let Some(value) = slots[owner.index as usize].as_mut() {
                f(owner, value);
            }
        }
    }

    /// Handles that currently own a component of this type.
    pub fn active(&self) -> &[EntityHandle] {
        &self.active
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Move out the value at `position` in the active list, leaving its owner
    /// registered. Until [`ComponentMapper::put_back`] the owner reads as
    /// having no value here.
    pub(crate) fn take_at(&mut self, position: usize) -> Option<(EntityHandle, T)> {
        let owner = *self.active.get(position)?;
        let value = self.slots[owner.index as usize].take()?;
        Some((owner, value))
    }

    /// Return a value moved out with [`ComponentMapper::take_at`].
    pub(crate) fn put_back(&mut self, owner: EntityHandle, value: T) {
        if self.contains(owner) {
            self.slots[owner.index as usize] = Some(value);
        }
    }

    /// Components for `entities`, which must be sorted by ascending index.
    /// `None` if any of them no longer owns a component here.
    pub(crate) fn fetch_sorted(&self, entities: &[EntityHandle]) -> Option<Vec<&T>> {
        entities.iter().map(|&handle| self.get(handle)).collect()
    }

    /// Mutable counterpart of [`ComponentMapper::fetch_sorted`].
    pub(crate) fn fetch_sorted_mut(&mut self, entities: &[EntityHandle]) -> Option<Vec<&mut T>> {
        if !entities.iter().all(|&handle| self.contains(handle)) {
            return None;
        }
        crate::query::pick_sorted_mut(&mut self.slots, entities)?
            .into_iter()
            .map(Option::as_mut)
            .collect()
    }
}

impl<T: Component> ComponentStorage for ComponentMapper<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove(&mut self, handle: EntityHandle) -> bool {
        self.detach(handle).is_some()
    }

    fn contains(&self, handle: EntityHandle) -> bool {
        ComponentMapper::contains(self, handle)
    }

    fn active(&self) -> &[EntityHandle] {
        &self.active
    }

    fn render_all(&self, world: &World, target: &mut dyn RenderTarget) {
        self.for_each_active(|owner, value| {
            let ctx = RenderContext::new(owner, world);
            value.render(&ctx, target);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tag(char);

    impl Component for Tag {}

    fn handle(index: i32) -> EntityHandle {
        EntityHandle::from_raw(index, 0)
    }

    #[test]
    fn attach_and_get() {
        let mut mapper = ComponentMapper::with_capacity(8);
        assert!(mapper.attach(handle(5), Tag('a')));
        assert_eq!(mapper.get(handle(5)), Some(&Tag('a')));
        assert_eq!(mapper.get(handle(0)), None);
    }

    #[test]
    fn duplicate_attach_keeps_original() {
        let mut mapper = ComponentMapper::with_capacity(4);
        assert!(mapper.attach(handle(0), Tag('a')));
        assert!(!mapper.attach(handle(0), Tag('b')));
        assert_eq!(mapper.get(handle(0)), Some(&Tag('a')));
        assert_eq!(mapper.len(), 1);
    }

    #[test]
    fn stale_generation_not_contained() {
        let mut mapper = ComponentMapper::with_capacity(4);
        mapper.attach(handle(2), Tag('a'));
        assert!(!mapper.contains(EntityHandle::from_raw(2, 1)));
        assert_eq!(mapper.get(EntityHandle::from_raw(2, 1)), None);
        assert_eq!(mapper.detach(EntityHandle::from_raw(2, 1)), None);
    }

    #[test]
    fn detach_and_swap() {
        let mut mapper = ComponentMapper::with_capacity(4);
        mapper.attach(handle(0), Tag('a'));
        mapper.attach(handle(1), Tag('b'));
        mapper.attach(handle(2), Tag('c'));
        assert_eq!(mapper.detach(handle(0)), Some(Tag('a')));
        assert_eq!(mapper.get(handle(0)), None);
        assert_eq!(mapper.get(handle(1)), Some(&Tag('b')));
        assert_eq!(mapper.get(handle(2)), Some(&Tag('c')));
        assert_eq!(mapper.active(), &[handle(2), handle(1)]);
        assert_eq!(mapper.detach(handle(0)), None);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut mapper = ComponentMapper::with_capacity(32);
        mapper.attach(handle(20), Tag('x'));
        mapper.attach(handle(10), Tag('y'));
        let mut seen = Vec::new();
        mapper.for_each_active(|owner, tag| seen.push((owner.index(), tag.0)));
        assert_eq!(seen, vec![(20, 'x'), (10, 'y')]);
    }

    #[test]
    fn taken_value_hides_only_its_owner() {
        let mut mapper = ComponentMapper::with_capacity(4);
        mapper.attach(handle(0), Tag('a'));
        mapper.attach(handle(1), Tag('b'));

        let (owner, value) = mapper.take_at(1).unwrap();
        assert_eq!(owner, handle(1));
        assert_eq!(value, Tag('b'));
        assert!(mapper.contains(handle(1)));
        assert_eq!(mapper.get(handle(1)), None);
        assert_eq!(mapper.get(handle(0)), Some(&Tag('a')));
        assert!(mapper.take_at(1).is_none());

        mapper.put_back(owner, value);
        assert_eq!(mapper.get(handle(1)), Some(&Tag('b')));
        assert_eq!(mapper.active(), &[handle(0), handle(1)]);
    }

    #[test]
    fn fetch_sorted_mut_rejects_missing() {
        let mut mapper = ComponentMapper::with_capacity(8);
        mapper.attach(handle(1), Tag('a'));
        mapper.attach(handle(4), Tag('b'));
        let fetched = mapper.fetch_sorted_mut(&[handle(1), handle(4)]).unwrap();
        assert_eq!(fetched.len(), 2);
        assert!(mapper.fetch_sorted_mut(&[handle(1), handle(3)]).is_none());
    }
}
