use std::any::{type_name, Any};
use std::collections::HashMap;

use sprig_core::{TimeResource, Transform, Vec2};
use tracing::{debug, info, trace, warn};

use crate::command::{Command, CommandQueue};
use crate::component::{Component, ComponentMapper, ComponentType};
use crate::config::{ConfigError, WorldConfig};
use crate::context::UpdateContext;
use crate::entity::{EntityArena, EntityHandle};
use crate::query::{self, QueryResult};
use crate::registry::ComponentRegistry;
use crate::render::RenderTarget;
use crate::resource::Resources;
use crate::schedule::FixedStepScheduler;

/// Tag under which every world registers its [`TimeResource`].
pub const TIME_TAG: &str = "Time";

/// The central ECS container. Owns all entities, transforms, components, and
/// resources.
///
/// A frame is driven by the host as `update` → custom passes → `render` →
/// `maintain`. Deletions and structural changes requested during a frame only
/// take effect in `maintain`.
pub struct World {
    config: WorldConfig,
    entities: EntityArena,
    transforms: Vec<Transform>,
    components: ComponentRegistry,
    resources: Resources,
    tags: HashMap<String, EntityHandle>,
    commands: CommandQueue,
    scheduler: FixedStepScheduler,
    running: bool,
}

impl World {
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let capacity = config.max_entities;
        let mut resources = Resources::new();
        let time = TimeResource::new(&config.time, config.fixed_step() as f32);
        resources.register(time, Some(TIME_TAG));

        info!(
            max_entities = capacity,
            fixed_update = config.fixed_update,
            "World created with max entities: {capacity}"
        );

        Ok(Self {
            entities: EntityArena::new(capacity),
            transforms: vec![Transform::default(); capacity],
            components: ComponentRegistry::new(capacity),
            resources,
            tags: HashMap::new(),
            commands: CommandQueue::default(),
            scheduler: FixedStepScheduler::new(config.fixed_update, config.fixed_fps),
            running: false,
            config,
        })
    }

    /// World with default settings and the given capacity.
    pub fn with_capacity(max_entities: usize) -> Result<Self, ConfigError> {
        Self::new(WorldConfig::with_capacity(max_entities))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // ---- Frame ----

    /// Run the `init` hook of every attached component, mappers in
    /// registration order. Only the first call has any effect; components
    /// attached afterwards are initialized as they are attached.
    pub fn init(&mut self) {
        if self.running {
            return;
        }
        for slot in 0..self.components.len() {
            if let Some(hooks) = self.components.hooks(slot) {
                (hooks.init)(self, slot);
            }
        }
        self.running = true;
        info!(
            components = self.components.len(),
            entities = self.entities.len(),
            "World initialized"
        );
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the simulation by one host frame of `delta` seconds.
    ///
    /// With fixed updates disabled this is exactly one updater sweep with the
    /// scaled frame delta. With fixed updates enabled the delta is accumulated
    /// and zero or more sweeps run with the scaled fixed delta. The fixed step
    /// is owned by the scheduler and copied into the time resource here.
    pub fn update(&mut self, delta: f64) {
        if !delta.is_finite() || delta < 0.0 {
            warn!("Ignoring invalid frame delta {delta}");
            return;
        }
        let step = self.scheduler.step() as f32;
        if let Some(time) = self.resources.get_mut::<TimeResource>() {
            time.set_raw_delta(delta as f32);
            time.set_fixed_step(step);
        }

        if !self.scheduler.is_enabled() {
            let dt = self.time().map_or(delta as f32, TimeResource::delta);
            self.step_updaters(dt);
            return;
        }

        let steps = self.scheduler.advance(delta);
        let dt = self.time().map_or(step, TimeResource::fixed_delta);
        for _ in 0..steps {
            self.step_updaters(dt);
        }
    }

    /// One sweep: every updatable mapper in registration order, every active
    /// component within it in active-set order.
    pub fn step_updaters(&mut self, dt: f32) {
        for i in 0..self.components.updaters().len() {
            let slot = self.components.updaters()[i];
            if let Some(hooks) = self.components.hooks(slot) {
                (hooks.update)(self, slot, dt);
            }
        }
    }

    /// Call every renderable component, mappers in registration order.
    pub fn render(&self, target: &mut dyn RenderTarget) {
        for &slot in self.components.renderers() {
            if let Some(storage) = self.components.storage_at(slot) {
                storage.render_all(self, target);
            }
        }
    }

    /// Apply deferred structural changes, then flush deferred deletions.
    pub fn maintain(&mut self) {
        for command in self.commands.drain() {
            self.apply(command);
        }

        for handle in self.entities.drain_pending() {
            if !self.entities.is_live(handle) {
                continue;
            }
            self.components.remove_entity(handle);
            self.tags.retain(|_, tagged| *tagged != handle);
            self.transforms[handle.index as usize] = Transform::default();
            self.entities.release(handle);
            debug!("Deleted {handle:?}");
        }
    }

    pub(crate) fn init_mapper<T: Component>(&mut self, slot: usize) {
        self.sweep::<T>(slot, |value, ctx| value.init(ctx));
    }

    pub(crate) fn update_mapper<T: Component>(&mut self, slot: usize, dt: f32) {
        self.sweep::<T>(slot, |value, ctx| value.update(ctx, dt));
    }

    /// Call `hook` on every active `T` in active-set order. Each value is moved
    /// out of its slot for its own call only, so the rest of the mapper stays
    /// readable through the context.
    fn sweep<T: Component>(
        &mut self,
        slot: usize,
        mut hook: impl FnMut(&mut T, &mut UpdateContext<'_>),
    ) {
        let Some(count) = self.components.mapper_at::<T>(slot).map(ComponentMapper::len) else {
            return;
        };
        trace!("Sweeping {} components of type {}", count, type_name::<T>());

        for position in 0..count {
            let taken = self
                .components
                .mapper_at_mut::<T>(slot)
                .and_then(|mapper| mapper.take_at(position));
            let Some((owner, mut value)) = taken else {
                continue;
            };
            let mut ctx = self.update_context(owner);
            hook(&mut value, &mut ctx);
            if let Some(mapper) = self.components.mapper_at_mut::<T>(slot) {
                mapper.put_back(owner, value);
            }
        }
    }

    fn update_context(&mut self, owner: EntityHandle) -> UpdateContext<'_> {
        UpdateContext {
            owner,
            entities: &mut self.entities,
            transforms: &mut self.transforms,
            components: &self.components,
            resources: &self.resources,
            tags: &self.tags,
            commands: &mut self.commands,
        }
    }

    fn apply(&mut self, command: Command) {
        debug!(
            "Applying deferred change of {:?} on {:?}",
            command.component(),
            command.entity()
        );
        match command {
            Command::Attach { apply, .. } => {
                apply(self);
            }
            Command::Detach { entity, component } => {
                if !self.entities.is_live(entity) {
                    return;
                }
                if let Some(storage) = self.components.storage_mut(component.id()) {
                    storage.remove(entity);
                }
            }
        }
    }

    // ---- Scheduler ----

    pub fn is_fixed_update(&self) -> bool {
        self.scheduler.is_enabled()
    }

    /// Switch between fixed and variable updates, discarding accumulated time.
    pub fn set_fixed_update(&mut self, enabled: bool) {
        self.scheduler.set_enabled(enabled);
    }

    /// Change the fixed update rate. Accumulated time is discarded.
    pub fn set_fixed_fps(&mut self, fixed_fps: u32) -> Result<(), ConfigError> {
        if fixed_fps == 0 {
            return Err(ConfigError::ZeroFixedRate);
        }
        self.config.fixed_fps = fixed_fps;
        self.scheduler.set_fixed_fps(fixed_fps);
        let step = self.scheduler.step() as f32;
        if let Some(time) = self.resources.get_mut::<TimeResource>() {
            time.set_fixed_step(step);
        }
        info!("Fixed update rate set to {fixed_fps} steps per second");
        Ok(())
    }

    pub fn frames_without_step(&self) -> u32 {
        self.scheduler.frames_without_step()
    }

    pub fn steps_last_frame(&self) -> u32 {
        self.scheduler.steps_last_frame()
    }

    pub fn debug_update_string(&self) -> String {
        format!(
            "Update FPS: {} - Step: {:.4}s - Steps last frame: {}",
            self.scheduler.fixed_fps(),
            self.scheduler.step(),
            self.scheduler.steps_last_frame()
        )
    }

    // ---- Entity management ----

    /// Create an entity with a default transform. Returns
    /// [`EntityHandle::NULL`] when the world is full.
    pub fn create_entity(&mut self) -> EntityHandle {
        let handle = self.entities.allocate();
        if handle.is_null() {
            warn!("Max entities met ({})", self.entities.capacity());
            return handle;
        }
        self.transforms[handle.index as usize] = Transform::default();
        debug!("Created {handle:?}");
        handle
    }

    pub fn create_entity_with(&mut self, transform: Transform) -> EntityHandle {
        let handle = self.create_entity();
        if let Some(slot) = handle.slot() {
            self.transforms[slot] = transform;
        }
        handle
    }

    pub fn create_entity_at(&mut self, position: Vec2, scale: Vec2, rotation: f32) -> EntityHandle {
        self.create_entity_with(Transform::new(position, scale, rotation))
    }

    /// Request deletion at the next [`World::maintain`]. Components, tags, and
    /// the transform stay in place until then.
    pub fn delete_entity(&mut self, handle: EntityHandle) -> bool {
        self.entities.queue_delete(handle)
    }

    /// Check whether a handle refers to the current occupant of a live slot.
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        self.entities.is_live(handle)
    }

    pub fn is_pending_delete(&self, handle: EntityHandle) -> bool {
        self.entities.is_pending_delete(handle)
    }

    pub fn transform(&self, handle: EntityHandle) -> Option<&Transform> {
        if !self.entities.is_live(handle) {
            debug!("Transform requested for non active entity {handle:?}");
            return None;
        }
        self.transforms.get(handle.index as usize)
    }

    pub fn transform_mut(&mut self, handle: EntityHandle) -> Option<&mut Transform> {
        if !self.entities.is_live(handle) {
            debug!("Transform requested for non active entity {handle:?}");
            return None;
        }
        self.transforms.get_mut(handle.index as usize)
    }

    /// Every transform, indexed by slot. Free slots hold the default.
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut [Transform] {
        &mut self.transforms
    }

    pub fn max_entities(&self) -> usize {
        self.entities.capacity()
    }

    /// Number of live entities, including those pending deletion.
    pub fn active_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn active_handles(&self) -> &[EntityHandle] {
        self.entities.active()
    }

    /// The last handle in the active list, or [`EntityHandle::NULL`].
    pub fn last_active(&self) -> EntityHandle {
        self.entities.last_active()
    }

    /// The live handle at `index`, or [`EntityHandle::NULL`].
    pub fn entity_at_index(&self, index: i32) -> EntityHandle {
        match usize::try_from(index) {
            Ok(slot) => self.entities.handle_at(slot),
            Err(_) => EntityHandle::NULL,
        }
    }

    // ---- Entity tags ----

    /// Alias a live entity under `name`, replacing any previous holder.
    pub fn tag_entity(&mut self, handle: EntityHandle, name: impl Into<String>) -> bool {
        if !self.entities.is_live(handle) {
            warn!("Tried to tag non active entity {handle:?}");
            return false;
        }
        self.tags.insert(name.into(), handle);
        true
    }

    /// The entity tagged `name`, or [`EntityHandle::NULL`].
    pub fn tagged_entity(&self, name: &str) -> EntityHandle {
        self.tags.get(name).copied().unwrap_or(EntityHandle::NULL)
    }

    pub fn untag_entity(&mut self, name: &str) -> bool {
        self.tags.remove(name).is_some()
    }

    // ---- Component management ----

    /// Create the mapper for `T` and file it under the capabilities `T`
    /// declares. Registering a type twice has no effect.
    pub fn register_component<T: Component>(&mut self) -> bool {
        if !self.components.register::<T>() {
            debug!("Component type {} is already registered", type_name::<T>());
            return false;
        }
        info!(
            updates = T::UPDATES,
            renders = T::RENDERS,
            "Registering component of type: {}",
            type_name::<T>()
        );
        true
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.components.is_registered::<T>()
    }

    /// Registered component types in registration order.
    pub fn component_types(&self) -> &[ComponentType] {
        self.components.types()
    }

    /// Attach a component to a live entity, registering `T` on first use.
    ///
    /// An entity already holding a `T` keeps its original instance. If the
    /// world is running, the component's `init` hook runs before it is stored.
    pub fn attach_component<T: Component>(&mut self, handle: EntityHandle, component: T) -> bool {
        if !self.entities.is_live(handle) {
            warn!(
                "Tried to attach {} to non active entity {handle:?}",
                type_name::<T>()
            );
            return false;
        }
        if !self.components.is_registered::<T>() {
            self.register_component::<T>();
        }
        if self.has_component::<T>(handle) {
            warn!(
                "Entity {handle:?} already has component of type: {}",
                type_name::<T>()
            );
            return false;
        }

        let mut component = component;
        if self.running {
            let mut ctx = self.update_context(handle);
            component.init(&mut ctx);
        }
        self.components
            .mapper_mut::<T>()
            .map_or(false, |mapper| mapper.attach(handle, component))
    }

    /// Remove `T` from an entity. Returns `true` if it was present.
    pub fn detach_component<T: Component>(&mut self, handle: EntityHandle) -> bool {
        if !self.entities.is_live(handle) {
            warn!(
                "Tried to detach {} from non active entity {handle:?}",
                type_name::<T>()
            );
            return false;
        }
        self.components
            .mapper_mut::<T>()
            .map_or(false, |mapper| mapper.detach(handle).is_some())
    }

    pub fn component<T: Component>(&self, handle: EntityHandle) -> Option<&T> {
        if !self.entities.is_live(handle) {
            return None;
        }
        self.components.mapper::<T>()?.get(handle)
    }

    pub fn component_mut<T: Component>(&mut self, handle: EntityHandle) -> Option<&mut T> {
        if !self.entities.is_live(handle) {
            return None;
        }
        self.components.mapper_mut::<T>()?.get_mut(handle)
    }

    pub fn has_component<T: Component>(&self, handle: EntityHandle) -> bool {
        self.component::<T>(handle).is_some()
    }

    /// The storage for `T`, for direct iteration.
    pub fn mapper<T: Component>(&self) -> Option<&ComponentMapper<T>> {
        self.components.mapper::<T>()
    }

    pub fn mapper_mut<T: Component>(&mut self) -> Option<&mut ComponentMapper<T>> {
        self.components.mapper_mut::<T>()
    }

    // ---- Queries ----

    /// Entities holding every type in `has` and none in `excludes`.
    ///
    /// # Example
    /// ```ignore
    /// let movers = world.query(&[ComponentType::of::<Mover>()], &[]);
    /// for mover in world.fetch::<Mover>(&movers).unwrap_or_default() {
    ///     // ...
    /// }
    /// ```
    pub fn query(&self, has: &[ComponentType], excludes: &[ComponentType]) -> QueryResult {
        query::run(&self.components, has, excludes)
    }

    /// `T` components of a query result, aligned with `result.entities()`.
    ///
    /// `None` if `T` was not a required type of the query or if the result is
    /// stale (an entity lost its `T` since the query ran).
    pub fn fetch<T: Component>(&self, result: &QueryResult) -> Option<Vec<&T>> {
        if !result.includes::<T>() {
            warn!("{} was not a required type of this query", type_name::<T>());
            return None;
        }
        self.components.mapper::<T>()?.fetch_sorted(result.entities())
    }

    pub fn fetch_mut<T: Component>(&mut self, result: &QueryResult) -> Option<Vec<&mut T>> {
        if !result.includes::<T>() {
            warn!("{} was not a required type of this query", type_name::<T>());
            return None;
        }
        self.components
            .mapper_mut::<T>()?
            .fetch_sorted_mut(result.entities())
    }

    /// Like [`World::fetch_mut`], paired with each entity's transform.
    pub fn fetch_mut_with_transforms<T: Component>(
        &mut self,
        result: &QueryResult,
    ) -> Option<Vec<(&mut T, &mut Transform)>> {
        if !result.includes::<T>() {
            warn!("{} was not a required type of this query", type_name::<T>());
            return None;
        }
        let components = self
            .components
            .mapper_mut::<T>()?
            .fetch_sorted_mut(result.entities())?;
        let transforms = query::pick_sorted_mut(&mut self.transforms, result.entities())?;
        Some(components.into_iter().zip(transforms).collect())
    }

    // ---- Resources ----

    /// Register a singleton resource, optionally tagged. The first
    /// registration of a type wins.
    pub fn register_resource<T: 'static>(&mut self, value: T, tag: Option<&str>) -> bool {
        let registered = self.resources.register(value, tag);
        if !registered {
            debug!("Resource {} is already registered", type_name::<T>());
        }
        registered
    }

    pub fn resource<T: 'static>(&self) -> Option<&T> {
        self.resources.get::<T>()
    }

    pub fn resource_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.resources.get_mut::<T>()
    }

    pub fn resource_by_tag(&self, tag: &str) -> Option<&dyn Any> {
        self.resources.get_by_tag(tag)
    }

    pub fn tagged_resource<T: 'static>(&self, tag: &str) -> Option<&T> {
        self.resources.get_tagged::<T>(tag)
    }

    pub fn tag_resource<T: 'static>(&mut self, tag: &str) -> bool {
        self.resources.tag::<T>(tag)
    }

    pub fn untag_resource(&mut self, tag: &str) -> bool {
        self.resources.untag(tag)
    }

    pub fn unregister_resource<T: 'static>(&mut self) -> Option<T> {
        self.resources.unregister::<T>()
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn time(&self) -> Option<&TimeResource> {
        self.resources.get::<TimeResource>()
    }

    pub fn time_mut(&mut self) -> Option<&mut TimeResource> {
        self.resources.get_mut::<TimeResource>()
    }
}
