//! The arena world and its fixed-order tick.

use std::collections::BTreeMap;
use std::fmt;

use codec::{encode_update_packet, EntityRef, Tick};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use repgraph::compile_view;
use schema::GroupId;
use wire::{
    encode_accept, encode_outdated_client, encode_ping, encode_player_count, ClientMessage,
    IncomingCache, Limits,
};

use crate::behavior::{AiController, EntityBehavior, GameHooks};
use crate::client::{Client, ClientId};
use crate::config::GameConfig;
use crate::entity::{DeletionAnimation, Entity};
use crate::error::{WorldError, WorldResult};
use crate::events::{Event, EventQueue};
use crate::flags;
use crate::manager::EntityManager;
use crate::physics::{self, ArenaLimits};
use crate::spatial::{self, Aabb, SpatialIndex};

type BehaviorSlot = Option<(EntityRef, Box<dyn EntityBehavior>)>;

/// One arena: every entity, viewer, and pending event.
///
/// [`World::tick`] runs the phases in a fixed order:
///
/// 0. drain client messages into the hooks, then fire due events
/// 1. reset the spatial index to the arena bounds
/// 2. insert every non-child object
/// 3. physics for the objects inserted in phase 2
/// 4. behaviors of every non-camera, non-child entity, each followed by
///    its children
/// 5. AI controllers
/// 6. cameras: view compilation and packet encoding per viewer
/// 7. wipe dirty state
pub struct World {
    config: GameConfig,
    limits: Limits,
    manager: EntityManager,
    spatial: Box<dyn SpatialIndex>,
    rng: Pcg32,
    tick: Tick,
    events: EventQueue,
    behaviors: Vec<BehaviorSlot>,
    controllers: Vec<Box<dyn AiController>>,
    clients: BTreeMap<ClientId, Client>,
    next_client: u32,
    hooks: Option<Box<dyn GameHooks>>,
    arena: EntityRef,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("entities", &self.manager.len())
            .field("clients", &self.clients.len())
            .field("controllers", &self.controllers.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl World {
    /// Validates `config` and opens an arena with its arena entity.
    pub fn new(config: GameConfig) -> WorldResult<Self> {
        config.validate()?;
        let limits = Limits {
            max_queued_per_header: config.incoming_queue_cap,
            ..Limits::default()
        };
        let mut world = Self {
            manager: EntityManager::new(config.max_entities),
            spatial: spatial::build(&config.spatial),
            rng: Pcg32::seed_from_u64(config.seed),
            tick: Tick::default(),
            events: EventQueue::new(),
            behaviors: Vec::new(),
            controllers: Vec::new(),
            clients: BTreeMap::new(),
            next_client: 0,
            hooks: None,
            arena: EntityRef::NULL,
            limits,
            config,
        };

        let half_width = world.config.arena_width / 2.0;
        let half_height = world.config.arena_height / 2.0;
        let mut arena = Entity::new();
        {
            let mut bounds = arena.attach_arena();
            bounds.set_left_x(-half_width);
            bounds.set_top_y(-half_height);
            bounds.set_right_x(half_width);
            bounds.set_bottom_y(half_height);
        }
        world.arena = world.manager.allocate(arena)?;
        tracing::info!(
            width = world.config.arena_width,
            height = world.config.arena_height,
            strategy = ?world.config.spatial,
            seed = world.config.seed,
            "arena opened"
        );
        Ok(world)
    }

    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of the last completed tick.
    pub const fn tick_count(&self) -> Tick {
        self.tick
    }

    /// The entity carrying the arena group.
    pub const fn arena(&self) -> EntityRef {
        self.arena
    }

    pub const fn manager(&self) -> &EntityManager {
        &self.manager
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn exists(&self, entity: EntityRef) -> bool {
        self.manager.exists(entity)
    }

    pub fn entity(&self, entity: EntityRef) -> Option<&Entity> {
        self.manager.get(entity)
    }

    pub fn entity_mut(&mut self, entity: EntityRef) -> Option<&mut Entity> {
        self.manager.get_mut(entity)
    }

    /// Half extents of the arena, read from the arena entity.
    pub fn bounds(&self) -> (f32, f32) {
        self.manager
            .get(self.arena)
            .and_then(Entity::arena)
            .map_or(
                (self.config.arena_width / 2.0, self.config.arena_height / 2.0),
                |arena| (arena.right_x(), arena.bottom_y()),
            )
    }

    /// Registers `entity` and returns its reference.
    ///
    /// Objects must carry position and physics groups. A live parent gets
    /// the new entity appended to its children. Non-child objects are
    /// indexed right away so they are visible to this tick's cameras.
    pub fn insert(&mut self, mut entity: Entity) -> WorldResult<EntityRef> {
        if entity.is_object() {
            for group in [GroupId::Position, GroupId::Physics] {
                if !entity.groups().contains(&group) {
                    return Err(WorldError::MissingFieldGroup { group });
                }
            }
            let (x, y) = entity.position_xy();
            if let Some(object) = entity.object_state_mut() {
                object.ref_x = x;
                object.ref_y = y;
            }
        }
        let parent = entity.parent();
        let bounds = (entity.is_object() && parent.is_null())
            .then(|| Aabb::of_entity(&entity))
            .flatten();

        let handle = self.manager.allocate(entity)?;
        if let Some(object) = self
            .manager
            .get_mut(parent)
            .and_then(Entity::object_state_mut)
        {
            object.children.push(handle);
        }
        if let Some(bounds) = bounds {
            self.spatial.insert_entity(handle, bounds);
        }
        Ok(handle)
    }

    /// [`World::insert`] plus a behavior run every tick.
    pub fn insert_with<B>(&mut self, entity: Entity, behavior: B) -> WorldResult<EntityRef>
    where
        B: EntityBehavior + 'static,
    {
        let handle = self.insert(entity)?;
        let slot = handle.id as usize;
        if self.behaviors.len() <= slot {
            self.behaviors.resize_with(slot + 1, || None);
        }
        self.behaviors[slot] = Some((handle, Box::new(behavior)));
        Ok(handle)
    }

    /// Starts the deletion animation of an object and its children, or
    /// destroys any other entity immediately. Returns `false` for stale
    /// references.
    pub fn delete(&mut self, entity: EntityRef) -> bool {
        match self.manager.get(entity) {
            None => return false,
            Some(target) if !target.is_object() => return self.destroy(entity),
            Some(_) => {}
        }
        let children = match self
            .manager
            .get_mut(entity)
            .and_then(Entity::object_state_mut)
        {
            Some(object) => {
                object.deletion.get_or_insert_with(DeletionAnimation::new);
                object.children.clone()
            }
            None => return false,
        };
        for child in children {
            self.delete(child);
        }
        true
    }

    /// Removes an entity and its children now.
    pub fn destroy(&mut self, entity: EntityRef) -> bool {
        let Some(removed) = self.manager.destroy(entity) else {
            return false;
        };
        if let Some(slot) = self.behaviors.get_mut(entity.id as usize) {
            if slot.as_ref().is_some_and(|(owner, _)| *owner == entity) {
                *slot = None;
            }
        }
        if let Some(object) = removed.object_state() {
            for &child in object.children() {
                self.destroy(child);
            }
        }
        true
    }

    /// Moves an object without giving it velocity.
    pub fn teleport(&mut self, entity: EntityRef, x: f32, y: f32) -> bool {
        let Some(target) = self.manager.get_mut(entity) else {
            return false;
        };
        if let Some(object) = target.object_state_mut() {
            object.ref_x = x;
            object.ref_y = y;
        }
        let mut position = target.attach_position();
        position.set_x(x);
        position.set_y(y);
        true
    }

    /// Adds to an object's acceleration for the next physics phase.
    pub fn accelerate(&mut self, entity: EntityRef, ax: f32, ay: f32) -> bool {
        let Some(object) = self
            .manager
            .get_mut(entity)
            .and_then(Entity::object_state_mut)
        else {
            return false;
        };
        object.accel_x += ax;
        object.accel_y += ay;
        true
    }

    /// Entities colliding with `entity` this tick.
    pub fn collisions(&mut self, entity: EntityRef) -> Vec<EntityRef> {
        physics::find_collisions(&mut self.manager, self.spatial.as_mut(), entity, self.tick)
    }

    /// Live indexed entities intersecting `area`.
    pub fn query(&mut self, area: Aabb) -> Vec<EntityRef> {
        let manager = &self.manager;
        self.spatial.retrieve(area, &|e| manager.exists(e))
    }

    /// Queues `event` to fire `delay` ticks from now.
    pub fn schedule(&mut self, delay: u32, event: Event) {
        self.events.schedule(self.tick, delay, event);
    }

    pub fn add_controller<C>(&mut self, controller: C)
    where
        C: AiController + 'static,
    {
        self.controllers.push(Box::new(controller));
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    pub fn set_hooks<H>(&mut self, hooks: H)
    where
        H: GameHooks + 'static,
    {
        self.hooks = Some(Box::new(hooks));
    }

    /// Attaches a viewer whose camera follows `player`.
    pub fn add_viewer(&mut self, player: EntityRef) -> WorldResult<ClientId> {
        let mut camera = Entity::new();
        camera.attach_camera().set_player(player);
        let camera = self.manager.allocate(camera)?;
        let id = ClientId::new(self.next_client);
        self.next_client += 1;
        self.clients
            .insert(id, Client::new(camera, IncomingCache::new(&self.limits)));
        tracing::debug!(%id, camera = camera.id, "viewer attached");
        Ok(id)
    }

    pub fn remove_client(&mut self, id: ClientId) -> bool {
        let Some(client) = self.clients.remove(&id) else {
            return false;
        };
        self.destroy(client.camera);
        tracing::debug!(%id, "viewer detached");
        self.broadcast_player_count();
        true
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.keys().copied().collect()
    }

    /// Points a viewer's camera at another entity.
    pub fn set_player(&mut self, id: ClientId, player: EntityRef) -> bool {
        let Some(camera) = self.clients.get(&id).map(Client::camera) else {
            return false;
        };
        match self.manager.get_mut(camera).and_then(Entity::camera_mut) {
            Some(mut camera) => {
                camera.set_player(player);
                true
            }
            None => false,
        }
    }

    /// Buffers a raw inbound packet for the next tick. Malformed packets
    /// are dropped; returns whether the packet was kept.
    pub fn receive(&mut self, id: ClientId, bytes: &[u8]) -> bool {
        let Some(client) = self.clients.get_mut(&id) else {
            return false;
        };
        match client.incoming.receive(bytes, &self.limits) {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(%id, %error, len = bytes.len(), "dropped inbound packet");
                false
            }
        }
    }

    /// Queues a client-bound packet.
    pub fn send(&mut self, id: ClientId, packet: Vec<u8>) -> bool {
        self.clients
            .get_mut(&id)
            .map(|client| client.outbox.push(packet))
            .is_some()
    }

    /// Removes and returns everything queued for `id`.
    pub fn take_outbox(&mut self, id: ClientId) -> Vec<Vec<u8>> {
        self.clients
            .get_mut(&id)
            .map(|client| std::mem::take(&mut client.outbox))
            .unwrap_or_default()
    }

    /// Runs one tick.
    pub fn tick(&mut self) -> WorldResult<()> {
        self.tick = self.tick.next();
        self.process_inbound()?;
        self.run_due_events()?;
        let objects = self.rebuild_index();
        self.integrate(&objects);
        self.tick_entities()?;
        self.tick_controllers()?;
        self.tick_cameras();
        self.manager.wipe_all();
        Ok(())
    }

    fn with_hooks<F>(&mut self, call: F) -> WorldResult<()>
    where
        F: FnOnce(&mut dyn GameHooks, &mut Self) -> WorldResult<()>,
    {
        let Some(mut hooks) = self.hooks.take() else {
            return Ok(());
        };
        let result = call(hooks.as_mut(), self);
        if self.hooks.is_none() {
            self.hooks = Some(hooks);
        }
        result
    }

    fn broadcast_player_count(&mut self) {
        let count = self.clients.values().filter(|c| c.accepted).count() as u32;
        for client in self.clients.values_mut().filter(|c| c.accepted) {
            client.outbox.push(encode_player_count(count));
        }
    }

    fn process_inbound(&mut self) -> WorldResult<()> {
        for id in self.client_ids() {
            let Some(client) = self.clients.get_mut(&id) else {
                continue;
            };
            let messages = client.incoming.drain();
            for message in messages {
                self.handle_message(id, message)?;
            }
        }
        Ok(())
    }

    fn handle_message(&mut self, id: ClientId, message: ClientMessage) -> WorldResult<()> {
        let Some(client) = self.clients.get_mut(&id) else {
            return Ok(());
        };
        match message {
            ClientMessage::Init { build, .. } => {
                if build == self.config.build {
                    let newly = !client.accepted;
                    client.accepted = true;
                    client.outbox.push(encode_accept());
                    if newly {
                        self.broadcast_player_count();
                    }
                } else {
                    tracing::debug!(%id, %build, "outdated client");
                    client.outbox.push(encode_outdated_client(&self.config.build));
                }
                Ok(())
            }
            ClientMessage::Ping => {
                client.outbox.push(encode_ping());
                Ok(())
            }
            message if client.accepted => {
                self.with_hooks(|hooks, world| hooks.on_message(world, id, message))
            }
            message => {
                tracing::debug!(%id, header = ?message.header(), "message before init");
                Ok(())
            }
        }
    }

    fn run_due_events(&mut self) -> WorldResult<()> {
        for event in self.events.drain_due(self.tick) {
            match event {
                Event::Delete(entity) => {
                    self.delete(entity);
                }
                Event::Destroy(entity) => {
                    self.destroy(entity);
                }
                Event::Hook(hook) => {
                    self.with_hooks(|hooks, world| hooks.on_event(world, hook))?;
                }
            }
        }
        Ok(())
    }

    /// Phases 1 and 2. Returns the indexed objects.
    fn rebuild_index(&mut self) -> Vec<EntityRef> {
        let (bound_x, bound_y) = self.bounds();
        self.spatial.reset(bound_x, bound_y);
        let mut objects = Vec::new();
        for handle in self.manager.live_refs() {
            let Some(entity) = self.manager.get(handle) else {
                continue;
            };
            if !entity.is_object() || entity.is_child() {
                continue;
            }
            if let Some(bounds) = Aabb::of_entity(entity) {
                self.spatial.insert_entity(handle, bounds);
                objects.push(handle);
            }
        }
        objects
    }

    /// Phase 3.
    fn integrate(&mut self, objects: &[EntityRef]) {
        let (half_width, half_height) = self.bounds();
        let limits = ArenaLimits {
            half_width,
            half_height,
            padding: self.config.arena_padding,
        };
        for &handle in objects {
            physics::apply_physics(
                &mut self.manager,
                self.spatial.as_mut(),
                &mut self.rng,
                handle,
                limits,
            );
        }
    }

    /// Phase 4.
    fn tick_entities(&mut self) -> WorldResult<()> {
        let roots: Vec<EntityRef> = self
            .manager
            .live_refs()
            .into_iter()
            .filter(|&handle| {
                self.manager
                    .get(handle)
                    .is_some_and(|e| !e.is_camera() && !e.is_child())
            })
            .collect();
        for handle in roots {
            self.tick_tree(handle)?;
        }
        Ok(())
    }

    fn tick_tree(&mut self, handle: EntityRef) -> WorldResult<()> {
        let Some(entity) = self.manager.get_mut(handle) else {
            return Ok(());
        };

        if let Some(mut animation) = entity.object_state().and_then(|o| o.deletion()) {
            let before = f32::from(animation.ticks_left());
            let finished = animation.advance();
            if finished {
                self.destroy(handle);
                return Ok(());
            }
            if let Some(object) = entity.object_state_mut() {
                object.deletion = Some(animation);
            }
            if let Some(mut style) = entity.style_mut() {
                let opacity = style.opacity() * f32::from(animation.ticks_left()) / before;
                style.set_opacity(opacity);
            }
        } else {
            self.run_behavior(handle)?;
        }

        let Some(children) = self
            .manager
            .get(handle)
            .and_then(Entity::object_state)
            .map(|object| object.children().to_vec())
        else {
            return Ok(());
        };
        let children: Vec<EntityRef> = children
            .into_iter()
            .filter(|&child| self.manager.exists(child))
            .collect();
        if let Some(object) = self
            .manager
            .get_mut(handle)
            .and_then(Entity::object_state_mut)
        {
            object.children.clone_from(&children);
        }
        for child in children {
            self.tick_tree(child)?;
        }
        Ok(())
    }

    fn run_behavior(&mut self, handle: EntityRef) -> WorldResult<()> {
        let slot = handle.id as usize;
        let Some((owner, mut behavior)) = self.behaviors.get_mut(slot).and_then(Option::take)
        else {
            return Ok(());
        };
        if owner != handle {
            return Ok(());
        }
        let result = behavior.tick(handle, self);
        let alive = self.exists(handle);
        if let Some(entry) = self.behaviors.get_mut(slot) {
            if alive && entry.is_none() {
                *entry = Some((handle, behavior));
            }
        }
        result
    }

    /// Phase 5.
    fn tick_controllers(&mut self) -> WorldResult<()> {
        let mut controllers = std::mem::take(&mut self.controllers);
        let mut result = Ok(());
        for controller in &mut controllers {
            if !self.exists(controller.owner()) {
                continue;
            }
            result = controller.tick(self);
            if result.is_err() {
                break;
            }
        }
        controllers.append(&mut self.controllers);
        controllers.retain(|controller| self.manager.exists(controller.owner()));
        self.controllers = controllers;
        result
    }

    /// Phase 6.
    fn tick_cameras(&mut self) {
        let minimap = self.minimap_entities();
        for id in self.client_ids() {
            let Some(camera) = self
                .clients
                .get(&id)
                .filter(|client| client.accepted)
                .map(Client::camera)
            else {
                continue;
            };
            let Some(candidates) = self.camera_candidates(camera, &minimap) else {
                continue;
            };
            let Some(client) = self.clients.get_mut(&id) else {
                continue;
            };
            let packet = compile_view(&mut client.view, &candidates, &self.manager, self.tick);
            match encode_update_packet(&packet) {
                Ok(bytes) => {
                    tracing::trace!(
                        %id,
                        tick = self.tick.raw(),
                        bytes = bytes.len(),
                        records = packet.record_count(),
                        "update sent"
                    );
                    client.outbox.push(bytes);
                }
                Err(error) => {
                    tracing::warn!(%id, %error, "update packet encoding failed");
                }
            }
        }
    }

    /// Live entities flagged visible to every viewer.
    fn minimap_entities(&self) -> Vec<EntityRef> {
        self.manager
            .live_refs()
            .into_iter()
            .filter(|&handle| {
                self.manager
                    .get(handle)
                    .and_then(Entity::position)
                    .is_some_and(|p| p.flags() & flags::position::MINIMAP != 0)
            })
            .collect()
    }

    /// Updates camera bookkeeping and gathers what the viewer can see.
    fn camera_candidates(
        &mut self,
        camera: EntityRef,
        minimap: &[EntityRef],
    ) -> Option<Vec<EntityRef>> {
        let player = self.manager.get(camera)?.camera()?.player();
        let followed = self
            .manager
            .get(player)
            .and_then(Entity::position)
            .map(|position| (position.x(), position.y()));
        let mut view = self.manager.get_mut(camera)?.camera_mut()?;
        if let Some((x, y)) = followed {
            view.set_camera_x(x);
            view.set_camera_y(y);
        }
        let fov = if view.fov() > 0.0 { view.fov() } else { 1.0 };
        let area = Aabb::new(
            view.camera_x(),
            view.camera_y(),
            self.config.viewport_width / (2.0 * fov),
            self.config.viewport_height / (2.0 * fov),
        );

        let mut candidates = self.query(area);
        candidates.extend_from_slice(minimap);

        let mut index = 0;
        while index < candidates.len() {
            let handle = candidates[index];
            if let Some(object) = self.manager.get(handle).and_then(Entity::object_state) {
                candidates.extend(
                    object
                        .children()
                        .iter()
                        .filter(|child| self.manager.exists(**child)),
                );
            }
            index += 1;
        }

        candidates.retain(|&handle| {
            self.manager.get(handle).is_some_and(|entity| {
                let transparent = entity.style().is_some_and(|s| s.opacity() <= 0.0);
                let animating = entity
                    .object_state()
                    .is_some_and(|o| o.is_being_deleted());
                !transparent || animating
            })
        });
        candidates.extend([player, camera, self.arena]);
        Some(candidates)
    }
}
