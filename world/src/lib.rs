#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battlefield state for Skirmish.
//!
//! The world owns every entity, projectile and player of a session together
//! with the walkability and visibility grids. Adapters mutate it exclusively
//! through [`apply`]: orders are queued and drained at the start of the next
//! [`Command::Tick`], after which the tick runs the camera, entity,
//! projectile, cleanup and visibility passes in that order. Read access goes
//! through the [`query`] module.

mod assets;
mod camera;
mod entity;
mod players;

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    AssetSource, CellCoord, CellRect, CellRectSize, Command, EntityId, EntityKind, EntityRules,
    Event, MapDefinition, Placement, PlacementError, PlayerId, ProjectileId, RulesBook,
    SimulationConfig, CELL_SIZE,
};
use skirmish_system_ballistics::{Flight, Projectile};
use skirmish_system_fog::{FogMask, VisibilityGrid};
use skirmish_system_pathfinding::WalkabilityGrid;
use skirmish_system_targeting::{Acquisition, Candidate, Seeker, TargetAcquisition};
use slotmap::SlotMap;
use tracing::{debug, info, warn};

pub use assets::AssetCache;
pub use players::{Player, Power, PurchaseError};

use camera::Camera;
use entity::{DeathRattle, Intent, MapEntity, Ownership, TickSnapshot};

const SMOKE_EFFECT: &str = "smoke";
const DEFAULT_VIEWPORT: Vec2 = Vec2::new(640.0, 400.0);

/// Represents the authoritative state of a Skirmish session.
#[derive(Debug)]
pub struct World {
    columns: u32,
    rows: u32,
    entities: SlotMap<EntityId, MapEntity>,
    terrain: WalkabilityGrid,
    grid: WalkabilityGrid,
    visibility: VisibilityGrid,
    projectiles: SlotMap<ProjectileId, Projectile>,
    players: Vec<Player>,
    local_player: PlayerId,
    camera: Camera,
    selection: Vec<EntityId>,
    orders: VecDeque<Command>,
    assets: AssetCache,
    rules: RulesBook,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    targeting: TargetAcquisition,
    acquisitions: Vec<Acquisition>,
    fog_visible: bool,
    tick_index: u64,
}

impl World {
    /// Creates a world from a map definition and the session's rules.
    ///
    /// Impassable tiles are marked unwalkable before the initial placements
    /// are spawned. Placements that cannot be honoured are dropped and
    /// reported through [`Event::PlacementRejected`].
    pub fn from_map(
        map: &MapDefinition,
        rules: RulesBook,
        config: SimulationConfig,
        assets: Box<dyn AssetSource>,
        out_events: &mut Vec<Event>,
    ) -> Self {
        let mut terrain = WalkabilityGrid::new(map.columns, map.rows);
        for cell in map.impassable_cells() {
            terrain.set_walkable_at(cell, false);
        }

        let players: Vec<Player> = map
            .players
            .iter()
            .enumerate()
            .filter_map(|(index, setup)| {
                u8::try_from(index)
                    .ok()
                    .map(|id| Player::from_setup(PlayerId::new(id), setup))
            })
            .collect();
        let local_player = players
            .iter()
            .find(|player| player.is_local())
            .map_or(PlayerId::new(0), Player::id);

        let mut world = Self {
            columns: map.columns,
            rows: map.rows,
            entities: SlotMap::with_key(),
            grid: terrain.clone(),
            terrain,
            visibility: VisibilityGrid::new(map.columns, map.rows),
            projectiles: SlotMap::with_key(),
            players,
            local_player,
            camera: Camera::new(DEFAULT_VIEWPORT),
            selection: Vec::new(),
            orders: VecDeque::new(),
            assets: AssetCache::new(assets),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            rules,
            config,
            targeting: TargetAcquisition::new(),
            acquisitions: Vec::new(),
            fog_visible: true,
            tick_index: 0,
        };

        for placement in &map.placements {
            world.spawn_placement(placement, out_events);
        }
        world.update_visibility();

        info!(
            columns = map.columns,
            rows = map.rows,
            entities = world.entities.len(),
            "world loaded"
        );
        world
    }

    /// Releases every entity, projectile and cached asset of the session.
    pub fn teardown(&mut self) {
        self.entities.clear();
        self.projectiles.clear();
        self.selection.clear();
        self.orders.clear();
        self.assets.clear();
        self.grid = self.terrain.clone();
        debug!("session torn down");
    }

    fn map_size(&self) -> Vec2 {
        Vec2::new(self.columns as f32, self.rows as f32) * CELL_SIZE
    }

    fn contains(&self, bounds: CellRect) -> bool {
        let origin = bounds.origin();
        let size = bounds.size();
        u64::from(origin.column()) + u64::from(size.width()) <= u64::from(self.columns)
            && u64::from(origin.row()) + u64::from(size.height()) <= u64::from(self.rows)
    }

    fn local_team(&self) -> Option<u8> {
        self.players
            .get(usize::from(self.local_player.get()))
            .map(Player::team)
    }

    fn ownership(&self, player: PlayerId) -> Option<Ownership> {
        self.players
            .get(usize::from(player.get()))
            .map(|found| Ownership {
                player,
                team: found.team(),
                local: found.is_local(),
            })
    }

    /// Alive entities covering the cell, topmost first.
    fn ids_at(&self, cell: CellCoord) -> Vec<EntityId> {
        let mut found: Vec<(i32, EntityId)> = self
            .entities
            .iter()
            .filter(|(_, entity)| entity.is_alive() && entity.covers(cell))
            .map(|(id, entity)| (entity.kind().traits().z_index, id))
            .collect();
        found.sort_by(|left, right| right.0.cmp(&left.0).then(left.1.cmp(&right.1)));
        found.into_iter().map(|(_, id)| id).collect()
    }

    fn is_hostile_to_local(&self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get(id) else {
            return false;
        };
        entity.is_alive()
            && entity.kind().is_targetable()
            && entity
                .team()
                .is_some_and(|team| Some(team) != self.local_team())
    }

    fn build_entity(
        &mut self,
        name: &str,
        cell: CellCoord,
        owner: Option<PlayerId>,
    ) -> Result<MapEntity, PlacementError> {
        let rules = self
            .rules
            .entity(name)
            .map_err(|_| PlacementError::UnknownKind)?
            .clone();
        let ownership = match owner {
            Some(player) => Some(self.ownership(player).ok_or(PlacementError::MissingOwner)?),
            None => None,
        };
        let bounds = rules.footprint().map_or_else(
            || CellRect::from_origin_and_size(cell, CellRectSize::new(1, 1)),
            |footprint| footprint.bounds_at(cell),
        );
        if !self.contains(bounds) {
            return Err(PlacementError::OutOfBounds);
        }

        Ok(MapEntity::from_rules(
            name,
            &rules,
            &self.rules,
            cell,
            ownership,
            &self.config,
            &mut self.assets,
        ))
    }

    fn insert(&mut self, mut entity: MapEntity, out_events: &mut Vec<Event>) -> EntityId {
        if let Some(footprint) = entity.footprint() {
            for cell in footprint.cells_at(entity.cell()) {
                self.grid.set_walkable_at(cell, false);
            }
            entity.mark_footprint_registered();
        }

        let kind = entity.kind();
        let cell = entity.cell();
        let id = self.entities.insert(entity);
        out_events.push(Event::EntitySpawned {
            entity: id,
            kind,
            cell,
        });
        id
    }

    fn spawn_placement(&mut self, placement: &Placement, out_events: &mut Vec<Event>) {
        let cell = placement.cell();
        match self.build_entity(&placement.name, cell, placement.owner()) {
            Ok(mut entity) => {
                if let Some(health) = placement.health {
                    entity = entity.with_health(health);
                }
                if let Some(facing) = placement.facing {
                    entity = entity.with_facing(facing);
                }
                let _ = self.insert(entity, out_events);
            }
            Err(reason) => {
                warn!(name = %placement.name, ?cell, ?reason, "placement dropped");
                out_events.push(Event::PlacementRejected {
                    name: placement.name.clone(),
                    cell,
                    reason,
                });
            }
        }
    }

    fn spawn_effect(&mut self, name: &str, position: Vec2, out_events: &mut Vec<Event>) {
        let rules = self
            .rules
            .entity(name)
            .ok()
            .filter(|rules| rules.kind == EntityKind::Effect)
            .cloned()
            .unwrap_or_else(|| EntityRules::effect(self.config.effect_lifetime));
        let cell = self.grid.clamp(CellCoord::from_point(position));
        let entity = MapEntity::from_rules(
            name,
            &rules,
            &self.rules,
            cell,
            None,
            &self.config,
            &mut self.assets,
        )
        .placed_at(position);
        let _ = self.insert(entity, out_events);
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        while let Some(order) = self.orders.pop_front() {
            self.execute(order, out_events);
        }

        self.camera.update(self.map_size(), self.config.camera_margin);
        self.acquire_targets();
        self.update_entities(out_events);
        self.update_projectiles(out_events);
        self.sweep_destroyed(out_events);
        self.update_visibility();

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
        });
    }

    fn execute(&mut self, order: Command, out_events: &mut Vec<Event>) {
        match order {
            Command::Tick => debug!("tick found in the order queue, ignoring"),
            Command::Select { cell, additive } => self.select(cell, additive, out_events),
            Command::ClearSelection => {
                self.selection.clear();
                out_events.push(Event::SelectionChanged { count: 0 });
            }
            Command::MoveSelected { cell } => self.move_selected(cell, out_events),
            Command::MoveEntity { entity, cell } => self.move_entity(entity, cell, out_events),
            Command::AttackEntity { attacker, target } => self.attack(attacker, target),
            Command::Stop { entity } => {
                if let Some(entity) = self.entities.get_mut(entity) {
                    entity.stop();
                }
            }
            Command::PlaceStructure { name, cell, owner } => {
                self.place_structure(&name, cell, owner, out_events);
            }
            Command::SellStructure { entity } => self.sell_structure(entity, out_events),
            Command::ScrollCamera { delta } => self.camera.scroll(delta),
            Command::ResizeViewport { size } => self.camera.resize(size),
            Command::ToggleFog => {
                self.fog_visible = !self.fog_visible;
                out_events.push(Event::FogToggled {
                    visible: self.fog_visible,
                });
            }
        }
    }

    fn select(&mut self, cell: CellCoord, additive: bool, out_events: &mut Vec<Event>) {
        if !additive {
            self.selection.clear();
        }

        let local = self.local_player;
        let picked = self.ids_at(cell).into_iter().find(|id| {
            self.entities.get(*id).is_some_and(|entity| {
                entity.capabilities().selectable && entity.owner() == Some(local)
            })
        });
        if let Some(id) = picked {
            if !self.selection.contains(&id) {
                self.selection.push(id);
            }
        }

        out_events.push(Event::SelectionChanged {
            count: self.selection.len(),
        });
    }

    fn move_selected(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let hostile = self
            .ids_at(cell)
            .into_iter()
            .find(|id| self.is_hostile_to_local(*id));

        for id in self.selection.clone() {
            let Some(capabilities) = self.entities.get(id).map(MapEntity::capabilities) else {
                continue;
            };
            match hostile {
                Some(target) if capabilities.can_attack => self.attack(id, target),
                _ if capabilities.can_move => self.move_entity(id, cell, out_events),
                _ => {}
            }
        }
    }

    fn move_entity(&mut self, id: EntityId, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        if !entity.is_alive() || !entity.capabilities().can_move {
            return;
        }

        let destination = self.grid.clamp(cell);
        let source = entity.cell();
        let path = self.grid.find_path(source, destination, false);
        if path.is_empty() {
            if source != destination {
                debug!(?source, ?destination, "no route for move order");
                out_events.push(Event::PathNotFound {
                    entity: id,
                    destination,
                });
            }
            return;
        }

        if let Some(entity) = self.entities.get_mut(id) {
            entity.move_along(destination, path);
        }
    }

    fn attack(&mut self, attacker: EntityId, target: EntityId) {
        if attacker == target {
            return;
        }
        let target_valid = self
            .entities
            .get(target)
            .is_some_and(|entity| entity.is_alive() && entity.kind().is_targetable());
        if !target_valid {
            return;
        }

        if let Some(entity) = self.entities.get_mut(attacker) {
            if entity.is_alive() && entity.capabilities().can_attack {
                entity.attack(target);
            }
        }
    }

    fn place_structure(
        &mut self,
        name: &str,
        cell: CellCoord,
        owner: PlayerId,
        out_events: &mut Vec<Event>,
    ) {
        match self.try_place(name, cell, owner) {
            Ok((entity, credits)) => {
                out_events.push(Event::CreditsChanged {
                    player: owner,
                    credits,
                });
                let _ = self.insert(entity, out_events);
            }
            Err(reason) => {
                warn!(name, ?cell, ?reason, "structure placement rejected");
                out_events.push(Event::PlacementRejected {
                    name: name.to_owned(),
                    cell,
                    reason,
                });
            }
        }
    }

    fn try_place(
        &mut self,
        name: &str,
        cell: CellCoord,
        owner: PlayerId,
    ) -> Result<(MapEntity, i64), PlacementError> {
        let entity = self.build_entity(name, cell, Some(owner))?;
        let blocked = entity.covered_cells().into_iter().any(|covered| {
            !self.grid.is_walkable_at(covered)
                || self.ids_at(covered).into_iter().any(|id| {
                    self.entities
                        .get(id)
                        .is_some_and(|other| other.kind().is_targetable())
                })
        });
        if blocked {
            return Err(PlacementError::Occupied);
        }

        let player = self
            .players
            .get_mut(usize::from(owner.get()))
            .ok_or(PlacementError::MissingOwner)?;
        let credits = player.purchase(entity.cost()).map_err(|error| {
            debug!(%error, "purchase declined");
            PlacementError::InsufficientCredits
        })?;
        Ok((entity, credits))
    }

    fn sell_structure(&mut self, id: EntityId, out_events: &mut Vec<Event>) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        if entity.kind() != EntityKind::Structure || !entity.is_alive() {
            return;
        }
        let Some(owner) = entity.owner() else {
            return;
        };
        let Some(player) = self.players.get_mut(usize::from(owner.get())) else {
            return;
        };

        let refund = u64::from(entity.cost()) * u64::from(self.config.refund_percent) / 100;
        let refund = u32::try_from(refund).unwrap_or(u32::MAX);
        if !entity.sell() {
            return;
        }

        let credits = player.refund(refund);
        debug!(name = entity.name(), refund, credits, "structure sold");
        out_events.push(Event::StructureSold { entity: id, refund });
        out_events.push(Event::CreditsChanged {
            player: owner,
            credits,
        });
    }

    fn acquire_targets(&mut self) {
        let seekers: Vec<Seeker> = self
            .entities
            .iter()
            .filter(|(_, entity)| entity.can_guard())
            .filter_map(|(id, entity)| {
                Some(Seeker {
                    id,
                    center: entity.center(),
                    team: entity.team()?,
                    range_cells: entity.range_cells()?,
                })
            })
            .collect();
        if seekers.is_empty() {
            return;
        }

        let candidates: Vec<Candidate> = self
            .entities
            .iter()
            .filter(|(_, entity)| entity.is_alive() && entity.kind().is_targetable())
            .map(|(id, entity)| Candidate {
                id,
                center: entity.center(),
                team: entity.team(),
            })
            .collect();

        let mut acquisitions = std::mem::take(&mut self.acquisitions);
        self.targeting
            .handle(&seekers, &candidates, &mut acquisitions);
        for acquisition in &acquisitions {
            if let Some(entity) = self.entities.get_mut(acquisition.seeker) {
                debug!(seeker = ?acquisition.seeker, target = ?acquisition.target, "target acquired");
                entity.guard(acquisition.target);
            }
        }
        self.acquisitions = acquisitions;
    }

    fn update_entities(&mut self, out_events: &mut Vec<Event>) {
        let view = TickSnapshot::capture(&self.entities);
        for player in &mut self.players {
            player.reset_power();
        }

        let mut intents = Vec::new();
        let mut vacated = Vec::new();
        for (id, entity) in &mut self.entities {
            entity.update(id, &view, &mut intents);
            if let Some(previous) = entity.shift_footprint() {
                for cell in entity.covered_cells() {
                    self.grid.set_walkable_at(cell, false);
                }
                vacated.extend(previous);
            }
            if !entity.is_alive() || entity.power() == 0 {
                continue;
            }
            if let Some(player) = entity
                .owner()
                .and_then(|owner| self.players.get_mut(usize::from(owner.get())))
            {
                player.add_power(entity.power());
            }
        }
        self.release_cells(vacated);

        for intent in intents {
            match intent {
                Intent::Launch {
                    shooter,
                    target,
                    projectile,
                    sound,
                    origin,
                } => {
                    let projectile = self.projectiles.insert(projectile);
                    out_events.push(Event::WeaponFired {
                        entity: shooter,
                        projectile,
                        target,
                    });
                    if let Some(sound) = sound {
                        out_events.push(Event::SoundCue {
                            sound,
                            position: origin,
                        });
                    }
                }
                Intent::Path {
                    entity,
                    destination,
                } => {
                    let Some(source) = self.entities.get(entity).map(MapEntity::cell) else {
                        continue;
                    };
                    let path = self.grid.find_path(source, destination, true);
                    if path.is_empty() {
                        out_events.push(Event::PathNotFound {
                            entity,
                            destination,
                        });
                    } else if let Some(pursuer) = self.entities.get_mut(entity) {
                        pursuer.follow(path);
                    }
                }
            }
        }
    }

    fn update_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let divisor = self.config.projectile_speed_divisor;
        let min_ticks = self.config.smoke_trail_min_ticks;
        let max_ticks = self.config.smoke_trail_max_ticks;

        let ids: Vec<ProjectileId> = self.projectiles.keys().collect();
        for id in ids {
            let Some(projectile) = self.projectiles.get_mut(id) else {
                continue;
            };
            let target_position = projectile
                .target()
                .and_then(|target| self.entities.get(target))
                .filter(|target| target.is_alive())
                .map(MapEntity::center);

            let flight = projectile.advance(target_position, divisor);
            if flight == Flight::InFlight {
                let puff = projectile
                    .smoke_due(&mut self.rng, min_ticks, max_ticks)
                    .then(|| projectile.position());
                if let Some(position) = puff {
                    self.spawn_effect(SMOKE_EFFECT, position, out_events);
                }
                continue;
            }

            let Some(projectile) = self.projectiles.remove(id) else {
                continue;
            };
            let armor = projectile
                .target()
                .and_then(|target| self.entities.get(target))
                .filter(|target| target.is_alive())
                .map(MapEntity::armor);
            let impact = projectile.resolve(flight, armor);

            if let Some(target) = impact.target {
                self.damage(target, impact.damage, out_events);
            }
            self.spawn_effect(&impact.effect, impact.position, out_events);
            out_events.push(Event::ProjectileResolved {
                projectile: id,
                target: impact.target,
                damage: impact.damage,
                cell: self.grid.clamp(CellCoord::from_point(impact.position)),
            });
        }
    }

    fn damage(&mut self, id: EntityId, amount: u32, out_events: &mut Vec<Event>) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        let (applied, rattle) = entity.take_damage(amount);
        out_events.push(Event::EntityDamaged {
            entity: id,
            amount: applied,
            health: entity.health(),
        });
        if let Some(rattle) = rattle {
            self.handle_death(id, rattle, out_events);
        }
    }

    fn handle_death(&mut self, id: EntityId, rattle: DeathRattle, out_events: &mut Vec<Event>) {
        debug!(entity = ?id, "entity dying");
        out_events.push(Event::EntityDying { entity: id });
        if let Some(sound) = rattle.sound {
            out_events.push(Event::SoundCue {
                sound,
                position: rattle.position,
            });
        }
        if let Some(effect) = rattle.effect {
            self.spawn_effect(&effect, rattle.position, out_events);
        }
    }

    fn sweep_destroyed(&mut self, out_events: &mut Vec<Event>) {
        let destroyed: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, entity)| entity.is_destroyed())
            .map(|(id, _)| id)
            .collect();
        if destroyed.is_empty() {
            return;
        }

        let selected = self.selection.len();
        for id in destroyed {
            let Some(mut entity) = self.entities.remove(id) else {
                continue;
            };
            if let Some(cells) = entity.take_footprint_registration() {
                self.release_cells(cells);
            }
            self.selection.retain(|selected| *selected != id);
            out_events.push(Event::EntityDestroyed {
                entity: id,
                kind: entity.kind(),
            });
        }

        if self.selection.len() != selected {
            out_events.push(Event::SelectionChanged {
                count: self.selection.len(),
            });
        }
    }

    /// Restores terrain walkability on cells no registered footprint still holds.
    fn release_cells(&mut self, cells: Vec<CellCoord>) {
        for cell in cells {
            let held = self.entities.values().any(|entity| entity.holds(cell));
            let walkable = !held && self.terrain.is_walkable_at(cell);
            self.grid.set_walkable_at(cell, walkable);
        }
    }

    fn update_visibility(&mut self) {
        for entity in self.entities.values() {
            if entity.is_alive() && entity.capabilities().reveals {
                let _ = self
                    .visibility
                    .reveal_around(entity.bounds(), entity.sight());
            }
        }
    }
}

/// Applies the provided command to the world.
///
/// [`Command::Tick`] advances the simulation immediately; every other command
/// is queued and executed at the start of the next tick, in posting order.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => world.tick(out_events),
        order => world.orders.push_back(order),
    }
}

/// Punches freshly revealed cells out of the fog mask.
///
/// Returns the number of cells drawn. Revealed cells become stale, which
/// leaves gameplay visibility untouched.
pub fn redraw_fog(world: &mut World, mask: &mut FogMask) -> usize {
    mask.redraw(&mut world.visibility)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use skirmish_core::{
        CellCoord, EntityId, EntitySnapshot, PlayerId, ProjectileSnapshot, Viewport,
    };
    use skirmish_system_fog::VisibilityGrid;
    use skirmish_system_pathfinding::WalkabilityGrid;

    use super::{Player, World};

    /// Index of the last completed tick.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Map dimensions as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.columns, world.rows)
    }

    /// Snapshots of every entity in the arena, including dying ones.
    #[must_use]
    pub fn entities(world: &World) -> Vec<EntitySnapshot> {
        world
            .entities
            .iter()
            .map(|(id, entity)| entity.snapshot(id, world.selection.contains(&id)))
            .collect()
    }

    /// Snapshot of a single entity, if the handle still resolves.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<EntitySnapshot> {
        world
            .entities
            .get(id)
            .map(|entity| entity.snapshot(id, world.selection.contains(&id)))
    }

    /// Topmost alive entity covering the cell.
    #[must_use]
    pub fn entity_at(world: &World, cell: CellCoord) -> Option<EntityId> {
        world.ids_at(cell).into_iter().next()
    }

    /// Alive entities covering the cell that satisfy `predicate`, topmost first.
    pub fn entities_at<P>(world: &World, cell: CellCoord, predicate: P) -> Vec<EntityId>
    where
        P: Fn(&EntitySnapshot) -> bool,
    {
        world
            .ids_at(cell)
            .into_iter()
            .filter(|id| entity(world, *id).is_some_and(|snapshot| predicate(&snapshot)))
            .collect()
    }

    /// Computes a path on the current walkability grid without changing it.
    #[must_use]
    pub fn create_path(
        world: &World,
        source: CellCoord,
        destination: CellCoord,
        force_destination_walkable: bool,
    ) -> Vec<CellCoord> {
        world
            .grid
            .find_path(source, destination, force_destination_walkable)
    }

    /// Snapshots of the local player's selection, in selection order.
    #[must_use]
    pub fn selected_entities(world: &World) -> Vec<EntitySnapshot> {
        world
            .selection
            .iter()
            .filter_map(|id| entity(world, *id))
            .collect()
    }

    /// Snapshots of the entities whose bounds overlap the camera viewport.
    #[must_use]
    pub fn visible_entities(world: &World) -> Vec<EntitySnapshot> {
        let viewport = world.camera.viewport();
        world
            .entities
            .iter()
            .filter(|(_, entity)| {
                let (min, max) = entity.bounds().world_bounds();
                viewport.intersects(min, max)
            })
            .map(|(id, entity)| entity.snapshot(id, world.selection.contains(&id)))
            .collect()
    }

    /// Snapshots of every projectile in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|(id, projectile)| ProjectileSnapshot {
                id,
                position: projectile.position(),
                heading: projectile.heading(),
                sprite: projectile.sprite(),
            })
            .collect()
    }

    /// Viewport the camera currently presents.
    #[must_use]
    pub fn viewport(world: &World) -> Viewport {
        world.camera.viewport()
    }

    /// Reports whether the fog layer is presented.
    #[must_use]
    pub fn is_fow_visible(world: &World) -> bool {
        world.fog_visible
    }

    /// Reports whether a cell is visible for gameplay purposes.
    #[must_use]
    pub fn is_revealed_at(world: &World, cell: CellCoord) -> bool {
        world.visibility.is_revealed_at(cell)
    }

    /// Read-only view of the walkability grid.
    #[must_use]
    pub fn walkability(world: &World) -> &WalkabilityGrid {
        &world.grid
    }

    /// Read-only view of the visibility grid.
    #[must_use]
    pub fn visibility(world: &World) -> &VisibilityGrid {
        &world.visibility
    }

    /// Every participant, indexed by player id.
    #[must_use]
    pub fn players(world: &World) -> &[Player] {
        &world.players
    }

    /// Player controlling the session.
    #[must_use]
    pub fn local_player(world: &World) -> PlayerId {
        world.local_player
    }

    /// Number of asset lookups cached for the session.
    #[must_use]
    pub fn cached_assets(world: &World) -> usize {
        world.assets.len()
    }
}
