//! Map entities and the state machine evaluated for each of them every tick.
//!
//! An entity only writes its own fields during an update. Everything it wants
//! from the rest of the world (a projectile launched, a path computed) is
//! returned as an [`Intent`] the orchestrator applies after the pass, and
//! everything it reads about other entities comes from the [`TickSnapshot`]
//! captured before the pass began.

use std::collections::{BTreeMap, HashMap, VecDeque};

use glam::Vec2;
use skirmish_core::{
    AnimationRules, ArmorClass, BehaviorState, CellCoord, CellRect, CellRectSize, DamageState,
    EntityId, EntityKind, EntityRules, EntitySnapshot, Facing, Footprint, PlayerId, RulesBook,
    SimulationConfig, SoundHandle, SpriteHandle, CELL_SIZE, VEHICLE_FACINGS,
};
use skirmish_system_ballistics::{Projectile, Weapon};
use slotmap::{SecondaryMap, SlotMap};
use tracing::warn;

use crate::assets::AssetCache;

const WALL_TOP: u8 = 1;
const WALL_RIGHT: u8 = 2;
const WALL_BOTTOM: u8 = 4;
const WALL_LEFT: u8 = 8;
const DAMAGED_WALL_OFFSET: u32 = 16;

/// How an entity kind converts its rules speed into world units per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pace {
    Static,
    Vehicle,
    Infantry,
}

impl Pace {
    fn divisor(self, config: &SimulationConfig) -> Option<f32> {
        match self {
            Self::Static => None,
            Self::Vehicle => Some(config.vehicle_speed_divisor),
            Self::Infantry => Some(config.infantry_speed_divisor),
        }
    }
}

/// Per-kind behaviour that complements the presentation traits in core.
#[derive(Clone, Copy, Debug)]
struct KindBehavior {
    pace: Pace,
    expires: bool,
    selectable: bool,
}

const KIND_BEHAVIOR: [KindBehavior; 7] = [
    // structure
    KindBehavior {
        pace: Pace::Static,
        expires: false,
        selectable: true,
    },
    // unit
    KindBehavior {
        pace: Pace::Vehicle,
        expires: false,
        selectable: true,
    },
    // infantry
    KindBehavior {
        pace: Pace::Infantry,
        expires: false,
        selectable: true,
    },
    // terrain
    KindBehavior {
        pace: Pace::Static,
        expires: false,
        selectable: false,
    },
    // overlay
    KindBehavior {
        pace: Pace::Static,
        expires: false,
        selectable: false,
    },
    // effect
    KindBehavior {
        pace: Pace::Static,
        expires: true,
        selectable: false,
    },
    // smudge
    KindBehavior {
        pace: Pace::Static,
        expires: false,
        selectable: false,
    },
];

fn behavior(kind: EntityKind) -> KindBehavior {
    KIND_BEHAVIOR[kind as usize]
}

/// Flags describing what an entity is able to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Capabilities {
    pub(crate) can_move: bool,
    pub(crate) can_attack: bool,
    pub(crate) is_wall: bool,
    pub(crate) has_turret: bool,
    pub(crate) reveals: bool,
    pub(crate) selectable: bool,
}

/// Owner details copied onto an entity when it is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ownership {
    pub(crate) player: PlayerId,
    pub(crate) team: u8,
    pub(crate) local: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rotation {
    Body(Facing),
    Turret(Facing),
}

#[derive(Clone, Debug, Default)]
struct Orders {
    target_cell: Option<CellCoord>,
    target_position: Option<Vec2>,
    target_entity: Option<EntityId>,
    path: VecDeque<CellCoord>,
    rotation: Option<Rotation>,
    guarding: bool,
}

impl Orders {
    fn drop_target(&mut self) {
        self.target_entity = None;
        self.target_cell = None;
        self.guarding = false;
    }

    fn is_idle(&self) -> bool {
        self.target_entity.is_none()
            && self.target_position.is_none()
            && self.path.is_empty()
            && self.rotation.is_none()
    }
}

/// Side effects of a death that the orchestrator must carry out once.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DeathRattle {
    pub(crate) sound: Option<SoundHandle>,
    pub(crate) effect: Option<String>,
    pub(crate) position: Vec2,
}

/// Work an entity asks the orchestrator to perform on its behalf.
#[derive(Debug)]
pub(crate) enum Intent {
    Launch {
        shooter: EntityId,
        target: EntityId,
        projectile: Projectile,
        sound: Option<SoundHandle>,
        origin: Vec2,
    },
    Path {
        entity: EntityId,
        destination: CellCoord,
    },
}

/// What other entities looked like before the current update pass.
#[derive(Debug, Default)]
pub(crate) struct TickSnapshot {
    presences: SecondaryMap<EntityId, Presence>,
    walls: HashMap<CellCoord, String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Presence {
    center: Vec2,
    cell: CellCoord,
    alive: bool,
}

impl TickSnapshot {
    pub(crate) fn capture(entities: &SlotMap<EntityId, MapEntity>) -> Self {
        let mut snapshot = Self::default();
        for (id, entity) in entities {
            let _ = snapshot.presences.insert(
                id,
                Presence {
                    center: entity.center(),
                    cell: entity.cell,
                    alive: entity.is_alive(),
                },
            );
            if entity.capabilities.is_wall && entity.is_alive() {
                let _ = snapshot.walls.insert(entity.cell, entity.name.clone());
            }
        }
        snapshot
    }

    fn presence(&self, id: EntityId) -> Option<&Presence> {
        self.presences.get(id)
    }

    fn wall_mask(&self, name: &str, cell: CellCoord) -> u8 {
        [
            (0, -1, WALL_TOP),
            (1, 0, WALL_RIGHT),
            (0, 1, WALL_BOTTOM),
            (-1, 0, WALL_LEFT),
        ]
        .into_iter()
        .filter(|(columns, rows, _)| {
            cell.offset(*columns, *rows)
                .and_then(|neighbour| self.walls.get(&neighbour))
                .is_some_and(|other| other == name)
        })
        .fold(0, |mask, (_, _, bit)| mask | bit)
    }
}

/// Single entity representation shared by every kind.
#[derive(Debug)]
pub(crate) struct MapEntity {
    kind: EntityKind,
    name: String,
    owner: Option<Ownership>,
    position: Vec2,
    cell: CellCoord,
    facing: Facing,
    turret: Option<Facing>,
    health: u32,
    hit_points: u32,
    armor: ArmorClass,
    sight: u32,
    speed: f32,
    rotation_speed: u8,
    capabilities: Capabilities,
    footprint: Option<Footprint>,
    overlap: Option<Footprint>,
    animations: BTreeMap<String, AnimationRules>,
    orders: Orders,
    state: BehaviorState,
    weapons: [Option<Weapon>; 2],
    cost: u32,
    power: i32,
    death_ticks: u32,
    death_sound: Option<SoundHandle>,
    death_effect: Option<String>,
    lifetime: Option<u32>,
    dying: Option<u32>,
    selling: bool,
    destroyed: bool,
    registered_at: Option<CellCoord>,
    wall_mask: u8,
    animation_tick: u32,
    frame: u32,
    sprite: Option<SpriteHandle>,
}

impl MapEntity {
    /// Builds an entity from its rules entry, resolving assets and weapons.
    ///
    /// A weapon whose tables or assets fail to resolve is skipped without
    /// affecting the entity or its other weapon.
    pub(crate) fn from_rules(
        name: &str,
        rules: &EntityRules,
        book: &RulesBook,
        cell: CellCoord,
        owner: Option<Ownership>,
        config: &SimulationConfig,
        assets: &mut AssetCache,
    ) -> Self {
        let behavior = behavior(rules.kind);
        let traits = rules.kind.traits();
        let speed = behavior
            .pace
            .divisor(config)
            .filter(|divisor| *divisor > 0.0)
            .map_or(0.0, |divisor| rules.speed / divisor);
        let weapons = [
            arm(rules.primary.as_deref(), book, assets),
            arm(rules.secondary.as_deref(), book, assets),
        ];
        let has_turret = rules.turret;
        let lifetime = behavior
            .expires
            .then(|| rules.lifetime.unwrap_or(config.effect_lifetime));

        Self {
            kind: rules.kind,
            name: name.to_owned(),
            owner,
            position: cell.center(),
            cell,
            facing: Facing::new(0, traits.facings),
            turret: has_turret.then(|| Facing::new(0, VEHICLE_FACINGS)),
            health: rules.hit_points,
            hit_points: rules.hit_points,
            armor: rules.armor,
            sight: rules.sight,
            speed,
            rotation_speed: rules.rotation_speed.max(1),
            capabilities: Capabilities {
                can_move: speed > 0.0,
                can_attack: weapons.iter().any(Option::is_some),
                is_wall: rules.wall,
                has_turret,
                reveals: owner.is_some_and(|owner| owner.local)
                    && rules.kind != EntityKind::Effect,
                selectable: behavior.selectable,
            },
            footprint: rules.footprint(),
            overlap: rules.overlap(),
            animations: rules.animations.clone(),
            orders: Orders::default(),
            state: BehaviorState::Idle,
            weapons,
            cost: rules.cost,
            power: rules.power,
            death_ticks: rules.death_ticks,
            death_sound: rules.death_sound.as_deref().and_then(|sound| assets.sound(sound)),
            death_effect: rules.death_effect.clone(),
            lifetime,
            dying: None,
            selling: false,
            destroyed: false,
            registered_at: None,
            wall_mask: 0,
            animation_tick: 0,
            frame: 0,
            sprite: rules.sprite.as_deref().and_then(|sprite| assets.sprite(sprite)),
        }
    }

    /// Offsets a freshly built entity to an exact point inside its cell, such as an impact site.
    pub(crate) fn placed_at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub(crate) fn with_health(mut self, health: u32) -> Self {
        self.health = health.min(self.hit_points);
        self
    }

    pub(crate) fn with_facing(mut self, value: u8) -> Self {
        self.facing = Facing::new(value, self.facing.slices());
        self
    }

    pub(crate) fn kind(&self) -> EntityKind {
        self.kind
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn owner(&self) -> Option<PlayerId> {
        self.owner.map(|owner| owner.player)
    }

    pub(crate) fn team(&self) -> Option<u8> {
        self.owner.map(|owner| owner.team)
    }

    pub(crate) fn cell(&self) -> CellCoord {
        self.cell
    }

    pub(crate) fn health(&self) -> u32 {
        self.health
    }

    pub(crate) fn armor(&self) -> ArmorClass {
        self.armor
    }

    pub(crate) fn sight(&self) -> u32 {
        self.sight
    }

    pub(crate) fn cost(&self) -> u32 {
        self.cost
    }

    pub(crate) fn power(&self) -> i32 {
        self.power
    }

    pub(crate) fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.destroyed && self.dying.is_none()
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn footprint(&self) -> Option<&Footprint> {
        self.footprint.as_ref()
    }

    /// Records that the footprint now blocks the cells under the current anchor.
    pub(crate) fn mark_footprint_registered(&mut self) {
        if self.footprint.is_some() {
            self.registered_at = Some(self.cell);
        }
    }

    /// Moves a registered footprint onto the current anchor.
    ///
    /// Returns the cells of the previous registration when the anchor changed.
    pub(crate) fn shift_footprint(&mut self) -> Option<Vec<CellCoord>> {
        let previous = self.registered_at.filter(|anchor| *anchor != self.cell)?;
        let footprint = self.footprint.as_ref()?;
        self.registered_at = Some(self.cell);
        Some(footprint.cells_at(previous).collect())
    }

    /// Hands back the registered cells exactly once.
    pub(crate) fn take_footprint_registration(&mut self) -> Option<Vec<CellCoord>> {
        let anchor = self.registered_at.take()?;
        self.footprint
            .as_ref()
            .map(|footprint| footprint.cells_at(anchor).collect())
    }

    /// Reports whether the registered footprint blocks the cell.
    pub(crate) fn holds(&self, cell: CellCoord) -> bool {
        match (self.registered_at, &self.footprint) {
            (Some(anchor), Some(footprint)) => {
                footprint.cells_at(anchor).any(|covered| covered == cell)
            }
            _ => false,
        }
    }

    /// Cells covered by the entity's bounding box.
    pub(crate) fn bounds(&self) -> CellRect {
        self.footprint.as_ref().map_or_else(
            || CellRect::from_origin_and_size(self.cell, CellRectSize::new(1, 1)),
            |footprint| footprint.bounds_at(self.cell),
        )
    }

    /// Cells the entity stands on or covers.
    pub(crate) fn covered_cells(&self) -> Vec<CellCoord> {
        match &self.footprint {
            Some(footprint) => footprint.cells_at(self.cell).collect(),
            None => vec![self.cell],
        }
    }

    /// Reports whether the entity stands on or covers the cell.
    pub(crate) fn covers(&self, cell: CellCoord) -> bool {
        match &self.footprint {
            Some(footprint) => footprint.cells_at(self.cell).any(|covered| covered == cell),
            None => self.cell == cell,
        }
    }

    /// World-space centre of the bounding box.
    pub(crate) fn center(&self) -> Vec2 {
        if self.footprint.is_none() {
            return self.position;
        }
        let (min, max) = self.bounds().world_bounds();
        (min + max) / 2.0
    }

    /// Longest weapon reach in cells.
    pub(crate) fn range_cells(&self) -> Option<f32> {
        self.weapons
            .iter()
            .flatten()
            .map(Weapon::range_cells)
            .reduce(f32::max)
    }

    pub(crate) fn can_guard(&self) -> bool {
        self.is_alive()
            && self.capabilities.can_attack
            && self.owner.is_some()
            && self.state == BehaviorState::Idle
            && self.orders.is_idle()
    }

    pub(crate) fn move_along(&mut self, destination: CellCoord, path: Vec<CellCoord>) {
        self.orders.drop_target();
        self.orders.target_cell = Some(destination);
        self.orders.path = path.into();
    }

    pub(crate) fn attack(&mut self, target: EntityId) {
        self.orders.drop_target();
        self.orders.path.clear();
        self.orders.target_entity = Some(target);
    }

    pub(crate) fn guard(&mut self, target: EntityId) {
        self.attack(target);
        self.orders.guarding = true;
    }

    /// Installs a path computed for a pursuit request.
    pub(crate) fn follow(&mut self, path: Vec<CellCoord>) {
        self.orders.path = path.into();
    }

    /// Drops every order; a step already under way is finished so the entity
    /// comes to rest on a cell centre.
    pub(crate) fn stop(&mut self) {
        self.orders.drop_target();
        self.orders.path.clear();
        self.orders.rotation = None;
    }

    /// Advances the entity by one tick.
    pub(crate) fn update(&mut self, id: EntityId, view: &TickSnapshot, intents: &mut Vec<Intent>) {
        if self.destroyed {
            return;
        }

        self.animation_tick = self.animation_tick.wrapping_add(1);
        self.state = if self.dying.is_some() {
            self.advance_dying()
        } else if self.expire() {
            BehaviorState::Destroyed
        } else {
            if self.capabilities.is_wall {
                self.wall_mask = view.wall_mask(&self.name, self.cell);
            }
            self.step(id, view, intents)
        };
        self.frame = self.select_frame();
    }

    fn step(&mut self, id: EntityId, view: &TickSnapshot, intents: &mut Vec<Intent>) -> BehaviorState {
        for weapon in self.weapons.iter_mut().flatten() {
            weapon.tick();
        }

        if self.rotate() {
            return BehaviorState::Rotating;
        }

        if let Some(state) = self.pursue(id, view, intents) {
            return state;
        }

        if self.advance_movement() {
            return BehaviorState::Moving;
        }

        if let Some(state) = self.next_waypoint() {
            return state;
        }

        BehaviorState::Idle
    }

    /// Turns toward the pending rotation. Returns whether the tick was spent turning.
    fn rotate(&mut self) -> bool {
        let Some(rotation) = self.orders.rotation else {
            return false;
        };

        let (current, wanted) = match rotation {
            Rotation::Body(wanted) => (self.facing, wanted),
            Rotation::Turret(wanted) => (self.turret.unwrap_or(self.facing), wanted),
        };
        if current.is_aligned_with(wanted) {
            self.orders.rotation = None;
            return false;
        }

        let turned = current.rotate_toward(wanted, self.rotation_speed);
        match (rotation, self.turret.as_mut()) {
            (Rotation::Turret(_), Some(turret)) => *turret = turned,
            _ => self.facing = turned,
        }
        true
    }

    fn pursue(
        &mut self,
        id: EntityId,
        view: &TickSnapshot,
        intents: &mut Vec<Intent>,
    ) -> Option<BehaviorState> {
        let target = self.orders.target_entity?;
        let Some(presence) = view.presence(target).filter(|presence| presence.alive).copied()
        else {
            self.orders.drop_target();
            return None;
        };

        let center = self.center();
        let distance = center.distance(presence.center) / CELL_SIZE;
        if self.range_cells().is_some_and(|range| distance <= range) {
            self.orders.path.clear();
            let aim = self.turret.unwrap_or(self.facing);
            let wanted = Facing::between(center, presence.center, aim.slices());
            if !aim.is_aligned_with(wanted) {
                self.orders.rotation = Some(if self.capabilities.has_turret {
                    Rotation::Turret(wanted)
                } else {
                    Rotation::Body(wanted)
                });
                let _ = self.rotate();
                return Some(BehaviorState::Rotating);
            }

            for weapon in self.weapons.iter_mut().flatten() {
                if let Some(projectile) = weapon.fire(center, target, presence.center) {
                    intents.push(Intent::Launch {
                        shooter: id,
                        target,
                        projectile,
                        sound: weapon.sound(),
                        origin: center,
                    });
                }
            }
            return Some(BehaviorState::Attacking);
        }

        if self.orders.guarding || !self.capabilities.can_move {
            self.orders.drop_target();
            return None;
        }

        if self.orders.target_cell != Some(presence.cell) {
            self.orders.target_cell = Some(presence.cell);
            intents.push(Intent::Path {
                entity: id,
                destination: presence.cell,
            });
        }
        None
    }

    fn advance_movement(&mut self) -> bool {
        let Some(target) = self.orders.target_position else {
            return false;
        };

        let remaining = target - self.position;
        if remaining.length() < self.speed.max(f32::EPSILON) {
            self.position = target;
            self.orders.target_position = None;
        } else {
            self.position += self.speed * remaining.normalize_or_zero();
        }
        self.cell = CellCoord::from_point(self.position);
        true
    }

    fn next_waypoint(&mut self) -> Option<BehaviorState> {
        let next = self.orders.path.pop_front()?;
        let destination = next.center();
        self.orders.target_position = Some(destination);

        let wanted = Facing::between(self.position, destination, self.facing.slices());
        if !self.facing.is_aligned_with(wanted) {
            self.orders.rotation = Some(Rotation::Body(wanted));
            let _ = self.rotate();
            return Some(BehaviorState::Rotating);
        }

        let _ = self.advance_movement();
        Some(BehaviorState::Moving)
    }

    fn expire(&mut self) -> bool {
        let Some(lifetime) = self.lifetime.as_mut() else {
            return false;
        };

        *lifetime = lifetime.saturating_sub(1);
        if *lifetime == 0 {
            self.destroyed = true;
        }
        self.destroyed
    }

    fn advance_dying(&mut self) -> BehaviorState {
        let remaining = self.dying.unwrap_or(0).saturating_sub(1);
        self.dying = Some(remaining);
        if remaining == 0 {
            self.destroyed = true;
            BehaviorState::Destroyed
        } else {
            BehaviorState::Dying
        }
    }

    /// Subtracts damage, clamping health at zero. Reaching zero kills the entity.
    ///
    /// Returns the damage actually applied and the death side effects, if
    /// this hit was the killing one.
    pub(crate) fn take_damage(&mut self, amount: u32) -> (u32, Option<DeathRattle>) {
        if !self.is_alive() {
            return (0, None);
        }

        let applied = amount.min(self.health);
        self.health -= applied;
        let rattle = if self.health == 0 { self.die() } else { None };
        (applied, rattle)
    }

    /// Starts the terminal transition.
    ///
    /// Only the first call has any effect; later calls return `None`.
    pub(crate) fn die(&mut self) -> Option<DeathRattle> {
        if !self.is_alive() {
            return None;
        }

        self.stop();
        self.orders.target_position = None;
        self.dying = Some(self.death_ticks);
        if self.death_ticks == 0 {
            self.destroyed = true;
            self.state = BehaviorState::Destroyed;
        } else {
            self.state = BehaviorState::Dying;
        }

        Some(DeathRattle {
            sound: self.death_sound,
            effect: self.death_effect.clone(),
            position: self.center(),
        })
    }

    /// Starts the reverse build animation that ends in destruction.
    pub(crate) fn sell(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }

        let ticks = self
            .animation("build")
            .map_or(1, |animation| animation.frames.max(1));
        self.stop();
        self.selling = true;
        self.dying = Some(ticks);
        self.state = BehaviorState::Dying;
        true
    }

    pub(crate) fn damage_state(&self) -> DamageState {
        DamageState::from_health(self.health, self.hit_points)
    }

    fn animation(&self, name: &str) -> Option<&AnimationRules> {
        self.animations.get(name)
    }

    fn select_frame(&self) -> u32 {
        if let Some(remaining) = self.dying {
            return if self.selling {
                self.animation("build").map_or(0, |build| {
                    build.first + remaining.min(build.frames).saturating_sub(1)
                })
            } else {
                self.animation("dying").map_or(0, |dying| {
                    let progress = self.death_ticks.saturating_sub(remaining);
                    dying.first + progress.min(dying.frames.saturating_sub(1))
                })
            };
        }

        let damaged = self.damage_state() != DamageState::None;
        if self.capabilities.is_wall {
            let offset = if damaged { DAMAGED_WALL_OFFSET } else { 0 };
            return u32::from(self.wall_mask) + offset;
        }

        let animation = if damaged {
            self.animation("damaged").or_else(|| self.animation("idle"))
        } else {
            self.animation("idle")
        };
        let first = animation.map_or(0, |animation| animation.first);
        if self.facing.slices() > 1 {
            return first + u32::from(self.facing.value());
        }

        match animation {
            Some(animation) if animation.frames > 0 => {
                first + self.animation_tick % animation.frames
            }
            _ => first,
        }
    }

    pub(crate) fn snapshot(&self, id: EntityId, selected: bool) -> EntitySnapshot {
        let overlap = self
            .overlap
            .as_ref()
            .map(|overlap| overlap.cells_at(self.cell).collect())
            .unwrap_or_default();

        EntitySnapshot {
            id,
            kind: self.kind,
            name: self.name.clone(),
            owner: self.owner(),
            position: self.position,
            cell: self.cell,
            bounds: self.bounds(),
            overlap,
            facing: self.facing,
            turret: self.turret,
            health: self.health,
            hit_points: self.hit_points,
            damage_state: self.damage_state(),
            state: self.state,
            sprite: self.sprite,
            frame: self.frame,
            z_index: self.kind.traits().z_index,
            selected,
        }
    }
}

fn arm(name: Option<&str>, book: &RulesBook, assets: &mut AssetCache) -> Option<Weapon> {
    let name = name?;
    match Weapon::from_rules(name, book) {
        Ok(weapon) => {
            let sprite = weapon
                .projectile_rules()
                .sprite
                .as_deref()
                .and_then(|sprite| assets.sprite(sprite));
            let sound = weapon
                .rules()
                .sound
                .as_deref()
                .and_then(|sound| assets.sound(sound));
            Some(weapon.with_assets(sprite, sound))
        }
        Err(error) => {
            warn!(weapon = name, %error, "weapon unavailable, entity continues without it");
            None
        }
    }
}
