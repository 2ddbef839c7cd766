#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skirmish simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired orders, the world queues them and drains the queue at
//! the start of every tick, and then broadcasts [`Event`] values that audio
//! and presentation layers react to. Static rules data, the map definition
//! format, the asset façade and the simulation configuration live here so
//! every crate agrees on their shape.

pub mod assets;
pub mod config;
pub mod map;
pub mod rules;

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use assets::{AssetError, AssetSource, SoundHandle, SpriteHandle};
pub use config::SimulationConfig;
pub use map::{MapDefinition, MapError, Placement, PlayerSetup};
pub use rules::{
    AnimationRules, ArmorClass, EntityRules, ProjectileRules, ProjectileSpeed, RulesBook,
    RulesError, WarheadRules, WeaponRules,
};

/// Side length of a single square cell expressed in world units.
pub const CELL_SIZE: f32 = 24.0;

/// Facing resolution used by vehicle bodies.
pub const VEHICLE_FACINGS: u8 = 32;

/// Facing resolution used by infantry and turrets.
pub const INFANTRY_FACINGS: u8 = 8;

slotmap::new_key_type! {
    /// Generational handle naming an entity stored in the world arena.
    ///
    /// A handle whose entity was destroyed never resolves again, even when the
    /// arena slot is reused.
    pub struct EntityId;

    /// Generational handle naming an in-flight projectile.
    pub struct ProjectileId;
}

/// Identifier of a participating player, matching its index in the map definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Commands that express every order adapters may post into the world.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by one fixed tick.
    Tick,
    /// Selects the local player's entity standing on the provided cell.
    Select {
        /// Cell the pointer clicked.
        cell: CellCoord,
        /// Keeps the existing selection when `true`.
        additive: bool,
    },
    /// Drops every selected entity from the selection.
    ClearSelection,
    /// Orders every selected entity toward the provided cell, attacking any enemy found there.
    MoveSelected {
        /// Destination cell of the order.
        cell: CellCoord,
    },
    /// Orders a single entity to move to the provided cell.
    MoveEntity {
        /// Entity receiving the order.
        entity: EntityId,
        /// Destination cell of the order.
        cell: CellCoord,
    },
    /// Orders a single entity to attack another entity.
    AttackEntity {
        /// Entity receiving the order.
        attacker: EntityId,
        /// Entity that should be attacked.
        target: EntityId,
    },
    /// Cancels every order held by the entity.
    Stop {
        /// Entity receiving the order.
        entity: EntityId,
    },
    /// Requests construction of a structure anchored at the provided cell.
    PlaceStructure {
        /// Rules name of the structure.
        name: String,
        /// Upper-left cell of the structure footprint.
        cell: CellCoord,
        /// Player paying for and owning the structure.
        owner: PlayerId,
    },
    /// Requests that a structure be sold back for a partial refund.
    SellStructure {
        /// Structure being sold.
        entity: EntityId,
    },
    /// Scrolls the camera by the provided world-space delta.
    ScrollCamera {
        /// Offset applied to the camera origin.
        delta: Vec2,
    },
    /// Resizes the viewport the camera presents.
    ResizeViewport {
        /// New viewport size in screen pixels.
        size: Vec2,
    },
    /// Flips whether the fog-of-war layer is presented.
    ToggleFog,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just completed.
        tick: u64,
    },
    /// Confirms that an entity joined the world.
    EntitySpawned {
        /// Handle allocated to the entity.
        entity: EntityId,
        /// Kind of the entity.
        kind: EntityKind,
        /// Cell the entity occupies after spawning.
        cell: CellCoord,
    },
    /// Reports that an entity could not be placed.
    PlacementRejected {
        /// Rules name of the rejected entity.
        name: String,
        /// Cell requested for the placement.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that no route exists for a movement request.
    PathNotFound {
        /// Entity that requested the path.
        entity: EntityId,
        /// Destination that could not be reached.
        destination: CellCoord,
    },
    /// Confirms that a weapon released a projectile.
    WeaponFired {
        /// Entity owning the weapon.
        entity: EntityId,
        /// Projectile that was spawned.
        projectile: ProjectileId,
        /// Entity targeted by the shot.
        target: EntityId,
    },
    /// Confirms that damage was applied to an entity.
    EntityDamaged {
        /// Entity that received the damage.
        entity: EntityId,
        /// Amount of damage subtracted after armor.
        amount: u32,
        /// Remaining health after the hit.
        health: u32,
    },
    /// Announces that an entity started its terminal transition.
    EntityDying {
        /// Entity that is dying.
        entity: EntityId,
    },
    /// Announces that an entity left every world index.
    EntityDestroyed {
        /// Entity that was destroyed.
        entity: EntityId,
        /// Kind of the destroyed entity.
        kind: EntityKind,
    },
    /// Reports that a projectile resolved and left the world.
    ProjectileResolved {
        /// Projectile that resolved.
        projectile: ProjectileId,
        /// Entity that received damage, if the target was still alive.
        target: Option<EntityId>,
        /// Damage applied to the target.
        damage: u32,
        /// Cell where the impact effect was spawned.
        cell: CellCoord,
    },
    /// Requests that the audio adapter play a sound.
    SoundCue {
        /// Sound resolved by the asset façade.
        sound: SoundHandle,
        /// World position the sound originates from.
        position: Vec2,
    },
    /// Announces whether the fog layer is presented.
    FogToggled {
        /// Whether the fog is visible after the toggle.
        visible: bool,
    },
    /// Confirms that a structure was sold.
    StructureSold {
        /// Structure being sold.
        entity: EntityId,
        /// Credits returned to the owner.
        refund: u32,
    },
    /// Reports an updated credit balance.
    CreditsChanged {
        /// Player whose balance changed.
        player: PlayerId,
        /// Balance after the change.
        credits: i64,
    },
    /// Reports the size of the selection after it changed.
    SelectionChanged {
        /// Number of selected entities.
        count: usize,
    },
}

/// Reasons an entity placement may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested footprint extends beyond the map bounds.
    OutOfBounds,
    /// The requested footprint overlaps an impassable cell.
    Occupied,
    /// No rules entry exists for the requested name.
    UnknownKind,
    /// The owning player cannot afford the entity.
    InsufficientCredits,
    /// The placement names a player that does not exist.
    MissingOwner,
}

/// Category tag shared by every map entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Buildings such as factories, walls and defences.
    Structure,
    /// Vehicles.
    Unit,
    /// Foot soldiers.
    Infantry,
    /// Trees and other static scenery.
    Terrain,
    /// Ground overlays such as resource fields.
    Overlay,
    /// Short-lived visual effects.
    Effect,
    /// Scorch marks and craters.
    Smudge,
}

/// Static presentation traits attached to an [`EntityKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindTraits {
    /// Render ordering inside a layer. Never consulted for occupancy.
    pub z_index: i32,
    /// Logical layer the entity draws itself onto.
    pub layer: RenderLayer,
    /// Number of discrete body facings.
    pub facings: u8,
}

const KIND_TRAITS: [KindTraits; 7] = [
    KindTraits {
        z_index: 3,
        layer: RenderLayer::Structures,
        facings: 1,
    },
    KindTraits {
        z_index: 5,
        layer: RenderLayer::Units,
        facings: VEHICLE_FACINGS,
    },
    KindTraits {
        z_index: 4,
        layer: RenderLayer::Infantry,
        facings: INFANTRY_FACINGS,
    },
    KindTraits {
        z_index: 1,
        layer: RenderLayer::Terrain,
        facings: 1,
    },
    KindTraits {
        z_index: 2,
        layer: RenderLayer::Terrain,
        facings: 1,
    },
    KindTraits {
        z_index: 6,
        layer: RenderLayer::Overlay,
        facings: 1,
    },
    KindTraits {
        z_index: 0,
        layer: RenderLayer::Terrain,
        facings: 1,
    },
];

impl EntityKind {
    /// Looks up the static presentation traits for the kind.
    #[must_use]
    pub const fn traits(self) -> KindTraits {
        KIND_TRAITS[self as usize]
    }

    /// Reports whether entities of this kind may ever be chosen as attack targets.
    #[must_use]
    pub const fn is_targetable(self) -> bool {
        matches!(
            self,
            Self::Structure | Self::Unit | Self::Infantry | Self::Terrain
        )
    }
}

/// Logical render surfaces in back-to-front composition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Map tiles, smudges and ground overlays.
    Terrain,
    /// Buildings.
    Structures,
    /// Foot soldiers.
    Infantry,
    /// Vehicles.
    Units,
    /// Effects and cells of structures drawn above units.
    Overlay,
}

impl RenderLayer {
    /// Every layer in composition order.
    pub const ALL: [Self; 5] = [
        Self::Terrain,
        Self::Structures,
        Self::Infantry,
        Self::Units,
        Self::Overlay,
    ];

    /// Position of the layer in the composition order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Behaviour state of a map entity, evaluated once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BehaviorState {
    /// Waiting for orders.
    #[default]
    Idle,
    /// Turning the body or turret toward a required facing.
    Rotating,
    /// Interpolating toward the next waypoint.
    Moving,
    /// In range of its target and firing.
    Attacking,
    /// Playing its terminal animation.
    Dying,
    /// Removed from the world.
    Destroyed,
}

/// Damage bracket derived from the health ratio of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageState {
    /// More than half of the hit points remain.
    None,
    /// At most half of the hit points remain.
    Moderate,
    /// At most a quarter of the hit points remain.
    Severe,
}

impl DamageState {
    /// Derives the damage bracket for the provided health and hit points.
    #[must_use]
    pub fn from_health(health: u32, hit_points: u32) -> Self {
        if hit_points == 0 {
            return Self::Severe;
        }

        let ratio = health as f32 / hit_points as f32;
        if ratio <= 0.25 {
            Self::Severe
        } else if ratio <= 0.50 {
            Self::Moderate
        } else {
            Self::None
        }
    }
}

/// Orientation discretised into a fixed number of slices.
///
/// Slice zero points north (towards decreasing rows) and indices grow
/// clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Facing {
    value: u8,
    slices: u8,
}

impl Facing {
    /// Creates a facing, wrapping the value into the slice range.
    #[must_use]
    pub const fn new(value: u8, slices: u8) -> Self {
        let slices = if slices == 0 { 1 } else { slices };
        Self {
            value: value % slices,
            slices,
        }
    }

    /// Derives the facing pointing from `from` towards `to`.
    ///
    /// Coincident points yield slice zero.
    #[must_use]
    pub fn between(from: Vec2, to: Vec2, slices: u8) -> Self {
        let delta = to - from;
        if delta.length_squared() <= f32::EPSILON {
            return Self::new(0, slices);
        }

        let angle = delta.x.atan2(-delta.y).rem_euclid(TAU);
        let slice_angle = TAU / f32::from(slices.max(1));
        let value = (angle / slice_angle).round() as u32 % u32::from(slices.max(1));
        Self::new(value as u8, slices)
    }

    /// Slice index of the facing.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Number of slices the facing is discretised into.
    #[must_use]
    pub const fn slices(&self) -> u8 {
        self.slices
    }

    /// Re-expresses the facing with a different slice count.
    #[must_use]
    pub fn resample(self, slices: u8) -> Self {
        let slices = slices.max(1);
        let scaled = (u32::from(self.value) * u32::from(slices) + u32::from(self.slices) / 2)
            / u32::from(self.slices);
        Self::new((scaled % u32::from(slices)) as u8, slices)
    }

    /// Returns whether both facings point the same way.
    #[must_use]
    pub fn is_aligned_with(self, other: Self) -> bool {
        self.value == other.resample(self.slices).value
    }

    /// Turns towards `target` along the shorter arc by at most `step` slices.
    #[must_use]
    pub fn rotate_toward(self, target: Self, step: u8) -> Self {
        let target = target.resample(self.slices);
        let slices = i32::from(self.slices);
        let clockwise = (i32::from(target.value) - i32::from(self.value)).rem_euclid(slices);
        if clockwise == 0 {
            return self;
        }

        let step = i32::from(step.max(1));
        let next = if clockwise <= slices / 2 {
            i32::from(self.value) + step.min(clockwise)
        } else {
            i32::from(self.value) - step.min(slices - clockwise)
        };
        Self::new(next.rem_euclid(slices) as u8, self.slices)
    }

    /// Unit vector pointing in the facing's direction in world space.
    #[must_use]
    pub fn to_vector(self) -> Vec2 {
        let angle = f32::from(self.value) * TAU / f32::from(self.slices);
        Vec2::new(angle.sin(), -angle.cos())
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Converts a world-space point into the cell containing it.
    ///
    /// Negative coordinates clamp to the first row or column.
    #[must_use]
    pub fn from_point(point: Vec2) -> Self {
        let column = (point.x / CELL_SIZE).floor().max(0.0) as u32;
        let row = (point.y / CELL_SIZE).floor().max(0.0) as u32;
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// World-space point at the upper-left corner of the cell.
    #[must_use]
    pub fn origin(self) -> Vec2 {
        Vec2::new(self.column as f32, self.row as f32) * CELL_SIZE
    }

    /// World-space point at the centre of the cell.
    #[must_use]
    pub fn center(self) -> Vec2 {
        self.origin() + Vec2::splat(CELL_SIZE / 2.0)
    }

    /// Returns the neighbouring cell at the given offset, if it has non-negative coordinates.
    #[must_use]
    pub fn offset(self, columns: i32, rows: i32) -> Option<Self> {
        let column = self.column.checked_add_signed(columns)?;
        let row = self.row.checked_add_signed(rows)?;
        Some(Self::new(column, row))
    }

    /// Computes the Chebyshev distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Reports whether the cells touch, including diagonally.
    #[must_use]
    pub fn is_adjacent_to(self, other: CellCoord) -> bool {
        self != other && self.chebyshev_distance(other) == 1
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Grows the rectangle by `by` cells on every side, clipped to `columns` by `rows`.
    #[must_use]
    pub fn inflated(self, by: u32, columns: u32, rows: u32) -> Self {
        let left = self.origin.column.saturating_sub(by);
        let top = self.origin.row.saturating_sub(by);
        let right = self
            .origin
            .column
            .saturating_add(self.size.width)
            .saturating_add(by)
            .min(columns);
        let bottom = self
            .origin
            .row
            .saturating_add(self.size.height)
            .saturating_add(by)
            .min(rows);
        Self::from_origin_and_size(
            CellCoord::new(left, top),
            CellRectSize::new(right.saturating_sub(left), bottom.saturating_sub(top)),
        )
    }

    /// Iterates every cell covered by the rectangle in row-major order.
    pub fn cells(self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let width = self.size.width;
        (0..self.size.height).flat_map(move |row| {
            (0..width).map(move |column| {
                CellCoord::new(origin.column + column, origin.row + row)
            })
        })
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column >= self.origin.column
            && cell.row >= self.origin.row
            && cell.column < self.origin.column + self.size.width
            && cell.row < self.origin.row + self.size.height
    }

    /// World-space bounds as `(min, max)` corners.
    #[must_use]
    pub fn world_bounds(&self) -> (Vec2, Vec2) {
        let min = self.origin.origin();
        let max = min + Vec2::new(self.size.width as f32, self.size.height as f32) * CELL_SIZE;
        (min, max)
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Multi-cell mask describing which cells of a bounding box an entity covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Footprint {
    size: CellRectSize,
    offsets: Vec<(u32, u32)>,
}

impl Footprint {
    /// Footprint covering a single cell.
    #[must_use]
    pub fn single() -> Self {
        Self {
            size: CellRectSize::new(1, 1),
            offsets: vec![(0, 0)],
        }
    }

    /// Parses a pattern where `x` marks a covered cell and `.` an open one.
    ///
    /// Returns `None` for an empty pattern or for one without covered cells.
    #[must_use]
    pub fn from_pattern<S: AsRef<str>>(rows: &[S]) -> Option<Self> {
        let mut offsets = Vec::new();
        let mut width = 0;
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            width = width.max(line.chars().count() as u32);
            for (column, mark) in line.chars().enumerate() {
                if mark == 'x' || mark == 'X' {
                    offsets.push((column as u32, row as u32));
                }
            }
        }

        if offsets.is_empty() {
            return None;
        }

        Some(Self {
            size: CellRectSize::new(width, rows.len() as u32),
            offsets,
        })
    }

    /// Bounding box of the pattern.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Covered cells when the pattern is anchored at `origin`.
    pub fn cells_at(&self, origin: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        self.offsets
            .iter()
            .map(move |(column, row)| CellCoord::new(origin.column + column, origin.row + row))
    }

    /// Bounding rectangle when the pattern is anchored at `origin`.
    #[must_use]
    pub fn bounds_at(&self, origin: CellCoord) -> CellRect {
        CellRect::from_origin_and_size(origin, self.size)
    }
}

/// Camera viewport expressed in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// World-space point shown at the upper-left corner of the screen.
    pub origin: Vec2,
    /// Screen size in pixels.
    pub size: Vec2,
    /// Screen pixels per world unit.
    pub scale: f32,
}

impl Viewport {
    /// World-space bounds covered by the viewport as `(min, max)` corners.
    #[must_use]
    pub fn world_bounds(&self) -> (Vec2, Vec2) {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        (self.origin, self.origin + self.size / scale)
    }

    /// Axis-aligned overlap test against a world-space box.
    #[must_use]
    pub fn intersects(&self, min: Vec2, max: Vec2) -> bool {
        let (view_min, view_max) = self.world_bounds();
        min.x < view_max.x && max.x > view_min.x && min.y < view_max.y && max.y > view_min.y
    }
}

/// Immutable representation of a single entity used by presentation layers.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Handle of the entity.
    pub id: EntityId,
    /// Kind of the entity.
    pub kind: EntityKind,
    /// Rules name of the entity.
    pub name: String,
    /// Owning player, if any.
    pub owner: Option<PlayerId>,
    /// World position of the entity.
    pub position: Vec2,
    /// Cell the entity occupies.
    pub cell: CellCoord,
    /// Cells covered by the entity's bounding box.
    pub bounds: CellRect,
    /// Cells drawn onto the overlay layer instead of the entity's own layer.
    pub overlap: Vec<CellCoord>,
    /// Body facing.
    pub facing: Facing,
    /// Turret facing, for entities carrying a turret.
    pub turret: Option<Facing>,
    /// Remaining health.
    pub health: u32,
    /// Maximum health.
    pub hit_points: u32,
    /// Damage bracket derived from the health ratio.
    pub damage_state: DamageState,
    /// Behaviour state at the end of the last tick.
    pub state: BehaviorState,
    /// Sprite resolved for the entity, if the asset loaded.
    pub sprite: Option<SpriteHandle>,
    /// Animation frame to draw.
    pub frame: u32,
    /// Render ordering inside the layer.
    pub z_index: i32,
    /// Whether the entity is part of the local selection.
    pub selected: bool,
}

/// Immutable representation of a projectile used by presentation layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Handle of the projectile.
    pub id: ProjectileId,
    /// World position of the projectile.
    pub position: Vec2,
    /// Direction of travel.
    pub heading: Facing,
    /// Sprite resolved for the projectile, if the asset loaded.
    pub sprite: Option<SpriteHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_from_point_floors_by_cell_size() {
        assert_eq!(
            CellCoord::from_point(Vec2::new(47.9, 24.0)),
            CellCoord::new(1, 1)
        );
        assert_eq!(
            CellCoord::from_point(Vec2::new(-5.0, 3.0)),
            CellCoord::new(0, 0)
        );
    }

    #[test]
    fn damage_state_thresholds_are_inclusive() {
        assert_eq!(DamageState::from_health(100, 100), DamageState::None);
        assert_eq!(DamageState::from_health(51, 100), DamageState::None);
        assert_eq!(DamageState::from_health(50, 100), DamageState::Moderate);
        assert_eq!(DamageState::from_health(26, 100), DamageState::Moderate);
        assert_eq!(DamageState::from_health(25, 100), DamageState::Severe);
        assert_eq!(DamageState::from_health(0, 100), DamageState::Severe);
    }

    #[test]
    fn facing_between_points_north_and_clockwise() {
        let origin = Vec2::new(100.0, 100.0);
        assert_eq!(
            Facing::between(origin, Vec2::new(100.0, 0.0), 8).value(),
            0
        );
        assert_eq!(
            Facing::between(origin, Vec2::new(200.0, 100.0), 8).value(),
            2
        );
        assert_eq!(
            Facing::between(origin, Vec2::new(100.0, 200.0), 8).value(),
            4
        );
        assert_eq!(
            Facing::between(origin, Vec2::new(0.0, 100.0), 8).value(),
            6
        );
        assert_eq!(
            Facing::between(origin, Vec2::new(200.0, 200.0), 32).value(),
            12
        );
    }

    #[test]
    fn rotation_takes_the_short_arc() {
        let facing = Facing::new(1, 32);
        let target = Facing::new(30, 32);
        let turned = facing.rotate_toward(target, 2);
        assert_eq!(turned.value(), 31);
        assert_eq!(turned.rotate_toward(target, 2).value(), 30);
        assert_eq!(turned.rotate_toward(target, 2).rotate_toward(target, 2), target);
    }

    #[test]
    fn resampling_between_resolutions_preserves_direction() {
        let turret = Facing::new(2, 8);
        assert_eq!(turret.resample(32).value(), 8);
        assert!(Facing::new(8, 32).is_aligned_with(turret));
    }

    #[test]
    fn inflated_rect_clips_to_bounds() {
        let rect = CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(1, 1));
        let inflated = rect.inflated(2, 10, 10);
        assert_eq!(inflated.origin(), CellCoord::new(0, 0));
        assert_eq!(inflated.size(), CellRectSize::new(4, 4));
        assert_eq!(inflated.cells().count(), 16);
    }

    #[test]
    fn footprint_pattern_skips_open_cells() {
        let footprint = Footprint::from_pattern(&["xx", "x."]).expect("pattern has cells");
        let cells: Vec<_> = footprint.cells_at(CellCoord::new(3, 4)).collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(3, 4),
                CellCoord::new(4, 4),
                CellCoord::new(3, 5)
            ]
        );
        assert_eq!(footprint.size(), CellRectSize::new(2, 2));
        assert!(Footprint::from_pattern(&["..", ".."]).is_none());
    }

    #[test]
    fn viewport_overlap_respects_scale() {
        let viewport = Viewport {
            origin: Vec2::ZERO,
            size: Vec2::new(200.0, 100.0),
            scale: 2.0,
        };
        assert!(viewport.intersects(Vec2::new(90.0, 40.0), Vec2::new(110.0, 60.0)));
        assert!(!viewport.intersects(Vec2::new(101.0, 0.0), Vec2::new(120.0, 10.0)));
    }
}
