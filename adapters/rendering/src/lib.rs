#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Skirmish adapters.
//!
//! Adapters fill a [`Scene`] from world queries every frame and hand it to a
//! [`Compositor`], which draws each visible entity onto the surface of its
//! layer and flattens the layers back to front into a [`Frame`]. Backends
//! turn that frame into pixels.

mod headless;

use std::time::Duration;

use anyhow::Result as AnyResult;
use glam::Vec2;
use skirmish_core::{
    CellCoord, EntityId, EntityKind, EntitySnapshot, Facing, ProjectileSnapshot, RenderLayer,
    SpriteHandle, Viewport, CELL_SIZE,
};
use skirmish_system_fog::{FogMask, RedrawCadence, MASK_TEXELS_PER_CELL};

pub use headless::HeadlessBackend;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with a different alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

const IMPASSABLE_COLOR: Color = Color::new(0.8, 0.1, 0.1, 0.35);
const FACING_COLOR: Color = Color::from_rgb_u8(250, 220, 40);
const TURRET_COLOR: Color = Color::from_rgb_u8(40, 200, 250);
const SELECTION_COLOR: Color = Color::from_rgb_u8(255, 255, 255);

/// Fog mask together with the cadence at which it is redrawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FogLayer {
    mask: FogMask,
    cadence: RedrawCadence,
}

impl FogLayer {
    /// Creates an opaque fog layer for a map of `columns` by `rows` cells.
    #[must_use]
    pub fn new(columns: u32, rows: u32, redraw_interval: u32) -> Self {
        Self {
            mask: FogMask::new(columns, rows),
            cadence: RedrawCadence::new(redraw_interval),
        }
    }

    /// Current mask contents.
    #[must_use]
    pub fn mask(&self) -> &FogMask {
        &self.mask
    }

    /// Records a rendered frame and runs `redraw` when the cadence allows it.
    ///
    /// Returns the number of cells punched out of the mask.
    pub fn refresh<F>(&mut self, redraw: F) -> usize
    where
        F: FnOnce(&mut FogMask) -> usize,
    {
        if self.cadence.frame() {
            redraw(&mut self.mask)
        } else {
            0
        }
    }
}

/// Scene description assembled by adapters from world queries.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Camera viewport the scene is presented through.
    pub viewport: Viewport,
    /// Every entity of the world, visible or not.
    pub entities: Vec<EntitySnapshot>,
    /// Projectiles in flight.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Cells that cannot be walked on.
    pub impassable: Vec<CellCoord>,
    /// Fog mask blended on top of the layers.
    pub fog: FogLayer,
    /// Whether the fog layer is composited.
    pub fog_visible: bool,
    /// Whether debug overlays are drawn.
    pub debug: bool,
}

impl Scene {
    /// Creates an empty scene for a map of `columns` by `rows` cells.
    #[must_use]
    pub fn new(viewport: Viewport, columns: u32, rows: u32, fog_redraw_interval: u32) -> Self {
        Self {
            viewport,
            entities: Vec::new(),
            projectiles: Vec::new(),
            impassable: Vec::new(),
            fog: FogLayer::new(columns, rows, fog_redraw_interval),
            fog_visible: true,
            debug: false,
        }
    }
}

/// Single drawing operation expressed in screen space.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Draws a frame of an entity sprite sheet.
    Sprite {
        /// Entity being drawn.
        entity: EntityId,
        /// Sprite sheet; `None` draws nothing but keeps the slot.
        sprite: Option<SpriteHandle>,
        /// Frame of the sprite sheet.
        frame: u32,
        /// Screen-space anchor of the sprite.
        position: Vec2,
    },
    /// Redraws one overlap cell of an entity above units.
    Overlap {
        /// Entity the cell belongs to.
        entity: EntityId,
        /// Sprite sheet of the entity.
        sprite: Option<SpriteHandle>,
        /// Frame of the sprite sheet.
        frame: u32,
        /// Cell that is redrawn.
        cell: CellCoord,
        /// Screen-space upper-left corner of the cell.
        position: Vec2,
    },
    /// Draws a projectile.
    Projectile {
        /// Sprite sheet of the projectile.
        sprite: Option<SpriteHandle>,
        /// Direction of travel, selecting the sprite frame.
        heading: Facing,
        /// Screen-space centre of the projectile.
        position: Vec2,
    },
    /// Fills an axis-aligned rectangle.
    Rect {
        /// Screen-space upper-left corner.
        min: Vec2,
        /// Screen-space lower-right corner.
        max: Vec2,
        /// Fill color.
        color: Color,
    },
    /// Outlines an axis-aligned rectangle.
    Outline {
        /// Screen-space upper-left corner.
        min: Vec2,
        /// Screen-space lower-right corner.
        max: Vec2,
        /// Stroke color.
        color: Color,
    },
    /// Draws a line segment.
    Line {
        /// Screen-space start point.
        from: Vec2,
        /// Screen-space end point.
        to: Vec2,
        /// Stroke color.
        color: Color,
    },
    /// Blends the fog mask over everything drawn so far.
    Fog {
        /// Screen-space position of the map's upper-left corner.
        origin: Vec2,
        /// Screen-space edge length of a single mask texel.
        texel_size: f32,
    },
}

/// Drawing target collecting the commands of one layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Surface {
    commands: Vec<DrawCommand>,
}

impl Surface {
    /// Commands recorded since the last clear, in drawing order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Reports whether nothing was drawn onto the surface.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

/// Flattened output of a composition pass, back to front.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Commands in the order they must be executed.
    pub commands: Vec<DrawCommand>,
}

/// Layered compositor that turns a [`Scene`] into a [`Frame`].
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    layers: [Surface; RenderLayer::ALL.len()],
    debug: Surface,
    frame: Frame,
}

impl Compositor {
    /// Creates a compositor with empty surfaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface of the provided layer as drawn by the last composition.
    #[must_use]
    pub fn layer(&self, layer: RenderLayer) -> &Surface {
        &self.layers[layer.index()]
    }

    /// Debug overlay surface as drawn by the last composition.
    #[must_use]
    pub fn debug_overlay(&self) -> &Surface {
        &self.debug
    }

    /// Draws the scene and composites the layers.
    ///
    /// Only entities whose bounds overlap the viewport are drawn. Within a
    /// layer, entities are ordered by z-index and then by their vertical
    /// position so that lower entities overlap higher ones.
    pub fn compose(&mut self, scene: &Scene) -> &Frame {
        for surface in &mut self.layers {
            surface.clear();
        }
        self.debug.clear();
        self.frame.commands.clear();

        let view = scene.viewport;
        let mut visible: Vec<&EntitySnapshot> = scene
            .entities
            .iter()
            .filter(|entity| {
                let (min, max) = entity.bounds.world_bounds();
                view.intersects(min, max)
            })
            .collect();
        visible.sort_by(|left, right| {
            left.z_index
                .cmp(&right.z_index)
                .then(left.position.y.total_cmp(&right.position.y))
                .then(left.id.cmp(&right.id))
        });

        for entity in &visible {
            self.draw_entity(&view, entity);
        }
        for projectile in &scene.projectiles {
            if view.intersects(projectile.position, projectile.position) {
                self.layers[RenderLayer::Overlay.index()].draw(DrawCommand::Projectile {
                    sprite: projectile.sprite,
                    heading: projectile.heading,
                    position: to_screen(&view, projectile.position),
                });
            }
        }
        if scene.debug {
            self.draw_debug(&view, scene, &visible);
        }

        for layer in RenderLayer::ALL {
            self.frame
                .commands
                .extend_from_slice(self.layers[layer.index()].commands());
        }
        if scene.fog_visible {
            self.frame.commands.push(DrawCommand::Fog {
                origin: to_screen(&view, Vec2::ZERO),
                texel_size: CELL_SIZE / MASK_TEXELS_PER_CELL as f32 * scale(&view),
            });
        }
        self.frame.commands.extend_from_slice(self.debug.commands());

        &self.frame
    }

    fn draw_entity(&mut self, view: &Viewport, entity: &EntitySnapshot) {
        let layer = entity.kind.traits().layer;
        let surface = &mut self.layers[layer.index()];
        surface.draw(DrawCommand::Sprite {
            entity: entity.id,
            sprite: entity.sprite,
            frame: entity.frame,
            position: to_screen(view, anchor(entity)),
        });
        if entity.selected {
            let (min, max) = entity.bounds.world_bounds();
            surface.draw(DrawCommand::Outline {
                min: to_screen(view, min),
                max: to_screen(view, max),
                color: SELECTION_COLOR,
            });
        }

        let overlay = &mut self.layers[RenderLayer::Overlay.index()];
        for cell in &entity.overlap {
            overlay.draw(DrawCommand::Overlap {
                entity: entity.id,
                sprite: entity.sprite,
                frame: entity.frame,
                cell: *cell,
                position: to_screen(view, cell.origin()),
            });
        }
    }

    fn draw_debug(&mut self, view: &Viewport, scene: &Scene, visible: &[&EntitySnapshot]) {
        let cell_extent = Vec2::splat(CELL_SIZE);
        for cell in &scene.impassable {
            let min = cell.origin();
            if view.intersects(min, min + cell_extent) {
                self.debug.draw(DrawCommand::Rect {
                    min: to_screen(view, min),
                    max: to_screen(view, min + cell_extent),
                    color: IMPASSABLE_COLOR,
                });
            }
        }

        let reach = CELL_SIZE / 2.0;
        for entity in visible {
            if entity.facing.slices() <= 1 {
                continue;
            }
            let center = entity.position;
            self.debug.draw(DrawCommand::Line {
                from: to_screen(view, center),
                to: to_screen(view, center + entity.facing.to_vector() * reach),
                color: FACING_COLOR,
            });
            if let Some(turret) = entity.turret {
                self.debug.draw(DrawCommand::Line {
                    from: to_screen(view, center),
                    to: to_screen(view, center + turret.to_vector() * reach * 0.75),
                    color: TURRET_COLOR.with_alpha(0.8),
                });
            }
        }
    }
}

/// World-space point a sprite is anchored at.
fn anchor(entity: &EntitySnapshot) -> Vec2 {
    match entity.kind {
        EntityKind::Unit | EntityKind::Infantry | EntityKind::Effect => entity.position,
        EntityKind::Structure | EntityKind::Terrain | EntityKind::Overlay | EntityKind::Smudge => {
            entity.bounds.world_bounds().0
        }
    }
}

fn scale(view: &Viewport) -> f32 {
    if view.scale > 0.0 {
        view.scale
    } else {
        1.0
    }
}

fn to_screen(view: &Viewport, point: Vec2) -> Vec2 {
    (point - view.origin) * scale(view)
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Skirmish scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the elapsed frame time
    /// and may mutate the scene before it is composited, which is where
    /// adapters advance the simulation and refresh world snapshots.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut Scene);
}
