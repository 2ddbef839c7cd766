#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fog-of-war visibility grid and the soft mask drawn over the battlefield.
//!
//! Gameplay only ever asks whether a cell has been revealed. The distinction
//! between [`Visibility::Revealed`] and [`Visibility::Stale`] exists for the
//! mask: freshly revealed cells are punched out of the fog on the next
//! redraw and then demoted so later redraws skip them.

use skirmish_core::{CellCoord, CellRect};
use tracing::debug;

/// Mask texels along each edge of a cell.
pub const MASK_TEXELS_PER_CELL: u32 = 4;

const DISC_RADIUS_CELLS: f32 = 1.5;
const DISC_SOLID_FRACTION: f32 = 0.5;

/// Visibility of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Visibility {
    /// Never seen.
    #[default]
    Unrevealed = 0,
    /// Seen, waiting for the mask to punch it out.
    Revealed = 1,
    /// Seen and already drawn into the mask.
    Stale = 2,
}

impl Visibility {
    /// Reports whether the cell is visible for gameplay purposes.
    #[must_use]
    pub const fn is_revealed(self) -> bool {
        self as u8 > 0
    }
}

/// Per-cell visibility stored in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Visibility>,
}

impl VisibilityGrid {
    /// Creates a grid where every cell is unrevealed.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![Visibility::Unrevealed; capacity],
        }
    }

    /// Provides the dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Visibility of the cell; cells outside the grid are unrevealed.
    #[must_use]
    pub fn value_at(&self, cell: CellCoord) -> Visibility {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    /// Reports whether the cell is visible for gameplay purposes.
    #[must_use]
    pub fn is_revealed_at(&self, cell: CellCoord) -> bool {
        self.value_at(cell).is_revealed()
    }

    /// Reveals the square around `bounds` grown by `sight` cells, clipped to the grid.
    ///
    /// Only unrevealed cells change; the number of newly revealed cells is returned.
    pub fn reveal_around(&mut self, bounds: CellRect, sight: u32) -> usize {
        let area = bounds.inflated(sight, self.columns, self.rows);
        let mut revealed = 0;
        for cell in area.cells() {
            let Some(index) = self.index(cell) else {
                continue;
            };
            if let Some(slot) = self.cells.get_mut(index) {
                if *slot == Visibility::Unrevealed {
                    *slot = Visibility::Revealed;
                    revealed += 1;
                }
            }
        }
        revealed
    }

    /// Number of cells visible for gameplay purposes.
    #[must_use]
    pub fn revealed_count(&self) -> usize {
        self.cells.iter().filter(|value| value.is_revealed()).count()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn cell_at(&self, index: usize) -> CellCoord {
        let columns = self.columns.max(1) as usize;
        CellCoord::new((index % columns) as u32, (index / columns) as u32)
    }
}

/// Opaque fog layer with soft holes punched where cells were revealed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FogMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl FogMask {
    /// Creates a fully opaque mask covering `columns` by `rows` cells.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let width = columns.saturating_mul(MASK_TEXELS_PER_CELL);
        let height = rows.saturating_mul(MASK_TEXELS_PER_CELL);
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            alpha: vec![u8::MAX; capacity],
        }
    }

    /// Dimensions of the mask in texels.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Fog opacity at the texel; texels outside the mask are opaque.
    #[must_use]
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return u8::MAX;
        }
        self.alpha
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(u8::MAX)
    }

    /// Fog opacity sampled at the centre of a cell.
    #[must_use]
    pub fn alpha_at_cell(&self, cell: CellCoord) -> u8 {
        let half = MASK_TEXELS_PER_CELL / 2;
        self.alpha_at(
            cell.column().saturating_mul(MASK_TEXELS_PER_CELL) + half,
            cell.row().saturating_mul(MASK_TEXELS_PER_CELL) + half,
        )
    }

    /// Raw opacity values in row-major order.
    #[must_use]
    pub fn texels(&self) -> &[u8] {
        &self.alpha
    }

    /// Punches a soft disc out of the fog for every freshly revealed cell.
    ///
    /// Each processed cell is demoted to [`Visibility::Stale`] so the next
    /// redraw skips it. Returns the number of processed cells.
    pub fn redraw(&mut self, grid: &mut VisibilityGrid) -> usize {
        let fresh: Vec<usize> = grid
            .cells
            .iter()
            .enumerate()
            .filter(|(_, value)| **value == Visibility::Revealed)
            .map(|(index, _)| index)
            .collect();

        for &index in &fresh {
            let cell = grid.cell_at(index);
            self.punch_disc(cell);
            if let Some(slot) = grid.cells.get_mut(index) {
                *slot = Visibility::Stale;
            }
        }

        if !fresh.is_empty() {
            debug!(cells = fresh.len(), "fog mask redrawn");
        }
        fresh.len()
    }

    /// Composites a disc destination-out: existing opacity is scaled by `1 - coverage`.
    fn punch_disc(&mut self, cell: CellCoord) {
        let texels = MASK_TEXELS_PER_CELL as f32;
        let radius = DISC_RADIUS_CELLS * texels;
        let solid = radius * DISC_SOLID_FRACTION;
        let center_x = (cell.column() as f32 + 0.5) * texels;
        let center_y = (cell.row() as f32 + 0.5) * texels;

        let min_x = (center_x - radius).floor().max(0.0) as u32;
        let min_y = (center_y - radius).floor().max(0.0) as u32;
        let max_x = ((center_x + radius).ceil() as u32).min(self.width);
        let max_y = ((center_y + radius).ceil() as u32).min(self.height);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let dx = x as f32 + 0.5 - center_x;
                let dy = y as f32 + 0.5 - center_y;
                let distance = (dx * dx + dy * dy).sqrt();
                let coverage = if distance <= solid {
                    1.0
                } else if distance >= radius {
                    0.0
                } else {
                    1.0 - (distance - solid) / (radius - solid)
                };
                if coverage <= 0.0 {
                    continue;
                }

                let index = y as usize * self.width as usize + x as usize;
                if let Some(alpha) = self.alpha.get_mut(index) {
                    *alpha = (f32::from(*alpha) * (1.0 - coverage)).round() as u8;
                }
            }
        }
    }
}

/// Throttles mask redraws to every `interval`-th rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedrawCadence {
    interval: u32,
    frames: u32,
}

impl RedrawCadence {
    /// Creates a cadence that fires on the first frame and every `interval` frames after.
    #[must_use]
    pub const fn new(interval: u32) -> Self {
        Self {
            interval: if interval == 0 { 1 } else { interval },
            frames: 0,
        }
    }

    /// Records a rendered frame and reports whether the mask should be redrawn.
    pub fn frame(&mut self) -> bool {
        let due = self.frames % self.interval == 0;
        self.frames = self.frames.wrapping_add(1);
        due
    }
}
