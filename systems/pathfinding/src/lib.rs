#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Walkability grid and deterministic shortest-path search between cells.
//!
//! The grid is the authoritative record of which cells can be entered. Every
//! path query runs on a private clone so that speculative changes, such as
//! forcing an occupied destination walkable for an attack order, never leak
//! back into the map.

use std::{cmp::Reverse, collections::BinaryHeap};

use skirmish_core::CellCoord;
use tracing::trace;

const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Dense walkability matrix stored in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkabilityGrid {
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl WalkabilityGrid {
    /// Creates a grid where every cell is walkable.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![true; capacity],
        }
    }

    /// Provides the dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether the cell lies inside the grid and can be entered.
    ///
    /// Cells outside the grid are never walkable.
    #[must_use]
    pub fn is_walkable_at(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }

    /// Marks a single cell walkable or blocked. Out-of-bounds cells are ignored.
    pub fn set_walkable_at(&mut self, cell: CellCoord, walkable: bool) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = walkable;
            }
        }
    }

    /// Clamps a cell into the grid bounds.
    #[must_use]
    pub fn clamp(&self, cell: CellCoord) -> CellCoord {
        CellCoord::new(
            cell.column().min(self.columns.saturating_sub(1)),
            cell.row().min(self.rows.saturating_sub(1)),
        )
    }

    /// Iterates every blocked cell in row-major order.
    pub fn blocked_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, walkable)| !**walkable)
            .map(move |(index, _)| {
                CellCoord::new(index as u32 % columns, index as u32 / columns)
            })
    }

    /// Searches the shortest 8-directional path from `source` to `destination`.
    ///
    /// Both endpoints are clamped into the grid first. When
    /// `force_destination_walkable` is set the destination is treated as
    /// walkable, which lets an attacker path onto its target's cell. The
    /// returned cells exclude `source`; an empty vector means no route exists.
    #[must_use]
    pub fn find_path(
        &self,
        source: CellCoord,
        destination: CellCoord,
        force_destination_walkable: bool,
    ) -> Vec<CellCoord> {
        if self.cells.is_empty() {
            return Vec::new();
        }

        let source = self.clamp(source);
        let destination = self.clamp(destination);
        if source == destination {
            return Vec::new();
        }

        let mut scratch = self.clone();
        if force_destination_walkable {
            scratch.set_walkable_at(destination, true);
        }

        let path = scratch.search(source, destination);
        if path.is_empty() {
            trace!(?source, ?destination, "no path");
        }
        path
    }

    fn search(&self, source: CellCoord, destination: CellCoord) -> Vec<CellCoord> {
        if !self.is_walkable_at(destination) {
            return Vec::new();
        }

        let (Some(start), Some(goal)) = (self.index(source), self.index(destination)) else {
            return Vec::new();
        };

        let mut cost_so_far = vec![u32::MAX; self.cells.len()];
        let mut came_from: Vec<Option<usize>> = vec![None; self.cells.len()];
        let mut closed = vec![false; self.cells.len()];
        let mut open: BinaryHeap<Reverse<(u32, u32, usize)>> = BinaryHeap::new();

        cost_so_far[start] = 0;
        let start_estimate = octile_distance(source, destination);
        open.push(Reverse((start_estimate, start_estimate, start)));

        while let Some(Reverse((_, _, current))) = open.pop() {
            if closed[current] {
                continue;
            }
            closed[current] = true;

            if current == goal {
                return self.reconstruct(&came_from, start, goal);
            }

            let cell = self.cell_at(current);
            let current_cost = cost_so_far[current];

            for (column_offset, row_offset) in NEIGHBOR_OFFSETS {
                let Some(neighbor) = self.step(cell, column_offset, row_offset) else {
                    continue;
                };
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };
                if closed[neighbor_index] {
                    continue;
                }

                let step_cost = if column_offset != 0 && row_offset != 0 {
                    DIAGONAL_COST
                } else {
                    STRAIGHT_COST
                };
                let tentative = current_cost.saturating_add(step_cost);
                if tentative >= cost_so_far[neighbor_index] {
                    continue;
                }

                cost_so_far[neighbor_index] = tentative;
                came_from[neighbor_index] = Some(current);
                let estimate = octile_distance(neighbor, destination);
                open.push(Reverse((
                    tentative.saturating_add(estimate),
                    estimate,
                    neighbor_index,
                )));
            }
        }

        Vec::new()
    }

    /// Returns the neighbour reached by the offset when it can be entered.
    ///
    /// Diagonal steps require both orthogonal cells to be walkable so paths
    /// never clip the corner of a blocked cell.
    fn step(&self, cell: CellCoord, column_offset: i32, row_offset: i32) -> Option<CellCoord> {
        let neighbor = cell.offset(column_offset, row_offset)?;
        if !self.is_walkable_at(neighbor) {
            return None;
        }

        if column_offset != 0 && row_offset != 0 {
            let horizontal = cell.offset(column_offset, 0)?;
            let vertical = cell.offset(0, row_offset)?;
            if !self.is_walkable_at(horizontal) || !self.is_walkable_at(vertical) {
                return None;
            }
        }

        Some(neighbor)
    }

    fn reconstruct(&self, came_from: &[Option<usize>], start: usize, goal: usize) -> Vec<CellCoord> {
        let mut path = Vec::new();
        let mut current = goal;
        while current != start {
            path.push(self.cell_at(current));
            match came_from.get(current).copied().flatten() {
                Some(previous) => current = previous,
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }

    fn cell_at(&self, index: usize) -> CellCoord {
        let columns = self.columns.max(1) as usize;
        CellCoord::new((index % columns) as u32, (index / columns) as u32)
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
}

fn octile_distance(from: CellCoord, to: CellCoord) -> u32 {
    let column_diff = from.column().abs_diff(to.column());
    let row_diff = from.row().abs_diff(to.row());
    let straight = column_diff.max(row_diff);
    let diagonal = column_diff.min(row_diff);
    STRAIGHT_COST * straight + (DIAGONAL_COST - STRAIGHT_COST) * diagonal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_cells_are_never_walkable() {
        let grid = WalkabilityGrid::new(3, 3);
        assert!(grid.is_walkable_at(CellCoord::new(2, 2)));
        assert!(!grid.is_walkable_at(CellCoord::new(3, 0)));
        assert!(!grid.is_walkable_at(CellCoord::new(0, 3)));
    }

    #[test]
    fn octile_heuristic_matches_diagonal_cost() {
        assert_eq!(octile_distance(CellCoord::new(0, 0), CellCoord::new(5, 5)), 70);
        assert_eq!(octile_distance(CellCoord::new(0, 0), CellCoord::new(3, 1)), 34);
    }

    #[test]
    fn blocked_cells_are_enumerated() {
        let mut grid = WalkabilityGrid::new(4, 2);
        grid.set_walkable_at(CellCoord::new(3, 1), false);
        grid.set_walkable_at(CellCoord::new(1, 0), false);
        let blocked: Vec<_> = grid.blocked_cells().collect();
        assert_eq!(blocked, vec![CellCoord::new(1, 0), CellCoord::new(3, 1)]);
    }

    #[test]
    fn diagonal_steps_do_not_cut_corners() {
        let mut grid = WalkabilityGrid::new(2, 2);
        grid.set_walkable_at(CellCoord::new(1, 0), false);
        assert_eq!(grid.step(CellCoord::new(0, 0), 1, 1), None);
        assert_eq!(
            grid.step(CellCoord::new(0, 0), 0, 1),
            Some(CellCoord::new(0, 1))
        );
    }
}
