//! Point queries against the terrain surface
//!
//! Every query first locates the owning cell through the quadtree and then
//! works on the height field around it. Queries off the course are clamped
//! onto its footprint and never fail.

use glam::{UVec2, Vec2, Vec3};

use crate::height_field::{gradient_normal, HeightField};
use crate::quadtree::{CellLocation, Quadtree};
use crate::terrain_type::TerrainType;

/// Everything the physics needs to know about the ground under a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    pub height: f32,
    pub normal: Vec3,
    pub terrain: TerrainType,
    /// Indices of the owning cell
    pub cell: UVec2,
    /// The query point was off the course and the answer is the boundary's
    pub clamped: bool,
}

/// Read-only view combining a height field and its quadtree
#[derive(Debug, Clone, Copy)]
pub struct TerrainSampler<'a> {
    field: &'a HeightField,
    tree: &'a Quadtree,
}

impl<'a> TerrainSampler<'a> {
    pub fn new(field: &'a HeightField, tree: &'a Quadtree) -> Self {
        Self { field, tree }
    }

    /// Interpolated terrain height at `(x, z)`
    ///
    /// Bilinear between the four samples surrounding the point. Exact at
    /// sample positions; points off the grid use the nearest edge samples.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let location = self.tree.locate_cell(Vec2::new(x, z));
        self.interpolate(Vec2::new(x, z), &location)
    }

    /// Surface normal at `(x, z)` from a central difference of heights
    ///
    /// The difference spans one cell and slides inward at the course border
    /// so it always straddles real samples. Flat regions return `Vec3::Y`.
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let center = self.tree.bounds().clamp(Vec2::new(x, z));
        let span = self.field.cell_size();
        let first = self.field.cell_center(0, 0);
        let last = self.field.cell_center(self.field.width() - 1, self.field.depth() - 1);

        let (x0, x1) = difference_window(center.x, span, first.x, last.x);
        let (z0, z1) = difference_window(center.y, span, first.y, last.y);

        let dhdx = if x1 > x0 {
            (self.height_at(x1, center.y) - self.height_at(x0, center.y)) / (x1 - x0)
        } else {
            0.0
        };
        let dhdz = if z1 > z0 {
            (self.height_at(center.x, z1) - self.height_at(center.x, z0)) / (z1 - z0)
        } else {
            0.0
        };

        gradient_normal(dhdx, dhdz)
    }

    /// Surface material of the cell owning `(x, z)`
    pub fn terrain_type_at(&self, x: f32, z: f32) -> TerrainType {
        let location = self.tree.locate_cell(Vec2::new(x, z));
        self.field.cell(location.cell.x, location.cell.y).terrain
    }

    /// Height, normal and material in one call
    pub fn sample(&self, x: f32, z: f32) -> TerrainSample {
        let point = Vec2::new(x, z);
        let location = self.tree.locate_cell(point);
        TerrainSample {
            height: self.interpolate(point, &location),
            normal: self.normal_at(x, z),
            terrain: self.field.cell(location.cell.x, location.cell.y).terrain,
            cell: location.cell,
            clamped: location.clamped,
        }
    }

    /// Precomputed normal stored on the owning cell
    pub fn cell_normal_at(&self, x: f32, z: f32) -> Vec3 {
        let location = self.tree.locate_cell(Vec2::new(x, z));
        self.field.cell(location.cell.x, location.cell.y).normal
    }

    pub fn field(&self) -> &'a HeightField {
        self.field
    }

    pub fn tree(&self) -> &'a Quadtree {
        self.tree
    }

    fn interpolate(&self, point: Vec2, location: &CellLocation) -> f32 {
        let dims = self.field.dims();
        let max = (dims - UVec2::ONE).as_vec2();
        let grid = self.field.grid_coords(point);
        let grid = if grid.is_finite() {
            grid.clamp(Vec2::ZERO, max)
        } else {
            location.cell.as_vec2()
        };

        // The owning cell is one corner of the surrounding quad; pick the
        // quad on the side of the cell the point falls on.
        let lower = |g: f32, owner: u32, n: u32| -> u32 {
            if n < 2 {
                return 0;
            }
            let start = if g < owner as f32 { owner.saturating_sub(1) } else { owner };
            start.min(n - 2)
        };
        let i0 = lower(grid.x, location.cell.x, dims.x);
        let j0 = lower(grid.y, location.cell.y, dims.y);
        let i1 = (i0 + 1).min(dims.x - 1);
        let j1 = (j0 + 1).min(dims.y - 1);

        let tx = (grid.x - i0 as f32).clamp(0.0, 1.0);
        let tz = (grid.y - j0 as f32).clamp(0.0, 1.0);

        let h00 = self.field.height(i0, j0);
        let h10 = self.field.height(i1, j0);
        let h01 = self.field.height(i0, j1);
        let h11 = self.field.height(i1, j1);

        let a = lerp(h00, h10, tx);
        let b = lerp(h01, h11, tx);
        lerp(a, b, tz)
    }
}

/// Interval of width `span` around `center`, shifted to lie within `[lo, hi]`
fn difference_window(center: f32, span: f32, lo: f32, hi: f32) -> (f32, f32) {
    let mut a = center - 0.5 * span;
    let mut b = center + 0.5 * span;
    if b > hi {
        a -= b - hi;
        b = hi;
    }
    if a < lo {
        b += lo - a;
        a = lo;
    }
    (a.max(lo), b.min(hi))
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
