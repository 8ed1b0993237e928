//! Height field storage
//!
//! A regular grid of terrain cells. Cell `(i, j)` is a sample point located at
//! `origin + (i, j) * cell_size` and owns the `cell_size` square centred on it,
//! so the course footprint extends half a cell beyond the outermost samples.

use glam::{UVec2, Vec2, Vec3};

use crate::error::{CourseError, Result};
use crate::rect::Rect;
use crate::terrain_type::TerrainType;

/// One terrain sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightCell {
    /// Elevation in world units
    pub height: f32,
    /// Surface material
    pub terrain: TerrainType,
    /// Unit surface normal precomputed at load time
    pub normal: Vec3,
}

/// Regular grid of terrain samples
///
/// Dimensions are fixed at construction and never change afterwards.
#[derive(Debug, Clone)]
pub struct HeightField {
    dims: UVec2,
    cell_size: f32,
    origin: Vec2,
    cells: Vec<HeightCell>,
}

impl HeightField {
    /// Create a height field from a flat, row-major list of samples
    ///
    /// # Arguments
    /// * `dims` - Number of cells along X (`dims.x`) and Z (`dims.y`)
    /// * `cell_size` - World-space spacing between samples
    /// * `origin` - World position of cell `(0, 0)`
    /// * `samples` - `(height, terrain)` pairs, index `i + j * dims.x`
    ///
    /// # Errors
    /// Rejects zero-sized grids, non-positive cell sizes and sample lists whose
    /// length does not match `dims`.
    pub fn new(
        dims: UVec2,
        cell_size: f32,
        origin: Vec2,
        samples: Vec<(f32, TerrainType)>,
    ) -> Result<Self> {
        if dims.x == 0 || dims.y == 0 {
            return Err(CourseError::EmptyGrid {
                width: dims.x,
                depth: dims.y,
            });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(CourseError::InvalidCellSize(cell_size));
        }
        let expected = dims.x as usize * dims.y as usize;
        if samples.len() != expected {
            return Err(CourseError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }

        let cells = samples
            .into_iter()
            .map(|(height, terrain)| HeightCell {
                height,
                terrain,
                normal: Vec3::Y,
            })
            .collect();

        let mut field = Self {
            dims,
            cell_size,
            origin,
            cells,
        };
        field.compute_normals();
        Ok(field)
    }

    /// Create a height field by evaluating `f(i, j)` for every cell
    pub fn from_fn<F>(dims: UVec2, cell_size: f32, origin: Vec2, f: F) -> Result<Self>
    where
        F: Fn(u32, u32) -> (f32, TerrainType),
    {
        let mut samples = Vec::with_capacity(dims.x as usize * dims.y as usize);
        for j in 0..dims.y {
            for i in 0..dims.x {
                samples.push(f(i, j));
            }
        }
        Self::new(dims, cell_size, origin, samples)
    }

    /// Create a level height field of a single terrain type
    pub fn flat(
        dims: UVec2,
        cell_size: f32,
        origin: Vec2,
        height: f32,
        terrain: TerrainType,
    ) -> Result<Self> {
        Self::from_fn(dims, cell_size, origin, |_, _| (height, terrain))
    }

    #[inline]
    pub fn dims(&self) -> UVec2 {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.dims.x
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.dims.y
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn index(&self, i: u32, j: u32) -> usize {
        i as usize + j as usize * self.dims.x as usize
    }

    /// Get a cell, clamping the indices into the grid
    #[inline]
    pub fn cell(&self, i: u32, j: u32) -> &HeightCell {
        let i = i.min(self.dims.x - 1);
        let j = j.min(self.dims.y - 1);
        &self.cells[self.index(i, j)]
    }

    /// Height of a cell, clamping the indices into the grid
    #[inline]
    pub fn height(&self, i: u32, j: u32) -> f32 {
        self.cell(i, j).height
    }

    pub fn cells(&self) -> &[HeightCell] {
        &self.cells
    }

    /// World-space ground position of a cell's sample point
    #[inline]
    pub fn cell_center(&self, i: u32, j: u32) -> Vec2 {
        self.origin + Vec2::new(i as f32, j as f32) * self.cell_size
    }

    /// Fractional grid coordinates of a ground-plane point (not clamped)
    #[inline]
    pub fn grid_coords(&self, point: Vec2) -> Vec2 {
        (point - self.origin) / self.cell_size
    }

    /// World rectangle covered by the cell index range `[i0, i1) x [j0, j1)`
    pub fn range_rect(&self, i0: u32, i1: u32, j0: u32, j1: u32) -> Rect {
        let half = 0.5 * self.cell_size;
        let min = self.origin + Vec2::new(i0 as f32, j0 as f32) * self.cell_size - Vec2::splat(half);
        let max = self.origin + Vec2::new(i1 as f32, j1 as f32) * self.cell_size - Vec2::splat(half);
        Rect::new(min, max)
    }

    /// World rectangle covered by the whole grid
    pub fn footprint(&self) -> Rect {
        self.range_rect(0, self.dims.x, 0, self.dims.y)
    }

    /// Lowest and highest sample heights
    pub fn height_range(&self) -> (f32, f32) {
        self.cells
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), cell| {
                (lo.min(cell.height), hi.max(cell.height))
            })
    }

    /// Fill in per-cell normals from central differences of neighbouring heights
    ///
    /// Border cells fall back to one-sided differences.
    fn compute_normals(&mut self) {
        let (w, d) = (self.dims.x, self.dims.y);
        let mut normals = Vec::with_capacity(self.cells.len());

        for j in 0..d {
            for i in 0..w {
                let (il, ir) = (i.saturating_sub(1), (i + 1).min(w - 1));
                let (jl, jr) = (j.saturating_sub(1), (j + 1).min(d - 1));

                let dhdx = if ir > il {
                    (self.height(ir, j) - self.height(il, j)) / ((ir - il) as f32 * self.cell_size)
                } else {
                    0.0
                };
                let dhdz = if jr > jl {
                    (self.height(i, jr) - self.height(i, jl)) / ((jr - jl) as f32 * self.cell_size)
                } else {
                    0.0
                };

                normals.push(gradient_normal(dhdx, dhdz));
            }
        }

        for (cell, normal) in self.cells.iter_mut().zip(normals) {
            cell.normal = normal;
        }
    }
}

/// Unit normal of the surface `y = h(x, z)` given its partial derivatives
///
/// Returns `Vec3::Y` for a flat or non-finite gradient.
pub fn gradient_normal(dhdx: f32, dhdz: f32) -> Vec3 {
    if !(dhdx.is_finite() && dhdz.is_finite()) || (dhdx * dhdx + dhdz * dhdz) < 1e-12 {
        return Vec3::Y;
    }
    Vec3::new(-dhdx, 1.0, -dhdz).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_grid() {
        let result = HeightField::new(UVec2::new(0, 4), 1.0, Vec2::ZERO, vec![]);
        assert_eq!(result.unwrap_err(), CourseError::EmptyGrid { width: 0, depth: 4 });
    }

    #[test]
    fn test_rejects_mismatched_samples() {
        let samples = vec![(0.0, TerrainType::Snow); 5];
        let result = HeightField::new(UVec2::new(2, 2), 1.0, Vec2::ZERO, samples);
        assert!(matches!(
            result,
            Err(CourseError::SampleCountMismatch { expected: 4, actual: 5 })
        ));
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let result = HeightField::flat(UVec2::new(2, 2), 0.0, Vec2::ZERO, 0.0, TerrainType::Ice);
        assert!(matches!(result, Err(CourseError::InvalidCellSize(_))));
    }

    #[test]
    fn test_footprint_extends_half_cell() {
        let field =
            HeightField::flat(UVec2::new(4, 3), 2.0, Vec2::new(10.0, 0.0), 0.0, TerrainType::Snow)
                .unwrap();
        let footprint = field.footprint();
        assert_eq!(footprint.min, Vec2::new(9.0, -1.0));
        assert_eq!(footprint.max, Vec2::new(17.0, 5.0));
    }

    #[test]
    fn test_flat_normals_point_up() {
        let field =
            HeightField::flat(UVec2::new(3, 3), 1.0, Vec2::ZERO, 5.0, TerrainType::Snow).unwrap();
        assert!(field.cells().iter().all(|c| c.normal == Vec3::Y));
    }

    #[test]
    fn test_sloped_normals() {
        // h = x, so the normal leans toward -X at 45 degrees
        let field = HeightField::from_fn(UVec2::new(4, 4), 1.0, Vec2::ZERO, |i, _| {
            (i as f32, TerrainType::Snow)
        })
        .unwrap();
        let expected = Vec3::new(-1.0, 1.0, 0.0).normalize();
        for cell in field.cells() {
            assert!((cell.normal - expected).length() < 1e-5);
        }
    }

    #[test]
    fn test_single_cell_grid() {
        let field =
            HeightField::flat(UVec2::new(1, 1), 1.0, Vec2::ZERO, 3.0, TerrainType::Rock).unwrap();
        assert_eq!(field.cell_count(), 1);
        assert_eq!(field.cell(7, 9).height, 3.0);
        assert_eq!(field.cell(0, 0).normal, Vec3::Y);
    }
}
