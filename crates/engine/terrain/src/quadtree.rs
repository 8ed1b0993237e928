//! Quadtree spatial index over a height field
//!
//! The tree is built once per course and is read-only afterwards. Each node
//! covers a rectangle of cell indices; branches split that rectangle into up
//! to four quadrants, leaves keep the cell range they cover plus the
//! obstacles whose bounding disk touches them.
//!
//! # Quadrant order
//!
//! Children are stored in index order `x_half + 2 * z_half`:
//!
//! ```text
//!        +x -->
//!   +z  [0][1]
//!   |   [2][3]
//!   v
//! ```
//!
//! Points lying exactly on a shared edge resolve to the lowest-index child,
//! which keeps collision results reproducible from frame to frame.
//!
//! # Reach
//!
//! For disk tests every node whose rectangle touches the course border is
//! treated as extending to infinity on that side. The reach rectangles of the
//! leaves therefore tile the whole plane, so an obstacle or query disk lying
//! partly or entirely off the course still meets the border leaves it is
//! closest to.

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{CourseError, Result};
use crate::height_field::HeightField;
use crate::obstacle::Obstacle;
use crate::rect::Rect;

/// Quadtree build parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeConfig {
    /// A node becomes a leaf once it covers this many cells or fewer
    pub split_threshold: usize,
    /// Hard limit on tree depth (root is depth 0)
    pub max_depth: u32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            split_threshold: 64,
            max_depth: 16,
        }
    }
}

impl QuadtreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.split_threshold == 0 {
            return Err(CourseError::InvalidQuadtreeConfig(
                "split_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Half-open rectangle of cell indices `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min: UVec2,
    pub max: UVec2,
}

impl CellRange {
    pub fn new(min: UVec2, max: UVec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.width() as usize * self.depth() as usize
    }

    #[inline]
    pub fn contains(&self, cell: UVec2) -> bool {
        cell.x >= self.min.x && cell.x < self.max.x && cell.y >= self.min.y && cell.y < self.max.y
    }

    /// Iterate over all cell indices in row-major order
    pub fn iter(&self) -> impl Iterator<Item = UVec2> + '_ {
        (self.min.y..self.max.y)
            .flat_map(move |j| (self.min.x..self.max.x).map(move |i| UVec2::new(i, j)))
    }

    /// Split into up to four quadrants in index order
    ///
    /// An axis with a single cell is not split, so thin ranges produce two
    /// children instead of four.
    fn quadrants(&self) -> Vec<CellRange> {
        let xs = split_span(self.min.x, self.max.x);
        let zs = split_span(self.min.y, self.max.y);

        let mut out = Vec::with_capacity(4);
        for &(z0, z1) in &zs {
            for &(x0, x1) in &xs {
                out.push(CellRange::new(UVec2::new(x0, z0), UVec2::new(x1, z1)));
            }
        }
        out
    }
}

fn split_span(lo: u32, hi: u32) -> Vec<(u32, u32)> {
    if hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        vec![(lo, mid), (mid, hi)]
    } else {
        vec![(lo, hi)]
    }
}

/// Index of a leaf within [`Quadtree::leaves`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub u32);

/// Terminal region of the tree
///
/// Holds non-owning references into the height field (as an index range)
/// and into the course's obstacle list (as indices).
#[derive(Debug, Clone)]
pub struct Leaf {
    pub id: LeafId,
    pub rect: Rect,
    pub cells: CellRange,
    pub depth: u32,
    /// Indices into the obstacle slice the tree was built with
    pub obstacles: Vec<usize>,
}

/// Borrowed leaf returned by queries
pub type LeafRef<'a> = &'a Leaf;

#[derive(Debug, Clone)]
enum QuadNode {
    Branch {
        rect: Rect,
        reach: Rect,
        children: Vec<QuadNode>,
    },
    Leaf {
        rect: Rect,
        reach: Rect,
        leaf: LeafId,
    },
}

impl QuadNode {
    #[inline]
    fn rect(&self) -> &Rect {
        match self {
            QuadNode::Branch { rect, .. } | QuadNode::Leaf { rect, .. } => rect,
        }
    }

    #[inline]
    fn reach(&self) -> &Rect {
        match self {
            QuadNode::Branch { reach, .. } | QuadNode::Leaf { reach, .. } => reach,
        }
    }
}

/// Extend the sides of `rect` that lie on the grid border to infinity
fn reach_of(rect: Rect, range: &CellRange, dims: UVec2) -> Rect {
    let mut reach = rect;
    if range.min.x == 0 {
        reach.min.x = f32::NEG_INFINITY;
    }
    if range.min.y == 0 {
        reach.min.y = f32::NEG_INFINITY;
    }
    if range.max.x >= dims.x {
        reach.max.x = f32::INFINITY;
    }
    if range.max.y >= dims.y {
        reach.max.y = f32::INFINITY;
    }
    reach
}

/// Result of locating a point in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLocation {
    pub leaf: LeafId,
    /// Owning cell indices
    pub cell: UVec2,
    /// The query point was outside the course and got clamped onto it
    pub clamped: bool,
}

/// Spatial index over a height field and its obstacles
#[derive(Debug, Clone)]
pub struct Quadtree {
    root: QuadNode,
    leaves: Vec<Leaf>,
    origin: Vec2,
    cell_size: f32,
    max_depth_reached: u32,
}

impl Quadtree {
    /// Build the tree over a height field and insert obstacles
    ///
    /// A branch stops splitting once it covers `split_threshold` cells or
    /// fewer, or once `max_depth` is reached. A field without cells yields a
    /// root-only tree with one empty leaf holding every obstacle.
    ///
    /// # Arguments
    /// * `field` - Height field to index
    /// * `obstacles` - Obstacle catalog; the tree stores indices into it
    /// * `config` - Split threshold and depth limit
    pub fn build(field: &HeightField, obstacles: &[Obstacle], config: &QuadtreeConfig) -> Self {
        let start = Instant::now();
        let range = CellRange::new(UVec2::ZERO, field.dims());

        let mut tree = Self {
            root: QuadNode::Leaf {
                rect: field.footprint(),
                reach: reach_of(field.footprint(), &range, field.dims()),
                leaf: LeafId(0),
            },
            leaves: Vec::new(),
            origin: field.origin(),
            cell_size: field.cell_size(),
            max_depth_reached: 0,
        };

        if field.cell_count() == 0 {
            tree.leaves.push(Leaf {
                id: LeafId(0),
                rect: field.footprint(),
                cells: range,
                depth: 0,
                obstacles: (0..obstacles.len()).collect(),
            });
            return tree;
        }

        let split_threshold = config.split_threshold.max(1);
        tree.root = tree.build_node(field, range, 0, split_threshold, config.max_depth);

        for (index, obstacle) in obstacles.iter().enumerate() {
            tree.insert_obstacle(index, obstacle);
        }

        tracing::debug!(
            "[Quadtree] built {} leaves over {} cells (depth {}, {} obstacles) in {:.2}ms",
            tree.leaves.len(),
            field.cell_count(),
            tree.max_depth_reached,
            obstacles.len(),
            start.elapsed().as_secs_f32() * 1000.0
        );

        tree
    }

    fn build_node(
        &mut self,
        field: &HeightField,
        range: CellRange,
        depth: u32,
        split_threshold: usize,
        max_depth: u32,
    ) -> QuadNode {
        let rect = field.range_rect(range.min.x, range.max.x, range.min.y, range.max.y);
        let reach = reach_of(rect, &range, field.dims());
        self.max_depth_reached = self.max_depth_reached.max(depth);

        let quadrants = range.quadrants();
        if range.count() <= split_threshold || depth >= max_depth || quadrants.len() < 2 {
            let id = LeafId(self.leaves.len() as u32);
            self.leaves.push(Leaf {
                id,
                rect,
                cells: range,
                depth,
                obstacles: Vec::new(),
            });
            return QuadNode::Leaf {
                rect,
                reach,
                leaf: id,
            };
        }

        let children = quadrants
            .into_iter()
            .map(|quadrant| self.build_node(field, quadrant, depth + 1, split_threshold, max_depth))
            .collect();

        QuadNode::Branch {
            rect,
            reach,
            children,
        }
    }

    /// Register an obstacle in every leaf whose reach its bounding disk touches
    fn insert_obstacle(&mut self, index: usize, obstacle: &Obstacle) {
        let center = obstacle.ground_position();
        let mut hits = Vec::new();
        collect_leaves(&self.root, center, obstacle.radius, &mut hits);

        for leaf in hits {
            self.leaves[leaf.0 as usize].obstacles.push(index);
        }
    }

    /// World rectangle covered by the tree
    pub fn bounds(&self) -> &Rect {
        self.root.rect()
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn leaf(&self, id: LeafId) -> LeafRef<'_> {
        &self.leaves[id.0 as usize]
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Deepest level any leaf sits at
    pub fn depth(&self) -> u32 {
        self.max_depth_reached
    }

    /// Find the leaf containing `point`
    ///
    /// Points outside the course are clamped onto its boundary first, so
    /// this always returns a leaf.
    pub fn locate(&self, point: Vec2) -> LeafRef<'_> {
        self.leaf(self.locate_cell(point).leaf)
    }

    /// Find the leaf and owning cell for `point`
    pub fn locate_cell(&self, point: Vec2) -> CellLocation {
        let bounds = self.bounds();
        let clamped_point = bounds.clamp(point);
        let clamped = clamped_point != point;

        let mut node = &self.root;
        let leaf_id = loop {
            match node {
                QuadNode::Leaf { leaf, .. } => break *leaf,
                QuadNode::Branch { children, .. } => {
                    // Closed rectangles: the first match is the lowest index on ties
                    node = children
                        .iter()
                        .find(|child| child.rect().contains(clamped_point))
                        .unwrap_or(&children[0]);
                }
            }
        };

        let leaf = self.leaf(leaf_id);
        CellLocation {
            leaf: leaf_id,
            cell: self.cell_in_leaf(leaf, clamped_point),
            clamped,
        }
    }

    /// Owning cell of a point already known to lie in `leaf`
    ///
    /// A point on the edge between two cells belongs to the lower one.
    fn cell_in_leaf(&self, leaf: &Leaf, point: Vec2) -> UVec2 {
        if leaf.cells.count() == 0 {
            return leaf.cells.min;
        }
        let grid = (point - self.origin) / self.cell_size;
        let owner = |g: f32, lo: u32, hi: u32| -> u32 {
            let index = (g - 0.5).ceil();
            (index.max(lo as f32) as u32).min(hi - 1)
        };
        UVec2::new(
            owner(grid.x, leaf.cells.min.x, leaf.cells.max.x),
            owner(grid.y, leaf.cells.min.y, leaf.cells.max.y),
        )
    }

    /// All leaves whose reach intersects the disk around `point`
    ///
    /// Adjacent leaves near the disk's edge may be returned too; no leaf that
    /// intersects the disk is ever left out. Disks off the course return the
    /// border leaves facing them.
    pub fn query_radius(&self, point: Vec2, radius: f32) -> Vec<LeafRef<'_>> {
        if !(point.is_finite() && radius.is_finite()) {
            return Vec::new();
        }
        let mut ids = Vec::new();
        collect_leaves(&self.root, point, radius.max(0.0), &mut ids);
        ids.into_iter().map(|id| self.leaf(id)).collect()
    }

    /// Candidate obstacle indices near `point`, sorted and deduplicated
    ///
    /// Every obstacle whose disk intersects the query disk is included. The
    /// intersection of the two disks lies in some leaf's reach, and both
    /// disks were tested against that reach. Callers perform the exact
    /// distance test.
    pub fn obstacle_candidates(&self, point: Vec2, radius: f32) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .query_radius(point, radius)
            .into_iter()
            .flat_map(|leaf| leaf.obstacles.iter().copied())
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

fn collect_leaves(node: &QuadNode, center: Vec2, radius: f32, out: &mut Vec<LeafId>) {
    if !node.reach().intersects_disk(center, radius) {
        return;
    }
    match node {
        QuadNode::Leaf { leaf, .. } => out.push(*leaf),
        QuadNode::Branch { children, .. } => {
            for child in children {
                collect_leaves(child, center, radius, out);
            }
        }
    }
}
