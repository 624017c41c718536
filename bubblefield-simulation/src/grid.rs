use crate::bubble::Bubble;
use bubblefield_core::{Dimensions, Vec2};
use rand::Rng;
use smallvec::SmallVec;
use std::collections::HashSet;

/// Below this center distance the collision normal is unreliable.
const MIN_SEPARATION: f32 = 0.1;

// --- Spatial Partitioning ---

/// Uniform grid over the canvas used to resolve bubble collisions.
///
/// Each collidable bubble is bucketed by its center; pairs are only tested against the
/// same and the eight surrounding cells. Buffers are kept between frames.
#[derive(Debug, Default)]
pub struct CollisionGrid {
    cell_size: f32,
    cols: i32,
    rows: i32,
    cells: Vec<SmallVec<[usize; 8]>>,
    seen: HashSet<(usize, usize)>,
}

impl CollisionGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the grid cell coordinates for a position, clamped to the edge cells
    fn get_cell(&self, pos: Vec2) -> (i32, i32) {
        let x = (pos.x / self.cell_size).floor() as i32;
        let y = (pos.y / self.cell_size).floor() as i32;
        (x.clamp(0, self.cols - 1), y.clamp(0, self.rows - 1))
    }

    fn rebuild(&mut self, bubbles: &[Bubble], area: Dimensions, cell_size: f32) {
        self.cell_size = cell_size.max(1.0);
        self.cols = ((area.width / self.cell_size).ceil() as i32).max(1);
        self.rows = ((area.height / self.cell_size).ceil() as i32).max(1);

        let len = (self.cols * self.rows) as usize;
        self.cells.iter_mut().for_each(SmallVec::clear);
        self.cells.resize_with(len, SmallVec::new);
        self.seen.clear();

        for (index, bubble) in bubbles.iter().enumerate() {
            if !bubble.collides() {
                continue;
            }
            let (x, y) = self.get_cell(bubble.position);
            self.cells[(y * self.cols + x) as usize].push(index);
        }
    }

    /// Number of bubbles bucketed in the last pass
    pub fn bucketed(&self) -> usize {
        self.cells.iter().map(SmallVec::len).sum()
    }

    /// Separates every overlapping pair of collidable bubbles once.
    ///
    /// Returns the number of pairs that were overlapping.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        bubbles: &mut [Bubble],
        area: Dimensions,
        cell_size: f32,
        damping: f32,
        jitter: f32,
        rng: &mut R,
    ) -> usize {
        self.rebuild(bubbles, area, cell_size);

        let mut collisions = 0;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = (row * self.cols + col) as usize;
                if self.cells[cell].is_empty() {
                    continue;
                }
                for dr in -1..=1 {
                    for dc in -1..=1 {
                        let (r, c) = (row + dr, col + dc);
                        if r < 0 || r >= self.rows || c < 0 || c >= self.cols {
                            continue;
                        }
                        let neighbor = (r * self.cols + c) as usize;
                        for &a in &self.cells[cell] {
                            for &b in &self.cells[neighbor] {
                                if a == b || !self.seen.insert((a.min(b), a.max(b))) {
                                    continue;
                                }
                                let (first, second) = pair_mut(bubbles, a, b);
                                if resolve_pair(first, second, damping, jitter, rng) {
                                    collisions += 1;
                                }
                            }
                        }
                    }
                }
            }
        }
        collisions
    }
}

/// Mutable references to two distinct elements
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Pushes two overlapping bubbles apart and swaps their damped velocities.
fn resolve_pair<R: Rng + ?Sized>(
    a: &mut Bubble,
    b: &mut Bubble,
    damping: f32,
    jitter: f32,
    rng: &mut R,
) -> bool {
    let delta = b.position - a.position;
    let distance = delta.length();
    let min_distance = a.radius() + b.radius();
    if distance >= min_distance {
        return false;
    }

    let normal = if distance > MIN_SEPARATION {
        delta / distance
    } else {
        // coincident centers: pick any direction
        Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU))
    };
    let overlap = (min_distance - distance) / 2.0;
    a.position -= normal * overlap;
    b.position += normal * overlap;

    let va = a.velocity;
    a.velocity = b.velocity * damping;
    b.velocity = va * damping;

    a.velocity += random_jitter(jitter, rng);
    b.velocity += random_jitter(jitter, rng);
    true
}

fn random_jitter<R: Rng + ?Sized>(amount: f32, rng: &mut R) -> Vec2 {
    Vec2::new(
        (rng.gen::<f32>() - 0.5) * amount,
        (rng.gen::<f32>() - 0.5) * amount,
    )
}
