//! SPH-style particle fluid: spike-kernel densities over a uniform spatial
//! hash, pressure and viscosity forces, gravity, and restituting walls.

use crate::context::{Animation, SimContext, StepResult};
use crate::particle::{Drive, Particle};
use crate::sampler::WeightedSampler;
use rand::Rng;
use std::time::Duration;

/// Interaction radius in sub-pixels; also the hash cell size.
const H: f32 = 3.0;
const REST_DENSITY: f32 = 2.2;
const STIFFNESS: f32 = 8.0;
const VISCOSITY: f32 = 0.6;
const GRAVITY: f32 = 18.0;
const DT: f32 = 0.02;
const SUBSTEPS: usize = 3;
const RESTITUTION: f32 = 0.4;
const MARGIN: f32 = 0.5;

/// Uniform bucket grid with cell size equal to the interaction radius, so a
/// particle's neighbors always lie in the 3x3 block around its cell.
/// Rebuilt from scratch every step; buckets are intrusive head/next chains.
struct SpatialHash {
    cell: f32,
    gw: usize,
    gh: usize,
    heads: Vec<i32>,
    next: Vec<i32>,
}

impl SpatialHash {
    fn build(cell: f32, w: f32, h: f32, positions: &[(f32, f32)]) -> Self {
        let gw = ((w / cell).ceil() as usize).max(1);
        let gh = ((h / cell).ceil() as usize).max(1);
        let mut hash = Self {
            cell,
            gw,
            gh,
            heads: vec![-1; gw * gh],
            next: vec![-1; positions.len()],
        };
        for (i, &(x, y)) in positions.iter().enumerate() {
            let c = hash.cell_index(x, y);
            hash.next[i] = hash.heads[c];
            hash.heads[c] = i as i32;
        }
        hash
    }

    fn cell_index(&self, x: f32, y: f32) -> usize {
        let cx = ((x / self.cell) as isize).clamp(0, self.gw as isize - 1) as usize;
        let cy = ((y / self.cell) as isize).clamp(0, self.gh as isize - 1) as usize;
        cy * self.gw + cx
    }

    /// Visit every particle index in the 3x3 cell block around `pos`.
    /// Candidates, not matches: callers still filter by actual distance.
    fn for_candidates(&self, pos: (f32, f32), mut f: impl FnMut(usize)) {
        let cx = (pos.0 / self.cell) as isize;
        let cy = (pos.1 / self.cell) as isize;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (gx, gy) = (cx + dx, cy + dy);
                if gx < 0 || gy < 0 || gx >= self.gw as isize || gy >= self.gh as isize {
                    continue;
                }
                let mut i = self.heads[gy as usize * self.gw + gx as usize];
                while i >= 0 {
                    f(i as usize);
                    i = self.next[i as usize];
                }
            }
        }
    }
}

const VARIANTS: &[(&str, bool, f64)] = &[("splash", false, 2.0), ("slosh", true, 2.0)];

pub struct Fluid {
    parts: Vec<Particle>,
    density: Vec<f32>,
    acc: Vec<(f32, f32)>,
    w: f32,
    h: f32,
    slosh: bool,
}

impl Fluid {
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            density: Vec::new(),
            acc: Vec::new(),
            w: 0.0,
            h: 0.0,
            slosh: false,
        }
    }

    fn setup(&mut self, ctx: &mut SimContext) {
        let mut variants = WeightedSampler::new();
        for (i, &(_, _, weight)) in VARIANTS.iter().enumerate() {
            variants.put(i, weight);
        }
        let idx = match ctx.variant_in(VARIANTS.len()) {
            Some(i) => i,
            None => *variants.sample(&mut ctx.rng),
        };
        let (name, slosh, _) = VARIANTS[idx];

        self.w = ctx.cols.max(4) as f32;
        self.h = (ctx.rows * 2).max(4) as f32;
        self.slosh = slosh;

        let n = ((self.w * self.h / 10.0) as usize).clamp(40, 500);
        let limit = H / DT * 0.4;
        self.parts = (0..n)
            .map(|_| {
                let x = ctx.rng.gen_range(self.w * 0.1..self.w * 0.6);
                let y = ctx.rng.gen_range(self.h * 0.05..self.h * 0.4);
                Particle::new(x, y).with_speed_limit(limit)
            })
            .collect();
        self.density = vec![0.0; n];
        self.acc = vec![(0.0, 0.0); n];
        ctx.set_label(format!("fluid: {name} ({n} particles)"));
    }

    fn substep(&mut self, tilt: f32) {
        let positions: Vec<(f32, f32)> = self.parts.iter().map(|p| p.pos).collect();
        let hash = SpatialHash::build(H, self.w, self.h, &positions);

        // Density from the quadratic spike kernel; self contributes 1.
        for (i, &(x, y)) in positions.iter().enumerate() {
            let mut d = 0.0;
            hash.for_candidates((x, y), |j| {
                let (dx, dy) = (x - positions[j].0, y - positions[j].1);
                let r2 = dx * dx + dy * dy;
                if r2 < H * H {
                    let u = 1.0 - r2.sqrt() / H;
                    d += u * u;
                }
            });
            self.density[i] = d;
        }

        // Pressure pushes apart, never pulls together.
        let pressure: Vec<f32> = self
            .density
            .iter()
            .map(|&d| (STIFFNESS * (d - REST_DENSITY)).max(0.0))
            .collect();

        for (i, &(x, y)) in positions.iter().enumerate() {
            let mut ax = tilt;
            let mut ay = GRAVITY;
            let vi = self.parts[i].vel;
            hash.for_candidates((x, y), |j| {
                if j == i {
                    return;
                }
                let (dx, dy) = (x - positions[j].0, y - positions[j].1);
                let r2 = dx * dx + dy * dy;
                if r2 >= H * H || r2 < 1e-12 {
                    return;
                }
                let r = r2.sqrt();
                let u = 1.0 - r / H;
                let push = (pressure[i] + pressure[j]) * 0.5 * u / r;
                ax += dx * push;
                ay += dy * push;
                let vj = self.parts[j].vel;
                ax += (vj.0 - vi.0) * VISCOSITY * u;
                ay += (vj.1 - vi.1) * VISCOSITY * u;
            });
            self.acc[i] = (ax, ay);
        }

        for (p, &a) in self.parts.iter_mut().zip(self.acc.iter()) {
            p.step(a, DT, Drive::Force);
            bounce_walls(p, self.w, self.h);
        }
    }
}

fn bounce_walls(p: &mut Particle, w: f32, h: f32) {
    if p.pos.0 < MARGIN {
        p.pos.0 = MARGIN + (MARGIN - p.pos.0);
        p.vel.0 = -p.vel.0 * RESTITUTION;
    } else if p.pos.0 > w - MARGIN {
        p.pos.0 = (w - MARGIN) - (p.pos.0 - (w - MARGIN));
        p.vel.0 = -p.vel.0 * RESTITUTION;
    }
    if p.pos.1 < MARGIN {
        p.pos.1 = MARGIN + (MARGIN - p.pos.1);
        p.vel.1 = -p.vel.1 * RESTITUTION;
    } else if p.pos.1 > h - MARGIN {
        p.pos.1 = (h - MARGIN) - (p.pos.1 - (h - MARGIN));
        p.vel.1 = -p.vel.1 * RESTITUTION;
    }
    p.pos.0 = p.pos.0.clamp(MARGIN, w - MARGIN);
    p.pos.1 = p.pos.1.clamp(MARGIN, h - MARGIN);
}

impl Default for Fluid {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation for Fluid {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult {
        if ctx.frame == 0 || self.parts.is_empty() {
            self.setup(ctx);
        }

        let tilt = if self.slosh {
            (ctx.frame as f32 * 0.02).sin() * GRAVITY * 0.6
        } else {
            0.0
        };
        for _ in 0..SUBSTEPS {
            self.substep(tilt);
        }

        ctx.canvas.clear();
        for p in &self.parts {
            let x = p.pos.0.round();
            let y = p.pos.1.round();
            if x >= 0.0 && y >= 0.0 {
                ctx.canvas.set_half(x as usize, y as usize, true);
            }
        }

        StepResult::Continue(Duration::from_millis(33))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn hash_candidates_cover_all_pairs_in_range() {
        let mut rng = StdRng::seed_from_u64(12);
        let (w, h) = (40.0f32, 25.0f32);
        let positions: Vec<(f32, f32)> = (0..120)
            .map(|_| (rng.gen_range(0.0..w), rng.gen_range(0.0..h)))
            .collect();
        let hash = SpatialHash::build(H, w, h, &positions);

        for (i, &(x, y)) in positions.iter().enumerate() {
            let mut candidates = Vec::new();
            hash.for_candidates((x, y), |j| candidates.push(j));
            for (j, &(ox, oy)) in positions.iter().enumerate() {
                let d2 = (x - ox) * (x - ox) + (y - oy) * (y - oy);
                if d2 < H * H {
                    assert!(
                        candidates.contains(&j),
                        "pair ({i},{j}) at distance {} missed",
                        d2.sqrt()
                    );
                }
            }
        }
    }

    #[test]
    fn particles_stay_inside_the_box() {
        let mut ctx = crate::context::SimContext::new(12, 40, 7);
        ctx.variant = Some(0);
        let mut fluid = Fluid::new();
        for _ in 0..120 {
            fluid.step(&mut ctx);
            ctx.frame += 1;
        }
        for p in &fluid.parts {
            assert!(p.pos.0.is_finite() && p.pos.1.is_finite());
            assert!((0.0..=fluid.w).contains(&p.pos.0));
            assert!((0.0..=fluid.h).contains(&p.pos.1));
        }
    }

    #[test]
    fn density_counts_self_and_close_neighbors() {
        let positions = vec![(5.0, 5.0), (5.5, 5.0), (20.0, 5.0)];
        let hash = SpatialHash::build(H, 30.0, 10.0, &positions);
        let mut d = 0.0;
        hash.for_candidates(positions[0], |j| {
            let (dx, dy) = (positions[0].0 - positions[j].0, positions[0].1 - positions[j].1);
            let r2 = dx * dx + dy * dy;
            if r2 < H * H {
                let u = 1.0 - r2.sqrt() / H;
                d += u * u;
            }
        });
        // Self (1.0) plus one neighbor at half a sub-pixel; the far particle
        // contributes nothing.
        assert!(d > 1.0 && d < 2.0, "density {d}");
    }
}
