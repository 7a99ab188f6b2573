//! Ising-model Metropolis sampler on a toroidal spin lattice.

use crate::context::{Animation, SimContext, StepResult};
use crate::sampler::WeightedSampler;
use rand::Rng;
use std::time::Duration;

// Onsager's critical temperature for the square lattice is ~2.269.
const PRESETS: &[(&str, f32, f64)] = &[
    ("deep quench", 1.2, 2.0),
    ("critical", 2.269, 3.0),
    ("hot", 3.5, 1.0),
];

/// ±1 spins, ferromagnetic coupling J = 1, single-site Metropolis flips.
struct Lattice {
    w: usize,
    h: usize,
    spins: Vec<i8>,
    beta: f32,
    /// Acceptance probabilities for the two positive energy deltas (4J, 8J).
    accept: [f32; 2],
}

impl Lattice {
    fn new<R: Rng>(w: usize, h: usize, temperature: f32, rng: &mut R) -> Self {
        let beta = 1.0 / temperature.max(1e-3);
        let spins = (0..w * h)
            .map(|_| if rng.gen_bool(0.5) { 1i8 } else { -1i8 })
            .collect();
        Self {
            w,
            h,
            spins,
            beta,
            accept: [(-beta * 4.0).exp(), (-beta * 8.0).exp()],
        }
    }

    #[inline]
    fn wrap(&self, x: isize, y: isize) -> usize {
        let xx = x.rem_euclid(self.w as isize) as usize;
        let yy = y.rem_euclid(self.h as isize) as usize;
        yy * self.w + xx
    }

    fn neighbor_sum(&self, x: usize, y: usize) -> i32 {
        let (x, y) = (x as isize, y as isize);
        i32::from(self.spins[self.wrap(x - 1, y)])
            + i32::from(self.spins[self.wrap(x + 1, y)])
            + i32::from(self.spins[self.wrap(x, y - 1)])
            + i32::from(self.spins[self.wrap(x, y + 1)])
    }

    /// One Metropolis proposal at a random site.
    fn propose<R: Rng>(&mut self, rng: &mut R) {
        let x = rng.gen_range(0..self.w);
        let y = rng.gen_range(0..self.h);
        let i = y * self.w + x;
        let s = i32::from(self.spins[i]);
        let delta = 2 * s * self.neighbor_sum(x, y);
        let flip = if delta <= 0 {
            true
        } else {
            // delta is 4 or 8 here.
            rng.gen::<f32>() < self.accept[(delta / 4 - 1) as usize]
        };
        if flip {
            self.spins[i] = -self.spins[i];
        }
    }

    /// Total coupling energy, -Σ s_i s_j over right/down bonds.
    #[cfg(test)]
    fn energy(&self) -> i64 {
        let mut e = 0i64;
        for y in 0..self.h {
            for x in 0..self.w {
                let s = i64::from(self.spins[y * self.w + x]);
                let r = i64::from(self.spins[self.wrap(x as isize + 1, y as isize)]);
                let d = i64::from(self.spins[self.wrap(x as isize, y as isize + 1)]);
                e -= s * (r + d);
            }
        }
        e
    }
}

pub struct Ising {
    lattice: Option<Lattice>,
    proposals_per_frame: usize,
}

impl Ising {
    pub fn new() -> Self {
        Self {
            lattice: None,
            proposals_per_frame: 0,
        }
    }

    fn setup(&mut self, ctx: &mut SimContext) {
        let mut presets = WeightedSampler::new();
        for (i, &(_, _, weight)) in PRESETS.iter().enumerate() {
            presets.put(i, weight);
        }
        let idx = match ctx.variant_in(PRESETS.len()) {
            Some(i) => i,
            None => *presets.sample(&mut ctx.rng),
        };
        let (name, temperature, _) = PRESETS[idx];

        let (w, h) = (ctx.cols.max(2), (ctx.rows * 2).max(2));
        self.lattice = Some(Lattice::new(w, h, temperature, &mut ctx.rng));
        self.proposals_per_frame = ((w * h) as f32 * ctx.speed) as usize;
        ctx.set_label(format!("ising: {} (T={temperature})", name));
    }
}

impl Default for Ising {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation for Ising {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult {
        if ctx.frame == 0 || self.lattice.is_none() {
            self.setup(ctx);
        }
        let Some(lattice) = self.lattice.as_mut() else {
            return StepResult::Done;
        };

        for _ in 0..self.proposals_per_frame {
            lattice.propose(&mut ctx.rng);
        }

        ctx.canvas.clear();
        for y in 0..lattice.h {
            for x in 0..lattice.w {
                if lattice.spins[y * lattice.w + x] > 0 {
                    ctx.canvas.set_half(x, y, true);
                }
            }
        }

        StepResult::Continue(Duration::from_millis(33))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn spins_stay_binary() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut lattice = Lattice::new(24, 24, 2.269, &mut rng);
        for _ in 0..50_000 {
            lattice.propose(&mut rng);
        }
        assert!(lattice.spins.iter().all(|&s| s == 1 || s == -1));
    }

    #[test]
    fn cold_lattice_orders() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut lattice = Lattice::new(32, 32, 1.2, &mut rng);
        let before = lattice.energy();
        for _ in 0..100_000 {
            lattice.propose(&mut rng);
        }
        // Well below the critical temperature the quench forms domains and
        // the coupling energy drops far below the random-soup starting point.
        let after = lattice.energy();
        assert!(after < before - 500, "energy {before} -> {after}");
    }
}
