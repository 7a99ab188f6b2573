//! Differential adhesion: a Potts-like cell-type lattice sorting itself into
//! tissue domains under Metropolis copy-neighbor proposals.

use crate::context::{Animation, SimContext, StepResult};
use crate::sampler::WeightedSampler;
use rand::Rng;
use std::time::Duration;

const N_TYPES: usize = 3;
const MOORE: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

struct Preset {
    name: &'static str,
    /// Symmetric contact energies indexed by type pair; type 0 is medium.
    /// Lower energy means the contact is preferred.
    j: [[f32; N_TYPES]; N_TYPES],
    temperature: f32,
    weight: f64,
}

// Contact hierarchies in the spirit of Glazier & Graner's sorting runs:
// like-like cheapest sorts, cross-contact cheapest checkers.
const PRESETS: &[Preset] = &[
    Preset {
        name: "sorting",
        j: [[0.0, 16.0, 16.0], [16.0, 2.0, 11.0], [16.0, 11.0, 14.0]],
        temperature: 8.0,
        weight: 3.0,
    },
    Preset {
        name: "engulfment",
        j: [[0.0, 9.0, 16.0], [9.0, 2.0, 11.0], [16.0, 11.0, 6.0]],
        temperature: 8.0,
        weight: 2.0,
    },
    Preset {
        name: "mixing",
        j: [[0.0, 16.0, 16.0], [16.0, 14.0, 2.0], [16.0, 2.0, 14.0]],
        temperature: 6.0,
        weight: 1.0,
    },
];

const GLYPHS: [char; N_TYPES] = [' ', '█', '░'];

struct Tissue {
    w: usize,
    h: usize,
    types: Vec<u8>,
    j: [[f32; N_TYPES]; N_TYPES],
    beta: f32,
}

impl Tissue {
    /// A disc of randomly mixed cell types in a field of medium.
    fn new<R: Rng>(w: usize, h: usize, preset: &Preset, rng: &mut R) -> Self {
        let mut types = vec![0u8; w * h];
        let r = (w.min(h * 2) / 3).max(3) as isize;
        let (cx, cy) = (w as isize / 2, h as isize / 2);
        for y in 0..h as isize {
            for x in 0..w as isize {
                // Terminal cells are twice as tall as wide; stretch x so the
                // blob reads as round.
                let dx = (x - cx) as f32 * 0.5;
                let dy = (y - cy) as f32;
                if dx * dx + dy * dy <= (r * r) as f32 {
                    types[y as usize * w + x as usize] = rng.gen_range(1..N_TYPES as u8);
                }
            }
        }
        Self {
            w,
            h,
            types,
            j: preset.j,
            beta: 1.0 / preset.temperature.max(1e-3),
        }
    }

    #[inline]
    fn wrap(&self, x: isize, y: isize) -> usize {
        let xx = x.rem_euclid(self.w as isize) as usize;
        let yy = y.rem_euclid(self.h as isize) as usize;
        yy * self.w + xx
    }

    /// Contact energy the site contributes with the given type in place.
    fn site_energy(&self, x: isize, y: isize, t: u8) -> f32 {
        let mut e = 0.0;
        for (dx, dy) in MOORE {
            let n = self.types[self.wrap(x + dx, y + dy)];
            if n != t {
                e += self.j[t as usize][n as usize];
            }
        }
        e
    }

    /// One copy-neighbor proposal: a random site tries to adopt the type of
    /// a random Moore neighbor.
    fn propose<R: Rng>(&mut self, rng: &mut R) {
        let x = rng.gen_range(0..self.w) as isize;
        let y = rng.gen_range(0..self.h) as isize;
        let (dx, dy) = MOORE[rng.gen_range(0..MOORE.len())];
        let old = self.types[self.wrap(x, y)];
        let new = self.types[self.wrap(x + dx, y + dy)];
        if new == old {
            return;
        }
        let delta = self.site_energy(x, y, new) - self.site_energy(x, y, old);
        if delta <= 0.0 || rng.gen::<f32>() < (-self.beta * delta).exp() {
            let i = self.wrap(x, y);
            self.types[i] = new;
        }
    }

    /// Total contact energy over unlike neighbor pairs.
    #[cfg(test)]
    fn energy(&self) -> f32 {
        let mut e = 0.0;
        for y in 0..self.h as isize {
            for x in 0..self.w as isize {
                let t = self.types[self.wrap(x, y)];
                // Right and down bonds only, so each pair counts once.
                for (dx, dy) in [(1, 0), (0, 1)] {
                    let n = self.types[self.wrap(x + dx, y + dy)];
                    if n != t {
                        e += self.j[t as usize][n as usize];
                    }
                }
            }
        }
        e
    }
}

pub struct Adhesion {
    tissue: Option<Tissue>,
    proposals_per_frame: usize,
}

impl Adhesion {
    pub fn new() -> Self {
        Self {
            tissue: None,
            proposals_per_frame: 0,
        }
    }

    fn setup(&mut self, ctx: &mut SimContext) {
        let mut presets = WeightedSampler::new();
        for (i, p) in PRESETS.iter().enumerate() {
            presets.put(i, p.weight);
        }
        let idx = match ctx.variant_in(PRESETS.len()) {
            Some(i) => i,
            None => *presets.sample(&mut ctx.rng),
        };
        let preset = &PRESETS[idx];

        let (w, h) = (ctx.cols.max(4), ctx.rows.max(4));
        self.tissue = Some(Tissue::new(w, h, preset, &mut ctx.rng));
        self.proposals_per_frame = ((w * h) as f32 * 2.0 * ctx.speed) as usize;
        ctx.set_label(format!("adhesion: {}", preset.name));
    }
}

impl Default for Adhesion {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation for Adhesion {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult {
        if ctx.frame == 0 || self.tissue.is_none() {
            self.setup(ctx);
        }
        let Some(tissue) = self.tissue.as_mut() else {
            return StepResult::Done;
        };

        for _ in 0..self.proposals_per_frame {
            tissue.propose(&mut ctx.rng);
        }

        ctx.canvas.clear();
        for y in 0..tissue.h {
            for x in 0..tissue.w {
                let t = tissue.types[y * tissue.w + x] as usize;
                if t > 0 {
                    ctx.canvas.set(x, y, GLYPHS[t.min(N_TYPES - 1)]);
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
    fn types_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut tissue = Tissue::new(30, 20, &PRESETS[0], &mut rng);
        for _ in 0..50_000 {
            tissue.propose(&mut rng);
        }
        assert!(tissue.types.iter().all(|&t| (t as usize) < N_TYPES));
    }

    #[test]
    fn sorting_lowers_contact_energy() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut tissue = Tissue::new(40, 30, &PRESETS[0], &mut rng);
        let before = tissue.energy();
        for _ in 0..200_000 {
            tissue.propose(&mut rng);
        }
        let after = tissue.energy();
        assert!(after < before, "energy {before} -> {after}");
    }
}
