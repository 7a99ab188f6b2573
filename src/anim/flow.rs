//! Noise flow field: fbm steers particles in velocity-override mode, and
//! their motion leaves Bresenham-rasterized trails on the half-pixel canvas
//! that are erased again as they age out.

use crate::context::{Animation, SimContext, StepResult};
use crate::geometry::line_points;
use crate::noise::Noise;
use crate::particle::{Drive, Particle};
use crate::sampler::WeightedSampler;
use rand::Rng;
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::time::Duration;

const TRAIL: usize = 14;
const LIFESPAN: u32 = 300;
const SPEED: f32 = 6.0;
const DT: f32 = 0.16;

// name, field frequency, octaves, turn gain, weight
const VARIANTS: &[(&str, f32, u32, f32, f64)] = &[
    ("meander", 0.035, 2, 2.2, 2.0),
    ("turbulent", 0.08, 4, 3.4, 2.0),
    ("laminar", 0.02, 1, 1.2, 1.0),
];

pub struct Flow {
    noise: Option<Noise>,
    parts: Vec<Particle>,
    trails: Vec<VecDeque<(i32, i32)>>,
    freq: f32,
    octaves: u32,
    turn: f32,
    w: f32,
    h: f32,
}

impl Flow {
    pub fn new() -> Self {
        Self {
            noise: None,
            parts: Vec::new(),
            trails: Vec::new(),
            freq: 0.0,
            octaves: 1,
            turn: 1.0,
            w: 0.0,
            h: 0.0,
        }
    }

    fn setup(&mut self, ctx: &mut SimContext) {
        let idx = match ctx.variant_in(VARIANTS.len()) {
            Some(i) => i,
            None => {
                let mut variants = WeightedSampler::new();
                for (i, &(_, _, _, _, weight)) in VARIANTS.iter().enumerate() {
                    variants.put(i, weight);
                }
                *variants.sample(&mut ctx.rng)
            }
        };
        let (name, freq, octaves, turn, _) = VARIANTS[idx];

        self.w = ctx.cols.max(2) as f32;
        self.h = (ctx.rows * 2).max(2) as f32;
        self.freq = freq;
        self.octaves = octaves;
        self.turn = turn;
        self.noise = Some(Noise::new(ctx.rng.gen()));

        let n = ((self.w * self.h / 40.0) as usize).clamp(12, 120);
        self.parts = (0..n).map(|_| spawn(self.w, self.h, &mut ctx.rng)).collect();
        self.trails = vec![VecDeque::new(); n];
        ctx.canvas.clear();
        ctx.set_label(format!("flow: {name}"));
    }
}

fn spawn<R: Rng>(w: f32, h: f32, rng: &mut R) -> Particle {
    Particle::new(rng.gen_range(1.0..w - 1.0), rng.gen_range(1.0..h - 1.0))
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation for Flow {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult {
        if ctx.frame == 0 || self.noise.is_none() {
            self.setup(ctx);
        }
        let Some(noise) = self.noise.as_ref() else {
            return StepResult::Done;
        };

        let t = ctx.frame as f32 * 0.01;
        for i in 0..self.parts.len() {
            let p = &mut self.parts[i];
            let angle = noise.fbm(
                &[p.pos.0 * self.freq, p.pos.1 * self.freq, t],
                1.0,
                1.0,
                self.octaves,
                2.0,
                0.5,
            ) * PI
                * self.turn;
            let prev = p.pos;
            p.step((angle.cos() * SPEED, angle.sin() * SPEED), DT, Drive::Velocity);

            // Rasterize the hop and keep the covered sub-pixels as trail.
            if let Ok(seg) = line_points(&[prev, p.pos], false) {
                let trail = &mut self.trails[i];
                for &(x, y) in &seg {
                    if trail.back() == Some(&(x, y)) {
                        continue;
                    }
                    if x >= 0 && y >= 0 {
                        ctx.canvas.set_half(x as usize, y as usize, true);
                    }
                    trail.push_back((x, y));
                }
                while trail.len() > TRAIL {
                    if let Some((x, y)) = trail.pop_front() {
                        if x >= 0 && y >= 0 {
                            ctx.canvas.set_half(x as usize, y as usize, false);
                        }
                    }
                }
            }

            let p = &self.parts[i];
            if !p.inbounds(self.w, self.h) || !p.younger_than(LIFESPAN) {
                for (x, y) in self.trails[i].drain(..) {
                    if x >= 0 && y >= 0 {
                        ctx.canvas.set_half(x as usize, y as usize, false);
                    }
                }
                self.parts[i] = spawn(self.w, self.h, &mut ctx.rng);
            }
        }

        StepResult::Continue(Duration::from_millis(33))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;

    #[test]
    fn particles_stay_finite_and_trails_stay_bounded() {
        let mut ctx = SimContext::new(10, 30, 77);
        ctx.variant = Some(1);
        let mut flow = Flow::new();
        for _ in 0..400 {
            match flow.step(&mut ctx) {
                StepResult::Continue(_) => ctx.frame += 1,
                StepResult::Done => panic!("flow field should run forever"),
            }
        }
        for p in &flow.parts {
            assert!(p.pos.0.is_finite() && p.pos.1.is_finite());
            // Respawn keeps every live particle inside the field.
            assert!(p.inbounds(flow.w, flow.h));
        }
        for trail in &flow.trails {
            assert!(trail.len() <= TRAIL);
        }
    }

    #[test]
    fn respawned_particles_erase_their_trails() {
        let mut ctx = SimContext::new(8, 20, 5);
        ctx.variant = Some(2);
        let mut flow = Flow::new();
        // Run well past the lifespan so every particle respawns at least
        // once; erased trails must never leave sub-pixels owned by nobody.
        for _ in 0..(LIFESPAN + 100) {
            flow.step(&mut ctx);
            ctx.frame += 1;
        }
        let mut owned = std::collections::HashSet::new();
        for trail in &flow.trails {
            owned.extend(trail.iter().copied());
        }
        let lit: usize = (0..ctx.canvas.sub_rows())
            .flat_map(|y| (0..ctx.canvas.cols()).map(move |x| (x, y)))
            .filter(|&(x, y)| ctx.canvas.get_half(x, y))
            .count();
        assert!(
            lit <= owned.len(),
            "{lit} lit sub-pixels but only {} owned by trails",
            owned.len()
        );
    }
}
