//! Gray-Scott reaction-diffusion on the half-pixel canvas.

use crate::context::{Animation, SimContext, StepResult};
use crate::sampler::WeightedSampler;
use rand::Rng;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq)]
struct Params {
    du: f32,
    dv: f32,
    feed: f32,
    kill: f32,
    dt: f32,
}

struct Preset {
    name: &'static str,
    p: Params,
    steps_per_frame: usize,
    weight: f64,
}

// Commonly used "nice" Gray-Scott regimes (qualitative names).
const PRESETS: &[Preset] = &[
    Preset {
        name: "mitosis",
        p: Params {
            du: 0.16,
            dv: 0.08,
            feed: 0.0220,
            kill: 0.0510,
            dt: 1.0,
        },
        steps_per_frame: 10,
        weight: 2.0,
    },
    Preset {
        name: "worms",
        p: Params {
            du: 0.16,
            dv: 0.08,
            feed: 0.0285,
            kill: 0.0590,
            dt: 1.0,
        },
        steps_per_frame: 8,
        weight: 2.0,
    },
    Preset {
        name: "solitons",
        p: Params {
            du: 0.16,
            dv: 0.08,
            feed: 0.0350,
            kill: 0.0595,
            dt: 1.0,
        },
        steps_per_frame: 10,
        weight: 1.5,
    },
    Preset {
        name: "spots",
        p: Params {
            du: 0.16,
            dv: 0.08,
            feed: 0.0270,
            kill: 0.0545,
            dt: 1.0,
        },
        steps_per_frame: 10,
        weight: 1.5,
    },
    Preset {
        name: "stripes",
        p: Params {
            du: 0.16,
            dv: 0.08,
            feed: 0.022,
            kill: 0.051,
            dt: 1.0,
        },
        steps_per_frame: 12,
        weight: 1.5,
    },
];

/// Two-channel double-buffered integrator, toroidal 9-point Laplacian.
struct Sim {
    w: usize,
    h: usize,
    u: Vec<f32>,
    v: Vec<f32>,
    u2: Vec<f32>,
    v2: Vec<f32>,
    params: Params,
}

impl Sim {
    fn new(w: usize, h: usize, params: Params) -> Self {
        let n = w * h;
        Self {
            w,
            h,
            u: vec![1.0; n],
            v: vec![0.0; n],
            u2: vec![1.0; n],
            v2: vec![0.0; n],
            params,
        }
    }

    /// Seed a handful of V droplets, then tiny noise to break symmetry.
    fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.u.fill(1.0);
        self.v.fill(0.0);

        let droplets = (self.w * self.h / 600).clamp(3, 12);
        for _ in 0..droplets {
            let cx = rng.gen_range(0..self.w) as isize;
            let cy = rng.gen_range(0..self.h) as isize;
            let r = rng.gen_range(2..6) as isize;
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dy * dy > r * r {
                        continue;
                    }
                    let i = self.wrap(cx + dx, cy + dy);
                    self.v[i] = 1.0;
                    self.u[i] = 0.0;
                }
            }
        }

        for i in 0..self.w * self.h {
            let j: f32 = rng.gen_range(-0.005..0.005);
            self.u[i] = (self.u[i] + j).clamp(0.0, 1.0);
            self.v[i] = (self.v[i] - j).clamp(0.0, 1.0);
        }
    }

    #[inline]
    fn wrap(&self, x: isize, y: isize) -> usize {
        let xx = x.rem_euclid(self.w as isize) as usize;
        let yy = y.rem_euclid(self.h as isize) as usize;
        yy * self.w + xx
    }

    fn step(&mut self) {
        let Params {
            du,
            dv,
            feed,
            kill,
            dt,
        } = self.params;

        // 9-point Laplacian stencil weights (sum to 0).
        const W_C: f32 = -1.0;
        const W_N: f32 = 0.2;
        const W_D: f32 = 0.05;

        for y in 0..self.h {
            for x in 0..self.w {
                let i = y * self.w + x;
                let u = self.u[i];
                let v = self.v[i];

                let (xc, yc) = (x as isize, y as isize);
                let i_l = self.wrap(xc - 1, yc);
                let i_r = self.wrap(xc + 1, yc);
                let i_u = self.wrap(xc, yc - 1);
                let i_d = self.wrap(xc, yc + 1);
                let i_ul = self.wrap(xc - 1, yc - 1);
                let i_ur = self.wrap(xc + 1, yc - 1);
                let i_dl = self.wrap(xc - 1, yc + 1);
                let i_dr = self.wrap(xc + 1, yc + 1);

                let lap_u = W_C * u
                    + W_N * (self.u[i_l] + self.u[i_r] + self.u[i_u] + self.u[i_d])
                    + W_D * (self.u[i_ul] + self.u[i_ur] + self.u[i_dl] + self.u[i_dr]);
                let lap_v = W_C * v
                    + W_N * (self.v[i_l] + self.v[i_r] + self.v[i_u] + self.v[i_d])
                    + W_D * (self.v[i_ul] + self.v[i_ur] + self.v[i_dl] + self.v[i_dr]);

                let reaction = u * v * v;
                let du_dt = du * lap_u - reaction + feed * (1.0 - u);
                let dv_dt = dv * lap_v + reaction - (feed + kill) * v;

                self.u2[i] = (u + dt * du_dt).clamp(0.0, 1.0);
                self.v2[i] = (v + dt * dv_dt).clamp(0.0, 1.0);
            }
        }

        std::mem::swap(&mut self.u, &mut self.u2);
        std::mem::swap(&mut self.v, &mut self.v2);
    }
}

pub struct GrayScott {
    sim: Option<Sim>,
    steps_per_frame: usize,
    contrast: f32,
    v_mid: f32,
}

impl GrayScott {
    pub fn new() -> Self {
        Self {
            sim: None,
            steps_per_frame: 8,
            contrast: 3.8,
            v_mid: 0.13,
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

        let mut sim = Sim::new(ctx.cols.max(2), (ctx.rows * 2).max(2), preset.p);
        sim.reset(&mut ctx.rng);
        ctx.set_label(format!(
            "grayscott: {} (f={:.4} k={:.4})",
            preset.name, preset.p.feed, preset.p.kill
        ));
        self.steps_per_frame = preset.steps_per_frame;
        self.sim = Some(sim);
    }
}

impl Default for GrayScott {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation for GrayScott {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult {
        if ctx.frame == 0 || self.sim.is_none() {
            self.setup(ctx);
        }
        let Some(sim) = self.sim.as_mut() else {
            return StepResult::Done;
        };

        for _ in 0..self.steps_per_frame {
            sim.step();
        }

        let contrast = self.contrast;
        let v_mid = self.v_mid;
        // tanh-like contrast curve centered on v_mid, no libm needed
        let brightness = |v: f32| {
            let x = (v - v_mid) * contrast * 6.0;
            let t = x / (1.0 + x.abs());
            (0.5 + 0.5 * t).clamp(0.0, 1.0)
        };

        ctx.canvas.clear();
        for y in 0..sim.h {
            for x in 0..sim.w {
                if brightness(sim.v[y * sim.w + x]) > 0.5 {
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
    fn fields_stay_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sim = Sim::new(32, 32, PRESETS[0].p);
        sim.reset(&mut rng);
        for _ in 0..200 {
            sim.step();
        }
        for i in 0..sim.u.len() {
            assert!((0.0..=1.0).contains(&sim.u[i]), "u[{i}] = {}", sim.u[i]);
            assert!((0.0..=1.0).contains(&sim.v[i]), "v[{i}] = {}", sim.v[i]);
        }
    }

    #[test]
    fn droplets_leave_activator_behind() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut sim = Sim::new(24, 24, PRESETS[1].p);
        sim.reset(&mut rng);
        assert!(sim.v.iter().any(|&v| v > 0.5));
        assert!(sim.u.iter().any(|&u| u > 0.9));
    }
}
