//! Crystal growth: a distance-keyed flood from random seeds, drained either
//! strictly nearest-first (round fronts) or with a front-biased random pop
//! (ragged, organic fronts). The frontier emptying ends the animation.

use crate::context::{Animation, SimContext, StepResult};
use crate::ordered_set::OrderedSet;
use crate::sampler::WeightedSampler;
use rand::Rng;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq)]
enum Metric {
    Euclid,
    Manhattan,
    Chebyshev,
}

impl Metric {
    fn dist(self, a: (i32, i32), b: (i32, i32)) -> f32 {
        let (dx, dy) = ((a.0 - b.0).abs() as f32, (a.1 - b.1).abs() as f32);
        match self {
            Metric::Euclid => (dx * dx + dy * dy).sqrt(),
            Metric::Manhattan => dx + dy,
            Metric::Chebyshev => dx.max(dy),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum PopStyle {
    Nearest,
    FrontBiased,
}

const VARIANTS: &[(&str, Metric, PopStyle, f64)] = &[
    ("discs", Metric::Euclid, PopStyle::Nearest, 2.0),
    ("diamonds", Metric::Manhattan, PopStyle::Nearest, 1.0),
    ("plates", Metric::Chebyshev, PopStyle::Nearest, 1.0),
    ("coral", Metric::Euclid, PopStyle::FrontBiased, 3.0),
];

/// A random index heavily biased toward the front of the pool.
fn front_biased_index<R: Rng>(len: usize, rng: &mut R) -> usize {
    let u = rng.gen::<f32>();
    ((u * u * u * len as f32) as usize).min(len.saturating_sub(1))
}

/// Frontier entries sort by distance first; the coordinates break ties so
/// distinct cells at equal distance are distinct set members.
type Frontier = OrderedSet<(f32, i32, i32)>;

fn new_frontier() -> Frontier {
    OrderedSet::new(|a: &(f32, i32, i32), b: &(f32, i32, i32)| {
        a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2))
    })
}

pub struct Crystal {
    frontier: Option<Frontier>,
    visited: Vec<bool>,
    seeds: Vec<(i32, i32)>,
    metric: Metric,
    pop: PopStyle,
    w: i32,
    h: i32,
}

impl Crystal {
    pub fn new() -> Self {
        Self {
            frontier: None,
            visited: Vec::new(),
            seeds: Vec::new(),
            metric: Metric::Euclid,
            pop: PopStyle::Nearest,
            w: 0,
            h: 0,
        }
    }

    fn setup(&mut self, ctx: &mut SimContext) {
        let idx = match ctx.variant_in(VARIANTS.len()) {
            Some(i) => i,
            None => {
                let mut variants = WeightedSampler::new();
                for (i, &(_, _, _, weight)) in VARIANTS.iter().enumerate() {
                    variants.put(i, weight);
                }
                *variants.sample(&mut ctx.rng)
            }
        };
        let (name, metric, pop, _) = VARIANTS[idx];

        self.w = ctx.cols as i32;
        self.h = (ctx.rows * 2) as i32;
        self.metric = metric;
        self.pop = pop;
        self.visited = vec![false; (self.w * self.h) as usize];

        let n_seeds = ctx.rng.gen_range(1..=4);
        self.seeds = (0..n_seeds)
            .map(|_| (ctx.rng.gen_range(0..self.w), ctx.rng.gen_range(0..self.h)))
            .collect();

        let mut frontier = new_frontier();
        for &s in &self.seeds {
            frontier.add((0.0, s.0, s.1));
        }
        self.frontier = Some(frontier);
        ctx.canvas.clear();
        ctx.set_label(format!("crystal: {name} ({n_seeds} seeds)"));
    }

    fn nearest_seed_dist(&self, p: (i32, i32)) -> f32 {
        self.seeds
            .iter()
            .map(|&s| self.metric.dist(p, s))
            .fold(f32::INFINITY, f32::min)
    }
}

impl Default for Crystal {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation for Crystal {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult {
        if ctx.frame == 0 || self.frontier.is_none() {
            self.setup(ctx);
        }

        let pops = (40.0 * ctx.speed) as usize;
        for _ in 0..pops {
            let Some(frontier) = self.frontier.as_mut() else {
                return StepResult::Done;
            };
            let index = match self.pop {
                PopStyle::Nearest => 0,
                PopStyle::FrontBiased => front_biased_index(frontier.len(), &mut ctx.rng),
            };
            let Some((_, x, y)) = frontier.pop_index(index) else {
                break;
            };
            let i = (y * self.w + x) as usize;
            if self.visited[i] {
                continue;
            }
            self.visited[i] = true;
            ctx.canvas.set_half(x as usize, y as usize, true);

            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= self.w || ny >= self.h {
                    continue;
                }
                if self.visited[(ny * self.w + nx) as usize] {
                    continue;
                }
                let d = self.nearest_seed_dist((nx, ny));
                if let Some(f) = self.frontier.as_mut() {
                    f.add((d, nx, ny));
                }
            }
        }

        match self.frontier.as_ref() {
            Some(f) if !f.is_empty() => StepResult::Continue(Duration::from_millis(25)),
            _ => StepResult::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn biased_index_stays_in_range_and_favors_the_front() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut front_half = 0usize;
        let n = 10_000;
        for _ in 0..n {
            let i = front_biased_index(100, &mut rng);
            assert!(i < 100);
            if i < 50 {
                front_half += 1;
            }
        }
        // A cube-law bias lands in the front half ~79% of the time.
        assert!(front_half > n * 6 / 10, "front half hit {front_half}");
        assert_eq!(front_biased_index(0, &mut rng), 0);
    }

    #[test]
    fn nearest_pop_fills_the_whole_grid_then_finishes() {
        let mut ctx = SimContext::new(6, 9, 31);
        ctx.variant = Some(0);
        let mut crystal = Crystal::new();
        let mut done = false;
        for _ in 0..10_000 {
            match crystal.step(&mut ctx) {
                StepResult::Done => {
                    done = true;
                    break;
                }
                StepResult::Continue(_) => ctx.frame += 1,
            }
        }
        assert!(done, "flood never drained");
        assert!(crystal.visited.iter().all(|&v| v));
        for y in 0..ctx.canvas.sub_rows() {
            for x in 0..ctx.canvas.cols() {
                assert!(ctx.canvas.get_half(x, y), "sub-pixel ({x},{y}) unset");
            }
        }
    }

    #[test]
    fn frontier_orders_by_distance() {
        let mut frontier = new_frontier();
        frontier.add((2.5, 0, 0));
        frontier.add((0.5, 3, 3));
        frontier.add((1.5, 1, 1));
        // Equal distances are kept as distinct cells.
        frontier.add((1.5, 2, 1));
        assert_eq!(frontier.len(), 4);
        let mut last = f32::MIN;
        while let Some((d, _, _)) = frontier.pop_index(0) {
            assert!(d >= last);
            last = d;
        }
    }
}
