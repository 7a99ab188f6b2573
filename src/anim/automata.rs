//! Generalized outer-totalistic cellular automaton, the workhorse animation.
//!
//! One grid kernel evaluates everything from classic Life through HROT and
//! Larger-than-Life rules, with generations decay for multi-state rules.

use crate::context::{Animation, SimContext, StepResult};
use crate::geometry::circle_points;
use crate::rule::{Rule, Topology};
use crate::sampler::WeightedSampler;
use rand::Rng;
use std::time::Duration;

/// Flat double-buffered state grid driven by one [`Rule`].
///
/// State 0 is dead, 1 is alive, 2.. are the dying states of generations
/// rules. Only state 1 counts as a neighbor.
pub struct AutomatonGrid {
    w: usize,
    h: usize,
    rule: Rule,
    offsets: Vec<(i32, i32)>,
    cells: Vec<u8>,
    next: Vec<u8>,
}

impl AutomatonGrid {
    pub fn new(w: usize, h: usize, rule: Rule) -> Self {
        let w = w.max(1);
        let h = h.max(1);
        let offsets = rule.offsets();
        Self {
            w,
            h,
            rule,
            offsets,
            cells: vec![0; w * h],
            next: vec![0; w * h],
        }
    }

    pub fn w(&self) -> usize {
        self.w
    }

    pub fn h(&self) -> usize {
        self.h
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x < self.w && y < self.h {
            self.cells[y * self.w + x]
        } else {
            0
        }
    }

    pub fn set(&mut self, x: usize, y: usize, state: u8) {
        if x < self.w && y < self.h {
            self.cells[y * self.w + x] = state;
        }
    }

    /// Coordinates of the cells in the live state, row-major order.
    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..self.h {
            for x in 0..self.w {
                if self.cells[y * self.w + x] == 1 {
                    out.push((x, y));
                }
            }
        }
        out
    }

    /// Advance one generation. Returns whether any cell changed.
    pub fn step(&mut self) -> bool {
        let w = self.w as i32;
        let h = self.h as i32;
        let mut changed = false;

        for y in 0..self.h {
            for x in 0..self.w {
                let i = y * self.w + x;
                let mut count = 0u32;
                for &(dx, dy) in &self.offsets {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    let state = match self.rule.topology {
                        Topology::Torus => {
                            let nx = nx.rem_euclid(w) as usize;
                            let ny = ny.rem_euclid(h) as usize;
                            self.cells[ny * self.w + nx]
                        }
                        Topology::Plane => {
                            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                                0
                            } else {
                                self.cells[ny as usize * self.w + nx as usize]
                            }
                        }
                    };
                    if state == 1 {
                        count += 1;
                    }
                }

                let cur = self.cells[i];
                let next = match cur {
                    0 => u8::from(self.rule.born.binary_search(&count).is_ok()),
                    1 => {
                        if self.rule.survive.binary_search(&count).is_ok() {
                            1
                        } else if self.rule.states > 2 {
                            2
                        } else {
                            0
                        }
                    }
                    dying => {
                        if u32::from(dying) + 1 >= self.rule.states {
                            0
                        } else {
                            dying + 1
                        }
                    }
                };
                if next != cur {
                    changed = true;
                }
                self.next[i] = next;
            }
        }
        std::mem::swap(&mut self.cells, &mut self.next);
        changed
    }
}

struct Variant {
    name: &'static str,
    rule: &'static str,
    weight: f64,
}

const VARIANTS: &[Variant] = &[
    Variant {
        name: "conway",
        rule: "B3/S23",
        weight: 3.0,
    },
    Variant {
        name: "highlife",
        rule: "B36/S23",
        weight: 1.5,
    },
    Variant {
        name: "day & night",
        rule: "B3678/S34678",
        weight: 1.5,
    },
    Variant {
        name: "seeds",
        rule: "B2/S",
        weight: 1.0,
    },
    Variant {
        name: "brian's brain",
        rule: "/2/3",
        weight: 2.0,
    },
    Variant {
        name: "star wars",
        rule: "345/2/4",
        weight: 2.0,
    },
    Variant {
        name: "bosco",
        rule: "5,34,58,34,45",
        weight: 2.0,
    },
    Variant {
        name: "majority",
        rule: "R4,C2,M1,S41..81,B41..81,NM",
        weight: 1.5,
    },
    Variant {
        name: "lace",
        rule: "R2,C2,M0,S1,B1,NX",
        weight: 1.0,
    },
];

#[derive(Clone, Copy, PartialEq)]
enum Seeding {
    Soup(f64),
    CenterDisc,
    Rings,
}

const DYING: [char; 4] = ['▓', '▒', '░', '·'];

/// The cellular automaton animation. Two-state rules run at half-pixel
/// resolution; generations rules render a decay ramp per cell.
pub struct Automata {
    grid: Option<AutomatonGrid>,
    half: bool,
    quiet: u32,
}

impl Automata {
    pub fn new() -> Self {
        Self {
            grid: None,
            half: false,
            quiet: 0,
        }
    }

    fn setup(&mut self, ctx: &mut SimContext) {
        let mut variants = WeightedSampler::new();
        for (i, v) in VARIANTS.iter().enumerate() {
            variants.put(i, v.weight);
        }
        let idx = match ctx.variant_in(VARIANTS.len()) {
            Some(i) => i,
            None => *variants.sample(&mut ctx.rng),
        };
        let variant = &VARIANTS[idx];
        let rule: Rule = variant
            .rule
            .parse()
            .unwrap_or_else(|_| Rule::life_like(&[3], &[2, 3]));

        let half = rule.states == 2;
        let (w, h) = if half {
            (ctx.cols, ctx.rows * 2)
        } else {
            (ctx.cols, ctx.rows)
        };
        let mut grid = AutomatonGrid::new(w, h, rule);

        let mut seedings = WeightedSampler::new();
        seedings
            .put(Seeding::Soup(0.33), 3.0)
            .put(Seeding::Soup(0.12), 1.0)
            .put(Seeding::CenterDisc, 2.0)
            .put(Seeding::Rings, 1.0);
        match *seedings.sample(&mut ctx.rng) {
            Seeding::Soup(density) => {
                for y in 0..h {
                    for x in 0..w {
                        if ctx.rng.gen_bool(density) {
                            grid.set(x, y, 1);
                        }
                    }
                }
            }
            Seeding::CenterDisc => {
                let r = (w.min(h) / 4).max(2) as i32;
                let (cx, cy) = (w as i32 / 2, h as i32 / 2);
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx * dx + dy * dy <= r * r && ctx.rng.gen_bool(0.5) {
                            grid.set((cx + dx) as usize, (cy + dy) as usize, 1);
                        }
                    }
                }
            }
            Seeding::Rings => {
                let max_r = (w.min(h) as i32 / 2).max(4);
                for _ in 0..ctx.rng.gen_range(2..5) {
                    let cx = ctx.rng.gen_range(0..w as i32);
                    let cy = ctx.rng.gen_range(0..h as i32);
                    let r = ctx.rng.gen_range(3..max_r);
                    for (x, y) in circle_points(cx, cy, r) {
                        if x >= 0 && y >= 0 {
                            grid.set(x as usize, y as usize, 1);
                        }
                    }
                }
            }
        }

        ctx.set_label(format!("automata: {} ({})", variant.name, grid.rule()));
        self.half = half;
        self.grid = Some(grid);
        self.quiet = 0;
    }

    fn render(&self, ctx: &mut SimContext) {
        let Some(grid) = self.grid.as_ref() else {
            return;
        };
        ctx.canvas.clear();
        for y in 0..grid.h() {
            for x in 0..grid.w() {
                match grid.get(x, y) {
                    0 => {}
                    1 if self.half => ctx.canvas.set_half(x, y, true),
                    1 => ctx.canvas.set(x, y, '█'),
                    dying => {
                        let ch = DYING[usize::from(dying - 2).min(DYING.len() - 1)];
                        ctx.canvas.set(x, y, ch);
                    }
                }
            }
        }
    }
}

impl Default for Automata {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation for Automata {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult {
        if ctx.frame == 0 || self.grid.is_none() {
            self.setup(ctx);
        }
        let changed = match self.grid.as_mut() {
            Some(grid) => grid.step(),
            None => return StepResult::Done,
        };
        self.render(ctx);

        if changed {
            self.quiet = 0;
        } else {
            self.quiet += 1;
        }
        // Two still generations means the grid has fully converged.
        if self.quiet >= 2 {
            StepResult::Done
        } else {
            StepResult::Continue(Duration::from_millis(60))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Topology;

    #[test]
    fn blinker_oscillates() {
        let mut g = AutomatonGrid::new(5, 5, Rule::life_like(&[3], &[2, 3]));
        for x in 1..=3 {
            g.set(x, 2, 1);
        }
        assert!(g.step());
        assert_eq!(g.live_cells(), vec![(2, 1), (2, 2), (2, 3)]);
        assert!(g.step());
        assert_eq!(g.live_cells(), vec![(1, 2), (2, 2), (3, 2)]);
    }

    #[test]
    fn toroidal_neighbors_wrap_the_seam() {
        let mut g = AutomatonGrid::new(5, 5, Rule::life_like(&[3], &[2, 3]));
        // Horizontal blinker straddling the left/right seam.
        for x in [4, 0, 1] {
            g.set(x, 2, 1);
        }
        g.step();
        assert_eq!(g.live_cells(), vec![(0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn bounded_edges_have_no_neighbors_outside() {
        let mut rule = Rule::life_like(&[3], &[2, 3]);
        rule.topology = Topology::Plane;
        let mut g = AutomatonGrid::new(5, 5, rule);
        for x in [4, 0, 1] {
            g.set(x, 2, 1);
        }
        g.step();
        // Without wraparound the three cells are not a blinker: the isolated
        // cell at x=4 dies and nothing is born across the seam.
        assert!(!g.live_cells().contains(&(0, 1)));
    }

    #[test]
    fn generations_rules_decay_through_dying_states() {
        let mut rule: Rule = "/2/3".parse().unwrap();
        rule.topology = Topology::Plane;
        let mut g = AutomatonGrid::new(5, 5, rule);
        g.set(0, 0, 1);
        g.set(2, 0, 1);

        g.step();
        // The gap cell saw exactly two live neighbors and was born; the
        // original cells failed survival and entered the dying state.
        assert_eq!(g.get(1, 0), 1);
        assert_eq!(g.get(0, 0), 2);
        assert_eq!(g.get(2, 0), 2);
        // Dying cells are invisible to neighbor counts.
        assert_eq!(g.live_cells(), vec![(1, 0), (1, 1)]);

        g.step();
        assert_eq!(g.get(0, 0), 0);
        assert_eq!(g.get(2, 0), 0);
    }

    #[test]
    fn still_life_converges() {
        // A block is a still life: the first step reports no change.
        let mut g = AutomatonGrid::new(6, 6, Rule::life_like(&[3], &[2, 3]));
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            g.set(x, y, 1);
        }
        assert!(!g.step());
        assert_eq!(g.live_cells().len(), 4);
    }
}
