use crate::canvas::Canvas;
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;

/// What an animation wants after finishing a step.
///
/// Termination is this explicit value, not a missing side effect: the driver
/// stops stepping on `Done` and there is no separate stop call.
pub enum StepResult {
    /// Step again after roughly this delay.
    Continue(Duration),
    /// The animation has run to completion.
    Done,
}

/// The uniform contract every animation implements.
///
/// The first call sees `ctx.frame == 0` and performs setup (parameter
/// selection, grid allocation, label). Every call advances the simulation,
/// renders a complete frame into `ctx.canvas`, and returns the next delay or
/// `Done`. Steps run to completion on one thread; "suspension" between frames
/// is purely the returned delay.
pub trait Animation {
    fn step(&mut self, ctx: &mut SimContext) -> StepResult;
}

/// Shared per-run simulation state, owned by the driver and passed `&mut`
/// into each step. Reset between animation runs.
pub struct SimContext {
    pub rows: usize,
    pub cols: usize,
    /// Pixel aspect hints for a character cell, used by geometry/physics
    /// scaling. A typical terminal cell is about twice as tall as wide.
    pub char_width: f32,
    pub char_height: f32,
    /// Monotonically increasing while the animation is active.
    pub frame: u64,
    /// Batch multiplier derived from grid area, ≥ 1.
    pub speed: f32,
    pub rng: StdRng,
    /// Requested sub-animation variant; in-range values override random
    /// variant sampling.
    pub variant: Option<usize>,
    /// Short descriptive label for the current variant/parameters.
    /// Presentation-only; the driver shows it in the HUD.
    pub label: Option<String>,
    pub canvas: Canvas,
}

impl SimContext {
    pub fn new(rows: usize, cols: usize, seed: u64) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            char_width: 1.0,
            char_height: 2.0,
            frame: 0,
            speed: ((rows * cols) as f32 / 750.0).max(1.0),
            rng: StdRng::seed_from_u64(seed),
            variant: None,
            label: None,
            canvas: Canvas::new(rows, cols),
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// The requested variant if it indexes into `len` choices, else None
    /// (out-of-range requests fall back to random sampling).
    pub fn variant_in(&self, len: usize) -> Option<usize> {
        self.variant.filter(|&v| v < len)
    }

    /// Start a fresh run on the same surface: new seed, frame 0, no label,
    /// cleared canvas.
    pub fn reset(&mut self, seed: u64) {
        self.frame = 0;
        self.label = None;
        self.rng = StdRng::seed_from_u64(seed);
        self.canvas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_clamped_and_speed_derived() {
        let ctx = SimContext::new(0, 0, 1);
        assert_eq!(ctx.rows, 1);
        assert_eq!(ctx.cols, 1);
        assert_eq!(ctx.speed, 1.0);

        let big = SimContext::new(50, 150, 1);
        assert!((big.speed - 10.0).abs() < 1e-6);
    }

    #[test]
    fn variant_gating() {
        let mut ctx = SimContext::new(10, 10, 1);
        assert_eq!(ctx.variant_in(3), None);
        ctx.variant = Some(2);
        assert_eq!(ctx.variant_in(3), Some(2));
        assert_eq!(ctx.variant_in(2), None);
    }

    #[test]
    fn reset_clears_run_state() {
        let mut ctx = SimContext::new(4, 4, 1);
        ctx.frame = 17;
        ctx.set_label("x");
        ctx.canvas.set(0, 0, '#');
        ctx.reset(2);
        assert_eq!(ctx.frame, 0);
        assert!(ctx.label.is_none());
        assert_eq!(ctx.canvas.get(0, 0), ' ');
    }
}
