//! Terminal driver: owns the crossterm surface, sizes the simulation
//! context, rotates through the catalog, and interprets step results.

use crate::anim::Catalog;
use crate::context::{SimContext, StepResult};
use anyhow::Context as _;
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::Print,
    terminal::{
        self, BeginSynchronizedUpdate, DisableLineWrap, EnableLineWrap, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use rand::{rngs::StdRng, SeedableRng};
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(about = "Procedurally generated character-grid simulations")]
pub struct Args {
    /// animation to run (default: weighted random rotation)
    #[arg(long)]
    pub anim: Option<String>,

    /// sub-animation variant index
    #[arg(long)]
    pub variant: Option<usize>,

    /// RNG seed (default: from the clock)
    #[arg(long)]
    pub seed: Option<u64>,

    /// minimum ms per frame
    #[arg(long, default_value_t = 25)]
    pub ms: u64,

    /// leave N rows unused at the bottom to avoid scrolling
    #[arg(long, default_value_t = 0)]
    pub margin_rows: u16,

    /// list animations and exit
    #[arg(long, default_value_t = false)]
    pub list: bool,
}

struct TermGuard {
    out: Stdout,
}

impl TermGuard {
    fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            cursor::MoveTo(0, 0)
        )?;
        Ok(Self { out })
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            EndSynchronizedUpdate,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0xC0FFEE)
}

/// HUD text, truncated or padded to exactly `cols` characters.
fn hud_line(label: &str, frame: u64, cols: usize) -> String {
    let hud = format!(" {label}  frame {frame}  [q]uit [space]pause [r]eseed [n]ext");
    let mut hud: String = hud.chars().take(cols).collect();
    while hud.chars().count() < cols {
        hud.push(' ');
    }
    hud
}

/// Queue only the cells that changed since the last presented frame, then
/// redraw the HUD line below the grid.
fn present(out: &mut Stdout, ctx: &SimContext, shown: &mut [char], name: &str) -> io::Result<()> {
    queue!(out, BeginSynchronizedUpdate)?;
    for y in 0..ctx.rows {
        for x in 0..ctx.cols {
            let ch = ctx.canvas.get(x, y);
            let i = y * ctx.cols + x;
            if shown[i] != ch {
                shown[i] = ch;
                queue!(out, cursor::MoveTo(x as u16, y as u16), Print(ch))?;
            }
        }
    }
    let label = ctx.label.as_deref().unwrap_or(name);
    queue!(
        out,
        cursor::MoveTo(0, ctx.rows as u16),
        Print(hud_line(label, ctx.frame, ctx.cols)),
        EndSynchronizedUpdate
    )?;
    out.flush()
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let catalog = Catalog::standard();
    if args.list {
        for name in catalog.names() {
            println!("{name}");
        }
        return Ok(());
    }
    let requested = match args.anim.as_deref() {
        Some(name) => Some(
            catalog
                .index_of_name(name)
                .with_context(|| format!("unknown animation {name:?}"))?,
        ),
        None => None,
    };

    let mut seed = args.seed.unwrap_or_else(clock_seed);
    let mut pick_rng = StdRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
    let floor = Duration::from_millis(args.ms.max(1));
    let hud_rows = 1usize;

    let mut tg = TermGuard::new()?;

    'catalog: loop {
        let term_size = terminal::size()?;
        let cols = (term_size.0 as usize).max(1);
        let grid_rows = (term_size.1 as usize)
            .saturating_sub(hud_rows + args.margin_rows as usize)
            .max(1);

        let mut ctx = SimContext::new(grid_rows, cols, seed);
        ctx.variant = args.variant;
        let entry = catalog.pick(&mut pick_rng, requested);
        let mut anim = (entry.build)();
        let mut shown: Vec<char> = vec![' '; grid_rows * cols];
        execute!(tg.out, terminal::Clear(terminal::ClearType::All))?;

        let mut paused = false;
        let mut delay = floor;

        loop {
            if terminal::size()? != term_size {
                continue 'catalog;
            }

            if !paused {
                let result = anim.step(&mut ctx);
                ctx.frame += 1;
                present(&mut tg.out, &ctx, &mut shown, entry.name)?;
                match result {
                    StepResult::Continue(d) => delay = d.max(floor),
                    StepResult::Done => {
                        // Hold the finished frame, then rotate.
                        std::thread::sleep(Duration::from_millis(900));
                        seed = seed.wrapping_add(1);
                        continue 'catalog;
                    }
                }
            }

            // Spend the inter-frame delay watching for input.
            let deadline = Instant::now() + if paused { Duration::from_millis(100) } else { delay };
            loop {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() || !event::poll(left)? {
                    break;
                }
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') => paused = !paused,
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        seed = seed.wrapping_add(1);
                        ctx.reset(seed);
                        anim = (entry.build)();
                        shown.fill(' ');
                        execute!(tg.out, terminal::Clear(terminal::ClearType::All))?;
                        paused = false;
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') => {
                        seed = seed.wrapping_add(1);
                        continue 'catalog;
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "zoetrope",
            "--anim",
            "automata",
            "--variant",
            "2",
            "--seed",
            "9",
            "--ms",
            "40",
        ])
        .unwrap();
        assert_eq!(args.anim.as_deref(), Some("automata"));
        assert_eq!(args.variant, Some(2));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.ms, 40);
        assert!(!args.list);
    }

    #[test]
    fn hud_line_is_exactly_cols_wide() {
        let line = hud_line("automata: conway (B3/S23)", 12, 20);
        assert_eq!(line.chars().count(), 20);
        let line = hud_line("x", 0, 80);
        assert_eq!(line.chars().count(), 80);
        assert!(line.contains("[q]uit"));
    }
}
