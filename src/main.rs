use clap::Parser;
use zoetrope::app::{self, Args};

fn main() -> anyhow::Result<()> {
    app::run(Args::parse())
}
