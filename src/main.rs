use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use winit::event_loop::{ControlFlow, EventLoop};

mod animation;
mod app;
mod error;
mod model;
mod parser;
mod renderer;
mod settings;
mod ui;
mod viewer;

#[derive(Parser, Debug)]
#[command(name = "animvis-rs")]
#[command(about = "Animated model viewer: keys 1-4 switch models, space plays, drag scrubs")]
struct Cli {
    /// Directory the model slots are resolved against
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Slot shown at startup
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=4))]
    slot: u8,

    /// Start with animations playing
    #[arg(long)]
    animate: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = settings::ViewerSettings::load();
    if let Some(assets) = cli.assets {
        settings.asset_dir = assets;
    }
    log::info!("Asset directory: {}", settings.asset_dir.display());

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut handler = app::AppHandler::new(settings, usize::from(cli.slot - 1), cli.animate);
    event_loop
        .run_app(&mut handler)
        .context("running event loop")?;

    if let Some(e) = handler.error {
        return Err(anyhow::Error::new(e).context("viewer startup failed"));
    }

    Ok(())
}
