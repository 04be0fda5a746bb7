use anyhow::Context;
use clap::Parser;
use explorer::{init_logging, run_exploration, Args, ExplorationSettings};

// Every iteration allocates and frees episode-sized frame buffers of varying
// lengths; jemalloc keeps the resulting heap fragmentation in check.
#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    let settings = ExplorationSettings::from_args(&args)?;
    let schedule = run_exploration(&settings)
        .with_context(|| format!("exploration run in {} failed", settings.working_dir.display()))?;
    log::info!(
        "explored {} episodes ({} frames) over {} iterations",
        schedule.total_episodes_seen(),
        schedule.total_frames_seen(),
        schedule.iteration()
    );
    Ok(())
}
