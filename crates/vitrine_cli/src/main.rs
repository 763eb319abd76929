//! Vitrine CLI
//!
//! Headless tools for the motion layer: scroll simulations, device profiles
//! and configuration checks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vitrine_motion::{DeviceProfiler, MotionConfig, Orchestrator};

mod page;
mod simulate;

use page::PageLayout;
use simulate::SimulationOptions;

// ANSI color codes
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BOLD: &str = "\x1b[1m";
    pub const CYAN: &str = "\x1b[36m";
}

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vitrine motion layer tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Motion configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll a page headlessly and report what the motion layer did
    Simulate {
        /// Page layout file (TOML); the brochure layout when absent
        #[arg(short, long)]
        page: Option<PathBuf>,

        /// Viewport width
        #[arg(long, default_value = "1280")]
        width: f32,

        /// Viewport height
        #[arg(long, default_value = "800")]
        height: f32,

        /// Simulate a reduced-motion preference
        #[arg(long)]
        reduced_motion: bool,

        /// Milliseconds between frames
        #[arg(long, default_value = "16.667")]
        frame_ms: f64,

        /// Scroll speed in pixels per second
        #[arg(long, default_value = "1200")]
        scroll_speed: f32,

        /// Pause at the bottom of the page in milliseconds
        #[arg(long, default_value = "500")]
        dwell_ms: f64,
    },

    /// Print the device profile for a viewport as JSON
    Profile {
        /// Viewport width; omit to simulate an unreadable width
        #[arg(long)]
        width: Option<f32>,

        /// Simulate a reduced-motion preference
        #[arg(long)]
        reduced_motion: bool,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Validate a configuration file and report which effects can start
    Check {
        /// Configuration file to validate
        file: PathBuf,

        /// Page layout to check anchors against
        #[arg(short, long)]
        page: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate {
            page,
            width,
            height,
            reduced_motion,
            frame_ms,
            scroll_speed,
            dwell_ms,
        } => {
            let options = SimulationOptions {
                width,
                height,
                reduced_motion,
                frame_ms,
                scroll_speed,
                dwell_ms,
            };
            cmd_simulate(cli.config.as_deref(), page.as_deref(), &options)
        }

        Commands::Profile { width, reduced_motion } => cmd_profile(cli.config.as_deref(), width, reduced_motion),

        Commands::Config => cmd_config(cli.config.as_deref()),

        Commands::Check { file, page } => cmd_check(&file, page.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<MotionConfig> {
    match path {
        Some(path) => {
            MotionConfig::load(path).with_context(|| format!("failed to load configuration from {}", path.display()))
        }
        None => Ok(MotionConfig::default()),
    }
}

fn load_page(path: Option<&Path>) -> Result<PageLayout> {
    match path {
        Some(path) => PageLayout::load(path),
        None => Ok(PageLayout::brochure()),
    }
}

fn cmd_simulate(config: Option<&Path>, page: Option<&Path>, options: &SimulationOptions) -> Result<()> {
    if !(options.frame_ms > 0.0) {
        anyhow::bail!("--frame-ms must be positive");
    }
    if !(options.scroll_speed > 0.0) {
        anyhow::bail!("--scroll-speed must be positive");
    }

    let config = load_config(config)?;
    let layout = load_page(page)?;
    info!(
        "Simulating {}x{} ({} sections, {:.0}px tall)",
        options.width,
        options.height,
        layout.sections.len(),
        layout.height()
    );

    let report = simulate::run(config, &layout, options);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.leaked != [0, 0, 0] {
        anyhow::bail!("teardown left resources behind: {:?}", report.leaked);
    }
    Ok(())
}

fn cmd_profile(config: Option<&Path>, width: Option<f32>, reduced_motion: bool) -> Result<()> {
    let config = load_config(config)?;
    let profiler = DeviceProfiler::new(config.device.clone(), config.max_particles());
    let profile = profiler.classify(width, reduced_motion);
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

fn cmd_config(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn cmd_check(file: &Path, page: Option<&Path>) -> Result<()> {
    let config = load_config(Some(file))?;
    let layout = load_page(page)?;
    info!("Checking {}", file.display());

    println!("{}{}Vitrine Check{}", colors::BOLD, colors::CYAN, colors::RESET);
    println!("=============");
    println!();
    println!("  [{}✓{}] configuration is valid", colors::GREEN, colors::RESET);

    // Start against the page to see which anchors resolve
    let scene = layout.build(1280.0, 800.0);
    let mut motion = Orchestrator::new(Box::new(scene), config);
    motion.start(0.0);

    let mut skipped = 0;
    for (name, running) in motion.effects() {
        if running {
            println!("  [{}✓{}] {}", colors::GREEN, colors::RESET, name);
        } else {
            skipped += 1;
            println!(
                "  [{}!{}] {}: skipped, its anchors are not on the page",
                colors::YELLOW,
                colors::RESET,
                name
            );
        }
    }
    motion.stop();

    println!();
    if skipped == 0 {
        println!("All effects can start.");
    } else {
        println!("{} effect(s) will be skipped. Run with --verbose for details.", skipped);
    }
    Ok(())
}
