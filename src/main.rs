use std::{path::PathBuf, time::Duration, time::Instant};

use clap::Parser;
use log::{info, warn};
use polysurf::{
    Controller, CycleOutcome, DeadlineTimers, MAX_DEGREE, PlotCycle, PlotParams, PolysurfError,
    Scheduler, SvgRenderer, parse_selection,
};
use rand::{SeedableRng as _, rngs::StdRng};

/// Plot random separable polynomials as 3D surfaces, optionally regenerating on a timer.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Variables to build polynomials over, e.g. "xyz" or "xz"
    #[arg(long, default_value = "xyz")]
    vars: String,

    /// Degree shared by every variable
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=MAX_DEGREE as i64))]
    degree: u8,

    /// Polynomials generated per cycle
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// How many of the generated polynomials are plotted
    #[arg(long, default_value_t = 3)]
    panels: usize,

    /// Seed for the random source; omit for a fresh seed every run
    #[arg(long)]
    seed: Option<u64>,

    /// Regenerate and redraw on a timer
    #[arg(short, long)]
    continuous: bool,

    /// Delay between cycles in continuous mode
    #[arg(long, default_value_t = 3000)]
    interval_ms: u64,

    /// Shut down after this many rendered figures in continuous mode; skipped cycles do
    /// not count (runs forever if omitted)
    #[arg(long)]
    cycles: Option<u64>,

    /// Where the current figure is written
    #[arg(short, long, default_value = "polysurf.svg")]
    out: PathBuf,
}

fn main() -> Result<(), PolysurfError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let params = PlotParams {
        variables: parse_selection(&args.vars)?,
        degree: args.degree,
        count: args.count,
        panels: args.panels,
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let renderer = SvgRenderer::new().with_output(&args.out);
    let scheduler = Scheduler::new(
        DeadlineTimers::new(),
        Duration::from_millis(args.interval_ms),
    );
    let mut controller = Controller::new(scheduler, PlotCycle::new(renderer, rng, params));

    let result = if args.continuous {
        run_continuous(&mut controller, args.cycles)
    } else {
        controller.plot_now().map(report)
    };

    // Release the figure even if the loop failed; the loop's error wins.
    let shutdown = controller.shutdown();
    let rendered = result.and_then(|rendered| shutdown.map(|()| rendered))?;
    if rendered {
        info!("Figure written to {}", args.out.display());
    }
    Ok(())
}

fn run_continuous(
    controller: &mut Controller<SvgRenderer, StdRng, DeadlineTimers>,
    max_cycles: Option<u64>,
) -> Result<bool, PolysurfError> {
    let mut rendered = 0u64;
    if let Some(outcome) = controller.start()? {
        rendered += u64::from(report(outcome));
    }

    while max_cycles.is_none_or(|max| rendered < max) {
        let Some(deadline) = controller.scheduler().timers().next_deadline() else {
            break;
        };
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        for timer in controller.timers_mut().expired(Instant::now()) {
            if let Some(outcome) = controller.on_timer(timer)? {
                rendered += u64::from(report(outcome));
            }
        }
    }

    controller.stop()?;
    Ok(rendered > 0)
}

/// Log a cycle's outcome; `true` if a figure was rendered.
fn report(outcome: CycleOutcome) -> bool {
    match outcome {
        CycleOutcome::Rendered(figure) => {
            info!("Figure {} ready", figure.id());
            true
        }
        CycleOutcome::Skipped(reason) => {
            warn!("Nothing plotted: {reason}");
            false
        }
    }
}
