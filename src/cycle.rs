use rand::Rng;

use crate::{
    Axis, Cycle, CycleOutcome, DEFAULT_DOMAIN, DEFAULT_SAMPLES, FigureHandle, PolysurfError,
    RenderPipeline, Scheduler, SchedulerState, Selection, Surface, TimerId, TimerQueue, evaluate,
    generate, invalid, make_grid,
};

/// Values the user-facing controls produce, read fresh at the start of every cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotParams {
    pub variables: Selection,
    pub degree: u8,
    /// Polynomials generated per cycle.
    pub count: usize,
    /// How many of the generated polynomials are plotted.
    pub panels: usize,
}

impl Default for PlotParams {
    fn default() -> Self {
        Self {
            variables: Axis::ALL.into_iter().collect(),
            degree: 2,
            count: 10,
            panels: 3,
        }
    }
}

/// Runs generate → grid → evaluate → render, owning the random source, the render
/// pipeline and the single live figure.
pub struct PlotCycle<R: RenderPipeline, G: Rng> {
    renderer: R,
    rng: G,
    params: PlotParams,
    domain: (f64, f64),
    samples: usize,
    current: Option<FigureHandle>,
    completed: u64,
}

impl<R: RenderPipeline, G: Rng> PlotCycle<R, G> {
    pub fn new(renderer: R, rng: G, params: PlotParams) -> Self {
        Self {
            renderer,
            rng,
            params,
            domain: DEFAULT_DOMAIN,
            samples: DEFAULT_SAMPLES,
            current: None,
            completed: 0,
        }
    }

    pub fn params(&self) -> &PlotParams {
        &self.params
    }

    /// Changes apply from the next cycle on.
    pub fn params_mut(&mut self) -> &mut PlotParams {
        &mut self.params
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn current_figure(&self) -> Option<FigureHandle> {
        self.current
    }

    /// Number of cycles that ended with a rendered figure.
    pub fn completed(&self) -> u64 {
        self.completed
    }
}

impl<R: RenderPipeline, G: Rng> Cycle for PlotCycle<R, G> {
    fn run_cycle(&mut self) -> Result<FigureHandle, PolysurfError> {
        let params = self.params.clone();
        if params.panels < 1 {
            return Err(invalid("at least one panel must be plotted"));
        }

        let polys = generate(&mut self.rng, &params.variables, params.degree, params.count)?;
        let grid = make_grid(self.domain.0, self.domain.1, self.samples)?;
        let panels = polys
            .iter()
            .take(params.panels)
            .enumerate()
            .map(|(i, poly)| -> Result<(Surface, String), PolysurfError> {
                log::info!("Polynomial {}: {}", i + 1, poly);
                Ok((evaluate(poly, &grid)?, format!("Polynomial {}", i + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        // Polynomials are dropped here; only their surfaces reach the renderer.
        drop(polys);

        if let Some(previous) = self.current.take() {
            self.renderer.dispose(previous)?;
        }
        let figure = self.renderer.render(&panels, &grid)?;
        self.current = Some(figure);
        self.completed += 1;
        log::info!("Cycle {} rendered figure {}", self.completed, figure.id());
        Ok(figure)
    }

    fn release(&mut self) -> Result<(), PolysurfError> {
        match self.current.take() {
            Some(figure) => self.renderer.dispose(figure),
            None => Ok(()),
        }
    }
}

/// Top-level controller: the regeneration scheduler plus the cycle it drives.
pub struct Controller<R: RenderPipeline, G: Rng, T: TimerQueue> {
    scheduler: Scheduler<T>,
    cycle: PlotCycle<R, G>,
}

impl<R: RenderPipeline, G: Rng, T: TimerQueue> Controller<R, G, T> {
    pub fn new(scheduler: Scheduler<T>, cycle: PlotCycle<R, G>) -> Self {
        Self { scheduler, cycle }
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &Scheduler<T> {
        &self.scheduler
    }

    pub fn timers_mut(&mut self) -> &mut T {
        self.scheduler.timers_mut()
    }

    pub fn cycle(&self) -> &PlotCycle<R, G> {
        &self.cycle
    }

    pub fn params_mut(&mut self) -> &mut PlotParams {
        self.cycle.params_mut()
    }

    pub fn start(&mut self) -> Result<Option<CycleOutcome>, PolysurfError> {
        self.scheduler.start(&mut self.cycle)
    }

    pub fn stop(&mut self) -> Result<bool, PolysurfError> {
        self.scheduler.stop()
    }

    pub fn plot_now(&mut self) -> Result<CycleOutcome, PolysurfError> {
        self.scheduler.plot_now(&mut self.cycle)
    }

    pub fn on_timer(&mut self, timer: TimerId) -> Result<Option<CycleOutcome>, PolysurfError> {
        self.scheduler.on_timer(timer, &mut self.cycle)
    }

    pub fn shutdown(&mut self) -> Result<(), PolysurfError> {
        self.scheduler.shutdown(&mut self.cycle)
    }
}
