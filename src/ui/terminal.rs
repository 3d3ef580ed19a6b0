use {
    super::{
        input::{CrosstermInput, Input, InputEvents},
        job_control::{JobControl, ProcessJobControl},
        layout::{render_layout, visible_rows, DashboardView},
    },
    crate::{
        aggregator_core::{lock_aggregator, SharedAggregator, TickSnapshot},
        config::TopConfig,
        ingestion::SourceStatus,
    },
    ratatui::{
        backend::{Backend, CrosstermBackend},
        Terminal,
    },
    std::{
        io,
        time::{Duration, Instant},
    },
    tokio::sync::watch,
};

/// Whether the dashboard loop keeps going after a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive top-N view over the shared aggregator
///
/// Each cycle ticks the aggregator (at most once per refresh interval),
/// paints the snapshot with the lock released, then waits for one input.
pub struct Dashboard<B: Backend, I: InputEvents, J: JobControl> {
    terminal: Terminal<B>,
    input: I,
    jobs: J,
    aggregator: SharedAggregator,
    status: watch::Receiver<SourceStatus>,
    source_name: String,
    refresh_interval: Duration,
    input_timeout: Duration,
    last_tick: Option<Instant>,
    snapshot: TickSnapshot,
}

impl<B: Backend, I: InputEvents, J: JobControl> Dashboard<B, I, J> {
    pub fn new(
        terminal: Terminal<B>,
        input: I,
        jobs: J,
        aggregator: SharedAggregator,
        status: watch::Receiver<SourceStatus>,
        source_name: impl Into<String>,
        config: &TopConfig,
    ) -> Self {
        Self {
            terminal,
            input,
            jobs,
            aggregator,
            status,
            source_name: source_name.into(),
            refresh_interval: config.refresh_interval,
            input_timeout: config.input_timeout,
            last_tick: None,
            snapshot: TickSnapshot::default(),
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        while self.cycle()? == Flow::Continue {}
        Ok(())
    }

    pub fn cycle(&mut self) -> io::Result<Flow> {
        self.refresh()?;

        match self.input.poll_input(self.input_timeout)? {
            None => {}
            Some(Input::Quit) => return Ok(Flow::Quit),
            Some(Input::Redraw) => self.repaint()?,
            Some(Input::Suspend) => {
                self.jobs.suspend()?;
                self.repaint()?;
            }
            Some(Input::Interrupt) => self.jobs.interrupt()?,
            Some(Input::Unrecognized) => self.input.alert()?,
        }
        Ok(Flow::Continue)
    }

    /// Last snapshot painted
    pub fn snapshot(&self) -> &TickSnapshot {
        &self.snapshot
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    fn refresh(&mut self) -> io::Result<()> {
        let due = self
            .last_tick
            .map_or(true, |at| at.elapsed() >= self.refresh_interval);
        if !due {
            return Ok(());
        }
        self.last_tick = Some(Instant::now());

        let rows = visible_rows(self.terminal.size()?.height);
        self.snapshot = lock_aggregator(&self.aggregator).tick(rows);
        self.paint()
    }

    fn repaint(&mut self) -> io::Result<()> {
        self.terminal.clear()?;
        self.paint()
    }

    fn paint(&mut self) -> io::Result<()> {
        let status = self.status.borrow().clone();
        let view = DashboardView {
            snapshot: &self.snapshot,
            source_name: &self.source_name,
            status: &status,
        };
        self.terminal.draw(|f| {
            let area = f.size();
            render_layout(f, area, &view)
        })?;
        Ok(())
    }
}

/// Switch the terminal to raw mode on the alternate screen
pub fn enter_screen() -> io::Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(
        io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )
}

/// Restore the terminal for the shell
pub fn leave_screen() -> io::Result<()> {
    crossterm::execute!(
        io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    crossterm::terminal::disable_raw_mode()
}

/// Run the dashboard on the real terminal until the user quits
pub fn run_ui(
    aggregator: SharedAggregator,
    status: watch::Receiver<SourceStatus>,
    source_name: String,
    config: &TopConfig,
) -> io::Result<()> {
    enter_screen()?;

    let result = Terminal::new(CrosstermBackend::new(io::stdout())).and_then(|mut terminal| {
        terminal.clear()?;
        Dashboard::new(
            terminal,
            CrosstermInput,
            ProcessJobControl,
            aggregator,
            status,
            source_name,
            config,
        )
        .run()
    });

    // Restore even when the loop failed
    let restored = leave_screen();
    result.and(restored)
}
