use crate::config::SharedConfig;
use crate::core::catalog::QuoteCatalog;
use crate::core::display::{DisplayController, DEFAULT_WIDTH};
use crate::core::scale::ScaleReader;
use crate::domain::model::SessionState;
use crate::domain::ports::{Clock, DisplaySink, SampleTransport, TextFormatter};
use crate::utils::error::Result;
use std::time::{Duration, Instant};

/// Top-level control loop: poll the scale, drive the idle/showing state
/// machine, and sequence the display.
///
/// One `step` is one poll cycle; `run` repeats step + sleep forever. With
/// `weight_display` set the state machine is bypassed and every raw reading
/// goes straight to the display.
pub struct SessionLoop<T, S, F, C>
where
    T: SampleTransport,
    S: DisplaySink,
    F: TextFormatter,
    C: Clock,
{
    scale: ScaleReader<T>,
    catalog: QuoteCatalog,
    display: DisplayController<S, F>,
    clock: C,
    config: SharedConfig,
    state: SessionState,
}

impl<T, S, F, C> SessionLoop<T, S, F, C>
where
    T: SampleTransport,
    S: DisplaySink,
    F: TextFormatter,
    C: Clock,
{
    pub fn new(
        scale: ScaleReader<T>,
        catalog: QuoteCatalog,
        display: DisplayController<S, F>,
        clock: C,
        config: SharedConfig,
    ) -> Self {
        Self {
            scale,
            catalog,
            display,
            clock,
            config,
            state: SessionState::Idle,
        }
    }

    /// Show the introductory banner for `banner_wait` seconds.
    pub fn show_banner(&mut self) -> Result<()> {
        self.display.show_banner()?;
        let wait = self.config.get("banner_wait").max(0) as u64;
        self.clock.sleep(Duration::from_secs(wait));
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        if self.config.get("weight_display") != 0 {
            return self.run_weight_display();
        }
        tracing::info!("session loop starting");
        loop {
            self.step()?;
            self.pause();
        }
    }

    /// One poll cycle of the state machine.
    pub fn step(&mut self) -> Result<()> {
        let weight = match self.scale.read()? {
            None | Some(0) => {
                if self.state == SessionState::Idle {
                    self.display.clear()?;
                }
                return Ok(());
            }
            Some(weight) => weight,
        };

        if let SessionState::ShowingQuotation { since } = self.state {
            // hold the quotation until the person changed and the time is up
            if !self.scale.is_last_reported(weight) && self.quotation_expired(since) {
                self.state = SessionState::Idle;
                self.scale.reset();
            }
            return Ok(());
        }

        if weight.abs() >= self.config.get("min_weight_display") {
            self.display.show_weight(weight)?;
        }

        if !self.scale.is_last_reported(weight) && self.scale.is_stable() {
            if let Some(text) = self.catalog.find(weight) {
                if !text.is_empty() {
                    self.display.show_quotation(&text)?;
                    self.state = SessionState::ShowingQuotation {
                        since: self.clock.now(),
                    };
                    self.scale.mark_reported(weight);
                }
            }
        }
        Ok(())
    }

    /// Continuous mode: show every raw reading, once per second, no
    /// quotation logic at all.
    fn run_weight_display(&mut self) -> Result<()> {
        tracing::info!("continuous weight display");
        loop {
            let text = match self.scale.read()? {
                Some(weight) => weight.to_string(),
                None => "no result".to_string(),
            };
            self.display.show(&text, true, true, DEFAULT_WIDTH)?;
            self.clock.sleep(Duration::from_secs(1));
        }
    }

    fn quotation_expired(&self, since: Instant) -> bool {
        let show_time = self.config.get("zitat_show_time").max(0) as u64;
        self.clock.now().duration_since(since) > Duration::from_secs(show_time)
    }

    fn pause(&self) {
        let secs = self.config.get("read_sleep").max(0) as u64;
        self.clock.sleep(Duration::from_secs(secs));
    }

    pub fn is_showing(&self) -> bool {
        matches!(self.state, SessionState::ShowingQuotation { .. })
    }
}
