//! Intro Sequence
//!
//! Drives the onboarding animation through a fixed, timed list of phases:
//!
//! ```text
//! logo-appear (1000ms) -> logo-pulse (1000ms) -> text-type (500ms)
//!     -> scatter (1000ms) -> dashboard-fade (1200ms) -> complete
//! ```
//!
//! A single Tokio task owns the timer and is re-armed on every transition.
//! `skip()` aborts that task and jumps straight to `complete`. Phases only
//! move forward; the timer advances with a compare-and-set against the phase
//! it was armed for, so a late tick can never undo a skip.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Named interval of the intro animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntroPhase {
    LogoAppear,
    LogoPulse,
    TextType,
    Scatter,
    DashboardFade,
    Complete,
}

/// (phase, hold duration in ms, next phase)
const TRANSITIONS: [(IntroPhase, u64, IntroPhase); 5] = [
    (IntroPhase::LogoAppear, 1000, IntroPhase::LogoPulse),
    (IntroPhase::LogoPulse, 1000, IntroPhase::TextType),
    (IntroPhase::TextType, 500, IntroPhase::Scatter),
    (IntroPhase::Scatter, 1000, IntroPhase::DashboardFade),
    (IntroPhase::DashboardFade, 1200, IntroPhase::Complete),
];

impl IntroPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntroPhase::LogoAppear => "logo-appear",
            IntroPhase::LogoPulse => "logo-pulse",
            IntroPhase::TextType => "text-type",
            IntroPhase::Scatter => "scatter",
            IntroPhase::DashboardFade => "dashboard-fade",
            IntroPhase::Complete => "complete",
        }
    }

    /// How long this phase is held. `None` for `Complete`.
    pub fn duration(&self) -> Option<Duration> {
        transition(*self).map(|(duration, _)| duration)
    }

    /// Phase that follows this one. `None` for `Complete`.
    pub fn next(&self) -> Option<IntroPhase> {
        transition(*self).map(|(_, next)| next)
    }
}

impl fmt::Display for IntroPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn transition(phase: IntroPhase) -> Option<(Duration, IntroPhase)> {
    TRANSITIONS
        .iter()
        .find(|(from, _, _)| *from == phase)
        .map(|(_, ms, next)| (Duration::from_millis(*ms), *next))
}

/// Sum of all phase durations
pub fn total_duration() -> Duration {
    TRANSITIONS
        .iter()
        .map(|(_, ms, _)| Duration::from_millis(*ms))
        .sum()
}

/// Observable sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroState {
    pub phase: IntroPhase,
    pub is_complete: bool,
    pub is_skipped: bool,
}

impl Default for IntroState {
    fn default() -> Self {
        Self {
            phase: IntroPhase::LogoAppear,
            is_complete: false,
            is_skipped: false,
        }
    }
}

/// Sequencer options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroConfig {
    /// Start the timers immediately on creation
    pub auto_start: bool,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self { auto_start: true }
    }
}

/// Timed state machine for the intro animation
pub struct IntroSequencer {
    state: Arc<watch::Sender<IntroState>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl IntroSequencer {
    /// Create a sequencer in `logo-appear`, starting the timers when
    /// `auto_start` is set. Starting requires a Tokio runtime.
    pub fn new(config: IntroConfig) -> Self {
        let (tx, _rx) = watch::channel(IntroState::default());
        let sequencer = Self {
            state: Arc::new(tx),
            timer: Mutex::new(None),
        };

        if config.auto_start {
            sequencer.start();
        }

        sequencer
    }

    pub fn state(&self) -> IntroState {
        *self.state.borrow()
    }

    pub fn phase(&self) -> IntroPhase {
        self.state.borrow().phase
    }

    pub fn is_complete(&self) -> bool {
        self.state.borrow().is_complete
    }

    pub fn is_skipped(&self) -> bool {
        self.state.borrow().is_skipped
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<IntroState> {
        self.state.subscribe()
    }

    /// Arm the timer from the current phase. Returns `false` if the sequence
    /// is already running or finished, or no Tokio runtime is available.
    pub fn start(&self) -> bool {
        if self.is_complete() {
            return false;
        }

        let Ok(mut timer) = self.timer.lock() else {
            return false;
        };
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(error = %e, "Intro sequence not started: no async runtime");
                return false;
            }
        };

        tracing::debug!(phase = %self.phase(), "Intro sequence started");
        *timer = Some(runtime.spawn(run_timer(Arc::clone(&self.state))));
        true
    }

    /// Jump straight to `complete`. Idempotent once the sequence has ended.
    pub fn skip(&self) {
        self.cancel_timer();

        let skipped = self.state.send_if_modified(|state| {
            if state.is_complete {
                return false;
            }
            state.phase = IntroPhase::Complete;
            state.is_complete = true;
            state.is_skipped = true;
            true
        });

        if skipped {
            tracing::info!("Intro sequence skipped");
        }
    }

    fn cancel_timer(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for IntroSequencer {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

async fn run_timer(state: Arc<watch::Sender<IntroState>>) {
    let mut deadline = Instant::now();

    loop {
        let armed_for = state.borrow().phase;
        let Some((hold, next)) = transition(armed_for) else {
            break;
        };

        deadline += hold;
        tokio::time::sleep_until(deadline).await;

        let advanced = state.send_if_modified(|current| {
            if current.is_complete || current.phase != armed_for {
                return false;
            }
            current.phase = next;
            current.is_complete = next == IntroPhase::Complete;
            true
        });

        if !advanced {
            break;
        }

        if next == IntroPhase::Complete {
            tracing::info!("Intro sequence complete");
        } else {
            tracing::debug!(phase = %next, "Intro phase advanced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        assert_eq!(total_duration(), Duration::from_millis(4700));
        assert_eq!(IntroPhase::LogoAppear.next(), Some(IntroPhase::LogoPulse));
        assert_eq!(
            IntroPhase::TextType.duration(),
            Some(Duration::from_millis(500))
        );
        assert_eq!(IntroPhase::Complete.next(), None);
        assert_eq!(IntroPhase::Complete.duration(), None);
    }

    #[test]
    fn test_phase_wire_names() {
        let json = serde_json::to_string(&IntroPhase::DashboardFade).unwrap();
        assert_eq!(json, "\"dashboard-fade\"");
        assert_eq!(IntroPhase::LogoAppear.to_string(), "logo-appear");
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_completion() {
        let started = Instant::now();
        let sequencer = IntroSequencer::new(IntroConfig::default());
        let mut rx = sequencer.subscribe();

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let state = *rx.borrow_and_update();
            seen.push((state.phase, started.elapsed().as_millis()));
            if state.is_complete {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                (IntroPhase::LogoPulse, 1000),
                (IntroPhase::TextType, 2000),
                (IntroPhase::Scatter, 2500),
                (IntroPhase::DashboardFade, 3500),
                (IntroPhase::Complete, 4700),
            ]
        );
        assert!(sequencer.is_complete());
        assert!(!sequencer.is_skipped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_is_immediate_and_final() {
        let sequencer = IntroSequencer::new(IntroConfig::default());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(sequencer.phase(), IntroPhase::LogoPulse);

        sequencer.skip();
        assert_eq!(
            sequencer.state(),
            IntroState {
                phase: IntroPhase::Complete,
                is_complete: true,
                is_skipped: true,
            }
        );

        let mut rx = sequencer.subscribe();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!rx.has_changed().unwrap());

        sequencer.skip();
        assert!(!rx.has_changed().unwrap());
        assert!(sequencer.is_skipped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_after_natural_completion() {
        let sequencer = IntroSequencer::new(IntroConfig::default());
        tokio::time::sleep(total_duration() + Duration::from_millis(1)).await;
        assert!(sequencer.is_complete());

        sequencer.skip();
        assert!(!sequencer.is_skipped());
        assert!(!sequencer.start());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_start() {
        let sequencer = IntroSequencer::new(IntroConfig { auto_start: false });
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(sequencer.phase(), IntroPhase::LogoAppear);

        assert!(sequencer.start());
        assert!(!sequencer.start());

        let mut rx = sequencer.subscribe();
        rx.wait_for(|state| state.is_complete).await.unwrap();
        assert!(!sequencer.is_skipped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let sequencer = IntroSequencer::new(IntroConfig::default());
        let rx = sequencer.subscribe();
        drop(sequencer);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rx.borrow().phase, IntroPhase::LogoAppear);
    }

    #[test]
    fn test_start_without_runtime() {
        let sequencer = IntroSequencer::new(IntroConfig::default());
        assert_eq!(sequencer.phase(), IntroPhase::LogoAppear);
        assert!(!sequencer.start());
    }
}
