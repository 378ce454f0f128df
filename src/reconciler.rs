use std::time::{Duration, Instant};

use crate::feedback::Feedback;
use crate::surface::{HostSurface, SurfaceLabels};

pub const MAX_ATTEMPTS: u32 = 10;
pub const DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileSettings {
    pub max_attempts: u32,
    pub debounce: Duration,
    pub retry_interval: Duration,
    pub labels: SurfaceLabels,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        ReconcileSettings {
            max_attempts: MAX_ATTEMPTS,
            debounce: DEBOUNCE,
            retry_interval: DEBOUNCE,
            labels: SurfaceLabels::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Reached(bool),
    Retrying { desired: bool, attempts: u32 },
    Abandoned { desired: bool },
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    desired: bool,
    fires_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Episode {
    desired: bool,
    attempts: u32,
    due: Instant,
}

/*
    Drives the host surface towards the last requested mute state.

    Requests are debounced on the trailing edge: each one replaces the pending
    request and restarts the quiet period. When the period runs out an episode
    starts, which looks up, clicks, verifies and retries on mismatch until the
    attempt budget is spent.

    There is a single episode slot. A new request drops the running episode
    right away, so retries for an outdated state never race the newer one.

    Nothing here sleeps or spawns: the owner calls poll() with the current time,
    next_wakeup() says when that is worth doing next.
*/
pub struct Reconciler {
    settings: ReconcileSettings,
    pending: Option<PendingRequest>,
    episode: Option<Episode>,
}

impl Reconciler {
    pub fn new(settings: ReconcileSettings) -> Reconciler {
        Reconciler {
            settings,
            pending: None,
            episode: None,
        }
    }

    pub fn request_mute_state(&mut self, desired: bool, now: Instant) {
        if let Some(episode) = self.episode.take() {
            log::debug!(
                "Dropping episode for muted={} after {} attempts",
                episode.desired,
                episode.attempts
            );
        }

        self.pending = Some(PendingRequest {
            desired,
            fires_at: now + self.settings.debounce,
        });
    }

    pub fn next_wakeup(&self) -> Option<Instant> {
        match (self.pending, self.episode) {
            (Some(pending), _) => Some(pending.fires_at),
            (None, Some(episode)) => Some(episode.due),
            (None, None) => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && self.episode.is_none()
    }

    pub fn poll(
        &mut self,
        now: Instant,
        surface: &mut dyn HostSurface,
        feedback: &mut dyn Feedback,
    ) -> Option<Outcome> {
        if let Some(pending) = self.pending {
            if now < pending.fires_at {
                return None;
            }

            self.pending = None;
            self.episode = Some(Episode {
                desired: pending.desired,
                attempts: 0,
                due: now,
            });
        }

        let episode = self.episode?;
        if now < episode.due {
            return None;
        }

        Some(self.attempt(episode, now, surface, feedback))
    }

    fn attempt(
        &mut self,
        mut episode: Episode,
        now: Instant,
        surface: &mut dyn HostSurface,
        feedback: &mut dyn Feedback,
    ) -> Outcome {
        let desired = episode.desired;

        if episode.attempts > self.settings.max_attempts {
            log::debug!("Giving up on muted={} after {} attempts", desired, episode.attempts);
            self.episode = None;
            return Outcome::Abandoned { desired };
        }

        let label = self.settings.labels.action_for(desired);
        if surface.click(label) {
            log::info!("Clicking button: {}", label);
        }

        if surface.is_muted() != Some(desired) {
            episode.attempts += 1;
            episode.due = now + self.settings.retry_interval;
            self.episode = Some(episode);
            return Outcome::Retrying {
                desired,
                attempts: episode.attempts,
            };
        }

        self.episode = None;
        feedback.play(desired);
        Outcome::Reached(desired)
    }
}
