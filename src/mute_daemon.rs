use std::thread::sleep;
use std::time::{Duration, Instant};

use ringbuf::traits::Consumer;

use crate::feedback::Feedback;
use crate::midi_mapping::PedalMapping;
use crate::pedal_model::MidiEvent;
use crate::reconciler::{Outcome, Reconciler};
use crate::surface::HostSurface;

// Upper bound on how long a pedal press can sit in the pipe unnoticed
const IDLE_SLEEP: Duration = Duration::from_millis(2);

pub struct MuteDaemon<S: HostSurface, F: Feedback> {
    mapping: PedalMapping,
    reconciler: Reconciler,
    surface: S,
    feedback: F,
}

impl<S: HostSurface, F: Feedback> MuteDaemon<S, F> {
    pub fn new(mapping: PedalMapping, reconciler: Reconciler, surface: S, feedback: F) -> Self {
        MuteDaemon {
            mapping,
            reconciler,
            surface,
            feedback,
        }
    }

    pub fn handle_event(&mut self, event: &MidiEvent, now: Instant) {
        if let Some(desired) = self.mapping.desired_mute(event) {
            log::debug!("Sustain event on channel {}, requesting muted={}", event.channel, desired);
            self.reconciler.request_mute_state(desired, now);
        }
    }

    // One pass of the loop: drain the pipe, then let the reconciler act if due
    pub fn step<C: Consumer<Item = MidiEvent>>(&mut self, events: &mut C, now: Instant) -> Option<Outcome> {
        while let Some(event) = events.try_pop() {
            self.handle_event(&event, now);
        }

        let outcome = self
            .reconciler
            .poll(now, &mut self.surface, &mut self.feedback);

        match outcome {
            Some(Outcome::Reached(muted)) => log::info!("Microphone {}", if muted { "muted" } else { "unmuted" }),
            Some(Outcome::Retrying { desired, attempts }) => {
                log::debug!("muted={} not reached yet, attempt {}", desired, attempts)
            }
            Some(Outcome::Abandoned { desired }) => {
                log::debug!("Could not reach muted={}, leaving it be", desired)
            }
            None => {}
        }

        outcome
    }

    pub fn begin<C: Consumer<Item = MidiEvent>>(mut self, mut events: C) -> ! {
        log::info!("Mute daemon running");

        loop {
            let now = Instant::now();
            self.step(&mut events, now);

            let pause = if self.reconciler.is_idle() {
                IDLE_SLEEP
            } else {
                self.reconciler.next_wakeup().map_or(IDLE_SLEEP, |wakeup| {
                    wakeup.saturating_duration_since(now).min(IDLE_SLEEP)
                })
            };

            sleep(pause);
        }
    }
}
