use std::error::Error;
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::osc_client::OscClient;
use crate::osc_model;
use crate::state::SurfaceState;
use crate::util;

pub const TURN_ON_MICROPHONE: &str = "Turn on microphone (⌘ + d)";
pub const TURN_OFF_MICROPHONE: &str = "Turn off microphone (⌘ + d)";

const HELLO_RESEND: Duration = Duration::from_secs(1);

/// The host application's mute toggle, as far as we can see and touch it.
pub trait HostSurface {
    /// Activates the control carrying `label`. False if no such control is present.
    fn click(&mut self, label: &str) -> bool;

    /// Current mute state, or None while the surface cannot be read.
    fn is_muted(&self) -> Option<bool>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLabels {
    pub turn_on: String,
    pub turn_off: String,
}

impl Default for SurfaceLabels {
    fn default() -> Self {
        SurfaceLabels {
            turn_on: TURN_ON_MICROPHONE.to_string(),
            turn_off: TURN_OFF_MICROPHONE.to_string(),
        }
    }
}

impl SurfaceLabels {
    // The control that moves the mic towards `muted`
    pub fn action_for(&self, muted: bool) -> &str {
        if muted {
            &self.turn_off
        } else {
            &self.turn_on
        }
    }

    // An offer to turn the mic on means it is currently off
    pub fn muted_from(&self, has_label: impl Fn(&str) -> bool) -> bool {
        has_label(&self.turn_on)
    }
}

/// Surface driven through the OSC bridge running next to the host page.
pub struct OscSurface {
    state: Arc<Mutex<SurfaceState>>,
    client: OscClient,
    labels: SurfaceLabels,
    // How long a click may go unanswered before the last report is trusted again
    stale_after: Duration,
}

impl OscSurface {
    pub fn new(
        state: Arc<Mutex<SurfaceState>>,
        client: OscClient,
        labels: SurfaceLabels,
        stale_after: Duration,
    ) -> OscSurface {
        OscSurface {
            state,
            client,
            labels,
            stale_after,
        }
    }

    /*
        Say hello to the bridge and block until it answers. UDP gives no delivery
        guarantees and the bridge may start after us, so keep repeating the hello.
    */
    pub fn handshake(&self, timeout: Option<Duration>) -> Result<(), Box<dyn Error>> {
        let started = Instant::now();
        let mut last_hello: Option<Instant> = None;

        log::info!("Waiting for surface bridge at {}", self.client.target());

        loop {
            if util::lock(&self.state).acknowledged {
                log::info!("Surface bridge acknowledged");
                return Ok(());
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(format!(
                        "No acknowledgment from surface bridge at {} within {:?}",
                        self.client.target(),
                        limit
                    )
                    .into());
                }
            }

            if last_hello.map_or(true, |time| time.elapsed() >= HELLO_RESEND) {
                self.client.send(&osc_model::create_surface_hello());
                last_hello = Some(Instant::now());
            }

            sleep(Duration::from_millis(10));
        }
    }
}

impl HostSurface for OscSurface {
    fn click(&mut self, label: &str) -> bool {
        let mut state = util::lock(&self.state);

        if !state.is_readable(self.stale_after) || !state.has_label(label) {
            return false;
        }

        self.client.send(&osc_model::create_surface_click(label));

        // Whatever we knew about the page is outdated until the bridge reports again
        state.invalidate();
        true
    }

    fn is_muted(&self) -> Option<bool> {
        let state = util::lock(&self.state);

        if !state.is_readable(self.stale_after) {
            return None;
        }

        Some(self.labels.muted_from(|label| state.has_label(label)))
    }
}
