use std::collections::HashSet;
use std::time::{Duration, Instant};

use rosc::OscType;

/*
    Shared view of the host page, as last reported by the surface bridge.
    Written by the OSC read thread, read by the daemon loop.
*/

#[derive(Debug, Default)]
pub struct SurfaceState {
    pub labels: HashSet<String>,
    pub reported: bool,
    // Set by each click we send, cleared by the next report
    pub clicked_at: Option<Instant>,
    pub acknowledged: bool,
}

impl SurfaceState {
    pub fn new() -> SurfaceState {
        SurfaceState::default()
    }

    pub fn set_labels(&mut self, args: &[OscType]) {
        self.labels = args
            .iter()
            .filter_map(|arg| arg.clone().string())
            .collect();
        self.reported = true;
        self.clicked_at = None;
    }

    /*
        Readable once the bridge has reported and no click of ours is waiting on a
        newer report. A click the page never saw produces no report, so the wait
        ends after `stale_after` and the old labels count again.
    */
    pub fn is_readable(&self, stale_after: Duration) -> bool {
        self.reported
            && self
                .clicked_at
                .map_or(true, |clicked| clicked.elapsed() >= stale_after)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn invalidate(&mut self) {
        self.clicked_at = Some(Instant::now());
    }

    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }
}
