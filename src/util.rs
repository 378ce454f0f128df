use std::ops::Range;
use std::sync::{Mutex, MutexGuard};

const MIDI_RANGE: f32 = 127.0;

pub fn midi_to_float(range: Range<f32>, value: u8) -> f32 {
    range.start + (value as f32 / MIDI_RANGE) * (range.end - range.start)
}

// MIDI data byte as 0.0-1.0
pub fn midi_to_unit(value: u8) -> f32 {
    midi_to_float(0.0..1.0, value)
}

// A panicking writer thread should not take the daemon down with it
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify() {
        assert_eq!(midi_to_unit(0), 0.0);
        assert_eq!(midi_to_unit(127), 1.0);
        assert!(midi_to_unit(64) > 0.5 && midi_to_unit(64) < 0.51);

        assert_eq!(midi_to_float(0.0..2.0, 127), 2.0);
        assert_eq!(midi_to_float(-1.0..1.0, 0), -1.0);
    }
}
