use crate::pedal_model::{MidiEvent, CONTROL_CHANGE, SUSTAIN_PEDAL_CC};
use crate::util;

// Default polarity: holding the pedal down opens the mic, push-to-talk style
pub const SUSTAIN_PEDAL_MUTES: bool = false;

pub fn parse(message: &[u8]) -> Option<MidiEvent> {
    if message.len() < 3 {
        return None;
    }

    Some(MidiEvent {
        command: message[0] >> 4,
        channel: message[0] & 0xf,
        note: message[1],
        velocity: util::midi_to_unit(message[2]),
    })
}

// Some(pressed) for sustain pedal control changes, None for anything else
pub fn sustain_signal(event: &MidiEvent, sustain_cc: u8) -> Option<bool> {
    if event.command == CONTROL_CHANGE && event.note == sustain_cc {
        Some(event.velocity == 1.0)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PedalMapping {
    pub sustain_cc: u8,
    pub sustain_pedal_mutes: bool,
}

impl Default for PedalMapping {
    fn default() -> Self {
        PedalMapping {
            sustain_cc: SUSTAIN_PEDAL_CC,
            sustain_pedal_mutes: SUSTAIN_PEDAL_MUTES,
        }
    }
}

impl PedalMapping {
    /// Desired mute state for a decoded event, if it is a sustain event at all.
    pub fn desired_mute(&self, event: &MidiEvent) -> Option<bool> {
        sustain_signal(event, self.sustain_cc).map(|sustained| {
            if self.sustain_pedal_mutes {
                sustained
            } else {
                !sustained
            }
        })
    }
}
