/*
    CHARTING:

    message structure: [status, data1, data2]
        - status high nibble is the command, low nibble the channel
        - control change: command 11 (status 176-191)
        - sustain pedal: controller (data1) 64
            - pressed: 127, released: 0
        - half-pedal values in between count as released

    Only the sustain pedal matters here, everything else is dropped at the
    mapping stage.
*/

pub const CONTROL_CHANGE: u8 = 11;
pub const SUSTAIN_PEDAL_CC: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiEvent {
    pub command: u8,
    pub channel: u8,
    pub note: u8,
    pub velocity: f32,
}
