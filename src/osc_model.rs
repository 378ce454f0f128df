use rosc::{OscMessage, OscPacket, OscType};

pub const SURFACE_HELLO: &str = "/surface_hello";
pub const SURFACE_ACK: &str = "/surface_ack";
pub const SURFACE_LABELS: &str = "/surface_labels";
pub const SURFACE_CLICK: &str = "/surface_click";

pub fn create_surface_hello() -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: SURFACE_HELLO.to_string(),
        args: vec![],
    })
}

pub fn create_surface_click(label: &str) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: SURFACE_CLICK.to_string(),
        args: vec![OscType::String(label.to_string())],
    })
}

pub fn create_play_sample(index: i32, pack_name: &str, volume: f32) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: "/play_sample".to_string(),
        args: vec![
            OscType::String("pedal_mute_feedback".to_string()), // ext_id
            OscType::String(pack_name.to_string()),
            OscType::Int(index),
            OscType::String("".to_string()),
            OscType::Int(0),
            OscType::String("amp".to_string()),
            OscType::Float(volume),
        ],
    })
}
