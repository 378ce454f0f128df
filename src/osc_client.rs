use std::error::Error;
use std::net::{SocketAddrV4, UdpSocket};

use rosc::encoder;
use rosc::OscPacket;

pub struct OscClient {
    socket: UdpSocket,
    target_addr: SocketAddrV4,
}

impl OscClient {
    pub fn new(socket: UdpSocket, target_addr: SocketAddrV4) -> OscClient {
        OscClient {
            socket,
            target_addr,
        }
    }

    pub fn try_send(&self, packet: &OscPacket) -> Result<(), Box<dyn Error>> {
        let msg_buf = encoder::encode(packet)?;
        self.socket.send_to(&msg_buf, self.target_addr)?;
        Ok(())
    }

    // UDP is fire-and-forget here: a lost packet is retried by whoever cares
    pub fn send(&self, packet: &OscPacket) {
        if let Err(err) = self.try_send(packet) {
            log::warn!("Failed to send OSC packet to {}: {}", self.target_addr, err);
        }
    }

    pub fn target(&self) -> SocketAddrV4 {
        self.target_addr
    }
}
