use rosc::{OscMessage, OscPacket, OscType};
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::{debug, info, trace, warn};

/// A single transmitted value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SignalValue {
    Float(f32),
    Int(i32),
}

impl SignalValue {
    pub fn is_neutral(&self) -> bool {
        match self {
            SignalValue::Float(v) => *v == 0.0,
            SignalValue::Int(v) => *v == 0,
        }
    }
}

impl From<SignalValue> for OscType {
    fn from(value: SignalValue) -> Self {
        match value {
            SignalValue::Float(v) => OscType::Float(v),
            SignalValue::Int(v) => OscType::Int(v),
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Float(v) => write!(f, "{:.4}", v),
            SignalValue::Int(v) => write!(f, "{}", v),
        }
    }
}

/// Fire-and-forget address/value sender
///
/// Neither method reports failure; a consumer that is not listening is a
/// normal condition.
pub trait Transmitter {
    /// Points subsequent sends at `host:port`
    fn set_destination(&mut self, host: &str, port: u16);

    fn send(&mut self, address: &str, value: SignalValue);
}

struct Destination {
    socket: UdpSocket,
    target: SocketAddr,
}

/// OSC over UDP
///
/// The socket is bound to an ephemeral local port matching the address family
/// of the resolved target. If the target cannot be resolved sends are dropped
/// until the next successful [`set_destination`](Transmitter::set_destination).
#[derive(Default)]
pub struct OscTransmitter {
    destination: Option<Destination>,
}

impl OscTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<SocketAddr> {
        self.destination.as_ref().map(|d| d.target)
    }

    fn open(host: &str, port: u16) -> std::io::Result<Destination> {
        let target = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} did not resolve to any address", host),
            )
        })?;
        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_nonblocking(true)?;
        Ok(Destination { socket, target })
    }
}

impl Transmitter for OscTransmitter {
    fn set_destination(&mut self, host: &str, port: u16) {
        match Self::open(host, port) {
            Ok(destination) => {
                info!("Sending OSC to {}", destination.target);
                self.destination = Some(destination);
            }
            Err(e) => {
                warn!("Cannot reach OSC target {}:{}: {}", host, port, e);
                self.destination = None;
            }
        }
    }

    fn send(&mut self, address: &str, value: SignalValue) {
        let Some(destination) = &self.destination else {
            trace!("No OSC destination, dropping {} {}", address, value);
            return;
        };

        let packet = OscPacket::Message(OscMessage {
            addr: address.to_string(),
            args: vec![value.into()],
        });
        let bytes = match rosc::encoder::encode(&packet) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Failed to encode OSC message for {}: {}", address, e);
                return;
            }
        };

        if let Err(e) = destination.socket.send_to(&bytes, destination.target) {
            trace!("OSC send to {} failed: {}", address, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sends_decodable_messages() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mut tx = OscTransmitter::new();
        tx.set_destination("127.0.0.1", port);
        assert_eq!(tx.target().map(|t| t.port()), Some(port));

        tx.send("/input/Horizontal", SignalValue::Float(0.5));
        tx.send("/input/Jump", SignalValue::Int(1));

        let mut buf = [0u8; rosc::decoder::MTU];
        let mut received = Vec::new();
        for _ in 0..2 {
            let (len, _) = receiver.recv_from(&mut buf).unwrap();
            let (_, packet) = rosc::decoder::decode_udp(&buf[..len]).unwrap();
            match packet {
                OscPacket::Message(msg) => received.push((msg.addr, msg.args)),
                OscPacket::Bundle(_) => panic!("unexpected bundle"),
            }
        }

        assert_eq!(
            received,
            vec![
                ("/input/Horizontal".to_string(), vec![OscType::Float(0.5)]),
                ("/input/Jump".to_string(), vec![OscType::Int(1)]),
            ]
        );
    }

    #[test]
    fn unresolvable_target_drops_silently() {
        let mut tx = OscTransmitter::new();
        tx.set_destination("", 9000);
        assert!(tx.target().is_none());
        tx.send("/input/Jump", SignalValue::Int(1));
    }

    #[test]
    fn neutral_detection() {
        assert!(SignalValue::Float(0.0).is_neutral());
        assert!(SignalValue::Int(0).is_neutral());
        assert!(!SignalValue::Float(-0.1).is_neutral());
        assert!(!SignalValue::Int(1).is_neutral());
    }
}
