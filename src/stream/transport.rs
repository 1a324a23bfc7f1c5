use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not bind a local socket for {destination}")]
    Bind {
        destination: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Error sending datagram to {destination}")]
    Send {
        destination: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Datagram to {destination} truncated: {sent} of {len} bytes sent")]
    Truncated {
        destination: SocketAddr,
        sent: usize,
        len: usize,
    },
}

/// Fire-and-forget delivery of one encoded frame.
pub trait Transport {
    fn send(&mut self, payload: &[u8]) -> Result<(), Error>;
}

/// Sends every payload as a single UDP datagram to a fixed destination. The
/// socket is bound once and released on drop.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpTransport {
    pub fn new(destination: SocketAddr) -> Result<Self, Error> {
        let local: SocketAddr = match destination {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local).map_err(|source| Error::Bind {
            destination,
            source,
        })?;

        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, payload: &[u8]) -> Result<(), Error> {
        let sent = self
            .socket
            .send_to(payload, self.destination)
            .map_err(|source| Error::Send {
                destination: self.destination,
                source,
            })?;

        if sent != payload.len() {
            return Err(Error::Truncated {
                destination: self.destination,
                sent,
                len: payload.len(),
            });
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_udp_transport_delivers_one_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        let mut transport = UdpTransport::new(receiver.local_addr().unwrap()).unwrap();
        transport.send(b"1.00\t2.00\n").unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"1.00\t2.00\n");
    }
}
