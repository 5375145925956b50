//! UDP passthrough: one socket per serial camera.
//!
//! Clients send raw VISCA frames to `base_port + camera`; the gateway
//! re-addresses them onto the chain and mirrors the camera's replies to
//! whichever client owns the matching socket.

use crate::{controller::Inbound, Result};
use std::{
    collections::HashMap,
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
};
use tokio::{net::UdpSocket, sync::mpsc, task::JoinHandle};
use viscagate_protocol::MAX_FRAME_LENGTH;

pub(crate) struct Passthrough {
    sockets: HashMap<u8, Arc<UdpSocket>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Passthrough {
    /// Binds a socket per chain camera and spawns their receive tasks.
    pub async fn open(
        base_port: u16,
        camera_count: u8,
        inbound: mpsc::Sender<Inbound>,
    ) -> Result<Self> {
        let mut sockets = HashMap::new();
        let mut tasks = Vec::new();

        for index in 1..=camera_count {
            let port = base_port + u16::from(index);
            let sock =
                Arc::new(UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)).await?);
            info!("passthrough for camera {index} on udp/{port}");

            let recv_sock = sock.clone();
            let tx = inbound.clone();
            tasks.push(tokio::task::spawn(async move {
                let mut buf = [0u8; MAX_FRAME_LENGTH];
                loop {
                    match recv_sock.recv_from(&mut buf).await {
                        Ok((len, peer)) => {
                            let frame = buf[..len].to_vec();
                            if tx
                                .send(Inbound::Client { index, frame, peer })
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!("passthrough socket for camera {index} failed: {e}");
                            return;
                        }
                    }
                }
            }));
            sockets.insert(index, sock);
        }

        Ok(Self { sockets, tasks })
    }

    /// The reply socket for a camera index, shared with its [Camera]
    /// record for mirroring.
    ///
    /// [Camera]: crate::camera::Camera
    pub fn socket(&self, index: u8) -> Option<Arc<UdpSocket>> {
        self.sockets.get(&index).cloned()
    }

    pub fn close(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.sockets.clear();
    }
}

impl Drop for Passthrough {
    fn drop(&mut self) {
        self.close();
    }
}
