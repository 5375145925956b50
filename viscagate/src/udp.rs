//! VISCA-over-IP camera links.
//!
//! One connected UDP socket per camera; a datagram is exactly one frame
//! in each direction. There is no keepalive in the protocol.

use crate::{controller::Inbound, Result};
use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
};
use tokio::{net::UdpSocket, sync::mpsc, task::JoinHandle};
use viscagate_protocol::MAX_FRAME_LENGTH;

/// Connects to a camera and spawns the task that feeds its replies into
/// the event loop.
pub(crate) async fn connect_camera(
    address: u8,
    target: SocketAddr,
    inbound: mpsc::Sender<Inbound>,
) -> Result<(Arc<UdpSocket>, JoinHandle<()>)> {
    let sock = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)).await?;
    sock.connect(target).await?;
    let sock = Arc::new(sock);

    let recv_sock = sock.clone();
    let task = tokio::task::spawn(async move {
        let mut buf = [0u8; MAX_FRAME_LENGTH];
        loop {
            match recv_sock.recv(&mut buf).await {
                Ok(len) => {
                    let frame = buf[..len].to_vec();
                    if inbound
                        .send(Inbound::IpCamera { address, frame })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Err(e) => {
                    warn!("camera {address} link closed: {e}");
                    return;
                }
            }
        }
    });

    Ok((sock, task))
}
