//! The gateway core: the public [ViscaController] handle, and the
//! [ViscaReceiver] event loop that owns every transport and camera.

use crate::{
    camera::{Camera, FrameSink, PendingCommand},
    config::{CameraFlavor, Config},
    serial::SerialBus,
    server::Passthrough,
    state::{CameraStatus, StatusUpdate},
    udp, Error, Result,
};
use futures::{pin_mut, StreamExt};
use std::{collections::BTreeMap, net::SocketAddr, ops::ControlFlow};
use tokio::{
    select,
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{interval, Duration, Instant},
};
use tokio_stream::wrappers::IntervalStream;
use viscagate_protocol::{
    cmds::{
        colour, exposure, focus, image, init,
        pan_tilt::{self, PanDirection, TiltDirection},
        power, presets, zoom,
    },
    Command, MessageKind, PanTiltPosition, Reply, ReplyDetail, ReplyValue,
};

/// Internal type for asynchronous message passing.
enum AsyncCommand {
    /// Send a [Command] to one camera; the responder resolves with the
    /// terminal reply.
    Send {
        address: u8,
        command: Command,
        responder: Option<oneshot::Sender<Result<ReplyValue>>>,
    },
    /// Send a [Command] to every camera, untracked.
    Broadcast {
        command: Command,
        responder: oneshot::Sender<Result>,
    },
    /// Snapshot of one camera's last-known state.
    Status {
        address: u8,
        responder: oneshot::Sender<Result<CameraStatus>>,
    },
    /// Number of cameras in the table.
    Count { responder: oneshot::Sender<usize> },
    /// Drain everything and stop the event loop.
    Shutdown { responder: oneshot::Sender<()> },
}

/// Everything that can arrive at the event loop from a transport.
pub(crate) enum Inbound {
    /// A frame off the serial bus.
    Bus(Vec<u8>),
    /// A frame from a VISCA-over-IP camera's link.
    IpCamera { address: u8, frame: Vec<u8> },
    /// A datagram from a passthrough client.
    Client {
        index: u8,
        frame: Vec<u8>,
        peer: SocketAddr,
    },
    /// The serial bus died.
    BusClosed(std::io::Error),
}

/// [ViscaController] drives a serial camera chain (and any directly
/// linked IP cameras), keeps their socket bookkeeping honest, and
/// mirrors them to passthrough clients.
///
/// ## General design
///
/// All protocol state lives on one event loop task ([ViscaReceiver]);
/// this handle talks to it over a command channel, and each submission
/// resolves a `oneshot` with the command's single terminal outcome.
pub struct ViscaController {
    cmd_tx: mpsc::Sender<AsyncCommand>,
    updates_rx: broadcast::Receiver<(u8, StatusUpdate)>,
    recv_task: Option<JoinHandle<()>>,
}

impl ViscaController {
    /// Opens the configured transports, enumerates the serial chain, and
    /// starts the event loop.
    pub async fn start(config: Config) -> Result<Self> {
        let (mut receiver, cmd_tx) = ViscaReceiver::new(config);
        receiver.initialise().await?;
        let updates_rx = receiver.updates_tx.subscribe();

        debug!("spawning receiver task");
        let recv_task = tokio::task::spawn(receiver.run());

        Ok(Self {
            cmd_tx,
            updates_rx,
            recv_task: Some(recv_task),
        })
    }

    /// Sends a [Command] to the camera at `address` and waits for its
    /// terminal reply.
    pub async fn send(&self, address: u8, command: Command) -> Result<ReplyValue> {
        let (responder, resp_rx) = oneshot::channel();
        self.send_ex(AsyncCommand::Send {
            address,
            command,
            responder: Some(responder),
        })
        .await?;
        resp_rx.await.map_err(|_| Error::ChannelUnavailable)?
    }

    /// Broadcasts a [Command] to every camera. Broadcasts are never
    /// tracked; this resolves once the frame is written.
    pub async fn send_broadcast(&self, command: Command) -> Result {
        let (responder, resp_rx) = oneshot::channel();
        self.send_ex(AsyncCommand::Broadcast { command, responder })
            .await?;
        resp_rx.await.map_err(|_| Error::ChannelUnavailable)?
    }

    /// Last-known state snapshot for one camera.
    pub async fn camera_status(&self, address: u8) -> Result<CameraStatus> {
        let (responder, resp_rx) = oneshot::channel();
        self.send_ex(AsyncCommand::Status { address, responder })
            .await?;
        resp_rx.await.map_err(|_| Error::ChannelUnavailable)?
    }

    /// Number of cameras currently in the table.
    pub async fn camera_count(&self) -> Result<usize> {
        let (responder, resp_rx) = oneshot::channel();
        self.send_ex(AsyncCommand::Count { responder }).await?;
        resp_rx.await.map_err(|_| Error::ChannelUnavailable)
    }

    /// Subscribes to status-change events, `(camera address, what
    /// changed)`.
    pub fn status_events(&self) -> broadcast::Receiver<(u8, StatusUpdate)> {
        self.updates_rx.resubscribe()
    }

    /// Fails every pending command with [Error::Cancelled], closes all
    /// transports, and stops the event loop.
    pub async fn shutdown(mut self) -> Result {
        let (responder, resp_rx) = oneshot::channel();
        self.send_ex(AsyncCommand::Shutdown { responder }).await?;
        resp_rx.await.map_err(|_| Error::ChannelUnavailable)?;
        if let Some(task) = self.recv_task.take() {
            let _ = task.await;
        }
        Ok(())
    }

    /// Powers a camera on or off.
    pub async fn power(&self, address: u8, on: bool) -> Result {
        self.send(address, power::set(on)).await.map(|_| ())
    }

    /// Starts (or stops) continuous pan/tilt movement.
    pub async fn pan_tilt(
        &self,
        address: u8,
        pan_speed: u8,
        tilt_speed: u8,
        pan: PanDirection,
        tilt: TiltDirection,
    ) -> Result {
        self.send(address, pan_tilt::drive(pan_speed, tilt_speed, pan, tilt))
            .await
            .map(|_| ())
    }

    /// Stops movement on both pan/tilt axes.
    pub async fn pan_tilt_stop(&self, address: u8) -> Result {
        self.send(address, pan_tilt::stop()).await.map(|_| ())
    }

    /// Drives to an absolute pan/tilt position.
    pub async fn pan_tilt_to(
        &self,
        address: u8,
        pan_speed: u8,
        tilt_speed: u8,
        pan: i32,
        tilt: i32,
    ) -> Result {
        self.send(
            address,
            pan_tilt::direct(pan_speed, tilt_speed, pan, tilt),
        )
        .await
        .map(|_| ())
    }

    /// Returns the head to its home position.
    pub async fn home(&self, address: u8) -> Result {
        self.send(address, pan_tilt::home()).await.map(|_| ())
    }

    /// Moves the zoom to an absolute position, honouring the camera's
    /// digital zoom setting for the allowed range.
    pub async fn zoom_to(&self, address: u8, position: u16) -> Result {
        let digital = self.camera_status(address).await?.digital_zoom;
        self.send(address, zoom::direct(position, digital))
            .await
            .map(|_| ())
    }

    /// Switches a camera between autofocus and manual focus.
    pub async fn focus_auto(&self, address: u8, on: bool) -> Result {
        self.send(address, focus::auto(on)).await.map(|_| ())
    }

    /// Drives to a stored preset.
    pub async fn recall_preset(&self, address: u8, index: u8) -> Result {
        self.send(address, presets::recall(index)).await.map(|_| ())
    }

    /// Stores the current position as a preset.
    pub async fn store_preset(&self, address: u8, index: u8) -> Result {
        self.send(address, presets::set(index)).await.map(|_| ())
    }

    /// Reads a camera's current pan/tilt position.
    pub async fn position(&self, address: u8) -> Result<PanTiltPosition> {
        match self.send(address, pan_tilt::position_inquiry()).await? {
            ReplyValue::Position(position) => Ok(position),
            _ => Err(Error::UnexpectedReply),
        }
    }

    /// Broadcasts interface-clear: every camera drops its buffers and
    /// every pending command fails with [Error::Cancelled].
    pub async fn clear_interface(&self) -> Result {
        self.send_broadcast(init::IF_CLEAR.clone()).await
    }

    async fn send_ex(&self, command: AsyncCommand) -> Result {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| Error::ChannelUnavailable)
    }
}

/// Owns the transports and the camera table, and runs the event loop.
struct ViscaReceiver {
    config: Config,
    cmd_rx: mpsc::Receiver<AsyncCommand>,
    /// Cloned into every transport task; frames funnel into one channel.
    inbound_tx: mpsc::Sender<Inbound>,
    inbound_rx: mpsc::Receiver<Inbound>,
    bus: Option<SerialBus>,
    bus_sink: Option<FrameSink>,
    /// Cameras enumerated on the serial chain, addresses 1..=N.
    serial_count: u8,
    cameras: BTreeMap<u8, Camera>,
    passthrough: Option<Passthrough>,
    link_tasks: Vec<JoinHandle<()>>,
    updates_tx: broadcast::Sender<(u8, StatusUpdate)>,
    started: bool,
}

impl ViscaReceiver {
    /// How long bring-up waits for the chain to report its population.
    const INIT_TIMEOUT: Duration = Duration::from_secs(1);
    /// Queue pump / stale-command collection cadence.
    const PUMP_INTERVAL: Duration = Duration::from_millis(20);
    /// Depth of the command transmit buffer.
    const COMMAND_CHANNEL_SIZE: usize = 16;
    /// Depth of the merged transport frame buffer.
    const INBOUND_CHANNEL_SIZE: usize = 64;

    fn new(config: Config) -> (Self, mpsc::Sender<AsyncCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(Self::COMMAND_CHANNEL_SIZE);
        let (inbound_tx, inbound_rx) = mpsc::channel(Self::INBOUND_CHANNEL_SIZE);
        let (updates_tx, _) = broadcast::channel(16);
        (
            Self {
                config,
                cmd_rx,
                inbound_tx,
                inbound_rx,
                bus: None,
                bus_sink: None,
                serial_count: 0,
                cameras: BTreeMap::new(),
                passthrough: None,
                link_tasks: Vec::new(),
                updates_tx,
                started: false,
            },
            cmd_tx,
        )
    }

    /// Opens transports and enumerates the chain.
    async fn initialise(&mut self) -> Result {
        for cam in self.config.ip_cameras.clone() {
            let target = SocketAddr::new(cam.ip, cam.port);
            let (sock, task) =
                udp::connect_camera(cam.index, target, self.inbound_tx.clone()).await?;
            self.link_tasks.push(task);
            info!(
                "camera {} (\"{}\", {:?}) linked over {target}",
                cam.index, cam.name, cam.flavor
            );
            self.cameras.insert(
                cam.index,
                Camera::new(
                    cam.index,
                    cam.flavor,
                    FrameSink::Udp(sock),
                    self.updates_tx.clone(),
                ),
            );
            self.refresh(cam.index).await;
        }

        if let Some(serial) = self.config.serial.clone() {
            let bus = SerialBus::open(&serial.port, serial.baud, self.inbound_tx.clone())?;
            self.bus_sink = Some(FrameSink::Bus(bus.writer()));
            self.bus = Some(bus);

            self.enumerate().await?;
            debug!("waiting for the chain to enumerate");
            match tokio::time::timeout(Self::INIT_TIMEOUT, self.await_enumeration()).await {
                Ok(result) => result?,
                Err(_) => warn!(
                    "no address-set reply within {:?}; is the chain connected?",
                    Self::INIT_TIMEOUT
                ),
            }
        }

        self.started = true;
        Ok(())
    }

    /// Broadcasts address assignment down the chain.
    async fn enumerate(&mut self) -> Result {
        let Some(sink) = &self.bus_sink else {
            return Ok(());
        };
        sink.send(init::ADDRESS_SET.to_bytes()).await
    }

    /// Processes inbound traffic until the enumeration reply arrives.
    async fn await_enumeration(&mut self) -> Result {
        while let Some(inbound) = self.inbound_rx.recv().await {
            let done = matches!(
                &inbound,
                Inbound::Bus(frame) if Command::from_bytes(frame)
                    .is_ok_and(|c| c.kind == MessageKind::AddressSet)
            );
            if let Err(e) = self.handle_inbound(inbound).await {
                error!("frame handling failed during bring-up: {e}");
            }
            if done {
                return Ok(());
            }
        }
        Err(Error::Transport)
    }

    /// The main event loop: queued commands, transport frames, and the
    /// pump/collection tick.
    async fn run(mut self) {
        let tick = IntervalStream::new(interval(Self::PUMP_INTERVAL));
        pin_mut!(tick);

        loop {
            select! {
                command = self.cmd_rx.recv() => match command {
                    Some(command) => {
                        if self.handle_queued_command(command).await.is_break() {
                            info!("controller stopped");
                            return;
                        }
                    }
                    None => {
                        debug!("controller handle dropped");
                        self.shutdown_flush();
                        return;
                    }
                },

                Some(inbound) = self.inbound_rx.recv() => {
                    if let Err(e) = self.handle_inbound(inbound).await {
                        error!("frame handling failed: {e}");
                    }
                }

                Some(_) = tick.next() => {
                    let now = Instant::now();
                    for camera in self.cameras.values_mut() {
                        camera.tick(now).await;
                    }
                }
            }
        }
    }

    async fn handle_queued_command(&mut self, command: AsyncCommand) -> ControlFlow<()> {
        match command {
            AsyncCommand::Send {
                address,
                command,
                responder,
            } => {
                if !self.started {
                    if let Some(responder) = responder {
                        let _ = responder.send(Err(Error::NotStarted));
                    }
                    return ControlFlow::Continue(());
                }
                let Some(camera) = self.cameras.get_mut(&address) else {
                    if let Some(responder) = responder {
                        let _ = responder.send(Err(Error::UnknownCamera(address)));
                    }
                    return ControlFlow::Continue(());
                };
                camera
                    .submit(PendingCommand::new(command, responder, None))
                    .await;
            }

            AsyncCommand::Broadcast { command, responder } => {
                let result = self.broadcast(command).await;
                let _ = responder.send(result);
            }

            AsyncCommand::Status { address, responder } => {
                let result = self
                    .cameras
                    .get(&address)
                    .map(|camera| camera.status().clone())
                    .ok_or(Error::UnknownCamera(address));
                let _ = responder.send(result);
            }

            AsyncCommand::Count { responder } => {
                let _ = responder.send(self.cameras.len());
            }

            AsyncCommand::Shutdown { responder } => {
                self.shutdown_flush();
                let _ = responder.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn handle_inbound(&mut self, inbound: Inbound) -> Result {
        match inbound {
            Inbound::Bus(frame) => self.handle_frame(None, frame).await,
            Inbound::IpCamera { address, frame } => {
                self.handle_frame(Some(address), frame).await
            }
            Inbound::Client { index, frame, peer } => {
                self.handle_client_frame(index, frame, peer).await
            }
            Inbound::BusClosed(error) => {
                self.handle_bus_closed(error);
                Ok(())
            }
        }
    }

    /// Routes one frame from a camera. `via` pins the source for frames
    /// arriving on a per-camera IP link, where the header's address bits
    /// are not meaningful to our table.
    async fn handle_frame(&mut self, via: Option<u8>, frame: Vec<u8>) -> Result {
        let command = match Command::from_bytes(&frame) {
            Ok(command) => command,
            Err(e) => {
                warn!("dropping malformed frame {frame:02x?}: {e}");
                return Ok(());
            }
        };
        let source = via.unwrap_or(command.source);

        match command.kind {
            // A command frame coming back at us is the chain passing on
            // interface-clear: every camera just dropped its buffers.
            MessageKind::Command => {
                self.clear_all();
                Ok(())
            }

            MessageKind::NetChange => {
                info!("camera {source} reports a topology change");
                self.enumerate().await
            }

            MessageKind::AddressSet => self.handle_enumeration(command).await,

            MessageKind::Ack | MessageKind::Complete | MessageKind::Error => {
                let reply = match Reply::from_command(&command) {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!("dropping unusable reply from camera {source}: {e}");
                        return Ok(());
                    }
                };
                let Some(camera) = self.camera_entry(source) else {
                    return Ok(());
                };
                match reply.detail {
                    ReplyDetail::Ack => camera.on_ack(reply.socket, &frame).await,
                    ReplyDetail::Complete(payload) => {
                        camera.on_complete(reply.socket, &payload, &frame).await
                    }
                    ReplyDetail::Error(error) => {
                        camera.on_error(error, reply.socket, &frame).await
                    }
                }
                Ok(())
            }

            MessageKind::Inquiry | MessageKind::Cancel => {
                warn!("unexpected {:?} frame from camera {source}", command.kind);
                Ok(())
            }
        }
    }

    /// The chain's address-set reply: first payload byte is the camera
    /// population plus one. Rebuilds the serial side of the table.
    async fn handle_enumeration(&mut self, command: Command) -> Result {
        let Some(&next) = command.payload.first() else {
            warn!("address-set reply without a payload");
            return Ok(());
        };
        let count = next.saturating_sub(1).min(7);
        info!("serial chain reports {count} camera(s)");

        let stale: Vec<u8> = self
            .cameras
            .iter()
            .filter(|(_, camera)| camera.is_bus())
            .map(|(&address, _)| address)
            .collect();
        for address in stale {
            if let Some(mut camera) = self.cameras.remove(&address) {
                camera.flush(|| Error::Cancelled);
            }
        }
        self.serial_count = count;

        let Some(sink) = self.bus_sink.clone() else {
            return Ok(());
        };
        for address in 1..=count {
            if self.cameras.contains_key(&address) {
                warn!("serial camera {address} collides with a configured IP camera");
                continue;
            }
            self.cameras.insert(
                address,
                Camera::new(
                    address,
                    CameraFlavor::default(),
                    sink.clone(),
                    self.updates_tx.clone(),
                ),
            );
        }

        sink.send(init::IF_CLEAR.to_bytes()).await?;
        for address in 1..=count {
            self.refresh(address).await;
        }
        self.open_passthrough().await
    }

    /// A passthrough client's datagram: one raw frame, re-addressed onto
    /// the chain for the camera behind this port.
    async fn handle_client_frame(
        &mut self,
        index: u8,
        frame: Vec<u8>,
        peer: SocketAddr,
    ) -> Result {
        let command = match Command::from_bytes(&frame) {
            Ok(command) => command,
            Err(e) => {
                warn!("client {peer}: dropping malformed frame: {e}");
                return Ok(());
            }
        };
        let Some(camera) = self.cameras.get_mut(&index) else {
            warn!("client {peer}: no camera at index {index}");
            return Ok(());
        };
        camera
            .submit(PendingCommand::new(command, None, Some(peer)))
            .await;
        Ok(())
    }

    fn handle_bus_closed(&mut self, error: std::io::Error) {
        error!("serial bus lost: {error}");
        let stale: Vec<u8> = self
            .cameras
            .iter()
            .filter(|(_, camera)| camera.is_bus())
            .map(|(&address, _)| address)
            .collect();
        for address in stale {
            if let Some(mut camera) = self.cameras.remove(&address) {
                camera.flush(|| Error::Transport);
            }
        }
        if let Some(mut passthrough) = self.passthrough.take() {
            passthrough.close();
        }
        if let Some(bus) = self.bus.take() {
            bus.close();
        }
        self.bus_sink = None;
        self.serial_count = 0;
        self.started = false;
        warn!("gateway is stopped until restarted");
    }

    /// Looks up a camera, creating a record on the fly for replies from
    /// addresses the enumeration never mentioned.
    fn camera_entry(&mut self, address: u8) -> Option<&mut Camera> {
        if !self.cameras.contains_key(&address) {
            let sink = self.bus_sink.clone()?;
            info!("creating a record for unannounced camera {address}");
            self.cameras.insert(
                address,
                Camera::new(
                    address,
                    CameraFlavor::default(),
                    sink,
                    self.updates_tx.clone(),
                ),
            );
        }
        self.cameras.get_mut(&address)
    }

    /// Queues the full status-refresh suite for one camera.
    async fn refresh(&mut self, address: u8) {
        let Some(camera) = self.cameras.get_mut(&address) else {
            return;
        };
        for inquiry in inquiry_suite() {
            camera.submit(PendingCommand::new(inquiry, None, None)).await;
        }
    }

    async fn open_passthrough(&mut self) -> Result {
        if let Some(mut passthrough) = self.passthrough.take() {
            passthrough.close();
        }
        let Some(server) = self.config.server.clone() else {
            return Ok(());
        };
        if self.serial_count == 0 {
            return Ok(());
        }

        let passthrough =
            Passthrough::open(server.base_port, self.serial_count, self.inbound_tx.clone())
                .await?;
        for (&address, camera) in self.cameras.iter_mut() {
            if !camera.is_bus() {
                continue;
            }
            if let Some(socket) = passthrough.socket(address) {
                camera.set_passthrough(socket);
            }
        }
        self.passthrough = Some(passthrough);
        Ok(())
    }

    /// Writes a broadcast frame on every transport.
    async fn broadcast(&mut self, command: Command) -> Result {
        let frame = command.broadcast().to_bytes();
        let mut delivered = false;
        if let Some(sink) = &self.bus_sink {
            sink.send(frame.clone()).await?;
            delivered = true;
        }
        for camera in self.cameras.values() {
            if !camera.is_bus() {
                camera.send_frame(frame.clone()).await?;
                delivered = true;
            }
        }
        if delivered {
            Ok(())
        } else {
            Err(Error::NotStarted)
        }
    }

    fn clear_all(&mut self) {
        info!("interface clear: cancelling everything in flight");
        for camera in self.cameras.values_mut() {
            camera.flush(|| Error::Cancelled);
        }
    }

    fn shutdown_flush(&mut self) {
        for camera in self.cameras.values_mut() {
            camera.flush(|| Error::Cancelled);
        }
        self.cameras.clear();
        if let Some(mut passthrough) = self.passthrough.take() {
            passthrough.close();
        }
        if let Some(bus) = self.bus.take() {
            bus.close();
        }
        self.bus_sink = None;
        for task in self.link_tasks.drain(..) {
            task.abort();
        }
        self.started = false;
    }
}

/// The refresh suite queued after bring-up and topology changes.
fn inquiry_suite() -> Vec<Command> {
    vec![
        power::inquiry(),
        zoom::inquiry(),
        zoom::digital_inquiry(),
        focus::position_inquiry(),
        focus::mode_inquiry(),
        colour::white_balance_inquiry(),
        exposure::mode_inquiry(),
        image::effect_inquiry(),
        image::digital_effect_inquiry(),
        image::lens_block_inquiry(),
        image::image_block_inquiry(),
        pan_tilt::position_inquiry(),
        pan_tilt::status_inquiry(),
        init::video_format_inquiry(),
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use viscagate_protocol::ReplyError;

    fn test_receiver() -> (ViscaReceiver, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (mut receiver, cmd_tx) = ViscaReceiver::new(Config::default());
        // The loop is driven by hand in these tests.
        drop(cmd_tx);
        let (bus_tx, bus_rx) = mpsc::unbounded_channel();
        receiver.bus_sink = Some(FrameSink::Bus(bus_tx));
        receiver.started = true;
        (receiver, bus_rx)
    }

    fn drain(wire: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while let Ok(frame) = wire.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn enumeration_builds_the_camera_table() -> Result {
        let (mut receiver, mut wire) = test_receiver();
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("883004ff")?))
            .await?;

        assert_eq!(3, receiver.serial_count);
        assert_eq!(
            vec![1, 2, 3],
            receiver.cameras.keys().copied().collect::<Vec<_>>()
        );

        let frames = drain(&mut wire);
        // Interface-clear goes out first, then the inquiry suites.
        assert_eq!(hex::decode("88010001ff")?, frames[0]);
        assert!(frames.len() > 1);
        Ok(())
    }

    #[tokio::test]
    async fn routes_replies_through_to_the_submitter() -> Result {
        let (mut receiver, mut wire) = test_receiver();
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("883002ff")?))
            .await?;
        drain(&mut wire);

        let (responder, mut resp) = oneshot::channel();
        let _ = receiver
            .handle_queued_command(AsyncCommand::Send {
                address: 1,
                command: zoom::direct(0x1234, false),
                responder: Some(responder),
            })
            .await;
        assert_eq!(
            hex::decode("8101044701020304ff")?,
            wire.try_recv().expect("command frame")
        );

        receiver
            .handle_inbound(Inbound::Bus(hex::decode("9041ff")?))
            .await?;
        assert!(resp.try_recv().is_err());

        receiver
            .handle_inbound(Inbound::Bus(hex::decode("9051ff")?))
            .await?;
        assert!(matches!(resp.try_recv(), Ok(Ok(ReplyValue::Done))));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_address_fails_fast() {
        let (mut receiver, _wire) = test_receiver();
        let (responder, mut resp) = oneshot::channel();
        let _ = receiver
            .handle_queued_command(AsyncCommand::Send {
                address: 5,
                command: zoom::tele(),
                responder: Some(responder),
            })
            .await;
        assert!(matches!(
            resp.try_recv(),
            Ok(Err(Error::UnknownCamera(5)))
        ));
    }

    #[tokio::test]
    async fn unannounced_sources_get_a_record() -> Result {
        let (mut receiver, _wire) = test_receiver();
        assert!(receiver.cameras.is_empty());

        // An ACK from a camera the enumeration never mentioned.
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("a041ff")?))
            .await?;
        assert!(receiver.cameras.contains_key(&2));
        Ok(())
    }

    #[tokio::test]
    async fn client_frames_are_readdressed() -> Result {
        let (mut receiver, mut wire) = test_receiver();
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("883003ff")?))
            .await?;
        drain(&mut wire);

        let peer: SocketAddr = "127.0.0.1:4000".parse().expect("addr");
        // The client addressed camera 1, but this is camera 2's port.
        receiver
            .handle_inbound(Inbound::Client {
                index: 2,
                frame: hex::decode("8101040002ff")?,
                peer,
            })
            .await?;
        assert_eq!(
            hex::decode("8201040002ff")?,
            wire.try_recv().expect("rewritten frame")
        );
        Ok(())
    }

    #[tokio::test]
    async fn interface_clear_echo_cancels_in_flight() -> Result {
        let (mut receiver, mut wire) = test_receiver();
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("883002ff")?))
            .await?;
        drain(&mut wire);

        let (responder, mut resp) = oneshot::channel();
        let _ = receiver
            .handle_queued_command(AsyncCommand::Send {
                address: 1,
                command: zoom::tele(),
                responder: Some(responder),
            })
            .await;

        // The chain passes the broadcast interface-clear back up.
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("88010001ff")?))
            .await?;
        assert!(matches!(resp.try_recv(), Ok(Err(Error::Cancelled))));
        Ok(())
    }

    #[tokio::test]
    async fn bus_loss_fails_pending_with_transport() -> Result {
        let (mut receiver, mut wire) = test_receiver();
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("883002ff")?))
            .await?;
        drain(&mut wire);

        let (responder, mut resp) = oneshot::channel();
        let _ = receiver
            .handle_queued_command(AsyncCommand::Send {
                address: 1,
                command: zoom::tele(),
                responder: Some(responder),
            })
            .await;

        receiver
            .handle_inbound(Inbound::BusClosed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "unplugged",
            )))
            .await?;
        assert!(matches!(resp.try_recv(), Ok(Err(Error::Transport))));
        assert!(receiver.cameras.is_empty());
        assert!(!receiver.started);
        Ok(())
    }

    #[tokio::test]
    async fn camera_errors_reach_the_submitter() -> Result {
        let (mut receiver, mut wire) = test_receiver();
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("883002ff")?))
            .await?;
        drain(&mut wire);

        let (responder, mut resp) = oneshot::channel();
        let _ = receiver
            .handle_queued_command(AsyncCommand::Send {
                address: 1,
                command: presets::recall(130),
                responder: Some(responder),
            })
            .await;
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("9041ff")?))
            .await?;
        receiver
            .handle_inbound(Inbound::Bus(hex::decode("906141ff")?))
            .await?;
        assert!(matches!(
            resp.try_recv(),
            Ok(Err(Error::Camera(ReplyError::NotExecutable)))
        ));
        Ok(())
    }
}
