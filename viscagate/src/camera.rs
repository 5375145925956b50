//! Per-camera bookkeeping: the two-socket execution buffer, admission
//! queues, ACK/COMPLETE/ERROR correlation, and stale-command collection.

use crate::{
    config::CameraFlavor,
    state::{CameraStatus, StatusUpdate},
    Error, Result,
};
use std::{collections::VecDeque, net::SocketAddr, sync::Arc};
use tokio::{
    net::UdpSocket,
    sync::{broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};
use viscagate_protocol::{
    Command, DataType, InquiryKind, MessageKind, Recipient, ReplyError, ReplyValue,
};

/// Where a camera's frames get written.
#[derive(Clone)]
pub(crate) enum FrameSink {
    /// The shared serial bus writer.
    Bus(mpsc::UnboundedSender<Vec<u8>>),
    /// A connected VISCA-over-IP socket.
    Udp(Arc<UdpSocket>),
}

impl FrameSink {
    pub(crate) async fn send(&self, frame: Vec<u8>) -> Result {
        match self {
            FrameSink::Bus(tx) => tx.send(frame).map_err(|_| Error::Transport),
            FrameSink::Udp(sock) => {
                sock.send(&frame).await?;
                Ok(())
            }
        }
    }
}

/// A submitted command awaiting its terminal reply.
pub(crate) struct PendingCommand {
    pub command: Command,
    /// Resolved exactly once, with the decoded completion or the error.
    responder: Option<oneshot::Sender<Result<ReplyValue>>>,
    /// The passthrough client this command came from, if any. Camera
    /// replies are mirrored back to it.
    origin: Option<SocketAddr>,
    admitted_at: Instant,
}

impl PendingCommand {
    pub fn new(
        command: Command,
        responder: Option<oneshot::Sender<Result<ReplyValue>>>,
        origin: Option<SocketAddr>,
    ) -> Self {
        Self {
            command,
            responder,
            origin,
            admitted_at: Instant::now(),
        }
    }

    fn resolve(mut self, result: Result<ReplyValue>) {
        if let Some(responder) = self.responder.take() {
            if responder.send(result).is_err() {
                trace!("responder remote side gone");
            }
        }
    }

    fn expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.admitted_at) > ttl
    }
}

/// One camera on the chain (or on a direct IP link).
///
/// A VISCA camera holds at most two buffered commands, in sockets 1 and
/// 2 which it assigns in its ACK, plus one in-flight inquiry whose
/// completion comes back on socket 0. Everything beyond that waits in
/// admission queues here, in submission order.
pub(crate) struct Camera {
    address: u8,
    flavor: CameraFlavor,
    sink: FrameSink,
    passthrough: Option<Arc<UdpSocket>>,
    /// Socket 0 is the inquiry slot; 1 and 2 mirror the camera's command
    /// buffers.
    slots: [Option<PendingCommand>; 3],
    /// Commands on the wire whose ACK has not arrived. The camera ACKs
    /// in arrival order, so the head is always the next to bind.
    sent_awaiting_ack: VecDeque<PendingCommand>,
    cmd_queue: VecDeque<PendingCommand>,
    inq_queue: VecDeque<PendingCommand>,
    status: CameraStatus,
    updates: broadcast::Sender<(u8, StatusUpdate)>,
}

impl Camera {
    /// Commands unresolved this long are presumed lost and collected.
    const STALE_AFTER: Duration = Duration::from_secs(1);

    pub fn new(
        address: u8,
        flavor: CameraFlavor,
        sink: FrameSink,
        updates: broadcast::Sender<(u8, StatusUpdate)>,
    ) -> Self {
        Self {
            address,
            flavor,
            sink,
            passthrough: None,
            slots: [None, None, None],
            sent_awaiting_ack: VecDeque::new(),
            cmd_queue: VecDeque::new(),
            inq_queue: VecDeque::new(),
            status: CameraStatus::default(),
            updates,
        }
    }

    pub fn status(&self) -> &CameraStatus {
        &self.status
    }

    pub fn is_bus(&self) -> bool {
        matches!(self.sink, FrameSink::Bus(_))
    }

    pub fn set_passthrough(&mut self, socket: Arc<UdpSocket>) {
        self.passthrough = Some(socket);
    }

    /// Free command capacity: the camera's two buffers, minus what is
    /// occupied or already on the wire waiting for an ACK.
    fn command_capacity(&self) -> usize {
        let busy = usize::from(self.slots[1].is_some())
            + usize::from(self.slots[2].is_some())
            + self.sent_awaiting_ack.len();
        2usize.saturating_sub(busy)
    }

    fn inquiry_ready(&self) -> bool {
        self.slots[0].is_none()
    }

    /// Admits a command. The engine owns addressing: whatever the caller
    /// built, it goes out from the controller to this camera.
    pub async fn submit(&mut self, mut pending: PendingCommand) {
        pending.command.source = 0;
        pending.command.recipient = Recipient::Camera(self.address);

        match pending.command.kind {
            MessageKind::Inquiry => {
                if self.inquiry_ready() {
                    self.dispatch_inquiry(pending).await;
                } else {
                    self.inq_queue.push_back(pending);
                }
            }
            // Interface-class commands (interface-clear) never occupy a
            // socket; the camera answers them without an ACK.
            MessageKind::Command
                if pending.command.data_type() != Some(DataType::Interface) =>
            {
                if self.command_capacity() > 0 {
                    self.dispatch_command(pending).await;
                } else {
                    self.cmd_queue.push_back(pending);
                }
            }
            // Bus management frames bypass the socket machinery entirely.
            _ => match self.sink.send(pending.command.to_bytes()).await {
                Ok(()) => pending.resolve(Ok(ReplyValue::Done)),
                Err(e) => pending.resolve(Err(e)),
            },
        }
    }

    /// The camera buffered the oldest unbound command into `socket`.
    pub async fn on_ack(&mut self, socket: u8, frame: &[u8]) {
        if !(1..=2).contains(&socket) {
            warn!("camera {}: ACK names invalid socket {socket}", self.address);
            return;
        }

        let Some(pending) = self.sent_awaiting_ack.pop_front() else {
            warn!("camera {}: ACK with nothing awaiting one", self.address);
            return;
        };
        self.mirror(&pending, frame).await;

        if let Some(displaced) = self.slots[usize::from(socket)].replace(pending) {
            // Should only happen when a camera re-uses a socket we failed
            // to collect; the old occupant is dead either way.
            warn!("camera {}: socket {socket} was already occupied", self.address);
            displaced.resolve(Err(Error::Timeout));
        }
    }

    /// Execution finished on `socket`; socket 0 means an inquiry
    /// completion carrying data.
    pub async fn on_complete(&mut self, socket: u8, payload: &[u8], frame: &[u8]) {
        let Some(pending) = self
            .slots
            .get_mut(usize::from(socket))
            .and_then(Option::take)
        else {
            warn!(
                "camera {}: completion for empty socket {socket}",
                self.address
            );
            return;
        };
        self.mirror(&pending, frame).await;

        let result = match pending.command.inquiry {
            Some(kind) => match kind.parse(payload) {
                Ok(value) => {
                    if matches!(kind, InquiryKind::VideoFormat) {
                        // Left undecoded; what the code means depends on
                        // the camera family.
                        debug!(
                            "camera {} ({:?}) video system: {payload:02x?}",
                            self.address, self.flavor
                        );
                    }
                    let update = self.status.apply(kind, &value);
                    if !update.is_empty() {
                        // Nobody listening is fine.
                        let _ = self.updates.send((self.address, update));
                    }
                    Ok(value)
                }
                Err(e) => Err(e.into()),
            },
            None => Ok(ReplyValue::Done),
        };

        pending.resolve(result);
        self.pump().await;
    }

    /// The camera refused or aborted a command.
    ///
    /// Buffer-full and syntax errors come back on socket 0 with no slot
    /// to blame; they belong to the oldest command still waiting for its
    /// ACK, which is the one the camera could not buffer.
    pub async fn on_error(&mut self, error: ReplyError, socket: u8, frame: &[u8]) {
        let pending = if socket == 0
            && matches!(error, ReplyError::BufferFull | ReplyError::Syntax)
        {
            self.sent_awaiting_ack.pop_front()
        } else {
            self.slots
                .get_mut(usize::from(socket))
                .and_then(Option::take)
        };

        let Some(pending) = pending else {
            warn!(
                "camera {}: error \"{error}\" on socket {socket} matches no command",
                self.address
            );
            return;
        };

        self.mirror(&pending, frame).await;
        pending.resolve(Err(Error::Camera(error)));
        self.pump().await;
    }

    /// Collects stale commands, then refills the camera from the queues.
    pub async fn tick(&mut self, now: Instant) {
        self.collect_stale(now);
        self.pump().await;
    }

    /// Fails every tracked command. Used for interface-clear, transport
    /// loss and shutdown.
    pub fn flush(&mut self, mut error: impl FnMut() -> Error) {
        for slot in self.slots.iter_mut() {
            if let Some(pending) = slot.take() {
                pending.resolve(Err(error()));
            }
        }
        for pending in self.sent_awaiting_ack.drain(..) {
            pending.resolve(Err(error()));
        }
        for pending in self.cmd_queue.drain(..) {
            pending.resolve(Err(error()));
        }
        for pending in self.inq_queue.drain(..) {
            pending.resolve(Err(error()));
        }
    }

    /// Writes a frame for this camera without tracking it.
    pub async fn send_frame(&self, frame: Vec<u8>) -> Result {
        self.sink.send(frame).await
    }

    async fn dispatch_inquiry(&mut self, pending: PendingCommand) {
        match self.sink.send(pending.command.to_bytes()).await {
            Ok(()) => self.slots[0] = Some(pending),
            Err(e) => {
                warn!("camera {}: inquiry write failed", self.address);
                pending.resolve(Err(e));
            }
        }
    }

    async fn dispatch_command(&mut self, pending: PendingCommand) {
        match self.sink.send(pending.command.to_bytes()).await {
            Ok(()) => self.sent_awaiting_ack.push_back(pending),
            Err(e) => {
                warn!("camera {}: command write failed", self.address);
                pending.resolve(Err(e));
            }
        }
    }

    async fn pump(&mut self) {
        while self.inquiry_ready() {
            let Some(pending) = self.inq_queue.pop_front() else {
                break;
            };
            self.dispatch_inquiry(pending).await;
        }
        while self.command_capacity() > 0 {
            let Some(pending) = self.cmd_queue.pop_front() else {
                break;
            };
            self.dispatch_command(pending).await;
        }
    }

    fn collect_stale(&mut self, now: Instant) {
        for slot in self.slots.iter_mut() {
            if slot
                .as_ref()
                .is_some_and(|p| p.expired(now, Self::STALE_AFTER))
            {
                if let Some(pending) = slot.take() {
                    warn!("camera {}: collecting stale slot entry", self.address);
                    pending.resolve(Err(Error::Timeout));
                }
            }
        }
        Self::expire(&mut self.sent_awaiting_ack, now);
        Self::expire(&mut self.cmd_queue, now);
        Self::expire(&mut self.inq_queue, now);
    }

    /// Queues hold entries in admission order, so expiry only ever
    /// removes a prefix.
    fn expire(queue: &mut VecDeque<PendingCommand>, now: Instant) {
        while queue
            .front()
            .is_some_and(|p| p.expired(now, Self::STALE_AFTER))
        {
            if let Some(pending) = queue.pop_front() {
                pending.resolve(Err(Error::Timeout));
            }
        }
    }

    async fn mirror(&self, pending: &PendingCommand, frame: &[u8]) {
        let (Some(peer), Some(sock)) = (pending.origin, self.passthrough.as_ref()) else {
            return;
        };
        if let Err(e) = sock.send_to(frame, peer).await {
            trace!("passthrough reply to {peer} dropped: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;
    use viscagate_protocol::cmds::{init, power, zoom};

    fn test_camera() -> (Camera, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(16);
        (
            Camera::new(1, CameraFlavor::Ptz, FrameSink::Bus(tx), updates),
            rx,
        )
    }

    fn tracked(
        command: Command,
    ) -> (PendingCommand, oneshot::Receiver<Result<ReplyValue>>) {
        let (responder, rx) = oneshot::channel();
        (PendingCommand::new(command, Some(responder), None), rx)
    }

    #[tokio::test]
    async fn command_ack_complete_cycle() -> Result {
        let (mut camera, mut wire) = test_camera();
        let (pending, mut resp) = tracked(zoom::direct(0x1234, false));
        camera.submit(pending).await;

        // The frame went out addressed to this camera.
        assert_eq!(hex::decode("8101044701020304ff")?, wire.try_recv().expect("frame"));
        assert!(resp.try_recv().is_err());

        camera.on_ack(1, &hex::decode("9041ff")?).await;
        assert!(camera.slots[1].is_some());
        assert!(resp.try_recv().is_err());

        camera.on_complete(1, &[], &hex::decode("9051ff")?).await;
        assert!(camera.slots[1].is_none());
        assert!(matches!(resp.try_recv(), Ok(Ok(ReplyValue::Done))));
        Ok(())
    }

    #[tokio::test]
    async fn inquiry_occupies_slot_zero() -> Result {
        let (mut camera, mut wire) = test_camera();
        let (pending, mut resp) = tracked(power::inquiry());
        camera.submit(pending).await;

        assert_eq!(hex::decode("81090400ff")?, wire.try_recv().expect("frame"));
        assert!(camera.slots[0].is_some());

        camera
            .on_complete(0, &[0x02], &hex::decode("905002ff")?)
            .await;
        assert!(matches!(resp.try_recv(), Ok(Ok(ReplyValue::Bool(true)))));
        assert!(camera.status().power_on);
        Ok(())
    }

    #[tokio::test]
    async fn acks_bind_in_submission_order() -> Result {
        let (mut camera, mut wire) = test_camera();
        let commands = [
            zoom::direct(0x1000, false),
            zoom::direct(0x2000, false),
            zoom::direct(0x3000, false),
        ];
        let mut responders = Vec::new();
        for command in commands {
            let (pending, resp) = tracked(command);
            camera.submit(pending).await;
            responders.push(resp);
        }

        // Only two may be on the wire; the third waits its turn.
        assert_eq!(2, camera.sent_awaiting_ack.len());
        assert_eq!(1, camera.cmd_queue.len());
        assert_eq!(hex::decode("8101044701000000ff")?, wire.try_recv().expect("first"));
        assert_eq!(hex::decode("8101044702000000ff")?, wire.try_recv().expect("second"));
        assert!(wire.try_recv().is_err());

        // First ACK binds the first submission, not anything newer.
        camera.on_ack(2, &hex::decode("9042ff")?).await;
        assert_eq!(
            Some(&0x01u8),
            camera.slots[2].as_ref().and_then(|p| p.command.payload.get(2))
        );

        camera.on_ack(1, &hex::decode("9041ff")?).await;
        assert_eq!(
            Some(&0x02u8),
            camera.slots[1].as_ref().and_then(|p| p.command.payload.get(2))
        );

        // Completing a socket frees capacity and pumps the queue.
        camera.on_complete(2, &[], &hex::decode("9052ff")?).await;
        assert!(matches!(
            responders[0].try_recv(),
            Ok(Ok(ReplyValue::Done))
        ));
        assert_eq!(hex::decode("8101044703000000ff")?, wire.try_recv().expect("third"));
        Ok(())
    }

    #[tokio::test]
    async fn socket_occupancy_never_exceeds_two() {
        let (mut camera, _wire) = test_camera();
        for _ in 0..6 {
            camera
                .submit(PendingCommand::new(zoom::tele(), None, None))
                .await;
        }
        let in_flight = camera.sent_awaiting_ack.len()
            + usize::from(camera.slots[1].is_some())
            + usize::from(camera.slots[2].is_some());
        assert!(in_flight <= 2);
        assert_eq!(4, camera.cmd_queue.len());
    }

    #[tokio::test]
    async fn buffer_full_fails_oldest_unbound() -> Result {
        let (mut camera, mut wire) = test_camera();
        let mut responders = Vec::new();
        for position in [0x1000u16, 0x2000, 0x3000] {
            let (pending, resp) = tracked(zoom::direct(position, false));
            camera.submit(pending).await;
            responders.push(resp);
        }
        wire.try_recv().expect("first");
        wire.try_recv().expect("second");

        camera
            .on_error(ReplyError::BufferFull, 0, &hex::decode("906003ff")?)
            .await;

        match responders[0].try_recv() {
            Ok(Err(Error::Camera(ReplyError::BufferFull))) => {}
            other => panic!("expected buffer-full, got {other:?}"),
        }
        // The queued command took the freed capacity.
        assert_eq!(hex::decode("8101044703000000ff")?, wire.try_recv().expect("third"));
        Ok(())
    }

    #[tokio::test]
    async fn interface_clear_bypasses_the_sockets() -> Result {
        let (mut camera, mut wire) = test_camera();
        let (pending, mut resp) = tracked(init::IF_CLEAR.clone());
        camera.submit(pending).await;

        assert_eq!(hex::decode("81010001ff")?, wire.try_recv().expect("frame"));
        assert!(matches!(resp.try_recv(), Ok(Ok(ReplyValue::Done))));
        assert!(camera.sent_awaiting_ack.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn cancel_is_untracked_and_immediate() -> Result {
        let (mut camera, mut wire) = test_camera();
        let (pending, mut resp) = tracked(Command::cancel(1));
        camera.submit(pending).await;

        assert_eq!(hex::decode("8121ff")?, wire.try_recv().expect("frame"));
        assert!(matches!(resp.try_recv(), Ok(Ok(ReplyValue::Done))));

        // The camera's answer is the usual cancellation error on the slot.
        let (pending, mut resp) = tracked(zoom::tele());
        camera.submit(pending).await;
        camera.on_ack(1, &hex::decode("9041ff")?).await;
        camera
            .on_error(ReplyError::Cancelled, 1, &hex::decode("906104ff")?)
            .await;
        assert!(matches!(
            resp.try_recv(),
            Ok(Err(Error::Camera(ReplyError::Cancelled)))
        ));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stale_commands_time_out() -> Result {
        let (mut camera, mut wire) = test_camera();
        let (pending, mut resp) = tracked(zoom::tele());
        camera.submit(pending).await;
        wire.try_recv().expect("frame");

        // Young commands survive a tick.
        camera.tick(Instant::now()).await;
        assert!(resp.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(1100)).await;
        camera.tick(Instant::now()).await;
        match resp.try_recv() {
            Ok(Err(Error::Timeout)) => {}
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(camera.sent_awaiting_ack.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stale_slots_are_reclaimed() -> Result {
        let (mut camera, mut wire) = test_camera();
        let (pending, mut resp) = tracked(zoom::tele());
        camera.submit(pending).await;
        wire.try_recv().expect("frame");
        camera.on_ack(1, &hex::decode("9041ff")?).await;
        assert!(camera.slots[1].is_some());

        tokio::time::advance(Duration::from_millis(1100)).await;
        camera.tick(Instant::now()).await;
        assert!(camera.slots[1].is_none());
        assert!(matches!(resp.try_recv(), Ok(Err(Error::Timeout))));
        Ok(())
    }

    #[tokio::test]
    async fn flush_fails_everything_once() {
        let (mut camera, _wire) = test_camera();
        let mut responders = Vec::new();
        for _ in 0..4 {
            let (pending, resp) = tracked(zoom::tele());
            camera.submit(pending).await;
            responders.push(resp);
        }
        let (pending, resp) = tracked(power::inquiry());
        camera.submit(pending).await;
        responders.push(resp);

        camera.flush(|| Error::Cancelled);
        for mut resp in responders {
            assert!(matches!(resp.try_recv(), Ok(Err(Error::Cancelled))));
        }
        assert!(camera.cmd_queue.is_empty() && camera.inq_queue.is_empty());
    }

    #[tokio::test]
    async fn unknown_socket_replies_are_discarded() -> Result {
        let (mut camera, mut wire) = test_camera();
        let (pending, mut resp) = tracked(zoom::tele());
        camera.submit(pending).await;
        wire.try_recv().expect("frame");

        // Completion for a socket nothing occupies: logged and dropped.
        camera.on_complete(2, &[], &hex::decode("9052ff")?).await;
        camera.on_ack(7, &hex::decode("9047ff")?).await;
        assert!(resp.try_recv().is_err());
        assert_eq!(1, camera.sent_awaiting_ack.len());
        Ok(())
    }
}
