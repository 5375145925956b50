//! The serial daisy-chain transport.
//!
//! `serialport` I/O is blocking, so the bus gets a pair of plain threads:
//! a reader that splits the byte stream into frames and feeds them to the
//! event loop, and a writer that drains a frame channel. All protocol
//! state stays on the event loop; these threads only move bytes.

use crate::{controller::Inbound, Result};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::{
    io::{ErrorKind, Read, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use tokio::sync::mpsc;
use viscagate_protocol::FrameSplitter;

/// Read timeout; doubles as the poll interval for the shutdown flag.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

pub(crate) struct SerialBus {
    writer_tx: mpsc::UnboundedSender<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
}

impl SerialBus {
    /// Opens the port at 8-N-1 and spawns the shuttle threads.
    pub fn open(path: &str, baud: u32, inbound: mpsc::Sender<Inbound>) -> Result<Self> {
        let mut reader = serialport::new(path, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;
        let mut writer = reader.try_clone()?;
        info!("opened serial bus {path} at {baud} baud");

        let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let writer_inbound = inbound.clone();
        thread::spawn(move || {
            while let Some(frame) = writer_rx.blocking_recv() {
                trace!("serial >>> {frame:02x?}");
                if let Err(e) = writer.write_all(&frame).and_then(|()| writer.flush()) {
                    error!("serial write failed: {e}");
                    let _ = writer_inbound.blocking_send(Inbound::BusClosed(e));
                    return;
                }
            }
        });

        let reader_shutdown = shutdown.clone();
        thread::spawn(move || {
            let mut splitter = FrameSplitter::new();
            let mut buf = [0u8; 64];
            while !reader_shutdown.load(Ordering::Relaxed) {
                match reader.read(&mut buf) {
                    Ok(0) => continue,
                    Ok(n) => {
                        for frame in splitter.push(&buf[..n]) {
                            trace!("serial <<< {frame:02x?}");
                            if inbound.blocking_send(Inbound::Bus(frame)).is_err() {
                                // Engine is gone; nothing left to do.
                                return;
                            }
                        }
                    }
                    Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                        continue
                    }
                    Err(e) => {
                        error!("serial read failed: {e}");
                        let _ = inbound.blocking_send(Inbound::BusClosed(e));
                        return;
                    }
                }
            }
        });

        Ok(Self {
            writer_tx,
            shutdown,
        })
    }

    /// A handle the cameras write their frames through.
    pub fn writer(&self) -> mpsc::UnboundedSender<Vec<u8>> {
        self.writer_tx.clone()
    }

    /// Stops both shuttle threads. The reader notices at its next
    /// timeout; the writer stops when the last writer handle drops.
    pub fn close(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for SerialBus {
    fn drop(&mut self) {
        self.close();
    }
}
