//! Frame-level constants, the header byte, and the serial frame splitter.
//!
//! A VISCA frame is 3 to 16 bytes: one header byte, the message-type byte,
//! the payload, and the `0xFF` terminator. The terminator never appears
//! inside the body (payload words are nibble-packed, see
//! [`nibbles`][crate::nibbles]), so a byte stream can be split on it.

use modular_bitfield::{bitfield, specifiers::B3};

/// Every frame ends with this byte.
pub const TERMINATOR: u8 = 0xff;

/// Shortest legal frame: header, message type, terminator.
pub const MIN_FRAME_LENGTH: usize = 3;

/// Longest legal frame, terminator included.
pub const MAX_FRAME_LENGTH: usize = 16;

/// Header byte for broadcast frames (source 0, broadcast flag set).
pub const BROADCAST_HEADER: u8 = 0x88;

/// The VISCA header byte.
///
/// ## Format
///
/// Fields from LSB to MSB:
///
/// * `u3 0x07`: recipient address (0–7, the controller is 0)
/// * `bit 0x08`: broadcast flag
/// * `u3 0x70`: source address
/// * `bit 0x80`: marker, always set
#[bitfield]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Header {
    pub recipient: B3,
    pub broadcast: bool,
    pub source: B3,
    pub marker: bool,
}

impl Header {
    pub fn to_byte(self) -> u8 {
        self.into_bytes()[0]
    }

    pub fn from_byte(b: u8) -> Self {
        Self::from_bytes([b])
    }
}

/// Splits a raw byte stream into whole terminator-delimited frames.
///
/// Feed it whatever the serial line produced; it buffers partial frames
/// between reads and resynchronises after garbage.
#[derive(Default)]
pub struct FrameSplitter {
    buf: Vec<u8>,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes `bytes`, returning every complete frame they finished.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &b in bytes {
            self.buf.push(b);
            if b == TERMINATOR {
                let frame = std::mem::take(&mut self.buf);
                if frame.len() >= MIN_FRAME_LENGTH {
                    frames.push(frame);
                } else {
                    warn!("discarding {} byte fragment", frame.len());
                }
            } else if self.buf.len() >= MAX_FRAME_LENGTH {
                // Nothing this long can still be terminated legally.
                warn!("discarding {} bytes of unterminated data", self.buf.len());
                self.buf.clear();
            }
        }
        frames
    }
}
