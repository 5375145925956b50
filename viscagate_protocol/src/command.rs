//! The VISCA message value object.

use crate::{
    frame::{Header, MIN_FRAME_LENGTH, TERMINATOR},
    reply::InquiryKind,
    Error, Result,
};
use num_traits::FromPrimitive;

/// Message type, the top nibble of the byte after the header.
///
/// `Command`, `Inquiry`, `AddressSet` and `NetChange` appear on the wire as
/// whole-byte values; the reply types and `Cancel` carry a socket index in
/// their bottom nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum MessageKind {
    Command = 0x01,
    Inquiry = 0x09,
    Cancel = 0x20,
    AddressSet = 0x30,
    NetChange = 0x38,
    Ack = 0x40,
    Complete = 0x50,
    Error = 0x60,
}

/// Message category, the first payload byte of commands and inquiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum DataType {
    Interface = 0x00,
    Camera = 0x04,
    PanTilt = 0x06,
    Operation = 0x07,
}

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every device on the bus (header `0x88`).
    Broadcast,
    /// A single device; the controller is address 0, cameras are 1–7.
    Camera(u8),
}

/// One VISCA message: a command, inquiry, bus-management frame, or a
/// camera's reply.
///
/// ## Frame format
///
/// * `u8`: [header byte][Header]
/// * `u8`: [message type][MessageKind] (whole byte or top nibble) | socket
///   index (bottom nibble)
/// * payload bytes; for commands and inquiries the first payload byte is
///   the [DataType]
/// * `0xFF` terminator
#[derive(Debug, Clone)]
pub struct Command {
    pub source: u8,
    pub recipient: Recipient,
    pub kind: MessageKind,
    /// Camera execution socket: 0 for fresh commands and inquiry
    /// completions, 1–2 once a camera has buffered a command.
    pub socket: u8,
    pub payload: Vec<u8>,
    /// The typed parser for this inquiry's completion. Local metadata, not
    /// a wire field; it does not take part in equality.
    pub inquiry: Option<InquiryKind>,
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.recipient == other.recipient
            && self.kind == other.kind
            && self.socket == other.socket
            && self.payload == other.payload
    }
}

impl Eq for Command {}

impl Command {
    /// A new command, unaddressed until [`addressed_to`][Self::addressed_to]
    /// or submission assigns a recipient.
    pub fn command(payload: Vec<u8>) -> Self {
        Self {
            source: 0,
            recipient: Recipient::Camera(0),
            kind: MessageKind::Command,
            socket: 0,
            payload,
            inquiry: None,
        }
    }

    /// A new inquiry, tagged with the parser for its completion.
    pub fn inquiry(payload: Vec<u8>, inquiry: InquiryKind) -> Self {
        Self {
            source: 0,
            recipient: Recipient::Camera(0),
            kind: MessageKind::Inquiry,
            socket: 0,
            payload,
            inquiry: Some(inquiry),
        }
    }

    /// Cancels whatever occupies the addressed camera's `socket`.
    ///
    /// The camera answers with a [Cancelled][crate::ReplyError::Cancelled]
    /// error on that socket.
    pub fn cancel(socket: u8) -> Self {
        Self {
            source: 0,
            recipient: Recipient::Camera(0),
            kind: MessageKind::Cancel,
            socket: socket & 0x0f,
            payload: Vec::new(),
            inquiry: None,
        }
    }

    pub fn addressed_to(mut self, address: u8) -> Self {
        self.recipient = Recipient::Camera(address & 0x07);
        self
    }

    pub fn broadcast(mut self) -> Self {
        self.source = 0;
        self.recipient = Recipient::Broadcast;
        self
    }

    /// The message category byte, where the payload carries one.
    pub fn data_type(&self) -> Option<DataType> {
        if self.payload.len() >= 2 {
            DataType::from_u8(self.payload[0])
        } else {
            None
        }
    }

    /// Serialises to a wire frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (broadcast, recipient) = match self.recipient {
            Recipient::Broadcast => (true, 0),
            Recipient::Camera(a) => (false, a & 0x07),
        };
        let header = Header::new()
            .with_marker(true)
            .with_source(self.source & 0x07)
            .with_broadcast(broadcast)
            .with_recipient(recipient);

        let mut out = Vec::with_capacity(MIN_FRAME_LENGTH + self.payload.len());
        out.push(header.to_byte());
        out.push(self.kind as u8 | self.socket);
        out.extend_from_slice(&self.payload);
        out.push(TERMINATOR);
        out
    }

    /// Parses a whole frame (terminator included).
    pub fn from_bytes(frame: &[u8]) -> Result<Self> {
        if frame.len() < MIN_FRAME_LENGTH || frame.last() != Some(&TERMINATOR) {
            return Err(Error::Truncated);
        }

        let header = Header::from_byte(frame[0]);
        if !header.marker() {
            return Err(Error::BadHeader(frame[0]));
        }

        let qq = frame[1];
        let (kind, socket) = match MessageKind::from_u8(qq) {
            // Whole-byte message types carry no socket index.
            Some(
                kind @ (MessageKind::Command
                | MessageKind::Inquiry
                | MessageKind::AddressSet
                | MessageKind::NetChange),
            ) => (kind, 0),
            _ => {
                let kind =
                    MessageKind::from_u8(qq & 0xf0).ok_or(Error::UnknownMessageType(qq))?;
                (kind, qq & 0x0f)
            }
        };

        let payload = &frame[2..frame.len() - 1];
        if payload.contains(&TERMINATOR) {
            return Err(Error::EmbeddedTerminator);
        }

        Ok(Self {
            source: header.source(),
            recipient: if header.broadcast() {
                Recipient::Broadcast
            } else {
                Recipient::Camera(header.recipient())
            },
            kind,
            socket,
            payload: payload.to_vec(),
            inquiry: None,
        })
    }
}
