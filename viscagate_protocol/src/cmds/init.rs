//! Bus management: address assignment, interface clear, cancellation,
//! and the video system inquiries.

use super::pan_tilt_inquiry;
use crate::{Command, DataType, InquiryKind, MessageKind, Recipient};
use lazy_static::lazy_static;

const VIDEO_FORMAT_NOW: u8 = 0x23;
const VIDEO_FORMAT_NEXT: u8 = 0x33;

lazy_static! {
    /// Broadcast address assignment. Each camera on the chain takes the
    /// payload value as its address, increments it, and forwards the
    /// frame; the frame that comes back carries the population + 1.
    pub static ref ADDRESS_SET: Command = Command {
        source: 0,
        recipient: Recipient::Broadcast,
        kind: MessageKind::AddressSet,
        socket: 0,
        payload: vec![0x01],
        inquiry: None,
    };

    /// Broadcast interface clear: every camera drops its command buffers.
    pub static ref IF_CLEAR: Command =
        Command::command(vec![DataType::Interface as u8, 0x01]).broadcast();
}

/// Cancels the command occupying `socket` on the addressed camera.
pub fn cancel(socket: u8) -> Command {
    Command::cancel(socket)
}

/// Current video system code. The answer bytes are camera-specific and
/// surfaced raw.
pub fn video_format_inquiry() -> Command {
    pan_tilt_inquiry(&[VIDEO_FORMAT_NOW], InquiryKind::VideoFormat)
}

/// Video system code that takes effect after the next power cycle.
pub fn video_format_next_inquiry() -> Command {
    pan_tilt_inquiry(&[VIDEO_FORMAT_NEXT], InquiryKind::VideoFormat)
}
