//! Zoom control.

use super::{camera_command, camera_inquiry, on_off};
use crate::{nibbles, Command, InquiryKind};

const ZOOM: u8 = 0x07;
const DIGITAL_ZOOM: u8 = 0x06;
const ZOOM_DIRECT: u8 = 0x47;

/// Top of the optical zoom range.
pub const OPTICAL_LIMIT: u16 = 0x4000;
/// Top of the combined optical + digital range.
pub const DIGITAL_LIMIT: u16 = 0x7ac0;
/// Fastest variable zoom speed.
pub const SPEED_MAX: u8 = 7;

/// Stops any in-progress zoom movement.
pub fn stop() -> Command {
    camera_command(&[ZOOM, 0x00])
}

/// Zooms in at the standard speed.
pub fn tele() -> Command {
    camera_command(&[ZOOM, 0x02])
}

/// Zooms out at the standard speed.
pub fn wide() -> Command {
    camera_command(&[ZOOM, 0x03])
}

/// Zooms in at a variable speed, 0 (slow) to 7 (fast).
pub fn tele_speed(speed: u8) -> Command {
    camera_command(&[ZOOM, 0x20 | speed.min(SPEED_MAX)])
}

/// Zooms out at a variable speed, 0 (slow) to 7 (fast).
pub fn wide_speed(speed: u8) -> Command {
    camera_command(&[ZOOM, 0x30 | speed.min(SPEED_MAX)])
}

/// Moves the zoom to an absolute position.
///
/// The position is clamped to the optical range, or to the extended range
/// when the camera's digital zoom is enabled.
pub fn direct(position: u16, digital: bool) -> Command {
    let limit = if digital { DIGITAL_LIMIT } else { OPTICAL_LIMIT };
    let mut body = vec![ZOOM_DIRECT];
    body.extend_from_slice(&nibbles::encode_u16(position.min(limit)));
    camera_command(&body)
}

/// Moves zoom and focus to absolute positions in one motion.
pub fn with_focus(zoom: u16, focus: u16) -> Command {
    let mut body = vec![ZOOM_DIRECT];
    body.extend_from_slice(&nibbles::encode_u16(zoom.min(OPTICAL_LIMIT)));
    body.extend_from_slice(&nibbles::encode_u16(focus.min(super::focus::POSITION_LIMIT)));
    camera_command(&body)
}

/// Enables or disables digital zoom.
pub fn digital(on: bool) -> Command {
    camera_command(&[DIGITAL_ZOOM, on_off(on)])
}

pub fn inquiry() -> Command {
    camera_inquiry(&[ZOOM_DIRECT], InquiryKind::Zoom)
}

pub fn digital_inquiry() -> Command {
    camera_inquiry(&[DIGITAL_ZOOM], InquiryKind::DigitalZoom)
}
