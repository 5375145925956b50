//! Power control.

use super::{camera_command, camera_inquiry, on_off};
use crate::{nibbles, Command, InquiryKind};

const POWER: u8 = 0x00;
const ID_WRITE: u8 = 0x22;
const AUTO_OFF: u8 = 0x40;

/// Powers the camera on or off (standby).
pub fn set(on: bool) -> Command {
    camera_command(&[POWER, on_off(on)])
}

/// Sets the idle timer, in minutes, after which the camera powers itself
/// off. Zero disables the timer.
pub fn auto_off(minutes: u16) -> Command {
    let mut body = vec![AUTO_OFF];
    body.extend_from_slice(&nibbles::encode_u16(minutes));
    camera_command(&body)
}

/// Writes the camera's stored identifier.
pub fn id_write(id: u16) -> Command {
    let mut body = vec![ID_WRITE];
    body.extend_from_slice(&nibbles::encode_u16(id));
    camera_command(&body)
}

pub fn inquiry() -> Command {
    camera_inquiry(&[POWER], InquiryKind::Power)
}

pub fn auto_off_inquiry() -> Command {
    camera_inquiry(&[AUTO_OFF], InquiryKind::AutoPowerOff)
}

pub fn id_inquiry() -> Command {
    camera_inquiry(&[ID_WRITE], InquiryKind::Id)
}
