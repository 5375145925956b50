//! Exposure control: AE mode, shutter, iris, gain, compensation and
//! backlight.

use super::{camera_command, camera_inquiry, on_off, Adjust};
use crate::{nibbles, Command, InquiryKind};

const APERTURE_RED: u8 = 0x03;
const APERTURE_BLUE: u8 = 0x04;
const SHUTTER: u8 = 0x0a;
const IRIS: u8 = 0x0b;
const GAIN: u8 = 0x0c;
const EXPOSURE_COMP: u8 = 0x0e;
const GAIN_LIMIT: u8 = 0x2c;
const BACKLIGHT: u8 = 0x33;
const AE_MODE: u8 = 0x39;
const EXPOSURE_COMP_ENABLE: u8 = 0x3e;
const RED_GAIN_DIRECT: u8 = 0x43;
const BLUE_GAIN_DIRECT: u8 = 0x44;
const SHUTTER_DIRECT: u8 = 0x4a;
const IRIS_DIRECT: u8 = 0x4b;
const GAIN_DIRECT: u8 = 0x4c;
const EXPOSURE_COMP_DIRECT: u8 = 0x4e;
const SLOW_SHUTTER: u8 = 0x5a;

/// Automatic exposure operating mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExposureMode {
    #[default]
    Auto = 0x00,
    Manual = 0x03,
    ShutterPriority = 0x0a,
    IrisPriority = 0x0b,
    Bright = 0x0d,
}

pub fn mode(mode: ExposureMode) -> Command {
    camera_command(&[AE_MODE, mode as u8])
}

/// Lets the camera drop to slow shutter speeds in low light.
pub fn slow_shutter_auto(on: bool) -> Command {
    camera_command(&[SLOW_SHUTTER, on_off(on)])
}

pub fn shutter(adjust: Adjust) -> Command {
    camera_command(&[SHUTTER, adjust as u8])
}

pub fn shutter_direct(position: u8) -> Command {
    direct_u8(SHUTTER_DIRECT, position)
}

pub fn iris(adjust: Adjust) -> Command {
    camera_command(&[IRIS, adjust as u8])
}

pub fn iris_direct(position: u8) -> Command {
    direct_u8(IRIS_DIRECT, position)
}

pub fn gain(adjust: Adjust) -> Command {
    camera_command(&[GAIN, adjust as u8])
}

pub fn gain_direct(position: u8) -> Command {
    direct_u8(GAIN_DIRECT, position)
}

/// Caps automatic gain. Accepts 4–15 gain steps.
pub fn gain_limit(steps: u8) -> Command {
    camera_command(&[GAIN_LIMIT, steps.clamp(4, 15)])
}

pub fn red_gain(adjust: Adjust) -> Command {
    camera_command(&[APERTURE_RED, adjust as u8])
}

pub fn red_gain_direct(position: u8) -> Command {
    direct_u8(RED_GAIN_DIRECT, position)
}

pub fn blue_gain(adjust: Adjust) -> Command {
    camera_command(&[APERTURE_BLUE, adjust as u8])
}

pub fn blue_gain_direct(position: u8) -> Command {
    direct_u8(BLUE_GAIN_DIRECT, position)
}

/// Enables or disables exposure compensation.
pub fn comp_enable(on: bool) -> Command {
    camera_command(&[EXPOSURE_COMP_ENABLE, on_off(on)])
}

pub fn comp(adjust: Adjust) -> Command {
    camera_command(&[EXPOSURE_COMP, adjust as u8])
}

pub fn comp_direct(position: u8) -> Command {
    direct_u8(EXPOSURE_COMP_DIRECT, position)
}

pub fn backlight(on: bool) -> Command {
    camera_command(&[BACKLIGHT, on_off(on)])
}

pub fn mode_inquiry() -> Command {
    camera_inquiry(&[AE_MODE], InquiryKind::ExposureMode)
}

pub fn slow_shutter_inquiry() -> Command {
    camera_inquiry(&[SLOW_SHUTTER], InquiryKind::SlowShutter)
}

pub fn shutter_inquiry() -> Command {
    camera_inquiry(&[SHUTTER_DIRECT], InquiryKind::Shutter)
}

pub fn iris_inquiry() -> Command {
    camera_inquiry(&[IRIS_DIRECT], InquiryKind::Iris)
}

pub fn gain_inquiry() -> Command {
    camera_inquiry(&[GAIN_DIRECT], InquiryKind::Gain)
}

pub fn gain_limit_inquiry() -> Command {
    camera_inquiry(&[GAIN_LIMIT], InquiryKind::GainLimit)
}

pub fn red_gain_inquiry() -> Command {
    camera_inquiry(&[RED_GAIN_DIRECT], InquiryKind::RedGain)
}

pub fn blue_gain_inquiry() -> Command {
    camera_inquiry(&[BLUE_GAIN_DIRECT], InquiryKind::BlueGain)
}

pub fn comp_mode_inquiry() -> Command {
    camera_inquiry(&[EXPOSURE_COMP_ENABLE], InquiryKind::ExposureCompMode)
}

pub fn comp_inquiry() -> Command {
    camera_inquiry(&[EXPOSURE_COMP_DIRECT], InquiryKind::ExposureComp)
}

pub fn backlight_inquiry() -> Command {
    camera_inquiry(&[BACKLIGHT], InquiryKind::Backlight)
}

/// Direct set-point commands share a `00 00 0p 0q` layout.
fn direct_u8(opcode: u8, position: u8) -> Command {
    let mut body = vec![opcode, 0x00, 0x00];
    body.extend_from_slice(&nibbles::encode_u8(position));
    camera_command(&body)
}
