//! Pan/tilt drive, absolute positioning, and travel limits.

use super::{pan_tilt_command, pan_tilt_inquiry};
use crate::{nibbles, Command, InquiryKind};

const DRIVE: u8 = 0x01;
const ABSOLUTE: u8 = 0x02;
const RELATIVE: u8 = 0x03;
const HOME: u8 = 0x04;
const RESET: u8 = 0x05;
const LIMIT: u8 = 0x07;
const STATUS_INQ: u8 = 0x10;
const MAX_SPEED_INQ: u8 = 0x11;
const POSITION_INQ: u8 = 0x12;

/// Fastest pan drive speed.
pub const PAN_SPEED_MAX: u8 = 0x18;
/// Fastest tilt drive speed.
pub const TILT_SPEED_MAX: u8 = 0x17;

/// Pan axis movement for a drive command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PanDirection {
    Left = 0x01,
    Right = 0x02,
    Stop = 0x03,
}

/// Tilt axis movement for a drive command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TiltDirection {
    Up = 0x01,
    Down = 0x02,
    Stop = 0x03,
}

/// Which travel limit a limit command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LimitCorner {
    DownLeft = 0x00,
    UpRight = 0x01,
}

/// Starts (or stops) continuous pan/tilt movement.
///
/// Speeds are clamped to 1–0x18 (pan) and 1–0x17 (tilt).
pub fn drive(
    pan_speed: u8,
    tilt_speed: u8,
    pan: PanDirection,
    tilt: TiltDirection,
) -> Command {
    pan_tilt_command(&[
        DRIVE,
        pan_speed.clamp(1, PAN_SPEED_MAX),
        tilt_speed.clamp(1, TILT_SPEED_MAX),
        pan as u8,
        tilt as u8,
    ])
}

/// Stops movement on both axes.
pub fn stop() -> Command {
    drive(1, 1, PanDirection::Stop, TiltDirection::Stop)
}

/// Drives to an absolute pan/tilt position.
pub fn direct(pan_speed: u8, tilt_speed: u8, pan: i32, tilt: i32) -> Command {
    positioned(ABSOLUTE, pan_speed, tilt_speed, pan, tilt)
}

/// Drives to a position relative to the current one.
pub fn relative(pan_speed: u8, tilt_speed: u8, pan: i32, tilt: i32) -> Command {
    positioned(RELATIVE, pan_speed, tilt_speed, pan, tilt)
}

/// Returns the head to its home position.
pub fn home() -> Command {
    pan_tilt_command(&[HOME])
}

/// Power-cycles the pan/tilt motors and re-initialises travel.
pub fn reset() -> Command {
    pan_tilt_command(&[RESET])
}

/// Sets one corner of the allowed travel window.
pub fn limit_set(corner: LimitCorner, pan: i32, tilt: i32) -> Command {
    let mut body = vec![LIMIT, 0x00, corner as u8];
    body.extend_from_slice(&nibbles::encode_i16(pan));
    body.extend_from_slice(&nibbles::encode_i16(tilt));
    pan_tilt_command(&body)
}

/// Clears one corner of the travel window.
pub fn limit_clear(corner: LimitCorner) -> Command {
    pan_tilt_command(&[
        LIMIT,
        0x01,
        corner as u8,
        0x07,
        0x0f,
        0x0f,
        0x0f,
        0x07,
        0x0f,
        0x0f,
        0x0f,
    ])
}

pub fn position_inquiry() -> Command {
    pan_tilt_inquiry(&[POSITION_INQ], InquiryKind::PanTiltPosition)
}

pub fn max_speed_inquiry() -> Command {
    pan_tilt_inquiry(&[MAX_SPEED_INQ], InquiryKind::PanTiltMaxSpeed)
}

pub fn status_inquiry() -> Command {
    pan_tilt_inquiry(&[STATUS_INQ], InquiryKind::PanTiltStatus)
}

fn positioned(opcode: u8, pan_speed: u8, tilt_speed: u8, pan: i32, tilt: i32) -> Command {
    let mut body = vec![
        opcode,
        pan_speed.clamp(1, PAN_SPEED_MAX),
        tilt_speed.clamp(1, TILT_SPEED_MAX),
    ];
    body.extend_from_slice(&nibbles::encode_i16(pan));
    body.extend_from_slice(&nibbles::encode_i16(tilt));
    pan_tilt_command(&body)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn drive_frames() -> Result {
        assert_eq!(
            hex::decode("8101060112140103ff")?,
            drive(0x12, 0x14, PanDirection::Left, TiltDirection::Stop)
                .addressed_to(1)
                .to_bytes()
        );
        assert_eq!(
            hex::decode("8101060101010303ff")?,
            stop().addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn speeds_clamp() -> Result {
        assert_eq!(
            hex::decode("8101060118170202ff")?,
            drive(200, 200, PanDirection::Right, TiltDirection::Down)
                .addressed_to(1)
                .to_bytes()
        );
        assert_eq!(
            hex::decode("8101060101010101ff")?,
            drive(0, 0, PanDirection::Left, TiltDirection::Up)
                .addressed_to(1)
                .to_bytes()
        );
        Ok(())
    }

    #[test]
    fn absolute_position() -> Result {
        assert_eq!(
            hex::decode("820106020a0a0f0f090c00000c08ff")?,
            direct(10, 10, -100, 200).addressed_to(2).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn relative_position() -> Result {
        assert_eq!(
            hex::decode("810106030505000006040f0f0f0fff")?,
            relative(5, 5, 100, -1).addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn home_and_reset() -> Result {
        assert_eq!(hex::decode("81010604ff")?, home().addressed_to(1).to_bytes());
        assert_eq!(hex::decode("81010605ff")?, reset().addressed_to(1).to_bytes());
        Ok(())
    }

    #[test]
    fn limits() -> Result {
        assert_eq!(
            hex::decode("8101060700010100000000000100ff")?,
            limit_set(LimitCorner::UpRight, 0x1000, 0x0010)
                .addressed_to(1)
                .to_bytes()
        );
        assert_eq!(
            hex::decode("810106070100070f0f0f070f0f0fff")?,
            limit_clear(LimitCorner::DownLeft).addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn inquiries() -> Result {
        assert_eq!(hex::decode("81090612ff")?, position_inquiry().addressed_to(1).to_bytes());
        assert_eq!(hex::decode("81090611ff")?, max_speed_inquiry().addressed_to(1).to_bytes());
        assert_eq!(hex::decode("81090610ff")?, status_inquiry().addressed_to(1).to_bytes());
        Ok(())
    }
}
