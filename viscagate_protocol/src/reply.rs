//! Camera replies: ACK/COMPLETE/ERROR classification and the typed
//! decoders for inquiry completions.

use crate::{command::MessageKind, nibbles, Command, Error, Result};
use num_traits::FromPrimitive;
use thiserror::Error as ThisError;

/// An error code reported by a camera in an `0x6X` reply.
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum ReplyError {
    #[error("message syntax error")]
    Syntax = 0x02,
    #[error("command buffers are full")]
    BufferFull = 0x03,
    #[error("command cancelled")]
    Cancelled = 0x04,
    #[error("no command in that socket")]
    InvalidSocket = 0x05,
    #[error("command not executable")]
    NotExecutable = 0x41,
}

/// A classified camera reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub source: u8,
    pub socket: u8,
    pub detail: ReplyDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyDetail {
    /// The camera buffered a command into the socket.
    Ack,
    /// Execution finished; inquiry completions carry their answer bytes.
    Complete(Vec<u8>),
    /// Execution failed or was refused.
    Error(ReplyError),
}

impl Reply {
    pub fn from_command(command: &Command) -> Result<Self> {
        let detail = match command.kind {
            MessageKind::Ack => ReplyDetail::Ack,
            MessageKind::Complete => ReplyDetail::Complete(command.payload.clone()),
            MessageKind::Error => {
                let &code = command.payload.first().ok_or(Error::PayloadLength {
                    wanted: 1,
                    got: 0,
                })?;
                ReplyDetail::Error(
                    ReplyError::from_u8(code).ok_or(Error::UnknownErrorCode(code))?,
                )
            }
            _ => return Err(Error::NotAReply),
        };

        Ok(Self {
            source: command.source,
            socket: command.socket,
            detail,
        })
    }
}

/// Autofocus operating mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum AfMode {
    #[default]
    Normal = 0x00,
    Interval = 0x01,
    ZoomTrigger = 0x02,
}

/// Pan/tilt position, signed seconds-of-travel units per the camera.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanTiltPosition {
    pub pan: i16,
    pub tilt: i16,
}

impl PanTiltPosition {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        expect(payload, 8)?;
        Ok(Self {
            pan: nibbles::decode_i16(&payload[0..4])?,
            tilt: nibbles::decode_i16(&payload[4..8])?,
        })
    }
}

/// Maximum drive speeds the pan/tilter supports.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanTiltMaxSpeed {
    pub pan: u8,
    pub tilt: u8,
}

impl PanTiltMaxSpeed {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        expect(payload, 2)?;
        Ok(Self {
            pan: payload[0],
            tilt: payload[1],
        })
    }
}

/// Decoded pan/tilt status word.
///
/// ## Format
///
/// Four low-nibble bytes:
///
/// * nibble 0: limit flags — bit 0 left, bit 1 right, bit 2 up, bit 3 down
/// * nibble 1, bits 0–1: initialisation — 0 initialising, 1 ready, 2 failed
/// * nibble 2, bits 0–1: movement — 0 idle, 1 moving, 2 done, 3 failed
/// * nibble 3: unused
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanTiltStatus {
    pub initializing: bool,
    pub ready: bool,
    pub fail: bool,
    pub moving: bool,
    pub move_done: bool,
    pub move_fail: bool,
    pub at_max_left: bool,
    pub at_max_right: bool,
    pub at_max_up: bool,
    pub at_max_down: bool,
}

impl PanTiltStatus {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        expect(payload, 4)?;
        let limits = payload[0] & 0x0f;
        let init = payload[1] & 0x03;
        let movement = payload[2] & 0x03;
        Ok(Self {
            initializing: init == 0,
            ready: init == 1,
            fail: init == 2,
            moving: movement == 1,
            move_done: movement == 2,
            move_fail: movement == 3,
            at_max_left: limits & 0x01 != 0,
            at_max_right: limits & 0x02 != 0,
            at_max_up: limits & 0x04 != 0,
            at_max_down: limits & 0x08 != 0,
        })
    }
}

/// The lens-system block inquiry answer.
///
/// ## Format
///
/// 13 bytes:
///
/// * bytes 0–3: zoom position (nibbles)
/// * bytes 4–5: focus near limit (nibbles)
/// * bytes 6–9: focus position (nibbles)
/// * byte 10: unused
/// * byte 11 (`WW`): bit 0 AF on, bit 1 digital zoom on, bit 2 AF
///   sensitivity low, bits 3–4 [AfMode]
/// * byte 12 (`VV`): bit 0 zooming, bit 1 focusing, bit 2 recalling a
///   preset, bit 3 low-contrast detection
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LensBlock {
    pub zoom: u16,
    pub focus_near_limit: u16,
    pub focus: u16,
    pub af_mode: AfMode,
    pub af_sensitivity_low: bool,
    pub digital_zoom_on: bool,
    pub af_on: bool,
    pub low_contrast: bool,
    pub loading_preset: bool,
    pub focusing: bool,
    pub zooming: bool,
}

impl LensBlock {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        expect(payload, 13)?;
        let ww = payload[11];
        let vv = payload[12];
        Ok(Self {
            zoom: nibbles::decode_u16(&payload[0..4])?,
            focus_near_limit: nibbles::decode_u16(&payload[4..6])?,
            focus: nibbles::decode_u16(&payload[6..10])?,
            af_mode: AfMode::from_u8((ww >> 3) & 0x03).unwrap_or_default(),
            af_sensitivity_low: ww & 0x04 != 0,
            digital_zoom_on: ww & 0x02 != 0,
            af_on: ww & 0x01 != 0,
            low_contrast: vv & 0x08 != 0,
            loading_preset: vv & 0x04 != 0,
            focusing: vv & 0x02 != 0,
            zooming: vv & 0x01 != 0,
        })
    }
}

/// The image/camera block inquiry answer.
///
/// ## Format
///
/// 13 bytes:
///
/// * bytes 0–1: red gain (nibbles)
/// * bytes 2–3: blue gain (nibbles)
/// * byte 4: white balance mode
/// * byte 5: aperture gain
/// * byte 6: exposure mode
/// * byte 7: feature flags — bit 0 slow-shutter auto, bit 1 exposure
///   compensation on, bit 2 backlight compensation on
/// * bytes 8–12: shutter, iris, gain, brightness, exposure compensation
///   positions
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageBlock {
    pub red_gain: u16,
    pub blue_gain: u16,
    pub white_balance: u8,
    pub aperture_gain: u8,
    pub exposure_mode: u8,
    pub slow_shutter_auto: bool,
    pub exposure_comp_on: bool,
    pub backlight_on: bool,
    pub shutter: u8,
    pub iris: u8,
    pub gain: u8,
    pub brightness: u8,
    pub exposure_comp: u8,
}

impl ImageBlock {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        expect(payload, 13)?;
        let flags = payload[7];
        Ok(Self {
            red_gain: nibbles::decode_u16(&payload[0..2])?,
            blue_gain: nibbles::decode_u16(&payload[2..4])?,
            white_balance: payload[4],
            aperture_gain: payload[5],
            exposure_mode: payload[6],
            slow_shutter_auto: flags & 0x01 != 0,
            exposure_comp_on: flags & 0x02 != 0,
            backlight_on: flags & 0x04 != 0,
            shutter: payload[8],
            iris: payload[9],
            gain: payload[10],
            brightness: payload[11],
            exposure_comp: payload[12],
        })
    }
}

/// A decoded inquiry answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyValue {
    /// Completion with no data (plain command completions).
    Done,
    Bool(bool),
    Byte(u8),
    Word(u16),
    Position(PanTiltPosition),
    MaxSpeed(PanTiltMaxSpeed),
    PanTiltStatus(PanTiltStatus),
    Lens(LensBlock),
    Image(ImageBlock),
    /// Camera-specific bytes, surfaced undecoded.
    Raw(Vec<u8>),
}

/// Identifies which inquiry a [Command] was built for, and decodes its
/// completion payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryKind {
    Power,
    AutoPowerOff,
    Zoom,
    DigitalZoom,
    Focus,
    FocusMode,
    FocusNearLimit,
    AfSensitivity,
    AfMode,
    AfInterval,
    IrCorrection,
    WhiteBalance,
    RedGain,
    BlueGain,
    ExposureMode,
    SlowShutter,
    Shutter,
    Iris,
    Gain,
    GainLimit,
    ExposureCompMode,
    ExposureComp,
    Backlight,
    Aperture,
    HighRes,
    HighSensitivity,
    NoiseReduction,
    Gamma,
    Effect,
    DigitalEffect,
    DigitalEffectLevel,
    Freeze,
    Icr,
    AutoIcr,
    IcrThreshold,
    ChromaSuppress,
    ColourGain,
    Hue,
    Id,
    LensBlock,
    ImageBlock,
    PanTiltPosition,
    PanTiltMaxSpeed,
    PanTiltStatus,
    VideoFormat,
}

impl InquiryKind {
    /// Decodes a completion payload for this inquiry.
    pub fn parse(&self, payload: &[u8]) -> Result<ReplyValue> {
        match self {
            Self::Power
            | Self::DigitalZoom
            | Self::FocusMode
            | Self::SlowShutter
            | Self::ExposureCompMode
            | Self::Backlight
            | Self::HighRes
            | Self::HighSensitivity
            | Self::Freeze
            | Self::Icr
            | Self::AutoIcr => on_off(payload).map(ReplyValue::Bool),

            Self::WhiteBalance
            | Self::ExposureMode
            | Self::GainLimit
            | Self::NoiseReduction
            | Self::Gamma
            | Self::Effect
            | Self::DigitalEffect
            | Self::ChromaSuppress
            | Self::AfMode
            | Self::AfSensitivity
            | Self::IrCorrection => single(payload).map(ReplyValue::Byte),

            Self::AutoPowerOff
            | Self::Zoom
            | Self::Focus
            | Self::FocusNearLimit
            | Self::AfInterval
            | Self::Shutter
            | Self::Iris
            | Self::Gain
            | Self::RedGain
            | Self::BlueGain
            | Self::ExposureComp
            | Self::Aperture
            | Self::IcrThreshold
            | Self::Id
            | Self::ColourGain
            | Self::Hue
            | Self::DigitalEffectLevel => word(payload).map(ReplyValue::Word),

            Self::LensBlock => LensBlock::parse(payload).map(ReplyValue::Lens),
            Self::ImageBlock => ImageBlock::parse(payload).map(ReplyValue::Image),
            Self::PanTiltPosition => PanTiltPosition::parse(payload).map(ReplyValue::Position),
            Self::PanTiltMaxSpeed => PanTiltMaxSpeed::parse(payload).map(ReplyValue::MaxSpeed),
            Self::PanTiltStatus => PanTiltStatus::parse(payload).map(ReplyValue::PanTiltStatus),
            Self::VideoFormat => Ok(ReplyValue::Raw(payload.to_vec())),
        }
    }
}

fn expect(payload: &[u8], wanted: usize) -> Result {
    if payload.len() == wanted {
        Ok(())
    } else {
        Err(Error::PayloadLength {
            wanted,
            got: payload.len(),
        })
    }
}

/// Decodes the common `0x02` on / `0x03` off answer byte. `0x04` is the
/// power-standby form of "off".
fn on_off(payload: &[u8]) -> Result<bool> {
    expect(payload, 1)?;
    match payload[0] {
        0x02 => Ok(true),
        0x03 | 0x04 => Ok(false),
        v => Err(Error::UnexpectedValue(v)),
    }
}

fn single(payload: &[u8]) -> Result<u8> {
    expect(payload, 1)?;
    Ok(payload[0])
}

/// Numeric answers come back as one raw byte, or as two or four
/// nibble-packed bytes, depending on the capability.
fn word(payload: &[u8]) -> Result<u16> {
    match payload.len() {
        1 => Ok(u16::from(payload[0])),
        _ => nibbles::decode_u16(payload),
    }
}
