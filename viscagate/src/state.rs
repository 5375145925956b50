//! Last-known camera state, refreshed from inquiry completions.

use viscagate_protocol::{InquiryKind, PanTiltStatus, ReplyValue};

bitflags! {
    /// Which parts of a [CameraStatus] an update touched.
    #[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
    pub struct StatusUpdate: u32 {
        const POWER              = 1;
        const PAN_TILT_POSITION  = 1 << 1;
        const ZOOM               = 1 << 2;
        const DIGITAL_ZOOM       = 1 << 3;
        const FOCUS              = 1 << 4;
        const FOCUS_MODE         = 1 << 5;
        const WHITE_BALANCE      = 1 << 6;
        const EXPOSURE_MODE      = 1 << 7;
        const EFFECT             = 1 << 8;
        const DIGITAL_EFFECT     = 1 << 9;
        const PAN_TILT_STATUS    = 1 << 10;
        const VIDEO_FORMAT       = 1 << 11;
    }
}

/// Snapshot of a camera's externally visible state. Fields hold whatever
/// the camera last answered; a fresh record is all defaults until the
/// inquiry suite has run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CameraStatus {
    pub power_on: bool,
    pub pan: i16,
    pub tilt: i16,
    pub zoom: u16,
    pub digital_zoom: bool,
    pub focus: u16,
    pub focus_auto: bool,
    pub white_balance: u8,
    pub exposure_mode: u8,
    pub effect: u8,
    pub digital_effect: u8,
    pub pan_tilt: PanTiltStatus,
    /// Raw video system code; semantics are camera-specific.
    pub video_format: Vec<u8>,
}

impl CameraStatus {
    /// Folds a decoded inquiry answer into the snapshot, returning which
    /// fields it touched.
    pub(crate) fn apply(&mut self, kind: InquiryKind, value: &ReplyValue) -> StatusUpdate {
        match (kind, value) {
            (InquiryKind::Power, ReplyValue::Bool(on)) => {
                self.power_on = *on;
                StatusUpdate::POWER
            }
            (InquiryKind::Zoom, ReplyValue::Word(v)) => {
                self.zoom = *v;
                StatusUpdate::ZOOM
            }
            (InquiryKind::DigitalZoom, ReplyValue::Bool(on)) => {
                self.digital_zoom = *on;
                StatusUpdate::DIGITAL_ZOOM
            }
            (InquiryKind::Focus, ReplyValue::Word(v)) => {
                self.focus = *v;
                StatusUpdate::FOCUS
            }
            (InquiryKind::FocusMode, ReplyValue::Bool(auto)) => {
                self.focus_auto = *auto;
                StatusUpdate::FOCUS_MODE
            }
            (InquiryKind::WhiteBalance, ReplyValue::Byte(v)) => {
                self.white_balance = *v;
                StatusUpdate::WHITE_BALANCE
            }
            (InquiryKind::ExposureMode, ReplyValue::Byte(v)) => {
                self.exposure_mode = *v;
                StatusUpdate::EXPOSURE_MODE
            }
            (InquiryKind::Effect, ReplyValue::Byte(v)) => {
                self.effect = *v;
                StatusUpdate::EFFECT
            }
            (InquiryKind::DigitalEffect, ReplyValue::Byte(v)) => {
                self.digital_effect = *v;
                StatusUpdate::DIGITAL_EFFECT
            }
            (InquiryKind::PanTiltPosition, ReplyValue::Position(p)) => {
                self.pan = p.pan;
                self.tilt = p.tilt;
                StatusUpdate::PAN_TILT_POSITION
            }
            (InquiryKind::PanTiltStatus, ReplyValue::PanTiltStatus(s)) => {
                self.pan_tilt = *s;
                StatusUpdate::PAN_TILT_STATUS
            }
            (InquiryKind::VideoFormat, ReplyValue::Raw(bytes)) => {
                self.video_format = bytes.clone();
                StatusUpdate::VIDEO_FORMAT
            }
            (InquiryKind::LensBlock, ReplyValue::Lens(lens)) => {
                self.zoom = lens.zoom;
                self.focus = lens.focus;
                self.digital_zoom = lens.digital_zoom_on;
                self.focus_auto = lens.af_on;
                StatusUpdate::ZOOM
                    | StatusUpdate::FOCUS
                    | StatusUpdate::DIGITAL_ZOOM
                    | StatusUpdate::FOCUS_MODE
            }
            (InquiryKind::ImageBlock, ReplyValue::Image(image)) => {
                self.white_balance = image.white_balance;
                self.exposure_mode = image.exposure_mode;
                StatusUpdate::WHITE_BALANCE | StatusUpdate::EXPOSURE_MODE
            }
            // Everything else is reported to the caller but not tracked.
            _ => StatusUpdate::empty(),
        }
    }
}
