//! VESC serial framing.
//!
//! Short frame layout (payloads up to 255 bytes):
//!
//! | Byte | Content |
//! |------|---------|
//! | 0 | `0x02` start |
//! | 1 | payload length |
//! | 2.. | payload (command id + big-endian fields) |
//! | n-3, n-2 | CRC-16/XMODEM of the payload, big-endian |
//! | n-1 | `0x03` stop |
//!
//! Frames are built into a fixed-capacity buffer; this controller only
//! ever sends small command payloads.

use crc::{Crc, CRC_16_XMODEM};
use heapless::Vec;
use rover_common::hal::types::MotorCommand;
use thiserror::Error;

/// Start byte of a short frame.
pub const START_SHORT: u8 = 0x02;

/// Frame terminator.
pub const STOP_BYTE: u8 = 0x03;

/// `COMM_SET_DUTY` command id.
pub const COMM_SET_DUTY: u8 = 5;

/// Duty cycle fixed-point scale on the wire.
pub const DUTY_SCALE: f64 = 100_000.0;

/// Capacity of an encoded frame.
pub const MAX_FRAME_LEN: usize = 32;

/// Bytes added around the payload (start, length, crc×2, stop).
const FRAME_OVERHEAD: usize = 5;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// An encoded frame.
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Framing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Payload does not fit into a frame.
    #[error("Payload of {0} bytes exceeds frame capacity")]
    PayloadTooLong(usize),

    /// Frame is shorter than the framing overhead or its length byte lies.
    #[error("Malformed frame: {0}")]
    Malformed(&'static str),

    /// CRC does not match the payload.
    #[error("CRC mismatch: expected {expected:#06x}, got {actual:#06x}")]
    CrcMismatch {
        /// CRC computed over the payload.
        expected: u16,
        /// CRC carried by the frame.
        actual: u16,
    },
}

/// CRC-16/XMODEM of `payload`.
pub fn crc16(payload: &[u8]) -> u16 {
    CRC16.checksum(payload)
}

/// Wrap `payload` into a short frame.
pub fn encode_frame(payload: &[u8]) -> Result<Frame, CodecError> {
    if payload.len() + FRAME_OVERHEAD > MAX_FRAME_LEN {
        return Err(CodecError::PayloadTooLong(payload.len()));
    }

    let crc = crc16(payload);
    let mut frame = Frame::new();
    let too_long = |_| CodecError::PayloadTooLong(payload.len());
    frame.push(START_SHORT).map_err(too_long)?;
    frame.push(payload.len() as u8).map_err(too_long)?;
    frame
        .extend_from_slice(payload)
        .map_err(|_| CodecError::PayloadTooLong(payload.len()))?;
    frame
        .extend_from_slice(&crc.to_be_bytes())
        .map_err(|_| CodecError::PayloadTooLong(payload.len()))?;
    frame.push(STOP_BYTE).map_err(too_long)?;
    Ok(frame)
}

/// Encode a `SetDutyCycle` frame. `duty` is clamped to [-1.0, 1.0].
pub fn encode_set_duty(duty: f64) -> Result<Frame, CodecError> {
    let duty = if duty.is_nan() { 0.0 } else { duty.clamp(-1.0, 1.0) };
    let scaled = (duty * DUTY_SCALE) as i32;

    let mut payload = [0u8; 5];
    payload[0] = COMM_SET_DUTY;
    payload[1..].copy_from_slice(&scaled.to_be_bytes());
    encode_frame(&payload)
}

/// Encode a motor command.
pub fn encode_command(command: MotorCommand) -> Result<Frame, CodecError> {
    encode_set_duty(command.duty())
}

/// Validate a short frame and return its payload.
pub fn decode_frame(frame: &[u8]) -> Result<&[u8], CodecError> {
    let (&start, rest) = frame
        .split_first()
        .ok_or(CodecError::Malformed("empty frame"))?;
    if start != START_SHORT {
        return Err(CodecError::Malformed("missing start byte"));
    }
    let (&len, rest) = rest
        .split_first()
        .ok_or(CodecError::Malformed("missing length"))?;
    let len = usize::from(len);
    if rest.len() != len + 3 {
        return Err(CodecError::Malformed("length mismatch"));
    }
    let (payload, trailer) = rest.split_at(len);
    if trailer[2] != STOP_BYTE {
        return Err(CodecError::Malformed("missing stop byte"));
    }

    let actual = u16::from_be_bytes([trailer[0], trailer[1]]);
    let expected = crc16(payload);
    if actual != expected {
        return Err(CodecError::CrcMismatch { expected, actual });
    }
    Ok(payload)
}
