// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! WitMotion serial protocol
//!
//! WitMotion inertial sensors (WT901 family, HC-06 Bluetooth bridges) emit
//! a continuous stream of 11-byte frames:
//!
//! ```text
//! +------+------+----------------------------------+----------+
//! | 0x55 | type | 4 x i16 little-endian (8 bytes)  | checksum |
//! +------+------+----------------------------------+----------+
//! ```
//!
//! The checksum is the low byte of the sum of the ten preceding bytes.
//! [`FrameDecoder`] reassembles frames from arbitrary read chunks. A frame
//! that fails validation is dropped and counted; decoding continues from the
//! next header byte.

use log::debug;

use crate::error::{Result, VibrationError};

/// First byte of every frame
pub const FRAME_HEADER: u8 = 0x55;

/// Size of one frame in bytes
pub const FRAME_LEN: usize = 11;

/// Frame type bytes
pub mod kind {
    pub const TIME: u8 = 0x50;
    pub const ACCELERATION: u8 = 0x51;
    pub const ANGULAR_VELOCITY: u8 = 0x52;
    pub const ANGLE: u8 = 0x53;
    pub const MAGNETIC: u8 = 0x54;
    pub const QUATERNION: u8 = 0x59;
}

/// Full-scale acceleration range in g
const ACCEL_RANGE: f64 = 16.0;
/// Full-scale angular velocity range in degrees per second
const GYRO_RANGE: f64 = 2000.0;
/// Full-scale angle range in degrees
const ANGLE_RANGE: f64 = 180.0;
const RAW_SCALE: f64 = 32768.0;

/// A decoded sensor frame, already converted to physical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// Acceleration in g and chip temperature in °C
    Acceleration {
        x: f64,
        y: f64,
        z: f64,
        temperature: f64,
    },
    /// Angular velocity in degrees per second
    AngularVelocity { x: f64, y: f64, z: f64 },
    /// Euler angles in degrees
    Angle { roll: f64, pitch: f64, yaw: f64 },
    /// Magnetic field in raw sensor counts
    Magnetic { x: f64, y: f64, z: f64 },
    /// Unit quaternion
    Quaternion { w: f64, x: f64, y: f64, z: f64 },
    /// Valid frame of a type this crate does not interpret
    Unknown { kind: u8 },
}

impl Frame {
    /// Type byte written on the wire for this frame
    pub fn kind(&self) -> u8 {
        match self {
            Frame::Acceleration { .. } => kind::ACCELERATION,
            Frame::AngularVelocity { .. } => kind::ANGULAR_VELOCITY,
            Frame::Angle { .. } => kind::ANGLE,
            Frame::Magnetic { .. } => kind::MAGNETIC,
            Frame::Quaternion { .. } => kind::QUATERNION,
            Frame::Unknown { kind } => *kind,
        }
    }

    /// Encode the frame back into its wire representation
    ///
    /// Values are quantized to the sensor's 16-bit resolution and clamped to
    /// its full-scale range.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let words = match *self {
            Frame::Acceleration {
                x,
                y,
                z,
                temperature,
            } => [
                to_raw(x, ACCEL_RANGE),
                to_raw(y, ACCEL_RANGE),
                to_raw(z, ACCEL_RANGE),
                quantize(temperature * 100.0),
            ],
            Frame::AngularVelocity { x, y, z } => [
                to_raw(x, GYRO_RANGE),
                to_raw(y, GYRO_RANGE),
                to_raw(z, GYRO_RANGE),
                0,
            ],
            Frame::Angle { roll, pitch, yaw } => [
                to_raw(roll, ANGLE_RANGE),
                to_raw(pitch, ANGLE_RANGE),
                to_raw(yaw, ANGLE_RANGE),
                0,
            ],
            Frame::Magnetic { x, y, z } => [quantize(x), quantize(y), quantize(z), 0],
            Frame::Quaternion { w, x, y, z } => [
                to_raw(w, 1.0),
                to_raw(x, 1.0),
                to_raw(y, 1.0),
                to_raw(z, 1.0),
            ],
            Frame::Unknown { .. } => [0; 4],
        };
        encode_raw(self.kind(), words)
    }
}

fn quantize(value: f64) -> i16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

fn to_raw(value: f64, range: f64) -> i16 {
    quantize(value / range * RAW_SCALE)
}

fn from_raw(raw: i16, range: f64) -> f64 {
    raw as f64 / RAW_SCALE * range
}

/// Low byte of the sum of `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Build a frame from its type byte and four raw words
pub fn encode_raw(kind: u8, words: [i16; 4]) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = FRAME_HEADER;
    frame[1] = kind;
    for (i, word) in words.iter().enumerate() {
        frame[2 + i * 2..4 + i * 2].copy_from_slice(&word.to_le_bytes());
    }
    frame[FRAME_LEN - 1] = checksum(&frame[..FRAME_LEN - 1]);
    frame
}

/// Decode exactly one frame
///
/// ### Errors
///
/// Returns [`VibrationError::FrameDecode`] for a wrong length, a missing
/// header byte or a checksum mismatch.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() != FRAME_LEN {
        return Err(VibrationError::frame_decode(format!(
            "expected {} bytes, got {}",
            FRAME_LEN,
            bytes.len()
        )));
    }
    if bytes[0] != FRAME_HEADER {
        return Err(VibrationError::frame_decode(format!(
            "bad header byte 0x{:02x}",
            bytes[0]
        )));
    }
    let expected = checksum(&bytes[..FRAME_LEN - 1]);
    if bytes[FRAME_LEN - 1] != expected {
        return Err(VibrationError::frame_decode(format!(
            "checksum mismatch for type 0x{:02x}: got 0x{:02x}, expected 0x{:02x}",
            bytes[1],
            bytes[FRAME_LEN - 1],
            expected
        )));
    }

    let word = |i: usize| i16::from_le_bytes([bytes[2 + i * 2], bytes[3 + i * 2]]);
    let frame = match bytes[1] {
        kind::ACCELERATION => Frame::Acceleration {
            x: from_raw(word(0), ACCEL_RANGE),
            y: from_raw(word(1), ACCEL_RANGE),
            z: from_raw(word(2), ACCEL_RANGE),
            temperature: word(3) as f64 / 100.0,
        },
        kind::ANGULAR_VELOCITY => Frame::AngularVelocity {
            x: from_raw(word(0), GYRO_RANGE),
            y: from_raw(word(1), GYRO_RANGE),
            z: from_raw(word(2), GYRO_RANGE),
        },
        kind::ANGLE => Frame::Angle {
            roll: from_raw(word(0), ANGLE_RANGE),
            pitch: from_raw(word(1), ANGLE_RANGE),
            yaw: from_raw(word(2), ANGLE_RANGE),
        },
        kind::MAGNETIC => Frame::Magnetic {
            x: word(0) as f64,
            y: word(1) as f64,
            z: word(2) as f64,
        },
        kind::QUATERNION => Frame::Quaternion {
            w: from_raw(word(0), 1.0),
            x: from_raw(word(1), 1.0),
            y: from_raw(word(2), 1.0),
            z: from_raw(word(3), 1.0),
        },
        other => Frame::Unknown { kind: other },
    };
    Ok(frame)
}

/// Streaming frame decoder
///
/// Bytes are appended with [`push`](FrameDecoder::push) in whatever chunks
/// the link delivers them, and every complete valid frame is returned.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    decoded: usize,
    dropped: usize,
    /// Set after a failed candidate until the next valid frame
    resyncing: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and collect the frames they complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        loop {
            // Skip anything that cannot start a frame
            match self.buffer.iter().position(|&b| b == FRAME_HEADER) {
                Some(0) => {}
                Some(start) => {
                    self.buffer.drain(..start);
                }
                None => {
                    self.buffer.clear();
                    break;
                }
            }

            if self.buffer.len() < FRAME_LEN {
                break;
            }

            match decode_frame(&self.buffer[..FRAME_LEN]) {
                Ok(frame) => {
                    self.decoded += 1;
                    self.resyncing = false;
                    frames.push(frame);
                    self.buffer.drain(..FRAME_LEN);
                }
                Err(e) => {
                    // One loss of sync counts once, however many header
                    // bytes the bad frame holds
                    if !self.resyncing {
                        debug!("Dropping frame: {}", e);
                        self.dropped += 1;
                        self.resyncing = true;
                    }
                    // Resynchronize on the next header byte
                    self.buffer.drain(..1);
                }
            }
        }

        frames
    }

    /// Number of frames decoded so far
    pub fn decoded_frames(&self) -> usize {
        self.decoded
    }

    /// Number of times the stream lost frame sync so far
    pub fn dropped_frames(&self) -> usize {
        self.dropped
    }

    /// Bytes waiting for the rest of their frame
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_low_byte_of_sum() {
        assert_eq!(checksum(&[0x55, 0x51, 0xff, 0x01]), 0xa6);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_decode_known_acceleration_frame() {
        // x = 1 g, y = -0.5 g, z = 0, temperature 25.31 °C
        let frame = encode_raw(kind::ACCELERATION, [2048, -1024, 0, 2531]);
        match decode_frame(&frame).unwrap() {
            Frame::Acceleration {
                x,
                y,
                z,
                temperature,
            } => {
                assert_eq!(x, 1.0);
                assert_eq!(y, -0.5);
                assert_eq!(z, 0.0);
                assert!((temperature - 25.31).abs() < 1e-9);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_decode_gyro_scale() {
        let frame = encode_raw(kind::ANGULAR_VELOCITY, [16384, 0, -32768, 0]);
        assert_eq!(
            decode_frame(&frame).unwrap(),
            Frame::AngularVelocity {
                x: 1000.0,
                y: 0.0,
                z: -2000.0
            }
        );
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let mut frame = encode_raw(kind::ACCELERATION, [1, 2, 3, 4]);
        frame[FRAME_LEN - 1] = frame[FRAME_LEN - 1].wrapping_add(1);
        assert!(matches!(
            decode_frame(&frame),
            Err(VibrationError::FrameDecode { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_length_and_header() {
        assert!(decode_frame(&[FRAME_HEADER, kind::ACCELERATION]).is_err());
        let mut frame = encode_raw(kind::ANGLE, [0; 4]);
        frame[0] = 0x54;
        assert!(decode_frame(&frame).is_err());
    }

    #[test]
    fn test_unknown_type_is_reported_not_rejected() {
        let frame = encode_raw(kind::TIME, [0; 4]);
        assert_eq!(
            decode_frame(&frame).unwrap(),
            Frame::Unknown { kind: kind::TIME }
        );
    }

    #[test]
    fn test_encode_quantizes_to_sensor_resolution() {
        let frame = Frame::AngularVelocity {
            x: 12.3,
            y: -45.6,
            z: 0.0,
        };
        match decode_frame(&frame.encode()).unwrap() {
            Frame::AngularVelocity { x, y, z } => {
                let step = GYRO_RANGE / RAW_SCALE;
                assert!((x - 12.3).abs() <= step);
                assert!((y + 45.6).abs() <= step);
                assert_eq!(z, 0.0);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_encode_clamps_out_of_range_values() {
        let frame = Frame::Acceleration {
            x: 40.0,
            y: -40.0,
            z: 0.0,
            temperature: 20.0,
        };
        match decode_frame(&frame.encode()).unwrap() {
            Frame::Acceleration { x, y, .. } => {
                assert!(x < ACCEL_RANGE && x > ACCEL_RANGE - 0.001);
                assert_eq!(y, -ACCEL_RANGE);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_decoder_handles_split_chunks() {
        let frame = encode_raw(kind::ACCELERATION, [100, 200, 300, 0]);
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&frame[..4]).is_empty());
        assert_eq!(decoder.pending_bytes(), 4);
        let frames = decoder.push(&frame[4..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(decoder.pending_bytes(), 0);
        assert_eq!(decoder.decoded_frames(), 1);
    }

    #[test]
    fn test_decoder_skips_leading_garbage() {
        let mut stream = vec![0x00, 0x13, 0xff];
        stream.extend_from_slice(&encode_raw(kind::ANGULAR_VELOCITY, [1, 1, 1, 0]));
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(decoder.dropped_frames(), 0);
    }

    #[test]
    fn test_decoder_drops_corrupt_frame_and_continues() {
        let mut corrupt = encode_raw(kind::ACCELERATION, [5, 5, 5, 5]);
        corrupt[FRAME_LEN - 1] ^= 0xff;

        let mut stream = Vec::new();
        stream.extend_from_slice(&encode_raw(kind::ACCELERATION, [1, 2, 3, 0]));
        stream.extend_from_slice(&corrupt);
        stream.extend_from_slice(&encode_raw(kind::ANGULAR_VELOCITY, [4, 5, 6, 0]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].kind(), kind::ACCELERATION);
        assert_eq!(frames[1].kind(), kind::ANGULAR_VELOCITY);
        assert_eq!(decoder.dropped_frames(), 1);
    }

    #[test]
    fn test_header_bytes_in_corrupt_payload_count_once() {
        let mut corrupt = encode_raw(kind::ACCELERATION, [0x5555, 0x0055, 0x5555, 0]);
        corrupt[FRAME_LEN - 1] ^= 0xff;

        let mut stream = corrupt.to_vec();
        stream.extend_from_slice(&encode_raw(kind::ANGULAR_VELOCITY, [7, 8, 9, 0]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind(), kind::ANGULAR_VELOCITY);
        assert_eq!(decoder.dropped_frames(), 1);
    }

    #[test]
    fn test_each_corrupt_frame_counts_after_recovery() {
        let mut corrupt = encode_raw(kind::ACCELERATION, [0x5555, 1, 2, 0]);
        corrupt[FRAME_LEN - 1] ^= 0xff;
        let valid = encode_raw(kind::ANGULAR_VELOCITY, [3, 4, 5, 0]);

        let mut decoder = FrameDecoder::new();
        for _ in 0..3 {
            decoder.push(&corrupt);
            decoder.push(&valid);
        }
        assert_eq!(decoder.decoded_frames(), 3);
        assert_eq!(decoder.dropped_frames(), 3);
    }
}
