//! sbgECom link layer.
//!
//! ```text
//! | 0xFF 0x5A | msg | class | len (u16 LE) | payload | crc (u16 LE) | 0x33 |
//! ```
//!
//! The CRC covers `msg` through the end of the payload.

use crate::crc::crc16;
use crate::error::SbgError;
use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

pub const SYNC_1: u8 = 0xFF;
pub const SYNC_2: u8 = 0x5A;
pub const ETX: u8 = 0x33;

pub const MAX_PAYLOAD_SIZE: usize = 4086;
const HEADER_SIZE: usize = 6;
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + 3;
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD_SIZE + FRAME_OVERHEAD;

/// A CRC-checked frame whose payload has not been interpreted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub class: u8,
    pub id: u8,
    pub payload: Vec<u8>,
}

pub fn encode_frame(class: u8, id: u8, payload: &[u8]) -> Result<Vec<u8>, SbgError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(SbgError::InvalidParameter(format!(
            "payload of {} bytes exceeds the {} byte limit",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = vec![0u8; payload.len() + FRAME_OVERHEAD];
    frame[0] = SYNC_1;
    frame[1] = SYNC_2;
    frame[2] = id;
    frame[3] = class;
    LittleEndian::write_u16(&mut frame[4..6], payload.len() as u16);
    frame[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);

    let crc_pos = HEADER_SIZE + payload.len();
    let crc = crc16(&frame[2..crc_pos]);
    LittleEndian::write_u16(&mut frame[crc_pos..crc_pos + 2], crc);
    frame[crc_pos + 2] = ETX;

    Ok(frame)
}

/// Incremental frame extractor fed with whatever the serial link returned.
pub struct FrameParser {
    buffer: Vec<u8>,
    capacity: usize,
}

impl FrameParser {
    pub fn new(capacity: Option<usize>) -> Self {
        let capacity = capacity.unwrap_or(2 * MAX_FRAME_SIZE).max(MAX_FRAME_SIZE);
        FrameParser {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Appends received bytes, discarding the oldest ones if the buffer is full.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > self.capacity {
            let excess = self.buffer.len() - self.capacity;
            warn!("{}", SbgError::BufferOverflow(excess));
            self.buffer.drain(..excess);
        }
    }

    /// Pushes `data` then drains every complete frame, good or bad.
    pub fn parse(&mut self, data: &[u8]) -> Vec<Result<RawFrame, SbgError>> {
        self.push(data);
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    /// Returns the next frame, an error for a corrupt one, or `None` when
    /// more bytes are needed.
    ///
    /// A corrupt candidate only consumes its first sync byte so a real frame
    /// starting inside it is still found on the next call.
    pub fn next_frame(&mut self) -> Option<Result<RawFrame, SbgError>> {
        match self
            .buffer
            .windows(2)
            .position(|w| w[0] == SYNC_1 && w[1] == SYNC_2)
        {
            Some(start) => {
                self.buffer.drain(..start);
            }
            None => {
                // A trailing first sync byte may be completed by the next read.
                let keep = usize::from(self.buffer.last() == Some(&SYNC_1));
                let len = self.buffer.len();
                self.buffer.drain(..len - keep);
                return None;
            }
        }

        if self.buffer.len() < HEADER_SIZE {
            return None;
        }

        let payload_len = LittleEndian::read_u16(&self.buffer[4..6]) as usize;
        if payload_len > MAX_PAYLOAD_SIZE {
            self.buffer.drain(..1);
            return Some(Err(SbgError::InvalidFrame(format!(
                "payload length {} exceeds the {} byte limit",
                payload_len, MAX_PAYLOAD_SIZE
            ))));
        }

        let total = payload_len + FRAME_OVERHEAD;
        if self.buffer.len() < total {
            return None;
        }

        if self.buffer[total - 1] != ETX {
            self.buffer.drain(..1);
            return Some(Err(SbgError::InvalidFrame(
                "missing end of frame marker".to_string(),
            )));
        }

        let crc_pos = HEADER_SIZE + payload_len;
        let received = LittleEndian::read_u16(&self.buffer[crc_pos..crc_pos + 2]);
        let computed = crc16(&self.buffer[2..crc_pos]);
        if received != computed {
            self.buffer.drain(..1);
            return Some(Err(SbgError::InvalidCrc {
                expected: computed,
                actual: received,
            }));
        }

        let frame = RawFrame {
            id: self.buffer[2],
            class: self.buffer[3],
            payload: self.buffer[HEADER_SIZE..crc_pos].to_vec(),
        };
        self.buffer.drain(..total);
        Some(Ok(frame))
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(None)
    }
}
