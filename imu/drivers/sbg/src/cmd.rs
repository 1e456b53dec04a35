//! Command payloads sent to the device and the acknowledgement it answers with.

use crate::error::SbgError;
use crate::ids::{CmdId, LogId, MessageClass, OutputMode, OutputPort};
use byteorder::{ByteOrder, LittleEndian};

/// Payload of `CmdId::OutputConf` in its "set" form.
pub fn output_conf_payload(
    port: OutputPort,
    class: MessageClass,
    id: LogId,
    mode: OutputMode,
) -> [u8; 5] {
    let mut payload = [port as u8, class as u8, id as u8, 0, 0];
    LittleEndian::write_u16(&mut payload[3..5], mode as u16);
    payload
}

/// Device answer to a command, `error_code` 0 meaning success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub id: u8,
    pub class: u8,
    pub error_code: u16,
}

impl Ack {
    pub const SIZE: usize = 4;

    pub fn decode(payload: &[u8]) -> Result<Self, SbgError> {
        if payload.len() < Self::SIZE {
            return Err(SbgError::InvalidFrame(format!(
                "acknowledgement of {} bytes, expected {}",
                payload.len(),
                Self::SIZE
            )));
        }
        Ok(Ack {
            id: payload[0],
            class: payload[1],
            error_code: LittleEndian::read_u16(&payload[2..4]),
        })
    }

    pub fn encode(&self) -> [u8; 4] {
        let mut payload = [self.id, self.class, 0, 0];
        LittleEndian::write_u16(&mut payload[2..4], self.error_code);
        payload
    }

    pub fn acknowledges(&self, class: MessageClass, id: CmdId) -> bool {
        self.class == class as u8 && self.id == id as u8
    }

    pub fn into_result(self) -> Result<(), SbgError> {
        match self.error_code {
            0 => Ok(()),
            code => Err(SbgError::Nack { code }),
        }
    }
}
