//! Decoding of the log payloads this driver understands.

use crate::error::SbgError;
use crate::frame::RawFrame;
use crate::ids::{LogId, MessageClass};
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use imu_traits::{EulerAngles, Quaternion, Vector3};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use std::io::{self, Cursor};

bitflags! {
    /// Kalman filter status word shared by the EKF logs.
    ///
    /// Bits 0-3 hold the solution mode, see [`EkfStatus::solution_mode`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EkfStatus: u32 {
        const ATTITUDE_VALID = 1 << 4;
        const HEADING_VALID = 1 << 5;
        const VELOCITY_VALID = 1 << 6;
        const POSITION_VALID = 1 << 7;
        const VERT_REF_USED = 1 << 8;
        const MAG_REF_USED = 1 << 9;
        const GPS1_VEL_USED = 1 << 10;
        const GPS1_POS_USED = 1 << 11;
        const GPS1_HDT_USED = 1 << 13;
        const ODO_USED = 1 << 20;

        const _ = !0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum SolutionMode {
    Uninitialized = 0,
    VerticalGyro = 1,
    Ahrs = 2,
    NavVelocity = 3,
    NavPosition = 4,
}

impl EkfStatus {
    pub fn solution_mode(&self) -> Option<SolutionMode> {
        SolutionMode::from_u32(self.bits() & 0x0F)
    }
}

/// Orientation estimate, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EkfEuler {
    /// Device time in microseconds since power up.
    pub time_stamp: u32,
    pub euler: EulerAngles,
    pub std_dev: Vector3,
    pub status: EkfStatus,
}

pub const EKF_EULER_SIZE: usize = 32;

impl EkfEuler {
    fn decode(payload: &[u8]) -> io::Result<Self> {
        let mut rdr = Cursor::new(payload);
        let time_stamp = rdr.read_u32::<LittleEndian>()?;
        let euler = EulerAngles::new(
            rdr.read_f32::<LittleEndian>()?,
            rdr.read_f32::<LittleEndian>()?,
            rdr.read_f32::<LittleEndian>()?,
        );
        let std_dev = read_vector3(&mut rdr)?;
        let status = EkfStatus::from_bits_retain(rdr.read_u32::<LittleEndian>()?);
        Ok(EkfEuler {
            time_stamp,
            euler,
            std_dev,
            status,
        })
    }

    /// Serializes the log the way the device sends it.
    pub fn to_payload(&self) -> [u8; EKF_EULER_SIZE] {
        let mut out = [0u8; EKF_EULER_SIZE];
        LittleEndian::write_u32(&mut out[0..4], self.time_stamp);
        LittleEndian::write_f32_into(&self.euler.to_array(), &mut out[4..16]);
        LittleEndian::write_f32_into(
            &[self.std_dev.x, self.std_dev.y, self.std_dev.z],
            &mut out[16..28],
        );
        LittleEndian::write_u32(&mut out[28..32], self.status.bits());
        out
    }
}

/// Orientation estimate as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EkfQuat {
    pub time_stamp: u32,
    pub quaternion: Quaternion,
    pub std_dev: Vector3,
    pub status: EkfStatus,
}

impl EkfQuat {
    fn decode(payload: &[u8]) -> io::Result<Self> {
        let mut rdr = Cursor::new(payload);
        let time_stamp = rdr.read_u32::<LittleEndian>()?;
        let quaternion = Quaternion {
            w: rdr.read_f32::<LittleEndian>()?,
            x: rdr.read_f32::<LittleEndian>()?,
            y: rdr.read_f32::<LittleEndian>()?,
            z: rdr.read_f32::<LittleEndian>()?,
        };
        let std_dev = read_vector3(&mut rdr)?;
        let status = EkfStatus::from_bits_retain(rdr.read_u32::<LittleEndian>()?);
        Ok(EkfQuat {
            time_stamp,
            quaternion,
            std_dev,
            status,
        })
    }
}

fn read_vector3(rdr: &mut Cursor<&[u8]>) -> io::Result<Vector3> {
    Ok(Vector3::new(
        rdr.read_f32::<LittleEndian>()?,
        rdr.read_f32::<LittleEndian>()?,
        rdr.read_f32::<LittleEndian>()?,
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogData {
    EkfEuler(EkfEuler),
    EkfQuat(EkfQuat),
    /// Any log this driver does not decode, payload left untouched.
    Unknown(Vec<u8>),
}

/// A decoded log together with the tags it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFrame {
    pub class: u8,
    pub id: u8,
    pub data: LogData,
}

impl LogFrame {
    pub fn decode(raw: RawFrame) -> Result<Self, SbgError> {
        let known = match (MessageClass::from_u8(raw.class), LogId::from_u8(raw.id)) {
            (Some(MessageClass::LogEcom0), Some(LogId::EkfEuler)) => {
                Some(EkfEuler::decode(&raw.payload).map(LogData::EkfEuler))
            }
            (Some(MessageClass::LogEcom0), Some(LogId::EkfQuat)) => {
                Some(EkfQuat::decode(&raw.payload).map(LogData::EkfQuat))
            }
            _ => None,
        };

        let data = match known {
            Some(Ok(data)) => data,
            Some(Err(_)) => {
                return Err(SbgError::InvalidFrame(format!(
                    "truncated payload of {} bytes for log {:#04x}/{:#04x}",
                    raw.payload.len(),
                    raw.class,
                    raw.id
                )))
            }
            None => LogData::Unknown(raw.payload),
        };

        Ok(LogFrame {
            class: raw.class,
            id: raw.id,
            data,
        })
    }

    pub fn ekf_euler(log: EkfEuler) -> Self {
        LogFrame {
            class: MessageClass::LogEcom0 as u8,
            id: LogId::EkfEuler as u8,
            data: LogData::EkfEuler(log),
        }
    }

    pub fn is(&self, class: MessageClass, id: LogId) -> bool {
        self.class == class as u8 && self.id == id as u8
    }
}
