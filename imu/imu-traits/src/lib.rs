use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

// --- Basic Types ---
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3(x={}, y={}, z={})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quaternion(w={}, x={}, y={}, z={})", self.w, self.x, self.y, self.z)
    }
}

/// Orientation as roll/pitch/yaw, in the unit the producing device uses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EulerAngles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl EulerAngles {
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        EulerAngles { roll, pitch, yaw }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.roll, self.pitch, self.yaw]
    }
}

impl fmt::Display for EulerAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Euler(roll={}, pitch={}, yaw={})", self.roll, self.pitch, self.yaw)
    }
}

// --- Output rates ---

/// Sample rates an IMU can be asked to stream at.
///
/// All of them are integer divisors of a 200 Hz main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum ImuFrequency {
    #[strum(serialize = "200")]
    Hz200,
    #[strum(serialize = "100")]
    Hz100,
    #[strum(serialize = "50")]
    Hz50,
    #[strum(serialize = "40")]
    Hz40,
    #[strum(serialize = "25")]
    Hz25,
    #[strum(serialize = "20")]
    Hz20,
    #[strum(serialize = "10")]
    Hz10,
    #[strum(serialize = "5")]
    Hz5,
    #[strum(serialize = "1")]
    Hz1,
}

impl ImuFrequency {
    pub const MAIN_LOOP_HZ: u32 = 200;

    pub fn hz(&self) -> u32 {
        match self {
            ImuFrequency::Hz200 => 200,
            ImuFrequency::Hz100 => 100,
            ImuFrequency::Hz50 => 50,
            ImuFrequency::Hz40 => 40,
            ImuFrequency::Hz25 => 25,
            ImuFrequency::Hz20 => 20,
            ImuFrequency::Hz10 => 10,
            ImuFrequency::Hz5 => 5,
            ImuFrequency::Hz1 => 1,
        }
    }

    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            200 => Some(ImuFrequency::Hz200),
            100 => Some(ImuFrequency::Hz100),
            50 => Some(ImuFrequency::Hz50),
            40 => Some(ImuFrequency::Hz40),
            25 => Some(ImuFrequency::Hz25),
            20 => Some(ImuFrequency::Hz20),
            10 => Some(ImuFrequency::Hz10),
            5 => Some(ImuFrequency::Hz5),
            1 => Some(ImuFrequency::Hz1),
            _ => None,
        }
    }

    /// How many main-loop ticks separate two samples at this rate.
    pub fn divider(&self) -> u32 {
        Self::MAIN_LOOP_HZ / self.hz()
    }
}
