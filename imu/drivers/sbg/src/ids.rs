use imu_traits::ImuFrequency;
use num_derive::{FromPrimitive, ToPrimitive};
use strum_macros::{Display, EnumString};

/// Message classes carried in the second byte of a frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum MessageClass {
    LogEcom0 = 0x00,
    LogEcom1 = 0x01,
    LogNmea0 = 0x02,
    LogNmea1 = 0x03,
    LogThirdParty0 = 0x04,
    Cmd0 = 0x10,
}

/// Log ids of the `LogEcom0` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum LogId {
    Status = 1,
    UtcTime = 2,
    ImuData = 3,
    Mag = 4,
    MagCalib = 5,
    EkfEuler = 6,
    EkfQuat = 7,
    EkfNav = 8,
}

/// Command ids of the `Cmd0` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum CmdId {
    Ack = 0,
    OutputConf = 29,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum OutputPort {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
}

/// Output rate of a log, expressed as a divider of the 200 Hz main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum OutputMode {
    Disabled = 0,
    MainLoop = 1,
    Div2 = 2,
    Div4 = 4,
    Div5 = 5,
    Div8 = 8,
    Div10 = 10,
    Div20 = 20,
    Div40 = 40,
    Div200 = 200,
}

impl From<ImuFrequency> for OutputMode {
    fn from(frequency: ImuFrequency) -> Self {
        match frequency {
            ImuFrequency::Hz200 => OutputMode::MainLoop,
            ImuFrequency::Hz100 => OutputMode::Div2,
            ImuFrequency::Hz50 => OutputMode::Div4,
            ImuFrequency::Hz40 => OutputMode::Div5,
            ImuFrequency::Hz25 => OutputMode::Div8,
            ImuFrequency::Hz20 => OutputMode::Div10,
            ImuFrequency::Hz10 => OutputMode::Div20,
            ImuFrequency::Hz5 => OutputMode::Div40,
            ImuFrequency::Hz1 => OutputMode::Div200,
        }
    }
}
