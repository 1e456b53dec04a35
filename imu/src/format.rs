//! On-disk layout of a recording, all fields little-endian:
//!
//! ```text
//! header: i64 wall-clock second of the time reference
//! record: i64 microseconds since the reference | f32 roll | f32 pitch | f32 yaw
//! ```
//!
//! Records follow the header back to back; their count is implied by the
//! file size.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

pub const HEADER_SIZE: usize = 8;
pub const RECORD_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub elapsed_us: i64,
    pub euler: [f32; 3],
}

impl Record {
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        LittleEndian::write_i64(&mut buf[..8], self.elapsed_us);
        LittleEndian::write_f32_into(&self.euler, &mut buf[8..]);
        buf
    }

    pub fn read_from<R: Read>(rdr: &mut R) -> io::Result<Self> {
        let elapsed_us = rdr.read_i64::<LittleEndian>()?;
        let mut euler = [0f32; 3];
        rdr.read_f32_into::<LittleEndian>(&mut euler)?;
        Ok(Record { elapsed_us, euler })
    }
}

pub fn encode_header(wall_second: i64) -> [u8; HEADER_SIZE] {
    wall_second.to_le_bytes()
}

/// Sequential reader for recordings, used for offline inspection.
pub struct RecordReader<R> {
    inner: R,
    wall_second: i64,
}

impl RecordReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let wall_second = inner.read_i64::<LittleEndian>()?;
        Ok(RecordReader { inner, wall_second })
    }

    /// Wall-clock second that elapsed offsets are relative to.
    pub fn wall_second(&self) -> i64 {
        self.wall_second
    }

    /// Reads the next record, `Ok(None)` at a clean end of stream.
    ///
    /// A trailing partial record is an `UnexpectedEof` error.
    pub fn next_record(&mut self) -> io::Result<Option<Record>> {
        let mut buf = [0u8; RECORD_SIZE];
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        match filled {
            0 => Ok(None),
            RECORD_SIZE => Record::read_from(&mut &buf[..]).map(Some),
            n => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("partial record of {} bytes", n),
            )),
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Number of whole records a file of `len` bytes holds, or `None` if the
/// length is not a header plus whole records.
pub fn record_count(len: u64) -> Option<u64> {
    let body = len.checked_sub(HEADER_SIZE as u64)?;
    (body % RECORD_SIZE as u64 == 0).then_some(body / RECORD_SIZE as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout_is_fixed() {
        let record = Record {
            elapsed_us: 100_000,
            euler: [0.1, 0.2, 0.3],
        };
        let bytes = record.encode();
        assert_eq!(&bytes[..8], &100_000i64.to_le_bytes());
        assert_eq!(&bytes[8..12], &0.1f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &0.3f32.to_le_bytes());
    }

    #[test]
    fn reader_returns_header_and_records() {
        let mut data = encode_header(1_650_000_000).to_vec();
        for i in 1..=3 {
            let r = Record {
                elapsed_us: i * 1000,
                euler: [i as f32, 0.0, -(i as f32)],
            };
            data.extend_from_slice(&r.encode());
        }

        let reader = RecordReader::new(&data[..]).unwrap();
        assert_eq!(reader.wall_second(), 1_650_000_000);
        let records: Vec<Record> = reader.collect::<io::Result<_>>().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].elapsed_us, 3000);
        assert_eq!(records[2].euler, [3.0, 0.0, -3.0]);
    }

    #[test]
    fn partial_record_is_reported() {
        let mut data = encode_header(0).to_vec();
        data.extend_from_slice(&[0u8; 7]);
        let mut reader = RecordReader::new(&data[..]).unwrap();
        let err = reader.next_record().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn counts_whole_records_only() {
        assert_eq!(record_count(8), Some(0));
        assert_eq!(record_count(68), Some(3));
        assert_eq!(record_count(69), None);
        assert_eq!(record_count(4), None);
    }
}
