//! Beacon/reply wire protocol.
//!
//! Grounded on `original_source/src/net/protocol.h`'s `MSG_T` enum and
//! `MSG_BEACON`/`MSG_BEACON_REPLY`/`MSG_GOODBYE` structs. The estimator core
//! is transport-agnostic; this module is the wire format that drives it from
//! bytes on a socket. Framing uses `byteorder` over fixed-size structs, the
//! same idiom used for length-prefixed framing elsewhere in this codebase.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

const PROTOCOL_V_MAJOR: u8 = 1;
const PROTOCOL_V_MINOR: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum MsgType {
    Handshake = 0x00,
    Beacon = 0xf0,
    BeaconReply = 0xf1,
    Goodbye = 0xff,
}

impl MsgType {
    fn from_byte(b: u8) -> io::Result<Self> {
        match b {
            0x00 => Ok(MsgType::Handshake),
            0xf0 => Ok(MsgType::Beacon),
            0xf1 => Ok(MsgType::BeaconReply),
            0xff => Ok(MsgType::Goodbye),
            other => Err(io::Error::new(io::ErrorKind::InvalidData, format!("unknown message type 0x{other:02x}"))),
        }
    }
}

/// Which role a node plays (`original_source/src/node.h`'s `REF_MODE`/`SYNC_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeMode {
    Reference = 0,
    Sync = 1,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Handshake { mode: NodeMode },
    Beacon { seq: u8, send_time_us: u64 },
    BeaconReply {
        seq: u8,
        beacon_send_time_us: u64,
        beacon_recv_time_us: u64,
        reply_send_time_us: u64,
    },
    Goodbye { ack: bool },
}

impl Message {
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        match self {
            Message::Handshake { mode } => {
                w.write_u8(MsgType::Handshake as u8)?;
                w.write_u8(PROTOCOL_V_MAJOR)?;
                w.write_u8(PROTOCOL_V_MINOR)?;
                w.write_u8(*mode as u8)?;
            }
            Message::Beacon { seq, send_time_us } => {
                w.write_u8(MsgType::Beacon as u8)?;
                w.write_u8(*seq)?;
                w.write_u64::<BigEndian>(*send_time_us)?;
            }
            Message::BeaconReply {
                seq,
                beacon_send_time_us,
                beacon_recv_time_us,
                reply_send_time_us,
            } => {
                w.write_u8(MsgType::BeaconReply as u8)?;
                w.write_u8(*seq)?;
                w.write_u64::<BigEndian>(*beacon_send_time_us)?;
                w.write_u64::<BigEndian>(*beacon_recv_time_us)?;
                w.write_u64::<BigEndian>(*reply_send_time_us)?;
            }
            Message::Goodbye { ack } => {
                w.write_u8(MsgType::Goodbye as u8)?;
                w.write_u8(*ack as u8)?;
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(26);
        self.write_to(&mut buf).expect("writing to a Vec never fails");
        buf
    }

    pub fn read_from(r: &mut impl Read) -> io::Result<Self> {
        let msg_type = MsgType::from_byte(r.read_u8()?)?;
        match msg_type {
            MsgType::Handshake => {
                let _major = r.read_u8()?;
                let _minor = r.read_u8()?;
                let mode = match r.read_u8()? {
                    0 => NodeMode::Reference,
                    _ => NodeMode::Sync,
                };
                Ok(Message::Handshake { mode })
            }
            MsgType::Beacon => {
                let seq = r.read_u8()?;
                let send_time_us = r.read_u64::<BigEndian>()?;
                Ok(Message::Beacon { seq, send_time_us })
            }
            MsgType::BeaconReply => {
                let seq = r.read_u8()?;
                let beacon_send_time_us = r.read_u64::<BigEndian>()?;
                let beacon_recv_time_us = r.read_u64::<BigEndian>()?;
                let reply_send_time_us = r.read_u64::<BigEndian>()?;
                Ok(Message::BeaconReply {
                    seq,
                    beacon_send_time_us,
                    beacon_recv_time_us,
                    reply_send_time_us,
                })
            }
            MsgType::Goodbye => {
                let ack = r.read_u8()? != 0;
                Ok(Message::Goodbye { ack })
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        let mut cursor = io::Cursor::new(bytes);
        Self::read_from(&mut cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beacon_round_trips() {
        let msg = Message::Beacon { seq: 7, send_time_us: 1_234_567_890 };
        let bytes = msg.to_bytes();
        assert_eq!(Message::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn beacon_reply_round_trips() {
        let msg = Message::BeaconReply {
            seq: 7,
            beacon_send_time_us: 100,
            beacon_recv_time_us: 150,
            reply_send_time_us: 160,
        };
        let bytes = msg.to_bytes();
        assert_eq!(Message::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn handshake_round_trips() {
        let msg = Message::Handshake { mode: NodeMode::Sync };
        let bytes = msg.to_bytes();
        assert_eq!(Message::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn unknown_type_byte_is_rejected() {
        let bytes = [0x42u8];
        assert!(Message::from_bytes(&bytes).is_err());
    }
}
