//! Opcode definitions
//!
//! Every operation the server understands, with the fixed shape of its
//! success reply.

use crate::error::WireError;

/// How a success (status 0) reply is laid out on the wire.
///
/// This is a fixed per-opcode property of the server and cannot be
/// inferred from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyLayout {
    /// Nothing follows the status byte
    StatusOnly,
    /// `len(4)` followed by exactly `len` payload bytes
    LengthPrefixed,
    /// `timestamp(8) + value(class) + quality(4)` with no length field
    InlineRow,
}

/// Common surface of handshake and session opcodes
pub trait Operation: Copy {
    /// The byte sent on the wire
    fn code(self) -> u8;

    /// Human-readable name used in error messages
    fn name(self) -> &'static str;

    /// Layout of the success reply
    fn reply_layout(self) -> ReplyLayout;

    /// Whether the server accepts this operation before login completes
    fn allowed_before_login(self) -> bool {
        false
    }
}

/// Opcodes valid before the session is authenticated.
///
/// They reuse the low byte values of [`Opcode`]; the server interprets a
/// byte according to the connection's login state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeOp {
    LoginGetKeys = 0,
    LoginValidPass = 1,
    RestoreSession = 2,
    GetProtocolVersion = 254,
}

impl Operation for HandshakeOp {
    fn code(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            HandshakeOp::LoginGetKeys => "login get keys",
            HandshakeOp::LoginValidPass => "login valid pass",
            HandshakeOp::RestoreSession => "restore session",
            HandshakeOp::GetProtocolVersion => "protocol version",
        }
    }

    fn reply_layout(self) -> ReplyLayout {
        ReplyLayout::LengthPrefixed
    }

    fn allowed_before_login(self) -> bool {
        true
    }
}

/// Opcodes of an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Disconnect = 0,
    BaseCreate = 1,
    BaseOpen = 2,
    BaseGetInfo = 3,
    BaseGetList = 4,
    BaseRemove = 5,
    BaseUpdate = 6,
    BaseClose = 7,
    SeriesCreate = 8,
    SeriesRemove = 9,
    SeriesUpdate = 10,
    SeriesGetAll = 11,
    SeriesGetInfo = 12,
    UserGetList = 13,
    UserGetInfo = 14,
    UserCreate = 15,
    UserRemove = 16,
    UserUpdate = 17,
    PropsGetList = 18,
    PropsGetInfo = 19,
    PropsSet = 20,
    DataGetBoundary = 21,
    DataGetCP = 22,
    DataGetFromCP = 23,
    DataGetRangeFromCP = 24,
    DataGetRangeDirection = 25,
    DataAddRow = 26,
    DataDeleteRow = 27,
    DataDeleteRows = 28,
    DataAddRowCache = 29,
    DataGetValueAtTime = 30,
    DataMathFunc = 31,
    DataAddRows = 32,
    DataGetLastValue = 33,
}

impl Operation for Opcode {
    fn code(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Opcode::Disconnect => "disconnect",
            Opcode::BaseCreate => "base create",
            Opcode::BaseOpen => "base open",
            Opcode::BaseGetInfo => "base get info",
            Opcode::BaseGetList => "base get list",
            Opcode::BaseRemove => "base remove",
            Opcode::BaseUpdate => "base update",
            Opcode::BaseClose => "base close",
            Opcode::SeriesCreate => "series create",
            Opcode::SeriesRemove => "series remove",
            Opcode::SeriesUpdate => "series update",
            Opcode::SeriesGetAll => "series get all",
            Opcode::SeriesGetInfo => "series get info",
            Opcode::UserGetList => "user get list",
            Opcode::UserGetInfo => "user get info",
            Opcode::UserCreate => "user create",
            Opcode::UserRemove => "user remove",
            Opcode::UserUpdate => "user update",
            Opcode::PropsGetList => "props get list",
            Opcode::PropsGetInfo => "props get info",
            Opcode::PropsSet => "props set",
            Opcode::DataGetBoundary => "data get boundary",
            Opcode::DataGetCP => "data get CP",
            Opcode::DataGetFromCP => "data get from CP",
            Opcode::DataGetRangeFromCP => "data get range from CP",
            Opcode::DataGetRangeDirection => "data get range direction",
            Opcode::DataAddRow => "data add row",
            Opcode::DataDeleteRow => "data delete row",
            Opcode::DataDeleteRows => "data delete rows",
            Opcode::DataAddRowCache => "data add row cache",
            Opcode::DataGetValueAtTime => "data get value at time",
            Opcode::DataMathFunc => "data math func",
            Opcode::DataAddRows => "data add rows",
            Opcode::DataGetLastValue => "data get last value",
        }
    }

    fn reply_layout(self) -> ReplyLayout {
        match self {
            Opcode::BaseCreate
            | Opcode::BaseOpen
            | Opcode::BaseRemove
            | Opcode::BaseUpdate
            | Opcode::BaseClose
            | Opcode::SeriesCreate
            | Opcode::DataAddRow
            | Opcode::DataAddRows => ReplyLayout::StatusOnly,
            Opcode::DataGetValueAtTime => ReplyLayout::InlineRow,
            // Reads and counters carry the redundant length; opcodes with no
            // client method are assumed to follow the same rule.
            _ => ReplyLayout::LengthPrefixed,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        use Opcode::*;
        const ALL: [Opcode; 34] = [
            Disconnect, BaseCreate, BaseOpen, BaseGetInfo, BaseGetList, BaseRemove,
            BaseUpdate, BaseClose, SeriesCreate, SeriesRemove, SeriesUpdate, SeriesGetAll,
            SeriesGetInfo, UserGetList, UserGetInfo, UserCreate, UserRemove, UserUpdate,
            PropsGetList, PropsGetInfo, PropsSet, DataGetBoundary, DataGetCP, DataGetFromCP,
            DataGetRangeFromCP, DataGetRangeDirection, DataAddRow, DataDeleteRow,
            DataDeleteRows, DataAddRowCache, DataGetValueAtTime, DataMathFunc, DataAddRows,
            DataGetLastValue,
        ];
        ALL.get(byte as usize)
            .copied()
            .ok_or_else(|| WireError::Protocol(format!("Unknown opcode: 0x{:02x}", byte)))
    }
}

impl TryFrom<u8> for HandshakeOp {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(HandshakeOp::LoginGetKeys),
            1 => Ok(HandshakeOp::LoginValidPass),
            2 => Ok(HandshakeOp::RestoreSession),
            254 => Ok(HandshakeOp::GetProtocolVersion),
            _ => Err(WireError::Protocol(format!(
                "Unknown handshake opcode: 0x{:02x}",
                byte
            ))),
        }
    }
}
