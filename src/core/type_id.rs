//! Descriptor type identifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 16-byte RFC 4122 UUID tagging a descriptor's payload format.
///
/// Bytes are kept in wire order, which is the RFC 4122 (big-endian) order,
/// so `Display` prints the canonical hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TypeId(pub [u8; 16]);

impl TypeId {
    pub const NIL: TypeId = TypeId([0u8; 16]);

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TypeId(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == [0u8; 16]
    }

    pub fn as_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.0)
    }
}

impl From<[u8; 16]> for TypeId {
    fn from(bytes: [u8; 16]) -> Self {
        TypeId(bytes)
    }
}

impl From<Uuid> for TypeId {
    fn from(uuid: Uuid) -> Self {
        TypeId(*uuid.as_bytes())
    }
}

impl From<TypeId> for Uuid {
    fn from(id: TypeId) -> Self {
        id.as_uuid()
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_uuid().hyphenated())
    }
}

impl FromStr for TypeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TypeId::from)
    }
}

// Hyphenated text in human-readable formats, raw bytes otherwise
impl Serialize for TypeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_uuid().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TypeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(TypeId::from)
    }
}
