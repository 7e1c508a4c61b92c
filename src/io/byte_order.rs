//! Byte order (endianness) handling
//!
//! Multi-byte values read from a [`RandomAccessStream`](crate::io::RandomAccessStream)
//! are decoded according to the stream's configured [`ByteOrder`]. Writes are
//! always big-endian.

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    #[default]
    BigEndian,
}

impl ByteOrder {
    pub fn decode_u16(&self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(bytes),
            ByteOrder::BigEndian => u16::from_be_bytes(bytes),
        }
    }

    pub fn decode_u32(&self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
        }
    }

    pub fn decode_u64(&self, bytes: [u8; 8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(bytes),
            ByteOrder::BigEndian => u64::from_be_bytes(bytes),
        }
    }

    pub fn decode_i16(&self, bytes: [u8; 2]) -> i16 {
        self.decode_u16(bytes) as i16
    }

    pub fn decode_i32(&self, bytes: [u8; 4]) -> i32 {
        self.decode_u32(bytes) as i32
    }

    pub fn decode_i64(&self, bytes: [u8; 8]) -> i64 {
        self.decode_u64(bytes) as i64
    }

    /// Decodes an IEEE-754 single from its bit pattern
    pub fn decode_f32(&self, bytes: [u8; 4]) -> f32 {
        f32::from_bits(self.decode_u32(bytes))
    }

    /// Decodes an IEEE-754 double from its bit pattern
    pub fn decode_f64(&self, bytes: [u8; 8]) -> f64 {
        f64::from_bits(self.decode_u64(bytes))
    }
}
