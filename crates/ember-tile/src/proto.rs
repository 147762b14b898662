// Minimal protocol-buffer wire primitives, enough to walk a vector tile.
use bytes::{Buf, Bytes};

pub(crate) type Result<T> = std::result::Result<T, DecodeError>;

#[derive(thiserror::Error, Debug)]
pub(crate) enum DecodeError {
    #[error("truncated varint")]
    TruncatedVarint,
    #[error("varint overflow")]
    VarintOverflow,
    #[error("truncated field payload")]
    Truncated,
    #[error("unsupported wire type {0}")]
    UnsupportedWireType(u8),
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,
    #[error("value message carried no value")]
    EmptyValue,
    #[error("malformed geometry command stream")]
    BadGeometry,
}

pub(crate) const WIRE_VARINT: u8 = 0;
pub(crate) const WIRE_FIXED64: u8 = 1;
pub(crate) const WIRE_LEN: u8 = 2;
pub(crate) const WIRE_FIXED32: u8 = 5;

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldHeader {
    pub field: u64,
    pub wire: u8,
}

pub(crate) fn read_varint(buf: &mut Bytes) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        if shift >= 64 {
            return Err(DecodeError::VarintOverflow);
        }
        if !buf.has_remaining() {
            return Err(DecodeError::TruncatedVarint);
        }
        let byte = buf.get_u8();
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

// Zigzag decoding maps unsigned varints back to signed deltas.
pub(crate) fn zigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

pub(crate) fn read_field_header(buf: &mut Bytes) -> Result<FieldHeader> {
    let tag = read_varint(buf)?;
    Ok(FieldHeader {
        field: tag >> 3,
        wire: (tag & 0x7) as u8,
    })
}

pub(crate) fn read_len_delimited(buf: &mut Bytes) -> Result<Bytes> {
    let len = read_varint(buf)? as usize;
    if buf.remaining() < len {
        return Err(DecodeError::Truncated);
    }
    Ok(buf.split_to(len))
}

pub(crate) fn read_string(buf: &mut Bytes) -> Result<String> {
    let raw = read_len_delimited(buf)?;
    String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
}

// Unpack a packed repeated varint field into its values.
pub(crate) fn read_packed_varints(buf: &mut Bytes) -> Result<Vec<u64>> {
    let mut raw = read_len_delimited(buf)?;
    let mut out = Vec::new();
    while raw.has_remaining() {
        out.push(read_varint(&mut raw)?);
    }
    Ok(out)
}

pub(crate) fn skip_field(buf: &mut Bytes, wire: u8) -> Result<()> {
    match wire {
        WIRE_VARINT => {
            read_varint(buf)?;
        }
        WIRE_FIXED64 => {
            if buf.remaining() < 8 {
                return Err(DecodeError::Truncated);
            }
            buf.advance(8);
        }
        WIRE_LEN => {
            read_len_delimited(buf)?;
        }
        WIRE_FIXED32 => {
            if buf.remaining() < 4 {
                return Err(DecodeError::Truncated);
            }
            buf.advance(4);
        }
        other => return Err(DecodeError::UnsupportedWireType(other)),
    }
    Ok(())
}
