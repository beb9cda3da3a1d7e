use crate::protocol::error::ProtocolError;
use crate::protocol::ids::NULL_STRING_LEN;

fn take<'a>(bytes: &'a [u8], n: usize, what: &str) -> Result<(&'a [u8], &'a [u8]), ProtocolError> {
    if bytes.len() < n {
        return Err(ProtocolError::NotEnoughBytes(
            format!("for {} (need {} bytes, have {})", what, n, bytes.len())
        ));
    }

    Ok(bytes.split_at(n))
}

pub fn read_u8(bytes: &[u8]) -> Result<(u8, &[u8]), ProtocolError> {
    let (head, rest) = take(bytes, 1, "u8")?;
    Ok((head[0], rest))
}

pub fn read_u16(bytes: &[u8]) -> Result<(u16, &[u8]), ProtocolError> {
    let (head, rest) = take(bytes, 2, "u16")?;
    Ok((u16::from_be_bytes([head[0], head[1]]), rest))
}

pub fn read_u32(bytes: &[u8]) -> Result<(u32, &[u8]), ProtocolError> {
    let (head, rest) = take(bytes, 4, "u32")?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(head);
    Ok((u32::from_be_bytes(raw), rest))
}

pub fn read_u64(bytes: &[u8]) -> Result<(u64, &[u8]), ProtocolError> {
    let (head, rest) = take(bytes, 8, "u64")?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(head);
    Ok((u64::from_be_bytes(raw), rest))
}

/// Reads a u32 count followed by that many raw bytes.
pub fn read_byte_vec(bytes: &[u8]) -> Result<(Vec<u8>, &[u8]), ProtocolError> {
    let (len, rest) = read_u32(bytes)?;
    let (data, rest) = take(rest, len as usize, "byte vector")?;
    Ok((data.to_vec(), rest))
}

/// Reads a u32 byte length followed by UTF-16BE code units.
/// A null string (length `0xFFFFFFFF`) reads as empty.
pub fn read_string(bytes: &[u8]) -> Result<(String, &[u8]), ProtocolError> {
    let (len, rest) = read_u32(bytes)?;

    if len == NULL_STRING_LEN {
        return Ok((String::new(), rest));
    }

    if len % 2 != 0 {
        return Err(ProtocolError::InvalidString(
            format!("odd byte length {} for UTF-16 data", len)
        ));
    }

    let (raw, rest) = take(rest, len as usize, "string")?;
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    let value = String::from_utf16(&units)
        .map_err(|e| ProtocolError::InvalidString(e.to_string()))?;

    Ok((value, rest))
}

pub fn push_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend(value.to_be_bytes());
}

pub fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend(value.to_be_bytes());
}

pub fn push_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend(value.to_be_bytes());
}

pub fn push_byte_vec(buf: &mut Vec<u8>, data: &[u8]) {
    push_u32(buf, data.len() as u32);
    buf.extend_from_slice(data);
}

pub fn push_string(buf: &mut Vec<u8>, value: &str) {
    let units: Vec<u16> = value.encode_utf16().collect();
    push_u32(buf, (units.len() * 2) as u32);
    for unit in units {
        buf.extend(unit.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_utf16_big_endian() {
        let mut buf = Vec::new();
        push_string(&mut buf, "hé");

        assert_eq!(buf, vec![0, 0, 0, 4, 0x00, b'h', 0x00, 0xE9]);
    }

    #[test]
    fn string_outside_bmp_round_trips_through_surrogates() {
        let mut buf = Vec::new();
        push_string(&mut buf, "🎤");
        assert_eq!(&buf[..4], &[0, 0, 0, 4]);

        let (value, rest) = read_string(&buf).unwrap();
        assert_eq!(value, "🎤");
        assert!(rest.is_empty());
    }

    #[test]
    fn null_string_reads_as_empty() {
        let buf = [0xFF, 0xFF, 0xFF, 0xFF, 7];
        let (value, rest) = read_string(&buf).unwrap();

        assert_eq!(value, "");
        assert_eq!(rest, &[7]);
    }

    #[test]
    fn odd_string_length_is_rejected() {
        let buf = [0, 0, 0, 3, 0, b'a', 0];
        assert!(matches!(read_string(&buf), Err(ProtocolError::InvalidString(_))));
    }

    #[test]
    fn unpaired_surrogate_is_rejected() {
        let buf = [0, 0, 0, 2, 0xD8, 0x00];
        assert!(matches!(read_string(&buf), Err(ProtocolError::InvalidString(_))));
    }

    #[test]
    fn truncated_reads_report_missing_bytes() {
        assert!(matches!(read_u64(&[1, 2, 3]), Err(ProtocolError::NotEnoughBytes(_))));
        assert!(matches!(read_byte_vec(&[0, 0, 0, 5, 1]), Err(ProtocolError::NotEnoughBytes(_))));
    }
}
