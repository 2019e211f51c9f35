use bytes::BytesMut;

use crate::protocol::TransferError;

/// Shift `buf[offset + length ..]` left by `length` bytes and shorten the
/// buffer, in place.
///
/// Preconditions: `length > 0` and `offset + length <= buf.len()`.
pub fn remove_block(buf: &mut BytesMut, offset: usize, length: usize) {
    debug_assert!(length > 0);
    debug_assert!(offset + length <= buf.len());

    let total = buf.len();
    buf.copy_within(offset + length..total, offset);
    buf.truncate(total - length);
}

/// Smallest `i` such that `haystack[i..i + needle.len()] == needle`.
pub fn substring_index(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Parse a run of hex digits, most-significant first, returning the value
/// and the digit count.
///
/// Both cases are accepted; the first non-hex byte terminates the run
/// (the CRLF after a chunk size is the canonical terminator, so a zero
/// digit count is the caller's concern, not an error here). Overflow is
/// an error.
pub fn decode_hex(src: &[u8]) -> Result<(u64, usize), TransferError> {
    let mut value: u64 = 0;
    let mut width = 0;

    for &b in src {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => break,
        };
        value = value
            .checked_mul(16)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or(TransferError::InvalidChunkSize { reason: "chunk size overflow" })?;
        width += 1;
    }

    Ok((value, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_block_middle() {
        let mut buf = BytesMut::from(&b"WikiXXpedia"[..]);
        remove_block(&mut buf, 4, 2);
        assert_eq!(&buf[..], b"Wikipedia");
    }

    #[test]
    fn remove_block_front_and_tail() {
        let mut buf = BytesMut::from(&b"4\r\nWiki"[..]);
        remove_block(&mut buf, 0, 3);
        assert_eq!(&buf[..], b"Wiki");

        remove_block(&mut buf, 3, 1);
        assert_eq!(&buf[..], b"Wik");
    }

    #[test]
    fn substring_index_finds_first() {
        assert_eq!(substring_index(b"a\r\nb\r\n", b"\r\n"), Some(1));
        assert_eq!(substring_index(b"abcd\r\n\r\n", b"\r\n\r\n"), Some(4));
        assert_eq!(substring_index(b"\r\nrest", b"\r\n"), Some(0));
    }

    #[test]
    fn substring_index_absent() {
        assert_eq!(substring_index(b"abc", b"\r\n"), None);
        assert_eq!(substring_index(b"\r", b"\r\n"), None);
        assert_eq!(substring_index(b"", b"\r\n"), None);
    }

    #[test]
    fn decode_hex_both_cases() {
        assert_eq!(decode_hex(b"4\r\n").unwrap(), (4, 1));
        assert_eq!(decode_hex(b"1a2B\r\n").unwrap(), (0x1a2b, 4));
        assert_eq!(decode_hex(b"FF;ext\r\n").unwrap(), (255, 2));
    }

    #[test]
    fn decode_hex_stops_at_non_hex() {
        assert_eq!(decode_hex(b"10 \r\n").unwrap(), (16, 2));
        assert_eq!(decode_hex(b"\r\n").unwrap(), (0, 0));
    }

    #[test]
    fn decode_hex_overflow() {
        let err = decode_hex(b"ffffffffffffffff0").unwrap_err();
        assert!(matches!(err, TransferError::InvalidChunkSize { .. }));
    }
}
