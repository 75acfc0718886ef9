//! Query-string payloads.

use bytes::Bytes;

use crate::codec::DecodeError;

/// Percent-decode a raw query string. `+` decodes to a space; a `%` that is
/// not followed by two hex digits is rejected.
pub fn decode_query(raw: &str, limit: usize) -> Result<Bytes, DecodeError> {
    if raw.len() > limit {
        return Err(DecodeError::TooLarge { limit });
    }

    let bytes = raw.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(DecodeError::Escape(i));
            }
        }
    }

    let spaced: Vec<u8> = bytes
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    Ok(Bytes::from(urlencoding::decode_binary(&spaced).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_escapes() {
        let out = decode_query("cpu%2Cvalue%3D1", 1024).unwrap();
        assert_eq!(&out[..], b"cpu,value=1");
    }

    #[test]
    fn plus_is_space_but_encoded_plus_is_kept() {
        let out = decode_query("cpu+value%3D1%2B2", 1024).unwrap();
        assert_eq!(&out[..], b"cpu value=1+2");
    }

    #[test]
    fn empty_query() {
        assert!(decode_query("", 1024).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_escapes() {
        assert!(matches!(decode_query("cpu%2", 1024), Err(DecodeError::Escape(3))));
        assert!(matches!(decode_query("cpu%zz", 1024), Err(DecodeError::Escape(3))));
        assert!(matches!(decode_query("%", 1024), Err(DecodeError::Escape(0))));
    }

    #[test]
    fn rejects_oversized_query() {
        assert!(matches!(
            decode_query("abcdef", 5),
            Err(DecodeError::TooLarge { limit: 5 })
        ));
    }
}
