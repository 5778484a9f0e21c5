// src/utils/encoding.rs

//! Response body decoding.
//!
//! Ratio pages are served either as UTF-8 or as legacy EUC-KR without a
//! reliable charset header. UTF-8 is tried first; anything else is decoded
//! as EUC-KR with replacement characters for invalid sequences.

use encoding_rs::EUC_KR;

/// Decoded document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,

    /// Name of the encoding that produced `text`
    pub encoding: &'static str,

    /// True when invalid sequences were replaced
    pub lossy: bool,
}

/// Decode an HTML body, never failing.
pub fn decode_html(bytes: &[u8]) -> Decoded {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Decoded {
            text: text.trim_start_matches('\u{feff}').to_string(),
            encoding: "UTF-8",
            lossy: false,
        };
    }

    let (text, lossy) = EUC_KR.decode_without_bom_handling(bytes);
    if lossy {
        log::warn!(
            "Body is neither valid UTF-8 nor {}; continuing with lossy text",
            EUC_KR.name()
        );
    }

    Decoded {
        text: text.into_owned(),
        encoding: EUC_KR.name(),
        lossy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let decoded = decode_html("경쟁률 3.5 : 1".as_bytes());
        assert_eq!(decoded.text, "경쟁률 3.5 : 1");
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let decoded = decode_html(b"\xEF\xBB\xBF<html></html>");
        assert_eq!(decoded.text, "<html></html>");
    }

    #[test]
    fn test_euc_kr_fallback() {
        let (bytes, _, _) = EUC_KR.encode("모집인원");
        let decoded = decode_html(&bytes);
        assert_eq!(decoded.text, "모집인원");
        assert_eq!(decoded.encoding, "EUC-KR");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_garbage_is_lossy_not_fatal() {
        let decoded = decode_html(&[0x41, 0xFF, 0x42]);
        assert!(decoded.lossy);
        assert!(decoded.text.starts_with('A'));
        assert!(decoded.text.ends_with('B'));
    }
}
