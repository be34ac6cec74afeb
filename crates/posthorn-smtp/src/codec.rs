//! Body encoding for the DATA phase: CRLF canonicalization, dot-stuffing
//! (RFC 5321 section 4.5.2) and the end-of-body terminator.
//!
//! The encoder is streaming: the body arrives in arbitrarily split chunks
//! and the last written byte is tracked across calls, so a line boundary or
//! a CR/LF pair may straddle two chunks.

/// Streaming body encoder.
///
/// In encoding mode, a bare `\n` not preceded by `\r` becomes `\r\n` and a
/// line-leading `.` is doubled. In passthrough mode chunks are forwarded
/// untouched for callers that pre-encode; only the trailing bytes are
/// tracked so the terminator comes out right.
#[derive(Debug)]
pub struct BodyEncoder {
    encode: bool,
    // Last two bytes written to the wire. Seeded with CRLF: the body starts
    // at a line boundary, and an empty body terminates as just ".\r\n".
    prev: u8,
    prev2: u8,
}

impl BodyEncoder {
    /// Creates an encoder; `encode` false means passthrough mode.
    #[must_use]
    pub const fn new(encode: bool) -> Self {
        Self {
            encode,
            prev: b'\n',
            prev2: b'\r',
        }
    }

    /// Encodes one chunk of body data.
    #[must_use]
    pub fn encode_chunk(&mut self, chunk: &[u8]) -> Vec<u8> {
        if !self.encode {
            for &byte in chunk {
                self.push_raw(byte);
            }
            return chunk.to_vec();
        }

        let mut out = Vec::with_capacity(chunk.len() + chunk.len() / 64 + 2);
        for &byte in chunk {
            match byte {
                b'\n' if self.prev != b'\r' => {
                    out.push(b'\r');
                    self.push_raw(b'\r');
                    out.push(b'\n');
                    self.push_raw(b'\n');
                }
                b'.' if self.prev == b'\n' => {
                    out.push(b'.');
                    out.push(b'.');
                    self.push_raw(b'.');
                }
                _ => {
                    out.push(byte);
                    self.push_raw(byte);
                }
            }
        }
        out
    }

    /// The end-of-body terminator: `.\r\n` when the stream already ended in
    /// CRLF, otherwise `\r\n.\r\n`.
    #[must_use]
    pub const fn finish(&self) -> &'static [u8] {
        if self.prev2 == b'\r' && self.prev == b'\n' {
            b".\r\n"
        } else {
            b"\r\n.\r\n"
        }
    }

    const fn push_raw(&mut self, byte: u8) {
        self.prev2 = self.prev;
        self.prev = byte;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_all(chunks: &[&[u8]]) -> Vec<u8> {
        let mut encoder = BodyEncoder::new(true);
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend_from_slice(&encoder.encode_chunk(chunk));
        }
        out.extend_from_slice(encoder.finish());
        out
    }

    /// The receiver side: strip the terminator, un-stuff leading dots.
    /// Used to check the encoding round-trips.
    fn decode(wire: &[u8]) -> Vec<u8> {
        let body = wire.strip_suffix(b".\r\n").unwrap();
        let mut out = Vec::new();
        let mut at_line_start = true;
        let mut bytes = body.iter().copied().peekable();
        while let Some(byte) = bytes.next() {
            if at_line_start && byte == b'.' {
                // Stuffed dot; drop the escape.
                out.push(bytes.next().unwrap());
                at_line_start = false;
                continue;
            }
            at_line_start = byte == b'\n';
            out.push(byte);
        }
        out
    }

    #[test]
    fn lone_dot_line_is_stuffed() {
        let wire = encode_all(&[b"a\r\n.\r\nb\r\n"]);
        assert_eq!(wire, b"a\r\n..\r\nb\r\n.\r\n");
        assert_eq!(decode(&wire), b"a\r\n.\r\nb\r\n");
    }

    #[test]
    fn leading_dot_at_stream_start_is_stuffed() {
        let wire = encode_all(&[b".hidden\r\n"]);
        assert_eq!(wire, b"..hidden\r\n.\r\n");
    }

    #[test]
    fn mid_line_dot_untouched() {
        let wire = encode_all(&[b"a.b\r\n"]);
        assert_eq!(wire, b"a.b\r\n.\r\n");
    }

    #[test]
    fn bare_lf_becomes_crlf() {
        let wire = encode_all(&[b"one\ntwo\n"]);
        assert_eq!(wire, b"one\r\ntwo\r\n.\r\n");
    }

    #[test]
    fn existing_crlf_is_kept() {
        let wire = encode_all(&[b"one\r\ntwo\r\n"]);
        assert_eq!(wire, b"one\r\ntwo\r\n.\r\n");
    }

    #[test]
    fn body_without_trailing_newline_gets_full_terminator() {
        let wire = encode_all(&[b"no newline"]);
        assert_eq!(wire, b"no newline\r\n.\r\n");
    }

    #[test]
    fn empty_body_terminates_immediately() {
        let wire = encode_all(&[]);
        assert_eq!(wire, b".\r\n");
    }

    #[test]
    fn state_tracks_across_chunk_split() {
        // CR and LF split across chunks must not double the CR.
        let wire = encode_all(&[b"line\r", b"\n.x\r\n"]);
        assert_eq!(wire, b"line\r\n..x\r\n.\r\n");
        // Dot right after a chunk ending in LF must still be stuffed.
        let wire = encode_all(&[b"line\n", b".x"]);
        assert_eq!(wire, b"line\r\n..x\r\n.\r\n");
    }

    #[test]
    fn passthrough_mode_only_tracks_terminator() {
        let mut encoder = BodyEncoder::new(false);
        let out = encoder.encode_chunk(b".already stuffed by caller\n");
        assert_eq!(out, b".already stuffed by caller\n");
        assert_eq!(encoder.finish(), b"\r\n.\r\n");

        let mut encoder = BodyEncoder::new(false);
        let _ = encoder.encode_chunk(b"done\r\n");
        assert_eq!(encoder.finish(), b".\r\n");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Decoding at the receiver restores the canonicalized body,
            /// regardless of how the input was chunked.
            #[test]
            fn round_trips_any_body(body in proptest::collection::vec(any::<u8>(), 0..512),
                                    split in 0usize..512) {
                let split = split.min(body.len());
                let wire = encode_all(&[&body[..split], &body[split..]]);

                // What the wire should decode to: the body with bare LF
                // canonicalized and a final CRLF appended if missing.
                let mut expected = Vec::new();
                let mut prev = 0u8;
                for &b in &body {
                    if b == b'\n' && prev != b'\r' {
                        expected.push(b'\r');
                    }
                    expected.push(b);
                    prev = b;
                }
                if !expected.ends_with(b"\r\n") {
                    expected.extend_from_slice(b"\r\n");
                }

                prop_assert_eq!(decode(&wire), expected);
            }

            /// No line of the encoded wire starts with a single dot except
            /// the terminator.
            #[test]
            fn no_unstuffed_dot_lines(body in proptest::collection::vec(any::<u8>(), 0..512)) {
                let wire = encode_all(&[&body]);
                let without_terminator = &wire[..wire.len() - 3];
                for line in without_terminator.split(|&b| b == b'\n') {
                    if line.starts_with(b".") {
                        prop_assert!(line.starts_with(b".."));
                    }
                }
            }
        }
    }
}
