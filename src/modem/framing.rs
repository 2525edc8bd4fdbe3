use std::io;

use bytes::{Buf, BytesMut};
use http::{HeaderMap, header};
use tokio_util::codec::Decoder;

use crate::models::LogOutput;

const HEADER_LEN: usize = 8;

/// Largest frame payload accepted from the wire.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// How the bytes of an attach, exec or logs stream are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Frames of `[stream, 0, 0, 0, len (u32 big endian)]` followed by `len` bytes.
    Multiplexed,
    /// Unframed bytes, as produced by containers with a TTY.
    Raw,
    /// Decide from the first bytes: raw as soon as they cannot start a frame header,
    /// multiplexed once a full header has been seen.
    Detect,
}

impl Framing {
    /// Picks the framing advertised by the daemon's `Content-Type`.
    pub fn from_headers(headers: &HeaderMap) -> Framing {
        match headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            Some(ct) if ct.starts_with("application/vnd.docker.multiplexed-stream") => {
                Framing::Multiplexed
            }
            Some(ct) if ct.starts_with("application/vnd.docker.raw-stream") => Framing::Raw,
            _ => Framing::Detect,
        }
    }
}

/// Splits a stream into [`LogOutput`] entries.
#[derive(Debug, Clone)]
pub struct LogOutputDecoder {
    framing: Framing,
}

impl LogOutputDecoder {
    pub fn new(framing: Framing) -> Self {
        LogOutputDecoder { framing }
    }

    /// `None` while the bytes seen so far could still open a frame header.
    fn detect(prefix: &[u8]) -> Option<Framing> {
        let could_be_header = prefix
            .iter()
            .take(4)
            .enumerate()
            .all(|(i, &b)| if i == 0 { b <= 2 } else { b == 0 });

        if !could_be_header {
            Some(Framing::Raw)
        } else if prefix.len() >= HEADER_LEN {
            Some(Framing::Multiplexed)
        } else {
            None
        }
    }
}

impl Decoder for LogOutputDecoder {
    type Item = LogOutput;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<LogOutput>, io::Error> {
        if self.framing == Framing::Detect {
            match Self::detect(src) {
                Some(framing) => self.framing = framing,
                None => return Ok(None),
            }
        }

        match self.framing {
            Framing::Raw | Framing::Detect => {
                if src.is_empty() {
                    return Ok(None);
                }
                Ok(Some(LogOutput::Console {
                    message: src.split().freeze(),
                }))
            }
            Framing::Multiplexed => {
                if src.len() < HEADER_LEN {
                    return Ok(None);
                }

                let len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]) as usize;
                if len > MAX_FRAME_LEN {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("multiplexed frame of {len} bytes exceeds {MAX_FRAME_LEN}"),
                    ));
                }
                if src.len() < HEADER_LEN + len {
                    src.reserve(HEADER_LEN + len - src.len());
                    return Ok(None);
                }

                let kind = src[0];
                src.advance(HEADER_LEN);
                let message = src.split_to(len).freeze();

                match kind {
                    0 => Ok(Some(LogOutput::StdIn { message })),
                    1 => Ok(Some(LogOutput::StdOut { message })),
                    2 => Ok(Some(LogOutput::StdErr { message })),
                    other => Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unknown stream type {other} in multiplexed frame"),
                    )),
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<LogOutput>, io::Error> {
        if let Some(output) = self.decode(src)? {
            return Ok(Some(output));
        }
        if src.is_empty() {
            return Ok(None);
        }

        match self.framing {
            // Shorter than a frame header, so it cannot be multiplexed.
            Framing::Detect => {
                self.framing = Framing::Raw;
                self.decode(src)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended inside a frame ({} bytes left)", src.len()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;

    fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![kind, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn decode_all(framing: Framing, input: &[u8]) -> Vec<LogOutput> {
        let mut decoder = LogOutputDecoder::new(framing);
        let mut buf = BytesMut::from(input);
        let mut out = Vec::new();
        while let Some(item) = decoder.decode_eof(&mut buf).unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_multiplexed_frames() {
        let mut input = frame(1, b"test\n");
        input.extend(frame(2, b"oops\n"));
        input.extend(frame(0, b""));

        assert_eq!(
            decode_all(Framing::Multiplexed, &input),
            vec![
                LogOutput::StdOut {
                    message: Bytes::from_static(b"test\n")
                },
                LogOutput::StdErr {
                    message: Bytes::from_static(b"oops\n")
                },
                LogOutput::StdIn {
                    message: Bytes::new()
                },
            ]
        );
    }

    #[test]
    fn test_partial_frame_waits_for_more() {
        let input = frame(1, b"hello world");
        let mut decoder = LogOutputDecoder::new(Framing::Multiplexed);
        let mut buf = BytesMut::from(&input[..10]);

        assert_eq!(decoder.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(&input[10..]);
        assert_eq!(
            decoder.decode(&mut buf).unwrap(),
            Some(LogOutput::StdOut {
                message: Bytes::from_static(b"hello world")
            })
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_truncated_frame_at_eof_is_an_error() {
        let input = frame(1, b"hello world");
        let mut decoder = LogOutputDecoder::new(Framing::Multiplexed);
        let mut buf = BytesMut::from(&input[..12]);

        let err = decoder.decode_eof(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_unknown_stream_type() {
        let input = frame(1, b"ok");
        let mut bad = input.clone();
        bad[0] = 7;
        let mut decoder = LogOutputDecoder::new(Framing::Multiplexed);

        let err = decoder.decode(&mut BytesMut::from(&bad[..])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_raw_stream_is_console() {
        assert_eq!(
            decode_all(Framing::Raw, b"root@host:/# "),
            vec![LogOutput::Console {
                message: Bytes::from_static(b"root@host:/# ")
            }]
        );
    }

    #[test]
    fn test_detect_multiplexed() {
        let input = frame(1, b"test\n");
        assert_eq!(
            decode_all(Framing::Detect, &input),
            vec![LogOutput::StdOut {
                message: Bytes::from_static(b"test\n")
            }]
        );
    }

    #[test]
    fn test_detect_raw() {
        assert_eq!(
            decode_all(Framing::Detect, b"plain text output"),
            vec![LogOutput::Console {
                message: Bytes::from_static(b"plain text output")
            }]
        );
    }

    #[test]
    fn test_detect_short_input_is_raw() {
        assert_eq!(
            decode_all(Framing::Detect, b"hi\n"),
            vec![LogOutput::Console {
                message: Bytes::from_static(b"hi\n")
            }]
        );
    }

    #[test]
    fn test_detect_short_prompt_is_not_held_back() {
        let mut decoder = LogOutputDecoder::new(Framing::Detect);
        let mut buf = BytesMut::from(&b"$ "[..]);

        assert_eq!(
            decoder.decode(&mut buf).unwrap(),
            Some(LogOutput::Console {
                message: Bytes::from_static(b"$ ")
            })
        );
    }

    #[test]
    fn test_detect_waits_on_possible_header() {
        let input = frame(2, b"err");
        let mut decoder = LogOutputDecoder::new(Framing::Detect);
        let mut buf = BytesMut::from(&input[..5]);

        assert_eq!(decoder.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(&input[5..]);
        assert_eq!(
            decoder.decode(&mut buf).unwrap(),
            Some(LogOutput::StdErr {
                message: Bytes::from_static(b"err")
            })
        );
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let mut header = vec![1, 0, 0, 0];
        header.extend_from_slice(&(MAX_FRAME_LEN as u32 + 1).to_be_bytes());
        let mut decoder = LogOutputDecoder::new(Framing::Multiplexed);
        let mut buf = BytesMut::from(&header[..]);

        let err = decoder.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(buf.capacity() < MAX_FRAME_LEN);
    }

    #[test]
    fn test_framing_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(Framing::from_headers(&headers), Framing::Detect);

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/vnd.docker.multiplexed-stream"),
        );
        assert_eq!(Framing::from_headers(&headers), Framing::Multiplexed);

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/vnd.docker.raw-stream"),
        );
        assert_eq!(Framing::from_headers(&headers), Framing::Raw);
    }
}
