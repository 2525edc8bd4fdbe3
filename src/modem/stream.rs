use std::{
    fmt, io,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures_util::{Stream as FuturesStream, StreamExt, TryStreamExt, future};
use http_body_util::BodyExt;
use hyper::{body::Incoming, upgrade::Upgraded};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf, WriteHalf};
use tokio_util::{
    codec::{FramedRead, LinesCodec, LinesCodecError},
    io::StreamReader,
};

use super::framing::Framing;
use crate::{
    error::{Error, ProtocolError, TransportError},
    models::LogOutputStream,
};

type Chunks = Pin<Box<dyn FuturesStream<Item = io::Result<Bytes>> + Send>>;

enum Inner {
    /// Response body of a regular request.
    Body(StreamReader<Chunks, Bytes>),
    /// Connection taken over after `101 Switching Protocols`.
    Upgraded(TokioIo<Upgraded>),
    /// Body that was read in full before being handed out.
    Buffered(io::Cursor<Bytes>),
}

/// A live channel bound to one HTTP connection.
///
/// Read-only streams carry a response body (logs, stats, events, archives). Duplex streams
/// carry a hijacked attach or exec session and can be written to as well. The connection
/// is released when the stream is closed or dropped.
pub struct Stream {
    inner: Inner,
    framing: Framing,
}

impl Stream {
    pub(crate) fn from_body(body: Incoming, framing: Framing) -> Self {
        let chunks: Chunks = Box::pin(body.into_data_stream().map_err(io::Error::other));
        Stream {
            inner: Inner::Body(StreamReader::new(chunks)),
            framing,
        }
    }

    pub(crate) fn from_upgraded(upgraded: Upgraded, framing: Framing) -> Self {
        Stream {
            inner: Inner::Upgraded(TokioIo::new(upgraded)),
            framing,
        }
    }

    /// A read-only stream over bytes that are already in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>, framing: Framing) -> Self {
        Stream {
            inner: Inner::Buffered(io::Cursor::new(bytes.into())),
            framing,
        }
    }

    /// How the daemon frames the bytes of this stream.
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Returns true when the stream accepts writes.
    pub fn is_duplex(&self) -> bool {
        matches!(self.inner, Inner::Upgraded(_))
    }

    /// Reads the stream to its end.
    pub async fn bytes(mut self) -> io::Result<Bytes> {
        if let Inner::Buffered(cursor) = &self.inner {
            if cursor.position() == 0 {
                return Ok(cursor.get_ref().clone());
            }
        }

        let mut buf = Vec::new();
        self.read_to_end(&mut buf).await?;
        Ok(buf.into())
    }

    /// Reads the stream to its end and returns an in-memory stream with the same framing.
    pub async fn buffer(self) -> io::Result<Stream> {
        let framing = self.framing;
        Ok(Stream::from_bytes(self.bytes().await?, framing))
    }

    /// Shuts down the write half of a duplex stream and releases the connection.
    pub async fn close(mut self) -> io::Result<()> {
        if self.is_duplex() {
            self.shutdown().await?;
        }
        Ok(())
    }

    /// Demultiplexes the stream into stdout/stderr entries.
    pub fn output(self) -> LogOutputStream {
        let framing = self.framing;
        LogOutputStream::new(self, framing)
    }

    /// Splits a duplex stream into its demultiplexed output and a writer for stdin.
    pub fn split(self) -> (LogOutputStream, WriteHalf<Stream>) {
        let framing = self.framing;
        let (reader, writer) = tokio::io::split(self);
        (LogOutputStream::new(reader, framing), writer)
    }

    /// Decodes newline-delimited JSON, as sent by pull, push, stats and events.
    pub fn json_lines<T>(self) -> impl FuturesStream<Item = Result<T, Error>> + Send + 'static
    where
        T: DeserializeOwned + 'static,
    {
        FramedRead::new(self, LinesCodec::new())
            .try_filter(|line| future::ready(!line.trim().is_empty()))
            .map(|line| -> Result<T, Error> {
                let line = line.map_err(|e| match e {
                    LinesCodecError::Io(e) => TransportError::Stream(e),
                    LinesCodecError::MaxLineLengthExceeded => TransportError::Stream(
                        io::Error::new(io::ErrorKind::InvalidData, "line too long"),
                    ),
                })?;
                serde_json::from_str(&line).map_err(|source| {
                    ProtocolError::Json {
                        source,
                        body: Bytes::from(line),
                    }
                    .into()
                })
            })
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.inner {
            Inner::Body(_) => "body",
            Inner::Upgraded(_) => "upgraded",
            Inner::Buffered(_) => "buffered",
        };
        f.debug_struct("Stream")
            .field("kind", &kind)
            .field("framing", &self.framing)
            .finish()
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            Inner::Body(reader) => Pin::new(reader).poll_read(cx, buf),
            Inner::Upgraded(io) => Pin::new(io).poll_read(cx, buf),
            Inner::Buffered(cursor) => Pin::new(cursor).poll_read(cx, buf),
        }
    }
}

fn read_only() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "stream is read-only")
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().inner {
            Inner::Upgraded(io) => Pin::new(io).poll_write(cx, buf),
            _ => Poll::Ready(Err(read_only())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            Inner::Upgraded(io) => Pin::new(io).poll_flush(cx),
            _ => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            Inner::Upgraded(io) => Pin::new(io).poll_shutdown(cx),
            _ => Poll::Ready(Ok(())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogOutput;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_buffered_stream_reads_back() {
        let stream = Stream::from_bytes("hello", Framing::Raw);
        assert!(!stream.is_duplex());
        assert_eq!(stream.bytes().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_write_to_read_only_stream_fails() {
        let mut stream = Stream::from_bytes("x", Framing::Raw);
        let err = stream.write_all(b"input").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        // Closing a read-only stream is a no-op.
        stream.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_output_demultiplexes() {
        let bytes = [&[1u8, 0, 0, 0, 0, 0, 0, 5][..], b"test\n"].concat();
        let output = Stream::from_bytes(bytes, Framing::Detect)
            .output()
            .collect_output()
            .await
            .unwrap();
        assert_eq!(output.stdout, b"test\n".to_vec());
    }

    #[tokio::test]
    async fn test_json_lines() {
        let body = "{\"status\":\"Pulling\"}\r\n\r\n{\"status\":\"Done\",\"progress\":1}\n";
        let items: Vec<Value> = Stream::from_bytes(body, Framing::Raw)
            .json_lines()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(
            items,
            vec![json!({"status": "Pulling"}), json!({"status": "Done", "progress": 1})]
        );
    }

    #[tokio::test]
    async fn test_json_lines_bad_line() {
        let items: Vec<Result<Value, Error>> = Stream::from_bytes("{\"ok\":1}\nnot json\n", Framing::Raw)
            .json_lines()
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(
            &items[1],
            Err(Error::Protocol(ProtocolError::Json { body, .. })) if body == &Bytes::from_static(b"not json")
        ));
    }

    #[tokio::test]
    async fn test_buffer_keeps_framing() {
        let stream = Stream::from_bytes(vec![2u8, 0, 0, 0, 0, 0, 0, 1, b'!'], Framing::Multiplexed)
            .buffer()
            .await
            .unwrap();
        assert_eq!(stream.framing(), Framing::Multiplexed);

        let entries: Vec<LogOutput> = stream.output().try_collect().await.unwrap();
        assert_eq!(
            entries,
            vec![LogOutput::StdErr {
                message: Bytes::from_static(b"!")
            }]
        );
    }
}
