use futures_util::{Stream, TryStreamExt};
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use super::{CommandOutput, LogOutput};
use crate::{
    error::{Error, TransportError},
    modem::{Framing, LogOutputDecoder},
};

/// A stream of output entries from a logs, attach or exec response.
///
/// Wraps the raw response bytes and splits them into [`LogOutput`] entries,
/// demultiplexing stdout and stderr when the daemon frames them.
#[pin_project]
pub struct LogOutputStream {
    #[pin]
    inner: FramedRead<Box<dyn AsyncRead + Send + Unpin>, LogOutputDecoder>,
}

impl LogOutputStream {
    /// Creates a new `LogOutputStream` reading from `reader`.
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static, framing: Framing) -> Self {
        Self {
            inner: FramedRead::new(Box::new(reader), LogOutputDecoder::new(framing)),
        }
    }

    /// Reads the stream to its end and collects everything it produced.
    pub async fn collect_output(self) -> Result<CommandOutput, Error> {
        self.try_fold(CommandOutput::default(), |mut output, entry| async move {
            output.extend([entry]);
            Ok(output)
        })
        .await
    }
}

impl Stream for LogOutputStream {
    type Item = Result<LogOutput, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx).map(|option| {
            option.map(|result| result.map_err(|e| TransportError::Stream(e).into()))
        })
    }
}
