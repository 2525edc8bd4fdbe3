use bytes::Bytes;

/// Represents a single log output entry from a container.
///
/// Attach, exec and logs streams interleave several standard streams. Each
/// entry records which stream a chunk came from. Output of containers that
/// run with a TTY is not multiplexed and arrives as [`LogOutput::Console`].
///
/// # Accessing Log Content
///
/// You can access the log content via pattern matching or helper methods:
///
/// ```rust
/// use docker_modem::models::LogOutput;
/// use bytes::Bytes;
///
/// let log = LogOutput::StdOut {
///     message: Bytes::from("Hello, world!\n"),
/// };
///
/// // Pattern matching
/// match log {
///     LogOutput::StdOut { message } => {
///         println!("stdout: {:?}", message);
///     }
///     LogOutput::StdErr { message } => {
///         println!("stderr: {:?}", message);
///     }
///     _ => {}
/// }
///
/// // Or use helper methods
/// let log = LogOutput::StdOut {
///     message: Bytes::from("Hello, world!\n"),
/// };
/// println!("Message: {}", log.as_str_lossy());
/// println!("Bytes: {:?}", log.as_bytes());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    /// Standard output log entry
    StdOut {
        /// The log message content
        message: Bytes,
    },
    /// Standard error log entry
    StdErr {
        /// The log message content
        message: Bytes,
    },
    /// Standard input log entry
    StdIn {
        /// The log message content
        message: Bytes,
    },
    /// Unframed output of a TTY
    Console {
        /// The log message content
        message: Bytes,
    },
}

impl LogOutput {
    /// Returns the message content as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            LogOutput::StdOut { message } => message.as_ref(),
            LogOutput::StdErr { message } => message.as_ref(),
            LogOutput::StdIn { message } => message.as_ref(),
            LogOutput::Console { message } => message.as_ref(),
        }
    }

    /// Consumes the entry and returns its content.
    pub fn into_bytes(self) -> Bytes {
        match self {
            LogOutput::StdOut { message }
            | LogOutput::StdErr { message }
            | LogOutput::StdIn { message }
            | LogOutput::Console { message } => message,
        }
    }

    /// Returns the message content as a UTF-8 string, replacing invalid sequences.
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Returns true if this is a stdout log entry.
    pub fn is_stdout(&self) -> bool {
        matches!(self, LogOutput::StdOut { .. })
    }

    /// Returns true if this is a stderr log entry.
    pub fn is_stderr(&self) -> bool {
        matches!(self, LogOutput::StdErr { .. })
    }

    /// Returns true if this is a stdin log entry.
    pub fn is_stdin(&self) -> bool {
        matches!(self, LogOutput::StdIn { .. })
    }

    /// Returns true if this is a console log entry.
    pub fn is_console(&self) -> bool {
        matches!(self, LogOutput::Console { .. })
    }
}

impl std::fmt::Display for LogOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

/// Everything a finished exec or attach session wrote, split by stream.
///
/// TTY output has no stream information and is collected as stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Stdout split into lines.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout_lossy().lines().map(str::to_string).collect()
    }

    /// Stderr split into lines.
    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr_lossy().lines().map(str::to_string).collect()
    }
}

impl Extend<LogOutput> for CommandOutput {
    fn extend<I: IntoIterator<Item = LogOutput>>(&mut self, iter: I) {
        for output in iter {
            match output {
                LogOutput::StdOut { message } | LogOutput::Console { message } => {
                    self.stdout.extend_from_slice(&message)
                }
                LogOutput::StdErr { message } => self.stderr.extend_from_slice(&message),
                LogOutput::StdIn { .. } => {}
            }
        }
    }
}
