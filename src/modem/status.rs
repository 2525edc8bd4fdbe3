/// Tag used for status codes that an endpoint's table does not declare.
pub const UNEXPECTED_STATUS: &str = "unexpected status";

/// What a single status code means for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// The call succeeded.
    Success,
    /// The call failed; the string is a human-readable category such as `"no such container"`.
    Failure(&'static str),
}

/// Per-endpoint mapping from HTTP status code to outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTable(pub &'static [(u16, Expect)]);

impl StatusTable {
    /// Looks up a status code.
    pub fn get(&self, status: u16) -> Option<Expect> {
        self.0
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, expect)| *expect)
    }

    /// Returns true when the code is mapped to [`Expect::Success`].
    pub fn accepts(&self, status: u16) -> bool {
        self.get(status) == Some(Expect::Success)
    }
}

/// Result of classifying a response status against a [`StatusTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<B> {
    Success(B),
    Failure {
        tag: &'static str,
        status: u16,
        body: B,
    },
}

/// Classifies a response status.
///
/// Codes missing from the table are failures tagged [`UNEXPECTED_STATUS`].
pub fn classify<B>(table: &StatusTable, status: u16, body: B) -> Outcome<B> {
    match table.get(status) {
        Some(Expect::Success) => Outcome::Success(body),
        Some(Expect::Failure(tag)) => Outcome::Failure { tag, status, body },
        None => Outcome::Failure {
            tag: UNEXPECTED_STATUS,
            status,
            body,
        },
    }
}
