use avbrowse_pdu::PduId;

/// Errors that can occur while driving a browsing session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Link-level error.
    #[error("link error: {0}")]
    Link(#[from] avbrowse_link::LinkError),

    /// Codec error.
    #[error("pdu error: {0}")]
    Pdu(#[from] avbrowse_pdu::PduError),

    /// The command queue is at capacity.
    #[error("command queue full ({0} queued)")]
    QueueFull(usize),

    /// A response was awaited with no command outstanding.
    #[error("no command pending")]
    NoPendingCommand,

    /// The target answered with a different operation than the one pending.
    #[error("expected {expected} response, received {received}")]
    UnexpectedResponse { expected: PduId, received: PduId },
}

pub type Result<T> = std::result::Result<T, SessionError>;
