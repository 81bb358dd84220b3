use std::collections::VecDeque;

use avbrowse_link::Transport;
use avbrowse_packet::Packet;
use avbrowse_pdu::{BrowseCommand, BrowseResponse, PduError, PduId, Scope, StatusCode};
use tracing::{debug, warn};

use crate::config::{CharsetPolicy, SessionConfig};
use crate::error::{Result, SessionError};

/// Outcome of [`BrowseSession::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// Sent to the target right away.
    Sent,
    /// Held until the outstanding command completes.
    Queued,
}

/// A finished command: its response and the scope the command named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub scope: Option<Scope>,
    pub response: BrowseResponse,
}

impl Completion {
    pub fn pdu_id(&self) -> PduId {
        self.response.pdu_id()
    }
}

/// What the session remembers about a command on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    pdu: PduId,
    scope: Option<Scope>,
}

/// A command already encoded and waiting for its turn.
struct Queued {
    command: Outstanding,
    frame: Packet,
}

impl Queued {
    fn assemble(command: &BrowseCommand) -> Result<Self> {
        Ok(Self {
            command: Outstanding {
                pdu: command.pdu_id(),
                scope: command.scope(),
            },
            frame: command.assemble()?,
        })
    }
}

/// Controller side of one browsing channel.
///
/// The target answers commands in order, one at a time. The session keeps
/// at most one command outstanding and queues the rest, sending the next
/// one as soon as the previous response (or its expiry) comes in. It also
/// remembers the most recent UID counter the target reported.
///
/// Commands are encoded when submitted, so a command that cannot be encoded
/// is rejected by [`submit`](Self::submit) and never reaches the queue. A
/// queued command that fails to send is dropped and the one behind it is
/// tried. The response being delivered is still returned, and the first send
/// error is reported by the next [`receive`](Self::receive) or by
/// [`take_send_error`](Self::take_send_error).
pub struct BrowseSession<T> {
    transport: T,
    config: SessionConfig,
    pending: Option<Outstanding>,
    queue: VecDeque<Queued>,
    uid_counter: Option<u16>,
    send_error: Option<SessionError>,
}

impl<T: Transport> BrowseSession<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            pending: None,
            queue: VecDeque::new(),
            uid_counter: None,
            send_error: None,
        }
    }

    /// Send `command`, or queue it behind the outstanding one.
    pub fn submit(&mut self, command: impl Into<BrowseCommand>) -> Result<Submitted> {
        let command: BrowseCommand = command.into();
        let queued = Queued::assemble(&command)?;
        if self.pending.is_none() {
            self.send_now(queued)?;
            return Ok(Submitted::Sent);
        }
        if self.queue.len() >= self.config.max_queued_commands {
            return Err(SessionError::QueueFull(self.queue.len()));
        }
        debug!(pdu = %queued.command.pdu, queued = self.queue.len() + 1, "queued command");
        self.queue.push_back(queued);
        Ok(Submitted::Queued)
    }

    /// Receive and decode the response to the outstanding command.
    ///
    /// A response for a different operation leaves the command outstanding.
    /// Any other outcome, decode failures included, completes it and sends
    /// the next queued command. A send failure left over from an earlier
    /// completion is returned first.
    pub fn receive(&mut self) -> Result<Completion> {
        if let Some(err) = self.send_error.take() {
            return Err(err);
        }
        let expected = self.pending.ok_or(SessionError::NoPendingCommand)?;
        let mut packet = self.transport.receive()?;

        let response = match BrowseResponse::disassemble(&mut packet) {
            Ok(response) => response,
            Err(err) => {
                warn!(pdu = %expected.pdu, %err, "undecodable response");
                self.advance();
                return Err(err.into());
            }
        };

        let received = response.pdu_id();
        if received != expected.pdu {
            warn!(expected = %expected.pdu, %received, "response for another command");
            return Err(SessionError::UnexpectedResponse {
                expected: expected.pdu,
                received,
            });
        }

        self.track_uid_counter(&response);
        let outcome = self.apply_charset_policy(response);
        self.advance();
        outcome.map(|response| Completion {
            scope: expected.scope,
            response,
        })
    }

    /// Give up on the outstanding command, as after a response timeout.
    ///
    /// Returns a stand-in response with status `InternalError`, or `None`
    /// when nothing was outstanding.
    pub fn expire_pending(&mut self) -> Option<Completion> {
        let expired = self.pending?;
        warn!(pdu = %expired.pdu, "command expired without a response");
        let response = BrowseResponse::failed(expired.pdu, StatusCode::InternalError);
        self.advance();
        Some(Completion {
            scope: expired.scope,
            response,
        })
    }

    /// Take the error from a queued command that failed to send.
    pub fn take_send_error(&mut self) -> Option<SessionError> {
        self.send_error.take()
    }

    /// Last UID counter reported by a successful response.
    pub fn uid_counter(&self) -> Option<u16> {
        self.uid_counter
    }

    /// Operation of the outstanding command, if any.
    pub fn pending(&self) -> Option<PduId> {
        self.pending.map(|command| command.pdu)
    }

    /// Scope named by the outstanding command, if it names one.
    pub fn pending_scope(&self) -> Option<Scope> {
        self.pending.and_then(|command| command.scope)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Commands waiting behind the outstanding one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn send_now(&mut self, queued: Queued) -> Result<()> {
        debug!(pdu = %queued.command.pdu, size = queued.frame.size(), "sending command");
        self.transport.send(queued.frame)?;
        self.pending = Some(queued.command);
        Ok(())
    }

    /// Complete the outstanding command and start the next one that sends.
    fn advance(&mut self) {
        self.pending = None;
        while let Some(next) = self.queue.pop_front() {
            let pdu = next.command.pdu;
            match self.send_now(next) {
                Ok(()) => return,
                Err(err) => {
                    warn!(%pdu, %err, "dropping queued command that failed to send");
                    self.send_error.get_or_insert(err);
                }
            }
        }
    }

    fn track_uid_counter(&mut self, response: &BrowseResponse) {
        if response.status_code() != Some(StatusCode::NoError) {
            return;
        }
        if let Some(counter) = response.uid_counter() {
            if self.uid_counter != Some(counter) {
                debug!(previous = ?self.uid_counter, counter, "uid counter changed");
            }
            self.uid_counter = Some(counter);
        }
    }

    fn apply_charset_policy(&self, response: BrowseResponse) -> Result<BrowseResponse> {
        match (self.config.charset_policy, response.foreign_character_set()) {
            (CharsetPolicy::Reject, Some(character_set_id)) => {
                Err(PduError::CharacterSetMismatch {
                    pdu: response.pdu_id(),
                    character_set_id,
                }
                .into())
            }
            _ => Ok(response),
        }
    }
}

impl<T> std::fmt::Debug for BrowseSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowseSession")
            .field("config", &self.config)
            .field("pending", &self.pending)
            .field("queued", &self.queue.len())
            .field("uid_counter", &self.uid_counter)
            .field("send_error", &self.send_error)
            .finish_non_exhaustive()
    }
}
