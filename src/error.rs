//! Session-level error taxonomy.
//!
//! Wire-level parse failures live in [`crate::packets::error::PacketParseError`]; this module
//! covers everything a running [`crate::sessions::rtp_midi_session::RtpMidiSession`] can fail at
//! once it is past the point of decoding a single packet - buffer pressure, participant bookkeeping,
//! timeouts and retry exhaustion. Anything in here can be delivered to an application through
//! [`crate::sessions::events::event_handling::ExceptionEvent`].
use thiserror::Error;

use crate::packets::error::PacketParseError;

#[derive(Debug, Error, Clone)]
pub enum RtpMidiError {
    /// A bounded per-participant queue (inbound data, outbound MIDI, decoded MIDI) was full when
    /// a new item arrived; the new item was dropped.
    #[error("buffer full for participant ssrc {ssrc:#x}")]
    BufferFull { ssrc: u32 },

    /// A packet failed to parse and was discarded.
    #[error("failed to parse packet from {src}: {source}")]
    Parse { src: std::net::SocketAddr, source: PacketParseError },

    /// A packet parsed, but into a shape the session did not expect in this context (e.g. a
    /// control packet on the MIDI port, or a command list with field values outside spec).
    #[error("unexpected packet content from {src}")]
    UnexpectedParse { src: std::net::SocketAddr },

    /// The session already has [`crate::sessions::rtp_midi_session::MAX_PARTICIPANTS`] entries.
    #[error("cannot add participant, session already has the maximum of {max} participants")]
    TooManyParticipants { max: usize },

    /// An operation referenced a participant (by SSRC or address) that is not part of the
    /// session.
    #[error("no participant found for ssrc {ssrc:#x}")]
    ParticipantNotFound { ssrc: u32 },

    /// A participant stopped responding to clock sync for longer than the listener timeout.
    #[error("participant ssrc {ssrc:#x} timed out")]
    ListenerTimeOut { ssrc: u32 },

    /// An invitation or clock sync exchange exhausted its retry budget without a reply.
    #[error("giving up on participant at {addr} after {attempts} attempts")]
    MaxAttempts { addr: std::net::SocketAddr, attempts: u8 },

    /// `invite_participant` got no acknowledgment at all (distinct from an explicit rejection).
    #[error("no response to connection request sent to {addr}")]
    NoResponseFromConnectionRequest { addr: std::net::SocketAddr },

    /// One or more MIDI commands passed to `send_midi`/`send_midi_batch` could not be delivered
    /// to every participant.
    #[error("dropped {count} outbound packet(s)")]
    SendPacketsDropped { count: usize },

    /// The session observed a gap in a participant's MIDI sequence numbers.
    #[error("dropped {count} received packet(s) from ssrc {ssrc:#x}")]
    ReceivedPacketsDropped { count: u32, ssrc: u32 },
}

impl From<RtpMidiError> for std::io::Error {
    fn from(value: RtpMidiError) -> Self {
        std::io::Error::other(value)
    }
}
