use thiserror::Error;

/// Errors raised while decoding a single wire packet or one of its nested fields.
///
/// These are local, per-call parse failures - they never cross a session boundary on their own.
/// Callers that need to surface a parse failure to the outside world wrap one of these in
/// [`crate::error::RtpMidiError::Parse`] or [`crate::error::RtpMidiError::UnexpectedParse`].
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum PacketParseError {
    /// The buffer ended before a fixed-size or length-prefixed field could be fully read.
    #[error("not enough data to parse packet")]
    NotEnoughData,
    /// A field had a value this decoder does not understand (bad magic, reserved bits set,
    /// unsupported command byte).
    #[error("unexpected data while parsing packet")]
    UnexpectedData,
    /// The data parsed cleanly but its framing claims more bytes than were delivered - the
    /// caller should hold the partial buffer and wait for a continuation rather than discard it.
    #[error("not sure, give me more data")]
    NotSureGiveMeMoreData,
}

impl From<PacketParseError> for std::io::Error {
    fn from(value: PacketParseError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, value)
    }
}
