use crate::packets::error::PacketParseError;

/// System chapter D: counters for simple system-common messages that carry no data bytes of
/// their own, tracked since the last checkpoint (§4.9: "reset/tune-request counters, song
/// select"). Each flagged field is one byte: a running count for Reset and Tune Request, and
/// the last-seen value for Song Select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemChapterD {
    pub reset_count: Option<u8>,
    pub tune_request_count: Option<u8>,
    pub song_select: Option<u8>,
}

impl SystemChapterD {
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, PacketParseError> {
        let flags = *bytes.first().ok_or(PacketParseError::NotEnoughData)?;
        let mut offset = 1;
        let mut take = |present: bool| -> Result<Option<u8>, PacketParseError> {
            if !present {
                return Ok(None);
            }
            let byte = *bytes.get(offset).ok_or(PacketParseError::NotEnoughData)?;
            offset += 1;
            Ok(Some(byte))
        };

        let reset_count = take(flags & 0b0000_0001 != 0)?;
        let tune_request_count = take(flags & 0b0000_0010 != 0)?;
        let song_select = take(flags & 0b0000_0100 != 0)?;

        Ok(SystemChapterD {
            reset_count,
            tune_request_count,
            song_select,
        })
    }
}
