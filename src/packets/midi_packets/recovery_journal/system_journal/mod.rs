pub mod chapter_d;

use crate::packets::error::PacketParseError;
use chapter_d::SystemChapterD;

/// The system recovery-journal section: a 2-byte presence/length header followed by whichever
/// chapters it names. Chapter D is decoded in full; V (active sense) and Q (sequencer state)
/// are noted as present but otherwise skipped, per §4.9's "MAY skip chapters" allowance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemJournalSection {
    pub chapter_d: Option<SystemChapterD>,
    pub active_sense_present: bool,
    pub sequencer_state_present: bool,
}

impl SystemJournalSection {
    /// Parses the system journal section starting at `bytes[0]`, returning it along with the
    /// total number of bytes consumed (header plus every chapter the header's length covers).
    pub fn from_be_bytes(bytes: &[u8]) -> Result<(Self, usize), PacketParseError> {
        let header = bytes.get(0..2).ok_or(PacketParseError::NotEnoughData)?;
        let flags_and_length = u16::from_be_bytes([header[0], header[1]]);

        let chapter_d_present = flags_and_length & 0b0100_0000_0000_0000 != 0;
        let active_sense_present = flags_and_length & 0b0010_0000_0000_0000 != 0;
        let sequencer_state_present = flags_and_length & 0b0001_0000_0000_0000 != 0;
        let length = (flags_and_length & 0x03FF) as usize;

        let body = bytes.get(2..2 + length).ok_or(PacketParseError::NotEnoughData)?;
        let chapter_d = if chapter_d_present { Some(SystemChapterD::from_be_bytes(body)?) } else { None };

        Ok((
            SystemJournalSection {
                chapter_d,
                active_sense_present,
                sequencer_state_present,
            },
            2 + length,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_chapter_d_and_consumed_length() {
        // D flag set, length = 1 (chapter D with no sub-fields).
        let mut bytes = vec![0b0100_0000, 0b0000_0001];
        bytes.push(0b0000_0000); // chapter D flags byte, nothing present
        let (section, consumed) = SystemJournalSection::from_be_bytes(&bytes).unwrap();
        assert!(section.chapter_d.is_some());
        assert!(!section.active_sense_present);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn skips_unrecognised_chapters_by_length() {
        // V + Q present, no chapter D; 4 bytes of opaque chapter content to skip over.
        let mut bytes = vec![0b0011_0000, 0b0000_0100];
        bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        let (section, consumed) = SystemJournalSection::from_be_bytes(&bytes).unwrap();
        assert!(section.chapter_d.is_none());
        assert!(section.active_sense_present);
        assert!(section.sequencer_state_present);
        assert_eq!(consumed, 6);
    }

    #[test]
    fn rejects_truncated_header() {
        assert_eq!(SystemJournalSection::from_be_bytes(&[0x00]), Err(PacketParseError::NotEnoughData));
    }
}
