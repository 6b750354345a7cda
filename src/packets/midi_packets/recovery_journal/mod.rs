//! RFC 6295 recovery journal (§4.9), feature-gated behind `journal`. The session never emits
//! a non-empty journal today (`J` is always clear on outbound packets - see
//! [`crate::packets::midi_packets::midi_packet::MidiPacket::new_as_bytes`]), which §4.9 names
//! as conformant on its own. This module exists so a journal attached by a peer can still be
//! parsed rather than treated as an unexpected trailer, and so decoding is available to
//! embedders that want to inspect or rebuild participant state from it.

pub mod channel_journal;
pub mod system_journal;

use crate::packets::error::PacketParseError;
use channel_journal::ChannelJournalEntry;
use system_journal::SystemJournalSection;

/// A parsed recovery journal. `Y`/`A` absent yields an empty journal (`system: None`,
/// `channels: []`); present sections are split into a system part and an ascending-order list
/// of per-channel entries, per the header's `TOTCHAN` count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecoveryJournal {
    /// `S` flag: the sender believes only a single packet was lost since the last checkpoint.
    pub single_packet_loss: bool,
    pub checkpoint_seqnum: u16,
    pub system: Option<SystemJournalSection>,
    pub channels: Vec<ChannelJournalEntry>,
}

impl RecoveryJournal {
    /// The conformant empty journal this crate emits: every presence flag clear, no channels.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wire bytes for [`Self::empty`]: just the 3-byte header with every flag and count zero.
    pub fn empty_as_bytes() -> [u8; 3] {
        [0, 0, 0]
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, PacketParseError> {
        let &flags_and_totchan = bytes.first().ok_or(PacketParseError::NotEnoughData)?;
        let single_packet_loss = flags_and_totchan & 0b1000_0000 != 0;
        let system_present = flags_and_totchan & 0b0100_0000 != 0;
        let channels_present = flags_and_totchan & 0b0010_0000 != 0;
        let total_channels = (flags_and_totchan & 0x0F) as usize + 1;

        let checkpoint_bytes = bytes.get(1..3).ok_or(PacketParseError::NotEnoughData)?;
        let checkpoint_seqnum = u16::from_be_bytes([checkpoint_bytes[0], checkpoint_bytes[1]]);

        let mut offset = 3;
        let system = if system_present {
            let (section, consumed) = SystemJournalSection::from_be_bytes(&bytes[offset..])?;
            offset += consumed;
            Some(section)
        } else {
            None
        };

        let mut channels = Vec::new();
        if channels_present {
            for _ in 0..total_channels {
                let (entry, consumed) = ChannelJournalEntry::from_be_bytes(&bytes[offset..])?;
                offset += consumed;
                channels.push(entry);
            }
        }

        Ok(RecoveryJournal {
            single_packet_loss,
            checkpoint_seqnum,
            system,
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_journal_has_no_system_or_channels() {
        let journal = RecoveryJournal::from_be_bytes(&RecoveryJournal::empty_as_bytes()).unwrap();
        assert_eq!(journal, RecoveryJournal::empty());
        assert!(journal.system.is_none());
        assert!(journal.channels.is_empty());
    }

    #[test]
    fn decodes_header_flags_and_checkpoint() {
        let bytes = [0b1000_0000, 0x01, 0x02];
        let journal = RecoveryJournal::from_be_bytes(&bytes).unwrap();
        assert!(journal.single_packet_loss);
        assert_eq!(journal.checkpoint_seqnum, 0x0102);
    }

    #[test]
    fn decodes_one_channel_with_no_chapters() {
        // A=1, TOTCHAN=0 -> exactly one channel entry follows.
        let mut bytes = vec![0b0010_0000, 0x00, 0x00];
        let toc = 0u8;
        let length: u16 = 1; // just the TOC byte, no chapters
        let header: u16 = (2u16 << 10) | length;
        bytes.extend_from_slice(&header.to_be_bytes());
        bytes.push(toc);

        let journal = RecoveryJournal::from_be_bytes(&bytes).unwrap();
        assert_eq!(journal.channels.len(), 1);
        assert_eq!(journal.channels[0].channel, 2);
        assert!(journal.channels[0].program_change.is_none());
    }

    #[test]
    fn rejects_truncated_header() {
        assert_eq!(RecoveryJournal::from_be_bytes(&[0x00]), Err(PacketParseError::NotEnoughData));
    }
}
