use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout,
    network_endian::{U16, U32},
};

use super::midi_command_iterator::MidiCommandIterator;
use super::midi_command_list_body::MidiEventList;
use crate::packets::error::PacketParseError;
use crate::packets::midi_packets::{midi_command_list_header::MidiCommandListHeader, midi_event::MidiEvent, midi_packet_header::MidiPacketHeader};

#[derive(FromBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct MidiPacket {
    header: MidiPacketHeader,
    body: [u8],
}

impl MidiPacket {
    pub fn from_be_bytes(buffer: &[u8]) -> Result<&MidiPacket, PacketParseError> {
        let packet = MidiPacket::ref_from_bytes(buffer).map_err(|_| PacketParseError::NotEnoughData)?;
        if !packet.header.is_valid() {
            return Err(PacketParseError::UnexpectedData);
        }
        Ok(packet)
    }

    pub(crate) fn new_as_bytes(sequence_number: U16, timestamp: U32, ssrc: U32, commands: &[MidiEvent], z_flag: bool) -> Bytes {
        let packet_header = MidiPacketHeader::new(sequence_number, timestamp, ssrc);
        let command_list_header = MidiCommandListHeader::build_for(commands, z_flag);

        // Get the size of the body from the header as it's already calculated
        let mut buffer = BytesMut::with_capacity(std::mem::size_of::<MidiPacketHeader>() + command_list_header.size() + command_list_header.length());
        buffer.put_slice(packet_header.as_bytes());
        command_list_header.write(&mut buffer);
        commands.write(&mut buffer, z_flag);
        buffer.freeze()
    }

    pub fn commands(&self) -> MidiCommandIterator {
        MidiCommandIterator::new(&self.body)
    }

    /// Same as [`Self::commands`], but the first yielded event continues a SysEx message left
    /// incomplete by a previous packet rather than starting a fresh command.
    pub fn commands_continuing_sysex(&self) -> MidiCommandIterator {
        MidiCommandIterator::new_continuing_sysex(&self.body)
    }

    /// Parses the recovery journal trailing the command list, if the `J` flag is set. `None`
    /// means no journal is present; `Some(Err(_))` means one was announced but didn't parse.
    #[cfg(feature = "journal")]
    pub fn journal(&self) -> Option<Result<super::recovery_journal::RecoveryJournal, PacketParseError>> {
        let command_list_header = MidiCommandListHeader::from_slice(&self.body);
        if !command_list_header.flags().j_flag() {
            return None;
        }
        let start = command_list_header.size() + command_list_header.length();
        self.body.get(start..).map(super::recovery_journal::RecoveryJournal::from_be_bytes)
    }

    pub fn sequence_number(&self) -> U16 {
        self.header.sequence_number()
    }

    pub fn timestamp(&self) -> U32 {
        self.header.timestamp()
    }

    pub fn ssrc(&self) -> U32 {
        self.header.ssrc()
    }
}
