use crate::packets::midi_packets::midi_event::MidiEvent;
use crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage;

use super::midi_command_list_header::MidiCommandListHeader;
use super::util::update_running_status;

#[derive(Debug)]
pub struct MidiCommandIterator<'a> {
    data: &'a [u8],
    running_status: Option<u8>,
    read_delta_time: bool,
    sysex_continuation: bool,
}

impl<'a> MidiCommandIterator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let command_list_header = MidiCommandListHeader::from_slice(data);
        let read_delta_time = command_list_header.flags().z_flag();
        let offset = MidiCommandListHeader::header_size(command_list_header.flags().b_flag());
        let length = command_list_header.length();
        let slice = &data[offset..length + offset];
        MidiCommandIterator {
            data: slice,
            running_status: None,
            read_delta_time,
            sysex_continuation: false,
        }
    }

    /// Constructs an iterator over a packet whose command list opens mid-SysEx,
    /// continuing a message that was left incomplete by the previous packet.
    pub fn new_continuing_sysex(data: &'a [u8]) -> Self {
        let mut this = Self::new(data);
        this.sysex_continuation = true;
        this
    }
}

impl<'a> Iterator for MidiCommandIterator<'a> {
    type Item = MidiEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        if self.sysex_continuation {
            self.sysex_continuation = false;
            self.running_status = None;
            let end = self.data.iter().position(|&b| b == 0xF7);
            return match end {
                Some(idx) => {
                    let data = &self.data[..idx];
                    self.data = &self.data[idx + 1..];
                    self.read_delta_time = true;
                    Some(MidiEvent::new(None, RtpMidiMessage::SysEx { data, complete: true }))
                }
                None => {
                    let data = self.data;
                    self.data = &[];
                    Some(MidiEvent::new(None, RtpMidiMessage::SysEx { data, complete: false }))
                }
            };
        }

        match MidiEvent::from_be_bytes(self.data, self.read_delta_time, self.running_status) {
            Ok((command, new_offset)) => {
                if let RtpMidiMessage::SysEx { complete: false, .. } = command.command() {
                    self.sysex_continuation = false; // nothing left to scan in this packet
                    self.running_status = None;
                } else {
                    self.running_status = update_running_status(self.running_status, command.command().status());
                }
                self.data = new_offset;
                self.read_delta_time = true;
                Some(command)
            }
            Err(_) => None, // malformed remainder; stop rather than desync further reads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::midi_packets::midi_command_list_header::MidiCommandListFlags;
    use midi_types::{Channel, MidiMessage, Note, Value7};

    fn body_with_header(z_flag: bool, commands: &[u8]) -> Vec<u8> {
        let mut buffer = bytes::BytesMut::new();
        MidiCommandListHeader::new(MidiCommandListFlags::new(commands.len() > 14, false, z_flag, false), commands.len()).write(&mut buffer);
        buffer.extend_from_slice(commands);
        buffer.to_vec()
    }

    #[test]
    fn realtime_byte_interleaved_in_running_status_does_not_clear_it() {
        // NoteOn ch0, realtime TimingClock (0xF8), then a running-status NoteOn.
        let data = body_with_header(true, &[0x00, 0x90, 0x3C, 0x7F, 0x00, 0xF8, 0x00, 0x3E, 0x7F]);
        let mut commands = MidiCommandIterator::new(&data);

        assert_eq!(
            commands.next().unwrap().command(),
            &RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(0x3C), Value7::from(0x7F)))
        );
        assert_eq!(commands.next().unwrap().command(), &RtpMidiMessage::MidiMessage(MidiMessage::TimingClock));
        assert_eq!(
            commands.next().unwrap().command(),
            &RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(0x3E), Value7::from(0x7F)))
        );
        assert!(commands.next().is_none());
    }
}
