use bytes::BytesMut;

use crate::packets::midi_packets::delta_time::delta_time_size;

use super::midi_event::MidiEvent;
use super::util::update_running_status;

#[derive(Debug, Clone, PartialEq)]
pub struct MidiCommandListBody<'a> {
    commands: &'a [MidiEvent<'a>],
}

impl<'a> MidiCommandListBody<'a> {
    pub fn new(commands: &'a [MidiEvent<'a>]) -> Self {
        Self { commands }
    }

    pub fn write(&self, buffer: &mut BytesMut, z_flag: bool) {
        let mut write_delta_time = z_flag;
        let mut running_status: Option<u8> = None;
        for command in self.commands {
            command.write(buffer, running_status, write_delta_time);
            running_status = update_running_status(running_status, command.command().status());
            write_delta_time = true;
        }
    }

    pub fn size(&self, z_flag: bool) -> usize {
        let mut length: usize = 0;
        let mut running_status: Option<u8> = None;
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 || z_flag {
                length += delta_time_size(command.delta_time())
            }
            if Some(command.command().status()) != running_status {
                length += 1;
            }
            // `len()` includes the status byte (e.g. 3 for NoteOn); the status byte is
            // already accounted for above, so only the data bytes count here.
            length += command.command().len() - 1;
            running_status = update_running_status(running_status, command.command().status());
        }

        length
    }
}

/// Lets a plain slice of [`MidiEvent`]s be written into a command list body
/// without the caller constructing a [`MidiCommandListBody`] wrapper first.
pub(crate) trait MidiEventList {
    fn write(&self, buffer: &mut BytesMut, z_flag: bool);
    fn size(&self, z_flag: bool) -> usize;
}

impl MidiEventList for [MidiEvent<'_>] {
    fn write(&self, buffer: &mut BytesMut, z_flag: bool) {
        MidiCommandListBody::new(self).write(buffer, z_flag)
    }

    fn size(&self, z_flag: bool) -> usize {
        MidiCommandListBody::new(self).size(z_flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage;
    use midi_types::{Channel, MidiMessage, Note, Value7};

    #[test]
    fn slice_size_matches_wrapper_size() {
        let events = [MidiEvent::new(
            Some(0),
            RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(60), Value7::from(100))),
        )];
        assert_eq!(MidiEventList::size(events.as_slice(), true), MidiCommandListBody::new(&events).size(true));
    }

    #[test]
    fn slice_write_matches_wrapper_write() {
        let events = [MidiEvent::new(
            None,
            RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(60), Value7::from(100))),
        )];
        let mut a = BytesMut::new();
        let mut b = BytesMut::new();
        MidiEventList::write(events.as_slice(), &mut a, false);
        MidiCommandListBody::new(&events).write(&mut b, false);
        assert_eq!(a, b);
    }

    #[test]
    fn size_of_single_note_on_excludes_the_double_counted_status_byte() {
        let events = [MidiEvent::new(
            None,
            RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(64), Value7::from(127))),
        )];
        // status byte + 2 data bytes, no delta time (first command, z_flag clear).
        assert_eq!(MidiCommandListBody::new(&events).size(false), 3);
    }

    #[test]
    fn size_of_two_note_list_matches_running_status_framing() {
        let events = [
            MidiEvent::new(Some(0), RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(60), Value7::from(127)))),
            MidiEvent::new(Some(0), RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(62), Value7::from(127)))),
        ];
        // 00 90 3C 7F 00 3E 7F: delta+status+2 data, then delta+2 data (status elided).
        assert_eq!(MidiCommandListBody::new(&events).size(true), 7);
    }

    #[test]
    fn two_consecutive_realtime_bytes_never_elide_the_second_status() {
        let events = [
            MidiEvent::new(None, RtpMidiMessage::MidiMessage(MidiMessage::TimingClock)),
            MidiEvent::new(Some(0), RtpMidiMessage::MidiMessage(MidiMessage::TimingClock)),
        ];
        let mut buffer = BytesMut::new();
        MidiCommandListBody::new(&events).write(&mut buffer, false);
        // Two standalone 0xF8 bytes (plus the second command's zero delta time): realtime
        // status is never eligible for running-status elision.
        assert_eq!(&buffer[..], &[0xF8, 0x00, 0xF8]);
    }
}
