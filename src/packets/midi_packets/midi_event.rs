use bytes::BytesMut;
use midi_types::MidiMessage;

use crate::packets::midi_packets::delta_time::read_delta_time;
use crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage;

use super::delta_time::WriteDeltaTimeExt;
use super::midi_message_ext::ReadWriteExt;

#[derive(Debug, Clone, PartialEq)]
pub struct MidiEvent<'a> {
    delta_time: Option<u32>,
    command: RtpMidiMessage<'a>,
}

impl<'a> MidiEvent<'a> {
    pub fn new(delta_time: Option<u32>, command: RtpMidiMessage<'a>) -> Self {
        MidiEvent { delta_time, command }
    }

    pub fn delta_time(&self) -> u32 {
        self.delta_time.unwrap_or(0)
    }

    pub fn command(&self) -> &RtpMidiMessage<'a> {
        &self.command
    }

    pub fn from_be_bytes(bytes: &'a [u8], include_delta_time: bool, running_status: Option<u8>) -> std::io::Result<(Self, &'a [u8])> {
        let mut delta_time = None;

        let mut bytes = bytes;
        if include_delta_time {
            let (dt, new_bytes) = read_delta_time(bytes)?;
            delta_time = Some(dt);
            bytes = new_bytes;
        }

        let (command, offset) = MidiMessage::from_be_bytes(bytes, running_status)?;
        Ok((MidiEvent { delta_time, command }, offset))
    }

    pub(super) fn write(&self, bytes: &mut BytesMut, running_status: Option<u8>, include_delta_time: bool) {
        if include_delta_time {
            match self.delta_time {
                Some(dt) => bytes.write_delta_time(dt),
                None => bytes.write_delta_time(0),
            }
        }

        self.command.write(bytes, running_status);
    }
}
