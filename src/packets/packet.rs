use super::error::PacketParseError;
use super::{control_packets::control_packet::ControlPacket, midi_packets::midi_packet::MidiPacket};

/// Either family of packet that can land on a session's sockets: a control PDU on the control
/// port, or an RTP-MIDI data packet on the MIDI port. Dispatch is based on the `0xFFFF` control
/// marker - anything else is assumed to be RTP-MIDI.
#[derive(Debug)]
pub enum RtpMidiPacket<'a> {
    Midi(&'a MidiPacket),
    Control(ControlPacket<'a>),
}

impl<'a> RtpMidiPacket<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, PacketParseError> {
        if ControlPacket::is_control_packet(bytes) {
            ControlPacket::from_be_bytes(bytes).map(RtpMidiPacket::Control)
        } else {
            MidiPacket::from_be_bytes(bytes).map(RtpMidiPacket::Midi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::midi_packets::midi_event::MidiEvent;
    use crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage;
    use midi_types::{Channel, MidiMessage, Note, Value7};
    use zerocopy::network_endian::{U16, U32};

    #[test]
    fn test_parse_midi_packet() {
        let events = [MidiEvent::new(
            None,
            RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(64), Value7::from(127))),
        )];
        let bytes = MidiPacket::new_as_bytes(U16::new(1), U32::new(1), U32::new(1), &events, false);

        let parsed_packet = RtpMidiPacket::parse(&bytes).unwrap();
        if let RtpMidiPacket::Midi(parsed_midi_packet) = parsed_packet {
            assert_eq!(parsed_midi_packet.sequence_number().get(), 1);
            assert_eq!(parsed_midi_packet.timestamp().get(), 1);
            assert_eq!(parsed_midi_packet.ssrc().get(), 1);
            let mut commands = parsed_midi_packet.commands();
            assert_eq!(
                commands.next().unwrap().command(),
                &RtpMidiMessage::MidiMessage(MidiMessage::NoteOn(Channel::C1, Note::from(64), Value7::from(127)))
            );
            assert!(commands.next().is_none());
        } else {
            panic!("Expected MidiPacket");
        }
    }

    #[test]
    fn test_parse_control_packet() {
        let bytes = ControlPacket::new_rejection(U32::new(1), U32::new(1));
        let parsed = RtpMidiPacket::parse(&bytes).unwrap();

        match parsed {
            RtpMidiPacket::Control(ControlPacket::Rejection(_)) => {
                // all good
            }
            _ => panic!("Expected ControlPacket"),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(RtpMidiPacket::parse(&[0u8; 2]).is_err());
    }
}
