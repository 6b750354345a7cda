use bytes::BufMut;
use midi_types::MidiMessage;

use crate::packets::midi_packets::midi_message_ext::ReadWriteExt;

#[derive(Debug, Clone, PartialEq)]
pub enum RtpMidiMessage<'a> {
    MidiMessage(MidiMessage),
    /// A SysEx fragment. `complete` is `false` when the packet ran out of data
    /// before an `0xF7` terminator was seen and the message continues in the
    /// next packet.
    SysEx { data: &'a [u8], complete: bool },
}

impl From<MidiMessage> for RtpMidiMessage<'_> {
    fn from(msg: MidiMessage) -> Self {
        RtpMidiMessage::MidiMessage(msg)
    }
}

impl RtpMidiMessage<'_> {
    pub fn len(&self) -> usize {
        match self {
            RtpMidiMessage::MidiMessage(msg) => msg.len(),
            RtpMidiMessage::SysEx { data, complete } => data.len() + if *complete { 2 } else { 1 },
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encodes a complete, in-memory SysEx message (`F0 ... F7`). Splitting an
    /// outgoing SysEx across multiple packets is handled by the outbound
    /// buffer, not here.
    pub fn write(&self, bytes: &mut bytes::BytesMut, running_status: Option<u8>) {
        match self {
            RtpMidiMessage::MidiMessage(msg) => msg.write(bytes, running_status),
            RtpMidiMessage::SysEx { data, .. } => {
                bytes.put_u8(0xF0);
                bytes.extend_from_slice(data);
                bytes.put_u8(0xF7);
            }
        }
    }

    pub(crate) fn status(&self) -> u8 {
        match self {
            RtpMidiMessage::MidiMessage(msg) => msg.status(),
            RtpMidiMessage::SysEx { .. } => 0xF0,
        }
    }
}
