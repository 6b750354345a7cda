use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, network_endian::U32};

/// Wire body of an RS (receiver feedback) packet: the receiver's SSRC and the sequence
/// number of the last RTP-MIDI packet it has seen, used by the sender to size its
/// recovery journal and to detect a stalled peer.
#[derive(Debug, KnownLayout, Unaligned, IntoBytes, Immutable, FromBytes, Clone, Copy)]
#[repr(C)]
pub struct ReceiverFeedbackPacket {
    sender_ssrc: U32,
    sequence_number: U32,
}

impl ReceiverFeedbackPacket {
    pub fn new(sender_ssrc: U32, last_received_sequence_number: u16) -> Self {
        ReceiverFeedbackPacket {
            sender_ssrc,
            sequence_number: U32::new(u32::from(last_received_sequence_number) << 16),
        }
    }

    pub fn sender_ssrc(&self) -> U32 {
        self.sender_ssrc
    }

    pub fn sequence_number(&self) -> u16 {
        (self.sequence_number.get() >> 16) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let packet = ReceiverFeedbackPacket::new(U32::new(0xF519AEB9), 42);
        assert_eq!(packet.sender_ssrc().get(), 0xF519AEB9);
        assert_eq!(packet.sequence_number(), 42);
    }

    #[test]
    fn test_read() {
        let buffer = [
            0xF5, 0x19, 0xAE, 0xB9, //sender ssrc
            0x00, 0x2A, 0x00, 0x00, //sequence number in high 16 bits
        ];
        let packet = ReceiverFeedbackPacket::ref_from_bytes(&buffer).unwrap();
        assert_eq!(packet.sender_ssrc().get(), 0xF519AEB9);
        assert_eq!(packet.sequence_number(), 42);
    }
}
