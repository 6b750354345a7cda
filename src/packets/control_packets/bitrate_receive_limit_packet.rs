use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, network_endian::U32};

/// Wire body of an RL (bitrate receive limit) packet: a receiver's advertised ceiling, in
/// bits per second, for how much MIDI data the sender should push its way. Parsed and
/// retained per participant; not enforced by the session's own send path.
#[derive(Debug, KnownLayout, Unaligned, IntoBytes, Immutable, FromBytes, Clone, Copy)]
#[repr(C)]
pub struct BitrateReceiveLimitPacket {
    sender_ssrc: U32,
    bitrate_limit: U32,
}

impl BitrateReceiveLimitPacket {
    pub fn new(sender_ssrc: U32, bitrate_limit: u32) -> Self {
        BitrateReceiveLimitPacket {
            sender_ssrc,
            bitrate_limit: U32::new(bitrate_limit),
        }
    }

    pub fn sender_ssrc(&self) -> U32 {
        self.sender_ssrc
    }

    pub fn bitrate_limit(&self) -> u32 {
        self.bitrate_limit.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let packet = BitrateReceiveLimitPacket::new(U32::new(0xF519AEB9), 250_000);
        assert_eq!(packet.sender_ssrc().get(), 0xF519AEB9);
        assert_eq!(packet.bitrate_limit(), 250_000);
    }

    #[test]
    fn test_read() {
        let buffer = [
            0xF5, 0x19, 0xAE, 0xB9, //sender ssrc
            0x00, 0x03, 0xD0, 0x90, //bitrate limit = 250000
        ];
        let packet = BitrateReceiveLimitPacket::ref_from_bytes(&buffer).unwrap();
        assert_eq!(packet.sender_ssrc().get(), 0xF519AEB9);
        assert_eq!(packet.bitrate_limit(), 250_000);
    }
}
