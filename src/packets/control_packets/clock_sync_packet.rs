use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    network_endian::{U32, U64},
};

/// Wire body of a CK (timestamp synchronization) packet: sender SSRC, an exchange count
/// (0, 1 or 2) identifying which leg of the three-way handshake this is, three reserved
/// bytes, and the three 64-bit timestamp slots. Only `timestamps[count]` is meaningful on
/// receipt; earlier slots were filled in by the previous legs of the exchange.
#[derive(Debug, KnownLayout, Unaligned, IntoBytes, Immutable, FromBytes, Clone, Copy)]
#[repr(C)]
pub struct ClockSyncPacket {
    sender_ssrc: U32,
    count: u8,
    reserved: [u8; 3],
    timestamps: [U64; 3],
}

impl ClockSyncPacket {
    pub fn new(sender_ssrc: U32, count: u8, timestamps: [u64; 3]) -> Self {
        ClockSyncPacket {
            sender_ssrc,
            count,
            reserved: [0; 3],
            timestamps: timestamps.map(U64::new),
        }
    }

    pub fn sender_ssrc(&self) -> U32 {
        self.sender_ssrc
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn timestamp(&self, index: usize) -> u64 {
        self.timestamps[index].get()
    }

    pub fn with_timestamp(mut self, index: usize, value: u64) -> Self {
        self.timestamps[index] = U64::new(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let packet = ClockSyncPacket::new(U32::new(4112101049), 2, [1, 2, 3]);
        assert_eq!(packet.count(), 2);
        assert_eq!(packet.sender_ssrc().get(), 4112101049);
        assert_eq!(packet.timestamp(0), 1);
        assert_eq!(packet.timestamp(1), 2);
        assert_eq!(packet.timestamp(2), 3);
    }

    #[test]
    fn test_read_clock_sync_packet_0() {
        let buffer = [
            0xF5, 0x19, 0xAE, 0xB9, //sender ssrc
            0x00, //count
            0x00, 0x00, 0x00, //reserved
            0x00, 0x00, 0x00, 0x00, 0x72, 0xD4, 0xC5, 0x8E, // timestamp 1
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // timestamp 2
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // timestamp 3
        ];

        let packet = ClockSyncPacket::ref_from_bytes(&buffer).unwrap();
        assert_eq!(packet.count(), 0);
        assert_eq!(packet.sender_ssrc().get(), 4112101049);
        assert_eq!(packet.timestamp(0), 1926546830);
    }

    #[test]
    fn test_read_clock_sync_packet_2() {
        let buffer = [
            0xF5, 0x19, 0xAE, 0xB9, //sender ssrc
            0x02, //count
            0x00, 0x00, 0x00, //reserved
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x72, // timestamp 1
            0x00, 0x00, 0x00, 0x00, 0x04, 0x3D, 0xC7, 0xDF, // timestamp 2
            0x00, 0x00, 0x00, 0x00, 0x72, 0xD4, 0xC5, 0xCD, // timestamp 3
        ];

        let packet = ClockSyncPacket::ref_from_bytes(&buffer).unwrap();
        assert_eq!(packet.count(), 2);
        assert_eq!(packet.sender_ssrc().get(), 4112101049);
        assert_eq!(packet.timestamp(0), 114);
        assert_eq!(packet.timestamp(1), 71157727);
        assert_eq!(packet.timestamp(2), 1926546893);
    }

    #[test]
    fn test_as_bytes_round_trips() {
        let packet = ClockSyncPacket::new(U32::new(4112101049), 2, [1, 2, 3]);
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), 32);
        let parsed = ClockSyncPacket::ref_from_bytes(bytes).unwrap();
        assert_eq!(parsed.count(), 2);
        assert_eq!(parsed.timestamp(2), 3);
    }

    #[test]
    fn test_with_timestamp() {
        let packet = ClockSyncPacket::new(U32::new(1), 0, [0, 0, 0]).with_timestamp(0, 0xDEAD_BEEF);
        assert_eq!(packet.timestamp(0), 0xDEAD_BEEF);
    }
}
