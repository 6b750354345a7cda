use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    network_endian::{U16, U32},
};

const VERSION: u16 = 2;
const PAYLOAD_TYPE: u16 = 97;

const VERSION_SHIFT: u16 = 14;
const PAYLOAD_TYPE_MASK: u16 = 0x007F;

#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub(super) struct MidiPacketHeader {
    flags: U16,
    sequence_number: U16,
    timestamp: U32,
    ssrc: U32,
}

impl MidiPacketHeader {
    pub fn new(sequence_number: U16, timestamp: U32, ssrc: U32) -> Self {
        let flags = (VERSION << VERSION_SHIFT) | PAYLOAD_TYPE;
        MidiPacketHeader {
            flags: U16::new(flags),
            sequence_number,
            timestamp,
            ssrc,
        }
    }

    pub fn version(&self) -> u16 {
        self.flags.get() >> VERSION_SHIFT
    }

    pub fn payload_type(&self) -> u16 {
        self.flags.get() & PAYLOAD_TYPE_MASK
    }

    pub fn is_valid(&self) -> bool {
        self.version() == VERSION && self.payload_type() == PAYLOAD_TYPE
    }

    pub fn sequence_number(&self) -> U16 {
        self.sequence_number
    }

    pub fn timestamp(&self) -> U32 {
        self.timestamp
    }

    pub fn ssrc(&self) -> U32 {
        self.ssrc
    }
}

impl std::fmt::Debug for MidiPacketHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags = self.flags.get();
        f.debug_struct("MidiPacketHeader")
            .field("version", &(flags >> VERSION_SHIFT))
            .field("payload_type", &(flags & PAYLOAD_TYPE_MASK))
            .field("sequence_number", &self.sequence_number.get())
            .field("timestamp", &self.timestamp.get())
            .field("ssrc", &self.ssrc.get())
            .finish()
    }
}
