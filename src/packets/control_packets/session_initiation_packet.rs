use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, network_endian::U32};

const PROTOCOL_VERSION: u32 = 2;

/// Shared body of every session-initiation family packet (IN/OK/NO/BY): a protocol version,
/// the initiator's token, and the sender's SSRC. IN and OK frames carry a NUL-terminated name
/// after this fixed body; NO and BY do not.
#[derive(Debug, KnownLayout, Unaligned, IntoBytes, Immutable, FromBytes, Clone, Copy)]
#[repr(C)]
pub struct SessionInitiationPacketBody {
    protocol_version: U32,
    initiator_token: U32,
    sender_ssrc: U32,
}

impl SessionInitiationPacketBody {
    pub fn new(initiator_token: U32, sender_ssrc: U32) -> Self {
        SessionInitiationPacketBody {
            protocol_version: U32::new(PROTOCOL_VERSION),
            initiator_token,
            sender_ssrc,
        }
    }

    pub fn protocol_version(&self) -> u32 {
        self.protocol_version.get()
    }

    pub fn initiator_token(&self) -> U32 {
        self.initiator_token
    }

    pub fn sender_ssrc(&self) -> U32 {
        self.sender_ssrc
    }
}
