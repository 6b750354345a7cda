use bytes::{BufMut, Bytes, BytesMut};
use std::ffi::CStr;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, network_endian::U32};

use crate::packets::control_packets::session_initiation_packet::SessionInitiationPacketBody;
use crate::packets::error::PacketParseError;

use super::bitrate_receive_limit_packet::BitrateReceiveLimitPacket;
use super::clock_sync_packet::ClockSyncPacket;
use super::receiver_feedback_packet::ReceiverFeedbackPacket;

const CONTROL_PACKET_MARKER: [u8; 2] = [255, 255];

#[derive(Debug, KnownLayout, Unaligned, IntoBytes, Immutable, FromBytes)]
#[repr(C)]
pub struct ControlPacketHeader {
    marker: [u8; 2],
    pub command: [u8; 2],
}

impl ControlPacketHeader {
    pub fn new(command: [u8; 2]) -> ControlPacketHeader {
        ControlPacketHeader {
            marker: CONTROL_PACKET_MARKER,
            command,
        }
    }
}

/// One of the control PDUs that can appear on a session's control (or, during the handshake's
/// second leg, MIDI) port: invitation/acceptance/rejection/termination for the session
/// handshake, CK for clock sync, RS for receiver feedback, RL for a receiver's advertised
/// bitrate ceiling.
#[derive(Debug)]
pub enum ControlPacket<'a> {
    ClockSync(&'a ClockSyncPacket),
    Invitation { body: &'a SessionInitiationPacketBody, name: &'a CStr },
    Acceptance { body: &'a SessionInitiationPacketBody, name: &'a CStr },
    Rejection(&'a SessionInitiationPacketBody),
    Termination(&'a SessionInitiationPacketBody),
    ReceiverFeedback(&'a ReceiverFeedbackPacket),
    BitrateReceiveLimit(&'a BitrateReceiveLimitPacket),
}

impl<'a> ControlPacket<'a> {
    pub fn from_be_bytes(buffer: &'a [u8]) -> Result<ControlPacket<'a>, PacketParseError> {
        let (header, remainder) = ControlPacketHeader::ref_from_prefix(buffer).map_err(|_| PacketParseError::NotEnoughData)?;

        match &header.command {
            b"CK" => {
                let clock_sync_packet = ClockSyncPacket::ref_from_bytes(remainder).map_err(|_| PacketParseError::NotEnoughData)?;
                Ok(ControlPacket::ClockSync(clock_sync_packet))
            }
            b"OK" | b"IN" => {
                let (body, payload) = SessionInitiationPacketBody::ref_from_prefix(remainder).map_err(|_| PacketParseError::NotEnoughData)?;
                if body.protocol_version() != 2 {
                    return Err(PacketParseError::UnexpectedData);
                }
                let name = CStr::from_bytes_with_nul(payload).map_err(|_| PacketParseError::UnexpectedData)?;
                if header.command == *b"OK" {
                    Ok(ControlPacket::Acceptance { body, name })
                } else {
                    Ok(ControlPacket::Invitation { body, name })
                }
            }
            b"NO" | b"BY" => {
                let body = SessionInitiationPacketBody::ref_from_bytes(remainder).map_err(|_| PacketParseError::NotEnoughData)?;
                if header.command == *b"NO" {
                    Ok(ControlPacket::Rejection(body))
                } else {
                    Ok(ControlPacket::Termination(body))
                }
            }
            b"RS" => {
                let packet = ReceiverFeedbackPacket::ref_from_bytes(remainder).map_err(|_| PacketParseError::NotEnoughData)?;
                Ok(ControlPacket::ReceiverFeedback(packet))
            }
            b"RL" => {
                let packet = BitrateReceiveLimitPacket::ref_from_bytes(remainder).map_err(|_| PacketParseError::NotEnoughData)?;
                Ok(ControlPacket::BitrateReceiveLimit(packet))
            }
            _ => Err(PacketParseError::UnexpectedData),
        }
    }

    pub fn is_control_packet(buffer: &[u8]) -> bool {
        buffer.starts_with(&CONTROL_PACKET_MARKER)
    }

    fn new_initiator(initiator_token: U32, sender_ssrc: U32, command: [u8; 2], name: Option<&CStr>) -> Bytes {
        let header = ControlPacketHeader::new(command);
        let packet = SessionInitiationPacketBody::new(initiator_token, sender_ssrc);
        let name_length = name.map_or(0, |n| n.count_bytes() + 1); // +1 for null terminator
        let mut buffer = BytesMut::with_capacity(std::mem::size_of::<ControlPacketHeader>() + std::mem::size_of::<SessionInitiationPacketBody>() + name_length);
        buffer.put_slice(header.as_bytes());
        buffer.put_slice(packet.as_bytes());
        if let Some(name) = name {
            buffer.put_slice(name.to_bytes_with_nul());
        }
        buffer.freeze()
    }

    pub fn new_acceptance(initiator_token: U32, sender_ssrc: U32, name: &CStr) -> Bytes {
        ControlPacket::new_initiator(initiator_token, sender_ssrc, *b"OK", Some(name))
    }

    pub fn new_invitation(initiator_token: U32, sender_ssrc: U32, name: &CStr) -> Bytes {
        ControlPacket::new_initiator(initiator_token, sender_ssrc, *b"IN", Some(name))
    }

    pub fn new_rejection(initiator_token: U32, sender_ssrc: U32) -> Bytes {
        ControlPacket::new_initiator(initiator_token, sender_ssrc, *b"NO", None)
    }

    pub fn new_termination(initiator_token: U32, sender_ssrc: U32) -> Bytes {
        ControlPacket::new_initiator(initiator_token, sender_ssrc, *b"BY", None)
    }

    pub fn new_clock_sync(packet: &ClockSyncPacket) -> Bytes {
        let header = ControlPacketHeader::new(*b"CK");
        let mut buffer = BytesMut::with_capacity(std::mem::size_of::<ControlPacketHeader>() + std::mem::size_of::<ClockSyncPacket>());
        buffer.put_slice(header.as_bytes());
        buffer.put_slice(packet.as_bytes());
        buffer.freeze()
    }

    pub fn new_receiver_feedback(sender_ssrc: U32, last_received_sequence_number: u16) -> Bytes {
        let header = ControlPacketHeader::new(*b"RS");
        let packet = ReceiverFeedbackPacket::new(sender_ssrc, last_received_sequence_number);
        let mut buffer = BytesMut::with_capacity(std::mem::size_of::<ControlPacketHeader>() + std::mem::size_of::<ReceiverFeedbackPacket>());
        buffer.put_slice(header.as_bytes());
        buffer.put_slice(packet.as_bytes());
        buffer.freeze()
    }
}
