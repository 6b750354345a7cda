//! Wire-level parsing and serialization for the two packet families that appear on an
//! AppleMIDI session's control and data ports: control PDUs (invitation handshake, clock
//! sync, receiver feedback) and RTP-MIDI data packets (MIDI command lists).

pub mod control_packets;
pub mod error;
pub mod midi_packets;
pub mod packet;
