pub mod control_port;
pub mod events;
mod host_syncer;
pub mod invite_responder;
mod mdns;
pub mod midi_port;
pub mod rtp_midi_session;

const MAX_UDP_PACKET_SIZE: usize = 65535;
