pub mod delta_time;
pub mod midi_command_iterator;
pub(crate) mod midi_command_list_body;
pub(crate) mod midi_command_list_header;
pub mod midi_event;
pub mod midi_message_ext;
pub mod midi_packet;
pub(crate) mod midi_packet_header;
#[cfg(feature = "journal")]
pub mod recovery_journal;
pub mod rtp_midi_message;
pub(crate) mod util;
