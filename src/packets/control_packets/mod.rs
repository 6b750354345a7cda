pub mod bitrate_receive_limit_packet;
pub mod clock_sync_packet;
pub mod control_packet;
pub mod receiver_feedback_packet;
pub mod session_initiation_packet;
