use std::{
    collections::VecDeque,
    ffi::{CStr, CString},
    fmt::Display,
    net::SocketAddr,
    time::Instant,
};

use midi_types::MidiMessage;
use zerocopy::network_endian::U32;

use crate::error::RtpMidiError;

/// Bound on every per-participant queue: inbound datagrams awaiting a tick, and outbound
/// MIDI events awaiting coalescing into the next data packet.
pub const MAX_BUFFER: usize = 64;

/// Which side of the handshake created this participant: we invited them, or they invited us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    Initiator,
    Listener,
}

/// Progress through the two-leg AppleMIDI handshake (control port, then data port).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteState {
    Initiating,
    AwaitingControlOk,
    ControlAccepted,
    AwaitingDataOk,
    DataAccepted,
    Connected,
}

/// A MIDI event queued for the next outbound data packet, owned so it can outlive the
/// caller's borrow of the wire-format `RtpMidiMessage`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OutboundEvent {
    Message(MidiMessage),
    SysEx(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    kind: ParticipantKind,
    ctrl_addr: SocketAddr,
    initiator_token: Option<U32>,
    name: CString,
    ssrc: U32,
    invite_state: InviteState,
    send_seq: u16,
    recv_seq: u16,
    first_message_received: bool,
    lost_packet_count: u32,
    offset_estimate: i64,
    synchronizing: bool,
    sync_count: u8,
    sync_heartbeats: u8,
    last_invite_sent: Instant,
    last_sync_exchange: Instant,
    receiver_feedback_pending: bool,
    receiver_feedback_start: Instant,
    connection_attempts: u8,
    outbound: VecDeque<OutboundEvent>,
    sysex_buffer: Vec<u8>,
    bitrate_limit: Option<u32>,
}

impl Participant {
    pub fn new(ctrl_addr: SocketAddr, kind: ParticipantKind, initiator_token: Option<U32>, name: &CStr, ssrc: U32) -> Self {
        let now = Instant::now();
        Participant {
            kind,
            ctrl_addr,
            initiator_token,
            name: name.to_owned(),
            ssrc,
            invite_state: InviteState::Initiating,
            send_seq: (rand::random::<u16>() % 0x7FFE) + 1,
            recv_seq: 0,
            first_message_received: false,
            lost_packet_count: 0,
            offset_estimate: 0,
            synchronizing: false,
            sync_count: 0,
            sync_heartbeats: 0,
            last_invite_sent: now,
            last_sync_exchange: now,
            receiver_feedback_pending: false,
            receiver_feedback_start: now,
            connection_attempts: 0,
            outbound: VecDeque::new(),
            sysex_buffer: Vec::new(),
            bitrate_limit: None,
        }
    }

    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    pub(super) fn data_endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.ctrl_addr.ip(), self.ctrl_addr.port() + 1)
    }

    pub(super) fn is_invited_by_us(&self) -> bool {
        self.kind == ParticipantKind::Initiator
    }

    pub(super) fn initiator_token(&self) -> Option<U32> {
        self.initiator_token
    }

    pub fn name(&self) -> &CStr {
        &self.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.ctrl_addr
    }

    pub fn ssrc(&self) -> U32 {
        self.ssrc
    }

    pub(super) fn invite_state(&self) -> InviteState {
        self.invite_state
    }

    pub(super) fn set_invite_state(&mut self, state: InviteState) {
        self.invite_state = state;
    }

    pub(super) fn is_connected(&self) -> bool {
        self.invite_state == InviteState::Connected
    }

    pub(super) fn last_invite_sent(&self) -> Instant {
        self.last_invite_sent
    }

    pub(super) fn record_invite_sent(&mut self) {
        self.last_invite_sent = Instant::now();
        self.connection_attempts += 1;
    }

    pub(super) fn connection_attempts(&self) -> u8 {
        self.connection_attempts
    }

    pub(super) fn last_sync_exchange(&self) -> Instant {
        self.last_sync_exchange
    }

    pub(super) fn record_sync_exchange(&mut self) {
        self.last_sync_exchange = Instant::now();
    }

    pub(super) fn offset_estimate(&self) -> i64 {
        self.offset_estimate
    }

    pub(super) fn set_offset_estimate(&mut self, offset: i64) {
        self.offset_estimate = offset;
    }

    pub(super) fn synchronizing(&self) -> bool {
        self.synchronizing
    }

    pub(super) fn begin_synchronizing(&mut self) {
        self.synchronizing = true;
        self.sync_count = 0;
    }

    pub(super) fn stop_synchronizing(&mut self) {
        self.synchronizing = false;
        self.sync_count = 0;
    }

    pub(super) fn sync_count(&self) -> u8 {
        self.sync_count
    }

    pub(super) fn record_sync_attempt(&mut self) {
        self.sync_count += 1;
    }

    pub(super) fn sync_heartbeats(&self) -> u8 {
        self.sync_heartbeats
    }

    pub(super) fn record_sync_heartbeat(&mut self) {
        self.sync_heartbeats = self.sync_heartbeats.saturating_add(1);
    }

    pub(super) fn receiver_feedback_pending(&self) -> bool {
        self.receiver_feedback_pending
    }

    pub(super) fn mark_receiver_feedback_pending(&mut self) {
        if !self.receiver_feedback_pending {
            self.receiver_feedback_pending = true;
            self.receiver_feedback_start = Instant::now();
        }
    }

    pub(super) fn clear_receiver_feedback_pending(&mut self) {
        self.receiver_feedback_pending = false;
    }

    pub(super) fn receiver_feedback_start(&self) -> Instant {
        self.receiver_feedback_start
    }

    /// Advances the send sequence number and returns the value to stamp on the packet
    /// about to be sent.
    pub(super) fn next_send_seq(&mut self) -> u16 {
        let seq = self.send_seq;
        self.send_seq = self.send_seq.wrapping_add(1);
        seq
    }

    /// The sequence number that will be stamped on the *next* emitted packet, without
    /// consuming it. Used to judge whether a peer's `RS` feedback is ahead of us.
    pub(super) fn peek_send_seq(&self) -> u16 {
        self.send_seq
    }

    /// Folds a newly observed peer sequence number into `recv_seq`, returning the number of
    /// packets lost since the previous observation (0 if none, or if this is the first packet).
    pub(super) fn observe_sequence(&mut self, seq: u16) -> u32 {
        let lost = if self.first_message_received {
            let gap = seq.wrapping_sub(self.recv_seq) as i16;
            if gap > 1 { (gap - 1) as u32 } else { 0 }
        } else {
            0
        };
        self.recv_seq = seq;
        self.first_message_received = true;
        self.lost_packet_count += lost;
        lost
    }

    pub(super) fn lost_packet_count(&self) -> u32 {
        self.lost_packet_count
    }

    /// The last peer sequence number observed, used to stamp outgoing `RS` receiver feedback.
    pub(super) fn recv_seq(&self) -> u16 {
        self.recv_seq
    }

    /// Appends an event to the outbound queue, failing if it is already at `MAX_BUFFER`.
    pub(super) fn queue_outbound(&mut self, event: OutboundEvent) -> Result<(), RtpMidiError> {
        if self.outbound.len() >= MAX_BUFFER {
            return Err(RtpMidiError::BufferFull { ssrc: self.ssrc.get() });
        }
        self.outbound.push_back(event);
        Ok(())
    }

    pub(super) fn drain_outbound(&mut self) -> Vec<OutboundEvent> {
        self.outbound.drain(..).collect()
    }

    pub(super) fn has_queued_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }

    pub(super) fn has_pending_sysex(&self) -> bool {
        !self.sysex_buffer.is_empty()
    }

    pub(super) fn append_sysex(&mut self, data: &[u8]) {
        self.sysex_buffer.extend_from_slice(data);
    }

    pub(super) fn take_sysex_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.sysex_buffer)
    }

    pub(super) fn bitrate_limit(&self) -> Option<u32> {
        self.bitrate_limit
    }

    /// Records the peer's advertised `RL` bitrate ceiling. Not currently enforced; retained
    /// so applications can inspect it via [`Participant`]'s public surface if needed later.
    pub(super) fn set_bitrate_limit(&mut self, limit: u32) {
        self.bitrate_limit = Some(limit);
    }
}

impl Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Participant {{ name: {}, addr: {}, ssrc: {} }}",
            self.name.to_str().unwrap_or("Unknown"),
            self.ctrl_addr,
            self.ssrc.get()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn participant() -> Participant {
        let name = CString::new("Test").unwrap();
        Participant::new(
            "127.0.0.1:5004".parse().unwrap(),
            ParticipantKind::Initiator,
            Some(U32::new(1)),
            &name,
            U32::new(42),
        )
    }

    #[test]
    fn data_endpoint_is_control_port_plus_one() {
        let participant = participant();
        assert_eq!(participant.data_endpoint().port(), 5005);
    }

    #[test]
    fn observe_sequence_counts_gap_as_loss() {
        let mut participant = participant();
        assert_eq!(participant.observe_sequence(10), 0);
        assert_eq!(participant.observe_sequence(13), 2);
        assert_eq!(participant.lost_packet_count(), 2);
    }

    #[test]
    fn observe_sequence_handles_wraparound() {
        let mut participant = participant();
        assert_eq!(participant.observe_sequence(0xFFFF), 0);
        assert_eq!(participant.observe_sequence(1), 1);
    }

    #[test]
    fn outbound_queue_respects_max_buffer() {
        let mut participant = participant();
        for _ in 0..MAX_BUFFER {
            participant.queue_outbound(OutboundEvent::SysEx(vec![])).unwrap();
        }
        assert!(participant.queue_outbound(OutboundEvent::SysEx(vec![])).is_err());
        assert_eq!(participant.drain_outbound().len(), MAX_BUFFER);
    }
}
