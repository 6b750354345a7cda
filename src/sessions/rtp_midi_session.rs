use std::{collections::HashMap, ffi::CString, io, net::SocketAddr, sync::Arc, time::Instant};

use midi_types::{Channel, Control, MidiMessage, Note, Program, QuarterFrame, Value7, Value14};
use tokio::{net::UdpSocket, sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Level, event, instrument};
use zerocopy::network_endian::U32;

use crate::{
    clock::Clock,
    error::RtpMidiError,
    packets::control_packets::control_packet::ControlPacket,
    participant::{OutboundEvent, Participant},
};

use super::{control_port, events::event_handling::EventListeners, events::event_handling::EventType, host_syncer, invite_responder::InviteResponder, midi_port};

/// A session never tracks more peers than this; an inbound invitation past the limit is
/// rejected with `NO` and raises [`RtpMidiError::TooManyParticipants`].
pub const MAX_PARTICIPANTS: usize = 64;

pub(super) const INVITE_MAX_ATTEMPTS: u8 = 13;
pub(super) const INVITE_RETRY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);
pub(super) const MAX_CK0_ATTEMPTS: u8 = 5;
pub(super) const CK_RETRY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);
pub(super) const CK_MAX_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(61_000);
pub(super) const RECEIVER_FEEDBACK_THRESHOLD: std::time::Duration = std::time::Duration::from_secs(1);
pub(super) const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(10);

/// An invitation we sent that has not yet been accepted or rejected, tracked by the token we
/// put in the `IN` packet since the peer's ssrc is not known until it replies.
pub(super) struct PendingInvitation {
    pub(super) addr: SocketAddr,
    pub(super) attempts: u8,
    pub(super) last_sent: Instant,
}

/// State shared between the control-port task, the data-port task, and the maintenance task.
/// Each task holds its own `Arc` clone; the session itself holds one too, and drops it (along
/// with aborting the tasks) on `stop`/`Drop`.
pub(super) struct SessionShared {
    pub(super) name: CString,
    pub(super) ssrc: U32,
    pub(super) listen_port: u16,
    pub(super) clock: Clock,
    pub(super) control_socket: Arc<UdpSocket>,
    pub(super) data_socket: Arc<UdpSocket>,
    pub(super) participants: Mutex<HashMap<u32, Participant>>,
    pub(super) pending_invitations: Mutex<HashMap<u32, PendingInvitation>>,
    pub(super) listeners: Mutex<EventListeners>,
    pub(super) invite_responder: InviteResponder,
    pub(super) cancel_token: CancellationToken,
}

impl SessionShared {
    /// Removes a participant and fires `ParticipantLeftEvent`, if it was present.
    pub(super) async fn remove_participant(&self, ssrc: u32) {
        let removed = self.participants.lock().await.remove(&ssrc);
        if let Some(participant) = removed {
            event!(Level::INFO, ssrc, "removed participant");
            self.listeners.lock().await.notify_participant_left(&participant);
        }
    }

    pub(super) async fn raise(&self, error: RtpMidiError) {
        event!(Level::WARN, %error, "session error");
        self.listeners.lock().await.notify_exception(&error);
    }

    /// Sends the `IN` packet that starts (or retries) the data-port leg of the handshake.
    #[instrument(skip_all, fields(destination = %destination))]
    pub(super) async fn send_data_port_invitation(&self, token: U32, destination: SocketAddr) {
        let packet = ControlPacket::new_invitation(token, self.ssrc, &self.name);
        if let Err(e) = self.data_socket.send_to(&packet, destination).await {
            event!(Level::WARN, "failed to send data-port invitation: {}", e);
        }
    }

    pub(super) async fn send_termination(&self, socket: &UdpSocket, token: U32, destination: SocketAddr) {
        let packet = ControlPacket::new_termination(token, self.ssrc);
        if let Err(e) = socket.send_to(&packet, destination).await {
            event!(Level::WARN, "failed to send termination packet: {}", e);
        }
    }

    /// Replies `OK`, echoing `token`, on whichever socket the inviting leg arrived on.
    pub(super) async fn send_acceptance(&self, socket: &UdpSocket, token: U32, destination: SocketAddr) {
        let packet = ControlPacket::new_acceptance(token, self.ssrc, &self.name);
        if let Err(e) = socket.send_to(&packet, destination).await {
            event!(Level::WARN, "failed to send acceptance: {}", e);
        }
    }

    /// Replies `NO`, echoing `token`, on whichever socket the inviting leg arrived on.
    pub(super) async fn send_rejection(&self, socket: &UdpSocket, token: U32, destination: SocketAddr) {
        let packet = ControlPacket::new_rejection(token, self.ssrc);
        if let Err(e) = socket.send_to(&packet, destination).await {
            event!(Level::WARN, "failed to send rejection: {}", e);
        }
    }
}

fn device_id(listen_port: u16, ssrc: u32) -> String {
    format!("RtpMidi:{listen_port}:{ssrc}")
}

fn parse_device_id(device_id: &str) -> Option<u32> {
    let mut parts = device_id.split(':');
    if parts.next()? != "RtpMidi" {
        return None;
    }
    let _port: u16 = parts.next()?.parse().ok()?;
    parts.next()?.parse().ok()
}

/// A running AppleMIDI session: two bound UDP sockets (control at `listen_port`, data at
/// `listen_port + 1`), a participant table, and the background tasks that drive the handshake,
/// clock sync, and receiver feedback.
pub struct RtpMidiSession {
    shared: Arc<SessionShared>,
    tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
    #[cfg(feature = "mdns")]
    mdns: Option<mdns_sd::ServiceDaemon>,
}

impl RtpMidiSession {
    /// Binds the control and data sockets, starts the session's background tasks, and returns
    /// the running session. There is no separate `new`/`start` split: a session is only useful
    /// once its sockets exist, so construction and startup happen together.
    pub async fn start(port: u16, name: &str, ssrc: u32, invite_responder: InviteResponder) -> io::Result<Self> {
        let control_socket = Arc::new(UdpSocket::bind(("0.0.0.0", port)).await?);
        let data_socket = Arc::new(UdpSocket::bind(("0.0.0.0", port + 1)).await?);
        let name = CString::new(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let shared = Arc::new(SessionShared {
            name,
            ssrc: U32::new(ssrc),
            listen_port: port,
            clock: Clock::default(),
            control_socket,
            data_socket,
            participants: Mutex::new(HashMap::new()),
            pending_invitations: Mutex::new(HashMap::new()),
            listeners: Mutex::new(EventListeners::new()),
            invite_responder,
            cancel_token: CancellationToken::new(),
        });

        let mut tasks = Vec::with_capacity(3);
        tasks.push(tokio::spawn(control_port::run(shared.clone())));
        tasks.push(tokio::spawn(midi_port::run(shared.clone())));
        tasks.push(tokio::spawn(host_syncer::run(shared.clone())));

        #[cfg(feature = "mdns")]
        let mdns = super::mdns::advertise_mdns(shared.name.to_str().unwrap_or("RtpMidi Session"), port).ok();

        event!(Level::INFO, port, ssrc, "session started");

        Ok(RtpMidiSession {
            shared,
            tasks: std::sync::Mutex::new(tasks),
            #[cfg(feature = "mdns")]
            mdns,
        })
    }

    /// Cancels the background tasks and releases the sockets. Safe to call more than once.
    pub fn stop(&self) {
        self.shared.cancel_token.cancel();
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }

    pub fn is_started(&self) -> bool {
        !self.shared.cancel_token.is_cancelled()
    }

    pub fn name(&self) -> &str {
        self.shared.name.to_str().unwrap_or_default()
    }

    pub fn ssrc(&self) -> u32 {
        self.shared.ssrc.get()
    }

    pub fn listen_port(&self) -> u16 {
        self.shared.listen_port
    }

    pub fn device_id(&self) -> String {
        device_id(self.shared.listen_port, self.shared.ssrc.get())
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.shared.participants.lock().await.values().cloned().collect()
    }

    pub fn device_name(&self, device_id: &str) -> Option<(String, u32)> {
        let ssrc = parse_device_id(device_id)?;
        Some((self.name().to_owned(), ssrc))
    }

    /// Registers a callback for one of the session's event types (see
    /// [`crate::sessions::events::event_handling`]).
    pub async fn add_listener<E, F>(&self, marker: E, callback: F)
    where
        E: EventType,
        F: for<'a> Fn(E::Data<'a>) + Send + 'static,
    {
        let _ = marker;
        let mut listeners = self.shared.listeners.lock().await;
        E::add_listener_to_storage(&mut listeners, callback);
    }

    /// Begins the handshake with a peer at `addr`. Resolution (accept/reject/timeout) arrives
    /// asynchronously as a `ParticipantJoinedEvent` or an `ExceptionEvent`.
    #[instrument(skip(self), fields(destination = %addr))]
    pub async fn invite_participant(&self, addr: SocketAddr) -> io::Result<()> {
        let token = U32::new(rand::random::<u32>());
        let packet = ControlPacket::new_invitation(token, self.shared.ssrc, &self.shared.name);
        self.shared.control_socket.send_to(&packet, addr).await?;

        let mut pending = self.shared.pending_invitations.lock().await;
        pending.insert(
            token.get(),
            PendingInvitation {
                addr,
                attempts: 1,
                last_sent: Instant::now(),
            },
        );
        event!(Level::INFO, "sent invitation");
        Ok(())
    }

    async fn participant_by_device_id(&self, device_id: &str) -> Option<u32> {
        let ssrc = parse_device_id(device_id)?;
        let participants = self.shared.participants.lock().await;
        participants.contains_key(&ssrc).then_some(ssrc)
    }

    /// Queues `command` for every connected participant and flushes it immediately.
    pub async fn send_midi(&self, command: &crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage<'_>) -> io::Result<()> {
        let event = to_outbound_event(command);
        let ssrcs: Vec<u32> = {
            let participants = self.shared.participants.lock().await;
            participants.values().filter(|p| p.is_connected()).map(|p| p.ssrc().get()).collect()
        };

        let mut dropped = 0usize;
        for ssrc in ssrcs {
            if self.send_to_ssrc(ssrc, event.clone()).await.is_err() {
                dropped += 1;
            }
        }

        if dropped > 0 {
            let error = RtpMidiError::SendPacketsDropped { count: dropped };
            self.shared.raise(error.clone()).await;
            return Err(error.into());
        }
        Ok(())
    }

    /// Queues `command` for a single participant, addressed by its `device_id`.
    pub async fn send_midi_to(&self, device_id: &str, command: &crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage<'_>) -> io::Result<()> {
        let ssrc = self
            .participant_by_device_id(device_id)
            .await
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no participant with that device id"))?;
        self.send_to_ssrc(ssrc, to_outbound_event(command)).await
    }

    async fn send_to_ssrc(&self, ssrc: u32, event: OutboundEvent) -> io::Result<()> {
        let mut participants = self.shared.participants.lock().await;
        let participant = participants.get_mut(&ssrc).ok_or(RtpMidiError::ParticipantNotFound { ssrc })?;
        participant.queue_outbound(event)?;
        let queued = participant.drain_outbound();
        let seq = participant.next_send_seq();
        let destination = participant.data_endpoint();
        drop(participants);

        let events = build_midi_events(&queued);
        let bytes = crate::packets::midi_packets::midi_packet::MidiPacket::new_as_bytes(
            zerocopy::network_endian::U16::new(seq),
            self.shared.clock.now_u32(),
            self.shared.ssrc,
            &events,
            false,
        );
        self.shared.data_socket.send_to(&bytes, destination).await?;
        Ok(())
    }

    pub async fn send_note_on(&self, device_id: &str, channel: u8, note: u8, velocity: u8) -> io::Result<()> {
        let message = MidiMessage::NoteOn(Channel::from(channel), Note::from(note), Value7::from(velocity));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_note_off(&self, device_id: &str, channel: u8, note: u8, velocity: u8) -> io::Result<()> {
        let message = MidiMessage::NoteOff(Channel::from(channel), Note::from(note), Value7::from(velocity));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_poly_aftertouch(&self, device_id: &str, channel: u8, note: u8, pressure: u8) -> io::Result<()> {
        let message = MidiMessage::KeyPressure(Channel::from(channel), Note::from(note), Value7::from(pressure));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_control_change(&self, device_id: &str, channel: u8, controller: u8, value: u8) -> io::Result<()> {
        let message = MidiMessage::ControlChange(Channel::from(channel), Control::from(controller), Value7::from(value));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_program_change(&self, device_id: &str, channel: u8, program: u8) -> io::Result<()> {
        let message = MidiMessage::ProgramChange(Channel::from(channel), Program::from(program));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_channel_aftertouch(&self, device_id: &str, channel: u8, pressure: u8) -> io::Result<()> {
        let message = MidiMessage::ChannelPressure(Channel::from(channel), Value7::from(pressure));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_pitch_wheel(&self, device_id: &str, channel: u8, amount: u16) -> io::Result<()> {
        let amount = amount & 0x3FFF;
        let lsb = (amount & 0x7F) as u8;
        let msb = (amount >> 7) as u8;
        let message = MidiMessage::PitchBendChange(Channel::from(channel), Value14::from((lsb, msb)));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_system_exclusive(&self, device_id: &str, data: &[u8]) -> io::Result<()> {
        let command = crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage::SysEx { data, complete: true };
        self.send_midi_to(device_id, &command).await
    }

    pub async fn send_time_code_quarter_frame(&self, device_id: &str, data: u8) -> io::Result<()> {
        let message = MidiMessage::QuarterFrame(QuarterFrame::from(data));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_song_select(&self, device_id: &str, song: u8) -> io::Result<()> {
        let message = MidiMessage::SongSelect(Value7::from(song));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_song_position_pointer(&self, device_id: &str, amount: u16) -> io::Result<()> {
        let amount = amount & 0x3FFF;
        let lsb = (amount & 0x7F) as u8;
        let msb = (amount >> 7) as u8;
        let message = MidiMessage::SongPositionPointer(Value14::from((lsb, msb)));
        self.send_midi_to(device_id, &message.into()).await
    }

    pub async fn send_tune_request(&self, device_id: &str) -> io::Result<()> {
        self.send_midi_to(device_id, &MidiMessage::TuneRequest.into()).await
    }

    pub async fn send_timing_clock(&self, device_id: &str) -> io::Result<()> {
        self.send_midi_to(device_id, &MidiMessage::TimingClock.into()).await
    }

    pub async fn send_start(&self, device_id: &str) -> io::Result<()> {
        self.send_midi_to(device_id, &MidiMessage::Start.into()).await
    }

    pub async fn send_continue(&self, device_id: &str) -> io::Result<()> {
        self.send_midi_to(device_id, &MidiMessage::Continue.into()).await
    }

    pub async fn send_stop(&self, device_id: &str) -> io::Result<()> {
        self.send_midi_to(device_id, &MidiMessage::Stop.into()).await
    }

    pub async fn send_active_sensing(&self, device_id: &str) -> io::Result<()> {
        self.send_midi_to(device_id, &MidiMessage::ActiveSensing.into()).await
    }

    pub async fn send_reset(&self, device_id: &str) -> io::Result<()> {
        self.send_midi_to(device_id, &MidiMessage::Reset.into()).await
    }
}

fn to_outbound_event(command: &crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage<'_>) -> OutboundEvent {
    use crate::packets::midi_packets::rtp_midi_message::RtpMidiMessage;
    match command {
        RtpMidiMessage::MidiMessage(message) => OutboundEvent::Message(*message),
        RtpMidiMessage::SysEx { data, .. } => OutboundEvent::SysEx(data.to_vec()),
    }
}

fn build_midi_events(queued: &[OutboundEvent]) -> Vec<crate::packets::midi_packets::midi_event::MidiEvent<'_>> {
    use crate::packets::midi_packets::{midi_event::MidiEvent, rtp_midi_message::RtpMidiMessage};
    queued
        .iter()
        .map(|event| {
            let command = match event {
                OutboundEvent::Message(message) => RtpMidiMessage::MidiMessage(*message),
                OutboundEvent::SysEx(data) => RtpMidiMessage::SysEx { data, complete: true },
            };
            MidiEvent::new(Some(0), command)
        })
        .collect()
}

impl Drop for RtpMidiSession {
    fn drop(&mut self) {
        self.stop();
    }
}
