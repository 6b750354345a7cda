//! The data-port receive loop: decodes RTP-MIDI data packets, dispatches decoded MIDI events
//! and reassembled SysEx to the event listeners, and completes the two protocol exchanges that
//! also land on this socket: the data-port leg of the invitation handshake, and the CK clock
//! sync exchange (§4.6) - both addressed to a peer's *data* endpoint by convention.

use std::{net::SocketAddr, sync::Arc};

use midi_types::MidiMessage;
use tracing::{Level, event, instrument};

use crate::{
    error::RtpMidiError,
    packets::{
        control_packets::{clock_sync_packet::ClockSyncPacket, control_packet::ControlPacket, session_initiation_packet::SessionInitiationPacketBody},
        midi_packets::{midi_packet::MidiPacket, rtp_midi_message::RtpMidiMessage},
        packet::RtpMidiPacket,
    },
    participant::InviteState,
};

use super::{MAX_UDP_PACKET_SIZE, rtp_midi_session::SessionShared};

pub(super) async fn run(shared: Arc<SessionShared>) {
    let mut buffer = vec![0u8; MAX_UDP_PACKET_SIZE];
    loop {
        let (len, src) = tokio::select! {
            _ = shared.cancel_token.cancelled() => return,
            result = shared.data_socket.recv_from(&mut buffer) => match result {
                Ok(received) => received,
                Err(e) => {
                    event!(Level::ERROR, "data socket recv failed: {}", e);
                    continue;
                }
            },
        };

        handle_datagram(&shared, &buffer[..len], src).await;
    }
}

#[instrument(skip(shared, data), fields(src = %src))]
async fn handle_datagram(shared: &Arc<SessionShared>, data: &[u8], src: SocketAddr) {
    let packet = match RtpMidiPacket::parse(data) {
        Ok(packet) => packet,
        Err(source) => {
            shared.raise(RtpMidiError::Parse { src, source }).await;
            return;
        }
    };

    match packet {
        RtpMidiPacket::Control(ControlPacket::Invitation { body, .. }) => handle_data_invitation(shared, body, src).await,
        RtpMidiPacket::Control(ControlPacket::Acceptance { body, .. }) => handle_data_acceptance(shared, body).await,
        RtpMidiPacket::Control(ControlPacket::Rejection(body)) | RtpMidiPacket::Control(ControlPacket::Termination(body)) => {
            shared.remove_participant(body.sender_ssrc().get()).await;
        }
        RtpMidiPacket::Control(ControlPacket::ClockSync(packet)) => handle_clock_sync(shared, packet, src).await,
        RtpMidiPacket::Control(other) => {
            event!(Level::WARN, ?other, "unexpected control packet on data port");
            shared.raise(RtpMidiError::UnexpectedParse { src }).await;
        }
        RtpMidiPacket::Midi(packet) => handle_midi(shared, packet).await,
    }
}

/// Listener side, second leg: an `IN` addressed to the data port for an ssrc we already
/// accepted on the control port.
async fn handle_data_invitation(shared: &Arc<SessionShared>, body: &SessionInitiationPacketBody, src: SocketAddr) {
    let ssrc = body.sender_ssrc();
    let token = body.initiator_token();

    let joined = {
        let mut participants = shared.participants.lock().await;
        match participants.get_mut(&ssrc.get()) {
            Some(participant) => {
                participant.set_invite_state(InviteState::Connected);
                Some(participant.clone())
            }
            None => None,
        }
    };

    match joined {
        Some(participant) => {
            shared.send_acceptance(&shared.data_socket, token, src).await;
            shared.listeners.lock().await.notify_participant_joined(&participant);
            event!(Level::INFO, ssrc = ssrc.get(), "participant connected");
        }
        None => {
            shared.send_rejection(&shared.data_socket, token, src).await;
            shared.raise(RtpMidiError::ParticipantNotFound { ssrc: ssrc.get() }).await;
        }
    }
}

/// Initiator side, second leg: the peer accepted our data-port `IN`. Progression to
/// `Connected` (and the `ParticipantJoinedEvent`) happens on the next maintenance tick, per
/// the handshake's literal scenario in §8.
async fn handle_data_acceptance(shared: &Arc<SessionShared>, body: &SessionInitiationPacketBody) {
    let ssrc = body.sender_ssrc().get();
    let mut participants = shared.participants.lock().await;
    match participants.get_mut(&ssrc) {
        Some(participant) if participant.invite_state() == InviteState::AwaitingDataOk => {
            participant.set_invite_state(InviteState::DataAccepted);
        }
        Some(_) => {}
        None => {
            drop(participants);
            shared.raise(RtpMidiError::ParticipantNotFound { ssrc }).await;
        }
    }
}

/// The three-way CK exchange, per §4.6. All three legs are exchanged on the data endpoint.
async fn handle_clock_sync(shared: &Arc<SessionShared>, packet: &ClockSyncPacket, src: SocketAddr) {
    let ssrc = packet.sender_ssrc().get();

    let known = { shared.participants.lock().await.contains_key(&ssrc) };
    if !known {
        shared.raise(RtpMidiError::ParticipantNotFound { ssrc }).await;
        return;
    }

    match packet.count() {
        0 => {
            // Responder: stamp ts1 and echo back.
            let now = shared.clock.now() as u64;
            {
                let mut participants = shared.participants.lock().await;
                if let Some(participant) = participants.get_mut(&ssrc) {
                    participant.record_sync_exchange();
                }
            }
            let reply = ClockSyncPacket::new(shared.ssrc, 1, [packet.timestamp(0), now, 0]);
            send_clock_sync(shared, &reply, src).await;
        }
        1 => {
            // Initiator: stamp ts2, send the closing leg, and stop treating this exchange as
            // in-flight.
            let now = shared.clock.now() as u64;
            {
                let mut participants = shared.participants.lock().await;
                if let Some(participant) = participants.get_mut(&ssrc) {
                    participant.record_sync_exchange();
                    participant.stop_synchronizing();
                }
            }
            let reply = ClockSyncPacket::new(shared.ssrc, 2, [packet.timestamp(0), packet.timestamp(1), now]);
            send_clock_sync(shared, &reply, src).await;
        }
        2 => {
            let ts0 = packet.timestamp(0) as i64;
            let ts1 = packet.timestamp(1) as i64;
            let ts2 = packet.timestamp(2) as i64;
            let offset = (ts2 + ts0) / 2 - ts1;

            let mut participants = shared.participants.lock().await;
            if let Some(participant) = participants.get_mut(&ssrc) {
                participant.set_offset_estimate(offset);
                participant.record_sync_exchange();
            }
            event!(Level::DEBUG, ssrc, offset, "clock sync exchange complete");
        }
        _ => {
            shared.raise(RtpMidiError::UnexpectedParse { src }).await;
        }
    }
}

async fn send_clock_sync(shared: &Arc<SessionShared>, packet: &ClockSyncPacket, destination: SocketAddr) {
    let bytes = ControlPacket::new_clock_sync(packet);
    if let Err(e) = shared.data_socket.send_to(&bytes, destination).await {
        event!(Level::WARN, "failed to send clock sync: {}", e);
    }
}

/// What to hand to the event listeners once a MIDI packet's commands are decoded. Built while
/// the participant table is locked (since SysEx reassembly mutates per-participant state), then
/// drained into listener callbacks once that lock is released.
enum Notification {
    Midi(MidiMessage, u32),
    SysEx(Vec<u8>),
}

async fn handle_midi(shared: &Arc<SessionShared>, packet: &MidiPacket) {
    let ssrc = packet.ssrc().get();
    let seq = packet.sequence_number().get();

    let notifications = {
        let mut participants = shared.participants.lock().await;
        let Some(participant) = participants.get_mut(&ssrc) else {
            drop(participants);
            shared.raise(RtpMidiError::ParticipantNotFound { ssrc }).await;
            return;
        };

        let lost = participant.observe_sequence(seq);
        participant.mark_receiver_feedback_pending();

        let continuing_sysex = participant.has_pending_sysex();
        let commands = if continuing_sysex { packet.commands_continuing_sysex() } else { packet.commands() };

        let mut notifications = Vec::new();
        for event in commands {
            match event.command() {
                RtpMidiMessage::MidiMessage(message) => notifications.push(Notification::Midi(*message, event.delta_time())),
                RtpMidiMessage::SysEx { data, complete: true } => {
                    if participant.has_pending_sysex() {
                        participant.append_sysex(data);
                        notifications.push(Notification::SysEx(participant.take_sysex_buffer()));
                    } else {
                        notifications.push(Notification::SysEx(data.to_vec()));
                    }
                }
                RtpMidiMessage::SysEx { data, complete: false } => {
                    participant.append_sysex(data);
                }
            }
        }

        if lost > 0 {
            drop(participants);
            shared.raise(RtpMidiError::ReceivedPacketsDropped { count: lost, ssrc }).await;
        }

        notifications
    };

    let listeners = shared.listeners.lock().await;
    for notification in notifications {
        match notification {
            Notification::Midi(message, delta_time) => listeners.notify_midi_message(message, delta_time),
            Notification::SysEx(data) => listeners.notify_sysex_packet(&data),
        }
    }
}
