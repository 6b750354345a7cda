//! The control-port receive loop: one of the session's three background tasks. Handles every
//! AppleMIDI control PDU except the CK exchange, which travels to/from the data endpoint and is
//! therefore handled by [`super::midi_port`] instead.

use std::{ffi::CStr, net::SocketAddr, sync::Arc};

use tracing::{Level, event, instrument};

use crate::{
    error::RtpMidiError,
    packets::control_packets::{
        bitrate_receive_limit_packet::BitrateReceiveLimitPacket, control_packet::ControlPacket, receiver_feedback_packet::ReceiverFeedbackPacket,
        session_initiation_packet::SessionInitiationPacketBody,
    },
    participant::{InviteState, Participant, ParticipantKind},
};

use super::{
    MAX_UDP_PACKET_SIZE,
    rtp_midi_session::{MAX_PARTICIPANTS, SessionShared},
};

pub(super) async fn run(shared: Arc<SessionShared>) {
    let mut buffer = vec![0u8; MAX_UDP_PACKET_SIZE];
    loop {
        let (len, src) = tokio::select! {
            _ = shared.cancel_token.cancelled() => return,
            result = shared.control_socket.recv_from(&mut buffer) => match result {
                Ok(received) => received,
                Err(e) => {
                    event!(Level::ERROR, "control socket recv failed: {}", e);
                    continue;
                }
            },
        };

        handle_datagram(&shared, &buffer[..len], src).await;
    }
}

#[instrument(skip(shared, data), fields(src = %src))]
async fn handle_datagram(shared: &Arc<SessionShared>, data: &[u8], src: SocketAddr) {
    let packet = match ControlPacket::from_be_bytes(data) {
        Ok(packet) => packet,
        Err(source) => {
            shared.raise(RtpMidiError::Parse { src, source }).await;
            return;
        }
    };

    event!(Level::TRACE, ?packet, "received control packet");

    match packet {
        ControlPacket::Invitation { body, name } => handle_invitation(shared, body, name, src).await,
        ControlPacket::Acceptance { body, name } => handle_acceptance(shared, body, name, src).await,
        ControlPacket::Rejection(body) => handle_rejection(shared, body).await,
        ControlPacket::Termination(body) => {
            shared.remove_participant(body.sender_ssrc().get()).await;
        }
        ControlPacket::ReceiverFeedback(packet) => handle_receiver_feedback(shared, packet).await,
        ControlPacket::BitrateReceiveLimit(packet) => handle_bitrate_limit(shared, packet).await,
        ControlPacket::ClockSync(_) => {
            // CK belongs on the data endpoint; seeing one here means a misbehaving peer.
            shared.raise(RtpMidiError::UnexpectedParse { src }).await;
        }
    }
}

/// Listener side of the control-port leg: accept or reject an inbound `IN`, per §4.5.
async fn handle_invitation(shared: &Arc<SessionShared>, body: &SessionInitiationPacketBody, name: &CStr, src: SocketAddr) {
    let ssrc = body.sender_ssrc();
    let token = body.initiator_token();

    let mut participants = shared.participants.lock().await;
    if participants.contains_key(&ssrc.get()) {
        // Already known, most likely a retransmitted IN; nothing further to do.
        return;
    }

    if participants.len() >= MAX_PARTICIPANTS {
        drop(participants);
        shared.send_rejection(&shared.control_socket, token, src).await;
        shared.raise(RtpMidiError::TooManyParticipants { max: MAX_PARTICIPANTS }).await;
        return;
    }

    if !shared.invite_responder.handle(body, name, &src) {
        drop(participants);
        shared.send_rejection(&shared.control_socket, token, src).await;
        return;
    }

    let mut participant = Participant::new(src, ParticipantKind::Listener, Some(token), name, ssrc);
    participant.set_invite_state(InviteState::ControlAccepted);
    participants.insert(ssrc.get(), participant);
    drop(participants);

    shared.send_acceptance(&shared.control_socket, token, src).await;
    event!(Level::INFO, ssrc = ssrc.get(), "accepted control-port invitation");
}

/// Initiator side: the peer accepted our control-port `IN`.
async fn handle_acceptance(shared: &Arc<SessionShared>, body: &SessionInitiationPacketBody, name: &CStr, src: SocketAddr) {
    let token = body.initiator_token();
    let ssrc = body.sender_ssrc();

    let mut pending = shared.pending_invitations.lock().await;
    let Some(invitation) = pending.remove(&token.get()) else {
        // Unknown token: a duplicate OK, or an invitation we already gave up on.
        return;
    };
    drop(pending);

    let mut participant = Participant::new(invitation.addr, ParticipantKind::Initiator, Some(token), name, ssrc);
    participant.set_invite_state(InviteState::ControlAccepted);

    let mut participants = shared.participants.lock().await;
    participants.insert(ssrc.get(), participant);
    drop(participants);

    event!(Level::INFO, ssrc = ssrc.get(), %src, "control-port invitation accepted");
}

async fn handle_rejection(shared: &Arc<SessionShared>, body: &SessionInitiationPacketBody) {
    let token = body.initiator_token();
    let mut pending = shared.pending_invitations.lock().await;
    if pending.remove(&token.get()).is_some() {
        event!(Level::INFO, token = token.get(), "invitation rejected by peer");
    }
}

async fn handle_receiver_feedback(shared: &Arc<SessionShared>, packet: &ReceiverFeedbackPacket) {
    let ssrc = packet.sender_ssrc().get();
    let acked_seq = packet.sequence_number();

    let dropped = {
        let participants = shared.participants.lock().await;
        participants.get(&ssrc).and_then(|participant| {
            let ahead = acked_seq.wrapping_sub(participant.peek_send_seq()) as i16;
            (ahead > 0).then_some(ahead as usize)
        })
    };

    if let Some(count) = dropped {
        shared.raise(RtpMidiError::SendPacketsDropped { count }).await;
    }
}

async fn handle_bitrate_limit(shared: &Arc<SessionShared>, packet: &BitrateReceiveLimitPacket) {
    let ssrc = packet.sender_ssrc().get();
    let mut participants = shared.participants.lock().await;
    if let Some(participant) = participants.get_mut(&ssrc) {
        participant.set_bitrate_limit(packet.bitrate_limit());
    }
}
