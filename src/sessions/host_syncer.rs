//! The maintenance task: a fixed-cadence tick (§5) that drives everything the receive loops
//! don't handle inline - invitation retries, the invite-state progression for participants we
//! initiated, CK heartbeat scheduling/retry, listener timeouts, and receiver-feedback emission.

use std::{net::SocketAddr, sync::Arc, time::{Duration, Instant}};

use tracing::{Level, event, instrument};
use zerocopy::network_endian::U32;

use crate::{
    error::RtpMidiError,
    packets::control_packets::{clock_sync_packet::ClockSyncPacket, control_packet::ControlPacket},
    participant::{InviteState, ParticipantKind},
};

use super::rtp_midi_session::{CK_MAX_TIMEOUT, CK_RETRY_INTERVAL, INVITE_MAX_ATTEMPTS, INVITE_RETRY_INTERVAL, MAX_CK0_ATTEMPTS, RECEIVER_FEEDBACK_THRESHOLD, SessionShared, TICK_INTERVAL};

pub(super) async fn run(shared: Arc<SessionShared>) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = shared.cancel_token.cancelled() => return,
            _ = ticker.tick() => tick(&shared).await,
        }
    }
}

#[instrument(skip_all)]
async fn tick(shared: &Arc<SessionShared>) {
    retry_pending_invitations(shared).await;
    progress_participants(shared).await;
    emit_receiver_feedback(shared).await;
}

/// Minimum spacing, per §4.6, before scheduling the next CK(0) heartbeat given how many have
/// already been sent to this participant.
fn heartbeat_interval(heartbeats_sent: u8) -> Duration {
    match heartbeats_sent {
        0 | 1 => Duration::from_millis(500),
        2..=6 => Duration::from_millis(1500),
        _ => CK_RETRY_INTERVAL,
    }
}

async fn retry_pending_invitations(shared: &Arc<SessionShared>) {
    let now = Instant::now();
    let mut to_resend = Vec::new();
    let mut to_give_up = Vec::new();

    {
        let mut pending = shared.pending_invitations.lock().await;
        for (&token, invitation) in pending.iter_mut() {
            if now.duration_since(invitation.last_sent) < INVITE_RETRY_INTERVAL {
                continue;
            }
            if invitation.attempts >= INVITE_MAX_ATTEMPTS {
                to_give_up.push((token, invitation.addr));
            } else {
                invitation.attempts += 1;
                invitation.last_sent = now;
                to_resend.push((token, invitation.addr));
            }
        }
        for (token, _) in &to_give_up {
            pending.remove(token);
        }
    }

    for (token, addr) in to_resend {
        let packet = ControlPacket::new_invitation(U32::new(token), shared.ssrc, &shared.name);
        if let Err(e) = shared.control_socket.send_to(&packet, addr).await {
            event!(Level::WARN, %addr, "failed to resend invitation: {}", e);
        }
    }

    for (_, addr) in to_give_up {
        event!(Level::INFO, %addr, "giving up on invitation after {} attempts", INVITE_MAX_ATTEMPTS);
        shared.raise(RtpMidiError::NoResponseFromConnectionRequest { addr }).await;
    }
}

enum Outcome {
    SendDataInvitation { token: U32, destination: SocketAddr },
    SendClockSync { packet: ClockSyncPacket, destination: SocketAddr },
    Removed(RemovalReason),
}

enum RemovalReason {
    NoResponse { addr: SocketAddr },
    ListenerTimeout,
    MaxAttempts { addr: SocketAddr, attempts: u8 },
}

async fn progress_participants(shared: &Arc<SessionShared>) {
    let now = Instant::now();
    let mut outcomes: Vec<(u32, Outcome)> = Vec::new();
    let mut joined = Vec::new();

    {
        let mut participants = shared.participants.lock().await;
        for (&ssrc, participant) in participants.iter_mut() {
            match participant.kind() {
                ParticipantKind::Initiator => match participant.invite_state() {
                    InviteState::ControlAccepted => {
                        let token = participant.initiator_token().unwrap_or(U32::new(0));
                        let destination = participant.data_endpoint();
                        participant.set_invite_state(InviteState::AwaitingDataOk);
                        participant.record_invite_sent();
                        outcomes.push((ssrc, Outcome::SendDataInvitation { token, destination }));
                    }
                    InviteState::AwaitingDataOk => {
                        if now.duration_since(participant.last_invite_sent()) >= INVITE_RETRY_INTERVAL {
                            if participant.connection_attempts() >= INVITE_MAX_ATTEMPTS {
                                outcomes.push((ssrc, Outcome::Removed(RemovalReason::NoResponse { addr: participant.addr() })));
                            } else {
                                let token = participant.initiator_token().unwrap_or(U32::new(0));
                                let destination = participant.data_endpoint();
                                participant.record_invite_sent();
                                outcomes.push((ssrc, Outcome::SendDataInvitation { token, destination }));
                            }
                        }
                    }
                    InviteState::DataAccepted => {
                        participant.set_invite_state(InviteState::Connected);
                        joined.push(participant.clone());
                    }
                    InviteState::Connected => {
                        if participant.synchronizing() {
                            if now.duration_since(participant.last_sync_exchange()) >= CK_RETRY_INTERVAL {
                                if participant.sync_count() >= MAX_CK0_ATTEMPTS {
                                    outcomes.push((
                                        ssrc,
                                        Outcome::Removed(RemovalReason::MaxAttempts {
                                            addr: participant.addr(),
                                            attempts: participant.sync_count(),
                                        }),
                                    ));
                                } else {
                                    participant.record_sync_attempt();
                                    participant.record_sync_exchange();
                                    let ts0 = shared.clock.now() as u64;
                                    let packet = ClockSyncPacket::new(shared.ssrc, 0, [ts0, 0, 0]);
                                    outcomes.push((ssrc, Outcome::SendClockSync { packet, destination: participant.data_endpoint() }));
                                }
                            }
                        } else {
                            let interval = heartbeat_interval(participant.sync_heartbeats());
                            if now.duration_since(participant.last_sync_exchange()) >= interval {
                                participant.begin_synchronizing();
                                participant.record_sync_heartbeat();
                                participant.record_sync_exchange();
                                let ts0 = shared.clock.now() as u64;
                                let packet = ClockSyncPacket::new(shared.ssrc, 0, [ts0, 0, 0]);
                                outcomes.push((ssrc, Outcome::SendClockSync { packet, destination: participant.data_endpoint() }));
                            }
                        }
                    }
                    InviteState::Initiating | InviteState::AwaitingControlOk => {
                        // Pre-ssrc states live in `pending_invitations`, not the participant
                        // table; a participant is only inserted once past this point.
                    }
                },
                ParticipantKind::Listener => {
                    if participant.is_connected() && now.duration_since(participant.last_sync_exchange()) > CK_MAX_TIMEOUT {
                        outcomes.push((ssrc, Outcome::Removed(RemovalReason::ListenerTimeout)));
                    }
                }
            }
        }
    }

    for (ssrc, outcome) in outcomes {
        match outcome {
            Outcome::SendDataInvitation { token, destination } => {
                shared.send_data_port_invitation(token, destination).await;
            }
            Outcome::SendClockSync { packet, destination } => {
                let bytes = ControlPacket::new_clock_sync(&packet);
                if let Err(e) = shared.data_socket.send_to(&bytes, destination).await {
                    event!(Level::WARN, "failed to send clock sync heartbeat: {}", e);
                }
            }
            Outcome::Removed(reason) => {
                match reason {
                    RemovalReason::NoResponse { addr } => {
                        shared.send_termination(&shared.data_socket, U32::new(ssrc), addr).await;
                        shared.remove_participant(ssrc).await;
                        shared.raise(RtpMidiError::NoResponseFromConnectionRequest { addr }).await;
                    }
                    RemovalReason::ListenerTimeout => {
                        let addr = {
                            let participants = shared.participants.lock().await;
                            participants.get(&ssrc).map(|p| p.addr())
                        };
                        if let Some(addr) = addr {
                            shared.send_termination(&shared.control_socket, U32::new(ssrc), addr).await;
                        }
                        shared.remove_participant(ssrc).await;
                        shared.raise(RtpMidiError::ListenerTimeOut { ssrc }).await;
                    }
                    RemovalReason::MaxAttempts { addr, attempts } => {
                        shared.send_termination(&shared.data_socket, U32::new(ssrc), addr).await;
                        shared.remove_participant(ssrc).await;
                        shared.raise(RtpMidiError::MaxAttempts { addr, attempts }).await;
                    }
                }
            }
        }
    }

    for participant in joined {
        shared.listeners.lock().await.notify_participant_joined(&participant);
        event!(Level::INFO, ssrc = participant.ssrc().get(), "participant connected");
    }
}

async fn emit_receiver_feedback(shared: &Arc<SessionShared>) {
    let now = Instant::now();
    let mut feedback = Vec::new();

    {
        let mut participants = shared.participants.lock().await;
        for participant in participants.values_mut() {
            if participant.receiver_feedback_pending() && now.duration_since(participant.receiver_feedback_start()) > RECEIVER_FEEDBACK_THRESHOLD {
                feedback.push((participant.recv_seq(), participant.addr()));
                participant.clear_receiver_feedback_pending();
            }
        }
    }

    for (seq, addr) in feedback {
        let packet = ControlPacket::new_receiver_feedback(shared.ssrc, seq);
        if let Err(e) = shared.control_socket.send_to(&packet, addr).await {
            event!(Level::WARN, %addr, "failed to send receiver feedback: {}", e);
        }
    }
}
