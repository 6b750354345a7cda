#[cfg(feature = "examples")]
#[tokio::main]
async fn main() {
    use midi_types::MidiMessage;
    use rtpmidi::sessions::{
        events::event_handling::MidiMessageEvent,
        invite_responder::InviteResponder,
        rtp_midi_session::RtpMidiSession,
    };
    use std::sync::Arc;
    use tracing::{Level, event};
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry().with(fmt::layer()).with(EnvFilter::from_default_env()).init();

    let session = Arc::new(
        RtpMidiSession::start(5004, "My Session", 54321, InviteResponder::Accept)
            .await
            .expect("failed to start RTP-MIDI session"),
    );

    let session_for_listener = session.clone();
    session
        .add_listener(MidiMessageEvent, move |(message, _delta_time)| {
            // Echo every NoteOn back down an octave to whichever peer sent it.
            if let MidiMessage::NoteOn(channel, note, velocity) = message {
                let down_an_octave: u8 = u8::from(note).saturating_sub(12);
                let response = MidiMessage::NoteOn(channel, down_an_octave.into(), velocity);
                let session = session_for_listener.clone();
                tokio::spawn(async move {
                    match session.send_midi(&response.into()).await {
                        Ok(()) => event!(Level::INFO, ?response, "sent transposed note"),
                        Err(err) => event!(Level::WARN, %err, "failed to send transposed note"),
                    }
                });
            }
        })
        .await;

    tokio::signal::ctrl_c().await.expect("failed to listen for Ctrl+C");
    session.stop();
}

#[cfg(not(feature = "examples"))]
fn main() {
    println!("This example requires the 'examples' feature to be enabled.");
}
