//! Rust library for sending and receiving MIDI over RTP (Real-time Transport Protocol), aka AppleMidi.
//!
//! This library is designed to be used with the `tokio` async runtime.
//! It provides a simple API for creating RTP MIDI sessions, sending and receiving MIDI messages, and handling invitations.
//!
//! # Features
//! - **Async**: Built on top of `tokio`, making it suitable for asynchronous applications.
//! - **Invitation Handling**: Can send and receive invitations to join RTP MIDI sessions.
//!   Users can control the logic for accepting or rejecting invitations.
//! - **SysEx Support**: Supports sending and receiving System Exclusive (SysEx) messages.
//! - **Clock Synchronization**: Runs the three-way CK exchange and tracks per-participant offsets.
//! - **mDNS Advertisement**: Optional, behind the `mdns` feature.
//!
//! ## Recovery Journal
//! The recovery journal (RFC 6295 §4) is implemented behind the `journal` feature. Journals are
//! conformant but minimal: by default a session emits empty journals (valid per the RFC) rather
//! than reconstructing full chapter history for every command type.
pub mod clock;
pub mod error;
pub mod packets;
pub mod participant;
pub mod sessions;
