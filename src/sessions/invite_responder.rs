use std::{ffi::CStr, net::SocketAddr};

use crate::packets::control_packets::session_initiation_packet::SessionInitiationPacketBody;

pub type InviteHandler = dyn Fn(&SessionInitiationPacketBody, &CStr, &SocketAddr) -> bool + Send + Sync + 'static;

/// Governs whether an inbound session invitation (an `IN` on the control or data port) is
/// accepted. `Custom` lets the host inspect the requesting name/ssrc/address before deciding.
pub enum InviteResponder {
    Accept,
    Reject,
    Custom(Box<InviteHandler>),
}

impl InviteResponder {
    pub fn handle(&self, body: &SessionInitiationPacketBody, name: &CStr, addr: &SocketAddr) -> bool {
        match self {
            InviteResponder::Accept => true,
            InviteResponder::Reject => false,
            InviteResponder::Custom(handler) => handler(body, name, addr),
        }
    }

    pub fn new<F>(handler: F) -> InviteResponder
    where
        F: Fn(&SessionInitiationPacketBody, &CStr, &SocketAddr) -> bool + Send + Sync + 'static,
    {
        InviteResponder::Custom(Box::new(handler))
    }
}
