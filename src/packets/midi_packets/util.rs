pub(crate) trait StatusBit {
    fn status_bit(&self) -> bool;
    fn non_status_byte(&self) -> u8;
}

impl StatusBit for u8 {
    fn status_bit(&self) -> bool {
        self & 0x80 != 0
    }

    fn non_status_byte(&self) -> u8 {
        self & 0x7F
    }
}

/// Folds a newly written/read status byte into the running status per MIDI's running-status
/// rule: channel messages (`0x80..0xF0`) become the new running status, system-common
/// (`0xF0..0xF8`) clears it, and realtime (`0xF8..`) leaves whatever was running untouched
/// since a realtime byte can be interleaved mid-message without disturbing it.
pub(crate) fn update_running_status(running_status: Option<u8>, status: u8) -> Option<u8> {
    match status {
        0x80..0xF0 => Some(status),
        0xF0..0xF8 => None,
        _ => running_status,
    }
}
