//! One-time code assembler
//!
//! Keeps the six single-digit slots of a two-factor code and tells the view
//! which slot should receive focus next.

use std::sync::Arc;

use tracing::debug;

/// Number of slots in a one-time code
pub const OTP_LENGTH: usize = 6;

/// Moves input focus between the code slots of the view
pub trait FocusController: Send + Sync {
    fn focus_slot(&self, index: usize);
}

/// Focus controller for front ends without focusable slots
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFocus;

impl FocusController for NoopFocus {
    fn focus_slot(&self, index: usize) {
        debug!("Focus requested for code slot {}", index);
    }
}

/// Six-slot one-time code with focus hints
#[derive(Clone)]
pub struct OtpAssembler {
    slots: [String; OTP_LENGTH],
    focus: Arc<dyn FocusController>,
}

impl std::fmt::Debug for OtpAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the code itself
        let filled = self.slots.iter().filter(|s| !s.is_empty()).count();
        f.debug_struct("OtpAssembler")
            .field("filled", &filled)
            .finish()
    }
}

fn is_digits(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit())
}

impl OtpAssembler {
    pub fn new(focus: Arc<dyn FocusController>) -> Self {
        Self {
            slots: Default::default(),
            focus,
        }
    }

    pub fn slots(&self) -> &[String; OTP_LENGTH] {
        &self.slots
    }

    /// Write one slot
    ///
    /// Rejected (returns false) when `value` is longer than one character,
    /// contains a non-digit, or `index` is out of range. An empty value clears
    /// the slot. A non-empty value moves focus to the next slot.
    pub fn set_digit(&mut self, index: usize, value: &str) -> bool {
        if index >= OTP_LENGTH || value.chars().count() > 1 || !is_digits(value) {
            return false;
        }

        self.slots[index] = value.to_string();

        if !value.is_empty() && index < OTP_LENGTH - 1 {
            self.focus.focus_slot(index + 1);
        }
        true
    }

    /// Backspace pressed on slot `index`
    ///
    /// Only moves focus back when the slot is already empty; removing the
    /// character itself is an ordinary [`set_digit`](Self::set_digit) with "".
    pub fn backspace_at(&self, index: usize) {
        if index > 0 && index < OTP_LENGTH && self.slots[index].is_empty() {
            self.focus.focus_slot(index - 1);
        }
    }

    /// Paste a whole code
    ///
    /// Takes the first six characters; if any of them is not a digit (or the
    /// text is empty) nothing changes. Otherwise all slots are replaced at
    /// once, unfilled trailing slots become empty.
    pub fn paste_sequence(&mut self, text: &str) -> bool {
        let pasted: Vec<char> = text.chars().take(OTP_LENGTH).collect();
        if pasted.is_empty() || !pasted.iter().all(|c| c.is_ascii_digit()) {
            debug!("Rejected pasted code");
            return false;
        }

        let mut next: [String; OTP_LENGTH] = Default::default();
        for (slot, c) in next.iter_mut().zip(pasted) {
            *slot = c.to_string();
        }
        self.slots = next;
        true
    }

    /// All slots concatenated in order
    pub fn join(&self) -> String {
        self.slots.concat()
    }

    /// Valid code: every slot holds a digit
    pub fn is_complete(&self) -> bool {
        self.join().len() == OTP_LENGTH
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}
