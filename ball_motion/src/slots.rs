//! Per-object note bookkeeping.
//!
//! An object owns two named slots: the **stroke** slot, filled by notes
//! emitted on direction changes, and the **closing** slot, filled by the note
//! emitted when the object comes to rest.  The slots are tracked separately
//! but share one voice: sounding a note in either slot first releases
//! whatever is sounding, so an object never has two notes on at once.

/// Which slot a note belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteSlot {
    Stroke,
    Closing,
}

/// A change to the object's sounding note, in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteChange {
    On  { note: u8, slot: NoteSlot },
    Off { note: u8, slot: NoteSlot },
}

impl NoteChange {
    pub fn note(&self) -> u8 {
        match *self {
            NoteChange::On { note, .. } | NoteChange::Off { note, .. } => note,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, NoteChange::On { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteSlots {
    stroke:  Option<u8>,
    closing: Option<u8>,
}

impl NoteSlots {
    pub fn get(&self, slot: NoteSlot) -> Option<u8> {
        match slot {
            NoteSlot::Stroke  => self.stroke,
            NoteSlot::Closing => self.closing,
        }
    }

    fn slot_mut(&mut self, slot: NoteSlot) -> &mut Option<u8> {
        match slot {
            NoteSlot::Stroke  => &mut self.stroke,
            NoteSlot::Closing => &mut self.closing,
        }
    }

    /// The note currently sounding, and the slot holding it.
    pub fn sounding(&self) -> Option<(NoteSlot, u8)> {
        self.stroke.map(|n| (NoteSlot::Stroke, n))
            .or(self.closing.map(|n| (NoteSlot::Closing, n)))
    }

    /// Release the note in `slot`, if any.
    pub fn silence(&mut self, slot: NoteSlot, out: &mut Vec<NoteChange>) {
        if let Some(note) = self.slot_mut(slot).take() {
            out.push(NoteChange::Off { note, slot });
        }
    }

    /// Sound `note` in `slot`, releasing the sounding note first.
    pub fn sound(&mut self, slot: NoteSlot, note: u8, out: &mut Vec<NoteChange>) {
        if let Some((held, _)) = self.sounding() {
            self.silence(held, out);
        }
        *self.slot_mut(slot) = Some(note);
        out.push(NoteChange::On { note, slot });
    }

    /// Release everything.
    pub fn flush(&mut self, out: &mut Vec<NoteChange>) {
        self.silence(NoteSlot::Stroke, out);
        self.silence(NoteSlot::Closing, out);
    }
}
