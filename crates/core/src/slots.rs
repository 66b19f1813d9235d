use crate::model::{SLOTS_PER_VOICE, Sample, SampleDescriptor, SlotNumber, VoiceNumber};
use crate::CoreError;

/// Anything that can sit in a slot and be identified by its source path.
pub trait SlotOccupant {
    fn source_path(&self) -> &str;
}

impl SlotOccupant for Sample {
    fn source_path(&self) -> &str {
        &self.source_path
    }
}

impl SlotOccupant for SampleDescriptor {
    fn source_path(&self) -> &str {
        &self.source_path
    }
}

impl SlotOccupant for String {
    fn source_path(&self) -> &str {
        self
    }
}

/// In-memory model of one voice's slots.
///
/// Occupants always form an unbroken prefix `0..len`, at most
/// [`SLOTS_PER_VOICE`] long, with no source path appearing twice. Every
/// mutation validates before touching the entries, so a rejected call leaves
/// the voice exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSlots<T> {
    voice: VoiceNumber,
    entries: Vec<T>,
}

impl<T: SlotOccupant> VoiceSlots<T> {
    pub fn empty(voice: VoiceNumber) -> Self {
        Self {
            voice,
            entries: Vec::new(),
        }
    }

    /// Build from `(slot, occupant)` pairs in any order, rejecting layouts that
    /// break slot uniqueness, contiguity or path uniqueness.
    pub fn from_occupied(
        voice: VoiceNumber,
        rows: impl IntoIterator<Item = (SlotNumber, T)>,
    ) -> Result<Self, CoreError> {
        let mut rows: Vec<(SlotNumber, T)> = rows.into_iter().collect();
        rows.sort_by_key(|(slot, _)| *slot);

        let mut slots = Self::empty(voice);
        for (expected, (slot, item)) in rows.into_iter().enumerate() {
            if slot.index() < expected {
                return Err(CoreError::DuplicateSlot {
                    voice: voice.get(),
                    slot: slot.get(),
                });
            }
            if slot.index() > expected {
                return Err(CoreError::SlotGap {
                    voice: voice.get(),
                    slot: slot.get(),
                });
            }
            slots.check_unique_path(item.source_path(), None)?;
            slots.entries.push(item);
        }
        Ok(slots)
    }

    pub fn voice(&self) -> VoiceNumber {
        self.voice
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= SLOTS_PER_VOICE as usize
    }

    pub fn get(&self, slot: SlotNumber) -> Option<&T> {
        self.entries.get(slot.index())
    }

    pub fn position_of(&self, source_path: &str) -> Option<SlotNumber> {
        self.entries
            .iter()
            .position(|e| e.source_path() == source_path)
            .and_then(|i| SlotNumber::from_index(i).ok())
    }

    /// Occupants paired with their current slot, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotNumber, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| SlotNumber::from_index(i).ok().map(|s| (s, e)))
    }

    /// Put `item` at `slot`, shifting `slot..` up by one.
    pub fn insert(&mut self, slot: SlotNumber, item: T) -> Result<(), CoreError> {
        self.check_no_gap(slot)?;
        if self.is_full() {
            return Err(CoreError::VoiceFull {
                voice: self.voice.get(),
            });
        }
        self.check_unique_path(item.source_path(), None)?;
        self.entries.insert(slot.index(), item);
        Ok(())
    }

    /// Take the occupant of `slot`, shifting everything after it down by one.
    pub fn remove(&mut self, slot: SlotNumber) -> Result<T, CoreError> {
        if slot.index() >= self.entries.len() {
            return Err(CoreError::SlotEmpty {
                voice: self.voice.get(),
                slot: slot.get(),
            });
        }
        Ok(self.entries.remove(slot.index()))
    }

    /// Put `item` at `slot`, returning whatever occupied it. Writing to the
    /// first free slot appends.
    pub fn overwrite(&mut self, slot: SlotNumber, item: T) -> Result<Option<T>, CoreError> {
        self.check_no_gap(slot)?;
        if slot.index() == self.entries.len() {
            self.insert(slot, item)?;
            return Ok(None);
        }
        self.check_unique_path(item.source_path(), Some(slot))?;
        Ok(Some(std::mem::replace(&mut self.entries[slot.index()], item)))
    }

    fn check_no_gap(&self, slot: SlotNumber) -> Result<(), CoreError> {
        if slot.index() > self.entries.len() {
            return Err(CoreError::SlotGap {
                voice: self.voice.get(),
                slot: slot.get(),
            });
        }
        Ok(())
    }

    fn check_unique_path(&self, path: &str, ignore: Option<SlotNumber>) -> Result<(), CoreError> {
        let clash = self
            .entries
            .iter()
            .enumerate()
            .any(|(i, e)| Some(i) != ignore.map(|s| s.index()) && e.source_path() == path);
        if clash {
            return Err(CoreError::DuplicatePath {
                voice: self.voice.get(),
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(n: u8) -> VoiceNumber {
        VoiceNumber::new(n).unwrap()
    }

    fn slot(n: u8) -> SlotNumber {
        SlotNumber::new(n).unwrap()
    }

    fn filled(n: usize) -> VoiceSlots<String> {
        let rows = (0..n).map(|i| (SlotNumber::from_index(i).unwrap(), format!("/s/{i}.wav")));
        VoiceSlots::from_occupied(voice(1), rows).unwrap()
    }

    fn paths(v: &VoiceSlots<String>) -> Vec<&str> {
        v.iter().map(|(_, p)| p.as_str()).collect()
    }

    #[test]
    fn from_occupied_sorts_rows() {
        let v = VoiceSlots::from_occupied(
            voice(2),
            vec![(slot(1), "b".to_string()), (slot(0), "a".to_string())],
        )
        .unwrap();
        assert_eq!(paths(&v), vec!["a", "b"]);
    }

    #[test]
    fn from_occupied_rejects_gap() {
        let err = VoiceSlots::from_occupied(
            voice(1),
            vec![(slot(0), "a".to_string()), (slot(2), "c".to_string())],
        )
        .unwrap_err();
        assert_eq!(err, CoreError::SlotGap { voice: 1, slot: 2 });
    }

    #[test]
    fn from_occupied_rejects_duplicate_slot() {
        let err = VoiceSlots::from_occupied(
            voice(1),
            vec![(slot(0), "a".to_string()), (slot(0), "b".to_string())],
        )
        .unwrap_err();
        assert_eq!(err, CoreError::DuplicateSlot { voice: 1, slot: 0 });
    }

    #[test]
    fn from_occupied_rejects_duplicate_path() {
        let err = VoiceSlots::from_occupied(
            voice(1),
            vec![(slot(0), "a".to_string()), (slot(1), "a".to_string())],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicatePath { voice: 1, .. }));
    }

    #[test]
    fn insert_shifts_later_occupants() {
        let mut v = filled(3);
        v.insert(slot(1), "new".to_string()).unwrap();
        assert_eq!(paths(&v), vec!["/s/0.wav", "new", "/s/1.wav", "/s/2.wav"]);
    }

    #[test]
    fn insert_past_first_free_slot_is_a_gap() {
        let mut v = filled(2);
        let err = v.insert(slot(3), "x".to_string()).unwrap_err();
        assert_eq!(err, CoreError::SlotGap { voice: 1, slot: 3 });
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn insert_into_full_voice_fails_unchanged() {
        let mut v = filled(12);
        let before = v.clone();
        let err = v.insert(slot(0), "x".to_string()).unwrap_err();
        assert_eq!(err, CoreError::VoiceFull { voice: 1 });
        assert_eq!(v, before);
    }

    #[test]
    fn remove_closes_the_gap() {
        let mut v = filled(3);
        let removed = v.remove(slot(0)).unwrap();
        assert_eq!(removed, "/s/0.wav");
        assert_eq!(paths(&v), vec!["/s/1.wav", "/s/2.wav"]);
        assert!(v.remove(slot(2)).is_err());
    }

    #[test]
    fn overwrite_returns_previous_occupant() {
        let mut v = filled(2);
        let old = v.overwrite(slot(1), "new".to_string()).unwrap();
        assert_eq!(old.as_deref(), Some("/s/1.wav"));
        assert_eq!(paths(&v), vec!["/s/0.wav", "new"]);
    }

    #[test]
    fn overwrite_first_free_slot_appends() {
        let mut v = filled(2);
        assert_eq!(v.overwrite(slot(2), "new".to_string()).unwrap(), None);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn overwrite_with_same_path_in_place_is_allowed() {
        let mut v = filled(2);
        assert!(v.overwrite(slot(1), "/s/1.wav".to_string()).is_ok());
        assert!(v.overwrite(slot(1), "/s/0.wav".to_string()).is_err());
    }
}
