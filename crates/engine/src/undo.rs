use std::collections::VecDeque;

use slotkit_core::{SlotCommand, SlotNumber, UndoAction, VoiceNumber, VoiceSlots};
use slotkit_storage::{SampleStore, StorageError};
use tracing::debug;

use crate::error::EngineError;
use crate::moves::MoveEngine;
use crate::outcome::OperationOutcome;
use crate::service::SampleOperations;

pub struct UndoManager {
    undo_stack: VecDeque<UndoAction>,
    redo_stack: VecDeque<UndoAction>,
    max_depth: usize,
}

impl UndoManager {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth,
        }
    }

    pub fn push_undo(&mut self, action: UndoAction) {
        self.undo_stack.push_back(action);
        // Enforce depth limit by dropping oldest entry
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    pub fn pop_undo(&mut self) -> Option<UndoAction> {
        self.undo_stack.pop_back()
    }

    pub fn push_redo(&mut self, action: UndoAction) {
        self.redo_stack.push_back(action);
        if self.redo_stack.len() > self.max_depth {
            self.redo_stack.pop_front();
        }
    }

    pub fn pop_redo(&mut self) -> Option<UndoAction> {
        self.redo_stack.pop_back()
    }

    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The next action `undo` would reverse.
    pub fn peek_undo(&self) -> Option<&UndoAction> {
        self.undo_stack.back()
    }

    pub fn peek_redo(&self) -> Option<&UndoAction> {
        self.redo_stack.back()
    }
}

/// Execute an undo or redo plan against the store without recording history.
pub fn replay<S: SampleStore>(store: &mut S, commands: &[SlotCommand]) -> Result<(), EngineError> {
    check_plan(&*store, commands)?;
    for command in commands {
        debug!(?command, "replaying slot command");
        match command {
            SlotCommand::Add {
                kit_name,
                voice,
                slot,
                sample,
            } => {
                let options = sample.options();
                let outcome = SampleOperations::new(Some(&mut *store), kit_name)
                    .skip_undo_recording(true)
                    .add(*voice, *slot, &sample.source_path, &options);
                require(outcome)?;
            }
            SlotCommand::Replace {
                kit_name,
                voice,
                slot,
                sample,
            } => {
                let options = sample.options();
                let outcome = SampleOperations::new(Some(&mut *store), kit_name)
                    .skip_undo_recording(true)
                    .replace(*voice, *slot, &sample.source_path, &options);
                require(outcome)?;
            }
            SlotCommand::Delete {
                kit_name,
                voice,
                slot,
            } => {
                let outcome = SampleOperations::new(Some(&mut *store), kit_name)
                    .skip_undo_recording(true)
                    .delete(*voice, *slot);
                require(outcome)?;
            }
            SlotCommand::MoveInKit {
                kit_name,
                from_voice,
                from_slot,
                to_voice,
                to_slot,
                mode,
            } => {
                let outcome = MoveEngine::new(Some(&mut *store), kit_name)
                    .skip_undo_recording(true)
                    .move_sample(*from_voice, *from_slot, *to_voice, *to_slot, *mode, None);
                require(outcome)?;
            }
            SlotCommand::MoveBetweenKits {
                from_kit,
                from_voice,
                from_slot,
                to_kit,
                to_voice,
                to_slot,
                mode,
            } => {
                let outcome = MoveEngine::new(Some(&mut *store), from_kit)
                    .skip_undo_recording(true)
                    .move_sample(
                        *from_voice,
                        *from_slot,
                        *to_voice,
                        *to_slot,
                        *mode,
                        Some(to_kit.as_str()),
                    );
                require(outcome)?;
            }
            SlotCommand::RestoreVoices {
                kit_name,
                voices,
                snapshot,
            } => {
                for voice in voices {
                    clear_voice(store, kit_name, *voice)?;
                }
                let mut entries: Vec<_> = snapshot
                    .iter()
                    .filter(|e| voices.contains(&e.voice))
                    .collect();
                entries.sort_by_key(|e| (e.voice, e.slot));
                for entry in entries {
                    let options = entry.descriptor().options();
                    let outcome = SampleOperations::new(Some(&mut *store), kit_name)
                        .skip_undo_recording(true)
                        .add(entry.voice, entry.slot, &entry.source_path, &options);
                    require(outcome)?;
                }
            }
        }
    }
    Ok(())
}

/// Refuse a plan the store cannot carry out before any step runs, so a
/// missing call or a broken snapshot never leaves a voice half restored.
fn check_plan<S: SampleStore>(store: &S, commands: &[SlotCommand]) -> Result<(), EngineError> {
    let caps = store.capabilities();
    for command in commands {
        let needed = match command {
            SlotCommand::Add { .. } => vec![("add_sample", caps.add_sample)],
            SlotCommand::Replace { .. } => vec![("replace_sample", caps.replace_sample)],
            SlotCommand::Delete { .. } => vec![("delete_sample", caps.delete_sample)],
            SlotCommand::MoveInKit { .. } => vec![("move_sample_in_kit", caps.move_in_kit)],
            SlotCommand::MoveBetweenKits { .. } => {
                vec![("move_sample_between_kits", caps.move_between_kits)]
            }
            SlotCommand::RestoreVoices {
                voices, snapshot, ..
            } => {
                for voice in voices {
                    VoiceSlots::from_occupied(
                        *voice,
                        snapshot
                            .iter()
                            .filter(|e| e.voice == *voice)
                            .map(|e| (e.slot, e.descriptor())),
                    )?;
                }
                vec![
                    ("list_samples_for_kit", caps.list_samples),
                    ("delete_sample", caps.delete_sample),
                    ("add_sample", caps.add_sample),
                ]
            }
        };
        if let Some((call, _)) = needed.into_iter().find(|(_, offered)| !offered) {
            return Err(EngineError::Storage(StorageError::Unsupported(call)));
        }
    }
    Ok(())
}

/// Delete every sample of a voice, front to back.
fn clear_voice<S: SampleStore>(
    store: &mut S,
    kit_name: &str,
    voice: VoiceNumber,
) -> Result<(), EngineError> {
    let reply = store.list_samples_for_kit(kit_name)?;
    if !reply.success {
        return Err(EngineError::ReplayFailed(
            reply
                .error
                .unwrap_or_else(|| format!("could not list samples of kit {kit_name}")),
        ));
    }
    let count = reply
        .data
        .unwrap_or_default()
        .iter()
        .filter(|s| s.voice == voice)
        .count();
    let first = SlotNumber::new(0)?;
    for _ in 0..count {
        let outcome = SampleOperations::new(Some(&mut *store), kit_name)
            .skip_undo_recording(true)
            .delete(voice, first);
        require(outcome)?;
    }
    Ok(())
}

fn require(outcome: OperationOutcome) -> Result<(), EngineError> {
    if outcome.is_success() {
        Ok(())
    } else {
        Err(EngineError::ReplayFailed(outcome.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotkit_core::{SampleDescriptor, SampleOptions, SnapshotEntry, UndoKind};
    use slotkit_storage::SqliteStore;

    fn action(n: u8) -> UndoAction {
        UndoAction::new(UndoKind::AddSample {
            kit_name: "A0".into(),
            voice: VoiceNumber::new(1).unwrap(),
            slot: SlotNumber::new(n).unwrap(),
            sample: SampleDescriptor::from_path(&format!("/s/{n}.wav"), false),
        })
    }

    #[test]
    fn depth_limit_drops_oldest() {
        let mut manager = UndoManager::new(2);
        let first = action(0);
        manager.push_undo(first.clone());
        manager.push_undo(action(1));
        manager.push_undo(action(2));
        assert_eq!(manager.undo_depth(), 2);
        while let Some(a) = manager.pop_undo() {
            assert_ne!(a.id, first.id);
        }
    }

    #[test]
    fn undo_stack_is_lifo() {
        let mut manager = UndoManager::new(10);
        let a = action(0);
        let b = action(1);
        manager.push_undo(a.clone());
        manager.push_undo(b.clone());
        assert_eq!(manager.peek_undo().map(|x| x.id), Some(b.id));
        assert_eq!(manager.pop_undo().map(|x| x.id), Some(b.id));
        assert_eq!(manager.pop_undo().map(|x| x.id), Some(a.id));
        assert!(manager.pop_undo().is_none());
    }

    #[test]
    fn clear_redo_empties_redo() {
        let mut manager = UndoManager::new(10);
        manager.push_redo(action(0));
        assert_eq!(manager.redo_depth(), 1);
        manager.clear_redo();
        assert_eq!(manager.redo_depth(), 0);
        assert!(manager.peek_redo().is_none());
    }

    #[test]
    fn broken_snapshot_is_refused_before_clearing() -> Result<(), StorageError> {
        let mut store = SqliteStore::open_in_memory()?;
        store.create_kit("A0")?;
        let v1 = VoiceNumber::new(1).unwrap();
        store.add_sample("A0", v1, SlotNumber::new(0).unwrap(), "/s/a.wav", &SampleOptions::default())?;
        let gapped = SnapshotEntry {
            voice: v1,
            slot: SlotNumber::new(2).unwrap(),
            filename: "b.wav".into(),
            source_path: "/s/b.wav".into(),
            is_stereo: false,
            wav_bitrate: None,
            wav_sample_rate: None,
        };
        let plan = [SlotCommand::RestoreVoices {
            kit_name: "A0".into(),
            voices: vec![v1],
            snapshot: vec![gapped],
        }];
        assert!(matches!(replay(&mut store, &plan), Err(EngineError::Core(_))));
        assert_eq!(store.samples_for_voice("A0", v1)?.len(), 1);
        Ok(())
    }
}
