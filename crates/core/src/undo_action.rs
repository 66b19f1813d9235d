use serde::{Deserialize, Serialize};

use crate::clock::physical_now;
use crate::model::{PlacementMode, SampleDescriptor, SlotNumber, VoiceNumber};
use crate::{CoreError, UndoActionId};

/// A sample whose slot changed as a side effect of a delete or move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDelta {
    pub kit_name: String,
    pub voice: VoiceNumber,
    pub sample: SampleDescriptor,
    pub old_slot: SlotNumber,
    pub new_slot: SlotNumber,
}

/// One sample of a voice as it was before a same-kit move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub voice: VoiceNumber,
    pub slot: SlotNumber,
    pub filename: String,
    pub source_path: String,
    pub is_stereo: bool,
    #[serde(default)]
    pub wav_bitrate: Option<u32>,
    #[serde(default)]
    pub wav_sample_rate: Option<u32>,
}

impl SnapshotEntry {
    pub fn descriptor(&self) -> SampleDescriptor {
        SampleDescriptor {
            filename: self.filename.clone(),
            source_path: self.source_path.clone(),
            is_stereo: self.is_stereo,
            wav_bitrate: self.wav_bitrate,
            wav_sample_rate: self.wav_sample_rate,
        }
    }
}

/// What held a slot before a replace wrote to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "sample", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorOccupant {
    Empty,
    Sample(SampleDescriptor),
    /// The slot could not be read before the write.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UndoKind {
    AddSample {
        kit_name: String,
        voice: VoiceNumber,
        slot: SlotNumber,
        sample: SampleDescriptor,
    },
    ReplaceSample {
        kit_name: String,
        voice: VoiceNumber,
        slot: SlotNumber,
        old_sample: PriorOccupant,
        new_sample: SampleDescriptor,
    },
    /// A delete and the reindex it caused.
    ReindexSamples {
        kit_name: String,
        voice: VoiceNumber,
        deleted_slot: SlotNumber,
        deleted_sample: Option<SampleDescriptor>,
        affected: Vec<SlotDelta>,
    },
    MoveSample {
        kit_name: String,
        from_voice: VoiceNumber,
        from_slot: SlotNumber,
        to_voice: VoiceNumber,
        to_slot: SlotNumber,
        mode: PlacementMode,
        moved_sample: SampleDescriptor,
        /// Where the moved sample ended up; differs from `to_slot` when a
        /// same-voice move closes the gap it left behind.
        final_slot: SlotNumber,
        replaced_sample: Option<SampleDescriptor>,
        affected: Vec<SlotDelta>,
        snapshot: Vec<SnapshotEntry>,
    },
    MoveSampleBetweenKits {
        from_kit: String,
        from_voice: VoiceNumber,
        from_slot: SlotNumber,
        to_kit: String,
        to_voice: VoiceNumber,
        to_slot: SlotNumber,
        mode: PlacementMode,
        moved_sample: SampleDescriptor,
        final_slot: SlotNumber,
        replaced_sample: Option<SampleDescriptor>,
        affected: Vec<SlotDelta>,
    },
}

impl UndoKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::AddSample { .. } => "ADD_SAMPLE",
            Self::ReplaceSample { .. } => "REPLACE_SAMPLE",
            Self::ReindexSamples { .. } => "REINDEX_SAMPLES",
            Self::MoveSample { .. } => "MOVE_SAMPLE",
            Self::MoveSampleBetweenKits { .. } => "MOVE_SAMPLE_BETWEEN_KITS",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::AddSample {
                voice, slot, sample, ..
            } => format!(
                "Add sample {} to voice {}, slot {}",
                sample.filename,
                voice,
                slot.ordinal()
            ),
            Self::ReplaceSample {
                voice,
                slot,
                new_sample,
                ..
            } => format!(
                "Replace sample {} in voice {}, slot {}",
                new_sample.filename,
                voice,
                slot.ordinal()
            ),
            Self::ReindexSamples {
                voice,
                deleted_slot,
                deleted_sample,
                ..
            } => match deleted_sample {
                Some(sample) => format!(
                    "Delete sample {} from voice {}, slot {}",
                    sample.filename,
                    voice,
                    deleted_slot.ordinal()
                ),
                None => format!(
                    "Delete sample from voice {}, slot {}",
                    voice,
                    deleted_slot.ordinal()
                ),
            },
            Self::MoveSample {
                to_voice,
                to_slot,
                moved_sample,
                ..
            } => format!(
                "Move sample {} to voice {}, slot {}",
                moved_sample.filename,
                to_voice,
                to_slot.ordinal()
            ),
            Self::MoveSampleBetweenKits {
                to_kit,
                to_voice,
                to_slot,
                moved_sample,
                ..
            } => format!(
                "Move sample {} to kit {} voice {}, slot {}",
                moved_sample.filename,
                to_kit,
                to_voice,
                to_slot.ordinal()
            ),
        }
    }
}

/// An immutable record of one committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoAction {
    pub id: UndoActionId,
    pub timestamp_ms: u64,
    pub description: String,
    pub kind: UndoKind,
}

impl UndoAction {
    pub fn new(kind: UndoKind) -> Self {
        Self {
            id: UndoActionId::new(),
            timestamp_ms: physical_now().unwrap_or(0),
            description: kind.describe(),
            kind,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Port calls that reverse this action, in execution order.
    pub fn undo_commands(&self) -> Result<Vec<SlotCommand>, CoreError> {
        let commands = match &self.kind {
            UndoKind::AddSample {
                kit_name,
                voice,
                slot,
                ..
            } => vec![SlotCommand::Delete {
                kit_name: kit_name.clone(),
                voice: *voice,
                slot: *slot,
            }],

            UndoKind::ReplaceSample {
                kit_name,
                voice,
                slot,
                old_sample,
                ..
            } => match old_sample {
                PriorOccupant::Sample(old) => vec![SlotCommand::Replace {
                    kit_name: kit_name.clone(),
                    voice: *voice,
                    slot: *slot,
                    sample: old.clone(),
                }],
                // The replace filled an empty slot
                PriorOccupant::Empty => vec![SlotCommand::Delete {
                    kit_name: kit_name.clone(),
                    voice: *voice,
                    slot: *slot,
                }],
                PriorOccupant::Unknown => {
                    return Err(CoreError::Irreversible(format!(
                        "previous sample at voice {}, slot {} was not captured",
                        voice,
                        slot.ordinal()
                    )));
                }
            },

            // Adding at an occupied slot shifts later samples up, which is
            // exactly the reverse of the reindex.
            UndoKind::ReindexSamples {
                kit_name,
                voice,
                deleted_slot,
                deleted_sample,
                ..
            } => {
                let sample = deleted_sample.clone().ok_or_else(|| {
                    CoreError::Irreversible(format!(
                        "deleted sample at voice {}, slot {} was not captured",
                        voice,
                        deleted_slot.ordinal()
                    ))
                })?;
                vec![SlotCommand::Add {
                    kit_name: kit_name.clone(),
                    voice: *voice,
                    slot: *deleted_slot,
                    sample,
                }]
            }

            UndoKind::MoveSample {
                kit_name,
                from_voice,
                from_slot,
                to_voice,
                to_slot,
                final_slot,
                replaced_sample,
                snapshot,
                ..
            } => {
                if !snapshot.is_empty() {
                    let mut voices = vec![*from_voice];
                    if to_voice != from_voice {
                        voices.push(*to_voice);
                    }
                    vec![SlotCommand::RestoreVoices {
                        kit_name: kit_name.clone(),
                        voices,
                        snapshot: snapshot.clone(),
                    }]
                } else {
                    let mut commands = vec![SlotCommand::MoveInKit {
                        kit_name: kit_name.clone(),
                        from_voice: *to_voice,
                        from_slot: *final_slot,
                        to_voice: *from_voice,
                        to_slot: *from_slot,
                        mode: PlacementMode::Insert,
                    }];
                    if let Some(replaced) = replaced_sample {
                        commands.push(SlotCommand::Add {
                            kit_name: kit_name.clone(),
                            voice: *to_voice,
                            slot: *to_slot,
                            sample: replaced.clone(),
                        });
                    }
                    commands
                }
            }

            UndoKind::MoveSampleBetweenKits {
                from_kit,
                from_voice,
                from_slot,
                to_kit,
                to_voice,
                to_slot,
                final_slot,
                replaced_sample,
                ..
            } => {
                let mut commands = vec![SlotCommand::MoveBetweenKits {
                    from_kit: to_kit.clone(),
                    from_voice: *to_voice,
                    from_slot: *final_slot,
                    to_kit: from_kit.clone(),
                    to_voice: *from_voice,
                    to_slot: *from_slot,
                    mode: PlacementMode::Insert,
                }];
                if let Some(replaced) = replaced_sample {
                    commands.push(SlotCommand::Add {
                        kit_name: to_kit.clone(),
                        voice: *to_voice,
                        slot: *to_slot,
                        sample: replaced.clone(),
                    });
                }
                commands
            }
        };
        Ok(commands)
    }

    /// Port calls that re-apply this action after it was undone.
    pub fn redo_commands(&self) -> Vec<SlotCommand> {
        match &self.kind {
            UndoKind::AddSample {
                kit_name,
                voice,
                slot,
                sample,
            } => vec![SlotCommand::Add {
                kit_name: kit_name.clone(),
                voice: *voice,
                slot: *slot,
                sample: sample.clone(),
            }],
            UndoKind::ReplaceSample {
                kit_name,
                voice,
                slot,
                new_sample,
                ..
            } => vec![SlotCommand::Replace {
                kit_name: kit_name.clone(),
                voice: *voice,
                slot: *slot,
                sample: new_sample.clone(),
            }],
            UndoKind::ReindexSamples {
                kit_name,
                voice,
                deleted_slot,
                ..
            } => vec![SlotCommand::Delete {
                kit_name: kit_name.clone(),
                voice: *voice,
                slot: *deleted_slot,
            }],
            UndoKind::MoveSample {
                kit_name,
                from_voice,
                from_slot,
                to_voice,
                to_slot,
                mode,
                ..
            } => vec![SlotCommand::MoveInKit {
                kit_name: kit_name.clone(),
                from_voice: *from_voice,
                from_slot: *from_slot,
                to_voice: *to_voice,
                to_slot: *to_slot,
                mode: *mode,
            }],
            UndoKind::MoveSampleBetweenKits {
                from_kit,
                from_voice,
                from_slot,
                to_kit,
                to_voice,
                to_slot,
                mode,
                ..
            } => vec![SlotCommand::MoveBetweenKits {
                from_kit: from_kit.clone(),
                from_voice: *from_voice,
                from_slot: *from_slot,
                to_kit: to_kit.clone(),
                to_voice: *to_voice,
                to_slot: *to_slot,
                mode: *mode,
            }],
        }
    }
}

/// A single port-level step of an undo or redo plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotCommand {
    Add {
        kit_name: String,
        voice: VoiceNumber,
        slot: SlotNumber,
        sample: SampleDescriptor,
    },
    Replace {
        kit_name: String,
        voice: VoiceNumber,
        slot: SlotNumber,
        sample: SampleDescriptor,
    },
    Delete {
        kit_name: String,
        voice: VoiceNumber,
        slot: SlotNumber,
    },
    MoveInKit {
        kit_name: String,
        from_voice: VoiceNumber,
        from_slot: SlotNumber,
        to_voice: VoiceNumber,
        to_slot: SlotNumber,
        mode: PlacementMode,
    },
    MoveBetweenKits {
        from_kit: String,
        from_voice: VoiceNumber,
        from_slot: SlotNumber,
        to_kit: String,
        to_voice: VoiceNumber,
        to_slot: SlotNumber,
        mode: PlacementMode,
    },
    /// Empty `voices` and refill them from `snapshot`.
    RestoreVoices {
        kit_name: String,
        voices: Vec<VoiceNumber>,
        snapshot: Vec<SnapshotEntry>,
    },
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

    fn kick() -> SampleDescriptor {
        SampleDescriptor::from_path("/s/kick.wav", false)
    }

    #[test]
    fn add_description_is_one_based() {
        let action = UndoAction::new(UndoKind::AddSample {
            kit_name: "A0".into(),
            voice: voice(1),
            slot: slot(0),
            sample: kick(),
        });
        assert_eq!(action.description, "Add sample kick.wav to voice 1, slot 1");
        assert_eq!(action.type_name(), "ADD_SAMPLE");
        assert!(action.timestamp_ms > 0);
    }

    #[test]
    fn add_undoes_to_delete_and_redoes_to_add() {
        let action = UndoAction::new(UndoKind::AddSample {
            kit_name: "A0".into(),
            voice: voice(2),
            slot: slot(3),
            sample: kick(),
        });
        assert_eq!(
            action.undo_commands().unwrap(),
            vec![SlotCommand::Delete {
                kit_name: "A0".into(),
                voice: voice(2),
                slot: slot(3),
            }]
        );
        assert!(matches!(action.redo_commands()[0], SlotCommand::Add { .. }));
    }

    #[test]
    fn replace_of_empty_slot_undoes_to_delete() {
        let action = UndoAction::new(UndoKind::ReplaceSample {
            kit_name: "A0".into(),
            voice: voice(1),
            slot: slot(0),
            old_sample: PriorOccupant::Empty,
            new_sample: kick(),
        });
        assert!(matches!(
            action.undo_commands().unwrap()[0],
            SlotCommand::Delete { .. }
        ));
    }

    #[test]
    fn replace_of_unread_slot_is_irreversible() {
        let action = UndoAction::new(UndoKind::ReplaceSample {
            kit_name: "A0".into(),
            voice: voice(1),
            slot: slot(0),
            old_sample: PriorOccupant::Unknown,
            new_sample: kick(),
        });
        assert!(matches!(
            action.undo_commands(),
            Err(CoreError::Irreversible(_))
        ));
        assert!(matches!(action.redo_commands()[0], SlotCommand::Replace { .. }));
    }

    #[test]
    fn reindex_without_captured_sample_is_irreversible() {
        let action = UndoAction::new(UndoKind::ReindexSamples {
            kit_name: "A0".into(),
            voice: voice(1),
            deleted_slot: slot(0),
            deleted_sample: None,
            affected: Vec::new(),
        });
        assert_eq!(action.description, "Delete sample from voice 1, slot 1");
        assert!(matches!(
            action.undo_commands(),
            Err(CoreError::Irreversible(_))
        ));
    }

    #[test]
    fn move_with_snapshot_restores_both_voices() {
        let action = UndoAction::new(UndoKind::MoveSample {
            kit_name: "A0".into(),
            from_voice: voice(1),
            from_slot: slot(0),
            to_voice: voice(2),
            to_slot: slot(1),
            mode: PlacementMode::Insert,
            moved_sample: kick(),
            final_slot: slot(1),
            replaced_sample: None,
            affected: Vec::new(),
            snapshot: vec![SnapshotEntry {
                voice: voice(1),
                slot: slot(0),
                filename: "kick.wav".into(),
                source_path: "/s/kick.wav".into(),
                is_stereo: false,
                wav_bitrate: None,
                wav_sample_rate: None,
            }],
        });
        match &action.undo_commands().unwrap()[..] {
            [SlotCommand::RestoreVoices { voices, .. }] => {
                assert_eq!(voices, &vec![voice(1), voice(2)]);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn cross_kit_overwrite_undo_moves_back_then_restores_replaced() {
        let snare = SampleDescriptor::from_path("/s/snare.wav", true);
        let action = UndoAction::new(UndoKind::MoveSampleBetweenKits {
            from_kit: "A0".into(),
            from_voice: voice(1),
            from_slot: slot(0),
            to_kit: "B1".into(),
            to_voice: voice(3),
            to_slot: slot(0),
            mode: PlacementMode::Overwrite,
            moved_sample: kick(),
            final_slot: slot(0),
            replaced_sample: Some(snare.clone()),
            affected: Vec::new(),
        });
        assert_eq!(
            action.description,
            "Move sample kick.wav to kit B1 voice 3, slot 1"
        );
        let plan = action.undo_commands().unwrap();
        assert_eq!(plan.len(), 2);
        assert!(matches!(
            &plan[0],
            SlotCommand::MoveBetweenKits { from_kit, to_kit, mode: PlacementMode::Insert, .. }
                if from_kit == "B1" && to_kit == "A0"
        ));
        assert_eq!(
            plan[1],
            SlotCommand::Add {
                kit_name: "B1".into(),
                voice: voice(3),
                slot: slot(0),
                sample: snare,
            }
        );
    }
}
