use std::collections::BTreeSet;

use rusqlite::{Connection, OptionalExtension, Transaction};
use tracing::debug;

use slotkit_core::{
    Kit, PlacementMode, Sample, SampleDescriptor, SampleId, SampleOptions, SlotDelta, SlotNumber,
    Voice, VoiceNumber, VoiceSlots, filename_of,
};

use crate::error::StorageError;
use crate::traits::{
    AddedSample, Capabilities, DeletedSample, MovedSample, SampleStore, StoreReply,
};

/// Id carried by a sample that exists only in memory until the layout is written.
const PENDING_ID: SampleId = 0;

const SAMPLE_COLUMNS: &str = "id, kit_name, voice_number, slot_number, filename, source_path, is_stereo, wav_bitrate, wav_sample_rate";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Create a kit together with its four voices.
    pub fn create_kit(&mut self, name: &str) -> Result<Kit, StorageError> {
        let tx = self.conn.transaction()?;
        let result = tx.execute(
            "INSERT INTO kits (name, bank_id) VALUES (?1, ?2)",
            rusqlite::params![name, Kit::bank_for(name)],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StorageError::ConstraintViolation(format!(
                    "kit {name} already exists"
                )));
            }
            Err(e) => return Err(StorageError::Sqlite(e)),
        }
        for voice in VoiceNumber::all() {
            tx.execute(
                "INSERT INTO voices (kit_name, voice_number) VALUES (?1, ?2)",
                rusqlite::params![name, voice.get()],
            )?;
        }
        tx.commit()?;
        self.get_kit(name)?
            .ok_or_else(|| StorageError::NotFound(format!("kit {name}")))
    }

    pub fn get_kit(&self, name: &str) -> Result<Option<Kit>, StorageError> {
        let kit = self
            .conn
            .query_row(
                "SELECT name, bank_id, alias, editable, locked, modified FROM kits WHERE name = ?1",
                rusqlite::params![name],
                read_kit,
            )
            .optional()?;
        Ok(kit)
    }

    pub fn voices_for_kit(&self, kit_name: &str) -> Result<Vec<Voice>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT kit_name, voice_number, alias FROM voices WHERE kit_name = ?1 ORDER BY voice_number",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![kit_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u8>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(kit_name, number, alias)| {
                Ok(Voice {
                    kit_name,
                    voice_number: VoiceNumber::new(number)?,
                    alias,
                })
            })
            .collect()
    }

    pub fn set_kit_editable(&mut self, name: &str, editable: bool) -> Result<(), StorageError> {
        self.update_kit_flag("editable", name, editable)
    }

    pub fn set_kit_locked(&mut self, name: &str, locked: bool) -> Result<(), StorageError> {
        self.update_kit_flag("locked", name, locked)
    }

    fn update_kit_flag(&mut self, column: &str, name: &str, value: bool) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            &format!("UPDATE kits SET {column} = ?1 WHERE name = ?2"),
            rusqlite::params![value, name],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("kit {name}")));
        }
        Ok(())
    }

    pub fn samples_for_kit(&self, kit_name: &str) -> Result<Vec<Sample>, StorageError> {
        query_samples(
            &self.conn,
            &format!(
                "SELECT {SAMPLE_COLUMNS} FROM samples WHERE kit_name = ?1 ORDER BY voice_number, slot_number"
            ),
            rusqlite::params![kit_name],
        )
    }

    pub fn samples_for_voice(
        &self,
        kit_name: &str,
        voice: VoiceNumber,
    ) -> Result<Vec<Sample>, StorageError> {
        query_samples(
            &self.conn,
            &format!(
                "SELECT {SAMPLE_COLUMNS} FROM samples WHERE kit_name = ?1 AND voice_number = ?2 ORDER BY slot_number"
            ),
            rusqlite::params![kit_name, voice.get()],
        )
    }

    /// Relocate one sample, possibly across kits. Rejections roll back with the
    /// dropped transaction.
    #[allow(clippy::too_many_arguments)]
    fn relocate(
        &mut self,
        from_kit: &str,
        from_voice: VoiceNumber,
        from_slot: SlotNumber,
        to_kit: &str,
        to_voice: VoiceNumber,
        to_slot: SlotNumber,
        mode: PlacementMode,
    ) -> Result<StoreReply<MovedSample>, StorageError> {
        let tx = self.conn.transaction()?;
        for kit in [from_kit, to_kit] {
            if let Some(reason) = kit_write_rejection(&tx, kit)? {
                return Ok(StoreReply::rejected(reason));
            }
        }

        let same_voice = from_kit == to_kit && from_voice == to_voice;
        if same_voice && from_slot == to_slot {
            return Ok(StoreReply::rejected(
                "Source and destination are the same slot",
            ));
        }

        let mut source = load_voice(&tx, from_kit, from_voice)?;
        let moved = match source.remove(from_slot) {
            Ok(sample) => sample,
            Err(e) => return Ok(StoreReply::rejected(e.to_string())),
        };
        let moved_id = moved.id;
        let moved_path = moved.source_path.clone();

        let mut target = if same_voice {
            None
        } else {
            Some(load_voice(&tx, to_kit, to_voice)?)
        };
        let placed = {
            let dest = target.as_mut().unwrap_or(&mut source);
            // Within one voice the source slot is already gone, so positions
            // past it have shifted down by one.
            let dest_slot = match (same_voice, mode) {
                (true, PlacementMode::Insert) => {
                    SlotNumber::from_index(to_slot.index().min(dest.len()))?
                }
                (true, PlacementMode::Overwrite) if from_slot < to_slot => {
                    SlotNumber::from_index(to_slot.index() - 1)?
                }
                _ => to_slot,
            };
            match mode {
                PlacementMode::Insert => dest.insert(dest_slot, moved.clone()).map(|()| None),
                PlacementMode::Overwrite => dest.overwrite(dest_slot, moved.clone()),
            }
        };
        let replaced = match placed {
            Ok(replaced) => replaced,
            Err(e) => return Ok(StoreReply::rejected(e.to_string())),
        };

        let final_slot = target
            .as_ref()
            .unwrap_or(&source)
            .position_of(&moved_path)
            .ok_or_else(|| StorageError::NotFound(format!("moved sample {moved_path}")))?;

        let removed: Vec<SampleId> = replaced.iter().map(|s| s.id).collect();
        let mut layouts = vec![VoiceLayout {
            kit_name: from_kit,
            slots: &source,
        }];
        if let Some(target) = &target {
            layouts.push(VoiceLayout {
                kit_name: to_kit,
                slots: target,
            });
        }
        let written = write_layouts(&tx, &layouts, &removed, Some(moved_id))?;
        tx.commit()?;

        debug!(
            from_kit,
            from_voice = from_voice.get(),
            from_slot = from_slot.get(),
            to_kit,
            to_voice = to_voice.get(),
            final_slot = final_slot.get(),
            affected = written.affected.len(),
            "sample moved"
        );

        Ok(StoreReply::ok(MovedSample {
            moved_sample: Sample {
                kit_name: to_kit.to_string(),
                voice: to_voice,
                slot: final_slot,
                ..moved
            },
            replaced_sample: replaced,
            affected_samples: written.affected,
        }))
    }
}

impl SampleStore for SqliteStore {
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn add_sample(
        &mut self,
        kit_name: &str,
        voice: VoiceNumber,
        slot: SlotNumber,
        source_path: &str,
        options: &SampleOptions,
    ) -> Result<StoreReply<AddedSample>, StorageError> {
        let tx = self.conn.transaction()?;
        if let Some(reason) = kit_write_rejection(&tx, kit_name)? {
            return Ok(StoreReply::rejected(reason));
        }

        let mut slots = load_voice(&tx, kit_name, voice)?;
        let sample = pending_sample(kit_name, voice, slot, source_path, options);
        if let Err(e) = slots.insert(slot, sample) {
            return Ok(StoreReply::rejected(e.to_string()));
        }
        let written = write_layouts(&tx, &[VoiceLayout { kit_name, slots: &slots }], &[], None)?;
        tx.commit()?;

        let sample_id = written
            .inserted
            .first()
            .copied()
            .ok_or_else(|| StorageError::NotFound(format!("inserted sample {source_path}")))?;
        debug!(kit_name, voice = voice.get(), slot = slot.get(), sample_id, "sample added");
        Ok(StoreReply::ok(AddedSample { sample_id }))
    }

    fn replace_sample(
        &mut self,
        kit_name: &str,
        voice: VoiceNumber,
        slot: SlotNumber,
        source_path: &str,
        options: &SampleOptions,
    ) -> Result<StoreReply<AddedSample>, StorageError> {
        let tx = self.conn.transaction()?;
        if let Some(reason) = kit_write_rejection(&tx, kit_name)? {
            return Ok(StoreReply::rejected(reason));
        }

        let mut slots = load_voice(&tx, kit_name, voice)?;
        let sample = pending_sample(kit_name, voice, slot, source_path, options);
        let sample_id = match slots.overwrite(slot, sample) {
            Err(e) => return Ok(StoreReply::rejected(e.to_string())),
            // Replacing keeps the row and rewrites what it points at
            Ok(Some(old)) => {
                tx.execute(
                    "UPDATE samples SET filename = ?1, source_path = ?2, is_stereo = ?3, wav_bitrate = ?4, wav_sample_rate = ?5 WHERE id = ?6",
                    rusqlite::params![
                        filename_of(source_path),
                        source_path,
                        options.stereo,
                        options.wav_bitrate,
                        options.wav_sample_rate,
                        old.id,
                    ],
                )?;
                mark_modified(&tx, kit_name)?;
                old.id
            }
            Ok(None) => {
                let written =
                    write_layouts(&tx, &[VoiceLayout { kit_name, slots: &slots }], &[], None)?;
                written.inserted.first().copied().ok_or_else(|| {
                    StorageError::NotFound(format!("inserted sample {source_path}"))
                })?
            }
        };
        tx.commit()?;
        debug!(kit_name, voice = voice.get(), slot = slot.get(), sample_id, "sample replaced");
        Ok(StoreReply::ok(AddedSample { sample_id }))
    }

    fn delete_sample(
        &mut self,
        kit_name: &str,
        voice: VoiceNumber,
        slot: SlotNumber,
    ) -> Result<StoreReply<DeletedSample>, StorageError> {
        let tx = self.conn.transaction()?;
        if let Some(reason) = kit_write_rejection(&tx, kit_name)? {
            return Ok(StoreReply::rejected(reason));
        }

        let mut slots = load_voice(&tx, kit_name, voice)?;
        let removed = match slots.remove(slot) {
            Ok(sample) => sample,
            Err(e) => return Ok(StoreReply::rejected(e.to_string())),
        };
        let written = write_layouts(
            &tx,
            &[VoiceLayout { kit_name, slots: &slots }],
            &[removed.id],
            None,
        )?;
        tx.commit()?;
        debug!(
            kit_name,
            voice = voice.get(),
            slot = slot.get(),
            reindexed = written.affected.len(),
            "sample deleted"
        );
        Ok(StoreReply::ok(DeletedSample {
            affected_samples: written.affected,
        }))
    }

    fn move_sample_in_kit(
        &mut self,
        kit_name: &str,
        from_voice: VoiceNumber,
        from_slot: SlotNumber,
        to_voice: VoiceNumber,
        to_slot: SlotNumber,
        mode: PlacementMode,
    ) -> Result<StoreReply<MovedSample>, StorageError> {
        self.relocate(kit_name, from_voice, from_slot, kit_name, to_voice, to_slot, mode)
    }

    fn move_sample_between_kits(
        &mut self,
        from_kit: &str,
        from_voice: VoiceNumber,
        from_slot: SlotNumber,
        to_kit: &str,
        to_voice: VoiceNumber,
        to_slot: SlotNumber,
        mode: PlacementMode,
    ) -> Result<StoreReply<MovedSample>, StorageError> {
        self.relocate(from_kit, from_voice, from_slot, to_kit, to_voice, to_slot, mode)
    }

    fn list_samples_for_kit(&self, kit_name: &str) -> Result<StoreReply<Vec<Sample>>, StorageError> {
        if self.get_kit(kit_name)?.is_none() {
            return Ok(StoreReply::rejected(format!("Kit {kit_name} not found")));
        }
        Ok(StoreReply::ok(self.samples_for_kit(kit_name)?))
    }
}

fn read_kit(row: &rusqlite::Row) -> Result<Kit, rusqlite::Error> {
    Ok(Kit {
        name: row.get(0)?,
        bank_id: row.get(1)?,
        alias: row.get(2)?,
        editable: row.get(3)?,
        locked: row.get(4)?,
        modified: row.get(5)?,
    })
}

fn read_sample(row: &rusqlite::Row) -> Result<Sample, StorageError> {
    let voice: u8 = row.get(2)?;
    let slot: u8 = row.get(3)?;
    Ok(Sample {
        id: row.get(0)?,
        kit_name: row.get(1)?,
        voice: VoiceNumber::new(voice)?,
        slot: SlotNumber::new(slot)?,
        filename: row.get(4)?,
        source_path: row.get(5)?,
        is_stereo: row.get(6)?,
        wav_bitrate: row.get(7)?,
        wav_sample_rate: row.get(8)?,
    })
}

fn query_samples(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Sample>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut samples = Vec::new();
    while let Some(row) = rows.next()? {
        samples.push(read_sample(row)?);
    }
    Ok(samples)
}

/// Why a write to `kit_name` must be refused, if it must.
fn kit_write_rejection(tx: &Transaction, kit_name: &str) -> Result<Option<String>, StorageError> {
    let flags: Option<(bool, bool)> = tx
        .query_row(
            "SELECT editable, locked FROM kits WHERE name = ?1",
            rusqlite::params![kit_name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(match flags {
        None => Some(format!("Kit {kit_name} not found")),
        Some((false, _)) => Some(format!("Kit {kit_name} is not editable")),
        Some((_, true)) => Some(format!("Kit {kit_name} is locked")),
        Some(_) => None,
    })
}

fn mark_modified(tx: &Transaction, kit_name: &str) -> Result<(), StorageError> {
    tx.execute(
        "UPDATE kits SET modified = 1 WHERE name = ?1",
        rusqlite::params![kit_name],
    )?;
    Ok(())
}

fn load_voice(
    tx: &Transaction,
    kit_name: &str,
    voice: VoiceNumber,
) -> Result<VoiceSlots<Sample>, StorageError> {
    let rows = query_samples(
        tx,
        &format!(
            "SELECT {SAMPLE_COLUMNS} FROM samples WHERE kit_name = ?1 AND voice_number = ?2"
        ),
        rusqlite::params![kit_name, voice.get()],
    )?;
    let slots = VoiceSlots::from_occupied(voice, rows.into_iter().map(|s| (s.slot, s)))?;
    Ok(slots)
}

fn pending_sample(
    kit_name: &str,
    voice: VoiceNumber,
    slot: SlotNumber,
    source_path: &str,
    options: &SampleOptions,
) -> Sample {
    let descriptor = SampleDescriptor::with_options(source_path, options);
    Sample {
        id: PENDING_ID,
        kit_name: kit_name.to_string(),
        voice,
        slot,
        filename: descriptor.filename,
        source_path: descriptor.source_path,
        is_stereo: descriptor.is_stereo,
        wav_bitrate: descriptor.wav_bitrate,
        wav_sample_rate: descriptor.wav_sample_rate,
    }
}

struct VoiceLayout<'a> {
    kit_name: &'a str,
    slots: &'a VoiceSlots<Sample>,
}

struct Written {
    affected: Vec<SlotDelta>,
    inserted: Vec<SampleId>,
}

/// Persist in-memory voice layouts: drop `removed`, move every row whose
/// position changed, and insert pending samples.
///
/// Rows that move are first parked at negative slots so that no intermediate
/// state collides on the (kit, voice, slot) unique index.
fn write_layouts(
    tx: &Transaction,
    layouts: &[VoiceLayout<'_>],
    removed: &[SampleId],
    moved_id: Option<SampleId>,
) -> Result<Written, StorageError> {
    for id in removed {
        tx.execute("DELETE FROM samples WHERE id = ?1", rusqlite::params![id])?;
    }

    let mut relocations = Vec::new();
    let mut pending = Vec::new();
    let mut affected = Vec::new();
    for layout in layouts {
        let voice = layout.slots.voice();
        for (slot, sample) in layout.slots.iter() {
            if sample.id == PENDING_ID {
                pending.push((layout.kit_name, voice, slot, sample));
                continue;
            }
            let unchanged =
                sample.kit_name == layout.kit_name && sample.voice == voice && sample.slot == slot;
            if unchanged {
                continue;
            }
            relocations.push((layout.kit_name, voice, slot, sample));
            if Some(sample.id) != moved_id {
                affected.push(SlotDelta {
                    kit_name: layout.kit_name.to_string(),
                    voice,
                    sample: sample.descriptor(),
                    old_slot: sample.slot,
                    new_slot: slot,
                });
            }
        }
    }

    for (_, _, _, sample) in &relocations {
        tx.execute(
            "UPDATE samples SET slot_number = ?1 WHERE id = ?2",
            rusqlite::params![-1 - i64::from(sample.slot.get()), sample.id],
        )?;
    }
    for (kit_name, voice, slot, sample) in &relocations {
        tx.execute(
            "UPDATE samples SET kit_name = ?1, voice_number = ?2, slot_number = ?3 WHERE id = ?4",
            rusqlite::params![kit_name, voice.get(), slot.get(), sample.id],
        )?;
    }

    let mut inserted = Vec::new();
    for (kit_name, voice, slot, sample) in &pending {
        tx.execute(
            "INSERT INTO samples (kit_name, voice_number, slot_number, filename, source_path, is_stereo, wav_bitrate, wav_sample_rate) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                kit_name,
                voice.get(),
                slot.get(),
                sample.filename,
                sample.source_path,
                sample.is_stereo,
                sample.wav_bitrate,
                sample.wav_sample_rate,
            ],
        )?;
        inserted.push(tx.last_insert_rowid());
    }

    let kits: BTreeSet<&str> = layouts.iter().map(|l| l.kit_name).collect();
    for kit_name in kits {
        mark_modified(tx, kit_name)?;
    }

    Ok(Written { affected, inserted })
}
