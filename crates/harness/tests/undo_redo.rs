use slotkit_core::{CoreError, PlacementMode, SampleOptions};
use slotkit_engine::{EngineError, KitSession, OperationOutcome, UndoResult};
use slotkit_harness::*;
use slotkit_storage::{Capabilities, SampleStore, SqliteStore, StorageError};

type Layout = Vec<(u8, u8, String)>;

fn layout<S: SampleStore>(
    session: &KitSession<S>,
    kit: &str,
) -> Result<Layout, Box<dyn std::error::Error>> {
    kit_layout(session.store().ok_or("no store")?, kit)
}

/// Run `op`, then check undo restores the prior layout of every kit in
/// `kits` and redo brings back the result.
fn assert_round_trip(
    session: &mut KitSession<SqliteStore>,
    kits: &[&str],
    op: impl FnOnce(&mut KitSession<SqliteStore>) -> OperationOutcome,
) -> Result<(), Box<dyn std::error::Error>> {
    let before: Vec<Layout> = kits.iter().map(|k| layout(session, k)).collect::<Result<_, _>>()?;
    let outcome = op(session);
    assert!(outcome.is_success(), "{}", outcome.message);
    let action = outcome.undo_action.ok_or("no undo action")?;
    let after: Vec<Layout> = kits.iter().map(|k| layout(session, k)).collect::<Result<_, _>>()?;
    assert_ne!(before, after);

    assert_eq!(session.undo()?, UndoResult::Applied(action.id));
    let undone: Vec<Layout> = kits.iter().map(|k| layout(session, k)).collect::<Result<_, _>>()?;
    assert_eq!(undone, before, "undo of {}", action.description);

    assert_eq!(session.redo()?, UndoResult::Applied(action.id));
    let redone: Vec<Layout> = kits.iter().map(|k| layout(session, k)).collect::<Result<_, _>>()?;
    assert_eq!(redone, after, "redo of {}", action.description);
    Ok(())
}

fn seeded(kits: &[&str]) -> Result<KitSession<SqliteStore>, Box<dyn std::error::Error>> {
    let mut session = session_with_kits(kits)?;
    let store = session.store_mut().ok_or("no store")?;
    fill_voice(store, "A0", 1, &["kick.wav", "hat.wav", "tom.wav"])?;
    fill_voice(store, "A0", 2, &["snare.wav", "clap.wav"])?;
    Ok(session)
}

// ============================================================================
// Round trips per action kind
// ============================================================================

#[test]
fn add_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut session = seeded(&["A0"])?;
    assert_round_trip(&mut session, &["A0"], |s| {
        s.handle_sample_add(1, 3, &sample_path("ride.wav"), None)
    })?;
    // Adding into an occupied slot shifts the rest up; undo shifts them back.
    assert_round_trip(&mut session, &["A0"], |s| {
        s.handle_sample_add(1, 0, &sample_path("crash.wav"), None)
    })
}

#[test]
fn replace_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded(&["A0"])?;
    assert_round_trip(&mut session, &["A0"], |s| {
        s.handle_sample_replace(2, 1, &sample_path("rim.wav"), None)
    })?;
    assert_round_trip(&mut session, &["A0"], |s| {
        s.handle_sample_replace(3, 0, &sample_path("perc.wav"), None)
    })
}

#[test]
fn delete_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded(&["A0"])?;
    assert_round_trip(&mut session, &["A0"], |s| s.handle_sample_delete(1, 0))?;
    assert_round_trip(&mut session, &["A0"], |s| s.handle_sample_delete(1, 1))
}

#[test]
fn in_kit_move_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded(&["A0"])?;
    let moves = [
        (1, 0, 2, 1, PlacementMode::Insert),
        (1, 0, 2, 1, PlacementMode::Overwrite),
        (1, 0, 1, 2, PlacementMode::Insert),
        (1, 0, 1, 2, PlacementMode::Overwrite),
        (1, 2, 1, 0, PlacementMode::Overwrite),
        (2, 1, 3, 0, PlacementMode::Insert),
    ];
    for (from_voice, from_slot, to_voice, to_slot, mode) in moves {
        assert_round_trip(&mut session, &["A0"], |s| {
            s.handle_sample_move(from_voice, from_slot, to_voice, to_slot, mode, None)
        })?;
        // Leave the kit as it started for the next move.
        session.undo()?;
    }
    Ok(())
}

#[test]
fn move_without_snapshot_still_undoes() -> Result<(), Box<dyn std::error::Error>> {
    let store = ProbeStore::new(store_with_kits(&["A0"])?).with_capabilities(Capabilities {
        list_samples: false,
        ..Capabilities::all()
    });
    let mut session = KitSession::new("A0", store);
    let store = session.store_mut().ok_or("no store")?;
    fill_voice(store.inner_mut(), "A0", 1, &["a.wav", "b.wav", "c.wav"])?;
    fill_voice(store.inner_mut(), "A0", 2, &["d.wav"])?;
    let inner_layout = |session: &KitSession<ProbeStore<SqliteStore>>| -> Result<Layout, Box<dyn std::error::Error>> {
        let store = session.store().ok_or("no store")?;
        kit_layout(store.inner(), "A0")
    };
    let before = inner_layout(&session)?;

    for (from_voice, from_slot, to_voice, to_slot, mode) in [
        (1, 0, 1, 2, PlacementMode::Overwrite),
        (1, 1, 2, 0, PlacementMode::Overwrite),
        (1, 2, 2, 1, PlacementMode::Insert),
    ] {
        let outcome =
            session.handle_sample_move(from_voice, from_slot, to_voice, to_slot, mode, None);
        assert!(outcome.is_success(), "{}", outcome.message);
        session.undo()?;
        assert_eq!(inner_layout(&session)?, before);
    }
    Ok(())
}

#[test]
fn cross_kit_move_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = seeded(&["A0", "B1"])?;
    let store = session.store_mut().ok_or("no store")?;
    fill_voice(store, "B1", 3, &["shaker.wav", "cowbell.wav"])?;

    assert_round_trip(&mut session, &["A0", "B1"], |s| {
        s.handle_sample_move(1, 0, 3, 0, PlacementMode::Overwrite, Some("B1"))
    })?;
    session.undo()?;
    assert_round_trip(&mut session, &["A0", "B1"], |s| {
        s.handle_sample_move(1, 1, 3, 1, PlacementMode::Insert, Some("B1"))
    })
}

// ============================================================================
// History
// ============================================================================

#[test]
fn undo_walks_back_a_sequence() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session_with_kits(&["A0"])?;
    session.handle_sample_add(1, 0, &sample_path("a.wav"), None);
    session.handle_sample_add(1, 1, &sample_path("b.wav"), None);
    session.handle_sample_move(1, 1, 1, 0, PlacementMode::Insert, None);
    session.handle_sample_delete(1, 1);
    session.handle_sample_replace(1, 0, &sample_path("c.wav"), None);
    assert_eq!(session.undo_manager().undo_depth(), 5);

    while session.undo()? != UndoResult::Empty {}
    assert!(layout(&session, "A0")?.is_empty());
    assert_eq!(session.undo_manager().redo_depth(), 5);

    while session.redo()? != UndoResult::Empty {}
    assert_eq!(layout(&session, "A0")?, vec![(1, 0, "c.wav".to_string())]);
    Ok(())
}

#[test]
fn undo_replay_skips_recording() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session_with_kits(&["A0"])?;
    session.handle_sample_add(1, 0, &sample_path("a.wav"), None);
    session.undo()?;
    assert_eq!(session.undo_manager().undo_depth(), 0);
    assert_eq!(session.undo_manager().redo_depth(), 1);
    session.redo()?;
    assert_eq!(session.undo_manager().undo_depth(), 1);
    assert_eq!(session.undo_manager().redo_depth(), 0);
    Ok(())
}

#[test]
fn failed_replay_consumes_the_action() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session_with_kits(&["A0"])?;
    session.handle_sample_add(1, 0, &sample_path("a.wav"), None);
    session
        .store_mut()
        .ok_or("no store")?
        .set_kit_locked("A0", true)?;

    match session.undo() {
        Err(EngineError::ReplayFailed(message)) => assert_eq!(message, "Kit A0 is locked"),
        other => panic!("unexpected undo result: {other:?}"),
    }
    assert_eq!(session.undo_manager().undo_depth(), 0);
    assert_eq!(session.undo_manager().redo_depth(), 0);
    assert_eq!(layout(&session, "A0")?, vec![(1, 0, "a.wav".to_string())]);
    Ok(())
}

#[test]
fn history_survives_kit_switch() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session_with_kits(&["A0", "B1"])?;
    session.handle_sample_add(1, 0, &sample_path("a.wav"), None);
    session.select_kit("B1");
    session.handle_sample_add(2, 0, &sample_path("b.wav"), None);

    session.undo()?;
    session.undo()?;
    assert!(layout(&session, "A0")?.is_empty());
    assert!(layout(&session, "B1")?.is_empty());
    Ok(())
}

// ============================================================================
// Undo safety
// ============================================================================

#[test]
fn replace_over_unread_slot_refuses_to_undo() -> Result<(), Box<dyn std::error::Error>> {
    let store = ProbeStore::new(store_with_kits(&["A0"])?).failing_reads();
    let mut session = KitSession::new("A0", store);
    let store = session.store_mut().ok_or("no store")?;
    fill_voice(store.inner_mut(), "A0", 1, &["a.wav", "b.wav", "c.wav"])?;

    let outcome = session.handle_sample_replace(1, 0, &sample_path("x.wav"), None);
    assert!(outcome.is_success(), "{}", outcome.message);

    match session.undo() {
        Err(EngineError::Core(CoreError::Irreversible(_))) => {}
        other => panic!("unexpected undo result: {other:?}"),
    }
    let store = session.store().ok_or("no store")?;
    assert_eq!(
        voice_names(store.inner(), "A0", 1)?,
        vec!["x.wav", "b.wav", "c.wav"]
    );
    assert_eq!(store.call_count("delete_sample"), 0);
    Ok(())
}

/// `(voice, slot, filename, bitrate, sample rate)` for every sample of a kit.
fn metadata_layout(
    session: &KitSession<SqliteStore>,
    kit: &str,
) -> Result<Vec<(u8, u8, String, Option<u32>, Option<u32>)>, Box<dyn std::error::Error>> {
    Ok(session
        .store()
        .ok_or("no store")?
        .samples_for_kit(kit)?
        .into_iter()
        .map(|s| (s.voice.get(), s.slot.get(), s.filename, s.wav_bitrate, s.wav_sample_rate))
        .collect())
}

#[test]
fn undo_keeps_wav_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session_with_kits(&["A0"])?;
    let options = SampleOptions {
        stereo: true,
        wav_bitrate: Some(24),
        wav_sample_rate: Some(48_000),
    };
    for (v, s, name) in [(1, 0, "a.wav"), (1, 1, "b.wav"), (2, 0, "c.wav")] {
        let outcome = session.handle_sample_add(v, s, &sample_path(name), Some(&options));
        assert!(outcome.is_success(), "{}", outcome.message);
    }
    let before = metadata_layout(&session, "A0")?;

    session.handle_sample_move(1, 1, 2, 1, PlacementMode::Insert, None);
    session.undo()?;
    assert_eq!(metadata_layout(&session, "A0")?, before);

    session.handle_sample_replace(1, 0, &sample_path("d.wav"), None);
    session.undo()?;
    assert_eq!(metadata_layout(&session, "A0")?, before);

    session.handle_sample_delete(2, 0);
    session.undo()?;
    assert_eq!(metadata_layout(&session, "A0")?, before);

    // Redo of an add recreates the sample with the options it was added with.
    session.handle_sample_add(3, 0, &sample_path("e.wav"), Some(&options));
    session.undo()?;
    session.redo()?;
    let restored = metadata_layout(&session, "A0")?;
    assert!(restored.contains(&(3, 0, "e.wav".to_string(), Some(24), Some(48_000))));
    Ok(())
}

#[test]
fn restore_without_add_leaves_voices_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let store = ProbeStore::new(store_with_kits(&["A0"])?).with_capabilities(Capabilities {
        add_sample: false,
        ..Capabilities::all()
    });
    let mut session = KitSession::new("A0", store);
    let store = session.store_mut().ok_or("no store")?;
    fill_voice(store.inner_mut(), "A0", 1, &["a.wav", "b.wav"])?;
    fill_voice(store.inner_mut(), "A0", 2, &["c.wav"])?;

    let outcome = session.handle_sample_move(1, 0, 2, 0, PlacementMode::Insert, None);
    assert!(outcome.is_success(), "{}", outcome.message);
    let store = session.store().ok_or("no store")?;
    let moved = kit_layout(store.inner(), "A0")?;

    match session.undo() {
        Err(EngineError::Storage(StorageError::Unsupported(call))) => {
            assert_eq!(call, "add_sample")
        }
        other => panic!("unexpected undo result: {other:?}"),
    }
    let store = session.store().ok_or("no store")?;
    assert_eq!(kit_layout(store.inner(), "A0")?, moved);
    assert_eq!(store.call_count("delete_sample"), 0);
    Ok(())
}
