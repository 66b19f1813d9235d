use slotkit_core::{Sample, SampleOptions, SlotNumber, VoiceNumber};
use slotkit_engine::KitSession;
use slotkit_storage::{SampleStore, SqliteStore, StorageError};

use crate::ProbeStore;

/// Route engine logs to the test output; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn voice(n: u8) -> VoiceNumber {
    VoiceNumber::new(n).unwrap_or_else(|e| panic!("bad test voice: {e}"))
}

pub fn slot(n: u8) -> SlotNumber {
    SlotNumber::new(n).unwrap_or_else(|e| panic!("bad test slot: {e}"))
}

/// An in-memory store holding the given (empty) kits.
pub fn store_with_kits(kits: &[&str]) -> Result<SqliteStore, StorageError> {
    let mut store = SqliteStore::open_in_memory()?;
    for kit in kits {
        store.create_kit(kit)?;
    }
    Ok(store)
}

/// A session on the first of `kits`, backed by a fresh in-memory store.
pub fn session_with_kits(kits: &[&str]) -> Result<KitSession<SqliteStore>, StorageError> {
    let store = store_with_kits(kits)?;
    Ok(KitSession::new(kits.first().copied().unwrap_or("A0"), store))
}

/// Like [`session_with_kits`], with every port call observable.
pub fn probed_session(
    kits: &[&str],
) -> Result<KitSession<ProbeStore<SqliteStore>>, StorageError> {
    let store = ProbeStore::new(store_with_kits(kits)?);
    Ok(KitSession::new(kits.first().copied().unwrap_or("A0"), store))
}

/// Fill `kit`/`voice` from slot 0 with `/samples/<name>` for each name.
pub fn fill_voice(
    store: &mut SqliteStore,
    kit: &str,
    voice_number: u8,
    names: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    for (i, name) in names.iter().enumerate() {
        let reply = store.add_sample(
            kit,
            voice(voice_number),
            SlotNumber::from_index(i)?,
            &sample_path(name),
            &SampleOptions::default(),
        )?;
        if !reply.success {
            return Err(reply.error.unwrap_or_default().into());
        }
    }
    Ok(())
}

pub fn sample_path(name: &str) -> String {
    format!("/samples/{name}")
}

/// `(voice, slot, filename)` for every sample of a kit, in slot order.
pub fn kit_layout<S: SampleStore>(
    store: &S,
    kit: &str,
) -> Result<Vec<(u8, u8, String)>, Box<dyn std::error::Error>> {
    let reply = store.list_samples_for_kit(kit)?;
    if !reply.success {
        return Err(reply.error.unwrap_or_default().into());
    }
    Ok(reply
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|s: Sample| (s.voice.get(), s.slot.get(), s.filename))
        .collect())
}

/// Filenames of one voice in slot order.
pub fn voice_names<S: SampleStore>(
    store: &S,
    kit: &str,
    voice_number: u8,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    Ok(kit_layout(store, kit)?
        .into_iter()
        .filter(|(v, _, _)| *v == voice_number)
        .map(|(_, _, name)| name)
        .collect())
}
