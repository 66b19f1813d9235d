use std::cell::RefCell;

use slotkit_core::{PlacementMode, Sample, SampleOptions, SlotNumber, VoiceNumber};
use slotkit_storage::{
    AddedSample, Capabilities, DeletedSample, MovedSample, SampleStore, StorageError, StoreReply,
};

/// Wraps a store to hide capabilities, inject failures and log every port call.
pub struct ProbeStore<S> {
    inner: S,
    capabilities: Capabilities,
    fail_reads: bool,
    fail_writes: bool,
    calls: RefCell<Vec<&'static str>>,
}

impl<S: SampleStore> ProbeStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            capabilities: inner.capabilities(),
            inner,
            fail_reads: false,
            fail_writes: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Make every sample listing fail as if the store were unreachable.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Make every mutation fail as if the store were unreachable.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == name).count()
    }

    fn enter(&self, name: &'static str, offered: bool) -> Result<(), StorageError> {
        self.calls.borrow_mut().push(name);
        if !offered {
            return Err(StorageError::Unsupported(name));
        }
        Ok(())
    }

    fn enter_write(&self, name: &'static str, offered: bool) -> Result<(), StorageError> {
        self.enter(name, offered)?;
        if self.fail_writes {
            return Err(StorageError::ConstraintViolation("injected failure".into()));
        }
        Ok(())
    }
}

impl<S: SampleStore> SampleStore for ProbeStore<S> {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn add_sample(
        &mut self,
        kit_name: &str,
        voice: VoiceNumber,
        slot: SlotNumber,
        source_path: &str,
        options: &SampleOptions,
    ) -> Result<StoreReply<AddedSample>, StorageError> {
        self.enter_write("add_sample", self.capabilities.add_sample)?;
        self.inner.add_sample(kit_name, voice, slot, source_path, options)
    }

    fn replace_sample(
        &mut self,
        kit_name: &str,
        voice: VoiceNumber,
        slot: SlotNumber,
        source_path: &str,
        options: &SampleOptions,
    ) -> Result<StoreReply<AddedSample>, StorageError> {
        self.enter_write("replace_sample", self.capabilities.replace_sample)?;
        self.inner.replace_sample(kit_name, voice, slot, source_path, options)
    }

    fn delete_sample(
        &mut self,
        kit_name: &str,
        voice: VoiceNumber,
        slot: SlotNumber,
    ) -> Result<StoreReply<DeletedSample>, StorageError> {
        self.enter_write("delete_sample", self.capabilities.delete_sample)?;
        self.inner.delete_sample(kit_name, voice, slot)
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
        self.enter_write("move_sample_in_kit", self.capabilities.move_in_kit)?;
        self.inner
            .move_sample_in_kit(kit_name, from_voice, from_slot, to_voice, to_slot, mode)
    }

    #[allow(clippy::too_many_arguments)]
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
        self.enter_write("move_sample_between_kits", self.capabilities.move_between_kits)?;
        self.inner.move_sample_between_kits(
            from_kit, from_voice, from_slot, to_kit, to_voice, to_slot, mode,
        )
    }

    fn list_samples_for_kit(&self, kit_name: &str) -> Result<StoreReply<Vec<Sample>>, StorageError> {
        self.enter("list_samples_for_kit", self.capabilities.list_samples)?;
        if self.fail_reads {
            return Err(StorageError::NotFound("injected read failure".into()));
        }
        self.inner.list_samples_for_kit(kit_name)
    }
}
