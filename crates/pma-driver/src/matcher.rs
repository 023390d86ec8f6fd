//! Register protocol engine
//!
//! [`PatternMatcher`] sequences every register access the host makes. It
//! holds no state of its own beyond the bus: modes, knowledge and the chain
//! cursor all live on the chip.
//!
//! # Sequences
//!
//! ```text
//! learn      COMP×(n-1)  LCOMP  CAT←category        FORGET_NCOUNT→count
//! classify   COMP×(n-1)  LCOMP  CAT→category
//! save       NSR|=NET_MODE  RSTCHAIN  { NCR  COMP×128  AIF  MINIF  CAT }*  NSR=saved
//! restore    FORGET  NSR|=NET_MODE  RSTCHAIN  { NCR  COMP×128  AIF  MINIF  CAT }*  NSR=saved
//! ```
//!
//! Callers sharing one device must serialize whole sequences; the chip's
//! mode bit and cursor are global.

use crate::bus::RegisterBus;
use crate::config::PmaConfig;
use crate::error::{PmaError, Result};
use crate::record::NeuronRecord;
use crate::response::{Classification, Match};
use crate::session::{ChainCursor, RestoreSession, SaveSession, SavedMode};
use pma_chip::limits::{clamp_neuron_id, MAX_NEURONS, MAX_VECTOR_SIZE, NOT_PROCESSED, NO_MATCH};
use pma_chip::regs::{cat, ncount, ncr, nsr};
use pma_chip::{ClassifierMode, DistanceMode, Register};
use tracing::{debug, warn};

/// Driver for one neuron array behind a register bus.
#[derive(Debug)]
pub struct PatternMatcher<B: RegisterBus> {
    bus: B,
}

impl<B: RegisterBus> PatternMatcher<B> {
    /// Wrap a bus. No register is touched until an operation runs.
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Underlying bus
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Underlying bus, mutable
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the bus
    pub fn into_bus(self) -> B {
        self.bus
    }

    // ── mode & configuration ─────────────────────────────────────────────────

    /// Clear all knowledge and every neuron's memory.
    ///
    /// Captures NSR, forgets, enters save/restore mode, zeroes the component
    /// memory of every cell through the broadcast test registers, then puts
    /// NSR back as it was.
    pub fn initialize_default(&mut self) {
        debug!("initializing neuron array on {} bus", self.bus.bus_type());
        let saved = self.bus.read(Register::Nsr);
        self.forget();

        self.bus.write(Register::Nsr, nsr::NET_MODE);
        for _ in 0..MAX_NEURONS {
            self.bus.write(Register::TestComp, 0);
        }
        self.bus.write(Register::TestCat, 0);

        self.bus.write(Register::Nsr, saved);
    }

    /// Default initialization followed by [`configure`](Self::configure).
    pub fn initialize_with(
        &mut self,
        context: u16,
        distance_mode: DistanceMode,
        classifier_mode: ClassifierMode,
        min_influence: u16,
        max_influence: u16,
    ) {
        self.initialize_default();
        self.configure(
            context,
            distance_mode,
            classifier_mode,
            min_influence,
            max_influence,
        );
    }

    /// Default initialization followed by [`apply`](Self::apply).
    pub fn initialize_with_config(&mut self, config: &PmaConfig) {
        self.initialize_default();
        self.apply(config);
    }

    /// Set global context, distance norm, classifier mode and influence
    /// bounds.
    ///
    /// Values are written verbatim; the chip clamps or ignores invalid
    /// influence values itself.
    pub fn configure(
        &mut self,
        context: u16,
        distance_mode: DistanceMode,
        classifier_mode: ClassifierMode,
        min_influence: u16,
        max_influence: u16,
    ) {
        debug!(
            "configure: context={context} distance={distance_mode} classifier={classifier_mode} \
             minif={min_influence} maxif={max_influence}"
        );
        self.bus.write(
            Register::Gcr,
            context | (distance_mode.bit() << ncr::NORM_SHIFT),
        );
        let status = self.bus.read(Register::Nsr);
        self.bus.write(
            Register::Nsr,
            (status & !nsr::CLASS_MODE) | (classifier_mode.bit() << nsr::CLASS_MODE_SHIFT),
        );
        self.bus.write(Register::Minif, min_influence);
        self.bus.write(Register::Maxif, max_influence);
    }

    /// [`configure`](Self::configure) from a [`PmaConfig`].
    pub fn apply(&mut self, config: &PmaConfig) {
        self.configure(
            config.context,
            config.distance_mode,
            config.classifier_mode,
            config.min_influence,
            config.max_influence,
        );
    }

    /// Discard every committed neuron. Configuration is untouched.
    pub fn forget(&mut self) {
        debug!("forget");
        self.bus.write(Register::ForgetNcount, 0);
    }

    // ── vector streaming ─────────────────────────────────────────────────────

    /// All but the last byte to COMP, the last to LCOMP.
    fn stream(&mut self, vector: &[u8]) {
        let Some((&last, head)) = vector.split_last() else {
            return;
        };
        for &component in head {
            self.bus.write(Register::Comp, u16::from(component));
        }
        self.bus.write(Register::Lcomp, u16::from(last));
    }

    /// Learn `vector` under `category` and return the committed count.
    ///
    /// Vectors longer than the comparator are truncated to their first
    /// `MAX_VECTOR_SIZE` bytes. An empty vector commits nothing.
    pub fn learn(&mut self, vector: &[u8], category: u16) -> u16 {
        let vector = &vector[..vector.len().min(MAX_VECTOR_SIZE)];
        if vector.is_empty() {
            warn!("learn: empty vector ignored");
        } else {
            self.stream(vector);
            self.bus.write(Register::Cat, category);
        }
        let count = self.bus.read(Register::ForgetNcount);
        debug!("learn: {} components, category={category}, count={count}", vector.len());
        count
    }

    /// Classify `vector`, returning the category of the nearest responding
    /// neuron.
    ///
    /// Returns [`NO_MATCH`] when nothing responds, and [`NOT_PROCESSED`]
    /// without touching any register when the vector is empty or longer than
    /// `MAX_VECTOR_SIZE`.
    pub fn classify(&mut self, vector: &[u8]) -> u16 {
        if !Self::streamable(vector) {
            warn!("classify: {}-byte vector not processed", vector.len());
            return NOT_PROCESSED;
        }
        self.stream(vector);
        self.bus.read(Register::Cat) & cat::CATEGORY
    }

    /// Stream `vector` through the comparator without reading or committing
    /// a category.
    ///
    /// Returns 0, or [`NOT_PROCESSED`] (nothing written) when the vector is
    /// empty or longer than `MAX_VECTOR_SIZE`.
    pub fn write_vector(&mut self, vector: &[u8]) -> u16 {
        if !Self::streamable(vector) {
            warn!("write_vector: {}-byte vector not processed", vector.len());
            return NOT_PROCESSED;
        }
        self.stream(vector);
        0
    }

    fn streamable(vector: &[u8]) -> bool {
        !vector.is_empty() && vector.len() <= MAX_VECTOR_SIZE
    }

    fn check_vector(vector: &[u8]) -> Result<()> {
        if vector.is_empty() {
            return Err(PmaError::EmptyVector);
        }
        if vector.len() > MAX_VECTOR_SIZE {
            return Err(PmaError::VectorTooLong {
                length: vector.len(),
                max: MAX_VECTOR_SIZE,
            });
        }
        Ok(())
    }

    /// [`classify`](Self::classify) reporting bad lengths as errors.
    ///
    /// # Errors
    ///
    /// Returns [`PmaError::EmptyVector`] or [`PmaError::VectorTooLong`];
    /// no register is touched in either case.
    pub fn classify_checked(&mut self, vector: &[u8]) -> Result<u16> {
        Self::check_vector(vector)?;
        Ok(self.classify(vector))
    }

    /// Classify and read back the full response of the nearest neuron.
    ///
    /// # Errors
    ///
    /// Same as [`classify_checked`](Self::classify_checked).
    pub fn classify_detailed(&mut self, vector: &[u8]) -> Result<Classification> {
        Self::check_vector(vector)?;
        self.stream(vector);
        let status = self.bus.read(Register::Nsr);
        let raw = self.bus.read(Register::Cat);
        let distance = self.bus.read(Register::IdxDist);
        let neuron_id = self.bus.read(Register::Nid);
        Ok(Classification::from_registers(status, raw, distance, neuron_id))
    }

    /// Up to `k` responding neurons, nearest first.
    ///
    /// In k-NN mode every committed neuron in context responds; in RBF mode
    /// only those whose influence field covers the vector.
    ///
    /// # Errors
    ///
    /// Same as [`classify_checked`](Self::classify_checked).
    pub fn nearest(&mut self, vector: &[u8], k: usize) -> Result<Vec<Match>> {
        Self::check_vector(vector)?;
        self.stream(vector);
        let mut matches = Vec::with_capacity(k.min(MAX_NEURONS));
        for _ in 0..k.min(MAX_NEURONS) {
            let raw = self.bus.read(Register::Cat);
            if raw & cat::CATEGORY == NO_MATCH {
                break;
            }
            let distance = self.bus.read(Register::IdxDist);
            let neuron_id = self.bus.read(Register::Nid);
            matches.push(Match::from_registers(raw, distance, neuron_id));
        }
        debug!("nearest: {} of {k} requested", matches.len());
        Ok(matches)
    }

    // ── save/restore ─────────────────────────────────────────────────────────

    /// Enter save mode with the chain reset to the first neuron.
    ///
    /// The returned token must be passed to
    /// [`end_save_mode_restoring`](Self::end_save_mode_restoring).
    pub fn begin_save_mode(&mut self) -> (SavedMode, ChainCursor) {
        let saved = self.bus.read(Register::Nsr);
        self.bus.write(Register::Nsr, saved | nsr::NET_MODE);
        self.bus.write(Register::RstChain, 0);
        debug!("save mode entered (nsr was {saved:#06x})");
        (SavedMode::new(saved), ChainCursor::reset())
    }

    /// Read the neuron under the cursor into `record` and advance.
    ///
    /// Returns the category read (including the degenerate flag).
    pub fn iterate_neurons_to_save(
        &mut self,
        cursor: &mut ChainCursor,
        record: &mut NeuronRecord,
    ) -> u16 {
        record.context = self.bus.read(Register::Ncr);
        for component in &mut record.vector {
            *component = self.bus.read(Register::Comp);
        }
        record.influence = self.bus.read(Register::Aif);
        record.min_influence = self.bus.read(Register::Minif);
        // Reading CAT moves the chip to the next neuron
        record.category = self.bus.read(Register::Cat);
        cursor.advance();
        record.category
    }

    /// Leave save mode, restoring NSR as captured (network-mode bit clear).
    pub fn end_save_mode_restoring(&mut self, saved: SavedMode) {
        self.bus.write(Register::Nsr, saved.nsr() & !nsr::NET_MODE);
        debug!("save mode left");
    }

    /// Leave save mode by zeroing NSR.
    pub fn end_save_mode_reset(&mut self) {
        self.bus.write(Register::Nsr, 0);
        debug!("save mode left, nsr reset");
    }

    /// Forget all knowledge, then enter restore mode with the chain reset.
    ///
    /// The returned token must be passed to
    /// [`end_restore_mode_restoring`](Self::end_restore_mode_restoring).
    pub fn begin_restore_mode(&mut self) -> (SavedMode, ChainCursor) {
        let saved = self.bus.read(Register::Nsr);
        self.forget();
        self.bus.write(Register::Nsr, saved | nsr::NET_MODE);
        self.bus.write(Register::RstChain, 0);
        debug!("restore mode entered (nsr was {saved:#06x})");
        (SavedMode::new(saved), ChainCursor::reset())
    }

    /// Write `record` into the neuron under the cursor and advance.
    ///
    /// Field order matches [`iterate_neurons_to_save`](Self::iterate_neurons_to_save).
    /// Always returns 0.
    pub fn iterate_neurons_to_restore(
        &mut self,
        cursor: &mut ChainCursor,
        record: &NeuronRecord,
    ) -> u16 {
        self.bus.write(Register::Ncr, record.context);
        for &component in &record.vector {
            self.bus.write(Register::Comp, component);
        }
        self.bus.write(Register::Aif, record.influence);
        self.bus.write(Register::Minif, record.min_influence);
        // Writing CAT commits the neuron and moves to the next one
        self.bus.write(Register::Cat, record.category);
        cursor.advance();
        0
    }

    /// Leave restore mode, restoring NSR as captured (network-mode bit clear).
    pub fn end_restore_mode_restoring(&mut self, saved: SavedMode) {
        self.bus.write(Register::Nsr, saved.nsr() & !nsr::NET_MODE);
        debug!("restore mode left");
    }

    /// Leave restore mode by zeroing NSR.
    pub fn end_restore_mode_reset(&mut self) {
        self.bus.write(Register::Nsr, 0);
        debug!("restore mode left, nsr reset");
    }

    /// Open a save session that ends itself when dropped.
    pub fn save_session(&mut self) -> SaveSession<'_, B> {
        SaveSession::begin(self)
    }

    /// Open a restore session that ends itself when dropped.
    ///
    /// Forgets all knowledge immediately.
    pub fn restore_session(&mut self) -> RestoreSession<'_, B> {
        RestoreSession::begin(self)
    }

    /// Snapshot every committed neuron in chain order.
    pub fn save_all(&mut self) -> Vec<NeuronRecord> {
        let records: Vec<NeuronRecord> = self.save_session().collect();
        debug!("saved {} neurons", records.len());
        records
    }

    /// Replace all knowledge with `records`, replayed in order.
    ///
    /// # Errors
    ///
    /// Returns [`PmaError::ChainFull`] without touching the chip when more
    /// than `MAX_NEURONS` records are given.
    pub fn restore_all(&mut self, records: &[NeuronRecord]) -> Result<()> {
        if records.len() > MAX_NEURONS {
            return Err(PmaError::ChainFull { max: MAX_NEURONS });
        }
        let mut session = self.restore_session();
        for record in records {
            session.push(record)?;
        }
        session.finish();
        debug!("restored {} neurons", records.len());
        Ok(())
    }

    // ── single neuron ────────────────────────────────────────────────────────

    /// Snapshot neuron `id` (1-based, clamped to `1..=MAX_NEURONS`).
    ///
    /// Walks the chain from the first neuron, so cost is linear in `id`.
    pub fn read_neuron(&mut self, id: i32) -> NeuronRecord {
        let id = clamp_neuron_id(id);
        let (saved, mut cursor) = self.begin_save_mode();

        for _ in 1..id {
            // Value discarded; the read only advances the chain
            let _ = self.bus.read(Register::Cat);
            cursor.advance();
        }

        let mut record = NeuronRecord::default();
        self.iterate_neurons_to_save(&mut cursor, &mut record);
        self.end_save_mode_restoring(saved);
        debug!("read neuron {id}: category={:#06x}", record.category);
        record
    }

    // ── bit-field accessors ──────────────────────────────────────────────────

    /// Distance norm from the NCR norm bit.
    pub fn distance_mode(&mut self) -> DistanceMode {
        DistanceMode::from_ncr(self.bus.read(Register::Ncr))
    }

    /// Set the NCR norm bit, leaving the context field alone.
    pub fn set_distance_mode(&mut self, mode: DistanceMode) {
        let value = self.bus.read(Register::Ncr);
        self.bus.write(
            Register::Ncr,
            (value & !ncr::NORM) | (mode.bit() << ncr::NORM_SHIFT),
        );
    }

    /// Classifier mode from the NSR class-mode bit.
    pub fn classifier_mode(&mut self) -> ClassifierMode {
        ClassifierMode::from_nsr(self.bus.read(Register::Nsr))
    }

    /// Set the NSR class-mode bit, leaving the other bits alone.
    pub fn set_classifier_mode(&mut self, mode: ClassifierMode) {
        let value = self.bus.read(Register::Nsr);
        self.bus.write(
            Register::Nsr,
            (value & !nsr::CLASS_MODE) | (mode.bit() << nsr::CLASS_MODE_SHIFT),
        );
    }

    /// Context field of NCR.
    pub fn global_context(&mut self) -> u16 {
        self.bus.read(Register::Ncr) & ncr::CONTEXT
    }

    /// Replace the NCR context field (masked to 7 bits), keeping the norm bit.
    pub fn set_global_context(&mut self, context: u16) {
        let value = self.bus.read(Register::Ncr);
        self.bus.write(
            Register::Ncr,
            (value & !ncr::CONTEXT) | (context & ncr::CONTEXT),
        );
    }

    /// Number of committed neurons.
    ///
    /// Not meaningful inside a save or restore session: the register reports
    /// the chain position while the network-mode bit is set.
    pub fn committed_count(&mut self) -> u16 {
        self.forget_ncount() & ncount::COUNT
    }

    // ── raw registers ────────────────────────────────────────────────────────

    /// Raw NCR
    pub fn ncr(&mut self) -> u16 {
        self.bus.read(Register::Ncr)
    }

    /// Raw COMP (advances the component slot in save mode)
    pub fn comp(&mut self) -> u16 {
        self.bus.read(Register::Comp)
    }

    /// Raw LCOMP
    pub fn lcomp(&mut self) -> u16 {
        self.bus.read(Register::Lcomp)
    }

    /// Raw IDX_DIST
    pub fn idx_dist(&mut self) -> u16 {
        self.bus.read(Register::IdxDist)
    }

    /// Raw CAT (advances the response list or the chain)
    pub fn cat(&mut self) -> u16 {
        self.bus.read(Register::Cat)
    }

    /// Raw AIF
    pub fn aif(&mut self) -> u16 {
        self.bus.read(Register::Aif)
    }

    /// Raw MINIF
    pub fn minif(&mut self) -> u16 {
        self.bus.read(Register::Minif)
    }

    /// Raw MAXIF
    pub fn maxif(&mut self) -> u16 {
        self.bus.read(Register::Maxif)
    }

    /// Raw NID
    pub fn nid(&mut self) -> u16 {
        self.bus.read(Register::Nid)
    }

    /// Raw GCR
    pub fn gcr(&mut self) -> u16 {
        self.bus.read(Register::Gcr)
    }

    /// Raw RSTCHAIN
    pub fn rstchain(&mut self) -> u16 {
        self.bus.read(Register::RstChain)
    }

    /// Raw NSR
    pub fn nsr(&mut self) -> u16 {
        self.bus.read(Register::Nsr)
    }

    /// Raw FORGET_NCOUNT
    pub fn forget_ncount(&mut self) -> u16 {
        self.bus.read(Register::ForgetNcount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{RecordingBus, SimulatedPma};

    fn recorded() -> PatternMatcher<RecordingBus<SimulatedPma>> {
        PatternMatcher::new(RecordingBus::new(SimulatedPma::new()))
    }

    #[test]
    fn stream_splits_last_component() {
        let mut pm = recorded();
        assert_eq!(pm.write_vector(&[1, 2, 3]), 0);
        assert_eq!(
            pm.bus().writes(),
            vec![
                (Register::Comp, 1),
                (Register::Comp, 2),
                (Register::Lcomp, 3)
            ]
        );
    }

    #[test]
    fn single_component_goes_straight_to_lcomp() {
        let mut pm = recorded();
        pm.write_vector(&[9]);
        assert_eq!(pm.bus().writes(), vec![(Register::Lcomp, 9)]);
    }

    #[test]
    fn learn_writes_category_after_vector() {
        let mut pm = recorded();
        let count = pm.learn(&[4, 5], 3);
        assert_eq!(count, 1);
        assert_eq!(
            pm.bus().writes(),
            vec![(Register::Comp, 4), (Register::Lcomp, 5), (Register::Cat, 3)]
        );
        assert_eq!(pm.bus().reads_of(Register::ForgetNcount), 1);
    }

    #[test]
    fn empty_vector_is_not_streamed() {
        let mut pm = recorded();
        assert_eq!(pm.classify(&[]), NOT_PROCESSED);
        assert_eq!(pm.write_vector(&[]), NOT_PROCESSED);
        assert_eq!(pm.learn(&[], 1), 0);
        assert!(pm.bus().writes().is_empty());
        assert!(matches!(pm.classify_checked(&[]), Err(PmaError::EmptyVector)));
    }

    #[test]
    fn classify_masks_category_field() {
        let mut pm = recorded();
        assert_eq!(pm.classify(&[1, 2, 3]), NO_MATCH);
    }

    #[test]
    fn configure_merges_class_mode() {
        let mut pm = recorded();
        pm.configure(3, DistanceMode::L1, ClassifierMode::Knn, 2, 100);
        assert_eq!(pm.classifier_mode(), ClassifierMode::Knn);
        pm.configure(3, DistanceMode::L1, ClassifierMode::Rbf, 2, 100);
        assert_eq!(pm.classifier_mode(), ClassifierMode::Rbf);
    }

    #[test]
    fn configure_composes_global_context() {
        let mut pm = recorded();
        pm.configure(5, DistanceMode::LSup, ClassifierMode::Rbf, 2, 4000);
        assert_eq!(pm.bus().writes_to(Register::Gcr), vec![0x85]);
        assert_eq!(pm.bus().writes_to(Register::Minif), vec![2]);
        assert_eq!(pm.bus().writes_to(Register::Maxif), vec![4000]);
    }

    #[test]
    fn initialize_default_broadcasts_every_slot() {
        let mut pm = recorded();
        pm.initialize_default();
        assert_eq!(pm.bus().writes_to(Register::TestComp).len(), MAX_NEURONS);
        assert_eq!(pm.bus().writes_to(Register::TestCat), vec![0]);
        assert_eq!(pm.bus().writes_to(Register::ForgetNcount), vec![0]);
        assert_eq!(pm.bus().writes_to(Register::Nsr), vec![nsr::NET_MODE, 0]);
    }

    #[test]
    fn save_mode_sets_and_clears_net_mode() {
        let mut pm = recorded();
        pm.set_classifier_mode(ClassifierMode::Knn);
        pm.bus_mut().clear();

        let (saved, cursor) = pm.begin_save_mode();
        assert_eq!(cursor.position(), 0);
        assert_eq!(saved.nsr() & nsr::CLASS_MODE, nsr::CLASS_MODE);
        pm.end_save_mode_restoring(saved);

        assert_eq!(
            pm.bus().writes(),
            vec![
                (Register::Nsr, nsr::CLASS_MODE | nsr::NET_MODE),
                (Register::RstChain, 0),
                (Register::Nsr, nsr::CLASS_MODE),
            ]
        );
    }

    #[test]
    fn reset_variants_zero_nsr() {
        let mut pm = recorded();
        pm.set_classifier_mode(ClassifierMode::Knn);
        let (_saved, _) = pm.begin_save_mode();
        pm.end_save_mode_reset();
        assert_eq!(pm.nsr(), 0);

        pm.set_classifier_mode(ClassifierMode::Knn);
        let (_saved, _) = pm.begin_restore_mode();
        pm.end_restore_mode_reset();
        assert_eq!(pm.nsr(), 0);
    }

    #[test]
    fn save_iteration_reads_fixed_field_order() {
        let mut pm = recorded();
        pm.learn(&[7], 2);
        let (saved, mut cursor) = pm.begin_save_mode();
        pm.bus_mut().clear();

        let mut record = NeuronRecord::default();
        let category = pm.iterate_neurons_to_save(&mut cursor, &mut record);
        pm.end_save_mode_restoring(saved);

        assert_eq!(category, 2);
        assert_eq!(cursor.position(), 1);
        let regs: Vec<Register> = pm
            .bus()
            .accesses()
            .iter()
            .take(1 + pma_chip::limits::SAVE_RESTORE_SIZE + 3)
            .map(|a| a.register())
            .collect();
        assert_eq!(regs[0], Register::Ncr);
        assert!(regs[1..=128].iter().all(|&r| r == Register::Comp));
        assert_eq!(&regs[129..], &[Register::Aif, Register::Minif, Register::Cat]);
    }

    #[test]
    fn restore_forgets_before_entering_mode() {
        let mut pm = recorded();
        pm.learn(&[7], 2);
        pm.bus_mut().clear();
        let (saved, _) = pm.begin_restore_mode();
        pm.end_restore_mode_restoring(saved);
        let writes = pm.bus().writes();
        assert_eq!(writes[0], (Register::ForgetNcount, 0));
        assert_eq!(writes[1], (Register::Nsr, nsr::NET_MODE));
        assert_eq!(writes[2], (Register::RstChain, 0));
    }

    #[test]
    fn read_neuron_advances_by_id() {
        let mut pm = recorded();
        pm.bus_mut().clear();
        let _ = pm.read_neuron(5);
        // 4 skips plus the CAT read closing the record
        assert_eq!(pm.bus().reads_of(Register::Cat), 5);
    }

    #[test]
    fn accessors_preserve_neighbouring_bits() {
        let mut pm = recorded();
        pm.set_global_context(9);
        pm.set_distance_mode(DistanceMode::LSup);
        assert_eq!(pm.global_context(), 9);
        assert_eq!(pm.distance_mode(), DistanceMode::LSup);
        pm.set_global_context(0x1FF);
        assert_eq!(pm.global_context(), 0x7F);
        assert_eq!(pm.distance_mode(), DistanceMode::LSup);
        pm.set_distance_mode(DistanceMode::L1);
        assert_eq!(pm.global_context(), 0x7F);
    }
}
