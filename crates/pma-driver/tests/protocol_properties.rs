//! Protocol tests against the simulated array
//!
//! Every ordering and round-trip contract of the driver, checked through the
//! register traffic it issues and the state it leaves on the chip.

use pma_driver::chip::limits::{MAX_NEURONS, MAX_VECTOR_SIZE, NOT_PROCESSED, NO_MATCH};
use pma_driver::chip::regs::nsr;
use pma_driver::chip::{ClassifierMode, DistanceMode, Register};
use pma_driver::{
    NeuronRecord, PatternMatcher, PmaError, RecordingBus, RegisterBus, SimulatedPma,
};

fn matcher() -> PatternMatcher<SimulatedPma> {
    let mut pm = PatternMatcher::new(SimulatedPma::new());
    pm.initialize_default();
    pm
}

fn recorded() -> PatternMatcher<RecordingBus<SimulatedPma>> {
    let mut pm = PatternMatcher::new(RecordingBus::new(SimulatedPma::new()));
    pm.initialize_default();
    pm.bus_mut().clear();
    pm
}

/// Distinct, well separated vectors so every learn commits a new neuron.
fn pattern(i: usize) -> Vec<u8> {
    let hi = u8::try_from(i / 16).unwrap();
    let lo = u8::try_from(i % 16).unwrap();
    vec![hi * 16, lo * 16, hi.wrapping_mul(7), lo.wrapping_mul(13)]
}

fn learn_chain(pm: &mut PatternMatcher<SimulatedPma>, n: usize) {
    pm.configure(0, DistanceMode::L1, ClassifierMode::Rbf, 2, 0x4000);
    for i in 0..n {
        let category = u16::try_from(i + 1).unwrap();
        pm.learn(&pattern(i), category);
    }
    assert_eq!(usize::from(pm.committed_count()), n);
}

// ── length handling ──────────────────────────────────────────────────────────

#[test]
fn learn_truncates_long_vectors() {
    let mut pm = recorded();
    let vector: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();
    pm.learn(&vector, 3);

    let writes = pm.bus().writes();
    let comp = pm.bus().writes_to(Register::Comp);
    let lcomp = pm.bus().writes_to(Register::Lcomp);
    assert_eq!(comp.len(), MAX_VECTOR_SIZE - 1);
    assert_eq!(lcomp, vec![u16::from(vector[MAX_VECTOR_SIZE - 1])]);
    assert_eq!(
        comp,
        vector[..MAX_VECTOR_SIZE - 1]
            .iter()
            .map(|&b| u16::from(b))
            .collect::<Vec<_>>()
    );
    assert_eq!(writes.last(), Some(&(Register::Cat, 3)));
}

#[test]
fn classify_and_write_vector_reject_long_vectors() {
    let mut pm = recorded();
    let vector = vec![1u8; MAX_VECTOR_SIZE + 1];
    assert_eq!(pm.classify(&vector), NOT_PROCESSED);
    assert_eq!(pm.write_vector(&vector), NOT_PROCESSED);
    assert!(pm.bus().accesses().is_empty());

    match pm.classify_checked(&vector) {
        Err(PmaError::VectorTooLong { length, max }) => {
            assert_eq!(length, MAX_VECTOR_SIZE + 1);
            assert_eq!(max, MAX_VECTOR_SIZE);
        }
        other => panic!("expected VectorTooLong, got {other:?}"),
    }
    assert!(pm.bus().accesses().is_empty());
}

#[test]
fn max_length_vector_is_accepted() {
    let mut pm = matcher();
    let vector = vec![42u8; MAX_VECTOR_SIZE];
    assert_eq!(pm.write_vector(&vector), 0);
    assert_eq!(pm.classify(&vector), NO_MATCH);
}

// ── learn / classify ─────────────────────────────────────────────────────────

#[test]
fn exact_match_recall() {
    let mut pm = matcher();
    pm.learn(&[1, 2, 3], 7);
    assert_eq!(pm.classify(&[1, 2, 3]), 7);
}

#[test]
fn classification_details_report_neuron() {
    let mut pm = matcher();
    pm.configure(1, DistanceMode::L1, ClassifierMode::Rbf, 2, 50);
    pm.learn(&[1, 2, 3], 7);
    pm.learn(&[90, 90, 90], 8);

    let c = pm.classify_detailed(&[1, 2, 4]).unwrap();
    assert!(c.is_match());
    assert_eq!(c.category, 7);
    assert_eq!(c.distance, 1);
    assert_eq!(c.neuron_id, 1);
    assert!(c.identified);
}

#[test]
fn knn_walk_returns_nearest_first() {
    let mut pm = matcher();
    pm.configure(1, DistanceMode::L1, ClassifierMode::Knn, 2, 0x4000);
    pm.learn(&[0, 0], 1);
    pm.learn(&[100, 100], 2);
    pm.learn(&[50, 50], 3);

    let matches = pm.nearest(&[45, 45], 5).unwrap();
    let categories: Vec<u16> = matches.iter().map(|m| m.category).collect();
    assert_eq!(categories, vec![3, 1, 2]);
    assert_eq!(matches[0].distance, 10);
}

#[test]
fn unmatched_vector_reports_no_match() {
    let mut pm = matcher();
    pm.configure(1, DistanceMode::L1, ClassifierMode::Rbf, 2, 10);
    pm.learn(&[0, 0, 0], 1);
    assert_eq!(pm.classify(&[200, 200, 200]), NO_MATCH);
}

#[test]
fn forget_clears_count() {
    let mut pm = matcher();
    pm.learn(&[1, 2, 3], 7);
    pm.forget();
    assert_eq!(pm.committed_count(), 0);
    assert_eq!(pm.classify(&[1, 2, 3]), NO_MATCH);
}

// ── configuration ────────────────────────────────────────────────────────────

#[test]
fn configure_scenario() {
    let mut pm = matcher();
    pm.configure(5, DistanceMode::LSup, ClassifierMode::Knn, 2, 4000);
    assert_eq!(pm.global_context(), 5);
    assert_eq!(pm.distance_mode(), DistanceMode::LSup);
    assert_eq!(pm.classifier_mode(), ClassifierMode::Knn);
    assert_eq!(pm.minif(), 2);
    assert_eq!(pm.maxif(), 4000);
}

#[test]
fn distance_mode_round_trips_without_touching_context() {
    let mut pm = matcher();
    pm.set_global_context(42);
    for mode in [DistanceMode::LSup, DistanceMode::L1, DistanceMode::LSup] {
        pm.set_distance_mode(mode);
        assert_eq!(pm.distance_mode(), mode);
        assert_eq!(pm.global_context(), 42);
    }
}

#[test]
fn classifier_mode_round_trips() {
    let mut pm = matcher();
    pm.set_classifier_mode(ClassifierMode::Knn);
    assert_eq!(pm.classifier_mode(), ClassifierMode::Knn);
    pm.set_classifier_mode(ClassifierMode::Rbf);
    assert_eq!(pm.classifier_mode(), ClassifierMode::Rbf);
}

#[test]
fn global_context_is_masked_and_keeps_norm() {
    let mut pm = matcher();
    pm.set_distance_mode(DistanceMode::LSup);
    pm.set_global_context(0x0183);
    assert_eq!(pm.global_context(), 0x03);
    assert_eq!(pm.distance_mode(), DistanceMode::LSup);
}

#[test]
fn initialize_with_applies_configuration() {
    let mut pm = PatternMatcher::new(SimulatedPma::new());
    pm.learn(&[5], 5);
    pm.initialize_with(3, DistanceMode::LSup, ClassifierMode::Rbf, 4, 500);
    assert_eq!(pm.committed_count(), 0);
    assert_eq!(pm.global_context(), 3);
    assert_eq!(pm.maxif(), 500);
    assert_eq!(pm.minif(), 4);
}

// ── save / restore ───────────────────────────────────────────────────────────

fn round_trip(n: usize) {
    let mut pm = matcher();
    learn_chain(&mut pm, n);

    let saved = pm.save_all();
    assert_eq!(saved.len(), n);

    pm.forget();
    assert_eq!(pm.committed_count(), 0);

    pm.restore_all(&saved).unwrap();
    assert_eq!(usize::from(pm.committed_count()), n);
    assert_eq!(pm.save_all(), saved);
}

#[test]
fn round_trip_empty_chain() {
    round_trip(0);
}

#[test]
fn round_trip_single_neuron() {
    round_trip(1);
}

#[test]
fn round_trip_full_chain() {
    round_trip(MAX_NEURONS);
}

#[test]
fn restored_knowledge_classifies() {
    let mut pm = matcher();
    learn_chain(&mut pm, 10);
    let saved = pm.save_all();

    let mut fresh = matcher();
    fresh.restore_all(&saved).unwrap();
    // Restored neurons carry context 0
    fresh.configure(0, DistanceMode::L1, ClassifierMode::Rbf, 2, 0x4000);
    for i in 0..10 {
        assert_eq!(fresh.classify(&pattern(i)), u16::try_from(i + 1).unwrap());
    }
}

#[test]
fn restore_rejects_oversized_chain_without_forgetting() {
    let mut pm = matcher();
    learn_chain(&mut pm, 2);
    let records = vec![NeuronRecord::default(); MAX_NEURONS + 1];
    assert!(matches!(
        pm.restore_all(&records),
        Err(PmaError::ChainFull { .. })
    ));
    assert_eq!(pm.committed_count(), 2);
}

#[test]
fn sessions_preserve_network_mode() {
    let mut pm = matcher();
    pm.set_classifier_mode(ClassifierMode::Knn);
    learn_chain(&mut pm, 3);
    pm.set_classifier_mode(ClassifierMode::Knn);
    let before = pm.nsr() & !(nsr::IDENTIFIED | nsr::UNCERTAIN);

    let saved = pm.save_all();
    assert_eq!(pm.nsr(), before);
    pm.restore_all(&saved).unwrap();
    assert_eq!(pm.nsr(), before);
    assert_eq!(pm.nsr() & nsr::NET_MODE, 0);
}

#[test]
fn dropped_session_restores_mode() {
    let mut pm = matcher();
    learn_chain(&mut pm, 3);
    pm.set_classifier_mode(ClassifierMode::Knn);
    {
        let mut session = pm.save_session();
        let first = session.next().unwrap();
        assert_eq!(first.category, 1);
        assert_eq!(session.remaining(), 2);
    }
    assert_eq!(pm.nsr() & nsr::NET_MODE, 0);
    assert_eq!(pm.classifier_mode(), ClassifierMode::Knn);
    assert_eq!(pm.committed_count(), 3);
}

#[test]
fn finish_reset_zeroes_status() {
    let mut pm = matcher();
    pm.set_classifier_mode(ClassifierMode::Knn);
    pm.save_session().finish_reset();
    assert_eq!(pm.nsr(), 0);
}

#[test]
fn token_api_round_trip() {
    let mut pm = matcher();
    learn_chain(&mut pm, 4);

    let (saved, mut cursor) = pm.begin_save_mode();
    let mut records = Vec::new();
    for _ in 0..4 {
        let mut record = NeuronRecord::default();
        pm.iterate_neurons_to_save(&mut cursor, &mut record);
        records.push(record);
    }
    pm.end_save_mode_restoring(saved);
    assert_eq!(cursor.position(), 4);

    let (saved, mut cursor) = pm.begin_restore_mode();
    assert_eq!(cursor.position(), 0);
    for record in &records {
        assert_eq!(pm.iterate_neurons_to_restore(&mut cursor, record), 0);
    }
    pm.end_restore_mode_restoring(saved);

    assert_eq!(pm.save_all(), records);
}

#[test]
fn restore_session_stops_at_capacity() {
    let mut pm = matcher();
    let record = NeuronRecord {
        category: 1,
        influence: 10,
        min_influence: 2,
        context: 1,
        ..NeuronRecord::default()
    };
    let mut session = pm.restore_session();
    for _ in 0..MAX_NEURONS {
        session.push(&record).unwrap();
    }
    assert!(matches!(
        session.push(&record),
        Err(PmaError::ChainFull { max: MAX_NEURONS })
    ));
    session.finish();
    assert_eq!(usize::from(pm.committed_count()), MAX_NEURONS);
}

// ── single neuron lookup ─────────────────────────────────────────────────────

#[test]
fn read_neuron_finds_chain_position() {
    let mut pm = matcher();
    learn_chain(&mut pm, 6);
    let saved = pm.save_all();
    for id in 1..=6 {
        assert_eq!(pm.read_neuron(id), saved[usize::try_from(id - 1).unwrap()]);
    }
}

#[test]
fn read_neuron_clamps_ids() {
    let mut pm = matcher();
    learn_chain(&mut pm, MAX_NEURONS);
    assert_eq!(pm.read_neuron(0), pm.read_neuron(1));
    assert_eq!(pm.read_neuron(-40), pm.read_neuron(1));
    assert_eq!(pm.read_neuron(129), pm.read_neuron(128));
    assert_eq!(pm.read_neuron(i32::MAX), pm.read_neuron(128));
}

#[test]
fn read_neuron_restores_mode() {
    let mut pm = matcher();
    learn_chain(&mut pm, 2);
    pm.set_classifier_mode(ClassifierMode::Knn);
    let _ = pm.read_neuron(2);
    assert_eq!(pm.nsr() & nsr::NET_MODE, 0);
    assert_eq!(pm.classifier_mode(), ClassifierMode::Knn);
}

#[test]
fn read_neuron_cost_is_linear_in_id() {
    let mut inner = matcher();
    learn_chain(&mut inner, 8);
    let mut pm = PatternMatcher::new(RecordingBus::new(inner.into_bus()));

    let _ = pm.read_neuron(8);
    assert_eq!(pm.bus().reads_of(Register::Cat), 8);
    assert_eq!(pm.bus().inner().committed(), 8);
    assert_eq!(pm.bus().bus_type().to_string(), "Recording");
}
