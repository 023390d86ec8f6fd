//! Knowledge image persistence through the filesystem

use pma_driver::chip::{ClassifierMode, DistanceMode};
use pma_driver::{KnowledgeImage, PatternMatcher, PmaError, SimulatedPma};

fn trained() -> PatternMatcher<SimulatedPma> {
    let mut pm = PatternMatcher::new(SimulatedPma::new());
    pm.initialize_with(2, DistanceMode::LSup, ClassifierMode::Rbf, 2, 80);
    pm.learn(&[10, 10, 10, 10], 1);
    pm.learn(&[120, 130, 140, 150], 2);
    pm.learn(&[250, 5, 250, 5], 3);
    pm
}

#[test]
fn dump_and_restore_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.pmak");

    let mut source = trained();
    let image = KnowledgeImage::new(source.save_all());
    assert_eq!(image.len(), 3);
    image.save(&path).unwrap();

    let loaded = KnowledgeImage::load(&path).unwrap();
    assert_eq!(loaded, image);

    let mut target = PatternMatcher::new(SimulatedPma::new());
    target.initialize_with(2, DistanceMode::LSup, ClassifierMode::Rbf, 2, 80);
    target.restore_all(&loaded.records).unwrap();

    assert_eq!(target.committed_count(), 3);
    assert_eq!(target.classify(&[120, 130, 140, 150]), 2);
    assert_eq!(target.classify(&[250, 5, 250, 5]), 3);
    assert_eq!(target.save_all(), image.records);
}

#[test]
fn saved_records_keep_context_and_norm() {
    let mut pm = trained();
    let records = pm.save_all();
    for record in &records {
        assert_eq!(record.context, 0x82);
        assert_eq!(record.min_influence, 2);
        assert!(!record.is_degenerate());
    }
    assert_eq!(&records[1].prototype()[..4], &[120, 130, 140, 150]);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = KnowledgeImage::load(dir.path().join("absent.pmak")).unwrap_err();
    assert!(matches!(err, PmaError::Io { .. }));
}

#[test]
fn garbage_file_is_rejected() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"not an image at all").unwrap();
    assert!(matches!(
        KnowledgeImage::load(file.path()),
        Err(PmaError::InvalidImage { .. })
    ));
}

#[test]
fn oversized_image_is_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oversized.pmak");

    let mut pm = trained();
    let record = pm.save_all().remove(0);
    let image = KnowledgeImage::new(vec![record; 129]);

    assert!(matches!(image.save(&path), Err(PmaError::ChainFull { max: 128 })));
    assert!(!path.exists());
}
