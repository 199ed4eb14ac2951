//! Tests for `corpus` module

use super::corpus::*;
use super::error::Error;

#[test]
fn test_same_seed_same_dataset() {
    let a = CorpusGenerator::new(16, 32, Some(7)).generate().unwrap();
    let b = CorpusGenerator::new(16, 32, Some(7)).generate().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_different_seed_different_dataset() {
    let a = CorpusGenerator::new(16, 32, Some(7)).generate().unwrap();
    let b = CorpusGenerator::new(16, 32, Some(8)).generate().unwrap();
    assert_ne!(a.corpus, b.corpus);
}

#[test]
fn test_unseeded_generator_reports_seed() {
    let generator = CorpusGenerator::new(8, 4, None);
    let replay = CorpusGenerator::new(8, 4, Some(generator.seed()));
    assert_eq!(generator.generate().unwrap(), replay.generate().unwrap());
}

#[test]
fn test_generated_shape() {
    let dataset = CorpusGenerator::new(13, 5, Some(1)).generate().unwrap();
    assert_eq!(dataset.corpus.dimension(), 13);
    assert_eq!(dataset.corpus.len(), 5);
    assert_eq!(dataset.corpus.as_slice().len(), 65);
    assert_eq!(dataset.query.len(), 13);
    assert_eq!(dataset.corpus.rows().count(), 5);
    assert!(dataset.corpus.rows().all(|row| row.len() == 13));
}

#[test]
fn test_components_in_unit_range() {
    let dataset = CorpusGenerator::new(64, 100, Some(99)).generate().unwrap();
    let all = dataset
        .corpus
        .as_slice()
        .iter()
        .chain(dataset.query.iter());
    for &x in all {
        assert!((-1.0..1.0).contains(&x), "component {x} out of [-1, 1)");
    }
}

#[test]
fn test_components_cover_both_signs() {
    let dataset = CorpusGenerator::new(64, 10, Some(3)).generate().unwrap();
    let data = dataset.corpus.as_slice();
    assert!(data.iter().any(|&x| x < -0.5));
    assert!(data.iter().any(|&x| x > 0.5));
}

#[test]
fn test_row_matches_buffer_slice() {
    let dataset = CorpusGenerator::new(4, 3, Some(5)).generate().unwrap();
    let corpus = &dataset.corpus;
    assert_eq!(corpus.row(1), &corpus.as_slice()[4..8]);
    assert_eq!(corpus.rows().nth(2).unwrap(), corpus.row(2));
}

#[test]
fn test_from_rows_preserves_values() {
    let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
    let corpus = Corpus::from_rows(2, &rows).unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.row(0), &[1.0, 2.0]);
    assert_eq!(corpus.row(1), &[3.0, 4.0]);
}

#[test]
fn test_from_rows_dimension_mismatch() {
    let rows = vec![vec![1.0, 2.0], vec![3.0]];
    let err = Corpus::from_rows(2, &rows).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

#[test]
fn test_from_rows_empty() {
    let corpus = Corpus::from_rows(3, &[]).unwrap();
    assert!(corpus.is_empty());
    assert_eq!(corpus.rows().count(), 0);
}

#[test]
fn test_dataset_query_mismatch() {
    let corpus = Corpus::from_rows(3, &[vec![0.0; 3]]).unwrap();
    let err = Dataset::new(corpus, vec![0.0; 4]).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 3,
            actual: 4
        }
    ));
}

#[test]
fn test_allocation_overflow_is_error() {
    let err = CorpusGenerator::new(usize::MAX, 2, Some(0))
        .generate()
        .unwrap_err();
    assert!(matches!(err, Error::Allocation { .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_preview_truncates() {
    let dataset = CorpusGenerator::new(16, 5, Some(11)).generate().unwrap();
    let preview = dataset.preview();
    assert_eq!(preview.query, dataset.query[..PREVIEW_COMPONENTS].to_vec());
    assert_eq!(preview.rows.len(), PREVIEW_ROWS);
    assert_eq!(preview.rows[0], dataset.corpus.row(0)[..PREVIEW_COMPONENTS].to_vec());
    assert_eq!(preview.remaining_components, 6);
}

#[test]
fn test_preview_small_dataset() {
    let corpus = Corpus::from_rows(2, &[vec![1.0, 2.0]]).unwrap();
    let dataset = Dataset::new(corpus, vec![3.0, 4.0]).unwrap();
    let preview = dataset.preview();
    assert_eq!(preview.query, vec![3.0, 4.0]);
    assert_eq!(preview.rows, vec![vec![1.0, 2.0]]);
    assert_eq!(preview.remaining_components, 0);
}
