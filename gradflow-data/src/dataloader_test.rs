use super::*;
use crate::samplers::{RandomSampler, SubsetRandomSampler};

fn dataset(rows: usize) -> TabularDataset {
    let x = NdArray::new((0..rows * 2).map(|v| v as f64).collect(), vec![rows, 2]).unwrap();
    let y = NdArray::new((0..rows).map(|v| v as f64).collect(), vec![rows, 1]).unwrap();
    TabularDataset::new(vec![x, y]).unwrap()
}

#[test]
fn test_sequential_batches() {
    let ds = dataset(5);
    let loader = DataLoader::sequential(&ds, 2, false).unwrap();
    assert_eq!(loader.num_batches(), 3);
    let batches: Vec<Batch> = loader.collect::<Result<_>>().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].indices(), &[0, 1]);
    assert_eq!(batches[1].inputs()[0].data(), &[4.0, 5.0, 6.0, 7.0]);
    assert_eq!(batches[2].inputs()[0].shape(), &[1, 2]);
    assert_eq!(batches[2].inputs()[1].data(), &[4.0]);
    assert!(batches.iter().all(|b| b.output().is_none()));
}

#[test]
fn test_drop_last() {
    let ds = dataset(5);
    let loader = DataLoader::sequential(&ds, 2, true).unwrap();
    assert_eq!(loader.num_batches(), 2);
    let sizes: Vec<usize> = loader.map(|b| b.unwrap().len()).collect();
    assert_eq!(sizes, vec![2, 2]);

    let exact = DataLoader::sequential(&ds, 5, true).unwrap();
    assert_eq!(exact.count(), 1);
}

#[test]
fn test_shuffled_batches_cover_every_row_once() {
    let ds = dataset(10);
    let sampler = RandomSampler::with_seed(false, None, 9);
    let mut seen: Vec<usize> = DataLoader::new(&ds, 3, &sampler, false)
        .unwrap()
        .flat_map(|b| b.unwrap().indices().to_vec())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_rows_stay_aligned_across_arrays() {
    let ds = dataset(6);
    let sampler = RandomSampler::with_seed(false, None, 2);
    for batch in DataLoader::new(&ds, 4, &sampler, false).unwrap() {
        let batch = batch.unwrap();
        for (k, &row) in batch.indices().iter().enumerate() {
            assert_eq!(batch.inputs()[1].data()[k], row as f64);
            assert_eq!(batch.inputs()[0].data()[2 * k], (2 * row) as f64);
        }
    }
}

#[test]
fn test_errors() {
    let ds = dataset(3);
    assert!(matches!(
        DataLoader::sequential(&ds, 0, false),
        Err(GradflowError::ConfigurationError(_))
    ));
    let sampler = SubsetRandomSampler::with_seed(vec![0, 8], 0);
    let results: Vec<Result<Batch>> = DataLoader::new(&ds, 2, &sampler, false).unwrap().collect();
    assert!(matches!(results[0], Err(GradflowError::IndexOutOfBounds { index: 8, .. })));
}
