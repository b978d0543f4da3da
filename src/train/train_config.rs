use std::sync::mpsc;

use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`: total number of full passes over the training data
/// - `learning_rate`: SGD step size `η`
/// - `batch_size`: `None` for online SGD (one update per sample, in
///   order); `Some(b)` to compute the gradients of each
///   chunk of `b` samples in parallel and apply their mean
///   once per chunk
/// - `shuffle`: reorder samples at the start of every epoch
/// - `seed`: seed for the shuffle RNG; `None` seeds from entropy. Unused
///   when `shuffle` is off
/// - `progress_tx`: optional channel sender; one `EpochStats` is sent per
///   completed epoch. A dropped receiver is ignored and
///   training runs to completion.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: Option<usize>,
    pub shuffle: bool,
    pub seed: Option<u64>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainConfig {
    /// Online SGD in sample order, no progress channel.
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        TrainConfig {
            epochs,
            learning_rate,
            batch_size: None,
            shuffle: false,
            seed: None,
            progress_tx: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enables per-epoch shuffling, reproducible when `seed` is given.
    pub fn with_shuffle(mut self, seed: Option<u64>) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }
}
