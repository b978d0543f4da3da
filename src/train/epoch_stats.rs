use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochStats` value at the end of every completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all samples in this epoch.
    pub mean_loss: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Outcome of a full training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub history: Vec<EpochStats>,
}

impl TrainReport {
    pub fn epochs_run(&self) -> usize {
        self.history.len()
    }

    /// Mean loss of the last epoch, `None` if no epoch ran.
    pub fn final_loss(&self) -> Option<f64> {
        self.history.last().map(|s| s.mean_loss)
    }
}
