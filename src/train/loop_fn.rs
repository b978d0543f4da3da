use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::{NnError, Result};
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::network::pass::Gradients;
use crate::optim::sgd::Sgd;
use crate::train::epoch_stats::{EpochStats, TrainReport};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs with MSE loss.
///
/// # Arguments
/// - `network`: mutable reference to the network; modified in place
/// - `inputs`:  training samples, each a column (or flat row) of `input_size`
/// - `targets`: corresponding targets, same length as `inputs`
/// - `config`:  hyperparameters and optional progress channel
///
/// Every sample's forward pass, backward pass and update complete before the
/// next sample starts. In mini-batch mode the gradients of one chunk are
/// computed in parallel against the same parameters, reduced in sample order
/// and applied once, so no two workers ever write the parameters.
///
/// # Errors
/// `InvalidConfiguration` if the dataset is empty, lengths mismatch, the
/// batch size is zero or the learning rate is unusable; `ShapeMismatch` if a
/// sample does not fit the topology. Validation happens before any update.
pub fn train_loop(
    network: &mut Network,
    inputs: &[Matrix],
    targets: &[Matrix],
    config: &TrainConfig,
) -> Result<TrainReport> {
    if inputs.is_empty() {
        return Err(NnError::InvalidConfiguration("training set is empty".into()));
    }
    if inputs.len() != targets.len() {
        return Err(NnError::InvalidConfiguration(format!(
            "{} inputs but {} targets",
            inputs.len(),
            targets.len()
        )));
    }
    if config.batch_size == Some(0) {
        return Err(NnError::InvalidConfiguration("batch size must be at least 1".into()));
    }
    let optimizer = Sgd::new(config.learning_rate)?;

    let inputs = inputs
        .iter()
        .map(|input| network.input_column(input))
        .collect::<Result<Vec<_>>>()?;
    let targets = targets
        .iter()
        .map(|target| network.target_column(target))
        .collect::<Result<Vec<_>>>()?;

    let n = inputs.len();
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = config.shuffle.then(|| match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    });

    info!(
        "training {:?} on {} samples for {} epochs (lr = {}, batch = {:?})",
        network.layer_sizes(),
        n,
        config.epochs,
        config.learning_rate,
        config.batch_size
    );

    let mut report = TrainReport::default();

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        if let Some(rng) = rng.as_mut() {
            order.shuffle(rng);
        }

        // ── One full pass over the training data ───────────────────────────
        let total_loss = match config.batch_size {
            None => run_online_epoch(network, &inputs, &targets, &order, &optimizer)?,
            Some(batch_size) => run_batched_epoch(network, &inputs, &targets, &order, &optimizer, batch_size)?,
        };
        let mean_loss = total_loss / n as f64;

        if !mean_loss.is_finite() {
            warn!("epoch {epoch}: loss is {mean_loss}; try a smaller learning rate");
        }
        debug!("epoch {}/{}: loss = {:.6}", epoch, config.epochs, mean_loss);

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            mean_loss,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        if let Some(ref tx) = config.progress_tx {
            // A dropped receiver only means nobody is listening any more.
            let _ = tx.send(stats.clone());
        }
        report.history.push(stats);
    }

    if let Some(loss) = report.final_loss() {
        info!("finished {} epochs, final loss = {:.6}", report.epochs_run(), loss);
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Online SGD: forward, backward and update for each sample in `order`.
/// Returns the summed loss, measured before each sample's update.
fn run_online_epoch(
    network: &mut Network,
    inputs: &[Matrix],
    targets: &[Matrix],
    order: &[usize],
    optimizer: &Sgd,
) -> Result<f64> {
    let mut total_loss = 0.0;

    for &idx in order {
        let (loss, gradients) = sample_gradients(network, &inputs[idx], &targets[idx])?;
        total_loss += loss;
        optimizer.step(network, &gradients)?;
    }

    Ok(total_loss)
}

/// Mini-batch SGD. Per-sample gradients of a chunk are computed in parallel
/// against a shared read-only network, summed in chunk order, averaged and
/// applied in a single step.
fn run_batched_epoch(
    network: &mut Network,
    inputs: &[Matrix],
    targets: &[Matrix],
    order: &[usize],
    optimizer: &Sgd,
    batch_size: usize,
) -> Result<f64> {
    let mut total_loss = 0.0;

    for chunk in order.chunks(batch_size) {
        let snapshot: &Network = network;
        let results = chunk
            .par_iter()
            .map(|&idx| sample_gradients(snapshot, &inputs[idx], &targets[idx]))
            .collect::<Result<Vec<_>>>()?;

        let mut acc = Gradients::zeros(
            snapshot
                .layers()
                .iter()
                .map(|layer| (layer.weights().shape(), layer.biases().shape())),
        );
        for (loss, gradients) in &results {
            total_loss += loss;
            acc.accumulate(gradients)?;
        }

        let mean = acc.scale(1.0 / chunk.len() as f64);
        optimizer.step(network, &mean)?;
    }

    Ok(total_loss)
}

/// Loss and gradients for one sample under the current parameters.
fn sample_gradients(network: &Network, input: &Matrix, target: &Matrix) -> Result<(f64, Gradients)> {
    let pass = network.forward(input)?;
    let output = pass
        .output()
        .ok_or_else(|| NnError::InvalidConfiguration("forward pass produced no output".into()))?;
    let loss = MseLoss::loss(output, target)?;
    let gradients = network.backward(&pass, target)?;
    Ok((loss, gradients))
}
