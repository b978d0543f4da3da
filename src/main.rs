// XOR demo: trains a small sigmoid network, prints its predictions and checks
// that a JSON round trip reproduces them. Set RUST_LOG=debug for per-epoch loss.
use anyhow::{ensure, Result};
use backprop_nn::{ActivationFunction, Matrix, Network, NetworkConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let inputs: Vec<Matrix> = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]
        .iter()
        .map(|x| Matrix::from_column(x))
        .collect();
    let targets: Vec<Matrix> = [0.0, 1.0, 1.0, 0.0]
        .iter()
        .map(|&y| Matrix::from_column(&[y]))
        .collect();

    let config = NetworkConfig::new(ActivationFunction::Sigmoid);
    let mut network = Network::new(&[2, 4, 1], config)?;

    let report = network.train(&inputs, &targets, 5000, 0.1, None)?;
    println!("final loss: {:.6}", report.final_loss().unwrap_or(f64::NAN));

    for input in &inputs {
        let output = network.predict(input)?;
        println!("{:?} -> {:.4}", input.to_vec(), output.to_vec()[0]);
    }

    let restored = Network::from_json(&network.serialize()?, config)?;
    for input in &inputs {
        ensure!(
            restored.predict(input)? == network.predict(input)?,
            "restored model disagrees on {:?}",
            input.to_vec()
        );
    }
    println!("model JSON round trip reproduces every prediction");

    Ok(())
}
