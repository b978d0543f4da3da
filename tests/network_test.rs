use approx::assert_abs_diff_eq;
use backprop_nn::{
    ActivationFunction, Matrix, ModelSnapshot, Network, NetworkConfig, NnError, TrainConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn xor_data() -> (Vec<Matrix>, Vec<Matrix>) {
    let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]
        .iter()
        .map(|x| Matrix::from_column(x))
        .collect();
    let targets = [0.0, 1.0, 1.0, 0.0]
        .iter()
        .map(|&y| Matrix::from_column(&[y]))
        .collect();
    (inputs, targets)
}

fn seeded(sizes: &[usize], activation: ActivationFunction, seed: u64) -> Network {
    Network::with_rng(sizes, NetworkConfig::new(activation), &mut StdRng::seed_from_u64(seed)).unwrap()
}

#[derive(Clone, Copy)]
enum Param {
    Weight,
    Bias,
}

/// Copy of `net` with one parameter shifted by `eps`.
fn nudged(net: &Network, param: Param, layer: usize, i: usize, j: usize, eps: f64) -> Network {
    let mut snapshot = ModelSnapshot::from_json(&net.serialize().unwrap()).unwrap();
    let target = match param {
        Param::Weight => &mut snapshot.weights[layer],
        Param::Bias => &mut snapshot.biases[layer],
    };
    let mut data = target.data().to_vec();
    data[i][j] += eps;
    *target = Matrix::from_data(data).unwrap();
    Network::from_json(&snapshot.to_json().unwrap(), NetworkConfig::new(net.activation())).unwrap()
}

fn assert_gradients_match_finite_differences(net: &Network, input: &Matrix, target: &Matrix) {
    let eps = 1e-5;
    let pass = net.forward(input).unwrap();
    let grads = net.backward(&pass, target).unwrap();

    for (layer, (w_grad, b_grad)) in grads.weights.iter().zip(&grads.biases).enumerate() {
        for (param, analytic) in [(Param::Weight, w_grad), (Param::Bias, b_grad)] {
            for i in 0..analytic.rows() {
                for j in 0..analytic.cols() {
                    let plus = nudged(net, param, layer, i, j, eps).sample_loss(input, target).unwrap();
                    let minus = nudged(net, param, layer, i, j, -eps).sample_loss(input, target).unwrap();
                    let numeric = (plus - minus) / (2.0 * eps);

                    assert_abs_diff_eq!(analytic.get(i, j).unwrap(), numeric, epsilon = 1e-4);
                }
            }
        }
    }
}

#[test]
fn backward_matches_numeric_gradient_with_one_hidden_unit() {
    let net = seeded(&[2, 1, 1], ActivationFunction::Sigmoid, 2024);

    assert_gradients_match_finite_differences(
        &net,
        &Matrix::from_column(&[0.8, -0.3]),
        &Matrix::from_column(&[1.0]),
    );
}

#[test]
fn backward_matches_numeric_gradient_for_wider_network() {
    let net = seeded(&[3, 4, 2], ActivationFunction::Tanh, 99);

    assert_gradients_match_finite_differences(
        &net,
        &Matrix::from_column(&[0.5, -1.0, 0.25]),
        &Matrix::from_column(&[0.3, -0.6]),
    );
}

#[test]
fn xor_converges_below_mse_threshold() {
    let (inputs, targets) = xor_data();
    let mut net = seeded(&[2, 4, 1], ActivationFunction::Sigmoid, 42);

    let report = net.train(&inputs, &targets, 5000, 0.1, None).unwrap();

    assert_eq!(report.epochs_run(), 5000);
    let mse = net.evaluate(&inputs, &targets).unwrap();
    assert!(mse < 0.05, "XOR mse after training: {mse}");
}

#[test]
fn loss_history_trends_down() {
    let (inputs, targets) = xor_data();
    let mut net = seeded(&[2, 4, 1], ActivationFunction::Sigmoid, 5);

    let report = net.train(&inputs, &targets, 2000, 0.1, None).unwrap();

    let first = report.history[0].mean_loss;
    let last = report.final_loss().unwrap();
    assert!(last < first, "loss went from {first} to {last}");
}

#[test]
fn batched_training_reduces_loss() {
    let (inputs, targets) = xor_data();
    let mut net = seeded(&[2, 4, 1], ActivationFunction::Sigmoid, 8);
    let before = net.evaluate(&inputs, &targets).unwrap();

    let config = TrainConfig::new(3000, 0.1).with_batch_size(Some(2)).with_shuffle(Some(1));
    backprop_nn::train_loop(&mut net, &inputs, &targets, &config).unwrap();

    let after = net.evaluate(&inputs, &targets).unwrap();
    assert!(after < before, "loss went from {before} to {after}");
}

#[test]
fn serialization_round_trip_is_bit_exact() {
    let (inputs, targets) = xor_data();
    let config = NetworkConfig::new(ActivationFunction::Sigmoid);
    let mut net = Network::new(&[2, 3, 1], config).unwrap();
    net.train(&inputs, &targets, 50, 0.3, None).unwrap();

    let text = net.serialize().unwrap();
    let mut restored = Network::new(&[5, 5], config).unwrap();
    restored.load(&text).unwrap();

    assert_eq!(restored.layer_sizes(), net.layer_sizes());
    for input in &inputs {
        let expected = net.predict(input).unwrap();
        let actual = restored.predict(input).unwrap();
        assert_eq!(actual.to_vec()[0].to_bits(), expected.to_vec()[0].to_bits());
    }
    assert_eq!(restored.serialize().unwrap(), text);
}

#[test]
fn serialized_model_is_self_describing() {
    let net = seeded(&[3, 2, 1], ActivationFunction::ReLU, 3);

    let value: serde_json::Value = serde_json::from_str(&net.serialize().unwrap()).unwrap();

    assert_eq!(value["layers"], serde_json::json!([3, 2, 1]));
    assert_eq!(value["weights"][0].as_array().unwrap().len(), 2);
    assert_eq!(value["weights"][0][0].as_array().unwrap().len(), 3);
    assert_eq!(value["biases"][1].as_array().unwrap().len(), 1);
}

#[test]
fn diverged_network_refuses_to_serialize() {
    let mut net = seeded(&[1, 1], ActivationFunction::Identity, 4);

    let report = net
        .train(&[Matrix::from_column(&[1e200])], &[Matrix::from_column(&[0.0])], 3, 1.0, None)
        .unwrap();

    assert!(!report.final_loss().unwrap().is_finite());
    assert!(net.weights().any(|w| w.to_vec().iter().any(|x| !x.is_finite())));
    assert!(matches!(net.serialize(), Err(NnError::NonFiniteParameter { layer: 0, .. })));
}

#[test]
fn dot_shape_violation_names_both_shapes() {
    let a = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    let b = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
    let (a_before, b_before) = (a.clone(), b.clone());

    let err = a.dot(&b).unwrap_err();

    assert!(matches!(err, NnError::ShapeMismatch { left: (2, 3), right: (2, 2), .. }));
    assert!(err.to_string().contains("(2, 3)") && err.to_string().contains("(2, 2)"));
    assert_eq!(a, a_before);
    assert_eq!(b, b_before);
}

#[test]
fn wrong_sized_sample_is_rejected() {
    let mut net = seeded(&[2, 3, 1], ActivationFunction::Sigmoid, 1);
    let before = net.clone();

    let result = net.train(
        &[Matrix::from_column(&[1.0, 2.0])],
        &[Matrix::from_column(&[1.0, 0.0])],
        10,
        0.1,
        None,
    );

    assert!(matches!(result, Err(NnError::ShapeMismatch { .. })));
    assert_eq!(net, before);
}
