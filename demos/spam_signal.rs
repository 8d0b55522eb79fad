//! Spam signal from a reservoir and a membrane hierarchy
//!
//! Drives both subsystems with synthetic message features the way a filter
//! would: the reservoir state is read out by a trained linear layer, the
//! membranes turn keyword signals into spam and ham scores, and the two are
//! blended into one probability.
//!
//! Run: RUST_LOG=reservoir=debug cargo run --example spam_signal

use rand::prelude::*;
use reservoir::{MembraneHierarchy, Object, PersonaTrait, ReservoirEngine, ReservoirParams};
use tracing_subscriber::EnvFilter;

/// Synthetic per-message features: link density, caps ratio, exclamations, length.
fn features(spam: bool, rng: &mut StdRng) -> [f64; 4] {
    let jitter = |rng: &mut StdRng| rng.gen::<f64>() * 0.2;
    if spam {
        [0.7 + jitter(rng), 0.6 + jitter(rng), 0.8 + jitter(rng), 0.3 + jitter(rng)]
    } else {
        [0.1 + jitter(rng), 0.1 + jitter(rng), 0.1 + jitter(rng), 0.6 + jitter(rng)]
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn membrane_score(spam_words: usize, ham_words: usize) -> reservoir::Result<f64> {
    let mut system = MembraneHierarchy::new(3);
    let leaves = ["root_0_0", "root_0_1", "root_1_0", "root_1_1"];

    for (k, leaf) in leaves.iter().cycle().take(spam_words).enumerate() {
        system.inject_object(leaf, Object::neutral("token", 1.0, 0.5))?;
        system.inject_object(leaf, Object::new("negative_signal", 1.0 + k as f64 * 0.1, -1, 0.9))?;
    }
    for leaf in leaves.iter().rev().cycle().take(ham_words) {
        system.inject_object(leaf, Object::neutral("token", 1.0, 0.5))?;
        system.inject_object(leaf, Object::new("positive_signal", 1.0, 1, 0.7))?;
    }
    system.run(3);

    let (mut spam, mut ham) = (0.0, 0.0);
    for object in system.collect_results() {
        match object.kind.as_str() {
            "spam_score" => spam += object.value,
            "ham_score" => ham += object.value,
            _ => {}
        }
    }
    Ok(sigmoid(spam - ham))
}

fn main() -> reservoir::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("{}", "=".repeat(60));
    println!("Reservoir + membrane spam signal");
    println!("{}", "=".repeat(60));

    let params = ReservoirParams {
        reservoir_size: 80,
        ..Default::default()
    };
    let engine = ReservoirEngine::new(params, PersonaTrait::default(), 42)?;
    let mut rng = StdRng::seed_from_u64(7);

    // Training pass: each message starts from a clean state
    let mut states = Vec::new();
    let mut targets = Vec::new();
    for k in 0..40 {
        let spam = k % 2 == 0;
        engine.reset();
        engine.update(&features(spam, &mut rng))?;
        states.push(engine.get_state());
        targets.push(vec![if spam { 1.0 } else { 0.0 }]);
    }
    engine.train_output(&states, &targets)?;
    println!("\nTrained readout: {:?}", engine.stats());

    println!("\n{:<8} {:>10} {:>10} {:>10}", "message", "reservoir", "membrane", "blended");
    println!("{}", "-".repeat(42));

    for (label, spam, spam_words, ham_words) in [
        ("spam", true, 4, 0),
        ("ham", false, 0, 3),
        ("mixed", true, 1, 2),
    ] {
        engine.reset();
        engine.update(&features(spam, &mut rng))?;
        let reservoir = sigmoid(engine.predict()?[0] * 4.0 - 2.0);
        let membrane = membrane_score(spam_words, ham_words)?;
        let blended = 0.6 * reservoir + 0.4 * membrane;

        println!("{:<8} {:>10.3} {:>10.3} {:>10.3}", label, reservoir, membrane, blended);
    }

    println!(
        "\nSpectral radius estimate: {:.4}",
        engine.spectral_radius_estimate()
    );
    Ok(())
}
