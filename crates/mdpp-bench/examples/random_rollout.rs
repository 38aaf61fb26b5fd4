//! Random-agent rollout against the synthetic PDN simulator.
//!
//! Demonstrates: build config → MdppEnv → reset → step random legal cells →
//! terminal reward → text plot. Set `RUST_LOG=mdpp_env=debug` for more.

use std::error::Error;

use mdpp_bench::{random_legal_actions, reference_config};
use mdpp_core::probe_cells;
use mdpp_env::{MdppEnv, PlacementEnv};
use mdpp_reward::{PdnModel, PdnSimulator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    println!("=== mdpp Random Rollout Example ===\n");

    let config = reference_config(42);
    let model = PdnModel::synthetic(config.size, 32)?;
    let mut env = MdppEnv::new(config, PdnSimulator::new(model))?;
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    // --- Episode 1: batch of 4 ---
    println!("Episode 1: batch of 4, random legal placements");
    let mut state = env.reset(None, 4)?;
    let mut steps = 0;
    while !state.all_done() {
        let actions = random_legal_actions(&state, &mut rng);
        env.step(&mut state, actions.view())?;
        steps += 1;
    }
    println!("  finished after {steps} steps");

    let breakdown = env.evaluate(&state)?;
    for b in 0..state.batch_size() {
        let probes = probe_cells(state.probe.row(b));
        println!(
            "  instance {b}: probes={:?}, decaps={:>2}, reward={:>10.4}",
            probes.as_slice(),
            state.i[b],
            breakdown.rewards[b],
        );
        for &(probe, score) in &breakdown.per_probe[b] {
            println!("      probe {probe:>3}: {score:>10.4}");
        }
    }
    println!(
        "  simulator calls={}, time={}μs\n",
        breakdown.metrics.simulator_calls, breakdown.metrics.elapsed_us,
    );

    println!("Instance 0 (P=probe, D=decap, #=keepout, .=free):");
    print!("{}", env.render(&state, 0)?);

    // --- Episode 2: reseeded, single instance ---
    println!("\nEpisode 2: reseed, one unbatched instance");
    env.reseed(7);
    let mut state = env.reset_single(None)?;
    while !state.all_done() {
        let actions = random_legal_actions(&state, &mut rng);
        env.step_single(&mut state, actions[0])?;
    }
    let reward = env.reward_from_state(&state)?;
    println!("  reward={:.4}", reward[0]);
    print!("{}", env.render(&state, 0)?);

    println!("\n=== Done ===");
    Ok(())
}
