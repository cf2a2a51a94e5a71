use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use discrete_mcmc::core::MarkovChain;
use discrete_mcmc::{sample, RjMarkovChain, SamplerConfig, StateVector};

fn weighted(state: &StateVector, weights: &Vec<f64>) -> f64 {
    state
        .as_slice()
        .iter()
        .zip(weights)
        .map(|(&b, w)| b as f64 * w)
        .sum()
}

fn weights(dim: usize) -> Vec<f64> {
    (0..dim).map(|i| (i as f64 * 0.7).sin()).collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let init = vec![0u8; 10];
    c.bench_function("sample 10 x 1000", |b| {
        b.iter(|| sample(black_box(&init), weighted, weights(10), 1_000, Some(42)).unwrap())
    });

    let init = vec![0u8; 200];
    c.bench_function("sample 200 x 1000", |b| {
        b.iter(|| sample(black_box(&init), weighted, weights(200), 1_000, Some(42)).unwrap())
    });

    let config = SamplerConfig::default().with_niter(1_000).with_seed(42);
    for cache in [true, false] {
        let config = config.clone().with_cache(cache);
        c.bench_function(&format!("step 50, cache={cache}"), |b| {
            b.iter_batched(
                || {
                    let start = StateVector::zeros(50).unwrap();
                    RjMarkovChain::from_config(weighted, Arc::new(weights(50)), start, &config)
                        .unwrap()
                },
                |mut chain| {
                    for _ in 0..1_000 {
                        black_box(chain.step().unwrap());
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
