use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tracer_core::pitch::{FRAME_SIZE, PitchEstimator};

pub fn estimator_benchmark(c: &mut Criterion) {
    const SAMPLE_RATE: f32 = 44100.0;

    let signal: Vec<f32> = (0..FRAME_SIZE)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / SAMPLE_RATE).sin())
        .collect();
    let silence = vec![0.0; FRAME_SIZE];

    let mut estimator = PitchEstimator::default();

    c.bench_function("estimate 220 Hz", |b| {
        b.iter(|| estimator.estimate(black_box(&signal), SAMPLE_RATE))
    });
    c.bench_function("estimate silence", |b| {
        b.iter(|| estimator.estimate(black_box(&silence), SAMPLE_RATE))
    });
}

criterion_group!(benches, estimator_benchmark);
criterion_main!(benches);
