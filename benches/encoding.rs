use std::hint::black_box;

use civic_priority::encoding::Encoders;
use civic_priority::ml::regressor::TrainOptions;
use civic_priority::priority::{ComplaintPayload, train_from_samples};
use civic_priority::dataset::TrainingSample;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const SAMPLE_COUNT: usize = 500;

fn corpus() -> Vec<TrainingSample> {
    (0..SAMPLE_COUNT)
        .map(|i| {
            if i % 2 == 0 {
                TrainingSample::new(
                    "water_supply",
                    format!("Burst water main flooding street number {i} near market"),
                    0.9,
                )
            } else {
                TrainingSample::new("roads", format!("Small pothole on lane {i} near corner"), 0.2)
            }
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let samples = corpus();
    let encoders = Encoders::fit(
        samples
            .iter()
            .map(|sample| (sample.category.as_str(), sample.description.as_str())),
    );
    c.bench_with_input(
        BenchmarkId::new("encode", SAMPLE_COUNT),
        &samples,
        |b, samples| {
            b.iter(|| {
                for sample in samples {
                    black_box(encoders.encode(&sample.category, &sample.description));
                }
            });
        },
    );
}

fn bench_score(c: &mut Criterion) {
    let options = TrainOptions {
        epochs: 5,
        ..TrainOptions::default()
    };
    let (scorer, _) = train_from_samples(&corpus(), &options).expect("train scorer");
    let payload = ComplaintPayload::new("water_supply", "Sewage overflow flooding homes near school");
    c.bench_function("score_single", |b| {
        b.iter(|| scorer.score(black_box(&payload)).expect("score"));
    });
}

criterion_group!(benches, bench_encode, bench_score);
criterion_main!(benches);
