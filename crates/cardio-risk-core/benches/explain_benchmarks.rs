use cardio_risk_core::inference::FittedScaler;
use cardio_risk_core::{ExplanationEngine, RiskRecord, RiskRecordInput};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn record(bmi: f64, smoker: f64) -> RiskRecord {
    RiskRecordInput {
        gender: Some(1.0),
        age_years: Some(58.0),
        bmi: Some(bmi),
        pulse_pressure: Some(55.0),
        mean_arterial_pressure: Some(104.0),
        systolic_diastolic_ratio: Some(1.6),
        cholesterol: Some(2.0),
        glucose: Some(3.0),
        smoker: Some(smoker),
        alcohol: Some(0.0),
        physically_active: Some(0.0),
    }
    .validate()
    .unwrap()
}

fn bench_explain(c: &mut Criterion) {
    let engine = ExplanationEngine::new();
    let busy = record(41.0, 1.0);
    let quiet = RiskRecordInput {
        pulse_pressure: Some(35.0),
        mean_arterial_pressure: Some(85.0),
        systolic_diastolic_ratio: Some(1.3),
        cholesterol: Some(1.0),
        glucose: Some(1.0),
        physically_active: Some(1.0),
        ..RiskRecordInput::from(&record(22.0, 0.0))
    }
    .validate()
    .unwrap();

    c.bench_function("explain all rules firing", |b| {
        b.iter(|| engine.explain(black_box(&busy)))
    });
    c.bench_function("explain no rules firing", |b| {
        b.iter(|| engine.explain(black_box(&quiet)))
    });
}

fn bench_validate(c: &mut Criterion) {
    let input = RiskRecordInput::from(&record(31.0, 0.0));
    c.bench_function("validate record input", |b| {
        b.iter(|| black_box(&input).validate())
    });
}

fn bench_scale(c: &mut Criterion) {
    let scaler = FittedScaler::identity();
    let features = record(28.0, 0.0).to_features();
    c.bench_function("scale feature vector", |b| {
        b.iter(|| scaler.transform_features(black_box(&features)))
    });
}

criterion_group!(benches, bench_explain, bench_validate, bench_scale);
criterion_main!(benches);
