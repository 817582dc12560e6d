// Intensive benchmarks for the all-pairs similarity scan
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crosslink::{
    find_all_similar, find_all_similar_with, CommonSchema, Comparator, Row, ScanOptions, Value, ValueType,
};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::time::Duration;

const WORDS: &[&str] = &[
    "upes", "iela", "valmiera", "riga", "brivibas", "gatve", "liepaja", "kalna", "skolas", "dzirnavu",
];

fn common(comparator: Comparator) -> CommonSchema {
    CommonSchema::builder()
        .field("id", ValueType::Integer, 0.0)
        .field_with("address", ValueType::Text, 0.7, comparator)
        .field_with("amount", ValueType::Real, 0.3, Comparator::NumericRelative)
        .build()
        .unwrap()
}

fn generate_rows(size: usize, common: &CommonSchema) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..size)
        .map(|i| {
            let address: Vec<&str> = WORDS.choose_multiple(&mut rng, 3).copied().collect();
            let amount = rng.random_range(10.0..1_000.0_f64).round();
            common
                .row(vec![
                    Value::Integer(i as i64),
                    address.join(" ").into(),
                    Value::Real(amount),
                ])
                .unwrap()
        })
        .collect()
}

// Sequential scan with different comparators
fn benchmark_comparators(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_similar_comparators");
    group.sample_size(10);

    let comparators = [
        ("exact", Comparator::Exact),
        ("token_set", Comparator::TokenSet),
        ("trigram", Comparator::Trigram),
        ("jaro_winkler", Comparator::JaroWinkler),
    ];

    for (name, comparator) in comparators {
        let common = common(comparator);
        let rows = generate_rows(1_000, &common);
        group.bench_function(name, |b| {
            b.iter(|| black_box(find_all_similar(black_box(&rows), &common, 0.9).len()));
        });
    }

    group.finish();
}

// Sequential vs parallel
fn benchmark_parallelism(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_similar_parallelism");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    let common = common(Comparator::TokenSet);
    for size in [1_000, 3_000].iter() {
        let rows = generate_rows(*size, &common);
        for jobs in [1, 2, 4, 0] {
            let options = ScanOptions::default().with_parallelism(jobs);
            let label = if jobs == 0 { "all".to_string() } else { jobs.to_string() };
            group.bench_with_input(BenchmarkId::new(format!("jobs_{}", label), size), size, |b, _| {
                b.iter(|| black_box(find_all_similar_with(&rows, &common, 0.9, &options).groups.len()));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_comparators, benchmark_parallelism);
criterion_main!(benches);
