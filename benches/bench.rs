// Criterion benchmarks for the DateMeDoc matching core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use datemedoc_api::core::{text_match_score, MatchEngine, MatchInput, ScoringWeights};
use datemedoc_api::models::UserProfile;

const INTEREST_POOL: &[&str] = &[
    "hiking", "jazz", "cooking", "film", "climbing", "poetry", "chess", "running",
    "photography", "gardening",
];

fn make_input(seed: usize) -> MatchInput {
    MatchInput {
        interests: INTEREST_POOL
            .iter()
            .skip(seed % 5)
            .take(4)
            .map(|s| s.to_string())
            .collect(),
        values: vec!["honesty".to_string(), "curiosity".to_string()],
        location: Some(if seed % 2 == 0 { "Berlin" } else { "Hamburg" }.to_string()),
        age: Some(25 + (seed % 15) as u8),
    }
}

fn make_candidate(seed: usize) -> UserProfile {
    serde_json::from_value(serde_json::json!({
        "id": uuid::Uuid::new_v4(),
        "auth_user_id": format!("auth-{}", seed),
        "email": format!("user{}@example.com", seed),
        "name": format!("User {}", seed),
        "age": 25 + (seed % 15),
        "location": if seed % 2 == 0 { "Berlin" } else { "Hamburg" },
        "interests": INTEREST_POOL.iter().skip(seed % 5).take(4).collect::<Vec<_>>(),
        "values": ["honesty", "curiosity"],
        "bio": "I spend my weekends outdoors and my evenings cooking.",
        "profile_completed": true,
    }))
    .expect("candidate should deserialize")
}

fn bench_text_match_score(c: &mut Criterion) {
    let weights = ScoringWeights::default();
    let a = make_input(0);
    let b = make_input(3);

    c.bench_function("text_match_score", |bench| {
        bench.iter(|| text_match_score(black_box(&a), black_box(&b), black_box(&weights)));
    });
}

fn bench_rank_candidates(c: &mut Criterion) {
    let engine = MatchEngine::with_default_weights();
    let user = make_candidate(0);

    let mut group = c.benchmark_group("rank_candidates");
    for size in [100usize, 1_000, 10_000] {
        let candidates: Vec<UserProfile> = (1..=size).map(make_candidate).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter_batched(
                || candidates.clone(),
                |pool| engine.rank_candidates(black_box(&user), pool, 20),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_text_match_score, bench_rank_candidates);
criterion_main!(benches);
