use criterion::{criterion_group, criterion_main, Criterion};
use persistence::MemoryStore;
use sim_core::{Catalog, Difficulty};
use sim_runtime::{Command, EngineConfig, Session};
use std::time::Duration;

fn loaded_session() -> Session<MemoryStore> {
    let cfg = EngineConfig {
        // Keep serialization out of the advance benchmark.
        autosave_interval_ms: 3_600_000,
        ..EngineConfig::default()
    };
    let mut session = Session::login(
        MemoryStore::new(),
        Catalog::builtin(),
        "bench",
        Some(Difficulty::Easy),
        cfg,
    )
    .unwrap();
    session.state_mut().money = 1e12;
    let businesses: Vec<_> = session
        .catalog()
        .businesses
        .iter()
        .map(|b| b.id.clone())
        .collect();
    for id in &businesses {
        for _ in 0..2 {
            session
                .apply(Command::AcquireBusiness {
                    business_id: id.clone(),
                })
                .unwrap();
        }
    }
    let assets: Vec<_> = session
        .catalog()
        .assets
        .iter()
        .map(|a| a.id.clone())
        .collect();
    for id in assets {
        session
            .apply(Command::BuyAsset {
                asset_id: id,
                quantity: 10.0,
            })
            .unwrap();
    }
    let items: Vec<_> = session
        .catalog()
        .lifestyle
        .iter()
        .map(|i| i.id.clone())
        .collect();
    for id in items {
        session
            .apply(Command::BuyLifestyleItem { item_id: id })
            .unwrap();
    }
    session
}

fn bench_advance(c: &mut Criterion) {
    let mut session = loaded_session();
    c.bench_function("session_advance_1s", |b| {
        b.iter(|| session.advance(Duration::from_millis(1_000)))
    });
}

fn bench_flush(c: &mut Criterion) {
    let mut session = loaded_session();
    c.bench_function("snapshot_flush", |b| {
        b.iter(|| session.flush().unwrap())
    });
}

criterion_group!(benches, bench_advance, bench_flush);
criterion_main!(benches);
