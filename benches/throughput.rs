use criterion::{Criterion, criterion_group, criterion_main};

use mapattic::{
    codec::{apply_delta, compute_delta},
    collect::{
        collector::{Collector, CollectorConfig, Unchecked},
        cursor::VecCursor,
    },
    delta::envelope::ElementDelta,
    element::{Element, Identified, WayRecord},
    history::ElementHistory,
    types::{BucketKey, ElementId, Timestamp},
    versioned::Versioned,
};

fn way(id: u64, nodes: Vec<u64>) -> Element {
    Element::Way(WayRecord {
        id,
        nodes,
        geometry: vec![],
    })
}

fn bench_codec(c: &mut Criterion) {
    let reference: Vec<u64> = (0..10_000).collect();
    let mut target = reference.clone();
    target[5_000] = 1_000_000;
    target.insert(5_001, 1_000_001);

    c.bench_function("codec_compute_10k", |b| {
        b.iter(|| compute_delta(&target, &reference));
    });

    let delta = compute_delta(&target, &reference);
    c.bench_function("codec_apply_10k", |b| {
        b.iter(|| apply_delta(reference.clone(), &delta));
    });
}

fn bench_collect(c: &mut Criterion) {
    let mut current: Vec<(BucketKey, ElementId, Element)> = Vec::new();
    let mut deltas: Vec<(BucketKey, ElementId, Versioned<ElementDelta>)> = Vec::new();

    for bucket in 0..50u32 {
        for slot in 0..20u64 {
            let id = u64::from(bucket) * 100 + slot + 1;
            let base: Vec<u64> = (id * 10..id * 10 + 8).collect();

            let mut history =
                ElementHistory::created(Timestamp::new(100), way(id, base.clone()))
                    .expect("create");
            for revision in 0..4u64 {
                let mut nodes = base.clone();
                nodes.push(id + revision);
                history
                    .revise(Timestamp::new(200 + 100 * revision), way(id, nodes))
                    .expect("revise");
            }

            let (record, chain) = history.into_parts();
            current.push((bucket, record.id(), record));
            deltas.extend(chain.into_iter().map(|delta| (bucket, delta.value.id(), delta)));
        }
    }

    c.bench_function("collect_50_buckets_1k_ids", |b| {
        b.iter(|| {
            let mut collector = Collector::new(CollectorConfig::default(), Unchecked);
            collector
                .collect(
                    VecCursor::new(current.clone()),
                    VecCursor::new(deltas.clone()),
                    Timestamp::new(350),
                )
                .expect("collect")
        });
    });
}

criterion_group!(benches, bench_codec, bench_collect);
criterion_main!(benches);
