use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use alice_trie::{KeySet, SearchAgent, TrieIndex};

fn generate_keys(count: usize) -> Vec<String> {
    let stems = [
        "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog",
        "alice", "bob", "server", "request", "response", "error", "data",
        "cache", "index", "search", "query", "result",
    ];
    (0..count)
        .map(|i| format!("{}{}{}", stems[i % stems.len()], stems[(i / 7) % stems.len()], i))
        .collect()
}

fn build(keys: &[String]) -> TrieIndex {
    let mut keyset: KeySet = keys.iter().collect();
    TrieIndex::from_keyset(&mut keyset).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for count in [1_000, 10_000, 50_000] {
        let keys = generate_keys(count);
        group.bench_with_input(BenchmarkId::new("keys", count), &keys, |b, keys| {
            b.iter(|| build(black_box(keys)))
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let keys = generate_keys(100_000);
    let trie = build(&keys);
    let mut agent = SearchAgent::new();

    c.bench_function("lookup_hit", |b| {
        b.iter(|| {
            agent.set_query(black_box("overfox12345"));
            trie.lookup(&mut agent)
        })
    });

    c.bench_function("lookup_miss", |b| {
        b.iter(|| {
            agent.set_query(black_box("zzzzz"));
            trie.lookup(&mut agent)
        })
    });
}

fn bench_reverse_lookup(c: &mut Criterion) {
    let keys = generate_keys(100_000);
    let trie = build(&keys);
    let mut agent = SearchAgent::new();

    c.bench_function("reverse_lookup", |b| {
        let mut id = 0;
        b.iter(|| {
            id = (id + 7919) % trie.num_keys();
            agent.set_reverse_query(black_box(id));
            trie.reverse_lookup(&mut agent).unwrap()
        })
    });
}

fn bench_prefix_searches(c: &mut Criterion) {
    let keys = generate_keys(100_000);
    let trie = build(&keys);
    let mut group = c.benchmark_group("predictive");

    for prefix in ["fox", "serverquery", "searchquery1"] {
        group.bench_with_input(BenchmarkId::new("prefix", prefix), prefix, |b, prefix| {
            b.iter(|| black_box(trie.predict(black_box(prefix)).count()))
        });
    }
    group.finish();

    c.bench_function("predict_first_10", |b| {
        b.iter(|| black_box(trie.predict(black_box("s")).take(10).count()))
    });

    c.bench_function("common_prefix", |b| {
        b.iter(|| black_box(trie.common_prefixes(black_box("overfox12345xyz")).count()))
    });
}

criterion_group!(
    benches,
    bench_build,
    bench_lookup,
    bench_reverse_lookup,
    bench_prefix_searches,
);
criterion_main!(benches);
