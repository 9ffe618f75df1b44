use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use relicard::assets::AssetResolver;
use relicard::gamedata::StaticGameDatabase;
use relicard::normalize::normalize_character;
use relicard::render::{encode_png, render, scene::compose, theme::CardTheme};
use serde_json::{json, Value};

fn full_character() -> Value {
    let relic = |slot: u32| {
        json!({
            "id": 61000 + slot,
            "level": 15,
            "main_stat": "ATK",
            "main_value": 352.8,
            "sub_stats": [
                {"name": "Crit Rate", "value": 7.3, "is_percent": true},
                {"name": "Crit DMG", "value": 12.4, "is_percent": true},
                {"name": "SPD", "value": 4, "is_percent": false},
                {"name": "ATK%", "value": 8.2, "is_percent": true}
            ]
        })
    };
    json!({
        "name": "Acheron",
        "level": 80,
        "eidolon": 2,
        "element": "Lightning",
        "path": "Nihility",
        "stats": {"hp": 4120, "atk": 3456, "def": 1210, "spd": 134,
                  "crit_rate": 67.2, "crit_dmg": 180.4},
        "light_cone": {"id": 23024, "name": "Along the Passing Shore", "level": 80, "superimpose": 1},
        "relics": (1..=6).map(relic).collect::<Vec<_>>()
    })
}

fn bench_render_card(c: &mut Criterion) {
    let theme = CardTheme::default();
    let resolver = AssetResolver::placeholders_only();
    let db = StaticGameDatabase::empty();
    let builds = [
        ("bare", normalize_character(&json!({"name": "Acheron"}), &db)),
        ("full", normalize_character(&full_character(), &db)),
    ];

    let mut group = c.benchmark_group("render_card");
    group.throughput(Throughput::Elements(1));
    for (label, build) in &builds {
        group.bench_function(BenchmarkId::new("compose", label), |b| {
            b.iter(|| compose(build, &theme))
        });
        group.bench_function(BenchmarkId::new("rasterize", label), |b| {
            b.iter(|| render(build, &theme, &resolver))
        });
    }
    let image = render(&builds[1].1, &theme, &resolver);
    group.bench_function("encode_png", |b| b.iter(|| encode_png(&image)));
    group.bench_function("normalize_full", |b| {
        let raw = full_character();
        b.iter(|| normalize_character(&raw, &db))
    });
    group.finish();
}

criterion_group!(benches, bench_render_card);
criterion_main!(benches);
