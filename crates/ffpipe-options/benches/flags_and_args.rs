//! Benchmarks for flag parsing and argument assembly.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ffpipe_options::{FlagSet, OptionSpec, Options, Rule, Schema, Value};
use std::sync::LazyLock;

const MOVFLAGS: &[&str] = &[
    "rtphint",
    "empty_moov",
    "frag_keyframe",
    "frag_every_frame",
    "separate_moof",
    "faststart",
    "dash",
    "cmaf",
];

static ENCODER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("bench-encoder")
        .opt("codec", "c:v", Rule::Any)
        .opt("bitrate", "b:v", Rule::Any)
        .opt("crf", "crf", Rule::Range { min: 0.0, max: 51.0 })
        .opt("preset", "preset", Rule::OneOf(&["fast", "medium", "slow"]))
        .switch("no_audio", "an")
        .option(
            OptionSpec::new("movflags", "movflags", Rule::Flags(MOVFLAGS))
                .with_default(FlagSet::with_allowed(MOVFLAGS)),
        )
});

fn bench_flag_parse(c: &mut Criterion) {
    c.bench_function("flags_parse_compile", |b| {
        b.iter(|| {
            let flags =
                FlagSet::parse_with(black_box("+faststart-empty_moov+frag_keyframe+dash"), MOVFLAGS)
                    .unwrap();
            black_box(flags.compile())
        })
    });
}

fn bench_ordered_args(c: &mut Criterion) {
    let mut opts = Options::new(&ENCODER);
    opts.set("codec", "libx264").unwrap();
    opts.set("bitrate", "2000k").unwrap();
    opts.set("crf", 23).unwrap();
    opts.set("preset", "fast").unwrap();
    opts.set("no_audio", Value::Switch).unwrap();
    opts.set("movflags", "+faststart+frag_keyframe").unwrap();

    c.bench_function("options_to_ordered_args", |b| {
        b.iter(|| black_box(opts.to_ordered_args()))
    });
}

criterion_group!(benches, bench_flag_parse, bench_ordered_args);
criterion_main!(benches);
