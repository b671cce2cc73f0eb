use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sanitize::lexer::lex;
use sanitize::perf_fixtures::{make_blocks, make_foreign_soup, make_unclosed_nesting};
use sanitize::pipeline::Pipeline;
use sanitize::{Config, ContentModel, RunContext};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 8_000;

fn purify(input: &str, model: &ContentModel, config: &Config) -> usize {
    let mut pipeline = Pipeline::new(model, config, Vec::new()).expect("bench config is valid");
    let mut ctx = RunContext::new();
    pipeline.run(lex(input), &mut ctx).len()
}

fn bench_purify_small(c: &mut Criterion) {
    let model = ContentModel::html_default();
    let config = Config::default();
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_purify_small", |b| {
        b.iter(|| black_box(purify(black_box(&input), &model, &config)));
    });
}

fn bench_purify_large(c: &mut Criterion) {
    let model = ContentModel::html_default();
    let config = Config::default();
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_purify_large", |b| {
        b.iter(|| black_box(purify(black_box(&input), &model, &config)));
    });
}

fn bench_purify_foreign_soup(c: &mut Criterion) {
    let model = ContentModel::html_default();
    let config = Config::default();
    let input = make_foreign_soup(2_000);
    c.bench_function("bench_purify_foreign_soup", |b| {
        b.iter(|| black_box(purify(black_box(&input), &model, &config)));
    });
}

fn bench_purify_deep_nesting(c: &mut Criterion) {
    let model = ContentModel::html_default();
    let config = Config::default();
    let input = make_unclosed_nesting(20_000);
    c.bench_function("bench_purify_deep_nesting", |b| {
        b.iter(|| black_box(purify(black_box(&input), &model, &config)));
    });
}

criterion_group!(
    benches,
    bench_purify_small,
    bench_purify_large,
    bench_purify_foreign_soup,
    bench_purify_deep_nesting
);
criterion_main!(benches);
