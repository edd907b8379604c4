use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use news_reader::news::parser::ResponseParser;
use news_reader::storage::{
    sort_newest_first, ArticleStore, FileArticleStore, MemoryArticleStore, CATEGORY_TOP_HEADLINES,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

use test_data::*;

fn bench_parse_responses(c: &mut Criterion) {
    let parser = ResponseParser::new();

    let mut group = c.benchmark_group("response_parsing");

    for &count in &[1, 20, 100, 1000] {
        let body = response_body(count);
        group.bench_with_input(BenchmarkId::new("parse_articles", count), &body, |b, body| {
            b.iter(|| {
                let result = parser.parse_articles(body.as_bytes());
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_sorting(c: &mut Criterion) {
    let mut group = c.benchmark_group("article_operations");

    let batch = articles(1000);
    group.bench_function("sort_newest_first", |b| {
        b.iter(|| {
            let mut batch = batch.clone();
            sort_newest_first(&mut batch);
            black_box(batch)
        });
    });

    group.bench_function("headline", |b| {
        b.iter(|| {
            for article in &batch {
                black_box(article.headline());
            }
        });
    });

    group.finish();
}

fn bench_memory_store(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = MemoryArticleStore::default();
    let page = articles(20);

    let mut group = c.benchmark_group("memory_store");

    group.bench_function("replace_page", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.replace_category(CATEGORY_TOP_HEADLINES, &page).await.unwrap();
            })
        });
    });

    group.bench_function("read_page", |b| {
        b.iter(|| {
            let result = rt.block_on(store.read_category(CATEGORY_TOP_HEADLINES));
            black_box(result)
        });
    });

    group.finish();
}

fn bench_file_store(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let store = FileArticleStore::open(temp_dir.path()).unwrap();

    let mut group = c.benchmark_group("file_store");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    for &count in &[20, 100] {
        let page = articles(count);
        group.bench_with_input(BenchmarkId::new("replace_page", count), &page, |b, page| {
            b.iter(|| {
                rt.block_on(async {
                    store.replace_category(CATEGORY_TOP_HEADLINES, page).await.unwrap();
                })
            });
        });
    }

    group.bench_function("read_page", |b| {
        b.iter(|| {
            let result = rt.block_on(store.read_category(CATEGORY_TOP_HEADLINES));
            black_box(result)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_responses,
    bench_sorting,
    bench_memory_store,
    bench_file_store
);
criterion_main!(benches);
