//! Load and Dump Benchmarks
//!
//! Measures the cost of the load pipeline for flat and nested schemas, of
//! failing loads that accumulate errors, and of dumping loaded instances.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use schema_engine::{Field, Schema, SchemaType, TypeExpr};
use serde_json::{Map, Value, json};

fn author_schema() -> SchemaType {
    SchemaType::builder("Author")
        .field("name", Field::string())
        .field("rating", Field::integer().strict(false))
        .build()
        .expect("Failed to build Author")
}

fn book_schema(author: &SchemaType) -> SchemaType {
    SchemaType::builder("Book")
        .field("title", Field::string())
        .field("author", Field::object(author))
        .field("pages", Field::integer())
        .field("tags", Field::list(TypeExpr::Str).default(json!([])))
        .field("price", Field::float().nullable(true).required(false))
        .build()
        .expect("Failed to build Book")
}

fn create_book_data(index: usize) -> Map<String, Value> {
    let value = json!({
        "title": format!("Book {}", index),
        "author": {"name": format!("Author {}", index % 17), "rating": (index % 10).to_string()},
        "pages": 100 + index,
        "tags": ["fiction", "bench"],
        "price": null
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn create_invalid_book_data(index: usize) -> Map<String, Value> {
    let value = json!({
        "title": index,
        "author": {"name": null, "rating": "many"},
        "pages": "lots",
        "tags": [1, 2, 3],
        "unknown": true
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Benchmark loading valid and invalid records
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    let author = author_schema();
    let book = book_schema(&author);

    for size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("valid_records", size), size, |b, &size| {
            let test_data: Vec<Map<String, Value>> = (0..size).map(create_book_data).collect();

            b.iter(|| {
                for data in &test_data {
                    let _ = black_box(book.load(black_box(data)));
                }
            });
        });

        group.bench_with_input(
            BenchmarkId::new("validation_failures", size),
            size,
            |b, &size| {
                let test_data: Vec<Map<String, Value>> =
                    (0..size).map(create_invalid_book_data).collect();

                b.iter(|| {
                    for data in &test_data {
                        let result = book.load(black_box(data));
                        let _ = black_box(result.map_err(|e| e.raw()));
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark dumping loaded instances
fn bench_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("dump");
    let author = author_schema();
    let book = book_schema(&author);

    let instances: Vec<Schema> = (0..100)
        .map(|i| book.load(&create_book_data(i)).expect("valid benchmark data"))
        .collect();

    group.bench_function("dump", |b| {
        b.iter(|| {
            for instance in &instances {
                let _ = black_box(instance.dump());
            }
        });
    });

    group.bench_function("to_json", |b| {
        b.iter(|| {
            for instance in &instances {
                black_box(instance.to_json());
            }
        });
    });

    group.finish();
}

/// Benchmark schema type construction
fn bench_build(c: &mut Criterion) {
    let author = author_schema();

    c.bench_function("build_schema_type", |b| {
        b.iter(|| black_box(book_schema(black_box(&author))));
    });
}

criterion_group!(benches, bench_load, bench_dump, bench_build);
criterion_main!(benches);
