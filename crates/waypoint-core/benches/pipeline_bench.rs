#![allow(missing_docs)]
//! Benchmark: draining a shortest-path pipeline.
//!
//! A values block feeds register-driven endpoints into a shortest path block
//! over a grid graph. Graph construction happens once; each iteration builds
//! a fresh pipeline and drains it with a fixed pull size.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use smallvec::SmallVec;
use waypoint_common::{DocumentId, Value};
use waypoint_core::graph::GraphAccess;
use waypoint_core::{
    Direction, Endpoint, ExecutionBlock, MemoryGraph, QueryContext, ShortestPathBlock,
    ShortestPathFinder, ShortestPathOptions, ShortestPathParams, SingletonBlock, ValuesBlock,
};

const GRID: usize = 40;

fn cell(x: usize, y: usize) -> DocumentId {
    DocumentId::parse(&format!("cells/{x}_{y}")).unwrap()
}

fn grid_graph() -> Arc<MemoryGraph> {
    let graph = MemoryGraph::new();
    graph.create_vertex_collection("cells").unwrap();
    graph.create_edge_collection("links").unwrap();
    for x in 0..GRID {
        for y in 0..GRID {
            graph
                .insert_vertex("cells", Some(&format!("{x}_{y}")), Value::object([("cost", (x + y) as i64)]))
                .unwrap();
        }
    }
    for x in 0..GRID {
        for y in 0..GRID {
            if x + 1 < GRID {
                graph
                    .insert_edge("links", None, &cell(x, y), &cell(x + 1, y), Value::object([("w", 1.0)]))
                    .unwrap();
            }
            if y + 1 < GRID {
                graph
                    .insert_edge("links", None, &cell(x, y), &cell(x, y + 1), Value::object([("w", 2.0)]))
                    .unwrap();
            }
        }
    }
    Arc::new(graph)
}

fn pipeline(graph: &Arc<MemoryGraph>, options: &ShortestPathOptions, rows: usize) -> ShortestPathBlock {
    let ctx = Arc::new(QueryContext::new());
    let endpoints = (0..rows)
        .map(|i| {
            let x = i % GRID;
            vec![
                Value::from(cell(0, x).as_str()),
                Value::from(cell(GRID - 1, GRID - 1 - x).as_str()),
            ]
        })
        .collect();
    let singleton = SingletonBlock::new(Arc::clone(ctx.pool()), 0);
    let values = ValuesBlock::new(Box::new(singleton), Arc::clone(ctx.pool()), 2, endpoints).unwrap();
    let finder = ShortestPathFinder::resolve(
        graph.as_ref(),
        options,
        &[("links".to_string(), Direction::Outbound)],
    )
    .unwrap();
    ShortestPathBlock::new(
        ctx,
        Box::new(values),
        Arc::clone(graph) as Arc<dyn GraphAccess>,
        finder,
        ShortestPathParams {
            start: Endpoint::Register(0),
            target: Endpoint::Register(1),
            vertex_register: Some(2),
            edge_register: Some(3),
            register_count: 4,
            clear_registers: SmallVec::new(),
        },
    )
    .unwrap()
}

fn drain(block: &mut ShortestPathBlock, at_most: usize) -> usize {
    let mut rows = 0;
    while let Some(batch) = block.get_some(at_most).unwrap() {
        rows += batch.row_count();
        black_box(batch);
    }
    rows
}

fn bench_drain(c: &mut Criterion) {
    let graph = grid_graph();
    let mut group = c.benchmark_group("shortest_path_drain");
    for (label, options) in [
        ("constant", ShortestPathOptions::default()),
        (
            "attribute",
            ShortestPathOptions {
                weight_attribute: Some("w".into()),
                default_weight: 1.0,
            },
        ),
    ] {
        for rows in [8usize, 32] {
            group.throughput(Throughput::Elements(rows as u64));
            group.bench_with_input(BenchmarkId::new(label, rows), &rows, |b, &rows| {
                b.iter_batched(
                    || pipeline(&graph, &options, rows),
                    |mut block| drain(&mut block, 1000),
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_skip(c: &mut Criterion) {
    let graph = grid_graph();
    let options = ShortestPathOptions::default();
    c.bench_function("shortest_path_skip", |b| {
        b.iter_batched(
            || pipeline(&graph, &options, 32),
            |mut block| black_box(block.skip_some(usize::MAX).unwrap()),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_drain, bench_skip);
criterion_main!(benches);
