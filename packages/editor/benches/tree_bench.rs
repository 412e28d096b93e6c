use criterion::{black_box, criterion_group, criterion_main, Criterion};
use funnel_editor::tree::{delete_by_id, duplicate_block, find_by_id, move_between_parents};
use funnel_editor::validate_block_structure;
use funnel_model::{Block, BlockType, IdGenerator};

/// 200 containers with 10 children each
fn large_forest() -> Vec<Block> {
    (0..200)
        .map(|i| {
            let children = (0..10)
                .map(|j| {
                    let block_type = if j % 2 == 0 { BlockType::Text } else { BlockType::Image };
                    Block::new(format!("c{}-b{}", i, j), block_type)
                })
                .collect();
            Block::new(format!("c{}", i), BlockType::Container).with_children(children)
        })
        .collect()
}

fn find_deep_block(c: &mut Criterion) {
    let forest = large_forest();

    c.bench_function("find_by_id_last_leaf", |b| {
        b.iter(|| find_by_id(black_box(&forest), black_box("c199-b9")))
    });
}

fn delete_block(c: &mut Criterion) {
    let forest = large_forest();

    c.bench_function("delete_by_id_nested", |b| {
        b.iter(|| delete_by_id(black_box(&forest), black_box("c100-b5")))
    });
}

fn move_block(c: &mut Criterion) {
    let mut forest = large_forest();
    // Leave room in the target container
    forest[150].children = Some(Vec::new());

    c.bench_function("move_between_parents", |b| {
        b.iter(|| move_between_parents(black_box(&forest), "c10-b2", Some("c10"), "c150"))
    });
}

fn duplicate_container(c: &mut Criterion) {
    let forest = large_forest();

    c.bench_function("duplicate_container", |b| {
        let mut ids = IdGenerator::from_seed("bench");
        b.iter(|| duplicate_block(black_box(&forest), "c50", &mut ids))
    });
}

fn audit_forest(c: &mut Criterion) {
    let forest = large_forest();

    c.bench_function("validate_block_structure", |b| {
        b.iter(|| validate_block_structure(black_box(&forest)))
    });
}

criterion_group!(
    benches,
    find_deep_block,
    delete_block,
    move_block,
    duplicate_container,
    audit_forest
);
criterion_main!(benches);
