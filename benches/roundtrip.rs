//! Benchmarks for module image encoding and decoding.
//!
//! Builds a synthetic module of configurable size and measures the serialize /
//! parse round-trip, which dominates every CLI invocation.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use cilpatch::prelude::*;

/// A module with `type_count` types, each carrying a handful of members and a body.
fn synthetic_module(type_count: usize) -> Module {
    let mut module = Module::new("Synthetic");

    for i in 0..type_count {
        let mut ty = CilType::new("Game.Generated", &format!("Type{i}"), TypeVisibility::NOT_PUBLIC);

        ty.fields
            .push(Field::new("_state", MemberAccessFlags::PRIVATE));
        ty.methods.push(
            Method::new("Tick", MemberAccessFlags::PRIVATE).with_body(MethodBody::new(vec![
                Instruction::ldstr("tick"),
                Instruction::ldc_i4(i as i32),
                Instruction::call(MethodRef::new("Game.Engine", "Log")),
                Instruction::ret(),
            ])),
        );
        ty.methods
            .push(Method::new("get_State", MemberAccessFlags::PRIVATE));
        ty.properties
            .push(Property::new("State", Some("get_State"), None));

        module.add_type(ty);
    }

    module
}

fn bench_roundtrip(c: &mut Criterion) {
    let module = synthetic_module(512);
    let bytes = module.to_bytes().expect("serialization failed");

    let mut group = c.benchmark_group("image");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| black_box(black_box(&module).to_bytes().unwrap()));
    });
    group.bench_function("decode", |b| {
        b.iter(|| black_box(Module::from_bytes(black_box(&bytes)).unwrap()));
    });
    group.finish();
}

fn bench_publicize(c: &mut Criterion) {
    let module = synthetic_module(512);

    c.bench_function("publicize_512_types", |b| {
        b.iter_batched(
            || module.clone(),
            |mut m| black_box(publicize(&mut m)),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_roundtrip, bench_publicize);
criterion_main!(benches);
