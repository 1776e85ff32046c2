#![allow(dead_code)]

use concord::{ConfigurationRegistry, Container, Inject, TypeInfo, TypeUniverse};
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

struct A(Arc<B>, Arc<C>);
struct B(u16);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA;

#[inline]
fn universe() -> TypeUniverse {
    TypeUniverse::new()
        .register::<CAAA>(|d| d.constructor(&[], || Ok(CAAA)))
        .register::<CAA>(|d| d.constructor(&["caaa"], |Inject(caaa): Inject<CAAA>| Ok(CAA(caaa))))
        .register::<CA>(|d| d.constructor(&["caa"], |Inject(caa): Inject<CAA>| Ok(CA(caa))))
        .register::<C>(|d| d.constructor(&["ca"], |Inject(ca): Inject<CA>| Ok(C(ca))))
        .register::<B>(|d| d.constructor(&["port"], |Inject(port): Inject<u16>| Ok(B(*port))))
        .register::<A>(|d| d.constructor(&["b", "c"], |Inject(b): Inject<B>, Inject(c): Inject<C>| Ok(A(b, c))))
}

#[inline]
fn container_new() -> Container {
    let universe = universe();
    let registry = ConfigurationRegistry::builder()
        .configure::<B>(|c| c.dependency("port", 2_u16))
        .contract(["replica"], |c| c.configure::<B>(|c| c.dependency("port", 3_u8)))
        .contracts_union("all", ["replica", "archive"])
        .build(&universe);
    Container::new(universe, registry)
}

#[inline]
fn container_get(container: &Container) {
    let _ = container.get::<A>().unwrap();
}

#[inline]
fn container_get_union(container: &Container) {
    let _ = container.resolve(TypeInfo::of::<B>(), &["all"]).all::<B>().unwrap();
}

#[inline]
fn container_local(container: &Container) {
    let local = container.create_local_container("request", |c| c).unwrap();
    let _ = local.get::<A>().unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    let container = container_new();

    c.bench_function("container_new", |b| b.iter(container_new))
        .bench_function("container_get", |b| b.iter(|| container_get(&container_new())))
        .bench_function("container_get_with_cache", |b| b.iter(|| container_get(&container)))
        .bench_function("container_get_union", |b| b.iter(|| container_get_union(&container_new())))
        .bench_function("container_local", |b| b.iter(|| container_local(&container)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
