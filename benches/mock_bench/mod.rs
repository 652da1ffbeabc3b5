use criterion::Criterion;

pub mod alloc;

pub fn bench(c: &mut Criterion) {
    alloc::bench(c);
}
