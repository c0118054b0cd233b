use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use objsize::{
    deep_size, deep_size_each,
    heap::{Component, FieldDecl, Heap, ObjectHandle, PrimitiveType, TypeId, Value},
    provider::LayoutSizer,
};

fn node_type(heap: &mut Heap) -> TypeId {
    heap.declare_class(
        "Node",
        None,
        vec![
            FieldDecl::reference("next"),
            FieldDecl::reference("other").private(),
            FieldDecl::primitive("value", PrimitiveType::Long),
        ],
    )
    .unwrap()
}

fn linked_list(len: usize) -> (Heap, ObjectHandle) {
    let mut heap = Heap::new();
    let node = node_type(&mut heap);
    let mut head = heap.alloc_instance(node).unwrap();
    for _ in 1..len {
        let next = heap.alloc_instance(node).unwrap();
        heap.set(next, "next", head).unwrap();
        head = next;
    }
    (heap, head)
}

fn wide_array(len: usize) -> (Heap, ObjectHandle) {
    let mut heap = Heap::new();
    let node = node_type(&mut heap);
    let elements = (0..len)
        .map(|_| heap.alloc_instance(node).map(Value::Ref))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let root = heap.alloc_array(Component::Object(node), elements).unwrap();
    (heap, root)
}

/// Every node links to its successor and to a node far behind it.
fn cyclic_graph(len: usize) -> (Heap, ObjectHandle) {
    let mut heap = Heap::new();
    let node = node_type(&mut heap);
    let nodes: Vec<ObjectHandle> = (0..len)
        .map(|_| heap.alloc_instance(node).unwrap())
        .collect();
    for (i, &n) in nodes.iter().enumerate() {
        heap.set(n, "next", nodes[(i + 1) % len]).unwrap();
        heap.set(n, "other", nodes[(i * 7 + 3) % len]).unwrap();
    }
    (heap, nodes[0])
}

fn bench_shapes(c: &mut Criterion) {
    let sizer = LayoutSizer::default();
    let mut group = c.benchmark_group("deep_size");

    for &len in &[1_000usize, 100_000] {
        group.throughput(Throughput::Elements(len as u64));

        let (heap, root) = linked_list(len);
        group.bench_with_input(BenchmarkId::new("linked_list", len), &root, |b, &root| {
            b.iter(|| deep_size(black_box(&heap), Some(root), Some(&sizer)))
        });

        let (heap, root) = wide_array(len);
        group.bench_with_input(BenchmarkId::new("wide_array", len), &root, |b, &root| {
            b.iter(|| deep_size(black_box(&heap), Some(root), Some(&sizer)))
        });

        let (heap, root) = cyclic_graph(len);
        group.bench_with_input(BenchmarkId::new("cyclic_graph", len), &root, |b, &root| {
            b.iter(|| deep_size(black_box(&heap), Some(root), Some(&sizer)))
        });
    }

    group.finish();
}

fn bench_many_roots(c: &mut Criterion) {
    let sizer = LayoutSizer::default();
    let (heap, _) = cyclic_graph(10_000);
    let roots: Vec<Option<ObjectHandle>> = heap.handles().take(64).map(Some).collect();

    c.bench_function("deep_size_each/64_roots", |b| {
        b.iter(|| deep_size_each(black_box(&heap), &roots, Some(&sizer)))
    });
}

criterion_group!(benches, bench_shapes, bench_many_roots);
criterion_main!(benches);
