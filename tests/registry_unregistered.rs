//! Runs in its own process: nothing here may register a provider.
use objsize::{
    heap::{Component, FieldDecl, Heap, PrimitiveType, Value},
    provider::registry,
};

#[test]
fn unregistered_sizes_are_zero() {
    let mut heap = Heap::new();
    let node = heap
        .declare_class(
            "Node",
            None,
            vec![
                FieldDecl::reference("next"),
                FieldDecl::primitive("value", PrimitiveType::Long),
            ],
        )
        .unwrap();
    let a = heap.alloc_instance(node).unwrap();
    let b = heap.alloc_instance(node).unwrap();
    let bytes = heap
        .alloc_array_with_len(Component::Primitive(PrimitiveType::Byte), 1024)
        .unwrap();
    let arr = heap
        .alloc_array(Component::Object(node), vec![Value::Ref(b), Value::Null])
        .unwrap();
    heap.set(a, "next", arr).unwrap();
    heap.set(b, "next", a).unwrap();

    assert!(!registry::is_registered());
    assert!(registry::installed().is_none());
    assert_eq!(registry::shallow_size(&heap, a), 0);
    assert_eq!(registry::shallow_size(&heap, bytes), 0);
    assert_eq!(registry::deep_size(&heap, Some(a)), 0);
    assert_eq!(registry::deep_size(&heap, None), 0);

    let report = registry::deep_size_report(&heap, Some(a));
    assert_eq!(report.total_bytes, 0);
    assert_eq!(report.stats.objects, 3);
}
