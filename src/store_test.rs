use frames::Pixel;

use super::*;

fn px(x: f64, color: &str) -> Pixel {
    Pixel::new(x, 0.0, color)
}

#[test]
fn new_store_is_empty() {
    let store = PixelStore::new();
    assert!(store.is_empty());
    assert!(store.snapshot().is_empty());
}

#[test]
fn append_returns_only_the_new_pixels() {
    let mut store = PixelStore::new();
    store.append(vec![px(1.0, "red")]).expect("append");

    let appended = store
        .append(vec![px(2.0, "green"), px(3.0, "blue")])
        .expect("append")
        .to_vec();

    assert_eq!(appended, vec![px(2.0, "green"), px(3.0, "blue")]);
    assert_eq!(store.len(), 3);
}

#[test]
fn snapshot_is_concatenation_in_accept_order() {
    let batches = vec![
        vec![px(1.0, "a"), px(2.0, "b")],
        vec![px(3.0, "c")],
        vec![px(1.0, "a"), px(4.0, "d"), px(5.0, "e")],
    ];

    let mut store = PixelStore::new();
    for batch in &batches {
        store.append(batch.clone()).expect("append");
    }

    let expected: Vec<Pixel> = batches.into_iter().flatten().collect();
    assert_eq!(store.snapshot(), expected);
}

#[test]
fn duplicate_coordinates_coexist() {
    let mut store = PixelStore::new();
    store.append(vec![px(1.0, "red"), px(1.0, "blue")]).expect("append");
    assert_eq!(store.len(), 2);
    assert_eq!(store.as_slice()[1].color, "blue");
}

#[test]
fn clear_always_empties() {
    let mut store = PixelStore::new();
    assert_eq!(store.clear(), 0);

    store.append(vec![px(1.0, "red"), px(2.0, "red")]).expect("append");
    assert_eq!(store.clear(), 2);
    assert!(store.snapshot().is_empty());
    assert_eq!(store.clear(), 0);
}

#[test]
fn snapshot_is_detached_from_later_appends() {
    let mut store = PixelStore::new();
    store.append(vec![px(1.0, "red")]).expect("append");
    let snapshot = store.snapshot();
    store.append(vec![px(2.0, "red")]).expect("append");
    assert_eq!(snapshot.len(), 1);
}
