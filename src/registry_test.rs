use super::*;

#[test]
fn add_and_remove() {
    let mut registry = ConnectionRegistry::new();
    let id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(1);

    assert!(registry.add(id, tx));
    assert!(registry.contains(&id));
    assert_eq!(registry.len(), 1);

    assert!(registry.remove(&id));
    assert!(registry.is_empty());
}

#[test]
fn remove_is_idempotent() {
    let mut registry = ConnectionRegistry::new();
    let id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(1);
    registry.add(id, tx);

    assert!(registry.remove(&id));
    assert!(!registry.remove(&id));
    assert!(!registry.remove(&Uuid::new_v4()));
}

#[test]
fn duplicate_add_keeps_single_entry() {
    let mut registry = ConnectionRegistry::new();
    let id = Uuid::new_v4();
    let (tx_a, _rx_a) = mpsc::channel(1);
    let (tx_b, _rx_b) = mpsc::channel(1);

    assert!(registry.add(id, tx_a.clone()));
    assert!(!registry.add(id, tx_b));
    assert_eq!(registry.len(), 1);

    let (_, kept) = registry.all().next().expect("one entry");
    assert!(kept.same_channel(&tx_a));
}

#[test]
fn removing_drops_sender_and_closes_queue() {
    let mut registry = ConnectionRegistry::new();
    let id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(1);
    registry.add(id, tx);

    registry.remove(&id);
    assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected)));
}

#[test]
fn all_enumerates_every_connection() {
    let mut registry = ConnectionRegistry::new();
    let mut receivers = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = mpsc::channel(1);
        let id = Uuid::new_v4();
        registry.add(id, tx);
        ids.push(id);
        receivers.push(rx);
    }

    let mut listed: Vec<ConnectionId> = registry.all().map(|(id, _)| *id).collect();
    listed.sort();
    ids.sort();
    assert_eq!(listed, ids);
}
