//! Integration test: deferred deletion, reentrancy and capacity limits.

use vigil_core::{ObjectId, ObjectKind};
use vigil_manager::{CreateParams, ManagerConfig, ManagerError, ObjectManager};
use vigil_registry::{ContainerConfig, ContainerError, ObjectContainer, StrongRef, WeakRef};
use vigil_test_utils::{init_tracing, manager, FixtureObject, RecordingListener};

fn generic(mgr: &mut ObjectManager) -> ObjectId {
    mgr.create_object(CreateParams::new(ObjectKind::Generic), &())
        .unwrap()
        .id()
}

#[test]
fn removed_objects_resolve_until_the_flush() {
    let mut mgr = manager(16, 0);
    let a = generic(&mut mgr);
    let b = generic(&mut mgr);
    let c = generic(&mut mgr);
    assert_eq!((a, b, c), (ObjectId(1), ObjectId(2), ObjectId(3)));
    let weak_b = mgr.container().weak_ref(b);

    mgr.remove_object(b).unwrap();
    assert!(mgr.container().validate(b));
    assert!(weak_b.is_valid(mgr.container()));

    assert_eq!(mgr.release_deregistered_objects().unwrap(), 1);
    assert!(!mgr.container().validate(b));
    assert!(!weak_b.is_valid(mgr.container()));

    // Free-list reuse, with a new generation.
    assert_eq!(generic(&mut mgr), b);
    assert!(!weak_b.is_valid(mgr.container()));
    assert!(mgr.container().weak_ref(b).is_valid(mgr.container()));
}

#[test]
fn listener_chain_is_drained_in_one_flush() {
    let mut mgr = manager(32, 0);
    let ids: Vec<ObjectId> = (0..5).map(|_| generic(&mut mgr)).collect();

    // Removing ids[0] removes ids[1], which removes ids[2], and so on.
    let mut listener = RecordingListener::new();
    for pair in ids.windows(2) {
        listener = listener.chain(pair[0], mgr.container().weak_ref(pair[1]));
    }
    let log = listener.log();
    mgr.register_listener(Box::new(listener));

    mgr.remove_object(ids[0]).unwrap();
    assert_eq!(mgr.release_deregistered_objects().unwrap(), 5);
    assert!(mgr.is_empty());
    let order: Vec<ObjectId> = log.borrow().iter().map(|&(id, _)| id).collect();
    assert_eq!(order, ids);
}

#[test]
fn runaway_chain_is_reported() {
    init_tracing();
    let mut config = ManagerConfig::new(64);
    config.container.max_flush_passes = 3;
    let mut mgr = ObjectManager::new(&config).unwrap();
    let ids: Vec<ObjectId> = (0..6).map(|_| generic(&mut mgr)).collect();

    let mut listener = RecordingListener::new();
    for pair in ids.windows(2) {
        listener = listener.chain(pair[0], mgr.container().weak_ref(pair[1]));
    }
    mgr.register_listener(Box::new(listener));

    mgr.remove_object(ids[0]).unwrap();
    let err = mgr.release_deregistered_objects().unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Container(ContainerError::FlushRunaway {
            passes: 3,
            pending: 1
        })
    ));
    // What was left is still pending and drains on the next flush.
    assert!(mgr.container().is_pending(ids[3]));
    assert_eq!(mgr.release_deregistered_objects().unwrap(), 3);
    assert!(mgr.is_empty());
}

#[test]
fn capacity_ceiling_is_an_error() {
    let mut mgr = manager(4, 0);
    for _ in 0..4 {
        generic(&mut mgr);
    }
    let err = mgr
        .create_object(CreateParams::new(ObjectKind::Generic), &())
        .unwrap_err();
    match err {
        ManagerError::Container(ContainerError::Arena(inner)) => {
            assert!(inner.to_string().contains("capacity exceeded"), "{inner}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(mgr.len(), 4);

    // A reservation counts against the ceiling too.
    mgr.remove_object(ObjectId(4)).unwrap();
    mgr.release_deregistered_objects().unwrap();
    mgr.reserve_id_for_pooled_entity(vigil_core::EntityId(1)).unwrap();
    assert!(mgr
        .create_object(CreateParams::new(ObjectKind::Generic), &())
        .is_err());
}

#[test]
fn container_hands_out_one_owner_per_object() {
    init_tracing();
    let mut container = ObjectContainer::new(&ContainerConfig::new(8)).unwrap();
    let mut target: StrongRef<FixtureObject> =
        container.register(FixtureObject::new("t"), None).unwrap();
    let watcher = container
        .register(FixtureObject::targeting("w", target.weak().untyped()), None)
        .unwrap();

    let fixture: WeakRef<FixtureObject> = watcher.weak();
    container.resolve_mut(&fixture).unwrap().counter += 1;
    assert_eq!(watcher.get(&container).unwrap().counter, 1);

    // Reassigning an owner releases what it held.
    let mut holder = StrongRef::<FixtureObject>::nil();
    holder.assign(watcher);
    container.deregister_object(&mut target).unwrap();
    holder.assign(StrongRef::nil());
    assert_eq!(container.pending_count(), 2);
    assert_eq!(container.release_deregistered_objects(true, &mut ()).unwrap(), 2);
    assert!(container.is_empty());
    assert!(container.resolve(&fixture).is_none());
}
