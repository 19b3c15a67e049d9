//! Integration tests for CRDT implementations

#![cfg(all(feature = "gcounter", feature = "aworset"))]

use synapsed_replica::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("synapsed_replica=trace")
        .with_test_writer()
        .try_init();
}

fn replica(id: &str) -> (ReplicaId, AWORSet) {
    (ReplicaId::from(id), AWORSet::init())
}

fn add(elem: impl Into<Value>) -> SetCommand {
    SetCommand::Add(elem.into())
}

fn remove(elem: impl Into<Value>) -> SetCommand {
    SetCommand::Remove(elem.into())
}

#[test]
fn test_gcounter_distributed_counting() {
    init_tracing();
    let r1 = ReplicaId::from("r1");
    let r2 = ReplicaId::from("r2");
    let r3 = ReplicaId::from("r3");

    let c1 = GCounter::init().write(&r1, 10).write(&r1, 2);
    let c2 = GCounter::init().write(&r2, 5).write(&r2, 7);
    let c3 = GCounter::init().write(&r3, 3);

    // Gossip in different orders; every replica converges.
    let c1 = c1.merge(&c2).merge(&c3);
    let c2 = c2.merge(&c3).merge(&c1);
    let c3 = c3.merge(&c1).merge(&c2);

    assert_eq!(c1.read(), Value::Number(27));
    assert_eq!(c1, c2);
    assert_eq!(c2, c3);
}

#[test]
fn test_gcounter_stale_state_does_not_roll_back() {
    let r1 = ReplicaId::from("r1");
    let stale = GCounter::init().write(&r1, 1);
    let fresh = stale.write(&r1, 4);

    // Delayed delivery of an older state is absorbed.
    assert_eq!(fresh.merge(&stale).read(), Value::Number(5));
    assert_eq!(fresh.merge(&stale).merge(&stale), fresh);
}

#[test]
fn test_aworset_empty() {
    let (_, set) = replica("node");
    assert_eq!(set.read(), Value::empty_set());
}

#[test]
fn test_aworset_add() {
    let (id, set) = replica("node");
    let set = set.write(&id, add(0));
    assert_eq!(set.read(), Value::set([0]));
}

#[test]
fn test_aworset_add_remove() {
    let (id, set) = replica("node");
    let set = set.write(&id, add(0)).write(&id, remove(0));
    assert_eq!(set.read(), Value::empty_set());
}

#[test]
fn test_aworset_multiple_adds() {
    let (id, set) = replica("node");
    let set = set
        .write(&id, add(0))
        .write(&id, add("val2"))
        .write(&id, add(false));
    assert_eq!(
        set.read(),
        Value::set([Value::from(0), Value::from("val2"), Value::from(false)])
    );
}

#[test]
fn test_aworset_multiple_add_removes() {
    let (id, set) = replica("node");
    let set = set
        .write(&id, add(0))
        .write(&id, add("val2"))
        .write(&id, add(false))
        .write(&id, remove(0));
    assert_eq!(
        set.read(),
        Value::set([Value::from("val2"), Value::from(false)])
    );
}

#[test]
fn test_aworset_merge_adds() {
    let (id1, set1) = replica("node1");
    let (id2, set2) = replica("node2");

    let set1 = set1.write(&id1, add(0));
    let set2 = set2.write(&id2, add(1));

    assert_eq!(set1.merge(&set2).read(), Value::set([0, 1]));
}

#[test]
fn test_aworset_remove_my_add() {
    let (id1, set1) = replica("node1");
    let (id2, set2) = replica("node2");

    let set1 = set1.write(&id1, add(0)).write(&id1, remove(0));
    let set2 = set2.write(&id2, add(1)).write(&id2, remove(1));

    assert_eq!(set1.merge(&set2).read(), Value::empty_set());
}

#[test]
fn test_aworset_remove_their_add() {
    init_tracing();
    let (id1, set1) = replica("node1");
    let (id2, set2) = replica("node2");

    let set1 = set1.write(&id1, add(0));
    let set2 = set2.write(&id2, add(1));

    let mset1 = set1.merge(&set2);
    let mset2 = set2.merge(&set1);

    let mset1 = mset1.write(&id1, remove(1));
    let mset2 = mset2.write(&id2, remove(0));

    assert_eq!(mset1.merge(&mset2).read(), Value::empty_set());
}

#[test]
fn test_aworset_add_wins() {
    init_tracing();
    let (id1, set1) = replica("node1");
    let (id2, set2) = replica("node2");

    let set1 = set1.write(&id1, add("val"));
    let set2 = set2.merge(&set1);

    // node1 removes the witness it knows; node2 concurrently re-adds.
    let set1 = set1.write(&id1, remove("val"));
    let set2 = set2.write(&id2, add("val"));

    let merged = set1.merge(&set2);
    assert_eq!(merged.read(), Value::set(["val"]));
    assert_eq!(set2.merge(&set1).read(), merged.read());

    // Only node1's original witness is tombstoned.
    assert!(merged.is_tombstoned(&Witness::new(id1, 1)));
    assert!(!merged.is_tombstoned(&Witness::new(id2, 1)));
}

#[test]
fn test_aworset_remove_after_observing_concurrent_add() {
    let (id1, set1) = replica("node1");
    let (id2, set2) = replica("node2");

    let set1 = set1.write(&id1, add("val"));
    let set2 = set2.write(&id2, add("val"));

    // Once node1 has seen node2's add, its remove covers both witnesses.
    let set1 = set1.merge(&set2).write(&id1, remove("val"));
    assert_eq!(set1.merge(&set2).read(), Value::empty_set());
}

#[test]
fn test_tombstones_survive_duplicate_and_reordered_delivery() {
    let (id1, set1) = replica("node1");
    let (_, set2) = replica("node2");

    let added = set1.write(&id1, add("x"));
    let removed = added.write(&id1, remove("x"));

    // Receiver gets the newer state first, then the stale one twice.
    let receiver = set2.merge(&removed).merge(&added).merge(&added);
    assert_eq!(receiver.read(), Value::empty_set());
    assert_eq!(receiver, removed);
}

#[test]
fn test_codec_round_trip_then_continue() {
    let (id1, set1) = replica("node1");
    let (id2, set2) = replica("node2");

    let set1 = set1.write(&id1, add("a")).write(&id1, add("b")).write(&id1, remove("a"));
    let set2 = set2.write(&id2, add("c"));

    for config in [CodecConfig::default(), CodecConfig::json()] {
        let decoded = AWORSet::decode(&set1.encode_with(&config).unwrap()).unwrap();
        assert_eq!(decoded.read(), set1.read());
        assert_eq!(decoded.merge(&set2).read(), set1.merge(&set2).read());
        assert_eq!(
            decoded.write(&id1, add("d")).read(),
            set1.write(&id1, add("d")).read()
        );
    }
}

#[test]
fn test_decode_rejects_wrong_kind() {
    let counter = GCounter::init().write(&ReplicaId::from("r1"), 3);
    let err = AWORSet::decode(&counter.encode().unwrap()).unwrap_err();
    assert!(matches!(err, CrdtError::KindMismatch { .. }));
}

#[test]
fn test_resource_replication_loop() {
    // Two replicas exchanging encoded resources the way anti-entropy does.
    let a: Replica<AWORSet> = Replica::new(ReplicaId::from("a"));
    let b: Replica<AWORSet> = Replica::new(ReplicaId::from("b"));

    a.write(add("x"));
    b.write(add("y"));
    b.write_value(&SetCommand::Add(Value::from("z")).to_value());

    a.merge_encoded(&b.checkpoint().unwrap()).unwrap();
    b.merge_encoded(&a.checkpoint().unwrap()).unwrap();

    a.write(remove("y"));
    b.merge_encoded(&a.checkpoint().unwrap()).unwrap();

    assert_eq!(a.read(), b.read());
    assert_eq!(a.read(), Value::set(["x", "z"]));
}
