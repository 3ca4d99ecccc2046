//! Concurrency tests for the in-memory registration store.
//!
//! These run many creates and cancels in parallel on a multi-thread runtime
//! and check the accounting invariant once the dust settles.

use std::collections::HashSet;

use domain::{Contact, Event, Rejection};
use futures_util::future::join_all;
use registration_store::{
    AdmissionOutcome, CancellationOutcome, EventId, InMemoryRegistrationStore, RegistrationStore,
    RegistrationStoreExt,
};

async fn provision(store: &InMemoryRegistrationStore, capacity: Option<u32>) -> EventId {
    store
        .insert_event(Event::new("Concurrent event", capacity))
        .await
        .unwrap()
        .id
}

async fn assert_invariant(store: &InMemoryRegistrationStore, event_id: EventId) {
    let snapshot = store.snapshot(event_id).await.unwrap().unwrap();
    assert_eq!(
        snapshot.event.current_attendees,
        snapshot.attendee_sum(),
        "cached count drifted from registrations"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_creates_never_overshoot_capacity() {
    let store = InMemoryRegistrationStore::new();
    let event_id = provision(&store, Some(50)).await;

    // 200 parties of 1..=3 request far more than 50 seats.
    let tasks = (0..200i64).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .apply_create(event_id, i % 3 + 1, Contact::named(format!("Guest {i}")))
                .await
                .unwrap()
        })
    });
    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let admitted: u32 = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            AdmissionOutcome::Admitted { registration, .. } => Some(registration.party_size.get()),
            AdmissionOutcome::Rejected(_) => None,
        })
        .sum();

    let event = store.get_event(event_id).await.unwrap().unwrap();
    assert!(event.current_attendees <= 50);
    assert_eq!(event.current_attendees, admitted);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        AdmissionOutcome::Rejected(Rejection::CapacityExceeded { .. })
    )));
    assert_invariant(&store, event_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn every_admission_sees_a_distinct_count() {
    let store = InMemoryRegistrationStore::new();
    let event_id = provision(&store, Some(30)).await;

    let tasks = (0..60).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .apply_create(event_id, 1, Contact::named(format!("Solo {i}")))
                .await
                .unwrap()
        })
    });
    let counts: Vec<u32> = join_all(tasks)
        .await
        .into_iter()
        .filter_map(|joined| match joined.unwrap() {
            AdmissionOutcome::Admitted { event, .. } => Some(event.current_attendees),
            AdmissionOutcome::Rejected(_) => None,
        })
        .collect();

    // Linearizable admissions hand out counts 1..=30 exactly once each.
    let distinct: HashSet<u32> = counts.iter().copied().collect();
    assert_eq!(counts.len(), 30);
    assert_eq!(distinct, (1..=30).collect());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn interleaved_creates_and_cancels_preserve_invariant() {
    let store = InMemoryRegistrationStore::new();
    let event_id = provision(&store, Some(40)).await;

    // Seed registrations to cancel while new ones arrive.
    let mut seeded = Vec::new();
    for i in 0..20i64 {
        if let AdmissionOutcome::Admitted { registration, .. } = store
            .apply_create(event_id, i % 2 + 1, Contact::named(format!("Seed {i}")))
            .await
            .unwrap()
        {
            seeded.push(registration.id);
        }
    }

    let cancels = seeded.iter().copied().map(|registration_id| {
        let store = store.clone();
        tokio::spawn(async move {
            store.apply_cancel(registration_id).await.unwrap();
        })
    });
    let creates = (0..60i64).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .apply_create(event_id, i % 4 + 1, Contact::named(format!("New {i}")))
                .await
                .unwrap();
        })
    });

    let (cancelled, created) = tokio::join!(join_all(cancels), join_all(creates));
    cancelled.into_iter().for_each(Result::unwrap);
    created.into_iter().for_each(Result::unwrap);

    let event = store.get_event(event_id).await.unwrap().unwrap();
    assert!(event.current_attendees <= 40);
    for registration_id in seeded {
        assert!(!store.registration_exists(registration_id).await.unwrap());
    }
    assert_invariant(&store, event_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_cancels_of_one_registration_decrement_once() {
    let store = InMemoryRegistrationStore::new();
    let event_id = provision(&store, Some(10)).await;

    store
        .apply_create(event_id, 7, Contact::named("Stays"))
        .await
        .unwrap();
    let AdmissionOutcome::Admitted { registration, .. } = store
        .apply_create(event_id, 3, Contact::named("Leaves"))
        .await
        .unwrap()
    else {
        panic!("expected admission");
    };

    let tasks = (0..16).map(|_| {
        let store = store.clone();
        let registration_id = registration.id;
        tokio::spawn(async move { store.apply_cancel(registration_id).await.unwrap() })
    });
    let outcomes: Vec<CancellationOutcome> = join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let successes = outcomes.iter().filter(|o| o.is_cancelled()).count();
    assert_eq!(successes, 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == CancellationOutcome::NotFound)
            .count(),
        15
    );

    let event = store.get_event(event_id).await.unwrap().unwrap();
    assert_eq!(event.current_attendees, 7);
    assert_invariant(&store, event_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_event_does_not_block_other_events() {
    let store = InMemoryRegistrationStore::new();
    let full = provision(&store, Some(1)).await;
    let open = provision(&store, None).await;

    store
        .apply_create(full, 1, Contact::named("Only seat"))
        .await
        .unwrap();

    let tasks = (0..20).map(|i| {
        let store = store.clone();
        let event_id = if i % 2 == 0 { full } else { open };
        tokio::spawn(async move {
            store
                .apply_create(event_id, 1, Contact::named(format!("Guest {i}")))
                .await
                .unwrap()
        })
    });
    join_all(tasks).await.into_iter().for_each(|r| {
        r.unwrap();
    });

    assert_eq!(store.attendee_sum(full).await.unwrap(), Some(1));
    assert_eq!(store.attendee_sum(open).await.unwrap(), Some(10));
    assert_invariant(&store, full).await;
    assert_invariant(&store, open).await;
}
