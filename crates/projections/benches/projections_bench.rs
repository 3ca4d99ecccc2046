use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Contact, Event};
use projections::{AttendeeSummary, AttendeeViewBuilder, format_attendee_line};
use registration_store::{InMemoryRegistrationStore, RegistrationStore};

fn bench_format_line(c: &mut Criterion) {
    c.bench_function("projections/format_attendee_line", |b| {
        b.iter(|| format_attendee_line("Ann Example", 4));
    });
}

fn bench_summarize(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryRegistrationStore::new();

    let event_id = rt.block_on(async {
        let event = store.insert_event(Event::new("Bench", None)).await.unwrap();
        for i in 0..10 {
            store
                .apply_create(event.id, 1, Contact::named(format!("Guest {i}")))
                .await
                .unwrap();
        }
        event.id
    });
    let views = AttendeeViewBuilder::new(store);

    c.bench_function("projections/summarize_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let summary = views.summarize(event_id, 10).await.unwrap();
                assert!(matches!(summary, AttendeeSummary::Listed { .. }));
            });
        });
    });
}

criterion_group!(benches, bench_format_line, bench_summarize);
criterion_main!(benches);
