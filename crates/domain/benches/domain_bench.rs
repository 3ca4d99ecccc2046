use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domain::{Contact, PartySize, apply_cancellation, cancellation_delta, evaluate};

fn bench_evaluate_admit(c: &mut Criterion) {
    c.bench_function("capacity/evaluate_admit", |b| {
        b.iter(|| evaluate(black_box(40), black_box(Some(100)), black_box(3)));
    });
}

fn bench_evaluate_reject(c: &mut Criterion) {
    c.bench_function("capacity/evaluate_reject", |b| {
        b.iter(|| evaluate(black_box(99), black_box(Some(100)), black_box(3)));
    });
}

fn bench_cancellation(c: &mut Criterion) {
    let size = PartySize::try_from(3).unwrap();

    c.bench_function("capacity/apply_cancellation", |b| {
        b.iter(|| apply_cancellation(black_box(10), cancellation_delta(black_box(size))));
    });
}

fn bench_validate_contact(c: &mut Criterion) {
    let contact = Contact::named("Ann Example")
        .with_email("ann@example.org")
        .with_language("fi");

    c.bench_function("validation/contact", |b| {
        b.iter(|| black_box(&contact).validate());
    });
}

criterion_group!(
    benches,
    bench_evaluate_admit,
    bench_evaluate_reject,
    bench_cancellation,
    bench_validate_contact
);
criterion_main!(benches);
