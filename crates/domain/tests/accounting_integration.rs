//! Integration tests for the capacity accountant.
//!
//! These drive the accountant the way a store does: keep a ledger of
//! admitted parties, apply each decision, and check the cached count
//! against the ledger after every step.

use domain::{
    Decision, PartySize, Rejection, apply_cancellation, cancellation_delta, evaluate,
};

/// Minimal single-threaded ledger mirroring how a store applies decisions.
#[derive(Default)]
struct Ledger {
    capacity: Option<u32>,
    count: u32,
    parties: Vec<PartySize>,
}

impl Ledger {
    fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    fn register(&mut self, requested: i64) -> Decision {
        let decision = evaluate(self.count, self.capacity, requested);
        if let Decision::Admit { new_count } = decision {
            self.count = new_count;
            self.parties.push(PartySize::try_from(requested).unwrap());
        }
        decision
    }

    fn cancel(&mut self, index: usize) -> bool {
        if index >= self.parties.len() {
            return false;
        }
        let removed = self.parties.remove(index);
        self.count = apply_cancellation(self.count, cancellation_delta(removed));
        true
    }

    fn sum(&self) -> u32 {
        self.parties.iter().map(PartySize::get).sum()
    }
}

#[test]
fn worked_example_from_eight_of_ten() {
    let mut ledger = Ledger::with_capacity(10);
    assert!(ledger.register(5).is_admit());
    assert!(ledger.register(3).is_admit());
    assert_eq!(ledger.count, 8);

    assert_eq!(
        ledger.register(3),
        Decision::Reject(Rejection::CapacityExceeded { remaining: 2 })
    );
    assert_eq!(ledger.count, 8);

    assert_eq!(ledger.register(2), Decision::Admit { new_count: 10 });

    assert_eq!(
        ledger.register(1),
        Decision::Reject(Rejection::CapacityExceeded { remaining: 0 })
    );
    assert_eq!(ledger.count, 10);
}

#[test]
fn cancelling_a_party_of_three_at_ten_leaves_seven() {
    let mut ledger = Ledger::with_capacity(10);
    ledger.register(3);
    ledger.register(7);
    assert_eq!(ledger.count, 10);

    assert!(ledger.cancel(0));
    assert_eq!(ledger.count, 7);
    assert_eq!(ledger.sum(), 7);
}

#[test]
fn long_mixed_sequence_keeps_count_equal_to_sum() {
    let mut ledger = Ledger::with_capacity(25);
    // Deterministic linear congruential sequence, no external RNG needed.
    let mut seed: u64 = 0x2545_f491;
    for step in 0..2_000 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let roll = (seed >> 33) as i64;

        if step % 3 == 2 && !ledger.parties.is_empty() {
            let index = (roll as usize) % ledger.parties.len();
            ledger.cancel(index);
        } else {
            // Includes zero and negative sizes, which must never change state.
            ledger.register(roll % 7 - 1);
        }

        assert_eq!(ledger.count, ledger.sum(), "drift at step {step}");
        assert!(ledger.count <= 25, "overshoot at step {step}");
    }
}

#[test]
fn unlimited_event_accepts_any_valid_party() {
    let mut ledger = Ledger::default();
    for size in 1..=50 {
        assert!(ledger.register(size).is_admit());
    }
    assert_eq!(ledger.count, (1..=50).sum::<u32>());
}
