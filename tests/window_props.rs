use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use proptest::prelude::*;
use somavar::PositionWindow;

fn geometry() -> impl Strategy<Value = (u32, u32)> {
    (4u32..80).prop_flat_map(|capacity| (Just(capacity), 1..capacity))
}

proptest! {
    #[test]
    fn monotonic_requests_evict_each_position_once_in_order(
        (capacity, buffer) in geometry(),
        start in 1u32..5_000,
        deltas in proptest::collection::vec(0u32..240, 1..200),
    ) {
        let current = Cell::new(0u32);
        let evicted = RefCell::new(Vec::new());
        let mut requested = BTreeSet::new();

        {
            let mut window = PositionWindow::new(capacity, buffer, |position: u32| {
                let now = current.get();
                if now != u32::MAX {
                    assert!(now - position > buffer, "evicted {position} while at {now}");
                }
                evicted.borrow_mut().push(position);
            });

            let mut position = start;
            for delta in deltas {
                // Deltas span up to three times the largest capacity.
                position += delta % (3 * capacity + 1);
                current.set(position);
                let slot = window.get_or_create(position, || position);
                prop_assert_eq!(slot.copied(), Some(position));
                requested.insert(position);

                // Anything still buffered is within one capacity of the head.
                let buffered = requested.iter().filter(|p| !evicted.borrow().contains(p));
                for &p in buffered {
                    prop_assert!(position - p < capacity);
                    prop_assert_eq!(window.get(p), Some(&p));
                }
            }

            current.set(u32::MAX);
            window.evict_all();
        }

        let evicted = evicted.into_inner();
        prop_assert!(evicted.windows(2).all(|w| w[0] < w[1]), "eviction order {:?}", evicted);
        prop_assert_eq!(evicted, requested.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn requests_below_floor_are_rejected_and_never_evicted(
        (capacity, buffer) in geometry(),
        steps in proptest::collection::vec((0u32..120, 0u32..120), 1..200),
    ) {
        let evicted = RefCell::new(Vec::new());
        let mut accepted = BTreeSet::new();
        let mut rejected = 0u64;

        {
            let mut window = PositionWindow::new(capacity, buffer, |position: u32| {
                evicted.borrow_mut().push(position);
            });

            let mut head = 1_000u32;
            for (forward, back) in steps {
                head += forward;
                let position = head - back;
                match window.get_or_create(position, || position) {
                    Some(value) => {
                        prop_assert_eq!(*value, position);
                        accepted.insert(position);
                    }
                    None => rejected += 1,
                }
            }
            prop_assert_eq!(window.stats().dropped_below_floor, rejected);
            window.evict_all();
        }

        let evicted = evicted.into_inner();
        prop_assert!(evicted.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(evicted, accepted.into_iter().collect::<Vec<_>>());
    }
}
