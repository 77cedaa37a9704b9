//! Bulk drain with the final-flush convention.
//!
//! The consumer reads `done` before each drain and stops only after a drain
//! that started once `done` was set, so the producer's last batch is never
//! left behind.

use spinring::ConcurrentQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const ITEMS: u64 = 1_000_000;

fn main() {
    spinring::trace::init_tracing();

    let queue = Arc::new(ConcurrentQueue::<u64>::with_capacity(10_000).expect("non-zero capacity"));
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let queue = queue.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut faults = 0u64;
            for i in 0..ITEMS {
                let mut item = i;
                while let Err(e) = queue.try_enqueue(item) {
                    item = e.into_inner();
                    faults += 1;
                    std::hint::spin_loop();
                }
            }
            done.store(true, Ordering::Release);
            faults
        })
    };

    // Lazy drains by hand
    let mut received = Vec::with_capacity(ITEMS as usize);
    let mut pieces = 0u64;
    loop {
        let finished = done.load(Ordering::Acquire);
        if let Ok(drain) = queue.try_dequeue_all() {
            received.extend(drain);
            pieces += 1;
        }
        if finished {
            break;
        }
    }
    let faults = producer.join().unwrap();

    let in_order = received.iter().copied().eq(0..ITEMS);
    println!("Received {} items in {} drains ({} full retries)", received.len(), pieces, faults);
    println!("Read/write equal: {}", in_order);
    assert!(in_order);
}
