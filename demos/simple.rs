//! Simple usage example

use spinring::{ConcurrentQueue, RingStore};
use std::sync::Arc;
use std::thread;

fn main() {
    spinring::trace::init_tracing();
    println!("spinring - Simple Example\n");

    // Build a queue over a copy of a 16-slot store
    let store = RingStore::<String>::new(16).expect("non-zero capacity");
    let queue = Arc::new(ConcurrentQueue::new(&store));

    let producer_queue = queue.clone();
    let consumer_queue = queue.clone();

    let producer = thread::spawn(move || {
        for i in 0..10 {
            let mut message = format!("Message {}", i);
            println!("Sending: {}", message);

            // Queue is full: take the message back and retry
            while let Err(e) = producer_queue.try_enqueue(message) {
                message = e.into_inner();
                std::hint::spin_loop();
            }

            thread::sleep(std::time::Duration::from_millis(100));
        }
        println!("Producer finished!");
    });

    let consumer = thread::spawn(move || {
        for _ in 0..10 {
            loop {
                match consumer_queue.try_dequeue() {
                    Ok(message) => {
                        println!("Received: {}", message);
                        break;
                    }
                    Err(_) => std::hint::spin_loop(),
                }
            }
        }
        println!("Consumer finished!");
    });

    producer.join().unwrap();
    consumer.join().unwrap();

    // The source store was copied, never shared
    assert!(store.is_empty());
    println!("\nExample completed successfully!");
}
