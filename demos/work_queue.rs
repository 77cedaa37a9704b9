use spinring::ConcurrentQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn enqueue(queue: &ConcurrentQueue<String>, mut item: String) {
    while let Err(e) = queue.try_enqueue(item) {
        item = e.into_inner();
        std::hint::spin_loop();
    }
}

fn main() {
    println!("Work Queue Example\n");

    const NUM_WORKERS: usize = 4;
    const NUM_JOBS: usize = 20;

    let jobs = Arc::new(ConcurrentQueue::with_capacity(128).expect("non-zero capacity"));
    let results = Arc::new(ConcurrentQueue::with_capacity(128).expect("non-zero capacity"));
    let jobs_done = Arc::new(AtomicBool::new(false));
    let workers_done = Arc::new(AtomicBool::new(false));

    let jobs_tx = jobs.clone();
    let producer_done = jobs_done.clone();
    let producer = thread::spawn(move || {
        for i in 0..NUM_JOBS {
            let job = format!("Job-{:02}", i);
            println!("Enqueued: {}", job);
            enqueue(&jobs_tx, job);
            thread::sleep(Duration::from_millis(50));
        }
        producer_done.store(true, Ordering::Release);
        println!("All jobs enqueued!");
    });

    let mut workers = vec![];
    for worker_id in 0..NUM_WORKERS {
        let jobs_rx = jobs.clone();
        let results_tx = results.clone();
        let jobs_done = jobs_done.clone();

        workers.push(thread::spawn(move || {
            let mut processed = 0;
            loop {
                let finished = jobs_done.load(Ordering::Acquire);
                match jobs_rx.try_dequeue() {
                    Ok(job) => {
                        println!("Worker {} processing: {}", worker_id, job);
                        thread::sleep(Duration::from_millis(200));
                        enqueue(&results_tx, format!("{} -> completed by worker {}", job, worker_id));
                        processed += 1;
                    }
                    Err(_) if finished => break,
                    Err(_) => thread::sleep(Duration::from_millis(10)),
                }
            }
            println!("Worker {} finished ({} jobs)", worker_id, processed);
        }));
    }

    let results_rx = results.clone();
    let collector_done = workers_done.clone();
    let collector = thread::spawn(move || {
        let mut collected = Vec::new();
        results_rx.drain_to_completion(&collector_done, &mut collected);
        for result in &collected {
            println!("Result: {}", result);
        }
        collected.len()
    });

    producer.join().unwrap();
    for worker in workers {
        worker.join().unwrap();
    }
    workers_done.store(true, Ordering::Release);
    let collected = collector.join().unwrap();

    assert_eq!(collected, NUM_JOBS);
    println!("\nWork queue example completed: {} results", collected);
}
