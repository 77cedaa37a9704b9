use spinring::{ConcurrentQueue, ContentionPolicy, RingStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const MESSAGES: u64 = 2_000_000;
const BUFFER_SIZES: [usize; 3] = [10_000, 100, 1];
const ROUNDS: usize = 3;

#[derive(Default)]
struct Report {
    elapsed: Duration,
    enqueued: u64,
    dequeued: u64,
    enq_faults: u64,
    pieces: u64,
    repeats: u64,
    gaps: u64,
}

impl Report {
    fn check(&mut self, received: &[u64]) {
        for pair in received.windows(2) {
            if pair[1] == pair[0] {
                self.repeats += 1;
            } else if pair[1] != pair[0] + 1 {
                self.gaps += 1;
            }
        }
        self.dequeued = received.len() as u64;
    }

    fn ok(&self) -> bool {
        self.enqueued == self.dequeued && self.repeats + self.gaps == 0
    }

    fn print(&self, label: &str) {
        let secs = self.elapsed.as_secs_f64();
        println!("  {}:", label);
        println!("    Time: {:?}", self.elapsed);
        println!("    Dequeue throughput: {:.0} msgs/sec", self.dequeued as f64 / secs);
        println!("    Enqueue faults: {}", self.enq_faults);
        if self.pieces > 0 {
            println!("    Drain pieces: {}", self.pieces);
        }
        println!("    Repeats: {}  Gaps: {}", self.repeats, self.gaps);
        println!("    Read/write equal: {}", self.ok());
    }
}

fn produce(queue: &ConcurrentQueue<u64>, done: &AtomicBool) -> u64 {
    let mut faults = 0;
    for i in 0..MESSAGES {
        let mut item = i;
        while let Err(e) = queue.try_enqueue(item) {
            item = e.into_inner();
            faults += 1;
        }
    }
    done.store(true, Ordering::Release);
    faults
}

fn per_item(policy: ContentionPolicy, capacity: usize) -> Report {
    let store = RingStore::new(capacity).expect("non-zero capacity");
    let queue = Arc::new(ConcurrentQueue::with_policy(store, policy));
    let done = Arc::new(AtomicBool::new(false));
    let start = Instant::now();

    let producer = {
        let (queue, done) = (queue.clone(), done.clone());
        thread::spawn(move || produce(&queue, &done))
    };

    let mut received = Vec::with_capacity(MESSAGES as usize);
    while received.len() < MESSAGES as usize {
        if let Ok(v) = queue.try_dequeue() {
            received.push(v);
        }
    }

    let mut report = Report { enq_faults: producer.join().unwrap(), ..Report::default() };
    report.elapsed = start.elapsed();
    report.enqueued = MESSAGES;
    report.check(&received);
    report
}

fn drained(capacity: usize, lazy: bool) -> Report {
    let queue = Arc::new(ConcurrentQueue::with_capacity(capacity).expect("non-zero capacity"));
    let done = Arc::new(AtomicBool::new(false));
    let start = Instant::now();

    let producer = {
        let (queue, done) = (queue.clone(), done.clone());
        thread::spawn(move || produce(&queue, &done))
    };

    let mut received = Vec::with_capacity(MESSAGES as usize);
    let mut pieces = 0;
    loop {
        let finished = done.load(Ordering::Acquire);
        let got = if lazy {
            queue.try_dequeue_all().map(|drain| received.extend(drain)).is_ok()
        } else {
            queue.try_dequeue_all_into(&mut received).is_ok()
        };
        pieces += got as u64;
        if finished {
            break;
        }
    }

    let mut report = Report { enq_faults: producer.join().unwrap(), pieces, ..Report::default() };
    report.elapsed = start.elapsed();
    report.enqueued = MESSAGES;
    report.check(&received);
    report
}

fn main() {
    spinring::trace::init_tracing();
    println!("spinring Performance Test ({} messages, 1 producer, 1 consumer)", MESSAGES);
    println!("==============================\n");

    let mut all_ok = true;
    for round in 0..ROUNDS {
        println!("Round {}", round);
        for capacity in BUFFER_SIZES {
            println!(" Buffer {}:", capacity);
            let reports = [
                ("try_dequeue, spin", per_item(ContentionPolicy::Spin, capacity)),
                ("try_dequeue, bounded", per_item(ContentionPolicy::bounded(), capacity)),
                ("lazy drain", drained(capacity, true)),
                ("drain into", drained(capacity, false)),
            ];
            for (label, report) in &reports {
                report.print(label);
                all_ok &= report.ok();
            }
        }
        println!();
    }

    println!("{}", if all_ok { "ok" } else { "FAILED" });
}
