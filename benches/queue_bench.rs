use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;
use flume::bounded as flume_bounded;
use spinring::{ConcurrentQueue, ContentionPolicy, RingStore};
use std::sync::mpsc::sync_channel;

const MESSAGES: usize = 200_000;
const BUFFER_SIZE: usize = 1024;

fn spin_send(queue: &ConcurrentQueue<usize>, mut item: usize) {
    while let Err(e) = queue.try_enqueue(item) {
        item = e.into_inner();
        std::hint::spin_loop();
    }
}

fn spin_recv(queue: &ConcurrentQueue<usize>) -> usize {
    loop {
        if let Ok(v) = queue.try_dequeue() {
            return v;
        }
        std::hint::spin_loop();
    }
}

fn run_1p_1c(queue: ConcurrentQueue<usize>) {
    let queue = Arc::new(queue);
    let q_send = queue.clone();
    let q_recv = queue.clone();

    let producer = thread::spawn(move || {
        for i in 0..MESSAGES {
            spin_send(&q_send, black_box(i));
        }
    });

    let consumer = thread::spawn(move || {
        for _ in 0..MESSAGES {
            black_box(spin_recv(&q_recv));
        }
    });

    producer.join().unwrap();
    consumer.join().unwrap();
}

fn bench_1p_1c(c: &mut Criterion) {
    let mut group = c.benchmark_group("1p_1c");
    group.throughput(Throughput::Elements(MESSAGES as u64));

    group.bench_function("spinring_spin", |b| {
        b.iter(|| run_1p_1c(ConcurrentQueue::with_capacity(BUFFER_SIZE).unwrap()));
    });

    group.bench_function("spinring_bounded", |b| {
        b.iter(|| {
            let store = RingStore::new(BUFFER_SIZE).unwrap();
            run_1p_1c(ConcurrentQueue::with_policy(store, ContentionPolicy::bounded()))
        });
    });

    group.bench_function("crossbeam_channel", |b| {
        b.iter(|| {
            let (tx, rx) = bounded::<usize>(BUFFER_SIZE);

            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    tx.send(black_box(i)).unwrap();
                }
            });

            let consumer = thread::spawn(move || {
                for _ in 0..MESSAGES {
                    rx.recv().unwrap();
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.bench_function("flume", |b| {
        b.iter(|| {
            let (tx, rx) = flume_bounded::<usize>(BUFFER_SIZE);

            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    tx.send(black_box(i)).unwrap();
                }
            });

            let consumer = thread::spawn(move || {
                for _ in 0..MESSAGES {
                    rx.recv().unwrap();
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.bench_function("std_mpsc", |b| {
        b.iter(|| {
            let (tx, rx) = sync_channel::<usize>(BUFFER_SIZE);

            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    tx.send(black_box(i)).unwrap();
                }
            });

            let consumer = thread::spawn(move || {
                for _ in 0..MESSAGES {
                    rx.recv().unwrap();
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("1p_drain");
    group.throughput(Throughput::Elements(MESSAGES as u64));

    group.bench_function("drain_into", |b| {
        b.iter(|| {
            let queue = Arc::new(ConcurrentQueue::with_capacity(BUFFER_SIZE).unwrap());
            let done = Arc::new(AtomicBool::new(false));

            let q = queue.clone();
            let d = done.clone();
            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    spin_send(&q, black_box(i));
                }
                d.store(true, Ordering::Release);
            });

            let mut out = Vec::with_capacity(MESSAGES);
            let total = queue.drain_to_completion(&done, &mut out);
            producer.join().unwrap();
            assert_eq!(total, MESSAGES);
        });
    });

    group.bench_function("lazy_drain", |b| {
        b.iter(|| {
            let queue = Arc::new(ConcurrentQueue::with_capacity(BUFFER_SIZE).unwrap());
            let done = Arc::new(AtomicBool::new(false));

            let q = queue.clone();
            let d = done.clone();
            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    spin_send(&q, black_box(i));
                }
                d.store(true, Ordering::Release);
            });

            let mut seen = 0usize;
            loop {
                let finished = done.load(Ordering::Acquire);
                if let Ok(drain) = queue.try_dequeue_all() {
                    seen += drain.map(black_box).count();
                }
                if finished {
                    break;
                }
            }
            producer.join().unwrap();
            assert_eq!(seen, MESSAGES);
        });
    });

    group.finish();
}

fn bench_np_mc(c: &mut Criterion) {
    let mut group = c.benchmark_group("4p_4c");
    group.throughput(Throughput::Elements(MESSAGES as u64));
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const MSGS_PER_PRODUCER: usize = MESSAGES / PRODUCERS;
    const MSGS_PER_CONSUMER: usize = MESSAGES / CONSUMERS;

    group.bench_function("spinring_spin", |b| {
        b.iter(|| {
            let queue = Arc::new(ConcurrentQueue::with_capacity(BUFFER_SIZE).unwrap());
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let q = queue.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        spin_send(&q, black_box(p * MSGS_PER_PRODUCER + i));
                    }
                }));
            }

            for _ in 0..CONSUMERS {
                let q = queue.clone();
                handles.push(thread::spawn(move || {
                    for _ in 0..MSGS_PER_CONSUMER {
                        black_box(spin_recv(&q));
                    }
                }));
            }

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.bench_function("crossbeam_channel", |b| {
        b.iter(|| {
            let (tx, rx) = bounded::<usize>(BUFFER_SIZE);
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let tx = tx.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        tx.send(black_box(p * MSGS_PER_PRODUCER + i)).unwrap();
                    }
                }));
            }
            drop(tx);

            for _ in 0..CONSUMERS {
                let rx = rx.clone();
                handles.push(thread::spawn(move || {
                    for _ in 0..MSGS_PER_CONSUMER {
                        rx.recv().unwrap();
                    }
                }));
            }

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.bench_function("flume", |b| {
        b.iter(|| {
            let (tx, rx) = flume_bounded::<usize>(BUFFER_SIZE);
            let mut handles = vec![];

            for p in 0..PRODUCERS {
                let tx = tx.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..MSGS_PER_PRODUCER {
                        tx.send(black_box(p * MSGS_PER_PRODUCER + i)).unwrap();
                    }
                }));
            }
            drop(tx);

            for _ in 0..CONSUMERS {
                let rx = rx.clone();
                handles.push(thread::spawn(move || {
                    for _ in 0..MSGS_PER_CONSUMER {
                        rx.recv().unwrap();
                    }
                }));
            }

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_1p_1c, bench_drain, bench_np_mc);
criterion_main!(benches);
