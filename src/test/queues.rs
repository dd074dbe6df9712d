use crate::dispatch::{Shift, WorkId};
use crate::queue::{QueuedWork, RetrievalQueue};
use crate::sim::SimTime;

fn work(id: u64, size: u64, dispatched_at: u64, retrieved_at: u64) -> QueuedWork {
    QueuedWork {
        id: WorkId(id),
        size,
        dispatched_at: SimTime(dispatched_at),
        retrieved_at: SimTime(retrieved_at),
    }
}

fn ids(q: &RetrievalQueue) -> Vec<u64> {
    q.iter().map(|w| w.id.0).collect()
}

#[test]
fn retrieval_queue_orders_by_retrieve_time_and_reports_pos0() {
    let mut q = RetrievalQueue::new();
    assert_eq!(q.enqueue(work(0, 50, 0, 100)), 0);
    assert_eq!(q.enqueue(work(1, 20, 1, 30)), 50);
    assert_eq!(q.enqueue(work(2, 10, 2, 60)), 70);

    assert_eq!(ids(&q), vec![1, 2, 0]);
    assert_eq!(q.len(), 3);
    assert_eq!(q.units(), 80);
}

#[test]
fn retrieval_queue_keeps_insertion_order_for_equal_times() {
    let mut q = RetrievalQueue::new();
    q.enqueue(work(0, 5, 0, 40));
    q.enqueue(work(1, 5, 0, 40));
    q.enqueue(work(2, 5, 0, 10));
    q.enqueue(work(3, 5, 0, 40));
    assert_eq!(ids(&q), vec![2, 0, 1, 3]);
}

#[test]
fn dequeue_shifts_only_work_dispatched_no_earlier_than_head() {
    let mut q = RetrievalQueue::new();
    // 1 先派发但晚完成；2 晚派发、最先完成
    q.enqueue(work(1, 60, 0, 61));
    q.enqueue(work(2, 10, 1, 12));
    q.enqueue(work(3, 30, 5, 90));

    let r = q.dequeue(SimTime(1)).expect("non-empty");
    assert_eq!(r.head.id, WorkId(2));
    // 1 的派发早于队首，不前移；3 在 max(12, 5 + 1) 时刻前移 10
    assert_eq!(
        r.shifts,
        vec![(
            WorkId(3),
            Shift {
                at: SimTime(12),
                by: 10
            }
        )]
    );
    assert_eq!(q.units(), 90);
}

#[test]
fn dequeue_shift_waits_for_own_dispatch_to_finish() {
    let mut q = RetrievalQueue::new();
    q.enqueue(work(0, 5, 0, 517));
    q.enqueue(work(1, 5, 500, 1017));

    let r = q.dequeue(SimTime(500)).expect("non-empty");
    assert_eq!(r.head.id, WorkId(0));
    assert_eq!(
        r.shifts,
        vec![(
            WorkId(1),
            Shift {
                at: SimTime(1000),
                by: 5
            }
        )]
    );
}

#[test]
fn dequeue_on_empty_queue_returns_none() {
    let mut q = RetrievalQueue::new();
    assert!(q.dequeue(SimTime::ZERO).is_none());
    assert!(q.is_empty());
    assert!(q.front().is_none());
    assert_eq!(q.units(), 0);
}
