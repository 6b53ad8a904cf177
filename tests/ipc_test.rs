/*!
 * IPC Tests
 * Mailbox ordering, blocking receive and the ping scenario
 */

use green_kernel::{
    receive, receive_message, self_id, send, try_receive, without_preemption, yield_now, Pid,
    ProcessState, Runtime, RuntimeConfig,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::cell::{Cell, RefCell};
use std::hint::black_box;
use std::rc::Rc;

fn runtime(seed: u64) -> Runtime {
    Runtime::with_seed(RuntimeConfig::default(), seed).unwrap()
}

/// Append under masked preemption so the allocation is never interrupted
fn record<T>(log: &RefCell<Vec<T>>, value: T) {
    let _ = without_preemption(|| log.borrow_mut().push(value));
}

#[test]
#[serial]
fn test_messages_are_received_in_send_order() {
    let mut runtime = runtime(1);
    let received = Rc::new(RefCell::new(Vec::new()));

    let log = received.clone();
    let pid = runtime
        .spawn(move || {
            for _ in 0..3 {
                let payload = receive().unwrap();
                record(&log, payload);
            }
        })
        .unwrap();

    runtime.send(pid, b"one").unwrap();
    runtime.send(pid, b"two").unwrap();
    runtime.send(pid, b"three").unwrap();
    let stats = runtime.boot().unwrap();

    assert_eq!(
        *received.borrow(),
        vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
    );
    assert_eq!(stats.messages_sent, 3);
    assert_eq!(stats.messages_received, 3);
}

#[test]
#[serial]
fn test_message_carries_sender_and_sequence() {
    let mut runtime = runtime(2);
    let received = Rc::new(RefCell::new(Vec::new()));

    let log = received.clone();
    let receiver = runtime
        .spawn(move || {
            for _ in 0..2 {
                let message = receive_message().unwrap();
                record(&log, (message.from, message.seq));
            }
        })
        .unwrap();
    let sender = runtime
        .spawn(move || {
            send(receiver, b"first").unwrap();
            send(receiver, b"second").unwrap();
        })
        .unwrap();

    runtime.boot().unwrap();

    assert_eq!(
        *received.borrow(),
        vec![(Some(sender), 0), (Some(sender), 1)]
    );
}

#[test]
#[serial]
fn test_send_to_dead_process_is_stored() {
    let mut runtime = runtime(3);
    let target = runtime.spawn_named("short-lived", || {}).unwrap();
    runtime.boot().unwrap();
    assert_eq!(runtime.state(target).unwrap(), ProcessState::Dead);

    let outcome = Rc::new(Cell::new(None));
    let slot = outcome.clone();
    runtime
        .spawn(move || slot.set(Some(send(target, b"too late").is_ok())))
        .unwrap();
    runtime.boot().unwrap();

    assert_eq!(outcome.get(), Some(true));
    let info = &runtime.processes()[target.slot()];
    assert_eq!(info.state, ProcessState::Dead);
    assert_eq!(info.pending_messages, 1);
}

#[test]
#[serial]
fn test_send_to_unknown_pid_fails() {
    let mut runtime = runtime(4);
    let failed = Rc::new(Cell::new(false));

    let flag = failed.clone();
    runtime
        .spawn(move || flag.set(send(Pid(42), b"nobody").is_err()))
        .unwrap();
    runtime.boot().unwrap();

    assert!(failed.get());
}

#[test]
#[serial]
fn test_receive_blocks_until_message_arrives() {
    const ROUNDS: u32 = 20;

    let mut runtime = runtime(5);
    let sender_rounds = Rc::new(Cell::new(0u32));
    let seen_at = Rc::new(Cell::new(None));

    let (rounds, seen) = (sender_rounds.clone(), seen_at.clone());
    let receiver = runtime
        .spawn(move || {
            let payload = receive().unwrap();
            let _ = without_preemption(|| assert_eq!(payload, b"wake"));
            seen.set(Some(rounds.get()));
        })
        .unwrap();

    let rounds = sender_rounds.clone();
    runtime
        .spawn(move || {
            for _ in 0..ROUNDS {
                rounds.set(rounds.get() + 1);
                yield_now().unwrap();
            }
            send(receiver, b"wake").unwrap();
        })
        .unwrap();

    runtime.boot().unwrap();

    assert_eq!(seen_at.get(), Some(ROUNDS));
    assert!(runtime.lookup(receiver).unwrap().dispatches() > 1);
}

#[test]
#[serial]
fn test_try_receive_does_not_block() {
    let mut runtime = runtime(6);
    let results = Rc::new(RefCell::new(Vec::new()));

    let log = results.clone();
    let pid = runtime
        .spawn(move || {
            let first = try_receive().unwrap();
            record(&log, first);
            let second = try_receive().unwrap();
            record(&log, second);
        })
        .unwrap();
    runtime.send(pid, b"queued").unwrap();
    runtime.boot().unwrap();

    assert_eq!(*results.borrow(), vec![Some(b"queued".to_vec()), None]);
}

#[test]
#[serial]
fn test_ping_reaches_receiver_without_stalling_others() {
    let mut runtime = runtime(7);
    let done = Rc::new(Cell::new(false));
    let pings = Rc::new(Cell::new(0u32));
    let idle_spins = Rc::new(Cell::new(0u64));
    let payload = Rc::new(RefCell::new(Vec::new()));

    // Slot 2 is the receiver, spawned last
    let receiver_pid = Pid(2);

    let (stop, count) = (done.clone(), pings.clone());
    let a = runtime
        .spawn_named("a", move || {
            while !stop.get() {
                if send(receiver_pid, b"ping").is_ok() {
                    count.set(count.get() + 1);
                }
                yield_now().unwrap();
            }
        })
        .unwrap();

    let (stop, spins) = (done.clone(), idle_spins.clone());
    let b = runtime
        .spawn_named("b", move || {
            while !stop.get() {
                spins.set(black_box(spins.get() + 1));
            }
        })
        .unwrap();

    let (stop, out) = (done.clone(), payload.clone());
    let c = runtime
        .spawn_named("c", move || {
            let message = receive().unwrap();
            let _ = without_preemption(|| *out.borrow_mut() = message);
            stop.set(true);
        })
        .unwrap();
    assert_eq!(c, receiver_pid);

    runtime.boot().unwrap();

    assert_eq!(*payload.borrow(), b"ping".to_vec());
    assert!(pings.get() >= 1);
    for pid in [a, b, c] {
        assert_eq!(runtime.state(pid).unwrap(), ProcessState::Dead);
        assert!(runtime.lookup(pid).unwrap().dispatches() >= 1);
    }
}

#[test]
fn test_process_calls_fail_outside_runtime() {
    assert!(self_id().is_err());
    assert!(send(Pid(0), b"x").is_err());
    assert!(try_receive().is_err());
}
