/*!
 * Green Kernel - Demo
 *
 * Three workers count through a shared budget while preempted, a pinger
 * keeps sending to a receiver until it answers, and the runtime returns
 * once every process has finished.
 */

use green_kernel::{
    init_tracing, receive_message, self_id, send, without_preemption, yield_now, KernelResult,
    Pid, Runtime, RuntimeConfig,
};
use std::cell::Cell;
use std::rc::Rc;
use tracing::info;

const WORKER_STEPS: u64 = 2_000_000;
const PING_LIMIT: u32 = 1_000;

fn worker(label: &'static str) {
    let mut total: u64 = 0;
    for step in 0..WORKER_STEPS {
        total = total.wrapping_add(std::hint::black_box(step));
    }
    let _ = without_preemption(|| {
        let pid = self_id().map(|p| p.to_string()).unwrap_or_default();
        info!(worker = label, pid = %pid, total, "Worker finished");
    });
}

fn pinger(target: Pid, answered: Rc<Cell<bool>>) -> impl FnOnce() {
    move || {
        let mut sent = 0;
        while !answered.get() && sent < PING_LIMIT {
            if send(target, b"ping").is_ok() {
                sent += 1;
            }
            let _ = yield_now();
        }
        let _ = without_preemption(|| info!(sent, "Pinger stopping"));
    }
}

fn receiver(answered: Rc<Cell<bool>>) -> impl FnOnce() {
    move || {
        let outcome = receive_message();
        let _ = without_preemption(|| match outcome {
            Ok(message) => info!(
                seq = message.seq,
                from = ?message.from,
                payload = %String::from_utf8_lossy(&message.data),
                "Receiver got message"
            ),
            Err(err) => info!(error = %err, "Receive failed"),
        });
        answered.set(true);
    }
}

fn run() -> KernelResult<()> {
    let config = RuntimeConfig::from_env()?;
    let mut runtime = Runtime::new(config)?;

    for label in ["alpha", "beta", "gamma"] {
        runtime.spawn_named(label, move || worker(label))?;
    }

    let answered = Rc::new(Cell::new(false));
    // Spawned after the pinger, so its PID is known in advance
    let receiver_pid = Pid(runtime.len() as u32 + 1);
    runtime.spawn_named("pinger", pinger(receiver_pid, answered.clone()))?;
    let spawned = runtime.spawn_named("receiver", receiver(answered))?;
    debug_assert_eq!(spawned, receiver_pid);

    let stats = runtime.boot()?;

    for process in runtime.processes() {
        info!(
            pid = %process.pid,
            name = %process.name,
            dispatches = process.dispatches,
            pending = process.pending_messages,
            "Process summary"
        );
    }
    info!(
        stats = %serde_json::to_string(&stats).unwrap_or_default(),
        "Scheduler statistics"
    );
    Ok(())
}

fn main() -> miette::Result<()> {
    init_tracing();

    info!("Green kernel starting...");
    info!("================================================");

    run()?;

    info!("Green kernel shut down");
    Ok(())
}
