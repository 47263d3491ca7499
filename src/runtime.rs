use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::barrier::BarrierOrchestrator;
use crate::command::BarrierCommand;
use crate::gate::{Actuator, ObstructionSensor};
use crate::status::BarrierStatus;

/// 道闸控制循环：取指令 -> 轮询 -> 发布状态，全程不阻塞。
pub struct BarrierRuntime<A, S> {
    orchestrator: BarrierOrchestrator<A, S>,
    command_rx: Receiver<BarrierCommand>,
    status: Arc<Mutex<BarrierStatus>>,
    status_interval_ms: u64,
    last_status_log: Option<u64>,
    senders_gone: bool,
}

impl<A: Actuator, S: ObstructionSensor> BarrierRuntime<A, S> {
    pub fn new(
        orchestrator: BarrierOrchestrator<A, S>,
        command_rx: Receiver<BarrierCommand>,
        status: Arc<Mutex<BarrierStatus>>,
        status_interval_ms: u64,
    ) -> Self {
        Self {
            orchestrator,
            command_rx,
            status,
            status_interval_ms,
            last_status_log: None,
            senders_gone: false,
        }
    }

    pub fn orchestrator(&self) -> &BarrierOrchestrator<A, S> {
        &self.orchestrator
    }

    /// 执行一个周期。
    pub fn tick(&mut self, now: u64) {
        self.drain_commands(now);
        self.orchestrator.poll_all(now);
        self.publish(now);
    }

    fn drain_commands(&mut self, now: u64) {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.orchestrator.apply(command, now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.senders_gone {
                        log::warn!("[Barrier] command channel closed, polling only");
                        self.senders_gone = true;
                    }
                    break;
                }
            }
        }
    }

    fn publish(&mut self, now: u64) {
        let snapshot = self.orchestrator.status(now);
        let due = self
            .last_status_log
            .map_or(true, |last| now.saturating_sub(last) >= self.status_interval_ms);
        if due {
            log::info!("[Barrier] status {}", snapshot.to_json_string());
            self.last_status_log = Some(now);
        }
        if let Ok(mut status) = self.status.lock() {
            *status = snapshot;
        }
    }
}

/// 启动道闸控制线程，按固定周期调用 tick。
pub fn spawn_barrier_loop<A, S>(
    mut runtime: BarrierRuntime<A, S>,
    poll_interval_ms: u64,
) -> thread::JoinHandle<()>
where
    A: Actuator + Send + 'static,
    S: ObstructionSensor + Send + 'static,
{
    thread::spawn(move || {
        let started = Instant::now();
        let interval = Duration::from_millis(poll_interval_ms);
        loop {
            let now = started.elapsed().as_millis() as u64;
            runtime.tick(now);
            thread::sleep(interval);
        }
    })
}
