use crate::command::BarrierCommand;
use crate::gate::{Actuator, GateController, ObstructionSensor};
use crate::model::{GateId, GateTiming};
use crate::status::BarrierStatus;

/// 开闸触发接口（消息总线、刷卡等协作方调用）。
pub trait OpenTrigger {
    fn request_open_entry(&mut self, now: u64);
    fn request_open_exit(&mut self, now: u64);
}

/// 只读状态查询接口（显示、上报等协作方调用）。
pub trait StateQuery {
    fn is_entry_open(&self) -> bool;
    fn is_exit_open(&self) -> bool;
    fn is_entry_obstructed(&self) -> bool;
    fn is_exit_obstructed(&self) -> bool;
}

/// 出入口道闸编排：持有两台互不相关的控制器，转发指令并统一轮询。
pub struct BarrierOrchestrator<A, S> {
    entry: GateController<A, S>,
    exit: GateController<A, S>,
}

impl<A: Actuator, S: ObstructionSensor> BarrierOrchestrator<A, S> {
    pub fn new(entry: (A, S), exit: (A, S), timing: GateTiming) -> Self {
        let (entry_actuator, entry_sensor) = entry;
        let (exit_actuator, exit_sensor) = exit;
        Self {
            entry: GateController::new(GateId::Entry, entry_actuator, entry_sensor, timing),
            exit: GateController::new(GateId::Exit, exit_actuator, exit_sensor, timing),
        }
    }

    pub fn gate(&self, id: GateId) -> &GateController<A, S> {
        match id {
            GateId::Entry => &self.entry,
            GateId::Exit => &self.exit,
        }
    }

    fn gate_mut(&mut self, id: GateId) -> &mut GateController<A, S> {
        match id {
            GateId::Entry => &mut self.entry,
            GateId::Exit => &mut self.exit,
        }
    }

    /// 执行协作方下发的指令。关闸指令属于人工干预，直接关闸。
    pub fn apply(&mut self, command: BarrierCommand, now: u64) {
        match command {
            BarrierCommand::Open(id) => self.gate_mut(id).open(now),
            BarrierCommand::Close(id) => self.gate_mut(id).close(now),
        }
    }

    /// 轮询两台道闸；两者无共享状态，顺序无关。
    pub fn poll_all(&mut self, now: u64) {
        self.entry.poll(now);
        self.exit.poll(now);
    }

    pub fn status(&self, now: u64) -> BarrierStatus {
        BarrierStatus {
            entry: self.entry.status(now),
            exit: self.exit.status(now),
            uptime_ms: now,
        }
    }
}

impl<A: Actuator, S: ObstructionSensor> OpenTrigger for BarrierOrchestrator<A, S> {
    fn request_open_entry(&mut self, now: u64) {
        self.entry.open(now);
    }

    fn request_open_exit(&mut self, now: u64) {
        self.exit.open(now);
    }
}

impl<A: Actuator, S: ObstructionSensor> StateQuery for BarrierOrchestrator<A, S> {
    fn is_entry_open(&self) -> bool {
        self.entry.is_open()
    }

    fn is_exit_open(&self) -> bool {
        self.exit.is_open()
    }

    fn is_entry_obstructed(&self) -> bool {
        self.entry.is_obstructed()
    }

    fn is_exit_obstructed(&self) -> bool {
        self.exit.is_obstructed()
    }
}
