use crate::debounce::ObstructionDebouncer;
use crate::model::{CloseReason, GateId, GateState, GateTiming};
use crate::status::GateStatus;

/// 道闸执行器（舵机）。指令发出即视为生效，没有位置反馈。
pub trait Actuator {
    fn command_open(&mut self);
    fn command_closed(&mut self);
}

/// 闸杆摆动路径上的遮挡传感器，true 表示有遮挡。读取不得阻塞。
pub trait ObstructionSensor {
    fn is_obstructed(&mut self) -> bool;
}

/// 开闸期间的计时状态，仅在 Open 时存在。
#[derive(Clone, Copy, Debug)]
struct OpenWindow {
    // 超时窗口最近一次（重新）起算的时间
    since: u64,
    // 通过确认的截止时间，Some 即“待关闸”
    pending_close_at: Option<u64>,
}

/// 单个道闸的开闸/自动关闸状态机。
///
/// 控制器是执行器唯一的写入方；任何由 `poll` 触发的关闸之前都会
/// 重新采样传感器并确认无遮挡。
pub struct GateController<A, S> {
    id: GateId,
    timing: GateTiming,
    actuator: A,
    sensor: S,
    open: Option<OpenWindow>,
    debounce: ObstructionDebouncer,
}

impl<A: Actuator, S: ObstructionSensor> GateController<A, S> {
    /// 绑定执行器与传感器，并把闸杆落到关闭位置。
    pub fn new(id: GateId, mut actuator: A, sensor: S, timing: GateTiming) -> Self {
        actuator.command_closed();
        Self {
            id,
            timing,
            actuator,
            sensor,
            open: None,
            debounce: ObstructionDebouncer::new(timing.debounce_window_ms),
        }
    }

    pub fn state(&self) -> GateState {
        if self.open.is_some() {
            GateState::Open
        } else {
            GateState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// 最近一次采样（去抖后）的遮挡状态。
    pub fn is_obstructed(&self) -> bool {
        self.debounce.is_obstructed()
    }

    pub fn open_since(&self) -> Option<u64> {
        self.open.map(|window| window.since)
    }

    pub fn pending_close_at(&self) -> Option<u64> {
        self.open.and_then(|window| window.pending_close_at)
    }

    pub fn is_pending_close(&self) -> bool {
        self.pending_close_at().is_some()
    }

    /// 开闸。已开启时不做任何事，也不重置计时。
    pub fn open(&mut self, now: u64) {
        if self.open.is_some() {
            return;
        }
        self.actuator.command_open();
        let obstructed = self.sensor.is_obstructed();
        self.debounce.reset(obstructed, now);
        self.open = Some(OpenWindow {
            since: now,
            pending_close_at: None,
        });
        log::info!("[Barrier] {} opened (obstructed={})", self.id, obstructed);
    }

    /// 关闸（人工/管理指令）。已关闭时不做任何事。
    pub fn close(&mut self, now: u64) {
        if self.open.is_some() && self.debounce.is_obstructed() {
            log::warn!("[Barrier] {} override close while obstructed", self.id);
        }
        self.close_with(now, CloseReason::Override);
    }

    fn close_with(&mut self, now: u64, reason: CloseReason) {
        let Some(window) = self.open.take() else {
            return;
        };
        self.actuator.command_closed();
        log::info!(
            "[Barrier] {} closed ({}, {}ms after last activity)",
            self.id,
            reason.as_str(),
            now.saturating_sub(window.since)
        );
    }

    /// 每个周期调用一次：采样、判定、必要时关闸。关闭状态下为空操作。
    pub fn poll(&mut self, now: u64) {
        let Some(window) = self.open.as_mut() else {
            return;
        };
        let obstructed = self.sensor.is_obstructed();
        // 本周期最后一次采样，供去抖记录
        let mut latest = obstructed;
        let mut close_reason = None;

        if obstructed {
            // 路径上有物体：超时重新起算，取消待关闸
            window.since = now;
            if window.pending_close_at.take().is_some() {
                log::debug!("[Barrier] {} pending close cancelled by obstruction", self.id);
            }
        } else {
            if self.debounce.take_clear_edge(now) {
                let deadline = now.saturating_add(self.timing.close_confirm_delay_ms);
                window.pending_close_at = Some(deadline);
                log::debug!("[Barrier] {} vehicle passed, confirm at {}", self.id, deadline);
            }

            if let Some(deadline) = window.pending_close_at {
                if now >= deadline {
                    window.pending_close_at = None;
                    // 截止时刻重新采样，确认后才关闸
                    latest = self.sensor.is_obstructed();
                    if latest {
                        log::warn!("[Barrier] {} obstructed at confirm, staying open", self.id);
                    } else {
                        close_reason = Some(CloseReason::Passed);
                    }
                }
            } else if now.saturating_sub(window.since) > self.timing.open_timeout_ms {
                latest = self.sensor.is_obstructed();
                if latest {
                    log::warn!("[Barrier] {} timeout but obstacle detected, waiting", self.id);
                    window.since = now;
                } else {
                    close_reason = Some(CloseReason::Timeout);
                }
            }
        }

        self.debounce.update(latest, now);
        if let Some(reason) = close_reason {
            self.close_with(now, reason);
        }
    }

    /// 供显示/上报使用的状态快照。
    pub fn status(&self, now: u64) -> GateStatus {
        GateStatus {
            gate: self.id,
            state: self.state(),
            obstructed: self.is_obstructed(),
            pending_close: self.is_pending_close(),
            open_for_ms: self.open_since().map(|since| now.saturating_sub(since)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{Event, MockActuator, MockSensor, Rig};
    use super::*;

    fn gate(rig: &Rig) -> GateController<MockActuator, MockSensor> {
        let (actuator, sensor) = rig.parts();
        GateController::new(GateId::Entry, actuator, sensor, GateTiming::default())
    }

    /// 按 10ms 间隔从 from 轮询到 to（含）。
    fn run(gate: &mut GateController<MockActuator, MockSensor>, from: u64, to: u64) {
        let mut now = from;
        while now <= to {
            gate.poll(now);
            now += 10;
        }
    }

    #[test]
    fn starts_closed_and_parks_actuator() {
        let rig = Rig::new();
        let gate = gate(&rig);
        assert_eq!(gate.state(), GateState::Closed);
        assert_eq!(gate.open_since(), None);
        assert_eq!(rig.count(Event::Closed), 1);
    }

    #[test]
    fn poll_while_closed_is_noop() {
        let rig = Rig::new();
        let mut gate = gate(&rig);
        gate.poll(100);
        assert_eq!(rig.log.borrow().len(), 1);
    }

    #[test]
    fn open_twice_keeps_timers() {
        let rig = Rig::new();
        let mut gate = gate(&rig);
        gate.open(0);
        let log_len = rig.log.borrow().len();
        gate.open(3000);
        assert_eq!(gate.open_since(), Some(0));
        assert!(!gate.is_pending_close());
        assert_eq!(rig.count(Event::Open), 1);
        assert_eq!(rig.log.borrow().len(), log_len);
    }

    #[test]
    fn close_twice_commands_once() {
        let rig = Rig::new();
        let mut gate = gate(&rig);
        gate.open(0);
        gate.close(100);
        gate.close(200);
        assert_eq!(gate.state(), GateState::Closed);
        // 启动时一次 + 手动关闸一次
        assert_eq!(rig.count(Event::Closed), 2);
    }

    #[test]
    fn timeout_closes_after_open_timeout() {
        let rig = Rig::new();
        let mut gate = gate(&rig);
        gate.open(0);
        run(&mut gate, 0, 5000);
        assert!(gate.is_open());
        gate.poll(5001);
        assert!(!gate.is_open());
        assert!(rig.closes_preceded_by_clear_sample());
    }

    #[test]
    fn holds_open_while_obstructed() {
        let rig = Rig::new();
        rig.set_obstructed(true);
        let mut gate = gate(&rig);
        gate.open(0);
        let mut now = 0;
        while now <= 20_000 {
            gate.poll(now);
            assert!(gate.is_open(), "closed at {}", now);
            now += 50;
        }
        assert_eq!(gate.open_since(), Some(20_000));
        assert!(gate.is_obstructed());
    }

    #[test]
    fn vehicle_pass_closes_after_confirm() {
        let rig = Rig::new();
        rig.set_obstructed(true);
        let mut gate = gate(&rig);
        gate.open(0);
        run(&mut gate, 0, 990);
        rig.set_obstructed(false);
        run(&mut gate, 1000, 1190);
        assert!(!gate.is_pending_close());
        gate.poll(1200);
        assert_eq!(gate.pending_close_at(), Some(1700));
        run(&mut gate, 1210, 1690);
        assert!(gate.is_open());
        gate.poll(1700);
        assert!(!gate.is_open());
        assert!(rig.closes_preceded_by_clear_sample());
    }

    #[test]
    fn reobstruction_before_deadline_prevents_close() {
        let rig = Rig::new();
        rig.set_obstructed(true);
        let mut gate = gate(&rig);
        gate.open(0);
        run(&mut gate, 0, 990);
        rig.set_obstructed(false);
        run(&mut gate, 1000, 1200);
        assert!(gate.is_pending_close());
        rig.set_obstructed(true);
        run(&mut gate, 1210, 1700);
        assert!(gate.is_open());
        assert!(!gate.is_pending_close());
        assert_eq!(gate.open_since(), Some(1700));
    }

    #[test]
    fn confirm_resample_obstructed_aborts_close() {
        let rig = Rig::new();
        rig.set_obstructed(true);
        let mut gate = gate(&rig);
        gate.open(0);
        run(&mut gate, 0, 990);
        rig.set_obstructed(false);
        run(&mut gate, 1000, 1690);
        assert_eq!(gate.pending_close_at(), Some(1700));
        // 首次采样无遮挡，确认采样时有遮挡
        rig.queued.borrow_mut().extend([false, true]);
        gate.poll(1700);
        assert!(gate.is_open());
        assert!(!gate.is_pending_close());
        assert!(gate.is_obstructed());
        assert_eq!(rig.count(Event::Closed), 1);
    }

    #[test]
    fn timeout_resample_obstructed_rearms() {
        let rig = Rig::new();
        let mut gate = gate(&rig);
        gate.open(0);
        rig.queued.borrow_mut().extend([false, true]);
        gate.poll(5001);
        assert!(gate.is_open());
        assert!(gate.is_obstructed());
        assert_eq!(gate.open_since(), Some(5001));
        gate.poll(10_002);
        assert!(!gate.is_open());
        assert!(rig.closes_preceded_by_clear_sample());
    }

    #[test]
    fn flicker_does_not_arm_close() {
        let rig = Rig::new();
        let mut gate = gate(&rig);
        gate.open(0);
        run(&mut gate, 0, 990);
        rig.set_obstructed(true);
        run(&mut gate, 1000, 1100);
        rig.set_obstructed(false);
        let mut now = 1110;
        while now <= 5000 {
            gate.poll(now);
            assert!(!gate.is_pending_close(), "armed at {}", now);
            now += 10;
        }
        // 抖动只会重置超时
        assert_eq!(gate.open_since(), Some(1100));
        gate.poll(6101);
        assert!(!gate.is_open());
    }

    #[test]
    fn bounce_while_leaving_still_counts_as_pass() {
        let rig = Rig::new();
        rig.set_obstructed(true);
        let mut gate = gate(&rig);
        gate.open(0);
        let mut now = 0;
        while now <= 1290 {
            rig.set_obstructed(now < 1000 || (1050..1100).contains(&now));
            gate.poll(now);
            assert!(!gate.is_pending_close(), "armed early at {}", now);
            now += 10;
        }
        gate.poll(1300);
        assert_eq!(gate.pending_close_at(), Some(1800));
        run(&mut gate, 1310, 1790);
        assert!(gate.is_open());
        gate.poll(1800);
        assert!(!gate.is_open());
        assert!(rig.closes_preceded_by_clear_sample());
    }

    #[test]
    fn reopen_after_close_resets_state() {
        let rig = Rig::new();
        let mut gate = gate(&rig);
        gate.open(0);
        gate.poll(5001);
        assert!(!gate.is_open());
        gate.open(6000);
        assert_eq!(gate.open_since(), Some(6000));
        assert_eq!(rig.count(Event::Open), 2);
        let status = gate.status(6500);
        assert_eq!(status.state, GateState::Open);
        assert_eq!(status.open_for_ms, Some(500));
    }
}
