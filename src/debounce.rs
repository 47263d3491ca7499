/// 遮挡信号去抖：记录稳定值及其最近一次跳变时间。
///
/// 跳变在首次观察到时立即记录（边沿触发），窗口只由调用方用来判断
/// 跳变后是否已保持足够久，不会延迟上报。
#[derive(Clone, Debug)]
pub struct ObstructionDebouncer {
    window_ms: u64,
    stable: bool,
    changed_at: u64,
    // 当前遮挡阶段的起点；短于窗口的清空间隙不会结束该阶段
    obstructed_since: Option<u64>,
    // 已出现“遮挡保持足够久 -> 清空”的边沿，尚未被消费
    clear_edge: bool,
}

impl ObstructionDebouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            stable: false,
            changed_at: 0,
            obstructed_since: None,
            clear_edge: false,
        }
    }

    /// 以当前采样重新初始化（开闸时调用）。
    pub fn reset(&mut self, obstructed: bool, now: u64) {
        self.stable = obstructed;
        self.changed_at = now;
        self.obstructed_since = obstructed.then_some(now);
        self.clear_edge = false;
    }

    /// 喂入一次原始采样，返回 (稳定值, 最近跳变时间)。
    pub fn update(&mut self, obstructed: bool, now: u64) -> (bool, u64) {
        if obstructed != self.stable {
            if obstructed {
                // 清空不足窗口时长即再次遮挡：视为离开时的抖动，沿用原遮挡起点
                let gap = now.saturating_sub(self.changed_at);
                if self.obstructed_since.is_none() || gap >= self.window_ms {
                    self.obstructed_since = Some(now);
                }
                self.clear_edge = false;
            } else {
                let held = self
                    .obstructed_since
                    .map_or(0, |since| now.saturating_sub(since));
                // 遮挡期短于窗口视为抖动，不产生通过边沿
                self.clear_edge = held >= self.window_ms;
            }
            self.stable = obstructed;
            self.changed_at = now;
        }
        (self.stable, self.changed_at)
    }

    pub fn is_obstructed(&self) -> bool {
        self.stable
    }

    pub fn changed_at(&self) -> u64 {
        self.changed_at
    }

    /// 当前稳定值已持续的时长。
    pub fn stable_for(&self, now: u64) -> u64 {
        now.saturating_sub(self.changed_at)
    }

    /// 车辆通过判定：遮挡 -> 清空，且清空已稳定保持窗口时长。每个边沿只返回一次 true。
    pub fn take_clear_edge(&mut self, now: u64) -> bool {
        if self.clear_edge && !self.stable && self.stable_for(now) >= self.window_ms {
            self.clear_edge = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_transition_time_immediately() {
        let mut debounce = ObstructionDebouncer::new(200);
        debounce.reset(false, 0);
        assert_eq!(debounce.update(true, 40), (true, 40));
        assert_eq!(debounce.update(true, 90), (true, 40));
        assert_eq!(debounce.stable_for(140), 100);
    }

    #[test]
    fn clear_edge_after_stable_hold() {
        let mut debounce = ObstructionDebouncer::new(200);
        debounce.reset(true, 0);
        debounce.update(false, 1000);
        assert!(!debounce.take_clear_edge(1100));
        assert!(!debounce.take_clear_edge(1199));
        assert!(debounce.take_clear_edge(1200));
        // 同一个边沿只消费一次
        assert!(!debounce.take_clear_edge(1300));
    }

    #[test]
    fn short_obstruction_is_bounce() {
        let mut debounce = ObstructionDebouncer::new(200);
        debounce.reset(false, 0);
        debounce.update(true, 100);
        debounce.update(false, 150);
        assert!(!debounce.take_clear_edge(1000));
    }

    #[test]
    fn reobstruction_cancels_edge() {
        let mut debounce = ObstructionDebouncer::new(200);
        debounce.reset(true, 0);
        debounce.update(false, 500);
        debounce.update(true, 550);
        assert!(!debounce.take_clear_edge(900));
        assert!(debounce.is_obstructed());
        assert_eq!(debounce.changed_at(), 550);
    }

    #[test]
    fn trailing_bounce_keeps_obstructed_phase() {
        let mut debounce = ObstructionDebouncer::new(200);
        debounce.reset(true, 0);
        debounce.update(false, 1000);
        debounce.update(true, 1050);
        debounce.update(false, 1100);
        assert!(!debounce.take_clear_edge(1299));
        assert!(debounce.take_clear_edge(1300));
    }

    #[test]
    fn long_clear_gap_starts_new_phase() {
        let mut debounce = ObstructionDebouncer::new(200);
        debounce.reset(true, 0);
        debounce.update(false, 1000);
        assert!(debounce.take_clear_edge(1200));
        // 清空已稳定，新的短遮挡只算抖动
        debounce.update(true, 1500);
        debounce.update(false, 1550);
        assert!(!debounce.take_clear_edge(2000));
    }
}
