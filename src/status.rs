use serde::Serialize;

use crate::model::{GateId, GateState};

/// 单个道闸的状态快照。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GateStatus {
    pub gate: GateId,
    pub state: GateState,
    pub obstructed: bool,
    pub pending_close: bool,
    pub open_for_ms: Option<u64>,
}

impl GateStatus {
    /// 初始（关闭、无遮挡）快照。
    pub fn closed(gate: GateId) -> Self {
        Self {
            gate,
            state: GateState::Closed,
            obstructed: false,
            pending_close: false,
            open_for_ms: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == GateState::Open
    }
}

/// 出入口道闸的整体快照，供显示/灯效/上报任务读取。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BarrierStatus {
    pub entry: GateStatus,
    pub exit: GateStatus,
    pub uptime_ms: u64,
}

impl BarrierStatus {
    pub fn new() -> Self {
        Self {
            entry: GateStatus::closed(GateId::Entry),
            exit: GateStatus::closed(GateId::Exit),
            uptime_ms: 0,
        }
    }

    pub fn gate(&self, id: GateId) -> &GateStatus {
        match id {
            GateId::Entry => &self.entry,
            GateId::Exit => &self.exit,
        }
    }

    /// 是否有开启中的道闸被遮挡。
    pub fn any_open_obstructed(&self) -> bool {
        [&self.entry, &self.exit]
            .iter()
            .any(|gate| gate.is_open() && gate.obstructed)
    }

    pub fn any_pending_close(&self) -> bool {
        self.entry.pending_close || self.exit.pending_close
    }

    pub fn any_open(&self) -> bool {
        self.entry.is_open() || self.exit.is_open()
    }

    /// 序列化为 JSON 字符串（用于日志）。
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for BarrierStatus {
    fn default() -> Self {
        Self::new()
    }
}
