use std::fmt;

use serde::Serialize;

use crate::servo::ServoCalibration;

/// 道闸编号（入口/出口）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateId {
    Entry,
    Exit,
}

impl GateId {
    /// 日志展示用标签。
    pub fn label(&self) -> &'static str {
        match self {
            GateId::Entry => "ENTRY",
            GateId::Exit => "EXIT",
        }
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 道闸逻辑状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Closed,
    Open,
}

/// 关闸原因（仅用于日志）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    Passed,
    Timeout,
    Override,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Passed => "passed",
            CloseReason::Timeout => "timeout",
            CloseReason::Override => "override",
        }
    }
}

/// 单个道闸的计时参数。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateTiming {
    pub open_timeout_ms: u64,
    pub debounce_window_ms: u64,
    pub close_confirm_delay_ms: u64,
}

impl Default for GateTiming {
    fn default() -> Self {
        Self {
            open_timeout_ms: 5000,
            debounce_window_ms: 200,
            close_confirm_delay_ms: 500,
        }
    }
}

/// 配置覆盖错误。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsError {
    UnknownKey(String),
    InvalidValue { key: String, value: String },
    OutOfRange { key: String, value: u64 },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::UnknownKey(key) => write!(f, "unknown setting {}", key),
            SettingsError::InvalidValue { key, value } => {
                write!(f, "invalid value {:?} for {}", value, key)
            }
            SettingsError::OutOfRange { key, value } => {
                write!(f, "value {} out of range for {}", value, key)
            }
        }
    }
}

// 轮询周期上限，超过后超时与确认延迟的分辨率失去意义。
const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// 道闸控制器运行参数（可配置项）。
#[derive(Clone, Debug)]
pub struct BarrierSettings {
    pub timing: GateTiming,
    pub poll_interval_ms: u64,
    pub status_interval_ms: u64,
    pub entry_servo: ServoCalibration,
    pub exit_servo: ServoCalibration,
}

impl Default for BarrierSettings {
    fn default() -> Self {
        Self {
            timing: GateTiming::default(),
            poll_interval_ms: 50,
            status_interval_ms: 10_000,
            entry_servo: ServoCalibration::default(),
            exit_servo: ServoCalibration::default(),
        }
    }
}

impl BarrierSettings {
    /// 依次应用覆盖项，非法项记录告警后保留默认值。
    pub fn with_overrides<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut settings = Self::default();
        for (key, value) in overrides {
            let Some(value) = value else {
                continue;
            };
            if let Err(err) = settings.apply_override(key, value) {
                log::warn!("Ignoring barrier setting: {}", err);
            }
        }
        settings
    }

    /// 应用单个覆盖项（键名与 .env 白名单一致）。
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let parsed: u64 = value.trim().parse().map_err(|_| SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        let out_of_range = || SettingsError::OutOfRange {
            key: key.to_string(),
            value: parsed,
        };
        match key {
            "BARRIER_OPEN_TIMEOUT_MS" | "BARRIER_DEBOUNCE_MS" | "BARRIER_CONFIRM_DELAY_MS" => {
                if parsed == 0 {
                    return Err(out_of_range());
                }
                match key {
                    "BARRIER_OPEN_TIMEOUT_MS" => self.timing.open_timeout_ms = parsed,
                    "BARRIER_DEBOUNCE_MS" => self.timing.debounce_window_ms = parsed,
                    _ => self.timing.close_confirm_delay_ms = parsed,
                }
            }
            "BARRIER_POLL_INTERVAL_MS" => {
                if parsed == 0 || parsed > MAX_POLL_INTERVAL_MS {
                    return Err(out_of_range());
                }
                self.poll_interval_ms = parsed;
            }
            "BARRIER_ENTRY_OPEN_ANGLE"
            | "BARRIER_ENTRY_CLOSE_ANGLE"
            | "BARRIER_EXIT_OPEN_ANGLE"
            | "BARRIER_EXIT_CLOSE_ANGLE" => {
                let angle = u16::try_from(parsed)
                    .ok()
                    .filter(|angle| *angle <= ServoCalibration::MAX_ANGLE)
                    .ok_or_else(out_of_range)?;
                match key {
                    "BARRIER_ENTRY_OPEN_ANGLE" => self.entry_servo.open_angle = angle,
                    "BARRIER_ENTRY_CLOSE_ANGLE" => self.entry_servo.closed_angle = angle,
                    "BARRIER_EXIT_OPEN_ANGLE" => self.exit_servo.open_angle = angle,
                    _ => self.exit_servo.closed_angle = angle,
                }
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}
