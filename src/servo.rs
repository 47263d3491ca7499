/// 舵机标定（开/关角度 + 脉宽范围）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServoCalibration {
    pub open_angle: u16,
    pub closed_angle: u16,
    pub min_pulse_us: u32,
    pub max_pulse_us: u32,
    pub frequency_hz: u32,
}

impl ServoCalibration {
    pub const MAX_ANGLE: u16 = 180;

    /// 角度对应的脉宽（0°..180° 线性映射到 min..max）。
    pub fn pulse_for_angle(&self, angle: u16) -> u32 {
        let angle = angle.min(Self::MAX_ANGLE) as u32;
        let span = self.max_pulse_us.saturating_sub(self.min_pulse_us);
        self.min_pulse_us + span * angle / Self::MAX_ANGLE as u32
    }

    /// 将角度换算为 PWM 占空比（按驱动最大占空比缩放）。
    pub fn duty_for_angle(&self, angle: u16, max_duty: u32) -> u32 {
        let period_us = 1_000_000 / self.frequency_hz.max(1);
        let pulse = self.pulse_for_angle(angle) as u64;
        let duty = pulse * max_duty as u64 / period_us as u64;
        duty.min(max_duty as u64) as u32
    }
}

impl Default for ServoCalibration {
    fn default() -> Self {
        Self {
            open_angle: 90,
            closed_angle: 0,
            min_pulse_us: 500,
            max_pulse_us: 2400,
            frequency_hz: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_spans_calibrated_range() {
        let servo = ServoCalibration::default();
        assert_eq!(servo.pulse_for_angle(0), 500);
        assert_eq!(servo.pulse_for_angle(90), 1450);
        assert_eq!(servo.pulse_for_angle(180), 2400);
        assert_eq!(servo.pulse_for_angle(270), 2400);
    }

    #[test]
    fn duty_scales_with_resolution() {
        let servo = ServoCalibration::default();
        // 14 位分辨率，周期 20ms
        let max_duty = (1 << 14) - 1;
        assert_eq!(servo.duty_for_angle(0, max_duty), 500 * max_duty / 20_000);
        assert_eq!(servo.duty_for_angle(180, max_duty), 2400 * max_duty / 20_000);
        assert!(servo.duty_for_angle(90, max_duty) < max_duty);
    }
}
