use esp_idf_hal::gpio::{AnyInputPin, Input, PinDriver};
use esp_idf_hal::ledc::LedcDriver;
use esp_idf_hal::sys::EspError;

use parkgate::gate::{Actuator, ObstructionSensor};
use parkgate::model::GateId;
use parkgate::servo::ServoCalibration;

/// 舵机闸杆（LEDC 50Hz PWM）。
pub struct ServoActuator {
    gate: GateId,
    driver: LedcDriver<'static>,
    calibration: ServoCalibration,
}

impl ServoActuator {
    pub fn new(gate: GateId, driver: LedcDriver<'static>, calibration: ServoCalibration) -> Self {
        Self {
            gate,
            driver,
            calibration,
        }
    }

    fn move_to(&mut self, angle: u16) {
        let duty = self
            .calibration
            .duty_for_angle(angle, self.driver.get_max_duty());
        log::debug!("[Servo] {} -> {} degrees (duty {})", self.gate, angle, duty);
        // 执行器没有反馈通道，驱动错误只能记录
        if let Err(err) = self.driver.set_duty(duty) {
            log::warn!("[Servo] {} set duty failed: {:?}", self.gate, err);
        }
    }
}

impl Actuator for ServoActuator {
    fn command_open(&mut self) {
        self.move_to(self.calibration.open_angle);
    }

    fn command_closed(&mut self) {
        self.move_to(self.calibration.closed_angle);
    }
}

/// 红外对射传感器，低电平表示有遮挡。
pub struct IrSensor {
    input: PinDriver<'static, AnyInputPin, Input>,
}

impl IrSensor {
    pub fn new(pin: AnyInputPin) -> Result<Self, EspError> {
        // GPIO34/35 为仅输入引脚，无内部上拉
        let input = PinDriver::input(pin)?;
        Ok(Self { input })
    }
}

impl ObstructionSensor for IrSensor {
    fn is_obstructed(&mut self) -> bool {
        self.input.is_low()
    }
}
