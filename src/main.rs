// 模块划分：舵机/红外驱动、串口维护控制台、状态指示灯；道闸逻辑在 parkgate 库中
#[cfg(target_os = "espidf")]
mod hw;
#[cfg(target_os = "espidf")]
mod smart_led;
#[cfg(target_os = "espidf")]
mod uart_link;

use parkgate::model::BarrierSettings;

#[cfg(target_os = "espidf")]
fn main() {
    // ESP-IDF 运行时初始化（链接补丁 & 日志）
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("ParkGate barrier booting (ESP-IDF)...");

    let settings = load_settings();
    if let Err(err) = firmware::start(settings) {
        log::error!("Barrier init failed: {:?}", err);
    }

    // 主循环保持任务存活
    loop {
        esp_idf_hal::delay::FreeRtos::delay_ms(1000);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    let settings = load_settings();
    eprintln!(
        "ParkGate barrier firmware targets ESP-IDF; host build only checks settings: {:?}",
        settings
    );
}

/// 编译期 .env 覆盖默认参数。
fn load_settings() -> BarrierSettings {
    BarrierSettings::with_overrides([
        ("BARRIER_OPEN_TIMEOUT_MS", option_env!("BARRIER_OPEN_TIMEOUT_MS")),
        ("BARRIER_DEBOUNCE_MS", option_env!("BARRIER_DEBOUNCE_MS")),
        ("BARRIER_CONFIRM_DELAY_MS", option_env!("BARRIER_CONFIRM_DELAY_MS")),
        ("BARRIER_POLL_INTERVAL_MS", option_env!("BARRIER_POLL_INTERVAL_MS")),
        ("BARRIER_ENTRY_OPEN_ANGLE", option_env!("BARRIER_ENTRY_OPEN_ANGLE")),
        ("BARRIER_ENTRY_CLOSE_ANGLE", option_env!("BARRIER_ENTRY_CLOSE_ANGLE")),
        ("BARRIER_EXIT_OPEN_ANGLE", option_env!("BARRIER_EXIT_OPEN_ANGLE")),
        ("BARRIER_EXIT_CLOSE_ANGLE", option_env!("BARRIER_EXIT_CLOSE_ANGLE")),
    ])
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::{Arc, Mutex};

    use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, InputPin};
    use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
    use esp_idf_hal::prelude::*;
    use esp_idf_hal::sys::EspError;
    use esp_idf_hal::uart;

    use parkgate::barrier::BarrierOrchestrator;
    use parkgate::command::CommandChannels;
    use parkgate::model::{BarrierSettings, GateId};
    use parkgate::runtime::{spawn_barrier_loop, BarrierRuntime};
    use parkgate::status::BarrierStatus;

    use crate::hw::{IrSensor, ServoActuator};
    use crate::{smart_led, uart_link};

    /// 外设初始化并启动各任务。
    pub fn start(settings: BarrierSettings) -> Result<(), EspError> {
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        // 舵机 PWM：两路共用一个 50Hz 定时器，定时器需在整个运行期存活
        let timer_config = TimerConfig::new()
            .frequency(settings.entry_servo.frequency_hz.Hz().into())
            .resolution(Resolution::Bits14);
        let servo_timer: &'static LedcTimerDriver<'static, _> = Box::leak(Box::new(
            LedcTimerDriver::new(peripherals.ledc.timer0, &timer_config)?,
        ));
        let entry_servo = LedcDriver::new(peripherals.ledc.channel0, servo_timer, pins.gpio33)?;
        let exit_servo = LedcDriver::new(peripherals.ledc.channel1, servo_timer, pins.gpio32)?;

        // 红外传感器：GPIO35 入口、GPIO34 出口
        let entry_ir = IrSensor::new(pins.gpio35.downgrade_input())?;
        let exit_ir = IrSensor::new(pins.gpio34.downgrade_input())?;

        // 构造控制器时闸杆落到关闭位置
        let orchestrator = BarrierOrchestrator::new(
            (
                ServoActuator::new(GateId::Entry, entry_servo, settings.entry_servo),
                entry_ir,
            ),
            (
                ServoActuator::new(GateId::Exit, exit_servo, settings.exit_servo),
                exit_ir,
            ),
            settings.timing,
        );
        log::info!(
            "[Barrier] ready: entry servo GPIO33, exit servo GPIO32, entry IR GPIO35, exit IR GPIO34"
        );

        let CommandChannels {
            command_tx,
            command_rx,
        } = CommandChannels::new();
        let status = Arc::new(Mutex::new(BarrierStatus::new()));

        // 状态指示灯：反映道闸状态
        smart_led::spawn_indicator_task(peripherals.rmt.channel0, pins.gpio25, status.clone());

        // 串口维护控制台：open/close entry/exit
        let uart_config = uart::config::Config::new().baudrate(Hertz(115_200));
        let uart = uart::UartDriver::new(
            peripherals.uart0,
            pins.gpio1,
            pins.gpio3,
            AnyInputPin::none(),
            AnyOutputPin::none(),
            &uart_config,
        )?;
        let (uart_tx, uart_rx) = uart.into_split();
        let _console_handle = uart_link::spawn_console_task(uart_rx, uart_tx, command_tx);

        let runtime = BarrierRuntime::new(
            orchestrator,
            command_rx,
            status,
            settings.status_interval_ms,
        );
        let _barrier_handle = spawn_barrier_loop(runtime, settings.poll_interval_ms);
        Ok(())
    }
}
