use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::rmt::{config::TransmitConfig, FixedLengthSignal, PinState, Pulse, TxRmtDriver};
use esp_idf_hal::sys::EspError;
use esp_idf_hal::units::Hertz;
use esp_idf_hal::{peripheral::Peripheral, rmt::RmtChannel};
use smart_leds::{SmartLedsWrite, RGB8};

use parkgate::indicator::{status_color, COLOR_OFF, COLOR_PENDING};
use parkgate::status::BarrierStatus;

// 亮度缩放（约 25%）。
const BRIGHTNESS_SCALE: u16 = 64;
// 指示灯刷新周期。
const REFRESH_MS: u64 = 250;

// WS2812 位时序（纳秒）：(高电平, 低电平)
const BIT0_NS: (u64, u64) = (350, 800);
const BIT1_NS: (u64, u64) = (700, 600);

/// 单颗 WS2812 状态指示灯。
pub struct StatusLed<'d> {
    tx: TxRmtDriver<'d>,
    current: Option<RGB8>,
}

impl<'d> StatusLed<'d> {
    pub fn new<C, P, Ch, Pin>(channel: C, pin: P) -> Result<Self, EspError>
    where
        C: Peripheral<P = Ch> + 'd,
        P: Peripheral<P = Pin> + 'd,
        Ch: RmtChannel,
        Pin: OutputPin,
    {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config)?;
        Ok(Self { tx, current: None })
    }

    /// 颜色变化时才重新发送。
    pub fn show(&mut self, color: RGB8) -> Result<(), EspError> {
        if self.current == Some(color) {
            return Ok(());
        }
        self.write([color].into_iter())?;
        self.current = Some(color);
        Ok(())
    }

    fn pulse_pair(ticks_hz: Hertz, ns: (u64, u64)) -> Result<(Pulse, Pulse), EspError> {
        Ok((
            Pulse::new_with_duration(ticks_hz, PinState::High, &Duration::from_nanos(ns.0))?,
            Pulse::new_with_duration(ticks_hz, PinState::Low, &Duration::from_nanos(ns.1))?,
        ))
    }

    fn encode(&self, color: RGB8) -> Result<FixedLengthSignal<24>, EspError> {
        let dim = |v: u8| ((v as u16 * BRIGHTNESS_SCALE) / 255) as u32;
        // WS2812 按 GRB 顺序、高位在前
        let grb = (dim(color.g) << 16) | (dim(color.r) << 8) | dim(color.b);
        let ticks_hz = self.tx.counter_clock()?;
        let zero = Self::pulse_pair(ticks_hz, BIT0_NS)?;
        let one = Self::pulse_pair(ticks_hz, BIT1_NS)?;
        let mut signal = FixedLengthSignal::<24>::new();
        for bit in 0..24 {
            let high = grb & (1 << (23 - bit)) != 0;
            signal.set(bit, if high { &one } else { &zero })?;
        }
        Ok(signal)
    }
}

impl SmartLedsWrite for StatusLed<'_> {
    type Color = RGB8;
    type Error = EspError;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let color = iterator.into_iter().next().map(Into::into).unwrap_or(COLOR_OFF);
        let signal = self.encode(color)?;
        self.tx.start_blocking(&signal)?;
        Ok(())
    }
}

/// 启动指示灯任务：跟随道闸状态变色，待关闸时闪烁。
pub fn spawn_indicator_task<C, P, Ch, Pin>(channel: C, pin: P, status: Arc<Mutex<BarrierStatus>>)
where
    C: Peripheral<P = Ch> + Send + 'static,
    P: Peripheral<P = Pin> + Send + 'static,
    Ch: RmtChannel + Send + 'static,
    Pin: OutputPin + Send + 'static,
{
    thread::spawn(move || {
        let mut led = match StatusLed::new(channel, pin) {
            Ok(led) => led,
            Err(err) => {
                log::warn!("Status LED init failed: {:?}", err);
                return;
            }
        };
        let mut blink_on = false;
        loop {
            let color = match status.lock() {
                Ok(status) => status_color(&status),
                Err(_) => COLOR_OFF,
            };
            let color = if color == COLOR_PENDING {
                blink_on = !blink_on;
                if blink_on {
                    color
                } else {
                    COLOR_OFF
                }
            } else {
                color
            };
            if let Err(err) = led.show(color) {
                log::warn!("Status LED update failed: {:?}", err);
            }
            thread::sleep(Duration::from_millis(REFRESH_MS));
        }
    });
}
