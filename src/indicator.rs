use smart_leds::RGB8;

use crate::status::BarrierStatus;

pub const COLOR_OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };
pub const COLOR_OBSTRUCTED: RGB8 = RGB8 { r: 255, g: 0, b: 0 };
pub const COLOR_PENDING: RGB8 = RGB8 { r: 255, g: 160, b: 0 };
pub const COLOR_OPEN: RGB8 = RGB8 { r: 0, g: 255, b: 0 };

/// 将道闸状态映射为指示灯颜色（遮挡 > 待关闸 > 开启 > 熄灭）。
pub fn status_color(status: &BarrierStatus) -> RGB8 {
    if status.any_open_obstructed() {
        COLOR_OBSTRUCTED
    } else if status.any_pending_close() {
        COLOR_PENDING
    } else if status.any_open() {
        COLOR_OPEN
    } else {
        COLOR_OFF
    }
}
