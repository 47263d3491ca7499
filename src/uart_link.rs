use std::sync::mpsc::Sender;
use std::thread;

use esp_idf_hal::delay;
use esp_idf_hal::uart::{UartRxDriver, UartTxDriver};

use parkgate::command::{push_console_bytes, BarrierCommand, LineAssembler};

/// 启动串口维护控制台：逐行解析指令送入道闸指令通道，并回显处理结果。
pub fn spawn_console_task(
    rx: UartRxDriver<'static>,
    mut tx: UartTxDriver<'static>,
    command_tx: Sender<BarrierCommand>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut assembler = LineAssembler::new();
        let mut buf = [0u8; 64];
        loop {
            match rx.read(&mut buf, delay::BLOCK) {
                Ok(count) if count > 0 => {
                    let replies = push_console_bytes(&mut assembler, &buf[..count], &command_tx);
                    for reply in replies {
                        if let Err(err) = tx.write(reply.as_line().as_bytes()) {
                            log::warn!("UART TX error: {:?}", err);
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("UART RX error: {:?}", err);
                }
            }
        }
    })
}
