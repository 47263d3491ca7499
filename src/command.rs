use std::sync::mpsc::{self, Receiver, Sender};

use crate::model::GateId;

/// 消息总线上的开闸主题（与上位机约定）。
pub const TOPIC_ENTRY_OPEN: &str = "parking/entry/open";
pub const TOPIC_EXIT_OPEN: &str = "parking/exit/open";

// 串口控制台单行最大长度，超出整行丢弃。
const MAX_LINE_LEN: usize = 128;

/// 协作方发给道闸的指令。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierCommand {
    Open(GateId),
    /// 人工关闸（不经过遮挡确认）。
    Close(GateId),
}

impl BarrierCommand {
    /// 将订阅主题映射为开闸指令。
    pub fn from_topic(topic: &str) -> Option<Self> {
        match topic {
            TOPIC_ENTRY_OPEN => Some(BarrierCommand::Open(GateId::Entry)),
            TOPIC_EXIT_OPEN => Some(BarrierCommand::Open(GateId::Exit)),
            _ => None,
        }
    }

    /// 解析维护控制台命令，例如 `open entry`、`close out`。
    pub fn parse_console(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next()?.to_ascii_lowercase();
        let target = parts.next()?.to_ascii_lowercase();
        if parts.next().is_some() {
            return None;
        }
        let gate = match target.as_str() {
            "entry" | "in" => GateId::Entry,
            "exit" | "out" => GateId::Exit,
            _ => return None,
        };
        match verb.as_str() {
            "open" => Some(BarrierCommand::Open(gate)),
            "close" => Some(BarrierCommand::Close(gate)),
            _ => None,
        }
    }
}

/// 串口行组装器：逐字节收集，遇到换行输出一行。
pub struct LineAssembler {
    buffer: Vec<u8>,
    overflow: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
            overflow: false,
        }
    }

    /// 推入一个字节，完整且非空的行返回 Some。
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' => None,
            b'\n' => {
                let overflow = self.overflow;
                self.overflow = false;
                let line = String::from_utf8_lossy(&self.buffer).trim().to_string();
                self.buffer.clear();
                if overflow || line.is_empty() {
                    return None;
                }
                Some(line)
            }
            _ => {
                if self.buffer.len() >= MAX_LINE_LEN {
                    self.overflow = true;
                    self.buffer.clear();
                }
                if !self.overflow {
                    self.buffer.push(byte);
                }
                None
            }
        }
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// 控制台对每一行的处理结果。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleReply {
    Accepted(BarrierCommand),
    Rejected(String),
    /// 指令合法，但控制循环已退出，未能送达。
    Unavailable(BarrierCommand),
}

impl ConsoleReply {
    /// 回显到串口的文本行。
    pub fn as_line(&self) -> String {
        match self {
            ConsoleReply::Accepted(_) => "OK\r\n".to_string(),
            ConsoleReply::Rejected(line) => format!("ERR unknown command: {}\r\n", line),
            ConsoleReply::Unavailable(_) => "ERR barrier offline\r\n".to_string(),
        }
    }
}

/// 逐字节喂给行组装器，识别出的指令发送到通道。
pub fn push_console_bytes(
    assembler: &mut LineAssembler,
    bytes: &[u8],
    command_tx: &Sender<BarrierCommand>,
) -> Vec<ConsoleReply> {
    let mut replies = Vec::new();
    for &byte in bytes {
        let Some(line) = assembler.push(byte) else {
            continue;
        };
        match BarrierCommand::parse_console(&line) {
            Some(command) => {
                if command_tx.send(command).is_ok() {
                    log::info!("[Console] {:?}", command);
                    replies.push(ConsoleReply::Accepted(command));
                } else {
                    log::warn!("[Console] {:?} dropped, barrier loop not running", command);
                    replies.push(ConsoleReply::Unavailable(command));
                }
            }
            None => {
                log::warn!("[Console] unknown command: {}", line);
                replies.push(ConsoleReply::Rejected(line));
            }
        }
    }
    replies
}

/// 指令通道（协作方持有发送端，控制循环持有接收端）。
pub struct CommandChannels {
    pub command_tx: Sender<BarrierCommand>,
    pub command_rx: Receiver<BarrierCommand>,
}

impl CommandChannels {
    pub fn new() -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        Self {
            command_tx,
            command_rx,
        }
    }
}

impl Default for CommandChannels {
    fn default() -> Self {
        Self::new()
    }
}
