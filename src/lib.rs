// 道闸控制核心：去抖、单闸状态机、出入口编排，以及与硬件无关的周边模块
pub mod barrier;
pub mod command;
pub mod debounce;
pub mod gate;
pub mod indicator;
pub mod model;
pub mod runtime;
pub mod servo;
pub mod status;
