#![no_std]

mod machine_logger;
pub mod print;

pub use machine_logger::MachineLogger;
pub use print::SinkWriter;
