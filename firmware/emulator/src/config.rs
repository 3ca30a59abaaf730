//! Compile time configuration of the firmware
//!
//! Addresses in here are fixed by the SoC and by the way the boot images are placed in memory.

use log::Level;

/// Entry point of the supervisor image (usually a Linux kernel)
pub const SUPERVISOR_IMAGE_BASE: u32 = 0xC000_0000;

/// Location of the flattened device tree that is passed to the supervisor
pub const DEVICE_TREE_BASE: u32 = 0xC100_0000;

/// Size of the save area for the trapped register file
pub const TRAP_FRAME_SIZE: usize = 32 * 4;

/// Maximum log level of the firmware logger
pub const LOG_LEVEL: Level = Level::Info;

/// CSR locations of a LiteX SoC
pub mod litex {
    pub const UART_BASE: usize = 0xF000_1800;
    pub const TIMER_BASE: usize = 0xF000_8800;
    pub const FINISH_BASE: usize = 0xF000_8000;
    pub const FRAMEBUFFER_MMCM_BASE: usize = 0xF000_9000;
    pub const FRAMEBUFFER_INITIATOR_BASE: usize = 0xF000_9800;

    /// Memory that the framebuffer scans out
    pub const FRAMEBUFFER_DMA_BASE: u32 = 0x1000_0000;
}

/// Device locations of the VexRiscv simulator
pub mod sim {
    /// Start of the register block; the machine timer comes first
    pub const REGISTERS_BASE: usize = 0xFFFF_FFE0;
    pub const TIME_LOW: usize = 0xFFFF_FFE0;
    pub const TIME_HIGH: usize = 0xFFFF_FFE4;
    pub const TIME_COMPARE: usize = 0xFFFF_FFE8;
    pub const CONSOLE: usize = 0xFFFF_FFF8;
    pub const STOP: usize = 0xFFFF_FFFC;
}
