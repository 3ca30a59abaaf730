#![cfg_attr(target_arch = "riscv32", no_std)]
#![cfg_attr(target_arch = "riscv32", no_main)]

#[cfg(target_arch = "riscv32")]
mod firmware {
    use core::panic::PanicInfo;
    use emulator::arch;
    use emulator::boot::{self, MachineInit};
    use emulator::config::{DEVICE_TREE_BASE, LOG_LEVEL, SUPERVISOR_IMAGE_BASE};
    use emulator::platform::{ActivePlatform, Console, Platform};
    use klog::MachineLogger;

    fn console_sink(byte: u8) {
        unsafe { ActivePlatform::from_config() }.write(byte)
    }

    static LOGGER: MachineLogger = MachineLogger::new(LOG_LEVEL, console_sink);

    #[panic_handler]
    fn panic_handler(info: &PanicInfo) -> ! {
        log::error!("!!! Firmware Panic !!!\n  {}", info);
        unsafe { ActivePlatform::from_config() }.halt()
    }

    #[no_mangle]
    extern "C" fn _start_rust() -> ! {
        unsafe { arch::init_memory() };
        if unsafe { LOGGER.install() }.is_err() {
            unsafe { ActivePlatform::from_config() }.halt();
        }

        for line in boot::banner() {
            log::info!("{}", line);
        }

        #[cfg(feature = "framebuffer")]
        configure_framebuffer();

        match unsafe { boot::device_tree_size(DEVICE_TREE_BASE as *const u8) } {
            Ok(size) => log::info!("device tree at {:#010x} ({} bytes)", DEVICE_TREE_BASE, size),
            Err(e) => log::warn!("no valid device tree at {:#010x}: {:?}", DEVICE_TREE_BASE, e),
        }

        let init = MachineInit::new(
            arch::entry::trap_entry_address(),
            arch::stack_top(),
            SUPERVISOR_IMAGE_BASE,
        );
        log::debug!("entering the supervisor with {:#x?}", init);

        unsafe {
            arch::boot::open_pmp();
            arch::boot::apply(&init);
            arch::boot::enter_supervisor(DEVICE_TREE_BASE)
        }
    }

    #[cfg(feature = "framebuffer")]
    fn configure_framebuffer() {
        use emulator::config::litex::{
            FRAMEBUFFER_DMA_BASE, FRAMEBUFFER_INITIATOR_BASE, FRAMEBUFFER_MMCM_BASE,
        };
        use litex_framebuffer::{LitexFramebuffer, VideoTiming};

        let framebuffer = unsafe {
            LitexFramebuffer::from_ptrs(
                FRAMEBUFFER_MMCM_BASE as *mut _,
                FRAMEBUFFER_INITIATOR_BASE as *mut _,
            )
        };
        framebuffer.configure(&VideoTiming::VGA_75HZ, FRAMEBUFFER_DMA_BASE);
    }
}

#[cfg(not(target_arch = "riscv32"))]
fn main() {
    eprintln!("the emulator firmware only runs on a VexRiscv, build it for riscv32ima-unknown-none-elf");
    std::process::exit(1);
}
