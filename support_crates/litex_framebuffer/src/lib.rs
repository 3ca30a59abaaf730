//! Configuration of the LiteX framebuffer
//!
//! The framebuffer consists of two register blocks:
//! - the clocking block, which exposes the dynamic reconfiguration port of a Xilinx MMCM that generates the pixel clock
//! - the DMA initiator, which holds the video timing and the location of the pixel data in memory
//!
//! Configuration is a one-shot affair done at boot.
#![no_std]

use regs::LitexCsr;

/// The timing of a video mode
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VideoTiming {
    /// Pixel clock in tens of kHz
    pub pixel_clock: u32,

    pub h_active: u32,
    pub h_blanking: u32,
    pub h_sync_offset: u32,
    pub h_sync_width: u32,

    pub v_active: u32,
    pub v_blanking: u32,
    pub v_sync_offset: u32,
    pub v_sync_width: u32,
}

impl VideoTiming {
    /// 640x480 @ 75Hz
    pub const VGA_75HZ: VideoTiming = VideoTiming {
        pixel_clock: 3150,

        h_active: 640,
        h_blanking: 200,
        h_sync_offset: 16,
        h_sync_width: 64,

        v_active: 480,
        v_blanking: 20,
        v_sync_offset: 1,
        v_sync_width: 3,
    };

    /// The resulting refresh rate in Hz (rounded down)
    pub fn refresh_rate(&self) -> u32 {
        (self.pixel_clock * 10000) / ((self.h_active + self.h_blanking) * (self.v_active + self.v_blanking))
    }

    /// Number of bytes a frame occupies in memory at 32 bits per pixel
    pub fn frame_size(&self) -> u32 {
        self.h_active * self.v_active * 4
    }
}

/// Search the MMCM multiplier `m` and divider `d` whose ratio comes closest to `frequency / 10000`.
///
/// `d` ranges over `1..=128` and `m` over `2..=128`.
/// On ties the pair found first (smallest `d`, then smallest `m`) wins.
pub fn clock_md(frequency: u32) -> (u32, u32) {
    const IDEAL_D: i64 = 10000;
    let ideal_m = frequency as i64;

    let mut best_m: i64 = 1;
    let mut best_d: i64 = 0;
    for d in 1..=128i64 {
        for m in 2..=128i64 {
            // common denominator is d * best_d * IDEAL_D
            let diff_current = (d * IDEAL_D * best_m - d * best_d * ideal_m).abs();
            let diff_tested = (best_d * IDEAL_D * m - d * best_d * ideal_m).abs();
            if diff_tested < diff_current {
                best_m = m;
                best_d = d;
            }
        }
    }
    (best_m as u32, best_d as u32)
}

/// Compute the MMCM reconfiguration writes for multiplier `m` and divider `d` as `(address, data)` pairs.
///
/// The two fixed output dividers produce the pixel clock (`clkout0 = 10`) and the 5x serializer clock
/// (`clkout1 = 2`).
pub fn mmcm_writes(m: u32, d: u32) -> [(u8, u16); 4] {
    let divider = |n: u32| (((n / 2) << 6) | (n / 2 + n % 2)) as u16;
    [
        // clkfbout_mult
        (0x14, 0x1000 | divider(m)),
        // divclk_divide
        (0x16, if d == 1 { 0x1000 } else { divider(d) }),
        // clkout0_divide
        (0x08, 0x1000 | divider(10)),
        // clkout1_divide
        (0x0a, 0x1000 | divider(2)),
    ]
}

/// Register block of the MMCM dynamic reconfiguration port
#[repr(C)]
pub struct MmcmRegisters {
    #[allow(dead_code)]
    reset: LitexCsr<1>,
    #[allow(dead_code)]
    read: LitexCsr<1>,
    write: LitexCsr<1>,
    drdy: LitexCsr<1>,
    adr: LitexCsr<1>,
    dat_w: LitexCsr<2>,
    #[allow(dead_code)]
    dat_r: LitexCsr<2>,
}

/// Register block of the framebuffer DMA initiator
#[repr(C)]
pub struct InitiatorRegisters {
    enable: LitexCsr<1>,
    hres: LitexCsr<2>,
    hsync_start: LitexCsr<2>,
    hsync_end: LitexCsr<2>,
    hscan: LitexCsr<2>,
    vres: LitexCsr<2>,
    vsync_start: LitexCsr<2>,
    vsync_end: LitexCsr<2>,
    vscan: LitexCsr<2>,
    base: LitexCsr<4>,
    length: LitexCsr<4>,
}

/// Controller for a memory mapped LiteX framebuffer
pub struct LitexFramebuffer<'a> {
    mmcm: &'a MmcmRegisters,
    initiator: &'a InitiatorRegisters,
}

impl<'a> LitexFramebuffer<'a> {
    /// Create a controller from the addresses of both register blocks.
    ///
    /// # Safety
    /// `mmcm` and `initiator` must point to the register blocks of an attached LiteX framebuffer.
    pub unsafe fn from_ptrs(mmcm: *mut MmcmRegisters, initiator: *mut InitiatorRegisters) -> Self {
        Self {
            mmcm: &*mmcm,
            initiator: &*initiator,
        }
    }

    pub fn new(mmcm: &'a MmcmRegisters, initiator: &'a InitiatorRegisters) -> Self {
        Self { mmcm, initiator }
    }

    fn mmcm_write(&self, address: u8, data: u16) {
        unsafe {
            self.mmcm.adr.write(address as u64);
            self.mmcm.dat_w.write(data as u64);
            self.mmcm.write.write(1);
            while self.mmcm.drdy.read() == 0 {}
        }
    }

    /// Program the pixel clock, the timing and the DMA engine for `mode` with pixel data at `dma_base`.
    pub fn configure(&self, mode: &VideoTiming, dma_base: u32) {
        log::info!(
            "Initializing framebuffer console to {}x{} @ {}Hz",
            mode.h_active,
            mode.v_active,
            mode.refresh_rate()
        );

        let (m, d) = clock_md(10 * mode.pixel_clock);
        log::debug!("pixel clock multiplier {} divider {}", m, d);
        for (address, data) in mmcm_writes(m, d) {
            self.mmcm_write(address, data);
        }

        let regs = self.initiator;
        unsafe {
            regs.hres.write(mode.h_active as u64);
            regs.vres.write(mode.v_active as u64);

            regs.hsync_start.write((mode.h_active + mode.h_sync_offset) as u64);
            regs.hsync_end
                .write((mode.h_active + mode.h_sync_offset + mode.h_sync_width) as u64);
            regs.hscan.write((mode.h_active + mode.h_blanking) as u64);

            regs.vsync_start.write((mode.v_active + mode.v_sync_offset) as u64);
            regs.vsync_end
                .write((mode.v_active + mode.v_sync_offset + mode.v_sync_width) as u64);
            regs.vscan.write((mode.v_active + mode.v_blanking) as u64);

            regs.enable.write(0);
            regs.base.write(dma_base as u64);
            regs.length.write(mode.frame_size() as u64);
            regs.enable.write(1);
        }
    }
}
