// kmod-rt/src/arch/cpu.rs
// CPU 命令ラッパ。unsafe は最小限。

#[cfg(target_arch = "x86_64")]
pub fn halt_loop() -> ! {
    loop {
        x86_64::instructions::hlt();
    }
}

#[cfg(not(target_arch = "x86_64"))]
pub fn halt_loop() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
