// kmod-rt/src/arch/emergency.rs
//
// 緊急出力（ロック無し）
// - QEMU debugcon(0xE9) と COM1
// - bugcheck / panic 経路専用。logging 側の Mutex は使わない（再入で固まるため）。

use x86_64::instructions::port::Port;

use super::com1;

const DEBUGCON_PORT: u16 = 0xE9;

pub fn write_byte(b: u8) {
    unsafe { Port::<u8>::new(DEBUGCON_PORT).write(b) };
    com1::write_byte(b);
}

pub fn write_str(s: &str) {
    s.bytes().for_each(write_byte);
}

pub fn write_hex(v: u64) {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    write_str("0x");
    for shift in (0..64).step_by(4).rev() {
        write_byte(DIGITS[((v >> shift) & 0xF) as usize]);
    }
}
