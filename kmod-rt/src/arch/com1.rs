// kmod-rt/src/arch/com1.rs
//
// COM1 (0x3F8) の最小限のポート操作。emergency 出力と SerialLogger で共有する。
// - init(): 115200bps, 8N1
// - write_byte(): THR empty を上限付きで待ってから送信（壊れた UART で止まらない）

use x86_64::instructions::port::Port;

const BASE: u16 = 0x3F8;
const LSR_THR_EMPTY: u8 = 0x20;
const TX_SPIN_LIMIT: usize = 10_000;

pub fn init() {
    let regs: [(u16, u8); 7] = [
        (1, 0x00), // 割り込み無効
        (3, 0x80), // DLAB on
        (0, 0x01), // divisor low (115200)
        (1, 0x00), // divisor high
        (3, 0x03), // 8N1, DLAB off
        (2, 0xC7), // FIFO on, clear
        (4, 0x0B), // DTR/RTS/OUT2
    ];
    for (offset, value) in regs {
        unsafe { Port::<u8>::new(BASE + offset).write(value) };
    }
}

pub fn write_byte(b: u8) {
    unsafe {
        let mut lsr = Port::<u8>::new(BASE + 5);
        for _ in 0..TX_SPIN_LIMIT {
            if (lsr.read() & LSR_THR_EMPTY) != 0 {
                break;
            }
        }
        Port::<u8>::new(BASE).write(b);
    }
}
