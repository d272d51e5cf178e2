// kmod-rt/src/logging/serial.rs
//
// COM1 への log 出力。
// - log(): "[LEVEL] message" を 1 行で送信
// - 行単位で spin::Mutex を取る（行が混ざらないように）。
// - lock が取れなければその行は捨てる（保持中の再入で spin し続けないため）。
// - fatal 経路は arch::emergency を使う（こちらのロックに依存しない）。

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, Ordering};

use log::{Log, Metadata, Record};
use spin::Mutex;
use x86_64::instructions::interrupts;

use crate::arch::com1;

struct SerialPort;

impl Write for SerialPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        s.bytes().for_each(com1::write_byte);
        Ok(())
    }
}

pub struct SerialLogger {
    port: Mutex<SerialPort>,
    initialized: AtomicBool,
}

impl SerialLogger {
    pub const fn new() -> Self {
        SerialLogger {
            port: Mutex::new(SerialPort),
            initialized: AtomicBool::new(false),
        }
    }

    /// 2 回目以降は何もしない
    pub fn init_port(&self) {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            com1::init();
        }
    }
}

impl Default for SerialLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // 保持中に割り込みが来て同じ lock を取りに行かないよう、区間中は止める
        interrupts::without_interrupts(|| {
            if let Some(mut port) = self.port.try_lock() {
                let _ = write!(port, "[{}] {}\r\n", record.level(), record.args());
            }
        });
    }

    fn flush(&self) {}
}
