// kmod-rt/src/arch/bugcheck.rs
//
// 回復不能停止の x86_64 実装。
// - 割り込みを止める → 停止コードと 4 ワードを緊急出力 → hlt ループ
// - ここに来た時点で termination lock は握られたまま（解放しない）

use x86_64::instructions::interrupts;

use super::{emergency, FatalStop};
use crate::types::BugCheckArg;

#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBugCheck;

impl FatalStop for CpuBugCheck {
    fn bug_check(&self, code: u32, args: [BugCheckArg; 4]) -> ! {
        interrupts::disable();

        emergency::write_str("[BUGCHECK] code=");
        emergency::write_hex(code as u64);
        emergency::write_str("\n");
        for (i, arg) in args.iter().enumerate() {
            emergency::write_str("[BUGCHECK] arg");
            emergency::write_byte(b'1' + i as u8);
            emergency::write_str("=");
            emergency::write_hex(*arg as u64);
            emergency::write_str("\n");
        }

        super::halt_loop()
    }
}
