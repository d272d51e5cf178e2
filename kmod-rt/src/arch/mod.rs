// kmod-rt/src/arch/mod.rs
//
// ホスト依存部。unsafe をできるだけここに閉じ込める方針。
// - cpu: halt_loop など CPU 固有処理
// - interrupts: 割り込み優先度の引き上げ/復帰（PriorityControl の x86_64 実装）
// - bugcheck: 回復不能停止（FatalStop の x86_64 実装）
// - com1: シリアルポートの最小操作（emergency と logging で共有）
// - emergency: ロック無しの緊急出力
//
// dispatcher 側は trait だけを見る。実装の中身（cli/sti, hlt, port I/O）は知らない。

pub mod cpu;

#[cfg(target_arch = "x86_64")]
pub mod bugcheck;
#[cfg(target_arch = "x86_64")]
pub mod com1;
#[cfg(target_arch = "x86_64")]
pub mod emergency;
#[cfg(target_arch = "x86_64")]
pub mod interrupts;

use crate::types::BugCheckArg;

pub use crate::sync::PriorityControl;

#[cfg(target_arch = "x86_64")]
pub use bugcheck::CpuBugCheck;
#[cfg(target_arch = "x86_64")]
pub use interrupts::InterruptMask;

/// ホストカーネルの回復不能停止（bugcheck）
///
/// `code` はカテゴリタグと理由コードを OR した値、`args` は診断ワード 4 つ。
/// 実装は絶対に戻ってはならない。
pub trait FatalStop {
    fn bug_check(&self, code: u32, args: [BugCheckArg; 4]) -> !;
}

impl<T: FatalStop + ?Sized> FatalStop for &T {
    fn bug_check(&self, code: u32, args: [BugCheckArg; 4]) -> ! {
        (**self).bug_check(code, args)
    }
}

/// CPU を停止させるループ
pub fn halt_loop() -> ! {
    cpu::halt_loop()
}
