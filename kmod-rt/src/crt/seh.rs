// kmod-rt/src/crt/seh.rs
//
// 役割:
// - 例外ディスパッチ機構から呼ばれる「受け身のプローブ」。
// - unwind 中に C++ として認識できないフレームを跨ごうとしたら、
//   状態が壊れる前に termination へ流す。
//
// やること:
// - 診断ログ（コード / アドレス / unwind info offset / image base）
// - flags に unwind 系ビットがあれば context を設定して terminate()
//
// やらないこと:
// - 例外を処理する・握りつぶす（unwind ビットが無ければ素通り）
// - unwind エンジンそのもの

use bitflags::bitflags;
use log::error;

use super::termination::{BugCheckReason, FatalPath, TerminationContext};
use crate::types::{BugCheckArg, NtStatus};

bitflags! {
    /// EXCEPTION_RECORD::ExceptionFlags
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ExceptionFlags: u32 {
        const NONCONTINUABLE = 0x01;
        const UNWINDING = 0x02;
        const EXIT_UNWIND = 0x04;
        const STACK_INVALID = 0x08;
        const NESTED_CALL = 0x10;
        const TARGET_UNWIND = 0x20;
        const COLLIDED_UNWIND = 0x40;

        /// unwind 中であることを示すビットの集合
        const UNWIND = Self::UNWINDING.bits()
            | Self::EXIT_UNWIND.bits()
            | Self::TARGET_UNWIND.bits()
            | Self::COLLIDED_UNWIND.bits();
    }
}

impl ExceptionFlags {
    pub fn is_unwinding(self) -> bool {
        self.intersects(ExceptionFlags::UNWIND)
    }
}

/// C++ 以外のフレームで例外を観測した
pub fn verify_seh<D>(dispatcher: &D, code: NtStatus, addr: usize, flags: u32)
where
    D: FatalPath + ?Sized,
{
    error!(
        "SEH exception observed in foreign frame: code {}, address {:#x}, flags {:#x}",
        code, addr, flags
    );
    if ExceptionFlags::from_bits_retain(flags).is_unwinding() {
        escalate(dispatcher, [code.as_u32() as BugCheckArg, addr, 0, 0]);
    }
}

/// C++ handler フレーム内で例外を観測した（unwind info と image base 付き）
pub fn verify_seh_in_cxx_handler<D>(
    dispatcher: &D,
    code: NtStatus,
    addr: usize,
    flags: u32,
    unwind_info: u32,
    image_base: usize,
) where
    D: FatalPath + ?Sized,
{
    error!(
        "SEH exception observed in C++ handler: code {}, address {:#x}, unwind info offset {}, image base {:#x}",
        code, addr, unwind_info, image_base
    );
    if ExceptionFlags::from_bits_retain(flags).is_unwinding() {
        escalate(
            dispatcher,
            [code.as_u32() as BugCheckArg, addr, unwind_info as BugCheckArg, image_base],
        );
    }
}

fn escalate<D: FatalPath + ?Sized>(dispatcher: &D, args: [BugCheckArg; 4]) -> ! {
    dispatcher.set_context(TerminationContext::new(BugCheckReason::UnwindingNonCxxFrame, args));
    dispatcher.terminate()
}
