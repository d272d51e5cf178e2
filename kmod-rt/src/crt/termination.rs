// kmod-rt/src/crt/termination.rs
//
// termination dispatcher（terminate / abort の実体）
//
// [このモジュールにおける不変条件]
//
// 1. handler slot
//    - 高々 1 つ。get/set は単一のアトミック命令で、lock を取らない。
//    - set は直前の値を返す。
//
// 2. termination context
//    - 書き込みは priority spin lock の下でのみ行う（最後に書いた者が勝つ）。
//    - 既定値は NotSpecified + 0 ワード。
//
// 3. abort
//    - lock を取ったまま停止する（解放しない。停止時の状態を凍結するため）。
//    - 二度と戻らない。
//
// 4. terminate / abort は log を呼ばない
//    - ロガーの lock 保持中に致命条件が起きると、そこで永遠に spin する。
//    - 停止コードと 4 ワードの出力は FatalStop（ロック無しの緊急出力）が行う。

use core::fmt;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::arch::FatalStop;
use crate::sync::{PriorityControl, PriorityGuard, PrioritySpinLock};
use crate::types::{BugCheckArg, TerminateHandler};

/// 停止コードのカテゴリタグ（下位 16bit に理由コードを OR する）
pub const KMOD_FAILURE: u32 = 0x4B4D_0000;

#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BugCheckReason {
    #[default]
    NotSpecified = 0,
    AssertionFailure = 1,
    UnwindingNonCxxFrame = 2,
    RustPanic = 3,
}

impl BugCheckReason {
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for BugCheckReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BugCheckReason::NotSpecified => write!(f, "NotSpecified"),
            BugCheckReason::AssertionFailure => write!(f, "AssertionFailure"),
            BugCheckReason::UnwindingNonCxxFrame => write!(f, "UnwindingNonCxxFrame"),
            BugCheckReason::RustPanic => write!(f, "RustPanic"),
        }
    }
}

/// 直近の致命的条件（理由 + 診断ワード 4 つ）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerminationContext {
    pub reason: BugCheckReason,
    pub args: [BugCheckArg; 4],
}

impl TerminationContext {
    pub const fn new(reason: BugCheckReason, args: [BugCheckArg; 4]) -> Self {
        TerminationContext { reason, args }
    }

    pub const fn empty() -> Self {
        TerminationContext {
            reason: BugCheckReason::NotSpecified,
            args: [0; 4],
        }
    }

    /// KeBugCheckEx 相当に渡す合成コード
    pub const fn stop_code(&self) -> u32 {
        KMOD_FAILURE | self.reason.code()
    }
}

/// dispatcher の致命経路だけを見せる（型パラメータを消すため）
pub trait FatalPath: Sync {
    fn set_context(&self, ctx: TerminationContext) -> TerminationContext;
    fn terminate(&self) -> !;
}

pub struct TerminationDispatcher<P: PriorityControl, H: FatalStop> {
    handler: AtomicPtr<()>,
    context: PrioritySpinLock<TerminationContext, P>,
    stop: H,
}

impl<P: PriorityControl, H: FatalStop> TerminationDispatcher<P, H> {
    pub const fn new(priority: P, stop: H) -> Self {
        TerminationDispatcher {
            handler: AtomicPtr::new(ptr::null_mut()),
            context: PrioritySpinLock::new(TerminationContext::empty(), priority),
            stop,
        }
    }

    pub fn get_handler(&self) -> Option<TerminateHandler> {
        decode_handler(self.handler.load(Ordering::Acquire))
    }

    pub fn set_handler(&self, handler: Option<TerminateHandler>) -> Option<TerminateHandler> {
        let raw = handler.map_or(ptr::null_mut(), |h| h as *mut ());
        decode_handler(self.handler.swap(raw, Ordering::AcqRel))
    }

    pub fn set_context(&self, ctx: TerminationContext) -> TerminationContext {
        let mut current = self.context.lock();
        core::mem::replace(&mut *current, ctx)
    }

    pub fn context(&self) -> TerminationContext {
        *self.context.lock()
    }

    pub fn priority(&self) -> &P {
        self.context.priority()
    }

    /// abort() が lock を握ったまま停止に入ったか
    pub fn is_frozen(&self) -> bool {
        self.context.is_locked()
    }

    pub fn terminate(&self) -> ! {
        if let Some(handler) = self.get_handler() {
            // 戻ってきたら abort へ落ちる
            handler();
        }
        self.abort()
    }

    pub fn abort(&self) -> ! {
        // lock は解放しない（停止で実行ごと凍結する）
        let ctx = *PriorityGuard::leak(self.context.lock());
        self.stop.bug_check(ctx.stop_code(), ctx.args)
    }
}

impl<P, H> FatalPath for TerminationDispatcher<P, H>
where
    P: PriorityControl + Sync,
    H: FatalStop + Sync,
{
    fn set_context(&self, ctx: TerminationContext) -> TerminationContext {
        TerminationDispatcher::set_context(self, ctx)
    }

    fn terminate(&self) -> ! {
        TerminationDispatcher::terminate(self)
    }
}

fn decode_handler(raw: *mut ()) -> Option<TerminateHandler> {
    if raw.is_null() {
        return None;
    }
    // Safety: slot に入るのは set_handler() が fn() から作った値だけ
    Some(unsafe { core::mem::transmute::<*mut (), TerminateHandler>(raw) })
}
