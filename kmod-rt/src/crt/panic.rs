// kmod-rt/src/crt/panic.rs
//
// Rust の panic を termination protocol に載せる。
// - 挙動は「context(RustPanic, line, column) を設定 → terminate()」に固定する。
// - dispatcher 未登録なら緊急出力（ロック無し） → CPU 停止。
// - 二重 panic は即停止（再入で handler/logger を巻き込まない）。
// - message の文字列化は行わない（ロガーのロックを取りうるため）。
//
// 経路の判定（route_panic）と実行（follow）を分けておく。判定側は host でテストできる。

use core::panic::PanicInfo;
use core::sync::atomic::{AtomicBool, Ordering};

use super::state_ref;
use super::termination::{BugCheckReason, FatalPath, TerminationContext};
use crate::arch;
use crate::types::BugCheckArg;

static PANIC_IN_PROGRESS: AtomicBool = AtomicBool::new(false);

/// panic 位置から termination context を作る
pub const fn panic_context(line: u32, column: u32) -> TerminationContext {
    TerminationContext::new(
        BugCheckReason::RustPanic,
        [line as BugCheckArg, column as BugCheckArg, 0, 0],
    )
}

/// panic 後にどこへ落ちるか
pub enum PanicRoute<'a> {
    /// context 設定済み。terminate() へ
    Terminate(&'a dyn FatalPath),
    /// dispatcher 未登録。緊急出力して停止
    NoDispatcher,
    /// panic 処理中の panic。何も触らず停止
    Reentered,
}

/// 再入判定 → context 設定までを行い、残りの経路を返す
pub fn route_panic<'a>(
    in_progress: &AtomicBool,
    location: Option<(u32, u32)>,
    dispatcher: Option<&'a dyn FatalPath>,
) -> PanicRoute<'a> {
    if in_progress.swap(true, Ordering::AcqRel) {
        return PanicRoute::Reentered;
    }

    let Some(d) = dispatcher else {
        return PanicRoute::NoDispatcher;
    };

    let (line, column) = location.unwrap_or((0, 0));
    d.set_context(panic_context(line, column));
    PanicRoute::Terminate(d)
}

pub fn follow(route: PanicRoute<'_>) -> ! {
    match route {
        PanicRoute::Terminate(d) => d.terminate(),
        PanicRoute::NoDispatcher => {
            emergency_line("[PANIC] no termination dispatcher => halt\n");
            arch::halt_loop()
        }
        PanicRoute::Reentered => {
            emergency_line("[PANIC] re-entered => halt\n");
            arch::halt_loop()
        }
    }
}

pub fn on_panic(info: &PanicInfo<'_>) -> ! {
    let location = info.location().map(|loc| (loc.line(), loc.column()));
    follow(route_panic(
        &PANIC_IN_PROGRESS,
        location,
        state_ref::dispatcher(),
    ))
}

#[cfg(target_arch = "x86_64")]
fn emergency_line(s: &str) {
    arch::emergency::write_str(s);
}

#[cfg(not(target_arch = "x86_64"))]
fn emergency_line(_s: &str) {}

#[cfg(all(feature = "panic_handler", not(test)))]
#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    on_panic(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Mutex;

    /// 設定された context を全部覚えて、terminate で unwind する
    #[derive(Default)]
    struct Recorder {
        contexts: Mutex<Vec<TerminationContext>>,
    }

    struct Terminated;

    impl FatalPath for Recorder {
        fn set_context(&self, ctx: TerminationContext) -> TerminationContext {
            let mut all = self.contexts.lock().unwrap();
            let prev = all.last().copied().unwrap_or_default();
            all.push(ctx);
            prev
        }

        fn terminate(&self) -> ! {
            panic::panic_any(Terminated)
        }
    }

    #[test]
    fn context_carries_location() {
        let ctx = panic_context(42, 7);
        assert_eq!(ctx.reason, BugCheckReason::RustPanic);
        assert_eq!(ctx.args, [42, 7, 0, 0]);
        assert_eq!(ctx.stop_code(), 0x4B4D_0003);
    }

    #[test]
    fn first_panic_records_location_then_terminates() {
        let flag = AtomicBool::new(false);
        let rec = Recorder::default();

        let route = route_panic(&flag, Some((120, 9)), Some(&rec));
        assert!(matches!(route, PanicRoute::Terminate(_)));
        assert_eq!(*rec.contexts.lock().unwrap(), [panic_context(120, 9)]);

        let res = panic::catch_unwind(AssertUnwindSafe(|| follow(route)));
        assert!(res.unwrap_err().is::<Terminated>());
    }

    #[test]
    fn unknown_location_records_zero_words() {
        let flag = AtomicBool::new(false);
        let rec = Recorder::default();

        let route = route_panic(&flag, None, Some(&rec));
        assert!(matches!(route, PanicRoute::Terminate(_)));
        assert_eq!(*rec.contexts.lock().unwrap(), [panic_context(0, 0)]);
    }

    #[test]
    fn missing_dispatcher_falls_back_to_halt() {
        let flag = AtomicBool::new(false);
        let route = route_panic(&flag, Some((1, 1)), None);
        assert!(matches!(route, PanicRoute::NoDispatcher));
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn reentered_panic_halts_without_touching_dispatcher() {
        let flag = AtomicBool::new(false);
        let rec = Recorder::default();

        let _ = route_panic(&flag, Some((5, 5)), Some(&rec));
        let again = route_panic(&flag, Some((6, 6)), Some(&rec));
        assert!(matches!(again, PanicRoute::Reentered));
        assert_eq!(rec.contexts.lock().unwrap().len(), 1);
    }
}
