// kmod-rt/src/crt/trace.rs
//
// 低コスト trace（観測性）を 1 箇所に集約する。
// - load/unload の各段階（ctor 実行数, entry の戻り値, unload hook の有無, dtor 実行数）
//
// 設計方針:
// - feature off ではコンパイルで消える（fatal 経路の近くでも安心して呼べる）
// - heap 確保なし（固定文字列 + 数値）
//
// feature:
// - lifecycle_trace: 各段階で 1 行を必ず出す

use crate::types::NtStatus;

// ★重要：LifecycleEvent は “常に存在” させる（feature off でもコンパイル可能にする）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    ConstructorsRan(usize),
    EntryReturned(NtStatus),
    UnloadHookCaptured { driver_hook: bool },
    DriverUnloadCalled,
    DestructorsRan(usize),
}

#[inline(always)]
pub fn trace_lifecycle(module: &str, ev: LifecycleEvent) {
    #[cfg(feature = "lifecycle_trace")]
    {
        match ev {
            LifecycleEvent::ConstructorsRan(n) => {
                log::info!("lifecycle_trace module={} ctors_ran={}", module, n)
            }
            LifecycleEvent::EntryReturned(status) => {
                log::info!("lifecycle_trace module={} entry_status={}", module, status)
            }
            LifecycleEvent::UnloadHookCaptured { driver_hook } => {
                log::info!("lifecycle_trace module={} driver_unload={}", module, driver_hook)
            }
            LifecycleEvent::DriverUnloadCalled => {
                log::info!("lifecycle_trace module={} driver_unload=called", module)
            }
            LifecycleEvent::DestructorsRan(n) => {
                log::info!("lifecycle_trace module={} dtors_ran={}", module, n)
            }
        }
    }
    #[cfg(not(feature = "lifecycle_trace"))]
    {
        let _ = module;
        let _ = ev;
    }
}
