// kmod-rt/src/sync/mod.rs
//
// fatal 経路でも使える同期プリミティブだけを置く。
// 待機可能オブジェクト（イベント/セマフォ）は使わない。

mod spin_lock;

pub use spin_lock::{PriorityControl, PriorityGuard, PrioritySpinLock};
