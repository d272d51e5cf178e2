// kmod-rt/tests/common/mod.rs
//
// host 上で走らせるためのホスト primitive の代役。
// - TrackedPriority: 引き上げ中の深さを数える
// - RecordingStop: 停止する代わりに (code, args) を載せて unwind する

#![allow(dead_code)]

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use kmod_rt::{BugCheckArg, FatalStop, PriorityControl};

#[derive(Default)]
pub struct TrackedPriority {
    raised: AtomicUsize,
}

impl TrackedPriority {
    pub const fn new() -> Self {
        TrackedPriority {
            raised: AtomicUsize::new(0),
        }
    }

    pub fn raised(&self) -> usize {
        self.raised.load(Ordering::SeqCst)
    }
}

impl PriorityControl for TrackedPriority {
    type Level = ();

    fn raise_to_high(&self) {
        self.raised.fetch_add(1, Ordering::SeqCst);
    }

    fn lower(&self, _: ()) {
        self.raised.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped {
    pub code: u32,
    pub args: [BugCheckArg; 4],
}

pub struct RecordingStop;

impl FatalStop for RecordingStop {
    fn bug_check(&self, code: u32, args: [BugCheckArg; 4]) -> ! {
        panic::panic_any(Stopped { code, args })
    }
}

/// f が bug check で終わったことを確認して、その引数を返す
pub fn expect_stop(f: impl FnOnce()) -> Stopped {
    let payload = panic::catch_unwind(AssertUnwindSafe(f)).expect_err("fatal path returned");
    *payload
        .downcast::<Stopped>()
        .unwrap_or_else(|_| panic!("stopped by something other than bug_check"))
}
