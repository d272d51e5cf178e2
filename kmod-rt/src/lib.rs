// kmod-rt/src/lib.rs
//
// kmod-rt: カーネルドライバ向けの最小ランタイム
//
// - ホスト（カーネル）が C++ ランタイムを提供しない環境で、
//   (a) グローバルの構築/破棄を load/unload に合わせて順序付け
//   (b) terminate / abort 相当の致命停止プロトコル
//   (c) unwind が非 C++ フレームを跨ぐのを検出して制御された停止へ
//   を提供する。
//
// - 割り込み優先度と停止命令はホスト依存なので trait（arch）越しに使う。
// - テストは host 上で std を使って走らせる。

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod crt;
pub mod error;
pub mod logging;
pub mod macros;
pub mod sync;
pub mod types;

pub use arch::FatalStop;
pub use crt::{
    BugCheckReason, ConstructorTable, DestructorRegistry, ExceptionFlags, FatalPath, ModuleRuntime,
    TerminationContext, TerminationDispatcher, DESTRUCTOR_CAPACITY, KMOD_FAILURE,
};
pub use error::RuntimeError;
pub use sync::{PriorityControl, PrioritySpinLock};
pub use types::{
    BugCheckArg, Constructor, Destructor, DriverEntry, DriverObject, DriverUnload, NtStatus,
    RegistryPath, TerminateHandler,
};
