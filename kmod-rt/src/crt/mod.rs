// kmod-rt/src/crt/mod.rs
//
// freestanding C++ ランタイム相当の本体
// - constructors: 静的初期化（前から順に 1 回）
// - destructors: atexit 相当（固定容量 LIFO）
// - termination: terminate / abort / handler slot / termination context
// - seh: unwind 中の非 C++ フレーム検出
// - lifecycle: load/unload ラッパ（上の 4 つを束ねる ModuleRuntime）
// - trace / state_ref / panic: 観測性と panic 経路の配線

pub mod constructors;
pub mod destructors;
pub mod lifecycle;
pub mod panic;
pub mod seh;
pub mod state_ref;
pub mod termination;
pub mod trace;

pub use constructors::{run_constructors, ConstructorTable};
pub use destructors::{DestructorRegistry, DESTRUCTOR_CAPACITY};
pub use lifecycle::ModuleRuntime;
pub use seh::{verify_seh, verify_seh_in_cxx_handler, ExceptionFlags};
pub use termination::{
    BugCheckReason, FatalPath, TerminationContext, TerminationDispatcher, KMOD_FAILURE,
};
