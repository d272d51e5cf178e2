// kmod-rt/src/crt/state_ref.rs
//
// 役割:
// - panic handler から termination dispatcher にたどり着くための “唯一の入口”。
//
// やること:
// - &'static dyn FatalPath を 1 回だけ登録する（2 回目以降は無視）
// - 呼び出し側は dispatcher() 経由でのみ参照を得る
//
// やらないこと:
// - dispatcher の所有（所有は ModuleRuntime を宣言した static 側）

use spin::Once;

use super::termination::FatalPath;

static DISPATCHER: Once<&'static dyn FatalPath> = Once::new();

/// dispatcher を登録する（driver entry から呼ぶ）。既に登録済みなら false。
pub fn register_dispatcher(d: &'static dyn FatalPath) -> bool {
    let mut installed = false;
    DISPATCHER.call_once(|| {
        installed = true;
        d
    });
    installed
}

/// 登録済みの dispatcher（panic 経路はこれだけ使う）
pub fn dispatcher() -> Option<&'static dyn FatalPath> {
    DISPATCHER.get().copied()
}

pub fn is_registered() -> bool {
    DISPATCHER.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crt::termination::TerminationContext;

    struct Inert;

    impl FatalPath for Inert {
        fn set_context(&self, ctx: TerminationContext) -> TerminationContext {
            ctx
        }

        fn terminate(&self) -> ! {
            panic!("terminate")
        }
    }

    static FIRST: Inert = Inert;
    static SECOND: Inert = Inert;

    #[test]
    fn only_first_registration_sticks() {
        assert!(register_dispatcher(&FIRST));
        assert!(!register_dispatcher(&SECOND));
        assert!(is_registered());

        let d = dispatcher().expect("registered");
        assert!(core::ptr::addr_eq(d as *const dyn FatalPath, &FIRST as *const Inert));
    }
}
