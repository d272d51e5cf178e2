// kmod-rt/src/crt/lifecycle.rs
//
// モジュールの load/unload をラップする状態機械。
//
// [設計上の不変条件（このモジュールにおける仕様）]
//
// 1. Load
//    - コンストラクタ表 → ドライバ entry の順。entry より前に ctor は 1 回だけ走る。
//    - entry 失敗: その場で Unload を実行し、失敗ステータスをそのまま返す。
//      （構築済みで未破棄のグローバルを残さない）
//    - entry 成功: ドライバが設定した unload を捕獲し、自分の unload に差し替える。
//
// 2. Unload
//    - 捕獲したドライバ unload があれば先に呼ぶ（グローバル破棄より前）。
//    - その後デストラクタを LIFO で全部流す。戻り値なし（常に成功扱い）。
//
// 3. 状態の所有
//    - termination dispatcher / destructor registry / 捕獲した unload は
//      ModuleRuntime 1 つにまとめる（ambient な static を散らさない）。

use log::{info, warn};
use spin::Mutex;

use super::constructors::{run_constructors, ConstructorTable};
use super::destructors::{DestructorRegistry, DESTRUCTOR_CAPACITY};
use super::seh;
use super::termination::{TerminationContext, TerminationDispatcher};
use super::trace::{trace_lifecycle, LifecycleEvent};
use crate::arch::FatalStop;
use crate::error::Result;
use crate::sync::PriorityControl;
use crate::types::{
    Destructor, DriverEntry, DriverObject, DriverUnload, NtStatus, RegistryPath, TerminateHandler,
};

pub struct ModuleRuntime<P, H, const N: usize = DESTRUCTOR_CAPACITY>
where
    P: PriorityControl,
    H: FatalStop,
{
    termination: TerminationDispatcher<P, H>,
    destructors: DestructorRegistry<N>,
    driver_unload: Mutex<Option<DriverUnload>>,
}

impl<P, H, const N: usize> ModuleRuntime<P, H, N>
where
    P: PriorityControl,
    H: FatalStop,
{
    pub const fn new(priority: P, stop: H) -> Self {
        ModuleRuntime {
            termination: TerminationDispatcher::new(priority, stop),
            destructors: DestructorRegistry::new(),
            driver_unload: Mutex::new(None),
        }
    }

    //
    // Load / Unload
    //

    /// ホストカーネルの entry から呼ぶ。
    ///
    /// `runtime_unload` はこのランタイムの unload 入口（`self.unload` へ転送する関数）。
    /// 成功時にドライバの unload と差し替えて `obj` に設定する。
    pub fn load(
        &self,
        obj: &mut DriverObject,
        path: &RegistryPath<'_>,
        ctors: &ConstructorTable<'_>,
        entry: DriverEntry,
        runtime_unload: DriverUnload,
    ) -> NtStatus {
        let ran = run_constructors(ctors);
        trace_lifecycle(obj.name, LifecycleEvent::ConstructorsRan(ran));

        let status = entry(obj, path);
        trace_lifecycle(obj.name, LifecycleEvent::EntryReturned(status));

        if !status.is_success() {
            warn!("module {}: driver entry failed with {}; tearing down", obj.name, status);
            self.unload(obj);
            return status;
        }

        let driver_hook = obj.driver_unload.replace(runtime_unload);
        trace_lifecycle(
            obj.name,
            LifecycleEvent::UnloadHookCaptured {
                driver_hook: driver_hook.is_some(),
            },
        );
        *self.driver_unload.lock() = driver_hook;

        info!("module {}: loaded ({} constructors)", obj.name, ran);
        status
    }

    /// ドライバ unload → デストラクタ全実行
    pub fn unload(&self, obj: &mut DriverObject) {
        // 呼ぶ前に lock を離す（hook の中から runtime を触ってもよい）
        let driver_hook = self.driver_unload.lock().take();
        if let Some(hook) = driver_hook {
            hook(obj);
            trace_lifecycle(obj.name, LifecycleEvent::DriverUnloadCalled);
        }

        let ran = self.destructors.run_all();
        trace_lifecycle(obj.name, LifecycleEvent::DestructorsRan(ran));
        info!("module {}: unloaded ({} destructors)", obj.name, ran);
    }

    pub fn has_driver_unload(&self) -> bool {
        self.driver_unload.lock().is_some()
    }

    //
    // atexit / terminate 系の入口
    //

    pub fn register_destructor(&self, dtor: Destructor) -> Result<()> {
        self.destructors.register(dtor)
    }

    pub fn register_destructor_raw(&self, dtor: Option<Destructor>) -> Result<()> {
        self.destructors.register_raw(dtor)
    }

    pub fn get_terminate(&self) -> Option<TerminateHandler> {
        self.termination.get_handler()
    }

    pub fn set_terminate(&self, handler: Option<TerminateHandler>) -> Option<TerminateHandler> {
        self.termination.set_handler(handler)
    }

    pub fn set_termination_context(&self, ctx: TerminationContext) -> TerminationContext {
        self.termination.set_context(ctx)
    }

    pub fn terminate(&self) -> ! {
        self.termination.terminate()
    }

    pub fn abort(&self) -> ! {
        self.termination.abort()
    }

    pub fn termination(&self) -> &TerminationDispatcher<P, H> {
        &self.termination
    }

    pub fn destructors(&self) -> &DestructorRegistry<N> {
        &self.destructors
    }
}

impl<P, H, const N: usize> ModuleRuntime<P, H, N>
where
    P: PriorityControl + Sync,
    H: FatalStop + Sync,
{
    pub fn verify_seh(&self, code: NtStatus, addr: usize, flags: u32) {
        seh::verify_seh(&self.termination, code, addr, flags)
    }

    pub fn verify_seh_in_cxx_handler(
        &self,
        code: NtStatus,
        addr: usize,
        flags: u32,
        unwind_info: u32,
        image_base: usize,
    ) {
        seh::verify_seh_in_cxx_handler(&self.termination, code, addr, flags, unwind_info, image_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BugCheckArg;
    use std::sync::Mutex as StdMutex;

    struct NoPriority;

    impl PriorityControl for NoPriority {
        type Level = ();
        fn raise_to_high(&self) {}
        fn lower(&self, _: ()) {}
    }

    struct NeverStop;

    impl FatalStop for NeverStop {
        fn bug_check(&self, code: u32, _: [BugCheckArg; 4]) -> ! {
            panic!("unexpected bug check {:#x}", code)
        }
    }

    type Runtime = ModuleRuntime<NoPriority, NeverStop>;

    fn runtime_unload_stub(_: &mut DriverObject) {}

    #[test]
    fn failed_entry_tears_down_and_returns_status() {
        static RT: Runtime = ModuleRuntime::new(NoPriority, NeverStop);
        static EVENTS: StdMutex<Vec<&str>> = StdMutex::new(Vec::new());

        fn ctor() {
            EVENTS.lock().unwrap().push("ctor");
            RT.register_destructor(dtor).unwrap();
        }
        fn dtor() {
            EVENTS.lock().unwrap().push("dtor");
        }
        fn driver_unload(_: &mut DriverObject) {
            EVENTS.lock().unwrap().push("driver_unload");
        }
        fn failing_entry(obj: &mut DriverObject, _: &RegistryPath<'_>) -> NtStatus {
            EVENTS.lock().unwrap().push("entry");
            obj.driver_unload = Some(driver_unload);
            NtStatus::INSUFFICIENT_RESOURCES
        }

        static CTORS: [Option<fn()>; 1] = [Some(ctor)];
        let mut obj = DriverObject::new("failing");
        let status = RT.load(
            &mut obj,
            &RegistryPath::new("\\Registry\\Machine\\failing"),
            &ConstructorTable::new(&CTORS),
            failing_entry,
            runtime_unload_stub,
        );

        assert_eq!(status, NtStatus::INSUFFICIENT_RESOURCES);
        assert_eq!(*EVENTS.lock().unwrap(), ["ctor", "entry", "dtor"]);
        assert!(RT.destructors().is_empty());
        assert!(!RT.has_driver_unload());
    }

    #[test]
    fn successful_load_swaps_unload_hook() {
        static RT: Runtime = ModuleRuntime::new(NoPriority, NeverStop);
        static EVENTS: StdMutex<Vec<&str>> = StdMutex::new(Vec::new());

        fn dtor_first() {
            EVENTS.lock().unwrap().push("dtor_first");
        }
        fn dtor_second() {
            EVENTS.lock().unwrap().push("dtor_second");
        }
        fn driver_unload(_: &mut DriverObject) {
            EVENTS.lock().unwrap().push("driver_unload");
        }
        fn entry(obj: &mut DriverObject, path: &RegistryPath<'_>) -> NtStatus {
            assert_eq!(path.as_str(), "cfg");
            RT.register_destructor(dtor_first).unwrap();
            RT.register_destructor(dtor_second).unwrap();
            obj.driver_unload = Some(driver_unload);
            NtStatus::SUCCESS
        }
        fn runtime_unload(obj: &mut DriverObject) {
            RT.unload(obj)
        }

        let mut obj = DriverObject::new("ok");
        let status = RT.load(
            &mut obj,
            &RegistryPath::new("cfg"),
            &ConstructorTable::EMPTY,
            entry,
            runtime_unload,
        );
        assert!(status.is_success());
        assert!(RT.has_driver_unload());
        assert_eq!(
            obj.driver_unload.map(|f| f as usize),
            Some(runtime_unload as DriverUnload as usize)
        );
        assert!(EVENTS.lock().unwrap().is_empty());

        // ホストは obj に設定された unload を呼ぶ
        let hook = obj.driver_unload.expect("runtime unload installed");
        hook(&mut obj);

        assert_eq!(
            *EVENTS.lock().unwrap(),
            ["driver_unload", "dtor_second", "dtor_first"]
        );
        assert!(RT.destructors().is_empty());
        assert!(!RT.has_driver_unload());
    }

    #[test]
    fn unload_without_driver_hook_only_drains() {
        static RT: Runtime = ModuleRuntime::new(NoPriority, NeverStop);

        fn entry(_: &mut DriverObject, _: &RegistryPath<'_>) -> NtStatus {
            NtStatus::SUCCESS
        }
        fn noop() {}

        let mut obj = DriverObject::new("plain");
        let status = RT.load(
            &mut obj,
            &RegistryPath::new(""),
            &ConstructorTable::EMPTY,
            entry,
            runtime_unload_stub,
        );
        assert!(status.is_success());
        assert!(!RT.has_driver_unload());

        RT.register_destructor(noop).unwrap();
        RT.unload(&mut obj);
        assert!(RT.destructors().is_empty());
    }
}
