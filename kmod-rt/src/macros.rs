// kmod-rt/src/macros.rs
//
// ドライバ側の配線を 1 か所で宣言するためのマクロ。

/// モジュール全体の `ModuleRuntime` と、ホストに渡す entry/unload 入口を宣言する。
///
/// ```ignore
/// kmod_rt::kmod_driver! {
///     static RUNTIME: ModuleRuntime<InterruptMask, CpuBugCheck> =
///         ModuleRuntime::new(InterruptMask, CpuBugCheck);
///     entry = my_driver_entry;
///     constructors = ConstructorTable::new(&MY_CTORS);
/// }
/// ```
///
/// 生成されるもの:
/// - `kmod_driver_entry(obj, path) -> NtStatus`: dispatcher を panic 経路に登録してから load する
/// - `kmod_driver_unload(obj)`: 成功時に `obj.driver_unload` へ設置される unload 入口
#[macro_export]
macro_rules! kmod_driver {
    (
        $vis:vis static $rt:ident : $ty:ty = $init:expr;
        entry = $entry:path;
        constructors = $ctors:expr;
    ) => {
        $vis static $rt: $ty = $init;

        pub fn kmod_driver_entry(
            obj: &mut $crate::types::DriverObject,
            path: &$crate::types::RegistryPath<'_>,
        ) -> $crate::types::NtStatus {
            let _ = $crate::crt::state_ref::register_dispatcher($rt.termination());
            $rt.load(obj, path, &$ctors, $entry, kmod_driver_unload)
        }

        pub fn kmod_driver_unload(obj: &mut $crate::types::DriverObject) {
            $rt.unload(obj)
        }
    };
}
