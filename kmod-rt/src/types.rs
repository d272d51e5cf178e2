/*!
 * types
 *
 * 役割:
 *   - ランタイム全体で共有する素朴な型・定数を集約する。
 *
 * やること:
 *   - コールバック型（constructor / destructor / terminate handler）
 *   - ホストカーネルとの境界型（NtStatus, DriverObject, RegistryPath）
 *   - bugcheck 引数の型
 *
 * やらないこと:
 *   - 割り込み優先度や停止命令などの arch 依存処理。
 *
 * 設計方針:
 *   - 依存を増やさず、共通の型はここに寄せる。
 */

use core::fmt;

/// 静的初期化で呼ばれるコンストラクタ
pub type Constructor = fn();

/// モジュール unload 時に LIFO で呼ばれるデストラクタ
pub type Destructor = fn();

/// terminate() が最後に頼る handler
pub type TerminateHandler = fn();

/// bugcheck に渡す診断ワード（ポインタ幅）
pub type BugCheckArg = usize;

/// ドライバ固有の unload ルーチン
pub type DriverUnload = fn(&mut DriverObject);

/// ドライバ固有のエントリルーチン
pub type DriverEntry = fn(&mut DriverObject, &RegistryPath<'_>) -> NtStatus;

/// ホストカーネルが返す/受け取るステータス。負値が失敗。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NtStatus(pub i32);

impl NtStatus {
    pub const SUCCESS: NtStatus = NtStatus(0);
    pub const UNSUCCESSFUL: NtStatus = NtStatus(0xC000_0001_u32 as i32);
    pub const INSUFFICIENT_RESOURCES: NtStatus = NtStatus(0xC000_009A_u32 as i32);

    /// 最上位ビット（severity=error/warning の片側）が立っていなければ成功
    pub const fn is_success(self) -> bool {
        self.0 >= 0
    }

    /// bugcheck 引数として使うための生の 32bit 値
    pub const fn as_u32(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Debug for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NtStatus({:#010x})", self.as_u32())
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.as_u32())
    }
}

/// ロードされたモジュールのハンドル（ホストカーネルが所有）
pub struct DriverObject {
    pub name: &'static str,

    /// ホストが unload 時に呼ぶルーチン。ドライバ本体が差し替えてよい。
    pub driver_unload: Option<DriverUnload>,
}

impl DriverObject {
    pub const fn new(name: &'static str) -> Self {
        DriverObject {
            name,
            driver_unload: None,
        }
    }
}

impl fmt::Debug for DriverObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverObject")
            .field("name", &self.name)
            .field("has_unload", &self.driver_unload.is_some())
            .finish()
    }
}

/// 設定パス（レジストリキー相当）。中身は解釈しない。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryPath<'a>(pub &'a str);

impl<'a> RegistryPath<'a> {
    pub const fn new(path: &'a str) -> Self {
        RegistryPath(path)
    }

    pub const fn as_str(&self) -> &'a str {
        self.0
    }
}
