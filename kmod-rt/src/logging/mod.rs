// kmod-rt/src/logging/mod.rs
//
// 診断出力の配線。
// - ランタイム内部は log facade（log::info! など）だけを使う。
// - 実際の出力先（COM1）は serial_logger feature の時だけ組み込む。
// - 出力先に届かないこと自体はエラーにしない。

#[cfg(all(feature = "serial_logger", target_arch = "x86_64"))]
mod serial;

#[cfg(all(feature = "serial_logger", target_arch = "x86_64"))]
pub use serial::SerialLogger;

use log::LevelFilter;

/// ロガーを 1 回だけ設置する。既に誰かが設置していれば false。
#[cfg(all(feature = "serial_logger", target_arch = "x86_64"))]
pub fn init(level: LevelFilter) -> bool {
    static LOGGER: SerialLogger = SerialLogger::new();

    LOGGER.init_port();
    match log::set_logger(&LOGGER) {
        Ok(()) => {
            log::set_max_level(level);
            true
        }
        Err(_) => false,
    }
}

/// 出力先が無い構成では最大レベルだけ設定する
#[cfg(not(all(feature = "serial_logger", target_arch = "x86_64")))]
pub fn init(level: LevelFilter) -> bool {
    log::set_max_level(level);
    false
}
