// kmod-rt/src/error.rs
//
// 回復可能なエラーだけをここに置く。
// - registry 満杯など「呼び出し側に返して終わり」のもの
// - 致命的な条件は Result にしない（termination dispatcher が握る）

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// デストラクタが積めなかった（= cleanup は予約されていない）
    #[error("destructor registry is full ({capacity} entries)")]
    RegistryFull { capacity: usize },

    #[error("null destructor cannot be registered")]
    NullDestructor,
}

pub type Result<T> = core::result::Result<T, RuntimeError>;
