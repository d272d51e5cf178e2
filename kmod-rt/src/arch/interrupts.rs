// kmod-rt/src/arch/interrupts.rs
//
// 役割:
// - 「最高優先度へ引き上げる」を x86_64 の割り込みマスクで表現する。
//
// 設計方針:
// - raise: 割り込みが有効だったかを記録してから cli
// - lower: 記録が「有効」だった時だけ sti（ネストした区間で勝手に開けない）
// - lock は取らない（fatal 経路からも呼ばれる）

use x86_64::instructions::interrupts;

use crate::sync::PriorityControl;

/// 引き上げ前の状態（割り込みが有効だったか）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedInterruptState {
    pub were_enabled: bool,
}

/// ローカル CPU の割り込みを止めることで「最高優先度」を作る
#[derive(Clone, Copy, Debug, Default)]
pub struct InterruptMask;

impl PriorityControl for InterruptMask {
    type Level = SavedInterruptState;

    #[inline]
    fn raise_to_high(&self) -> SavedInterruptState {
        let were_enabled = interrupts::are_enabled();
        if were_enabled {
            interrupts::disable();
        }
        SavedInterruptState { were_enabled }
    }

    #[inline]
    fn lower(&self, prev: SavedInterruptState) {
        if prev.were_enabled {
            interrupts::enable();
        }
    }
}
