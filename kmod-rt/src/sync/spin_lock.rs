// kmod-rt/src/sync/spin_lock.rs
//
// 役割:
// - 「優先度を最高まで上げてから 1bit lock を spin で取る」プリミティブ。
//
// やること:
// - acquire: raise → spin::Mutex を test-and-test-and-set で取る
// - release: lock bit を落とす → 記録しておいた優先度へ戻す
// - leak: 停止直前に lock を握ったまま中身だけ取り出す
//
// やらないこと:
// - 優先度そのものの実装（PriorityControl の実装側 = arch / テストの責務）
// - 公平性（キューイングしない。最後に書いた者が勝つ）

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

/// 実行優先度の引き上げ/復帰（ホストが提供する）
///
/// `raise_to_high` の間、呼び出し元はローカル CPU 上で割り込まれない。
pub trait PriorityControl {
    type Level: Copy;

    fn raise_to_high(&self) -> Self::Level;
    fn lower(&self, prev: Self::Level);
}

impl<T: PriorityControl + ?Sized> PriorityControl for &T {
    type Level = T::Level;

    fn raise_to_high(&self) -> Self::Level {
        (**self).raise_to_high()
    }

    fn lower(&self, prev: Self::Level) {
        (**self).lower(prev)
    }
}

pub struct PrioritySpinLock<T, P: PriorityControl> {
    priority: P,
    inner: spin::Mutex<T>,
}

impl<T, P: PriorityControl> PrioritySpinLock<T, P> {
    pub const fn new(value: T, priority: P) -> Self {
        PrioritySpinLock {
            priority,
            inner: spin::Mutex::new(value),
        }
    }

    /// 優先度を上げてから spin で取得する（順序は逆にしない）
    pub fn lock(&self) -> PriorityGuard<'_, T, P> {
        let prev = self.priority.raise_to_high();
        // spin::Mutex は CAS 失敗後に is_locked() だけを読んで待つ
        let guard = self.inner.lock();
        PriorityGuard {
            guard: ManuallyDrop::new(guard),
            priority: &self.priority,
            prev,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    pub fn priority(&self) -> &P {
        &self.priority
    }
}

pub struct PriorityGuard<'a, T, P: PriorityControl> {
    guard: ManuallyDrop<spin::MutexGuard<'a, T>>,
    priority: &'a P,
    prev: P::Level,
}

impl<'a, T, P: PriorityControl> PriorityGuard<'a, T, P> {
    /// lock を握ったまま（優先度も上げたまま）中身を返す。停止経路専用。
    pub fn leak(this: Self) -> &'a mut T {
        let mut this = ManuallyDrop::new(this);
        // Safety: this は二度と drop されないので guard を取り出してよい
        let guard = unsafe { ManuallyDrop::take(&mut this.guard) };
        spin::MutexGuard::leak(guard)
    }
}

impl<T, P: PriorityControl> Deref for PriorityGuard<'_, T, P> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T, P: PriorityControl> DerefMut for PriorityGuard<'_, T, P> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T, P: PriorityControl> Drop for PriorityGuard<'_, T, P> {
    fn drop(&mut self) {
        // lock bit を先に落とし、その後で優先度を戻す
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        self.priority.lower(self.prev);
    }
}
