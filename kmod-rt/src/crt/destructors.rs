// kmod-rt/src/crt/destructors.rs
//
// 役割:
// - atexit 相当。固定容量の LIFO スタックにデストラクタを積み、unload 時に逆順で流す。
//
// 不変条件:
// - count <= N（満杯なら push は失敗を返し、既存の N 個には触らない）
// - slots[i] は i < count の範囲だけ Some
// - run_all() の後は count == 0（空で呼べば何もしない）
//
// 実装メモ:
// - 呼び出し中は lock を離す（デストラクタの中から register してもデッドロックしない）
// - その場合、後から積まれたものが次に呼ばれる

use log::warn;
use spin::Mutex;

use crate::error::{Result, RuntimeError};
use crate::types::Destructor;

/// 標準が要求する 32 より多めに取る
pub const DESTRUCTOR_CAPACITY: usize = 128;

struct DestructorStack<const N: usize> {
    slots: [Option<Destructor>; N],
    count: usize,
}

impl<const N: usize> DestructorStack<N> {
    const fn new() -> Self {
        DestructorStack {
            slots: [None; N],
            count: 0,
        }
    }

    fn push(&mut self, dtor: Destructor) -> Result<()> {
        if self.count >= N {
            return Err(RuntimeError::RegistryFull { capacity: N });
        }
        self.slots[self.count] = Some(dtor);
        self.count += 1;
        Ok(())
    }

    /// decrement してから読む（最後に積んだものが先）
    fn pop(&mut self) -> Option<Destructor> {
        if self.count == 0 {
            return None;
        }
        self.count -= 1;
        self.slots[self.count].take()
    }
}

pub struct DestructorRegistry<const N: usize = DESTRUCTOR_CAPACITY> {
    stack: Mutex<DestructorStack<N>>,
}

impl<const N: usize> DestructorRegistry<N> {
    pub const fn new() -> Self {
        DestructorRegistry {
            stack: Mutex::new(DestructorStack::new()),
        }
    }

    /// デストラクタを積む。失敗 = cleanup は予約されていない。
    pub fn register(&self, dtor: Destructor) -> Result<()> {
        let res = self.stack.lock().push(dtor);
        if let Err(e) = res {
            warn!("destructor not scheduled: {}", e);
        }
        res
    }

    /// C 側の atexit と同じ形（null を受け取りうる）
    pub fn register_raw(&self, dtor: Option<Destructor>) -> Result<()> {
        match dtor {
            Some(d) => self.register(d),
            None => Err(RuntimeError::NullDestructor),
        }
    }

    /// 空になるまで後ろから呼ぶ。呼んだ数を返す。
    pub fn run_all(&self) -> usize {
        let mut invoked = 0;
        loop {
            // guard はこの文の終わりで落ちる
            let next = self.stack.lock().pop();
            match next {
                Some(dtor) => {
                    dtor();
                    invoked += 1;
                }
                None => break,
            }
        }
        invoked
    }

    pub fn len(&self) -> usize {
        self.stack.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for DestructorRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
