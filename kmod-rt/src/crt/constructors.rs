// kmod-rt/src/crt/constructors.rs
//
// 静的初期化（グローバルオブジェクトのコンストラクタ表を前から順に 1 回ずつ呼ぶ）
// - 表はビルド時に確定していて、ここでは読むだけ
// - None は空きスロット（リンカが詰め物をすることがある）
// - 例外/fault はここでは捕まえない（termination 側の責務）

use core::fmt;

use crate::types::Constructor;

/// コンストラクタ表（不変・順序付き）
#[derive(Clone, Copy)]
pub struct ConstructorTable<'a> {
    slots: &'a [Option<Constructor>],
}

impl<'a> ConstructorTable<'a> {
    pub const EMPTY: ConstructorTable<'static> = ConstructorTable { slots: &[] };

    pub const fn new(slots: &'a [Option<Constructor>]) -> Self {
        ConstructorTable { slots }
    }

    /// リンカが出す [begin, end) の 2 アドレスから表を作る。
    /// 逆転・空の範囲は空の表として扱う。
    ///
    /// # Safety
    ///
    /// `begin..end` は同じセクション内の、モジュール生存期間中は書き換わらない
    /// `Option<Constructor>` の連続領域でなければならない。
    pub unsafe fn from_bounds(begin: *const Option<Constructor>, end: *const Option<Constructor>) -> Self {
        if begin.is_null() || end <= begin {
            return ConstructorTable { slots: &[] };
        }
        let len = (end as usize - begin as usize) / core::mem::size_of::<Option<Constructor>>();
        ConstructorTable {
            slots: unsafe { core::slice::from_raw_parts(begin, len) },
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &'a [Option<Constructor>] {
        self.slots
    }
}

impl fmt::Debug for ConstructorTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("ConstructorTable")
            .field("slots", &self.slots.len())
            .field("occupied", &occupied)
            .finish()
    }
}

/// 表の先頭から順に、空でないスロットを 1 回ずつ呼ぶ。呼んだ数を返す。
pub fn run_constructors(table: &ConstructorTable<'_>) -> usize {
    let mut invoked = 0;
    for ctor in table.slots().iter().flatten() {
        ctor();
        invoked += 1;
    }
    invoked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ORDER: Mutex<Vec<char>> = Mutex::new(Vec::new());

    fn a() {
        ORDER.lock().unwrap().push('A');
    }
    fn b() {
        ORDER.lock().unwrap().push('B');
    }
    fn c() {
        ORDER.lock().unwrap().push('C');
    }

    #[test]
    fn runs_in_table_order_and_skips_empty_slots() {
        static TABLE: [Option<Constructor>; 5] = [Some(a), None, Some(b), None, Some(c)];

        ORDER.lock().unwrap().clear();
        let table = ConstructorTable::new(&TABLE);
        assert_eq!(run_constructors(&table), 3);
        assert_eq!(*ORDER.lock().unwrap(), ['A', 'B', 'C']);
    }

    #[test]
    fn bounds_build_the_same_view() {
        static TABLE: [Option<Constructor>; 3] = [None, None, None];

        let range = TABLE.as_ptr_range();
        let table = unsafe { ConstructorTable::from_bounds(range.start, range.end) };
        assert_eq!(table.len(), 3);

        let inverted = unsafe { ConstructorTable::from_bounds(range.end, range.start) };
        assert!(inverted.is_empty());
        assert_eq!(run_constructors(&inverted), 0);
    }

    #[test]
    fn empty_table_runs_nothing() {
        assert_eq!(run_constructors(&ConstructorTable::EMPTY), 0);
    }
}
