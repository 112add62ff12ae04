use log::debug;

use crate::common::structures::DasicsError;
use crate::csr::CsrFile;

use super::layout::TableLayout;

/// Allocator over one packed capability table.
///
/// There is no shadow bitmap: a slot is free exactly when its valid bit in the cfg
/// bank reads as clear, and every call decodes the banks afresh.
pub struct CapTable<R: CsrFile> {
    layout: TableLayout,
    csrs: R,
}

impl<R: CsrFile> CapTable<R> {
    pub fn new(layout: TableLayout, csrs: R) -> Self {
        debug_assert!(layout.is_consistent());
        Self { layout, csrs }
    }

    /// Like [`Self::new`], for layouts chosen at run time: refuses a layout whose
    /// fields do not fit its banks or that names a csr `csrs` cannot reach.
    pub fn try_new(layout: TableLayout, csrs: R) -> Result<Self, DasicsError> {
        if !layout.is_consistent() || !layout.csr_numbers().all(|csr| csrs.supports(csr)) {
            return Err(DasicsError::UnsupportedLayout);
        }
        Ok(Self { layout, csrs })
    }

    #[inline]
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.layout.capacity
    }

    #[inline]
    pub fn csrs(&self) -> &R {
        &self.csrs
    }

    #[inline]
    pub fn csrs_mut(&mut self) -> &mut R {
        &mut self.csrs
    }

    #[inline]
    fn check_index(&self, index: usize) -> Result<(), DasicsError> {
        if index < self.layout.capacity {
            Ok(())
        } else {
            Err(DasicsError::InvalidIndex)
        }
    }

    /// Lowest slot whose valid bit is clear, scanning bank by bank.
    fn find_free(&self) -> Option<usize> {
        let per_bank = self.layout.slots_per_bank();
        for (bank, &csr) in self.layout.cfg_banks.iter().enumerate() {
            let bits = self.csrs.read(csr);
            for sub in 0..per_bank {
                let index = bank * per_bank + sub;
                if index >= self.layout.capacity {
                    return None;
                }
                let field = (bits >> (sub * self.layout.stride)) & self.layout.field_mask;
                if field & self.layout.valid_mask() == 0 {
                    return Some(index);
                }
            }
        }
        None
    }

    /// Claims the first free slot for `[lo, hi]` with cfg field `cfg`; the valid bit
    /// is forced on. The bound csrs are written before the cfg bank, so the slot
    /// never reads as valid with stale bounds.
    pub fn alloc(&mut self, cfg: usize, lo: usize, hi: usize) -> Result<usize, DasicsError> {
        let index = self.find_free().ok_or(DasicsError::Exhausted)?;

        for (csr, bits) in self.layout.bound_writes(index, lo, hi) {
            self.csrs.write(csr, bits);
        }

        let mask = self.layout.field_mask;
        let shift = self.layout.cfg_shift(index);
        let field = (cfg | self.layout.valid_mask()) & mask;
        self.csrs.modify(self.layout.cfg_csr(index), |bank| {
            (bank & !(mask << shift)) | (field << shift)
        });

        debug!("cap table alloc slot {}: cfg {:#x} [{:#x}, {:#x}]", index, field, lo, hi);
        Ok(index)
    }

    /// Clears the valid bit of `index`. The bounds are left behind; they are
    /// unreachable once the slot is invalid. Freeing a free slot succeeds.
    pub fn free(&mut self, index: usize) -> Result<(), DasicsError> {
        self.check_index(index)?;
        let valid = self.layout.valid_mask() << self.layout.cfg_shift(index);
        self.csrs.modify(self.layout.cfg_csr(index), |bank| bank & !valid);
        debug!("cap table free slot {}", index);
        Ok(())
    }

    /// Raw cfg field of `index`.
    pub fn get(&self, index: usize) -> Result<usize, DasicsError> {
        self.check_index(index)?;
        let bank = self.csrs.read(self.layout.cfg_csr(index));
        Ok((bank >> self.layout.cfg_shift(index)) & self.layout.field_mask)
    }

    pub fn is_valid(&self, index: usize) -> Result<bool, DasicsError> {
        Ok(self.get(index)? & self.layout.valid_mask() != 0)
    }

    /// Number of slots with the valid bit set.
    pub fn count_valid(&self) -> usize {
        (0..self.layout.capacity)
            .filter(|&i| matches!(self.is_valid(i), Ok(true)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::thread;

    use spin::Mutex;

    use super::*;
    use crate::config::*;
    use crate::csr::mock::{Access, MockCsrFile};
    use crate::dasics::layout::BoundOrder;

    fn table(layout: TableLayout) -> CapTable<MockCsrFile> {
        CapTable::new(layout, MockCsrFile::new())
    }

    #[test]
    fn first_fit_across_gaps() {
        // slots 0, 2, 4 valid; 1, 3 free
        let bank = 0x8 | (0x8 << 16) | (0x8 << 32);
        let mut t = CapTable::new(LIBCFG_LAYOUT_8, MockCsrFile::new().with(CSR_DLCFG0, bank));
        assert_eq!(t.alloc(DASICS_LIBCFG_R, 0x1000, 0x2000), Ok(1));
        assert_eq!(t.alloc(DASICS_LIBCFG_R, 0x3000, 0x4000), Ok(3));
        assert_eq!(t.alloc(DASICS_LIBCFG_R, 0x5000, 0x6000), Ok(5));
    }

    #[test]
    fn alloc_preserves_neighbours() {
        let mut t = CapTable::new(LIBCFG_LAYOUT_16, MockCsrFile::new().with(CSR_DLCFG0, 0x7));
        // slot 0 holds xrw but no valid bit, so it is the first free one
        assert_eq!(t.alloc(DASICS_LIBCFG_W, 0, 0x10), Ok(0));
        assert_eq!(t.csrs().get(CSR_DLCFG0), 0x9);
        assert_eq!(t.alloc(DASICS_LIBCFG_X, 0, 0x10), Ok(1));
        assert_eq!(t.csrs().get(CSR_DLCFG0), 0xc9);
    }

    #[test]
    fn exhaustion_writes_nothing() {
        let mut t = table(LIBCFG_LAYOUT_16);
        for i in 0..16 {
            assert_eq!(t.alloc(DASICS_LIBCFG_R, i * 0x1000, i * 0x1000 + 0xfff), Ok(i));
        }
        let before = t.csrs().snapshot();
        t.csrs().clear_log();
        assert_eq!(t.alloc(DASICS_LIBCFG_R, 0, 0x10), Err(DasicsError::Exhausted));
        assert!(t.csrs().writes().is_empty());
        assert_eq!(t.csrs().snapshot(), before);
    }

    #[test]
    fn bounds_written_before_valid() {
        for layout in [LIBCFG_LAYOUT_8, LIBCFG_LAYOUT_16, LIBCFG_LAYOUT_32, JUMPCFG_LAYOUT_4] {
            let mut t = table(layout);
            for _ in 0..layout.capacity {
                t.csrs().clear_log();
                let index = t.alloc(0, 0xa000, 0xb000).unwrap();
                let bounds = layout.bound_csrs(index);
                let writes = t.csrs().writes();
                let pos = |csr: usize| writes.iter().position(|&(c, _)| c == csr).unwrap();
                let cfg_pos = writes
                    .iter()
                    .position(|&(c, bits)| {
                        c == layout.cfg_csr(index)
                            && (bits >> layout.cfg_shift(index)) & layout.valid_mask() != 0
                    })
                    .unwrap();
                assert!(pos(bounds.lo) < cfg_pos);
                assert!(pos(bounds.hi) < cfg_pos);
                assert_eq!(writes.len(), 3);
            }
        }
    }

    #[test]
    fn hi_lo_revision_writes_high_first() {
        let mut t = table(LIBCFG_LAYOUT_8);
        t.alloc(DASICS_LIBCFG_R, 0x100, 0x200).unwrap();
        assert_eq!(
            t.csrs().writes(),
            [(0x883, 0x200), (0x884, 0x100), (CSR_DLCFG0, 0xa)]
        );
        assert_eq!(t.layout().bound_order, BoundOrder::HiLo);
    }

    #[test]
    fn free_twice_succeeds() {
        let mut t = table(JUMPCFG_LAYOUT_4);
        let index = t.alloc(0, 0x10, 0x20).unwrap();
        assert_eq!(t.free(index), Ok(()));
        assert_eq!(t.free(index), Ok(()));
        assert_eq!(t.is_valid(index), Ok(false));
    }

    #[test]
    fn free_keeps_bounds_and_permissions() {
        let mut t = table(LIBCFG_LAYOUT_16);
        let index = t.alloc(DASICS_LIBCFG_R | DASICS_LIBCFG_W, 0x10, 0x20).unwrap();
        t.free(index).unwrap();
        assert_eq!(t.get(index), Ok(DASICS_LIBCFG_R | DASICS_LIBCFG_W));
        let bounds = t.layout().bound_csrs(index);
        assert_eq!(t.csrs().get(bounds.lo), 0x10);
        assert_eq!(t.csrs().get(bounds.hi), 0x20);
    }

    #[test]
    fn invalid_index_touches_nothing() {
        let mut t = table(LIBCFG_LAYOUT_8);
        assert_eq!(t.free(8), Err(DasicsError::InvalidIndex));
        assert_eq!(t.get(8), Err(DasicsError::InvalidIndex));
        assert_eq!(t.free(usize::MAX), Err(DasicsError::InvalidIndex));
        assert!(t.csrs().log().is_empty());
    }

    #[test]
    fn spill_into_second_bank() {
        let mut t = table(LIBCFG_LAYOUT_32);
        for i in 0..17 {
            assert_eq!(t.alloc(DASICS_LIBCFG_R, 0, 0x10), Ok(i));
        }
        assert_eq!(t.csrs().get(CSR_DLCFG0), 0xaaaa_aaaa_aaaa_aaaa);
        assert_eq!(t.csrs().get(CSR_DLCFG1), 0xa);
        t.free(3).unwrap();
        assert_eq!(t.alloc(DASICS_LIBCFG_X, 0, 0x10), Ok(3));
        t.free(16).unwrap();
        assert_eq!(t.csrs().get(CSR_DLCFG1), 0x2);
        assert_eq!(t.alloc(DASICS_LIBCFG_R, 0, 0x10), Ok(16));
    }

    #[test]
    fn capacity_not_multiple_of_bank() {
        let layout = TableLayout { capacity: 5, ..JUMPCFG_LAYOUT_32 };
        let mut t = table(layout);
        for i in 0..5 {
            assert_eq!(t.alloc(0, 0, 0), Ok(i));
        }
        assert_eq!(t.alloc(0, 0, 0), Err(DasicsError::Exhausted));
        assert_eq!(t.count_valid(), 5);
    }

    #[test]
    fn random_sequences_keep_single_owner() {
        let mut t = table(LIBCFG_LAYOUT_16);
        let mut live = BTreeSet::new();
        let mut seed = 0x2545_f491_4f6c_dd1du64;
        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            if seed % 3 == 0 && !live.is_empty() {
                let victim = *live.iter().nth((seed as usize / 3) % live.len()).unwrap();
                t.free(victim).unwrap();
                live.remove(&victim);
            } else {
                match t.alloc(DASICS_LIBCFG_R, 0, 0x10) {
                    Ok(index) => {
                        assert!(live.insert(index), "slot {} handed out twice", index);
                        let lowest_free = (0..16).find(|i| !live.contains(i) || *i == index);
                        assert_eq!(lowest_free, Some(index));
                    }
                    Err(e) => {
                        assert_eq!(e, DasicsError::Exhausted);
                        assert_eq!(live.len(), 16);
                    }
                }
            }
            assert_eq!(t.count_valid(), live.len());
        }
    }

    #[test]
    fn serialized_contexts_never_share_a_slot() {
        let t = Arc::new(Mutex::new(table(LIBCFG_LAYOUT_16)));
        let owners = Arc::new(Mutex::new(BTreeSet::new()));
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let t = t.clone();
                let owners = owners.clone();
                thread::spawn(move || {
                    for round in 0..100 {
                        let mut held = Vec::new();
                        // hold a few slots across lock releases so others allocate
                        // while they are owned
                        for _ in 0..3 {
                            if let Ok(index) = t.lock().alloc(DASICS_LIBCFG_R, round, round + 1) {
                                assert!(owners.lock().insert(index), "slot {} handed out twice", index);
                                held.push(index);
                            }
                            thread::yield_now();
                        }
                        for index in held {
                            assert!(owners.lock().remove(&index));
                            t.lock().free(index).unwrap();
                        }
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert!(owners.lock().is_empty());
        assert_eq!(t.lock().count_valid(), 0);
    }

    #[test]
    fn nested_context_sees_held_lock() {
        let t = Mutex::new(table(JUMPCFG_LAYOUT_4));
        let mut outer = t.lock();
        let index = outer.alloc(0, 0x10, 0x20).unwrap();
        // a trap taken here must not reach the table behind the holder's back
        assert!(t.try_lock().is_none());
        outer.free(index).unwrap();
        drop(outer);
        assert!(t.try_lock().is_some());
    }

    #[test]
    fn unreachable_layout_refused() {
        const WINDOWS: &[usize] = &[0x880, 0x890, 0x8a0];
        let csrs = || MockCsrFile::new().with_windows(WINDOWS);
        assert!(CapTable::try_new(LIBCFG_LAYOUT_16, csrs()).is_ok());
        assert!(matches!(
            CapTable::try_new(LIBCFG_LAYOUT_32, csrs()),
            Err(DasicsError::UnsupportedLayout)
        ));
        assert!(matches!(
            CapTable::try_new(JUMPCFG_LAYOUT_4, csrs()),
            Err(DasicsError::UnsupportedLayout)
        ));
        let too_small = TableLayout { capacity: 17, ..LIBCFG_LAYOUT_16 };
        assert!(matches!(
            CapTable::try_new(too_small, MockCsrFile::new()),
            Err(DasicsError::UnsupportedLayout)
        ));
    }

    #[test]
    fn cfg_is_reread_before_commit() {
        let mut t = table(LIBCFG_LAYOUT_16);
        t.alloc(DASICS_LIBCFG_R, 0, 0x10).unwrap();
        let log = t.csrs().log();
        let reads = log.iter().filter(|a| **a == Access::Read(CSR_DLCFG0)).count();
        assert_eq!(reads, 2);
        assert_eq!(log.last(), Some(&Access::Write(CSR_DLCFG0, 0xa)));
    }
}
