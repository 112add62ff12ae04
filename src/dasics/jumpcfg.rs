//! Jump capability table: whitelisted targets of indirect branches out of a
//! library.

use crate::common::structures::DasicsError;
use crate::csr::CsrFile;

use super::layout::TableLayout;
use super::table::CapTable;

pub struct JumpTable<R: CsrFile> {
    table: CapTable<R>,
}

impl<R: CsrFile> JumpTable<R> {
    pub fn new(layout: TableLayout, csrs: R) -> Self {
        Self { table: CapTable::new(layout, csrs) }
    }

    pub fn try_new(layout: TableLayout, csrs: R) -> Result<Self, DasicsError> {
        CapTable::try_new(layout, csrs).map(|table| Self { table })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    #[inline]
    pub fn inner(&self) -> &CapTable<R> {
        &self.table
    }

    pub fn alloc(&mut self, lo: usize, hi: usize) -> Result<usize, DasicsError> {
        self.table.alloc(0, lo, hi)
    }

    pub fn free(&mut self, index: usize) -> Result<(), DasicsError> {
        self.table.free(index)
    }

    /// Valid bit of `index`, 1 when allocated.
    pub fn get(&self, index: usize) -> Result<usize, DasicsError> {
        self.table.is_valid(index).map(usize::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use crate::csr::mock::MockCsrFile;

    #[test]
    fn four_slots_sixteen_bits_apart() {
        let mut t = JumpTable::new(JUMPCFG_LAYOUT_4, MockCsrFile::new());
        for i in 0..4 {
            assert_eq!(t.alloc(0x4000 + i, 0x5000 + i), Ok(i));
        }
        assert_eq!(t.inner().csrs().get(CSR_DJCFG), 0x0001_0001_0001_0001);
        assert_eq!(t.alloc(0, 0), Err(DasicsError::Exhausted));
        assert_eq!(t.inner().csrs().get(CSR_DJBOUND0LO + 2), 0x4001);
        assert_eq!(t.inner().csrs().get(CSR_DJBOUND0LO + 3), 0x5001);
    }

    #[test]
    fn get_reports_valid_bit() {
        let mut t = JumpTable::new(JUMPCFG_LAYOUT_4, MockCsrFile::new());
        let index = t.alloc(0x10, 0x20).unwrap();
        assert_eq!(t.get(index), Ok(1));
        assert_eq!(t.get(index + 1), Ok(0));
        t.free(index).unwrap();
        assert_eq!(t.get(index), Ok(0));
        assert_eq!(t.get(4), Err(DasicsError::InvalidIndex));
    }

    #[test]
    fn alloc_rewrites_field_free_clears_valid_only() {
        let csrs = MockCsrFile::new().with(CSR_DJCFG, 0x00f0);
        let mut t = JumpTable::new(JUMPCFG_LAYOUT_4, csrs);
        assert_eq!(t.alloc(0x10, 0x20), Ok(0));
        assert_eq!(t.inner().csrs().get(CSR_DJCFG), 0x0001);
        let mut t = JumpTable::new(JUMPCFG_LAYOUT_4, MockCsrFile::new().with(CSR_DJCFG, 0x00f1));
        t.free(0).unwrap();
        assert_eq!(t.inner().csrs().get(CSR_DJCFG), 0x00f0);
    }

    #[test]
    fn thirty_two_slot_revision() {
        let mut t = JumpTable::new(JUMPCFG_LAYOUT_32, MockCsrFile::new());
        for i in 0..32 {
            assert_eq!(t.alloc(i, i + 1), Ok(i));
        }
        assert_eq!(t.alloc(0, 0), Err(DasicsError::Exhausted));
        t.free(31).unwrap();
        assert_eq!(t.get(31), Ok(0));
        assert_eq!(t.alloc(0, 0), Ok(31));
    }
}
