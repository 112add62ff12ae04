//! Library (region) capability table.

use bit_field::BitField;

use crate::common::structures::DasicsError;
use crate::config::DASICS_LIBCFG_MASK;
use crate::csr::CsrFile;

use super::layout::TableLayout;
use super::table::CapTable;

/// Cfg field of one library slot: `w`, `r`, `x`, `v` from bit 0 upwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LibCfg {
    bits: usize,
}

impl LibCfg {
    pub fn new(readable: bool, writable: bool, executable: bool) -> Self {
        let mut bits = 0usize;
        bits.set_bit(0, writable);
        bits.set_bit(1, readable);
        bits.set_bit(2, executable);
        Self { bits }
    }

    #[inline]
    pub fn from_bits(bits: usize) -> Self {
        Self { bits: bits & DASICS_LIBCFG_MASK }
    }

    /// Returns the contents of the field as raw bits
    #[inline]
    pub fn bits(&self) -> usize {
        self.bits
    }

    #[inline]
    pub fn writable(&self) -> bool {
        self.bits.get_bit(0)
    }

    #[inline]
    pub fn readable(&self) -> bool {
        self.bits.get_bit(1)
    }

    #[inline]
    pub fn executable(&self) -> bool {
        self.bits.get_bit(2)
    }

    #[inline]
    pub fn valid(&self) -> bool {
        self.bits.get_bit(3)
    }

    /// Same permissions, valid bit ignored.
    #[inline]
    pub fn permissions(&self) -> Self {
        Self { bits: self.bits.get_bits(0..3) }
    }
}

pub struct LibTable<R: CsrFile> {
    table: CapTable<R>,
}

impl<R: CsrFile> LibTable<R> {
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

    /// Grants `perm` on `[lo, hi]` through the lowest free slot.
    pub fn alloc(&mut self, perm: LibCfg, lo: usize, hi: usize) -> Result<usize, DasicsError> {
        self.table.alloc(perm.bits(), lo, hi)
    }

    pub fn free(&mut self, index: usize) -> Result<(), DasicsError> {
        self.table.free(index)
    }

    pub fn get(&self, index: usize) -> Result<LibCfg, DasicsError> {
        self.table.get(index).map(LibCfg::from_bits)
    }
}
