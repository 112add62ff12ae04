use crate::common::utils::XLEN;
use crate::csr::in_windows;

/// Which register of a slot's bound pair sits at the lower csr number. The lower
/// one is also written first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundOrder {
    HiLo,
    LoHi,
}

/// Register layout of one capability table for a given hardware revision.
///
/// Slot `i` keeps its cfg field in bank `cfg_banks[i / slots_per_bank]` at bit
/// `(i % slots_per_bank) * stride`, and its bounds in csrs `bound_base + 2 * i` and
/// `bound_base + 2 * i + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableLayout {
    pub capacity: usize,
    /// Distance in bits between two neighbouring cfg fields.
    pub stride: usize,
    /// Bits of a field that carry meaning, relative to the field start.
    pub field_mask: usize,
    pub valid_bit: usize,
    pub cfg_banks: &'static [usize],
    pub bound_base: usize,
    pub bound_order: BoundOrder,
}

/// The two bound csrs of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundCsrs {
    pub lo: usize,
    pub hi: usize,
}

impl TableLayout {
    #[inline]
    pub const fn slots_per_bank(&self) -> usize {
        XLEN / self.stride
    }

    #[inline]
    pub const fn valid_mask(&self) -> usize {
        BIT!(self.valid_bit)
    }

    /// Bank csr holding the cfg field of `index`.
    #[inline]
    pub fn cfg_csr(&self, index: usize) -> usize {
        self.cfg_banks[index / self.slots_per_bank()]
    }

    /// Bit offset of the cfg field of `index` inside its bank.
    #[inline]
    pub fn cfg_shift(&self, index: usize) -> usize {
        (index % self.slots_per_bank()) * self.stride
    }

    pub fn bound_csrs(&self, index: usize) -> BoundCsrs {
        let first = self.bound_base + 2 * index;
        match self.bound_order {
            BoundOrder::HiLo => BoundCsrs { hi: first, lo: first + 1 },
            BoundOrder::LoHi => BoundCsrs { lo: first, hi: first + 1 },
        }
    }

    /// Bound writes for a slot, in the order the revision expects them.
    pub fn bound_writes(&self, index: usize, lo: usize, hi: usize) -> [(usize, usize); 2] {
        let csrs = self.bound_csrs(index);
        match self.bound_order {
            BoundOrder::HiLo => [(csrs.hi, hi), (csrs.lo, lo)],
            BoundOrder::LoHi => [(csrs.lo, lo), (csrs.hi, hi)],
        }
    }

    /// Checks that the fields fit their stride and the banks cover the capacity.
    pub fn is_consistent(&self) -> bool {
        self.stride != 0
            && self.stride <= XLEN
            && XLEN % self.stride == 0
            && self.valid_bit < self.stride
            && self.field_mask & self.valid_mask() != 0
            && (self.stride == XLEN || self.field_mask & !MASK!(self.stride) == 0)
            && self.capacity != 0
            && self.cfg_banks.len() * self.slots_per_bank() >= self.capacity
    }

    /// Every csr the table can touch: the cfg banks, then the bound pairs.
    pub fn csr_numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.cfg_banks
            .iter()
            .copied()
            .chain(self.bound_base..self.bound_base + 2 * self.capacity)
    }

    /// Compile-time form of checking [`Self::csr_numbers`] against `windows`.
    pub const fn fits_windows(&self, windows: &[usize]) -> bool {
        let mut i = 0;
        while i < self.cfg_banks.len() {
            if !in_windows(self.cfg_banks[i], windows) {
                return false;
            }
            i += 1;
        }
        let mut csr = self.bound_base;
        while csr < self.bound_base + 2 * self.capacity {
            if !in_windows(csr, windows) {
                return false;
            }
            csr += 1;
        }
        true
    }
}

/// Csrs of the main-call gateway. `free_zone_return_pc` is absent on revisions
/// with a single return pc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GatewayLayout {
    pub main_cfg: usize,
    pub main_bound_hi: usize,
    pub main_bound_lo: usize,
    pub maincall_entry: usize,
    pub return_pc: usize,
    pub free_zone_return_pc: Option<usize>,
}

impl GatewayLayout {
    pub const fn fits_windows(&self, windows: &[usize]) -> bool {
        let fz = match self.free_zone_return_pc {
            Some(csr) => in_windows(csr, windows),
            None => true,
        };
        fz && in_windows(self.main_cfg, windows)
            && in_windows(self.main_bound_hi, windows)
            && in_windows(self.main_bound_lo, windows)
            && in_windows(self.maincall_entry, windows)
            && in_windows(self.return_pc, windows)
    }
}
