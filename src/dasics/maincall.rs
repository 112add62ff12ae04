//! Supervisor main-call gateway.
//!
//! A library that needs the kernel jumps to the registered main-call entry. The
//! entry trampoline (`smaincall.S`) calls [`dasics_smaincall`](super::interface),
//! which ends up in [`Gateway::dispatch`], and leaves through `pulpret` to the
//! address held in the return-pc csr. Only the save / restore of that state around
//! the call lives here; the transfer itself belongs to the trampoline.

use bit_field::BitField;
use log::warn;

use crate::common::structures::DasicsError;
use crate::config::DASICS_MAINCFG_MASK;
use crate::csr::CsrFile;

use super::layout::GatewayLayout;

/// Main-call numbers. Unlisted numbers decode to `Unrecognized`, so new calls can
/// be added without changing the meaning of existing ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SmaincallType {
    Unknown,
    Unrecognized(usize),
}

impl SmaincallType {
    pub fn from_raw(raw: usize) -> Self {
        match raw {
            0 => SmaincallType::Unknown,
            n => SmaincallType::Unrecognized(n),
        }
    }

    pub fn raw(&self) -> usize {
        match *self {
            SmaincallType::Unknown => 0,
            SmaincallType::Unrecognized(n) => n,
        }
    }
}

impl From<usize> for SmaincallType {
    fn from(raw: usize) -> Self {
        Self::from_raw(raw)
    }
}

/// DasicsUMainCfg
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MainCfg {
    bits: usize,
}

impl MainCfg {
    #[inline]
    pub fn from_bits(bits: usize) -> Self {
        Self { bits: bits & DASICS_MAINCFG_MASK }
    }

    #[inline]
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Supervisor main zone enabled.
    #[inline]
    pub fn scfg_enabled(&self) -> bool {
        self.bits.get_bit(0)
    }

    /// User main zone enabled.
    #[inline]
    pub fn ucfg_enabled(&self) -> bool {
        self.bits.get_bit(1)
    }

    #[inline]
    pub fn scfg_clear(&self) -> bool {
        self.bits.get_bit(2)
    }

    #[inline]
    pub fn ucfg_clear(&self) -> bool {
        self.bits.get_bit(3)
    }
}

/// Return state of an interrupted library, as held by the return csrs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReturnState {
    pub return_pc: usize,
    pub free_zone_return_pc: Option<usize>,
}

pub struct Gateway<R: CsrFile> {
    layout: GatewayLayout,
    csrs: R,
}

impl<R: CsrFile> Gateway<R> {
    pub fn new(layout: GatewayLayout, csrs: R) -> Self {
        Self { layout, csrs }
    }

    #[inline]
    pub fn csrs(&self) -> &R {
        &self.csrs
    }

    #[inline]
    pub fn csrs_mut(&mut self) -> &mut R {
        &mut self.csrs
    }

    pub fn init_main_bound(&mut self, cfg: usize, hi: usize, lo: usize) {
        self.csrs.write(self.layout.main_cfg, cfg);
        self.csrs.write(self.layout.main_bound_hi, hi);
        self.csrs.write(self.layout.main_bound_lo, lo);
    }

    pub fn main_cfg(&self) -> MainCfg {
        MainCfg::from_bits(self.csrs.read(self.layout.main_cfg))
    }

    pub fn init_entry(&mut self, entry: usize) {
        self.csrs.write(self.layout.maincall_entry, entry);
    }

    pub fn save_return_state(&self) -> ReturnState {
        ReturnState {
            return_pc: self.csrs.read(self.layout.return_pc),
            free_zone_return_pc: self.layout.free_zone_return_pc.map(|csr| self.csrs.read(csr)),
        }
    }

    pub fn restore_return_state(&mut self, state: ReturnState) {
        self.csrs.write(self.layout.return_pc, state.return_pc);
        if let (Some(csr), Some(pc)) = (self.layout.free_zone_return_pc, state.free_zone_return_pc) {
            self.csrs.write(csr, pc);
        }
    }

    fn handle(
        &mut self,
        kind: SmaincallType,
        _arg0: usize,
        _arg1: usize,
        _arg2: usize,
    ) -> Result<usize, DasicsError> {
        match kind {
            SmaincallType::Unknown | SmaincallType::Unrecognized(_) => {
                warn!("Invalid smaincall number {}!", kind.raw());
                Err(DasicsError::UnrecognizedCallKind)
            }
        }
    }

    /// Runs one main call with the return csrs saved around it, so a nested main
    /// call cannot leave the caller with someone else's return address. Calls that
    /// fail produce 0.
    pub fn dispatch(&mut self, kind: SmaincallType, arg0: usize, arg1: usize, arg2: usize) -> usize {
        let saved = self.save_return_state();
        let retval = self.handle(kind, arg0, arg1, arg2).unwrap_or(0);
        self.restore_return_state(saved);
        retval
    }
}
