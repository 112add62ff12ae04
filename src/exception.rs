//! DASICS exception causes raised when a library oversteps its capabilities.

use log::debug;

pub const EXC_DASICS_UFETCH_FAULT: usize = 24;
pub const EXC_DASICS_SFETCH_FAULT: usize = 25;
pub const EXC_DASICS_ULOAD_FAULT: usize = 26;
pub const EXC_DASICS_SLOAD_FAULT: usize = 27;
pub const EXC_DASICS_USTORE_FAULT: usize = 28;
pub const EXC_DASICS_SSTORE_FAULT: usize = 29;
pub const EXC_DASICS_UECALL_FAULT: usize = 30;
pub const EXC_DASICS_SECALL_FAULT: usize = 31;

const SCAUSE_INTERRUPT: usize = 1 << (usize::BITS - 1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DasicsAccess {
    Fetch,
    Load,
    Store,
    Ecall,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DasicsFault {
    pub access: DasicsAccess,
    /// Raised from U-mode (otherwise S-mode).
    pub user: bool,
}

impl DasicsFault {
    /// Decodes `scause`; anything that is not a DASICS exception gives `None`.
    pub fn from_scause(scause: usize) -> Option<Self> {
        if scause & SCAUSE_INTERRUPT != 0 {
            return None;
        }
        let (access, user) = match scause {
            EXC_DASICS_UFETCH_FAULT => (DasicsAccess::Fetch, true),
            EXC_DASICS_SFETCH_FAULT => (DasicsAccess::Fetch, false),
            EXC_DASICS_ULOAD_FAULT => (DasicsAccess::Load, true),
            EXC_DASICS_SLOAD_FAULT => (DasicsAccess::Load, false),
            EXC_DASICS_USTORE_FAULT => (DasicsAccess::Store, true),
            EXC_DASICS_SSTORE_FAULT => (DasicsAccess::Store, false),
            EXC_DASICS_UECALL_FAULT => (DasicsAccess::Ecall, true),
            EXC_DASICS_SECALL_FAULT => (DasicsAccess::Ecall, false),
            _ => return None,
        };
        Some(Self { access, user })
    }

    pub fn code(&self) -> usize {
        let base = match self.access {
            DasicsAccess::Fetch => EXC_DASICS_UFETCH_FAULT,
            DasicsAccess::Load => EXC_DASICS_ULOAD_FAULT,
            DasicsAccess::Store => EXC_DASICS_USTORE_FAULT,
            DasicsAccess::Ecall => EXC_DASICS_UECALL_FAULT,
        };
        if self.user {
            base
        } else {
            base + 1
        }
    }
}

/// Classifies a trap for the kernel's trap handler. `stval` carries the faulting
/// address for fetch / load / store faults.
pub fn handle_dasics_fault(scause: usize, stval: usize) -> Option<DasicsFault> {
    let fault = DasicsFault::from_scause(scause)?;
    debug!(
        "DASICS {:?} fault from {}-mode at {:#x}",
        fault.access,
        if fault.user { 'U' } else { 'S' },
        stval
    );
    Some(fault)
}
