//! Register-access primitive shared by the DASICS tables, the gateway and PKU.
//!
//! Every read and write is a single `csrr`/`csrw`; nothing here provides atomicity
//! across execution contexts.

#[cfg(target_arch = "riscv64")]
#[macro_use]
mod macros;
#[cfg(test)]
pub mod mock;

/// An indexed file of XLEN-wide control registers.
pub trait CsrFile {
    fn read(&self, csr: usize) -> usize;

    fn write(&mut self, csr: usize, bits: usize);

    /// Whether `csr` can be reached at all through this file.
    #[inline]
    fn supports(&self, _csr: usize) -> bool {
        true
    }

    /// Read-modify-write of one register.
    #[inline]
    fn modify<F: FnOnce(usize) -> usize>(&mut self, csr: usize, f: F) {
        let bits = self.read(csr);
        self.write(csr, f(bits));
    }
}

impl<R: CsrFile + ?Sized> CsrFile for &mut R {
    #[inline]
    fn read(&self, csr: usize) -> usize {
        (**self).read(csr)
    }

    #[inline]
    fn write(&mut self, csr: usize, bits: usize) {
        (**self).write(csr, bits)
    }

    #[inline]
    fn supports(&self, csr: usize) -> bool {
        (**self).supports(csr)
    }
}

/// Whether `csr` lies in one of the 16-csr `windows`, each named by its first csr.
pub const fn in_windows(csr: usize, windows: &[usize]) -> bool {
    let mut i = 0;
    while i < windows.len() {
        if csr & !0xf == windows[i] {
            return true;
        }
        i += 1;
    }
    false
}

/// The csrs of the executing hart.
#[derive(Clone, Copy, Debug, Default)]
pub struct HartCsrs;

#[cfg(target_arch = "riscv64")]
mod hart {
    csr_access_table!(
        0x5c0, 0x800, 0x880, 0x890, 0x8a0, 0x8c0, 0x8d0, 0x8e0, 0x8f0, 0x900, 0x910,
        0x920, 0x930, 0x940, 0x9c0,
    );
}

/// Csr windows the hart build can address.
#[cfg(target_arch = "riscv64")]
pub use hart::WINDOWS as HART_CSR_WINDOWS;

#[cfg(target_arch = "riscv64")]
impl CsrFile for HartCsrs {
    #[inline]
    fn read(&self, csr: usize) -> usize {
        unsafe { hart::read_dyn(csr) }
    }

    #[inline]
    fn write(&mut self, csr: usize, bits: usize) {
        unsafe { hart::write_dyn(csr, bits) }
    }

    #[inline]
    fn supports(&self, csr: usize) -> bool {
        in_windows(csr, hart::WINDOWS)
    }
}
