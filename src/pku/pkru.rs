use bit_field::BitField;
use log::info;

use crate::config::*;
use crate::csr::CsrFile;

/// Whether the kernel is built with protection-key support.
pub const PKU_ENABLED: bool = cfg!(feature = "ENABLE_PKU");

/// UPKRU
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pkru {
    bits: usize,
}

impl Pkru {
    #[inline]
    pub fn from_bits(bits: usize) -> Self {
        Self { bits }
    }

    /// Returns the contents of the register as raw bits
    #[inline]
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Keys past `PKRU_NUM_PKEYS` have no field and read as disabled.
    #[inline]
    pub fn access_disabled(&self, pkey: u32) -> bool {
        let pkey = pkey as usize;
        pkey >= PKRU_NUM_PKEYS || self.bits.get_bit(pkey * PKRU_BITS_PER_PKEY)
    }

    #[inline]
    pub fn write_disabled(&self, pkey: u32) -> bool {
        let pkey = pkey as usize;
        pkey >= PKRU_NUM_PKEYS || self.bits.get_bit(pkey * PKRU_BITS_PER_PKEY + 1)
    }
}

/// UPKRU value installed at exec time: every key except the default one starts
/// access-disabled, so early clones cannot see pkey-protected data.
pub const fn pkru_init_val() -> usize {
    if !PKU_ENABLED {
        return 0;
    }
    let mut init_val = 0usize;
    let mut i = 1;
    while i < PKRU_NUM_PKEYS {
        init_val |= PKRU_AD_BIT << (i * PKRU_BITS_PER_PKEY);
        i += 1;
    }
    init_val
}

/// Access to the PKU csrs of one hart.
pub struct PkeyControl<R: CsrFile> {
    csrs: R,
}

impl<R: CsrFile> PkeyControl<R> {
    pub fn new(csrs: R) -> Self {
        Self { csrs }
    }

    #[inline]
    pub fn csrs(&self) -> &R {
        &self.csrs
    }

    #[inline]
    pub fn csrs_mut(&mut self) -> &mut R {
        &mut self.csrs
    }

    /// Turns user keys on at boot.
    pub fn init(&mut self) {
        if !PKU_ENABLED {
            return;
        }
        self.enable();
        info!("Protection Key for Userspace enabled");
    }

    pub fn is_enabled(&self) -> bool {
        PKU_ENABLED && self.csrs.read(CSR_SPKCTL) & SPKCTL_PKE != 0
    }

    pub fn enable(&mut self) {
        if PKU_ENABLED {
            self.csrs.modify(CSR_SPKCTL, |spkctl| spkctl | SPKCTL_PKE);
        }
    }

    pub fn disable(&mut self) {
        if PKU_ENABLED {
            self.csrs.modify(CSR_SPKCTL, |spkctl| spkctl & !SPKCTL_PKE);
        }
    }

    /// 0 while keys are disabled.
    pub fn read_pkru(&self) -> Pkru {
        if self.is_enabled() {
            Pkru::from_bits(self.csrs.read(CSR_UPKRU))
        } else {
            Pkru::default()
        }
    }

    /// Dropped while keys are disabled.
    pub fn write_pkru(&mut self, pkru: Pkru) {
        if self.is_enabled() {
            self.csrs.write(CSR_UPKRU, pkru.bits());
        }
    }

    pub fn allows_read(&self, pkey: u32) -> bool {
        !self.read_pkru().access_disabled(pkey)
    }

    /// Access-disable blocks writes as well.
    pub fn allows_write(&self, pkey: u32) -> bool {
        let pkru = self.read_pkru();
        !pkru.access_disabled(pkey) && !pkru.write_disabled(pkey)
    }
}
