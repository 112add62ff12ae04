use log::debug;

use crate::config::{ARCH_DEFAULT_PKEY, PKRU_AD_BIT, PKRU_BITS_PER_PKEY, PKRU_NUM_PKEYS, PKRU_WD_BIT};
use crate::csr::CsrFile;

use super::pkru::{Pkru, PkeyControl};

pub const PKEY_DISABLE_ACCESS: usize = 0x1;
pub const PKEY_DISABLE_WRITE: usize = 0x2;

pub const PROT_READ: usize = 0x1;
pub const PROT_WRITE: usize = 0x2;
pub const PROT_EXEC: usize = 0x4;

pub const VM_READ: usize = 0x1;
pub const VM_WRITE: usize = 0x2;
pub const VM_EXEC: usize = 0x4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkeyError {
    /// Bad key, key not allocated, or keys disabled (`-EINVAL`).
    InvalidArgument,
    /// All 32 keys are in use.
    Exhausted,
}

/// What the VMA layer tells us about a mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VmaInfo {
    /// `VM_READ | VM_WRITE | VM_EXEC` subset.
    pub flags: usize,
    pub pkey: u32,
}

/// Per address space key bookkeeping, protected by the owner's mmap lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PkeyContext {
    /// One bit per key; key 0 is allocated from the start.
    allocation_map: u32,
    execute_only_pkey: Option<u32>,
}

impl Default for PkeyContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PkeyContext {
    pub const fn new() -> Self {
        Self {
            allocation_map: 1 << ARCH_DEFAULT_PKEY,
            execute_only_pkey: None,
        }
    }

    #[inline]
    pub fn allocation_map(&self) -> u32 {
        self.allocation_map
    }

    #[inline]
    pub fn execute_only_pkey(&self) -> Option<u32> {
        self.execute_only_pkey
    }

    #[inline]
    fn set_allocated(&mut self, pkey: u32) {
        self.allocation_map |= 1 << pkey;
    }

    #[inline]
    fn set_free(&mut self, pkey: u32) {
        self.allocation_map &= !(1 << pkey);
    }

    /// Keys handed out by `alloc` and still usable through the user interfaces. The
    /// default key and the execute-only key do not count.
    pub fn is_allocated(&self, pkey: u32) -> bool {
        if pkey == ARCH_DEFAULT_PKEY || pkey as usize >= PKRU_NUM_PKEYS {
            return false;
        }
        if self.execute_only_pkey == Some(pkey) {
            return false;
        }
        self.allocation_map & (1 << pkey) != 0
    }

    /// Lowest unused key. This is the only place keys come from, so every key the
    /// rest of the kernel sees is below `PKRU_NUM_PKEYS`.
    pub fn alloc(&mut self) -> Result<u32, PkeyError> {
        let all_pkeys_mask = ((1u64 << PKRU_NUM_PKEYS) - 1) as u32;
        if self.allocation_map == all_pkeys_mask {
            return Err(PkeyError::Exhausted);
        }
        let pkey = (!self.allocation_map).trailing_zeros();
        self.set_allocated(pkey);
        Ok(pkey)
    }

    pub fn free(&mut self, pkey: u32) -> Result<(), PkeyError> {
        if !self.is_allocated(pkey) {
            return Err(PkeyError::InvalidArgument);
        }
        self.set_free(pkey);
        Ok(())
    }

    fn vma_is_pkey_exec_only(&self, vma: &VmaInfo) -> bool {
        vma.flags & (VM_READ | VM_WRITE | VM_EXEC) == VM_EXEC
            && self.execute_only_pkey == Some(vma.pkey)
    }
}

/// Sets the rights of `pkey` in UPKRU to `init_val` (`PKEY_DISABLE_*` bits),
/// leaving the other keys alone, and mirrors the result into the task's saved
/// `upkru` so it survives the next context switch.
pub fn set_user_pkey_access<R: CsrFile>(
    ctl: &mut PkeyControl<R>,
    saved_upkru: &mut usize,
    pkey: u32,
    init_val: usize,
) -> Result<(), PkeyError> {
    if !ctl.is_enabled() || pkey as usize >= PKRU_NUM_PKEYS {
        return Err(PkeyError::InvalidArgument);
    }
    let pkey_shift = pkey as usize * PKRU_BITS_PER_PKEY;

    let mut new_pkru_bits = 0;
    if init_val & PKEY_DISABLE_ACCESS != 0 {
        new_pkru_bits |= PKRU_AD_BIT;
    }
    if init_val & PKEY_DISABLE_WRITE != 0 {
        new_pkru_bits |= PKRU_WD_BIT;
    }
    new_pkru_bits <<= pkey_shift;

    let old_pkru = ctl.read_pkru().bits() & !((PKRU_AD_BIT | PKRU_WD_BIT) << pkey_shift);
    let new_pkru = old_pkru | new_pkru_bits;
    ctl.write_pkru(Pkru::from_bits(new_pkru));
    *saved_upkru = new_pkru;
    Ok(())
}

/// Key backing execute-only mappings of `ctx`, allocated on first use and set up
/// to deny data access. `None` when no key can be spared; the mapping then goes
/// without execute-only protection.
pub fn execute_only_pkey<R: CsrFile>(
    ctx: &mut PkeyContext,
    ctl: &mut PkeyControl<R>,
    saved_upkru: &mut usize,
) -> Option<u32> {
    if !ctl.is_enabled() {
        return Some(ARCH_DEFAULT_PKEY);
    }

    let (pkey, need_to_set_mm_pkey) = match ctx.execute_only_pkey {
        Some(pkey) => (pkey, false),
        None => (ctx.alloc().ok()?, true),
    };

    // already write-disabled by us earlier, skip the csr dance
    if !need_to_set_mm_pkey && !ctl.allows_read(pkey) {
        return Some(pkey);
    }

    if set_user_pkey_access(ctl, saved_upkru, pkey, PKEY_DISABLE_ACCESS).is_err() {
        ctx.set_free(pkey);
        return None;
    }

    if need_to_set_mm_pkey {
        debug!("execute-only pkey {}", pkey);
        ctx.execute_only_pkey = Some(pkey);
    }
    Some(pkey)
}

/// Key for a plain `mprotect` (`pkey == None`) or `pkey_mprotect` call.
pub fn override_mprotect_pkey<R: CsrFile>(
    ctx: &mut PkeyContext,
    ctl: &mut PkeyControl<R>,
    saved_upkru: &mut usize,
    vma: &VmaInfo,
    prot: usize,
    pkey: Option<u32>,
) -> u32 {
    if !ctl.is_enabled() {
        return ARCH_DEFAULT_PKEY;
    }

    if let Some(pkey) = pkey {
        return pkey;
    }

    if prot == PROT_EXEC {
        if let Some(pkey) = execute_only_pkey(ctx, ctl, saved_upkru) {
            if pkey > ARCH_DEFAULT_PKEY {
                return pkey;
            }
        }
    } else if ctx.vma_is_pkey_exec_only(vma) {
        // leaving execute-only: back to the default key
        return ARCH_DEFAULT_PKEY;
    }

    vma.pkey
}
