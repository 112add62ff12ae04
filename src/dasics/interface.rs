//! Kernel-facing entry points. The owning kernel reaches the tables through the
//! `#[no_mangle]` functions below, which return `-1` where the Rust API returns an
//! error.

use log::warn;
use spin::Mutex;

use crate::csr::CsrFile;

use super::jumpcfg::JumpTable;
use super::libcfg::{LibCfg, LibTable};
use super::maincall::{Gateway, SmaincallType};

#[inline]
fn slot_index(idx: i32) -> Option<usize> {
    usize::try_from(idx).ok()
}

// The helpers below may be entered again from a trap taken while the lock is held
// on the same hart, so they never spin: a busy table answers with the failure
// sentinel and a busy gateway with 0.

pub fn libcfg_kalloc<R: CsrFile>(table: &Mutex<LibTable<R>>, cfg: usize, hi: usize, lo: usize) -> i32 {
    let Some(mut table) = table.try_lock() else {
        return -1;
    };
    match table.alloc(LibCfg::from_bits(cfg), lo, hi) {
        Ok(index) => index as i32,
        Err(e) => e.as_sentinel(),
    }
}

pub fn libcfg_kfree<R: CsrFile>(table: &Mutex<LibTable<R>>, idx: i32) -> i32 {
    let (Some(index), Some(mut table)) = (slot_index(idx), table.try_lock()) else {
        return -1;
    };
    match table.free(index) {
        Ok(()) => 0,
        Err(e) => e.as_sentinel(),
    }
}

pub fn libcfg_kget<R: CsrFile>(table: &Mutex<LibTable<R>>, idx: i32) -> u32 {
    slot_index(idx)
        .and_then(|index| table.try_lock()?.get(index).ok())
        .map_or(u32::MAX, |cfg| cfg.bits() as u32)
}

pub fn jumpcfg_kalloc<R: CsrFile>(table: &Mutex<JumpTable<R>>, lo: usize, hi: usize) -> i32 {
    let Some(mut table) = table.try_lock() else {
        return -1;
    };
    match table.alloc(lo, hi) {
        Ok(index) => index as i32,
        Err(e) => e.as_sentinel(),
    }
}

pub fn jumpcfg_kfree<R: CsrFile>(table: &Mutex<JumpTable<R>>, idx: i32) -> i32 {
    let (Some(index), Some(mut table)) = (slot_index(idx), table.try_lock()) else {
        return -1;
    };
    match table.free(index) {
        Ok(()) => 0,
        Err(e) => e.as_sentinel(),
    }
}

pub fn jumpcfg_kget<R: CsrFile>(table: &Mutex<JumpTable<R>>, idx: i32) -> u32 {
    slot_index(idx)
        .and_then(|index| table.try_lock()?.get(index).ok())
        .map_or(u32::MAX, |valid| valid as u32)
}

pub fn smaincall<R: CsrFile>(gateway: &Mutex<Gateway<R>>, type_: u32, arg0: usize, arg1: usize, arg2: usize) -> usize {
    match gateway.try_lock() {
        Some(mut gateway) => gateway.dispatch(SmaincallType::from_raw(type_ as usize), arg0, arg1, arg2),
        None => {
            warn!("smaincall {} while the gateway is busy", type_);
            0
        }
    }
}

#[cfg(target_arch = "riscv64")]
mod hart {
    use lazy_static::lazy_static;
    use log::{info, warn};
    use spin::Mutex;

    use crate::common::logging;
    use crate::config::{JUMPCFG_LAYOUT, LIBCFG_LAYOUT, MAINCALL_LAYOUT};
    use crate::csr::{HartCsrs, HART_CSR_WINDOWS};
    use crate::dasics::jumpcfg::JumpTable;
    use crate::dasics::libcfg::LibTable;
    use crate::dasics::maincall::Gateway;
    use crate::pku::PkeyControl;

    const _: () = assert!(LIBCFG_LAYOUT.fits_windows(HART_CSR_WINDOWS));
    const _: () = assert!(JUMPCFG_LAYOUT.fits_windows(HART_CSR_WINDOWS));
    const _: () = assert!(MAINCALL_LAYOUT.fits_windows(HART_CSR_WINDOWS));

    core::arch::global_asm!(include_str!("smaincall.S"));

    extern "C" {
        fn __dasics_smaincall_entry();
    }

    lazy_static! {
        pub static ref LIB_TABLE: Mutex<LibTable<HartCsrs>> = Mutex::new(LibTable::new(LIBCFG_LAYOUT, HartCsrs));
        pub static ref JUMP_TABLE: Mutex<JumpTable<HartCsrs>> = Mutex::new(JumpTable::new(JUMPCFG_LAYOUT, HartCsrs));
        pub static ref GATEWAY: Mutex<Gateway<HartCsrs>> = Mutex::new(Gateway::new(MAINCALL_LAYOUT, HartCsrs));
    }

    /// Address to hand to [`dasics_init_smaincall`].
    pub fn smaincall_entry() -> usize {
        __dasics_smaincall_entry as usize
    }

    /// Boot hook: installs the logger, turns on user protection keys and points the
    /// main-call entry csr at the in-kernel trampoline.
    #[no_mangle]
    pub extern "C" fn dasics_init() {
        logging::init();
        PkeyControl::new(HartCsrs).init();
        dasics_init_smaincall(smaincall_entry() as u64);
        info!(
            "DASICS: {} lib slots, {} jump slots, main-call entry {:#x}",
            LIBCFG_LAYOUT.capacity,
            JUMPCFG_LAYOUT.capacity,
            smaincall_entry()
        );
    }

    #[no_mangle]
    pub extern "C" fn dasics_init_umain_bound(cfg: u64, hi: u64, lo: u64) {
        match GATEWAY.try_lock() {
            Some(mut gateway) => gateway.init_main_bound(cfg as usize, hi as usize, lo as usize),
            None => warn!("main bound left unchanged, gateway busy"),
        }
    }

    #[no_mangle]
    pub extern "C" fn dasics_init_smaincall(entry: u64) {
        match GATEWAY.try_lock() {
            Some(mut gateway) => gateway.init_entry(entry as usize),
            None => warn!("main-call entry left unchanged, gateway busy"),
        }
    }

    #[no_mangle]
    pub extern "C" fn dasics_smaincall(type_: u32, arg0: u64, arg1: u64, arg2: u64) -> u64 {
        super::smaincall(&GATEWAY, type_, arg0 as usize, arg1 as usize, arg2 as usize) as u64
    }

    #[no_mangle]
    pub extern "C" fn dasics_libcfg_kalloc(cfg: u64, hi: u64, lo: u64) -> i32 {
        super::libcfg_kalloc(&LIB_TABLE, cfg as usize, hi as usize, lo as usize)
    }

    #[no_mangle]
    pub extern "C" fn dasics_libcfg_kfree(idx: i32) -> i32 {
        super::libcfg_kfree(&LIB_TABLE, idx)
    }

    #[no_mangle]
    pub extern "C" fn dasics_libcfg_kget(idx: i32) -> u32 {
        super::libcfg_kget(&LIB_TABLE, idx)
    }

    #[no_mangle]
    pub extern "C" fn dasics_jumpcfg_kalloc(lo: u64, hi: u64) -> i32 {
        super::jumpcfg_kalloc(&JUMP_TABLE, lo as usize, hi as usize)
    }

    #[no_mangle]
    pub extern "C" fn dasics_jumpcfg_kfree(idx: i32) -> i32 {
        super::jumpcfg_kfree(&JUMP_TABLE, idx)
    }

    #[no_mangle]
    pub extern "C" fn dasics_jumpcfg_kget(idx: i32) -> u32 {
        super::jumpcfg_kget(&JUMP_TABLE, idx)
    }
}

#[cfg(target_arch = "riscv64")]
pub use hart::*;
