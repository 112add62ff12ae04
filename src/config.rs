//! DASICS / PKU register numbers and the per-revision table layouts.

use crate::dasics::layout::{BoundOrder, GatewayLayout, TableLayout};

// DASICS main csrs
pub const CSR_DUMCFG: usize = 0x5c0;
pub const CSR_DUMBOUNDHI: usize = 0x5c1;
pub const CSR_DUMBOUNDLO: usize = 0x5c2;

// DASICS main cfg
pub const DASICS_MAINCFG_MASK: usize = 0xf;
pub const DASICS_UCFG_CLS: usize = 0x8;
pub const DASICS_SCFG_CLS: usize = 0x4;
pub const DASICS_UCFG_ENA: usize = 0x2;
pub const DASICS_SCFG_ENA: usize = 0x1;

// DASICS lib csrs
pub const CSR_DLCFG0: usize = 0x881;
pub const CSR_DLCFG1: usize = 0x882;
pub const CSR_DLBOUND0: usize = 0x883;
pub const CSR_DLBOUND31: usize = 0x8a2;

// DASICS main-call csrs
pub const CSR_DMAINCALL: usize = 0x8a3;
pub const CSR_DRETURNPC: usize = 0x8a4;
pub const CSR_DFZRETURN: usize = 0x8a5;

// DASICS jump csrs
pub const CSR_DJBOUND0LO: usize = 0x8c0;
pub const CSR_DJCFG: usize = 0x8c8;

// Bound windows of the 32-entry revisions
pub const CSR_DLBOUNDX0: usize = 0x8d0;
pub const CSR_DJBOUNDX0: usize = 0x910;

// PKU csrs
pub const CSR_UPKRU: usize = 0x800;
pub const CSR_SPKCTL: usize = 0x9c0;

// DASICS lib cfg
pub const DASICS_LIBCFG_MASK: usize = 0xf;
pub const DASICS_LIBCFG_V: usize = 0x8;
pub const DASICS_LIBCFG_X: usize = 0x4;
pub const DASICS_LIBCFG_R: usize = 0x2;
pub const DASICS_LIBCFG_W: usize = 0x1;

// DASICS jump cfg
pub const DASICS_JUMPCFG_MASK: usize = 0xffff;
pub const DASICS_JUMPCFG_V: usize = 0x1;

/// 8 library slots, one byte apart in `DasicsLibCfg0`, bound pair written high first.
pub const LIBCFG_LAYOUT_8: TableLayout = TableLayout {
    capacity: 8,
    stride: 8,
    field_mask: DASICS_LIBCFG_MASK,
    valid_bit: 3,
    cfg_banks: &[CSR_DLCFG0],
    bound_base: CSR_DLBOUND0,
    bound_order: BoundOrder::HiLo,
};

/// 16 library slots packed as nibbles into `DasicsLibCfg0`.
pub const LIBCFG_LAYOUT_16: TableLayout = TableLayout {
    capacity: 16,
    stride: 4,
    field_mask: DASICS_LIBCFG_MASK,
    valid_bit: 3,
    cfg_banks: &[CSR_DLCFG0],
    bound_base: CSR_DLBOUND0,
    bound_order: BoundOrder::LoHi,
};

/// 32 library slots; slots 16..32 spill into `DasicsLibCfg1`.
pub const LIBCFG_LAYOUT_32: TableLayout = TableLayout {
    capacity: 32,
    stride: 4,
    field_mask: DASICS_LIBCFG_MASK,
    valid_bit: 3,
    cfg_banks: &[CSR_DLCFG0, CSR_DLCFG1],
    bound_base: CSR_DLBOUNDX0,
    bound_order: BoundOrder::LoHi,
};

pub const JUMPCFG_LAYOUT_4: TableLayout = TableLayout {
    capacity: 4,
    stride: 16,
    field_mask: DASICS_JUMPCFG_MASK,
    valid_bit: 0,
    cfg_banks: &[CSR_DJCFG],
    bound_base: CSR_DJBOUND0LO,
    bound_order: BoundOrder::LoHi,
};

pub const JUMPCFG_LAYOUT_32: TableLayout = TableLayout {
    capacity: 32,
    stride: 2,
    field_mask: 0x3,
    valid_bit: 0,
    cfg_banks: &[CSR_DJCFG],
    bound_base: CSR_DJBOUNDX0,
    bound_order: BoundOrder::LoHi,
};

pub const GATEWAY_LAYOUT: GatewayLayout = GatewayLayout {
    main_cfg: CSR_DUMCFG,
    main_bound_hi: CSR_DUMBOUNDHI,
    main_bound_lo: CSR_DUMBOUNDLO,
    maincall_entry: CSR_DMAINCALL,
    return_pc: CSR_DRETURNPC,
    free_zone_return_pc: Some(CSR_DFZRETURN),
};

/// Revision without the free-zone return register.
pub const GATEWAY_LAYOUT_NO_FZ: GatewayLayout = GatewayLayout {
    free_zone_return_pc: None,
    ..GATEWAY_LAYOUT
};

#[cfg(feature = "DASICS_LIB32")]
pub const LIBCFG_LAYOUT: TableLayout = LIBCFG_LAYOUT_32;
#[cfg(all(feature = "DASICS_LIB16", not(feature = "DASICS_LIB32")))]
pub const LIBCFG_LAYOUT: TableLayout = LIBCFG_LAYOUT_16;
#[cfg(not(any(feature = "DASICS_LIB16", feature = "DASICS_LIB32")))]
pub const LIBCFG_LAYOUT: TableLayout = LIBCFG_LAYOUT_8;

#[cfg(feature = "DASICS_JUMP32")]
pub const JUMPCFG_LAYOUT: TableLayout = JUMPCFG_LAYOUT_32;
#[cfg(not(feature = "DASICS_JUMP32"))]
pub const JUMPCFG_LAYOUT: TableLayout = JUMPCFG_LAYOUT_4;

#[cfg(feature = "DASICS_NO_FZRETURN")]
pub const MAINCALL_LAYOUT: GatewayLayout = GATEWAY_LAYOUT_NO_FZ;
#[cfg(not(feature = "DASICS_NO_FZRETURN"))]
pub const MAINCALL_LAYOUT: GatewayLayout = GATEWAY_LAYOUT;

// PKU
pub const PKRU_AD_BIT: usize = 0x1;
pub const PKRU_WD_BIT: usize = 0x2;
pub const PKRU_BITS_PER_PKEY: usize = 2;
pub const PKRU_NUM_PKEYS: usize = 32;
pub const SPKCTL_PKE: usize = 0x1;
pub const SPKCTL_PKS: usize = 0x2;
pub const ARCH_DEFAULT_PKEY: u32 = 0;
