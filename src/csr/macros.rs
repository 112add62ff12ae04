macro_rules! read_csr {
    ($base:literal, $off:literal) => {{
        let r: usize;
        core::arch::asm!(concat!("csrrs {0}, ", stringify!($base), " + ", stringify!($off), ", x0"), out(reg) r);
        r
    }};
}

macro_rules! write_csr {
    ($base:literal, $off:literal, $bits:expr) => {
        core::arch::asm!(concat!("csrrw x0, ", stringify!($base), " + ", stringify!($off), ", {0}"), in(reg) $bits)
    };
}

/// Expands to a match over the 16 csrs of the window starting at `$base`; the csr
/// number has to be an immediate of the instruction.
macro_rules! csr_window {
    ($op:ident, $base:literal, $off:expr $(, $bits:expr)?) => {
        match $off {
            0x0 => $op!($base, 0x0 $(, $bits)?),
            0x1 => $op!($base, 0x1 $(, $bits)?),
            0x2 => $op!($base, 0x2 $(, $bits)?),
            0x3 => $op!($base, 0x3 $(, $bits)?),
            0x4 => $op!($base, 0x4 $(, $bits)?),
            0x5 => $op!($base, 0x5 $(, $bits)?),
            0x6 => $op!($base, 0x6 $(, $bits)?),
            0x7 => $op!($base, 0x7 $(, $bits)?),
            0x8 => $op!($base, 0x8 $(, $bits)?),
            0x9 => $op!($base, 0x9 $(, $bits)?),
            0xa => $op!($base, 0xa $(, $bits)?),
            0xb => $op!($base, 0xb $(, $bits)?),
            0xc => $op!($base, 0xc $(, $bits)?),
            0xd => $op!($base, 0xd $(, $bits)?),
            0xe => $op!($base, 0xe $(, $bits)?),
            _ => $op!($base, 0xf $(, $bits)?),
        }
    };
}

/// Generates `read_dyn` / `write_dyn` for every listed 16-csr window, and `WINDOWS`
/// naming them.
macro_rules! csr_access_table {
    ($($base:literal),+ $(,)?) => {
        pub const WINDOWS: &[usize] = &[$($base),+];

        pub(super) unsafe fn read_dyn(csr: usize) -> usize {
            match csr & !0xf {
                $( $base => csr_window!(read_csr, $base, csr & 0xf), )+
                _ => panic!("Unsupported csr {:#x}", csr),
            }
        }

        pub(super) unsafe fn write_dyn(csr: usize, bits: usize) {
            match csr & !0xf {
                $( $base => csr_window!(write_csr, $base, csr & 0xf, bits), )+
                _ => panic!("Unsupported csr {:#x}", csr),
            }
        }
    };
}
