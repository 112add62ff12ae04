#[macro_export]
macro_rules! MASK {
    ($e:expr) => {
        {
             (1usize << $e) - 1usize
        }
    }
}

#[macro_export]
macro_rules! BIT {
    ($e:expr) => {
        {
            1usize<<$e
        }
    }
}

/// Width of a CSR in bits.
pub const XLEN: usize = usize::BITS as usize;

#[cfg(target_arch = "riscv64")]
#[inline]
pub fn cpu_id() -> usize {
    let id: usize;
    unsafe {
        core::arch::asm!("mv {}, tp", out(reg) id);
    }
    id
}

#[cfg(not(target_arch = "riscv64"))]
#[inline]
pub fn cpu_id() -> usize {
    0
}
