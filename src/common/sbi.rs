#![allow(unused)]

const SBI_CONSOLE_PUTCHAR: usize = 1;
const SBI_SHUTDOWN: usize = 8;

/// Legacy SBI call. Only the bare-metal RISC-V build talks to firmware; elsewhere
/// the console is discarded.
#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub fn sbi_call(which: usize, arg0: usize, arg1: usize, arg2: usize) -> usize {
    let ret: usize;
    unsafe {
        core::arch::asm!(
            "ecall",
            inlateout("a0") arg0 => ret,
            in("a1") arg1,
            in("a2") arg2,
            in("a7") which,
        );
    }
    ret
}

#[cfg(not(target_arch = "riscv64"))]
#[inline(always)]
pub fn sbi_call(_which: usize, _arg0: usize, _arg1: usize, _arg2: usize) -> usize {
    0
}

pub fn console_putchar(c: usize) {
    sbi_call(SBI_CONSOLE_PUTCHAR, c, 0, 0);
}

pub fn shutdown() -> ! {
    sbi_call(SBI_SHUTDOWN, 0, 0, 0);
    panic!("It should shutdown!");
}
