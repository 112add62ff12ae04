//! In-memory csr file that records every access in order.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::CsrFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read(usize),
    Write(usize, usize),
}

#[derive(Debug, Default)]
pub struct MockCsrFile {
    regs: BTreeMap<usize, usize>,
    log: RefCell<Vec<Access>>,
    windows: Option<&'static [usize]>,
}

impl MockCsrFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presets a register without logging the access.
    pub fn with(mut self, csr: usize, bits: usize) -> Self {
        self.regs.insert(csr, bits);
        self
    }

    /// Limits `supports` to the given 16-csr windows, like the hart build.
    pub fn with_windows(mut self, windows: &'static [usize]) -> Self {
        self.windows = Some(windows);
        self
    }

    pub fn get(&self, csr: usize) -> usize {
        self.regs.get(&csr).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<usize, usize> {
        self.regs.clone()
    }

    pub fn log(&self) -> Vec<Access> {
        self.log.borrow().clone()
    }

    pub fn writes(&self) -> Vec<(usize, usize)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|a| match *a {
                Access::Write(csr, bits) => Some((csr, bits)),
                Access::Read(_) => None,
            })
            .collect()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}

impl CsrFile for MockCsrFile {
    fn read(&self, csr: usize) -> usize {
        self.log.borrow_mut().push(Access::Read(csr));
        self.get(csr)
    }

    fn write(&mut self, csr: usize, bits: usize) {
        self.log.borrow_mut().push(Access::Write(csr, bits));
        self.regs.insert(csr, bits);
    }

    fn supports(&self, csr: usize) -> bool {
        self.windows.map_or(true, |windows| super::in_windows(csr, windows))
    }
}
