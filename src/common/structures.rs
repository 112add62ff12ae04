/// Failure of a DASICS table or gateway operation. None of these are fatal; the
/// caller decides whether to retry.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DasicsError {
    /// Every slot of the table has its valid bit set.
    Exhausted,
    /// Slot index outside `0..capacity`.
    InvalidIndex,
    /// Main-call number with no handler.
    UnrecognizedCallKind,
    /// Table layout that does not fit its banks, or names csrs the hart cannot
    /// reach.
    UnsupportedLayout,
}

impl DasicsError {
    /// Value handed back across the C interface.
    #[inline]
    pub fn as_sentinel(&self) -> i32 {
        -1
    }
}
