//! Segment selectors shared between the gate table and the context-switch
//! path.
//!
//! Selector layout (16 bits): bits 0-1 requested privilege level, bit 2
//! table indicator (0 = GDT), bits 3-15 descriptor index.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SegmentSelector(pub u16);

impl SegmentSelector {
    /// Null selector.
    pub const NULL: Self = Self(0);

    /// Kernel code segment (GDT index 1, RPL 0) = 0x08. Every gate
    /// descriptor names this segment.
    pub const KERNEL_CODE: Self = Self::new(1, 0);

    /// Kernel data segment (GDT index 2, RPL 0) = 0x10.
    pub const KERNEL_DATA: Self = Self::new(2, 0);

    /// User data segment (GDT index 3, RPL 3) = 0x1B.
    pub const USER_DATA: Self = Self::new(3, 3);

    /// User code segment (GDT index 4, RPL 3) = 0x23.
    pub const USER_CODE: Self = Self::new(4, 3);

    #[inline]
    pub const fn new(index: u16, rpl: u8) -> Self {
        Self((index << 3) | (rpl as u16 & 0x3))
    }

    /// Descriptor table index.
    #[inline]
    pub const fn index(self) -> u16 {
        self.0 >> 3
    }

    /// Requested privilege level (0-3).
    #[inline]
    pub const fn rpl(self) -> u8 {
        (self.0 & 0x3) as u8
    }

    /// Raw selector value.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_values() {
        assert_eq!(SegmentSelector::KERNEL_CODE.bits(), 0x08);
        assert_eq!(SegmentSelector::KERNEL_DATA.bits(), 0x10);
        assert_eq!(SegmentSelector::USER_DATA.bits(), 0x1B);
        assert_eq!(SegmentSelector::USER_CODE.bits(), 0x23);
    }

    #[test]
    fn selector_decomposition() {
        let sel = SegmentSelector::USER_CODE;
        assert_eq!(sel.index(), 4);
        assert_eq!(sel.rpl(), 3);
    }
}
