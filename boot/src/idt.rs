//! Interrupt descriptor table construction and activation.
//!
//! The table is built in two phases. A [`GateTableBuilder`] is filled while
//! boot still has exclusive access, one gate per vector, with the descriptor
//! attributes derived from the vector number alone. Sealing the builder
//! asserts that every vector received a handler and yields the immutable
//! [`GateTable`], which is then published once and shared by every core.
//! After publication the table is never written again; each core only loads
//! its address with `lidt`.

use core::mem::size_of;

use bitflags::bitflags;
use spin::Once;
use x86_64::VirtAddr;
use x86_64::instructions::tables::lidt;
use x86_64::structures::DescriptorTablePointer;

use basalt_abi::gdt::SegmentSelector;
use basalt_lib::klog_debug;

pub const IDT_ENTRIES: usize = 256;

/// Vectors below this boundary are architecture exceptions.
pub const RESERVED_VECTORS: u8 = 0x10;

pub const VECTOR_NMI: u8 = 2;
pub const VECTOR_DEVICE_NOT_AVAILABLE: u8 = 7;
pub const VECTOR_DOUBLE_FAULT: u8 = 8;
pub const VECTOR_COPROCESSOR_OVERRUN: u8 = 9;
pub const VECTOR_INVALID_TSS: u8 = 0xA;

pub const IRQ_BASE_VECTOR: u8 = 32;
pub const SYSCALL_VECTOR: u8 = 0x80;

bitflags! {
    /// Attribute byte of a gate descriptor: present bit, privilege level,
    /// and gate type nibble.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct GateAttributes: u8 {
        const PRESENT = 1 << 7;
        const RING3 = 3 << 5;
        const INTERRUPT_GATE = 0xE;
        const TRAP_GATE = 0xF;
    }
}

impl GateAttributes {
    #[inline]
    pub const fn dpl(self) -> u8 {
        (self.bits() >> 5) & 0x3
    }

    #[inline]
    pub const fn gate_type(self) -> u8 {
        self.bits() & 0xF
    }
}

/// Attribute byte for a vector, derived from the vector number alone.
///
/// The severe exceptions (NMI plus the device-not-available through
/// invalid-TSS band) get supervisor-only trap gates; the remaining
/// exceptions get ring-3-reachable trap gates; everything from 0x10 up is
/// a supervisor interrupt gate.
pub const fn gate_attributes(vector: u8) -> GateAttributes {
    if vector < RESERVED_VECTORS {
        let severe = vector == VECTOR_NMI
            || (vector >= VECTOR_DEVICE_NOT_AVAILABLE && vector <= VECTOR_INVALID_TSS);
        if severe {
            GateAttributes::PRESENT.union(GateAttributes::TRAP_GATE)
        } else {
            GateAttributes::PRESENT
                .union(GateAttributes::RING3)
                .union(GateAttributes::TRAP_GATE)
        }
    } else {
        GateAttributes::PRESENT.union(GateAttributes::INTERRUPT_GATE)
    }
}

/// One 16-byte IDT gate in the hardware layout.
#[repr(C, packed)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GateDescriptor {
    offset_low: u16,
    selector: u16,
    ist: u8,
    attributes: u8,
    offset_mid: u16,
    offset_high: u32,
    reserved: u32,
}

impl GateDescriptor {
    const fn missing() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            ist: 0,
            attributes: 0,
            offset_mid: 0,
            offset_high: 0,
            reserved: 0,
        }
    }

    const fn new(handler: u64, selector: SegmentSelector, ist: u8, attributes: GateAttributes) -> Self {
        Self {
            offset_low: (handler & 0xFFFF) as u16,
            selector: selector.bits(),
            ist: ist & 0x7,
            attributes: attributes.bits(),
            offset_mid: ((handler >> 16) & 0xFFFF) as u16,
            offset_high: (handler >> 32) as u32,
            reserved: 0,
        }
    }

    /// Handler address reassembled from the three offset fields.
    #[inline]
    pub fn offset(&self) -> u64 {
        let low = self.offset_low;
        let mid = self.offset_mid;
        let high = self.offset_high;
        (low as u64) | ((mid as u64) << 16) | ((high as u64) << 32)
    }

    #[inline]
    pub fn selector(&self) -> u16 {
        self.selector
    }

    #[inline]
    pub fn ist(&self) -> u8 {
        self.ist
    }

    #[inline]
    pub fn attributes(&self) -> GateAttributes {
        GateAttributes::from_bits_retain(self.attributes)
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.attributes().contains(GateAttributes::PRESENT)
    }

    #[inline]
    pub fn reserved(&self) -> u32 {
        self.reserved
    }
}

/// Mutable fill phase of the gate table. Exists only during early boot,
/// before interrupts are enabled anywhere.
pub struct GateTableBuilder {
    entries: [GateDescriptor; IDT_ENTRIES],
    installed: [u64; 4],
}

impl GateTableBuilder {
    pub const fn new() -> Self {
        Self {
            entries: [GateDescriptor::missing(); IDT_ENTRIES],
            installed: [0; 4],
        }
    }

    /// Install the handler for `vector`. The descriptor attributes come
    /// from the vector number; callers cannot pick them. Installing a
    /// vector twice overwrites the earlier handler.
    pub fn install(&mut self, vector: u8, handler: u64, ist: u8) {
        self.entries[vector as usize] = GateDescriptor::new(
            handler,
            SegmentSelector::KERNEL_CODE,
            ist,
            gate_attributes(vector),
        );
        self.installed[(vector >> 6) as usize] |= 1u64 << (vector & 63);
    }

    pub fn descriptor(&self, vector: u8) -> GateDescriptor {
        self.entries[vector as usize]
    }

    pub fn is_complete(&self) -> bool {
        self.installed.iter().all(|word| *word == u64::MAX)
    }

    fn missing_count(&self) -> u32 {
        self.installed.iter().map(|word| word.count_zeros()).sum()
    }

    /// Freeze the builder into the immutable table. Every vector must have
    /// a handler; a partially filled table must never reach the hardware.
    pub fn seal(self) -> GateTable {
        assert!(
            self.is_complete(),
            "gate table sealed with {} vectors missing",
            self.missing_count()
        );
        GateTable {
            entries: self.entries,
        }
    }
}

impl Default for GateTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The sealed, immutable descriptor table in the layout `lidt` expects.
#[repr(C, align(16))]
pub struct GateTable {
    entries: [GateDescriptor; IDT_ENTRIES],
}

impl GateTable {
    pub fn descriptor(&self, vector: u8) -> GateDescriptor {
        self.entries[vector as usize]
    }

    pub fn pointer(&self) -> DescriptorTablePointer {
        DescriptorTablePointer {
            limit: (size_of::<[GateDescriptor; IDT_ENTRIES]>() - 1) as u16,
            base: VirtAddr::new(self.entries.as_ptr() as u64),
        }
    }

    /// Load this table on the calling core.
    ///
    /// # Safety
    ///
    /// Every installed handler address must point at a valid interrupt
    /// stub for the lifetime of the kernel.
    pub unsafe fn activate(&'static self) {
        let pointer = self.pointer();
        unsafe {
            lidt(&pointer);
        }
        klog_debug!("idt: loaded {} vectors on this core", IDT_ENTRIES);
    }
}

static IDT: Once<GateTable> = Once::new();

/// Seal and publish the table. The first publication wins; the sealed
/// table from any later call is discarded and the existing one returned.
pub fn publish(builder: GateTableBuilder) -> &'static GateTable {
    IDT.call_once(|| builder.seal())
}

pub fn table() -> Option<&'static GateTable> {
    IDT.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_builder() -> GateTableBuilder {
        let mut builder = GateTableBuilder::new();
        for vector in 0..=255u8 {
            builder.install(vector, 0x1000 + (vector as u64) * 16, 0);
        }
        builder
    }

    #[test]
    fn classification_bands() {
        for vector in [2u8, 7, 8, 9, 10] {
            let attrs = gate_attributes(vector);
            assert_eq!(attrs.bits(), 0x8F);
            assert_eq!(attrs.dpl(), 0);
            assert_eq!(attrs.gate_type(), 0xF);
        }
        for vector in [0u8, 1, 3, 4, 5, 6, 11, 12, 13, 14, 15] {
            let attrs = gate_attributes(vector);
            assert_eq!(attrs.bits(), 0xEF);
            assert_eq!(attrs.dpl(), 3);
            assert_eq!(attrs.gate_type(), 0xF);
        }
        for vector in [0x10u8, IRQ_BASE_VECTOR, SYSCALL_VECTOR, 255] {
            let attrs = gate_attributes(vector);
            assert_eq!(attrs.bits(), 0x8E);
            assert_eq!(attrs.dpl(), 0);
            assert_eq!(attrs.gate_type(), 0xE);
        }
    }

    #[test]
    fn descriptor_layout() {
        assert_eq!(size_of::<GateDescriptor>(), 16);

        let mut builder = GateTableBuilder::new();
        builder.install(0x21, 0x1122_3344_5566_7788, 0);
        let gate = builder.descriptor(0x21);

        assert_eq!(gate.offset(), 0x1122_3344_5566_7788);
        assert_eq!(gate.selector(), SegmentSelector::KERNEL_CODE.bits());
        assert_eq!(gate.ist(), 0);
        assert_eq!(gate.reserved(), 0);
        assert!(gate.is_present());
    }

    #[test]
    fn ist_index_is_masked() {
        let mut builder = GateTableBuilder::new();
        builder.install(8, 0xFFFF_8000_0010_0000, 3);
        assert_eq!(builder.descriptor(8).ist(), 3);

        builder.install(8, 0xFFFF_8000_0010_0000, 9);
        assert_eq!(builder.descriptor(8).ist(), 1);
    }

    #[test]
    fn identical_fills_produce_identical_tables() {
        let first = filled_builder().seal();
        let second = filled_builder().seal();
        for vector in 0..=255u8 {
            assert!(first.descriptor(vector) == second.descriptor(vector));
        }
    }

    #[test]
    fn completeness_tracks_every_vector() {
        let mut builder = GateTableBuilder::new();
        assert!(!builder.is_complete());
        for vector in 0..=254u8 {
            builder.install(vector, 0x2000, 0);
        }
        assert!(!builder.is_complete());
        builder.install(255, 0x2000, 0);
        assert!(builder.is_complete());
    }

    #[test]
    fn reinstall_overwrites_handler() {
        let mut builder = GateTableBuilder::new();
        builder.install(14, 0x3000, 0);
        builder.install(14, 0x4000, 0);
        assert_eq!(builder.descriptor(14).offset(), 0x4000);
    }

    #[test]
    #[should_panic]
    fn sealing_incomplete_table_panics() {
        let mut builder = GateTableBuilder::new();
        builder.install(0, 0x1000, 0);
        let _ = builder.seal();
    }

    #[test]
    fn pointer_covers_whole_table() {
        let table = filled_builder().seal();
        let pointer = table.pointer();
        assert_eq!(pointer.limit, 4095);
        assert_eq!(pointer.base.as_u64(), &table as *const GateTable as u64);
    }

    #[test]
    fn pointer_recomputation_is_stable() {
        let table = filled_builder().seal();
        let first = table.pointer();
        let second = table.pointer();
        assert_eq!(first.limit, second.limit);
        assert_eq!(first.base.as_u64(), second.base.as_u64());
    }
}
