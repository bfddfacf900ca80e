use std::fmt;

/// x86-64 exception vectors. Anything else is an IRQ or software interrupt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InterruptVector {
    DivideError,
    Debug,
    Nmi,
    Breakpoint,
    Overflow,
    BoundRange,
    InvalidOpcode,
    DeviceNotAvailable,
    DoubleFault,
    GeneralProtection,
    PageFault,
    X87Fp,
    AlignmentCheck,
    MachineCheck,
    SimdFp,
    Other(u64),
}

impl InterruptVector {
    pub fn new(num: u64) -> Self {
        match num {
            0 => InterruptVector::DivideError,
            1 => InterruptVector::Debug,
            2 => InterruptVector::Nmi,
            3 => InterruptVector::Breakpoint,
            4 => InterruptVector::Overflow,
            5 => InterruptVector::BoundRange,
            6 => InterruptVector::InvalidOpcode,
            7 => InterruptVector::DeviceNotAvailable,
            8 => InterruptVector::DoubleFault,
            13 => InterruptVector::GeneralProtection,
            14 => InterruptVector::PageFault,
            16 => InterruptVector::X87Fp,
            17 => InterruptVector::AlignmentCheck,
            18 => InterruptVector::MachineCheck,
            19 => InterruptVector::SimdFp,
            n => InterruptVector::Other(n),
        }
    }
}

impl fmt::Display for InterruptVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InterruptVector::DivideError => "#DE Divide Error",
            InterruptVector::Debug => "#DB Debug",
            InterruptVector::Nmi => "NMI",
            InterruptVector::Breakpoint => "#BP Breakpoint",
            InterruptVector::Overflow => "#OF Overflow",
            InterruptVector::BoundRange => "#BR Bound Range",
            InterruptVector::InvalidOpcode => "#UD Invalid Opcode",
            InterruptVector::DeviceNotAvailable => "#NM Device Not Available",
            InterruptVector::DoubleFault => "#DF Double Fault",
            InterruptVector::GeneralProtection => "#GP General Protection",
            InterruptVector::PageFault => "#PF Page Fault",
            InterruptVector::X87Fp => "#MF x87 FP",
            InterruptVector::AlignmentCheck => "#AC Alignment Check",
            InterruptVector::MachineCheck => "#MC Machine Check",
            InterruptVector::SimdFp => "#XM SIMD FP",
            InterruptVector::Other(n) => return write!(f, "INT {n}"),
        };
        write!(f, "{name}")
    }
}
