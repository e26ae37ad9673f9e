//! Instruction set definitions.
//!
//! [`for_each_instruction!`](crate::for_each_instruction) holds the canonical
//! opcode list and hands it to a callback macro, so the [`Instruction`] enum,
//! the opcode lookup table and the ISA fingerprint test are all generated from
//! one definition.
//!
//! # Bytecode format
//!
//! - Base instructions: 1 opcode byte
//! - Extension instructions: `0xFF`, extension set byte, opcode byte
//! - Register operand: 1 byte register id
//! - Literal and address operands: 8 bytes little-endian
//! - Pointer operand: 1 to 10 bytes, see [`operand`](super::operand)

use crate::processor::errors::ProcessorError;
use crate::processor::operand::OperandKind;

/// Byte that introduces a two-byte extension opcode.
pub const EXTENSION_PREFIX: u8 = 0xFF;

/// Opcode table selected by the byte after [`EXTENSION_PREFIX`].
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ExtensionSet {
    Base = 0x00,
    Signed = 0x01,
    Floating = 0x02,
    Extended = 0x03,
    External = 0x04,
    Allocation = 0x05,
}

impl ExtensionSet {
    pub const COUNT: usize = 6;

    pub const fn from_byte(byte: u8) -> Option<ExtensionSet> {
        match byte {
            0x00 => Some(ExtensionSet::Base),
            0x01 => Some(ExtensionSet::Signed),
            0x02 => Some(ExtensionSet::Floating),
            0x03 => Some(ExtensionSet::Extended),
            0x04 => Some(ExtensionSet::External),
            0x05 => Some(ExtensionSet::Allocation),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ExtensionSet::Base => "base",
            ExtensionSet::Signed => "signed",
            ExtensionSet::Floating => "floating point",
            ExtensionSet::Extended => "extended base",
            ExtensionSet::External => "external assembly",
            ExtensionSet::Allocation => "memory allocation",
        }
    }
}

/// Invokes a callback macro with the complete instruction definition list.
///
/// Entries read `Variant = Set:opcode, "MNEMONIC" => [field: Kind, ...]`.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Control
            // =========================
            /// HLT ; stop execution
            Hlt = Base:0x00, "HLT" => [],
            /// NOP ; do nothing
            Nop = Base:0x01, "NOP" => [],
            // =========================
            // Jumps
            // =========================
            /// JMP target ; unconditional jump
            JmpAdr = Base:0x02, "JMP" => [target: Adr],
            JmpPtr = Base:0x03, "JMP" => [target: Ptr],
            /// JEQ target ; jump if Zero
            JeqAdr = Base:0x04, "JEQ" => [target: Adr],
            JeqPtr = Base:0x05, "JEQ" => [target: Ptr],
            /// JNE target ; jump if not Zero
            JneAdr = Base:0x06, "JNE" => [target: Adr],
            JnePtr = Base:0x07, "JNE" => [target: Ptr],
            /// JLT target ; jump if Carry
            JltAdr = Base:0x08, "JLT" => [target: Adr],
            JltPtr = Base:0x09, "JLT" => [target: Ptr],
            /// JLE target ; jump if Carry or Zero
            JleAdr = Base:0x0A, "JLE" => [target: Adr],
            JlePtr = Base:0x0B, "JLE" => [target: Ptr],
            /// JGT target ; jump if neither Carry nor Zero
            JgtAdr = Base:0x0C, "JGT" => [target: Adr],
            JgtPtr = Base:0x0D, "JGT" => [target: Ptr],
            /// JGE target ; jump if not Carry
            JgeAdr = Base:0x0E, "JGE" => [target: Adr],
            JgePtr = Base:0x0F, "JGE" => [target: Ptr],
            // =========================
            // Integer arithmetic
            // =========================
            /// ADD dst, src ; dst = dst + src
            AddRegReg = Base:0x10, "ADD" => [dst: Reg, src: Reg],
            AddRegLit = Base:0x11, "ADD" => [dst: Reg, src: Lit],
            AddRegAdr = Base:0x12, "ADD" => [dst: Reg, src: Adr],
            AddRegPtr = Base:0x13, "ADD" => [dst: Reg, src: Ptr],
            /// ICR dst ; dst = dst + 1
            IcrReg = Base:0x14, "ICR" => [dst: Reg],
            /// SUB dst, src ; dst = dst - src
            SubRegReg = Base:0x20, "SUB" => [dst: Reg, src: Reg],
            SubRegLit = Base:0x21, "SUB" => [dst: Reg, src: Lit],
            SubRegAdr = Base:0x22, "SUB" => [dst: Reg, src: Adr],
            SubRegPtr = Base:0x23, "SUB" => [dst: Reg, src: Ptr],
            /// DCR dst ; dst = dst - 1
            DcrReg = Base:0x24, "DCR" => [dst: Reg],
            /// MUL dst, src ; dst = low 64 bits of dst * src
            MulRegReg = Base:0x30, "MUL" => [dst: Reg, src: Reg],
            MulRegLit = Base:0x31, "MUL" => [dst: Reg, src: Lit],
            MulRegAdr = Base:0x32, "MUL" => [dst: Reg, src: Adr],
            MulRegPtr = Base:0x33, "MUL" => [dst: Reg, src: Ptr],
            /// DIV dst, src ; dst = dst / src
            DivRegReg = Base:0x40, "DIV" => [dst: Reg, src: Reg],
            DivRegLit = Base:0x41, "DIV" => [dst: Reg, src: Lit],
            DivRegAdr = Base:0x42, "DIV" => [dst: Reg, src: Adr],
            DivRegPtr = Base:0x43, "DIV" => [dst: Reg, src: Ptr],
            /// DVR quot, rem, src ; quot = quot / src, rem = quot % src
            DvrRegRegReg = Base:0x44, "DVR" => [quot: Reg, rem: Reg, src: Reg],
            DvrRegRegLit = Base:0x45, "DVR" => [quot: Reg, rem: Reg, src: Lit],
            DvrRegRegAdr = Base:0x46, "DVR" => [quot: Reg, rem: Reg, src: Adr],
            DvrRegRegPtr = Base:0x47, "DVR" => [quot: Reg, rem: Reg, src: Ptr],
            /// REM dst, src ; dst = dst % src
            RemRegReg = Base:0x48, "REM" => [dst: Reg, src: Reg],
            RemRegLit = Base:0x49, "REM" => [dst: Reg, src: Lit],
            RemRegAdr = Base:0x4A, "REM" => [dst: Reg, src: Adr],
            RemRegPtr = Base:0x4B, "REM" => [dst: Reg, src: Ptr],
            /// SHL dst, src ; dst = dst << src
            ShlRegReg = Base:0x50, "SHL" => [dst: Reg, src: Reg],
            ShlRegLit = Base:0x51, "SHL" => [dst: Reg, src: Lit],
            ShlRegAdr = Base:0x52, "SHL" => [dst: Reg, src: Adr],
            ShlRegPtr = Base:0x53, "SHL" => [dst: Reg, src: Ptr],
            /// SHR dst, src ; dst = dst >> src (logical)
            ShrRegReg = Base:0x54, "SHR" => [dst: Reg, src: Reg],
            ShrRegLit = Base:0x55, "SHR" => [dst: Reg, src: Lit],
            ShrRegAdr = Base:0x56, "SHR" => [dst: Reg, src: Adr],
            ShrRegPtr = Base:0x57, "SHR" => [dst: Reg, src: Ptr],
            // =========================
            // Bitwise and random
            // =========================
            /// AND dst, src ; dst = dst & src
            AndRegReg = Base:0x60, "AND" => [dst: Reg, src: Reg],
            AndRegLit = Base:0x61, "AND" => [dst: Reg, src: Lit],
            AndRegAdr = Base:0x62, "AND" => [dst: Reg, src: Adr],
            AndRegPtr = Base:0x63, "AND" => [dst: Reg, src: Ptr],
            /// ORR dst, src ; dst = dst | src
            OrrRegReg = Base:0x64, "ORR" => [dst: Reg, src: Reg],
            OrrRegLit = Base:0x65, "ORR" => [dst: Reg, src: Lit],
            OrrRegAdr = Base:0x66, "ORR" => [dst: Reg, src: Adr],
            OrrRegPtr = Base:0x67, "ORR" => [dst: Reg, src: Ptr],
            /// XOR dst, src ; dst = dst ^ src
            XorRegReg = Base:0x68, "XOR" => [dst: Reg, src: Reg],
            XorRegLit = Base:0x69, "XOR" => [dst: Reg, src: Lit],
            XorRegAdr = Base:0x6A, "XOR" => [dst: Reg, src: Adr],
            XorRegPtr = Base:0x6B, "XOR" => [dst: Reg, src: Ptr],
            /// NOT dst ; dst = !dst
            NotReg = Base:0x6C, "NOT" => [dst: Reg],
            /// RNG dst ; dst = next random value
            RngReg = Base:0x6D, "RNG" => [dst: Reg],
            // =========================
            // Comparison
            // =========================
            /// TST lhs, rhs ; flags of lhs & rhs
            TstRegReg = Base:0x70, "TST" => [lhs: Reg, rhs: Reg],
            TstRegLit = Base:0x71, "TST" => [lhs: Reg, rhs: Lit],
            TstRegAdr = Base:0x72, "TST" => [lhs: Reg, rhs: Adr],
            TstRegPtr = Base:0x73, "TST" => [lhs: Reg, rhs: Ptr],
            /// CMP lhs, rhs ; flags of lhs - rhs
            CmpRegReg = Base:0x74, "CMP" => [lhs: Reg, rhs: Reg],
            CmpRegLit = Base:0x75, "CMP" => [lhs: Reg, rhs: Lit],
            CmpRegAdr = Base:0x76, "CMP" => [lhs: Reg, rhs: Adr],
            CmpRegPtr = Base:0x77, "CMP" => [lhs: Reg, rhs: Ptr],
            // =========================
            // Data moves
            // =========================
            /// MVB dst, src ; move 1 byte
            MvbRegReg = Base:0x80, "MVB" => [dst: Reg, src: Reg],
            MvbRegLit = Base:0x81, "MVB" => [dst: Reg, src: Lit],
            MvbRegAdr = Base:0x82, "MVB" => [dst: Reg, src: Adr],
            MvbRegPtr = Base:0x83, "MVB" => [dst: Reg, src: Ptr],
            MvbAdrReg = Base:0x84, "MVB" => [dst: Adr, src: Reg],
            MvbAdrLit = Base:0x85, "MVB" => [dst: Adr, src: Lit],
            MvbPtrReg = Base:0x86, "MVB" => [dst: Ptr, src: Reg],
            MvbPtrLit = Base:0x87, "MVB" => [dst: Ptr, src: Lit],
            /// MVW dst, src ; move 2 bytes
            MvwRegReg = Base:0x88, "MVW" => [dst: Reg, src: Reg],
            MvwRegLit = Base:0x89, "MVW" => [dst: Reg, src: Lit],
            MvwRegAdr = Base:0x8A, "MVW" => [dst: Reg, src: Adr],
            MvwRegPtr = Base:0x8B, "MVW" => [dst: Reg, src: Ptr],
            MvwAdrReg = Base:0x8C, "MVW" => [dst: Adr, src: Reg],
            MvwAdrLit = Base:0x8D, "MVW" => [dst: Adr, src: Lit],
            MvwPtrReg = Base:0x8E, "MVW" => [dst: Ptr, src: Reg],
            MvwPtrLit = Base:0x8F, "MVW" => [dst: Ptr, src: Lit],
            /// MVD dst, src ; move 4 bytes
            MvdRegReg = Base:0x90, "MVD" => [dst: Reg, src: Reg],
            MvdRegLit = Base:0x91, "MVD" => [dst: Reg, src: Lit],
            MvdRegAdr = Base:0x92, "MVD" => [dst: Reg, src: Adr],
            MvdRegPtr = Base:0x93, "MVD" => [dst: Reg, src: Ptr],
            MvdAdrReg = Base:0x94, "MVD" => [dst: Adr, src: Reg],
            MvdAdrLit = Base:0x95, "MVD" => [dst: Adr, src: Lit],
            MvdPtrReg = Base:0x96, "MVD" => [dst: Ptr, src: Reg],
            MvdPtrLit = Base:0x97, "MVD" => [dst: Ptr, src: Lit],
            /// MVQ dst, src ; move 8 bytes
            MvqRegReg = Base:0x98, "MVQ" => [dst: Reg, src: Reg],
            MvqRegLit = Base:0x99, "MVQ" => [dst: Reg, src: Lit],
            MvqRegAdr = Base:0x9A, "MVQ" => [dst: Reg, src: Adr],
            MvqRegPtr = Base:0x9B, "MVQ" => [dst: Reg, src: Ptr],
            MvqAdrReg = Base:0x9C, "MVQ" => [dst: Adr, src: Reg],
            MvqAdrLit = Base:0x9D, "MVQ" => [dst: Adr, src: Lit],
            MvqPtrReg = Base:0x9E, "MVQ" => [dst: Ptr, src: Reg],
            MvqPtrLit = Base:0x9F, "MVQ" => [dst: Ptr, src: Lit],
            // =========================
            // Stack
            // =========================
            /// PSH src ; rso -= 8, [rso] = src
            PshReg = Base:0xA0, "PSH" => [src: Reg],
            PshLit = Base:0xA1, "PSH" => [src: Lit],
            PshAdr = Base:0xA2, "PSH" => [src: Adr],
            PshPtr = Base:0xA3, "PSH" => [src: Ptr],
            /// POP dst ; dst = [rso], rso += 8
            PopReg = Base:0xA4, "POP" => [dst: Reg],
            // =========================
            // Subroutines
            // =========================
            /// CAL target ; push return address and rsb, rsb = rso, jump
            CalAdr = Base:0xB0, "CAL" => [target: Adr],
            CalPtr = Base:0xB1, "CAL" => [target: Ptr],
            /// CAL target, value ; rfp = value, then CAL target
            CalAdrReg = Base:0xB2, "CAL" => [target: Adr, value: Reg],
            CalAdrLit = Base:0xB3, "CAL" => [target: Adr, value: Lit],
            CalAdrAdr = Base:0xB4, "CAL" => [target: Adr, value: Adr],
            CalAdrPtr = Base:0xB5, "CAL" => [target: Adr, value: Ptr],
            CalPtrReg = Base:0xB6, "CAL" => [target: Ptr, value: Reg],
            CalPtrLit = Base:0xB7, "CAL" => [target: Ptr, value: Lit],
            CalPtrAdr = Base:0xB8, "CAL" => [target: Ptr, value: Adr],
            CalPtrPtr = Base:0xB9, "CAL" => [target: Ptr, value: Ptr],
            /// RET ; rso = rsb, pop rsb, pop rpo
            Ret = Base:0xBA, "RET" => [],
            /// RET value ; rrv = value, then RET
            RetReg = Base:0xBB, "RET" => [value: Reg],
            RetLit = Base:0xBC, "RET" => [value: Lit],
            RetAdr = Base:0xBD, "RET" => [value: Adr],
            RetPtr = Base:0xBE, "RET" => [value: Ptr],
            // =========================
            // Console output
            // =========================
            /// WCN src ; write unsigned decimal
            WcnReg = Base:0xC0, "WCN" => [src: Reg],
            WcnLit = Base:0xC1, "WCN" => [src: Lit],
            WcnAdr = Base:0xC2, "WCN" => [src: Adr],
            WcnPtr = Base:0xC3, "WCN" => [src: Ptr],
            /// WCB src ; write low byte as unsigned decimal
            WcbReg = Base:0xC4, "WCB" => [src: Reg],
            WcbLit = Base:0xC5, "WCB" => [src: Lit],
            WcbAdr = Base:0xC6, "WCB" => [src: Adr],
            WcbPtr = Base:0xC7, "WCB" => [src: Ptr],
            /// WCX src ; write uppercase hexadecimal
            WcxReg = Base:0xC8, "WCX" => [src: Reg],
            WcxLit = Base:0xC9, "WCX" => [src: Lit],
            WcxAdr = Base:0xCA, "WCX" => [src: Adr],
            WcxPtr = Base:0xCB, "WCX" => [src: Ptr],
            /// WCC src ; write low byte raw
            WccReg = Base:0xCC, "WCC" => [src: Reg],
            WccLit = Base:0xCD, "WCC" => [src: Lit],
            WccAdr = Base:0xCE, "WCC" => [src: Adr],
            WccPtr = Base:0xCF, "WCC" => [src: Ptr],
            // =========================
            // File output
            // =========================
            /// WFN src ; write unsigned decimal to the open file
            WfnReg = Base:0xD0, "WFN" => [src: Reg],
            WfnLit = Base:0xD1, "WFN" => [src: Lit],
            WfnAdr = Base:0xD2, "WFN" => [src: Adr],
            WfnPtr = Base:0xD3, "WFN" => [src: Ptr],
            WfbReg = Base:0xD4, "WFB" => [src: Reg],
            WfbLit = Base:0xD5, "WFB" => [src: Lit],
            WfbAdr = Base:0xD6, "WFB" => [src: Adr],
            WfbPtr = Base:0xD7, "WFB" => [src: Ptr],
            WfxReg = Base:0xD8, "WFX" => [src: Reg],
            WfxLit = Base:0xD9, "WFX" => [src: Lit],
            WfxAdr = Base:0xDA, "WFX" => [src: Adr],
            WfxPtr = Base:0xDB, "WFX" => [src: Ptr],
            WfcReg = Base:0xDC, "WFC" => [src: Reg],
            WfcLit = Base:0xDD, "WFC" => [src: Lit],
            WfcAdr = Base:0xDE, "WFC" => [src: Adr],
            WfcPtr = Base:0xDF, "WFC" => [src: Ptr],
            // =========================
            // File operations
            // =========================
            /// OFL path ; open a file for reading and writing
            OflAdr = Base:0xE0, "OFL" => [path: Adr],
            OflPtr = Base:0xE1, "OFL" => [path: Ptr],
            /// CFL ; close the open file
            Cfl = Base:0xE2, "CFL" => [],
            /// DFL path ; delete a file
            DflAdr = Base:0xE3, "DFL" => [path: Adr],
            DflPtr = Base:0xE4, "DFL" => [path: Ptr],
            /// FEX dst, path ; dst = 1 if the file exists
            FexRegAdr = Base:0xE5, "FEX" => [dst: Reg, path: Adr],
            FexRegPtr = Base:0xE6, "FEX" => [dst: Reg, path: Ptr],
            /// FSZ dst, path ; dst = file size in bytes
            FszRegAdr = Base:0xE7, "FSZ" => [dst: Reg, path: Adr],
            FszRegPtr = Base:0xE8, "FSZ" => [dst: Reg, path: Ptr],
            // =========================
            // Reading
            // =========================
            /// RCC dst ; read a byte from the console
            RccReg = Base:0xF0, "RCC" => [dst: Reg],
            /// RFC dst ; read a byte from the open file
            RfcReg = Base:0xF1, "RFC" => [dst: Reg],

            // =========================
            // Signed: jumps
            // =========================
            /// SIGN_JLT target ; jump if Sign != Overflow
            SignJltAdr = Signed:0x00, "SIGN_JLT" => [target: Adr],
            SignJltPtr = Signed:0x01, "SIGN_JLT" => [target: Ptr],
            /// SIGN_JLE target ; jump if Zero or Sign != Overflow
            SignJleAdr = Signed:0x02, "SIGN_JLE" => [target: Adr],
            SignJlePtr = Signed:0x03, "SIGN_JLE" => [target: Ptr],
            /// SIGN_JGT target ; jump if not Zero and Sign == Overflow
            SignJgtAdr = Signed:0x04, "SIGN_JGT" => [target: Adr],
            SignJgtPtr = Signed:0x05, "SIGN_JGT" => [target: Ptr],
            /// SIGN_JGE target ; jump if Sign == Overflow
            SignJgeAdr = Signed:0x06, "SIGN_JGE" => [target: Adr],
            SignJgePtr = Signed:0x07, "SIGN_JGE" => [target: Ptr],
            /// SIGN_JSI target ; jump if Sign
            SignJsiAdr = Signed:0x08, "SIGN_JSI" => [target: Adr],
            SignJsiPtr = Signed:0x09, "SIGN_JSI" => [target: Ptr],
            /// SIGN_JNS target ; jump if not Sign
            SignJnsAdr = Signed:0x0A, "SIGN_JNS" => [target: Adr],
            SignJnsPtr = Signed:0x0B, "SIGN_JNS" => [target: Ptr],
            /// SIGN_JOV target ; jump if Overflow
            SignJovAdr = Signed:0x0C, "SIGN_JOV" => [target: Adr],
            SignJovPtr = Signed:0x0D, "SIGN_JOV" => [target: Ptr],
            /// SIGN_JNO target ; jump if not Overflow
            SignJnoAdr = Signed:0x0E, "SIGN_JNO" => [target: Adr],
            SignJnoPtr = Signed:0x0F, "SIGN_JNO" => [target: Ptr],
            // =========================
            // Signed: arithmetic
            // =========================
            /// SIGN_DIV dst, src ; signed truncating division
            SignDivRegReg = Signed:0x10, "SIGN_DIV" => [dst: Reg, src: Reg],
            SignDivRegLit = Signed:0x11, "SIGN_DIV" => [dst: Reg, src: Lit],
            SignDivRegAdr = Signed:0x12, "SIGN_DIV" => [dst: Reg, src: Adr],
            SignDivRegPtr = Signed:0x13, "SIGN_DIV" => [dst: Reg, src: Ptr],
            SignDvrRegRegReg = Signed:0x14, "SIGN_DVR" => [quot: Reg, rem: Reg, src: Reg],
            SignDvrRegRegLit = Signed:0x15, "SIGN_DVR" => [quot: Reg, rem: Reg, src: Lit],
            SignDvrRegRegAdr = Signed:0x16, "SIGN_DVR" => [quot: Reg, rem: Reg, src: Adr],
            SignDvrRegRegPtr = Signed:0x17, "SIGN_DVR" => [quot: Reg, rem: Reg, src: Ptr],
            SignRemRegReg = Signed:0x18, "SIGN_REM" => [dst: Reg, src: Reg],
            SignRemRegLit = Signed:0x19, "SIGN_REM" => [dst: Reg, src: Lit],
            SignRemRegAdr = Signed:0x1A, "SIGN_REM" => [dst: Reg, src: Adr],
            SignRemRegPtr = Signed:0x1B, "SIGN_REM" => [dst: Reg, src: Ptr],
            /// SIGN_SHR dst, src ; arithmetic right shift
            SignShrRegReg = Signed:0x20, "SIGN_SHR" => [dst: Reg, src: Reg],
            SignShrRegLit = Signed:0x21, "SIGN_SHR" => [dst: Reg, src: Lit],
            SignShrRegAdr = Signed:0x22, "SIGN_SHR" => [dst: Reg, src: Adr],
            SignShrRegPtr = Signed:0x23, "SIGN_SHR" => [dst: Reg, src: Ptr],
            // =========================
            // Signed: sign-extending moves
            // =========================
            SignMvbRegReg = Signed:0x30, "SIGN_MVB" => [dst: Reg, src: Reg],
            SignMvbRegLit = Signed:0x31, "SIGN_MVB" => [dst: Reg, src: Lit],
            SignMvbRegAdr = Signed:0x32, "SIGN_MVB" => [dst: Reg, src: Adr],
            SignMvbRegPtr = Signed:0x33, "SIGN_MVB" => [dst: Reg, src: Ptr],
            SignMvwRegReg = Signed:0x34, "SIGN_MVW" => [dst: Reg, src: Reg],
            SignMvwRegLit = Signed:0x35, "SIGN_MVW" => [dst: Reg, src: Lit],
            SignMvwRegAdr = Signed:0x36, "SIGN_MVW" => [dst: Reg, src: Adr],
            SignMvwRegPtr = Signed:0x37, "SIGN_MVW" => [dst: Reg, src: Ptr],
            SignMvdRegReg = Signed:0x40, "SIGN_MVD" => [dst: Reg, src: Reg],
            SignMvdRegLit = Signed:0x41, "SIGN_MVD" => [dst: Reg, src: Lit],
            SignMvdRegAdr = Signed:0x42, "SIGN_MVD" => [dst: Reg, src: Adr],
            SignMvdRegPtr = Signed:0x43, "SIGN_MVD" => [dst: Reg, src: Ptr],
            // =========================
            // Signed: output
            // =========================
            SignWcnReg = Signed:0x50, "SIGN_WCN" => [src: Reg],
            SignWcnLit = Signed:0x51, "SIGN_WCN" => [src: Lit],
            SignWcnAdr = Signed:0x52, "SIGN_WCN" => [src: Adr],
            SignWcnPtr = Signed:0x53, "SIGN_WCN" => [src: Ptr],
            SignWcbReg = Signed:0x54, "SIGN_WCB" => [src: Reg],
            SignWcbLit = Signed:0x55, "SIGN_WCB" => [src: Lit],
            SignWcbAdr = Signed:0x56, "SIGN_WCB" => [src: Adr],
            SignWcbPtr = Signed:0x57, "SIGN_WCB" => [src: Ptr],
            SignWfnReg = Signed:0x60, "SIGN_WFN" => [src: Reg],
            SignWfnLit = Signed:0x61, "SIGN_WFN" => [src: Lit],
            SignWfnAdr = Signed:0x62, "SIGN_WFN" => [src: Adr],
            SignWfnPtr = Signed:0x63, "SIGN_WFN" => [src: Ptr],
            SignWfbReg = Signed:0x64, "SIGN_WFB" => [src: Reg],
            SignWfbLit = Signed:0x65, "SIGN_WFB" => [src: Lit],
            SignWfbAdr = Signed:0x66, "SIGN_WFB" => [src: Adr],
            SignWfbPtr = Signed:0x67, "SIGN_WFB" => [src: Ptr],
            // =========================
            // Signed: in-place extension and negation
            // =========================
            SignExbReg = Signed:0x70, "SIGN_EXB" => [dst: Reg],
            SignExwReg = Signed:0x71, "SIGN_EXW" => [dst: Reg],
            SignExdReg = Signed:0x72, "SIGN_EXD" => [dst: Reg],
            SignNegReg = Signed:0x80, "SIGN_NEG" => [dst: Reg],

            // =========================
            // Floating point: arithmetic
            // =========================
            FlptAddRegReg = Floating:0x00, "FLPT_ADD" => [dst: Reg, src: Reg],
            FlptAddRegLit = Floating:0x01, "FLPT_ADD" => [dst: Reg, src: Lit],
            FlptAddRegAdr = Floating:0x02, "FLPT_ADD" => [dst: Reg, src: Adr],
            FlptAddRegPtr = Floating:0x03, "FLPT_ADD" => [dst: Reg, src: Ptr],
            FlptSubRegReg = Floating:0x10, "FLPT_SUB" => [dst: Reg, src: Reg],
            FlptSubRegLit = Floating:0x11, "FLPT_SUB" => [dst: Reg, src: Lit],
            FlptSubRegAdr = Floating:0x12, "FLPT_SUB" => [dst: Reg, src: Adr],
            FlptSubRegPtr = Floating:0x13, "FLPT_SUB" => [dst: Reg, src: Ptr],
            FlptMulRegReg = Floating:0x20, "FLPT_MUL" => [dst: Reg, src: Reg],
            FlptMulRegLit = Floating:0x21, "FLPT_MUL" => [dst: Reg, src: Lit],
            FlptMulRegAdr = Floating:0x22, "FLPT_MUL" => [dst: Reg, src: Adr],
            FlptMulRegPtr = Floating:0x23, "FLPT_MUL" => [dst: Reg, src: Ptr],
            FlptDivRegReg = Floating:0x30, "FLPT_DIV" => [dst: Reg, src: Reg],
            FlptDivRegLit = Floating:0x31, "FLPT_DIV" => [dst: Reg, src: Lit],
            FlptDivRegAdr = Floating:0x32, "FLPT_DIV" => [dst: Reg, src: Adr],
            FlptDivRegPtr = Floating:0x33, "FLPT_DIV" => [dst: Reg, src: Ptr],
            FlptDvrRegRegReg = Floating:0x34, "FLPT_DVR" => [quot: Reg, rem: Reg, src: Reg],
            FlptDvrRegRegLit = Floating:0x35, "FLPT_DVR" => [quot: Reg, rem: Reg, src: Lit],
            FlptDvrRegRegAdr = Floating:0x36, "FLPT_DVR" => [quot: Reg, rem: Reg, src: Adr],
            FlptDvrRegRegPtr = Floating:0x37, "FLPT_DVR" => [quot: Reg, rem: Reg, src: Ptr],
            FlptRemRegReg = Floating:0x38, "FLPT_REM" => [dst: Reg, src: Reg],
            FlptRemRegLit = Floating:0x39, "FLPT_REM" => [dst: Reg, src: Lit],
            FlptRemRegAdr = Floating:0x3A, "FLPT_REM" => [dst: Reg, src: Adr],
            FlptRemRegPtr = Floating:0x3B, "FLPT_REM" => [dst: Reg, src: Ptr],
            // =========================
            // Floating point: trigonometry and powers
            // =========================
            FlptSinReg = Floating:0x40, "FLPT_SIN" => [dst: Reg],
            FlptAsnReg = Floating:0x41, "FLPT_ASN" => [dst: Reg],
            FlptCosReg = Floating:0x42, "FLPT_COS" => [dst: Reg],
            FlptAcsReg = Floating:0x43, "FLPT_ACS" => [dst: Reg],
            FlptTanReg = Floating:0x44, "FLPT_TAN" => [dst: Reg],
            FlptAtnReg = Floating:0x45, "FLPT_ATN" => [dst: Reg],
            /// FLPT_PTN dst, src ; dst = atan2(dst, src)
            FlptPtnRegReg = Floating:0x46, "FLPT_PTN" => [dst: Reg, src: Reg],
            FlptPtnRegLit = Floating:0x47, "FLPT_PTN" => [dst: Reg, src: Lit],
            FlptPtnRegAdr = Floating:0x48, "FLPT_PTN" => [dst: Reg, src: Adr],
            FlptPtnRegPtr = Floating:0x49, "FLPT_PTN" => [dst: Reg, src: Ptr],
            FlptPowRegReg = Floating:0x50, "FLPT_POW" => [dst: Reg, src: Reg],
            FlptPowRegLit = Floating:0x51, "FLPT_POW" => [dst: Reg, src: Lit],
            FlptPowRegAdr = Floating:0x52, "FLPT_POW" => [dst: Reg, src: Adr],
            FlptPowRegPtr = Floating:0x53, "FLPT_POW" => [dst: Reg, src: Ptr],
            /// FLPT_LOG dst, src ; dst = log base src of dst
            FlptLogRegReg = Floating:0x60, "FLPT_LOG" => [dst: Reg, src: Reg],
            FlptLogRegLit = Floating:0x61, "FLPT_LOG" => [dst: Reg, src: Lit],
            FlptLogRegAdr = Floating:0x62, "FLPT_LOG" => [dst: Reg, src: Adr],
            FlptLogRegPtr = Floating:0x63, "FLPT_LOG" => [dst: Reg, src: Ptr],
            // =========================
            // Floating point: output
            // =========================
            FlptWcnReg = Floating:0x70, "FLPT_WCN" => [src: Reg],
            FlptWcnLit = Floating:0x71, "FLPT_WCN" => [src: Lit],
            FlptWcnAdr = Floating:0x72, "FLPT_WCN" => [src: Adr],
            FlptWcnPtr = Floating:0x73, "FLPT_WCN" => [src: Ptr],
            FlptWfnReg = Floating:0x80, "FLPT_WFN" => [src: Reg],
            FlptWfnLit = Floating:0x81, "FLPT_WFN" => [src: Lit],
            FlptWfnAdr = Floating:0x82, "FLPT_WFN" => [src: Adr],
            FlptWfnPtr = Floating:0x83, "FLPT_WFN" => [src: Ptr],
            // =========================
            // Floating point: conversions
            // =========================
            /// FLPT_EXH dst ; half precision bits to double
            FlptExhReg = Floating:0x90, "FLPT_EXH" => [dst: Reg],
            /// FLPT_EXS dst ; single precision bits to double
            FlptExsReg = Floating:0x91, "FLPT_EXS" => [dst: Reg],
            /// FLPT_SHS dst ; double to single precision bits
            FlptShsReg = Floating:0x92, "FLPT_SHS" => [dst: Reg],
            /// FLPT_SHH dst ; double to half precision bits
            FlptShhReg = Floating:0x93, "FLPT_SHH" => [dst: Reg],
            FlptNegReg = Floating:0xA0, "FLPT_NEG" => [dst: Reg],
            /// FLPT_UTF dst ; unsigned integer to double
            FlptUtfReg = Floating:0xB0, "FLPT_UTF" => [dst: Reg],
            /// FLPT_STF dst ; signed integer to double
            FlptStfReg = Floating:0xB1, "FLPT_STF" => [dst: Reg],
            /// FLPT_FTS dst ; double to signed integer, truncating
            FlptFtsReg = Floating:0xC0, "FLPT_FTS" => [dst: Reg],
            /// FLPT_FCS dst ; double to signed integer, ceiling
            FlptFcsReg = Floating:0xC1, "FLPT_FCS" => [dst: Reg],
            /// FLPT_FFS dst ; double to signed integer, floor
            FlptFfsReg = Floating:0xC2, "FLPT_FFS" => [dst: Reg],
            /// FLPT_FNS dst ; double to signed integer, nearest (ties to even)
            FlptFnsReg = Floating:0xC3, "FLPT_FNS" => [dst: Reg],
            /// FLPT_CMP lhs, rhs ; flags of floating comparison
            FlptCmpRegReg = Floating:0xD0, "FLPT_CMP" => [lhs: Reg, rhs: Reg],
            FlptCmpRegLit = Floating:0xD1, "FLPT_CMP" => [lhs: Reg, rhs: Lit],
            FlptCmpRegAdr = Floating:0xD2, "FLPT_CMP" => [lhs: Reg, rhs: Adr],
            FlptCmpRegPtr = Floating:0xD3, "FLPT_CMP" => [lhs: Reg, rhs: Ptr],

            // =========================
            // Extended base
            // =========================
            /// EXTD_BSW dst ; reverse byte order
            ExtdBswReg = Extended:0x00, "EXTD_BSW" => [dst: Reg],
            /// EXTD_QPF dst ; dst = supported feature bits
            ExtdQpfReg = Extended:0x10, "EXTD_QPF" => [dst: Reg],
            /// EXTD_QPV major ; major version
            ExtdQpvReg = Extended:0x11, "EXTD_QPV" => [major: Reg],
            /// EXTD_QPV major, minor ; major and minor version
            ExtdQpvRegReg = Extended:0x12, "EXTD_QPV" => [major: Reg, minor: Reg],
            /// EXTD_CSS dst ; dst = call stack frame size in bytes
            ExtdCssReg = Extended:0x13, "EXTD_CSS" => [dst: Reg],
            /// EXTD_HLT code ; halt with an exit code
            ExtdHltReg = Extended:0x20, "EXTD_HLT" => [code: Reg],
            ExtdHltLit = Extended:0x21, "EXTD_HLT" => [code: Lit],
            ExtdHltAdr = Extended:0x22, "EXTD_HLT" => [code: Adr],
            ExtdHltPtr = Extended:0x23, "EXTD_HLT" => [code: Ptr],
            /// EXTD_MPA dst, ptr ; dst = effective address of ptr
            ExtdMpaRegPtr = Extended:0x30, "EXTD_MPA" => [dst: Reg, src: Ptr],
            ExtdMpaAdrPtr = Extended:0x31, "EXTD_MPA" => [dst: Adr, src: Ptr],
            ExtdMpaPtrPtr = Extended:0x32, "EXTD_MPA" => [dst: Ptr, src: Ptr],

            // =========================
            // External assembly
            // =========================
            /// ASMX_LDA name ; open an external library
            AsmxLdaAdr = External:0x00, "ASMX_LDA" => [name: Adr],
            AsmxLdaPtr = External:0x01, "ASMX_LDA" => [name: Ptr],
            /// ASMX_LDF name ; open a function in the open library
            AsmxLdfAdr = External:0x02, "ASMX_LDF" => [name: Adr],
            AsmxLdfPtr = External:0x03, "ASMX_LDF" => [name: Ptr],
            /// ASMX_CLA ; close the open library
            AsmxCla = External:0x10, "ASMX_CLA" => [],
            /// ASMX_CLF ; close the open function
            AsmxClf = External:0x11, "ASMX_CLF" => [],
            /// ASMX_AEX dst, name ; dst = 1 if the library exists
            AsmxAexRegAdr = External:0x20, "ASMX_AEX" => [dst: Reg, name: Adr],
            AsmxAexRegPtr = External:0x21, "ASMX_AEX" => [dst: Reg, name: Ptr],
            /// ASMX_FEX dst, name ; dst = 1 if the function exists in the open library
            AsmxFexRegAdr = External:0x22, "ASMX_FEX" => [dst: Reg, name: Adr],
            AsmxFexRegPtr = External:0x23, "ASMX_FEX" => [dst: Reg, name: Ptr],
            /// ASMX_CAL [value] ; call the open function
            AsmxCal = External:0x30, "ASMX_CAL" => [],
            AsmxCalReg = External:0x31, "ASMX_CAL" => [value: Reg],
            AsmxCalLit = External:0x32, "ASMX_CAL" => [value: Lit],
            AsmxCalAdr = External:0x33, "ASMX_CAL" => [value: Adr],
            AsmxCalPtr = External:0x34, "ASMX_CAL" => [value: Ptr],

            // =========================
            // Memory allocation
            // =========================
            /// HEAP_ALC dst, size ; dst = address of a new block of size bytes
            HeapAlcRegReg = Allocation:0x00, "HEAP_ALC" => [dst: Reg, size: Reg],
            HeapAlcRegLit = Allocation:0x01, "HEAP_ALC" => [dst: Reg, size: Lit],
            HeapAlcRegAdr = Allocation:0x02, "HEAP_ALC" => [dst: Reg, size: Adr],
            HeapAlcRegPtr = Allocation:0x03, "HEAP_ALC" => [dst: Reg, size: Ptr],
            /// HEAP_TRY dst, size ; as HEAP_ALC, dst = -1 when no region fits
            HeapTryRegReg = Allocation:0x04, "HEAP_TRY" => [dst: Reg, size: Reg],
            HeapTryRegLit = Allocation:0x05, "HEAP_TRY" => [dst: Reg, size: Lit],
            HeapTryRegAdr = Allocation:0x06, "HEAP_TRY" => [dst: Reg, size: Adr],
            HeapTryRegPtr = Allocation:0x07, "HEAP_TRY" => [dst: Reg, size: Ptr],
            /// HEAP_REA block, size ; resize the block at block, which receives its new address
            HeapReaRegReg = Allocation:0x10, "HEAP_REA" => [block: Reg, size: Reg],
            HeapReaRegLit = Allocation:0x11, "HEAP_REA" => [block: Reg, size: Lit],
            HeapReaRegAdr = Allocation:0x12, "HEAP_REA" => [block: Reg, size: Adr],
            HeapReaRegPtr = Allocation:0x13, "HEAP_REA" => [block: Reg, size: Ptr],
            /// HEAP_TRE block, size ; as HEAP_REA, block = -1 when no region fits, -2 when it is not a block
            HeapTreRegReg = Allocation:0x14, "HEAP_TRE" => [block: Reg, size: Reg],
            HeapTreRegLit = Allocation:0x15, "HEAP_TRE" => [block: Reg, size: Lit],
            HeapTreRegAdr = Allocation:0x16, "HEAP_TRE" => [block: Reg, size: Adr],
            HeapTreRegPtr = Allocation:0x17, "HEAP_TRE" => [block: Reg, size: Ptr],
            /// HEAP_FRE block ; release the block at block
            HeapFreReg = Allocation:0x20, "HEAP_FRE" => [block: Reg],
        }
    };
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $set:ident : $opcode:literal, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        /// Every instruction of every supported extension set.
        ///
        /// The discriminant is `set << 8 | opcode`.
        #[repr(u16)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name = ((ExtensionSet::$set as u16) << 8) | $opcode,
            )*
        }

        impl Instruction {
            /// Returns the assembly mnemonic for this instruction.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Instruction::$name => $mnemonic, )*
                }
            }

            pub const fn extension_set(&self) -> ExtensionSet {
                match self {
                    $( Instruction::$name => ExtensionSet::$set, )*
                }
            }

            /// Operand shapes in encoding order.
            pub const fn operands(&self) -> &'static [OperandKind] {
                match self {
                    $( Instruction::$name => &[ $( OperandKind::$kind ),* ], )*
                }
            }
        }

        const fn build_opcode_table(set: ExtensionSet) -> [Option<Instruction>; 256] {
            let mut table = [None; 256];
            $(
                if ExtensionSet::$set as u8 == set as u8 {
                    table[$opcode as usize] = Some(Instruction::$name);
                }
            )*
            table
        }
    };
}

for_each_instruction!(define_instructions);

/// `OPCODE_TABLE[set][opcode]`, one row per [`ExtensionSet`].
static OPCODE_TABLE: [[Option<Instruction>; 256]; ExtensionSet::COUNT] = [
    build_opcode_table(ExtensionSet::Base),
    build_opcode_table(ExtensionSet::Signed),
    build_opcode_table(ExtensionSet::Floating),
    build_opcode_table(ExtensionSet::Extended),
    build_opcode_table(ExtensionSet::External),
    build_opcode_table(ExtensionSet::Allocation),
];

impl Instruction {
    /// Opcode byte within the instruction's extension set.
    pub const fn opcode(&self) -> u8 {
        (*self as u16 & 0xFF) as u8
    }

    /// Bytes before the first operand: the opcode, plus the prefix and set
    /// bytes for extension instructions.
    pub const fn header_len(&self) -> usize {
        match self.extension_set() {
            ExtensionSet::Base => 1,
            _ => 3,
        }
    }

    /// Looks up `opcode` in the table for `set`.
    pub fn lookup(set: ExtensionSet, opcode: u8) -> Result<Instruction, ProcessorError> {
        OPCODE_TABLE[set as usize][opcode as usize].ok_or(ProcessorError::UnknownOpcode {
            extension_set: set as u8,
            opcode,
            offset: 0,
        })
    }

    /// Encodes the opcode bytes (prefix, set and opcode for extension sets).
    pub fn encode_header(&self, out: &mut Vec<u8>) {
        if self.extension_set() != ExtensionSet::Base {
            out.push(EXTENSION_PREFIX);
            out.push(self.extension_set() as u8);
        }
        out.push(self.opcode());
    }
}
