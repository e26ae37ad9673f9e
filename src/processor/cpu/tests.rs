use super::*;
use crate::processor::console::BufferConsole;
use crate::processor::interop::InteropRegistry;
use crate::processor::operand::{Displacement, ScaledRegister};
use crate::processor::random::FixedRandom;
use Instruction as I;
use Register::*;

/// Bytecode builder. Operand shapes are checked against the instruction table
/// so a typo in a test fails loudly instead of producing garbage bytecode.
#[derive(Default)]
struct Asm {
    bytes: Vec<u8>,
}

impl Asm {
    fn op(mut self, instruction: Instruction, operands: &[Operand]) -> Self {
        let kinds: Vec<OperandKind> = operands.iter().map(Operand::kind).collect();
        assert_eq!(instruction.operands(), kinds.as_slice(), "{instruction:?}");
        instruction.encode_header(&mut self.bytes);
        for operand in operands {
            match operand {
                Operand::Register(register) => self.bytes.push(*register as u8),
                Operand::Literal(value) | Operand::Address(value) => {
                    self.bytes.extend_from_slice(&value.to_le_bytes())
                }
                Operand::Pointer(pointer) => pointer.encode(&mut self.bytes),
            }
        }
        self
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn build(self) -> Vec<u8> {
        self.bytes
    }
}

fn asm() -> Asm {
    Asm::default()
}

fn reg(register: Register) -> Operand {
    Operand::Register(register)
}

fn lit(value: u64) -> Operand {
    Operand::Literal(value)
}

fn adr(address: u64) -> Operand {
    Operand::Address(address)
}

fn float(value: f64) -> Operand {
    Operand::Literal(value.to_bits())
}

fn boot_with(config: ProcessorConfig, program: &[u8]) -> Processor {
    let mut cpu = Processor::with_config(config);
    cpu.load_program(program).expect("load failed");
    cpu
}

/// Processor with a captured console and a zero random source.
fn boot(program: &[u8]) -> (Processor, BufferConsole) {
    let console = BufferConsole::new();
    let config = ProcessorConfig::default()
        .with_console(console.clone())
        .with_random(FixedRandom::new(Vec::<u64>::new()));
    (boot_with(config, program), console)
}

fn run(program: &[u8]) -> Processor {
    let (mut cpu, _) = boot(program);
    assert_eq!(cpu.execute(true), Ok(true));
    cpu
}

fn step_err(cpu: &mut Processor) -> ProcessorError {
    cpu.execute(false).expect_err("expected error")
}

fn poke_str(cpu: &mut Processor, address: usize, text: &str) {
    let memory = cpu.memory_mut().as_mut_slice();
    memory[address..address + text.len()].copy_from_slice(text.as_bytes());
    memory[address + text.len()] = 0;
}

fn temp_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("assembly_cpu_{}_{name}", std::process::id()))
        .to_string_lossy()
        .into_owned()
}

// ==================== Lifecycle ====================

#[test]
fn initial_registers() {
    let cpu = Processor::new(512);
    assert_eq!(cpu.register(Rpo), 0);
    assert_eq!(cpu.register(Rso), 512);
    assert_eq!(cpu.register(Rsb), 512);
    assert_eq!(cpu.flags(), StatusFlags::NONE);
    assert_eq!(cpu.memory().capacity(), 512);
}

#[test]
fn entry_point_sets_program_offset() {
    let config = ProcessorConfig::default().with_entry_point(2);
    let mut cpu = boot_with(config, &[0x01, 0x01, 0x00]);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rpo), 3);
}

#[test]
fn execute_requires_program() {
    let mut cpu = Processor::new(16);
    assert_eq!(cpu.execute(false), Err(ProcessorError::ProgramNotLoaded));
}

#[test]
fn program_loads_once() {
    let mut cpu = Processor::new(16);
    cpu.load_program(&[0x00]).unwrap();
    assert_eq!(
        cpu.load_program(&[0x00]),
        Err(ProcessorError::ProgramAlreadyLoaded)
    );
}

#[test]
fn program_must_fit() {
    let mut cpu = Processor::new(4);
    assert_eq!(
        cpu.load_program(&[0; 5]),
        Err(ProcessorError::ProgramTooLarge {
            size: 5,
            capacity: 4
        })
    );
}

#[test]
fn halt_stops_loop_immediately() {
    let (mut cpu, _) = boot(&[0x01, 0x00, 0x01]);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rpo), 2);

    let (mut cpu, _) = boot(&[0x00, 0x01, 0x00]);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rpo), 1);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rpo), 3);
}

#[test]
fn single_step_reports_no_halt() {
    let (mut cpu, _) = boot(&[0x01, 0x00]);
    assert_eq!(cpu.execute(false), Ok(false));
    assert_eq!(cpu.register(Rpo), 1);
    assert_eq!(cpu.execute(false), Ok(true));
}

#[test]
fn running_off_the_end_of_memory() {
    let config = ProcessorConfig::default().with_memory_size(4);
    let mut cpu = boot_with(config, &[0x01; 4]);
    assert_eq!(
        cpu.execute(true),
        Err(ProcessorError::EndOfMemory { offset: 4 })
    );
    assert_eq!(cpu.register(Rpo), 4);
}

// ==================== Decoding ====================

#[test]
fn unknown_base_opcode() {
    let (mut cpu, _) = boot(&[0x01, 0xFE]);
    cpu.execute(false).unwrap();
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::UnknownOpcode {
            extension_set: 0,
            opcode: 0xFE,
            offset: 1
        }
    );
    assert_eq!(cpu.register(Rpo), 1);
}

#[test]
fn unknown_extension_set_and_opcode() {
    let (mut cpu, _) = boot(&[0xFF, 0x09, 0x00]);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::UnknownExtensionSet { set: 9, offset: 0 }
    );

    let (mut cpu, _) = boot(&[0xFF, 0x01, 0x81]);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::UnknownOpcode {
            extension_set: 1,
            opcode: 0x81,
            offset: 0
        }
    );
}

#[test]
fn prefixed_base_set_matches_unprefixed() {
    let (mut cpu, _) = boot(&[0xFF, 0x00, 0x14, Rg0 as u8, 0x00]);
    cpu.execute(true).unwrap();
    assert_eq!(cpu.register(Rg0), 1);
    assert_eq!(cpu.register(Rpo), 5);
}

#[test]
fn invalid_register_operand() {
    let (mut cpu, _) = boot(&[0x10, 16, 0x06]);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::InvalidRegister {
            index: 16,
            offset: 1
        }
    );
}

#[test]
fn operand_past_end_of_memory() {
    let config = ProcessorConfig::default().with_memory_size(4);
    let mut cpu = boot_with(config, &[0x99, Rg0 as u8, 0x01, 0x02]);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::TruncatedOperand {
            offset: 2,
            needed: 8,
            available: 2
        }
    );
}

// ==================== Arithmetic ====================

#[test]
fn add_registers() {
    let (mut cpu, _) = boot(&[0x10, Rg7 as u8, Rg8 as u8]);
    cpu.set_register(Rg7, 0x0102030405060708);
    cpu.set_register(Rg8, 0x0807060504030201);
    cpu.set_register(Rsf, StatusFlags::FILE_END.bits());

    assert_eq!(cpu.execute(false), Ok(false));
    assert_eq!(cpu.register(Rg7), 0x0909090909090909);
    assert_eq!(cpu.register(Rg8), 0x0807060504030201);
    assert_eq!(cpu.flags(), StatusFlags::FILE_END);
    assert_eq!(cpu.register(Rpo), 3);
}

#[test]
fn add_flag_properties() {
    let cases: [(u64, u64); 6] = [
        (u64::MAX, 1),
        (i64::MAX as u64, 1),
        (1 << 63, 1 << 63),
        (0, 0),
        (5, 7),
        (u64::MAX, u64::MAX),
    ];
    for (a, b) in cases {
        let program = asm().op(I::AddRegReg, &[reg(Rg0), reg(Rg1)]).build();
        let (mut cpu, _) = boot(&program);
        cpu.set_register(Rg0, a);
        cpu.set_register(Rg1, b);
        cpu.set_register(Rsf, StatusFlags::FILE_END.bits());
        cpu.execute(false).unwrap();

        let sum = a.wrapping_add(b);
        let flags = cpu.flags();
        assert_eq!(cpu.register(Rg0), sum);
        assert_eq!(cpu.register(Rg1), b);
        assert_eq!(flags.contains(StatusFlags::CARRY), sum < a, "{a} + {b}");
        assert_eq!(
            flags.contains(StatusFlags::OVERFLOW),
            (a as i64).checked_add(b as i64).is_none(),
            "{a} + {b}"
        );
        assert_eq!(flags.contains(StatusFlags::ZERO), sum == 0);
        assert_eq!(flags.contains(StatusFlags::SIGN), sum >> 63 == 1);
        assert!(flags.contains(StatusFlags::FILE_END));
    }
}

#[test]
fn subtract_literal_overflows() {
    let mut program = vec![0x21, Rg9 as u8];
    program.extend_from_slice(&1234567u64.to_le_bytes());
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg9, 0x8000000000000000);
    cpu.set_register(Rsf, StatusFlags::FILE_END.bits());

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg9), 0x7FFFFFFFFFED2979);
    assert_eq!(cpu.flags(), StatusFlags::FILE_END | StatusFlags::OVERFLOW);
    assert_eq!(cpu.register(Rpo), 10);
}

#[test]
fn increment_and_decrement() {
    let program = asm()
        .op(I::IcrReg, &[reg(Rg0)])
        .op(I::DcrReg, &[reg(Rg1)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, u64::MAX);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 0);
    assert_eq!(cpu.flags(), StatusFlags::ZERO_AND_CARRY);

    cpu.execute(true).unwrap();
    assert_eq!(cpu.register(Rg1), u64::MAX);
    assert_eq!(cpu.flags(), StatusFlags::CARRY | StatusFlags::SIGN);
}

#[test]
fn multiply_reports_lost_high_bits() {
    let program = asm().op(I::MulRegLit, &[reg(Rg0), lit(2)]).build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 1 << 63);
    cpu.set_register(Rsf, StatusFlags::OVERFLOW.bits());
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 0);
    assert_eq!(
        cpu.flags(),
        StatusFlags::ZERO | StatusFlags::CARRY | StatusFlags::OVERFLOW
    );
}

#[test]
fn divide_registers() {
    let (mut cpu, _) = boot(&[0x40, Rg7 as u8, Rg8 as u8]);
    cpu.set_register(Rg7, 9876543);
    cpu.set_register(Rg8, 3456789);
    cpu.set_register(Rsf, StatusFlags::FILE_END.bits());
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg7), 2);
    assert_eq!(cpu.flags(), StatusFlags::FILE_END);
    assert_eq!(cpu.register(Rpo), 3);
}

#[test]
fn divide_by_zero_changes_nothing() {
    let programs = [
        asm().op(I::DivRegReg, &[reg(Rg7), reg(Rg8)]).build(),
        asm().op(I::DvrRegRegReg, &[reg(Rg7), reg(Rg6), reg(Rg8)]).build(),
        asm().op(I::RemRegLit, &[reg(Rg7), lit(0)]).build(),
        asm().op(I::SignDivRegReg, &[reg(Rg7), reg(Rg8)]).build(),
        asm().op(I::SignRemRegReg, &[reg(Rg7), reg(Rg8)]).build(),
    ];
    for program in programs {
        let (mut cpu, _) = boot(&program);
        cpu.set_register(Rg7, 9876543);
        cpu.set_register(Rsf, StatusFlags::FILE_END.bits());
        let before = *cpu.registers();
        assert!(matches!(
            step_err(&mut cpu),
            ProcessorError::DivideByZero { .. }
        ));
        assert_eq!(*cpu.registers(), before);
    }
}

#[test]
fn divide_with_remainder() {
    let program = asm()
        .op(I::DvrRegRegLit, &[reg(Rg0), reg(Rg1), lit(7)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 45);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 6);
    assert_eq!(cpu.register(Rg1), 3);
}

// ==================== Shifts ====================

#[test]
fn shift_by_zero_leaves_flags() {
    for instruction in [I::ShlRegLit, I::ShrRegLit] {
        let program = asm().op(instruction, &[reg(Rg0), lit(0)]).build();
        let (mut cpu, _) = boot(&program);
        cpu.set_register(Rg0, 0x1234);
        cpu.set_register(Rsf, 0b1010_0110);
        cpu.execute(false).unwrap();
        assert_eq!(cpu.register(Rg0), 0x1234);
        assert_eq!(cpu.register(Rsf), 0b1010_0110);
    }
}

#[test]
fn shift_left() {
    let program = asm().op(I::ShlRegLit, &[reg(Rg0), lit(4)]).build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 0xF000_0000_0000_0001);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 0x10);
    assert_eq!(cpu.flags(), StatusFlags::CARRY);
}

#[test]
fn shift_right_keeps_carry_clear_for_zero_bits() {
    let program = asm().op(I::ShrRegLit, &[reg(Rg0), lit(1)]).build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 2);
    cpu.set_register(Rsf, StatusFlags::CARRY.bits());
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 1);
    assert_eq!(cpu.flags(), StatusFlags::NONE);
}

#[test]
fn shift_by_register_width() {
    for (instruction, initial, carry) in [
        (I::ShlRegLit, 1u64 << 63, true),
        (I::ShlRegLit, 0, false),
        (I::ShrRegLit, 1, true),
        (I::ShrRegLit, u64::MAX, true),
    ] {
        let program = asm().op(instruction, &[reg(Rg0), lit(64)]).build();
        let (mut cpu, _) = boot(&program);
        cpu.set_register(Rg0, initial);
        cpu.execute(false).unwrap();
        assert_eq!(cpu.register(Rg0), 0);
        assert!(cpu.flags().contains(StatusFlags::ZERO));
        assert!(!cpu.flags().contains(StatusFlags::SIGN));
        assert_eq!(cpu.flags().contains(StatusFlags::CARRY), carry);
    }
}

#[test]
fn arithmetic_shift_right() {
    let program = asm()
        .op(I::SignShrRegLit, &[reg(Rg0), lit(2)])
        .op(I::SignShrRegLit, &[reg(Rg1), lit(70)])
        .op(I::SignShrRegLit, &[reg(Rg2), lit(0)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, -16i64 as u64);
    cpu.set_register(Rg1, -16i64 as u64);
    cpu.set_register(Rg2, 0);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), -4i64 as u64);
    assert_eq!(cpu.flags(), StatusFlags::CARRY | StatusFlags::SIGN);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg1), u64::MAX);
    assert_eq!(cpu.flags(), StatusFlags::SIGN);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg2), 0);
    assert_eq!(cpu.flags(), StatusFlags::ZERO);
}

// ==================== Bitwise, random and comparison ====================

#[test]
fn bitwise_operations() {
    let program = asm()
        .op(I::AndRegLit, &[reg(Rg0), lit(0x0F)])
        .op(I::OrrRegLit, &[reg(Rg1), lit(1 << 63)])
        .op(I::XorRegReg, &[reg(Rg2), reg(Rg2)])
        .op(I::NotReg, &[reg(Rg3)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 0xF0);
    cpu.set_register(Rg2, 0xDEAD);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 0);
    assert_eq!(cpu.flags(), StatusFlags::ZERO);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg1), 1 << 63);
    assert_eq!(cpu.flags(), StatusFlags::SIGN);

    cpu.execute(true).unwrap();
    assert_eq!(cpu.register(Rg2), 0);
    assert_eq!(cpu.register(Rg3), u64::MAX);
    assert_eq!(cpu.flags(), StatusFlags::SIGN);
}

#[test]
fn random_numbers_come_from_configured_source() {
    let program = asm()
        .op(I::RngReg, &[reg(Rg0)])
        .op(I::RngReg, &[reg(Rg1)])
        .build();
    let config = ProcessorConfig::default().with_random(FixedRandom::new([0u64, 1 << 63]));
    let mut cpu = boot_with(config, &program);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 0);
    assert_eq!(cpu.flags(), StatusFlags::ZERO);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg1), 1 << 63);
    assert_eq!(cpu.flags(), StatusFlags::SIGN);
}

#[test]
fn test_and_compare_accept_program_offset() {
    let program = asm()
        .op(I::CmpRegLit, &[reg(Rpo), lit(0)])
        .op(I::TstRegLit, &[reg(Rpo), lit(0)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.flags(), StatusFlags::ZERO);
    assert_eq!(cpu.register(Rpo), 10);

    cpu.set_register(Rsf, 0);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.flags(), StatusFlags::ZERO);
    assert_eq!(cpu.register(Rpo), 20);
}

#[test]
fn compare_leaves_operands() {
    let program = asm().op(I::CmpRegReg, &[reg(Rg0), reg(Rg1)]).build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 3);
    cpu.set_register(Rg1, 5);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 3);
    assert_eq!(cpu.register(Rg1), 5);
    assert_eq!(cpu.flags(), StatusFlags::CARRY | StatusFlags::SIGN);
}

#[test]
fn division_and_bitwise_results_clear_carry() {
    let programs = [
        asm().op(I::DivRegLit, &[reg(Rg7), lit(3)]).build(),
        asm().op(I::RemRegLit, &[reg(Rg7), lit(4)]).build(),
        asm().op(I::DvrRegRegLit, &[reg(Rg7), reg(Rg6), lit(2)]).build(),
        asm().op(I::AndRegLit, &[reg(Rg7), lit(0xFF)]).build(),
        asm().op(I::NotReg, &[reg(Rg7)]).build(),
        asm().op(I::TstRegLit, &[reg(Rg7), lit(0xFF)]).build(),
        asm().op(I::SignDivRegLit, &[reg(Rg7), lit(3)]).build(),
        asm().op(I::SignNegReg, &[reg(Rg7)]).build(),
    ];
    for program in programs {
        let (mut cpu, _) = boot(&program);
        cpu.set_register(Rg7, 9);
        cpu.set_register(Rsf, (StatusFlags::CARRY | StatusFlags::FILE_END).bits());
        cpu.execute(false).unwrap();
        let flags = cpu.flags();
        assert!(!flags.contains(StatusFlags::CARRY), "{program:02X?}: {flags:?}");
        assert!(flags.contains(StatusFlags::FILE_END), "{program:02X?}: {flags:?}");
    }
}

#[test]
fn read_only_register_rejected() {
    let programs = [
        asm().op(I::MvqRegLit, &[reg(Rpo), lit(5)]).build(),
        asm().op(I::AddRegReg, &[reg(Rpo), reg(Rg0)]).build(),
        asm().op(I::PopReg, &[reg(Rpo)]).build(),
        asm().op(I::SignNegReg, &[reg(Rpo)]).build(),
    ];
    for program in programs {
        let (mut cpu, _) = boot(&program);
        cpu.set_register(Rg0, 1);
        let registers = *cpu.registers();
        let memory = cpu.memory().clone();
        assert_eq!(
            step_err(&mut cpu),
            ProcessorError::ReadOnlyRegister { register: Rpo }
        );
        assert_eq!(*cpu.registers(), registers);
        assert_eq!(*cpu.memory(), memory);
    }
}

// ==================== Jumps ====================

#[test]
fn conditional_jumps() {
    let program = asm()
        .op(I::CmpRegLit, &[reg(Rg0), lit(5)])
        .op(I::JgeAdr, &[adr(0x100)])
        .op(I::JltAdr, &[adr(0x200)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 3);
    cpu.execute(false).unwrap();
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rpo), 19);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rpo), 0x200);
}

#[test]
fn jump_through_pointer() {
    let target = Pointer {
        base: Rg0,
        width: Width::Qword,
        displacement: Displacement::Constant(-4),
    };
    let program = asm().op(I::JmpPtr, &[target.into()]).build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 0x54);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rpo), 0x50);
}

#[test]
fn signed_jumps() {
    let program = asm()
        .op(I::CmpRegLit, &[reg(Rg0), lit(-5i64 as u64)])
        .op(I::SignJltAdr, &[adr(0x300)])
        .op(I::SignJgtAdr, &[adr(0x400)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 3);
    cpu.execute(false).unwrap();
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rpo), 21);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rpo), 0x400);
}

// ==================== Moves and addressing ====================

#[test]
fn move_round_trip_through_memory() {
    let program = asm()
        .op(I::MvqAdrReg, &[adr(0x200), reg(Rg0)])
        .op(I::MvqRegAdr, &[reg(Rg1), adr(0x200)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 0xDEAD_BEEF_CAFE_F00D);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rg1), 0xDEAD_BEEF_CAFE_F00D);
    assert_eq!(cpu.memory().read_u64(0x200), Ok(0xDEAD_BEEF_CAFE_F00D));
}

#[test]
fn narrow_moves() {
    let program = asm()
        .op(I::MvbRegLit, &[reg(Rg0), lit(0x1234)])
        .op(I::MvwAdrLit, &[adr(0x200), lit(0xAABB_CCDD)])
        .op(I::MvdRegAdr, &[reg(Rg1), adr(0x1FE)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, u64::MAX);
    cpu.memory_mut().write_u64(0x1F8, u64::MAX).unwrap();
    cpu.memory_mut().write_u64(0x200, u64::MAX).unwrap();
    cpu.set_register(Rsf, StatusFlags::CARRY.bits());

    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rg0), 0x34);
    assert_eq!(cpu.memory().read_u64(0x200), Ok(0xFFFF_FFFF_FFFF_CCDD));
    assert_eq!(cpu.register(Rg1), 0xCCDD_FFFF);
    assert_eq!(cpu.flags(), StatusFlags::CARRY);
}

#[test]
fn pointer_with_constant_and_scaled_register() {
    let pointer = Pointer {
        base: Rg2,
        width: Width::Qword,
        displacement: Displacement::Both(
            0x10,
            ScaledRegister {
                register: Rg3,
                exponent: 3,
                subtract: false,
            },
        ),
    };
    let program = asm()
        .op(I::MvqRegPtr, &[reg(Rg0), pointer.into()])
        .op(I::MvqPtrLit, &[pointer.into(), lit(77)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg2, 0x100);
    cpu.set_register(Rg3, 4);
    cpu.memory_mut().write_u64(0x130, 0x1122334455667788).unwrap();

    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rg0), 0x1122334455667788);
    assert_eq!(cpu.memory().read_u64(0x130), Ok(77));
}

#[test]
fn pointer_width_applies_to_arithmetic() {
    let byte_pointer = Pointer {
        base: Rg2,
        width: Width::Byte,
        displacement: Displacement::Register(ScaledRegister {
            register: Rg3,
            exponent: 0,
            subtract: true,
        }),
    };
    let program = asm()
        .op(I::AddRegPtr, &[reg(Rg0), byte_pointer.into()])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg2, 0x108);
    cpu.set_register(Rg3, 8);
    cpu.memory_mut().write_u64(0x100, 0xFFFF_FFFF_FFFF_FF01).unwrap();
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 1);
    assert_eq!(cpu.register(Rpo), 1 + 1 + 2);
}

#[test]
fn memory_out_of_bounds() {
    let program = asm().op(I::MvqRegAdr, &[reg(Rg0), adr(5000)]).build();
    let (mut cpu, _) = boot(&program);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::MemoryOutOfBounds {
            address: 5000,
            width: 8,
            capacity: 2046
        }
    );
    assert_eq!(cpu.register(Rpo), 0);
}

// ==================== Stack and subroutines ====================

#[test]
fn push_and_pop() {
    let program = asm()
        .op(I::PshLit, &[lit(0xAB)])
        .op(I::PopReg, &[reg(Rg0)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rso), 2038);
    assert_eq!(cpu.memory().read_u64(2038), Ok(0xAB));
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 0xAB);
    assert_eq!(cpu.register(Rso), 2046);
}

#[test]
fn push_past_stack_bottom_fails() {
    let program = asm().op(I::PshReg, &[reg(Rg0)]).build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rso, 4);
    assert!(matches!(
        step_err(&mut cpu),
        ProcessorError::MemoryOutOfBounds { .. }
    ));
    assert_eq!(cpu.register(Rso), 4);
}

#[test]
fn call_and_return_with_values() {
    let call = asm().op(I::CalAdrLit, &[adr(20), lit(7)]);
    assert_eq!(call.len(), 17);
    let program = call
        .op(I::Hlt, &[])
        .op(I::Nop, &[])
        .op(I::Nop, &[])
        .op(I::PshLit, &[lit(1)])
        .op(I::RetLit, &[lit(99)])
        .build();
    let (mut cpu, _) = boot(&program);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rpo), 20);
    assert_eq!(cpu.register(Rfp), 7);
    assert_eq!(cpu.register(Rso), 2030);
    assert_eq!(cpu.register(Rsb), 2030);
    assert_eq!(cpu.memory().read_u64(2038), Ok(17));
    assert_eq!(cpu.memory().read_u64(2030), Ok(2046));

    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rrv), 99);
    assert_eq!(cpu.register(Rso), 2046);
    assert_eq!(cpu.register(Rsb), 2046);
    assert_eq!(cpu.register(Rpo), 18);
}

#[test]
fn nested_calls_restore_frames() {
    // 0: CAL 10 ; 9: HLT ; 10: CAL 20 ; 19: RET ; 20: RET
    let program = asm()
        .op(I::CalAdr, &[adr(10)])
        .op(I::Hlt, &[])
        .op(I::CalAdr, &[adr(20)])
        .op(I::Ret, &[])
        .op(I::Ret, &[])
        .build();
    let cpu = run(&program);
    assert_eq!(cpu.register(Rpo), 10);
    assert_eq!(cpu.register(Rso), 2046);
    assert_eq!(cpu.register(Rsb), 2046);
}

// ==================== Signed ====================

#[test]
fn signed_division() {
    let program = asm()
        .op(I::SignDivRegLit, &[reg(Rg0), lit(-2i64 as u64)])
        .op(I::SignRemRegLit, &[reg(Rg1), lit(2)])
        .op(I::SignDvrRegRegLit, &[reg(Rg2), reg(Rg3), lit(-1i64 as u64)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, -7i64 as u64);
    cpu.set_register(Rg1, -7i64 as u64);
    cpu.set_register(Rg2, i64::MIN as u64);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), 3);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg1) as i64, -1);
    assert_eq!(cpu.flags(), StatusFlags::SIGN);
    cpu.execute(true).unwrap();
    assert_eq!(cpu.register(Rg2), i64::MIN as u64);
    assert_eq!(cpu.register(Rg3), 0);
}

#[test]
fn sign_extension() {
    let program = asm()
        .op(I::SignMvbRegLit, &[reg(Rg0), lit(0x80)])
        .op(I::SignMvwRegLit, &[reg(Rg1), lit(0x7FFF)])
        .op(I::SignExdReg, &[reg(Rg2)])
        .op(I::SignNegReg, &[reg(Rg3)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg2, 0xFFFF_FFFF);
    cpu.set_register(Rg3, 5);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rg0), 0xFFFF_FFFF_FFFF_FF80);
    assert_eq!(cpu.register(Rg1), 0x7FFF);
    assert_eq!(cpu.register(Rg2), u64::MAX);
    assert_eq!(cpu.register(Rg3) as i64, -5);
    assert_eq!(cpu.flags(), StatusFlags::SIGN);
}

// ==================== Floating point ====================

#[test]
fn float_arithmetic() {
    let program = asm()
        .op(I::FlptAddRegLit, &[reg(Rg0), float(2.25)])
        .op(I::FlptSubRegLit, &[reg(Rg1), float(-1.0)])
        .op(I::FlptDivRegLit, &[reg(Rg2), float(0.0)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 1.5f64.to_bits());
    cpu.set_register(Rg1, 1.0f64.to_bits());
    cpu.set_register(Rg2, (-3.0f64).to_bits());

    cpu.execute(false).unwrap();
    assert_eq!(f64::from_bits(cpu.register(Rg0)), 3.75);
    assert_eq!(cpu.flags(), StatusFlags::NONE);

    cpu.execute(false).unwrap();
    assert_eq!(f64::from_bits(cpu.register(Rg1)), 2.0);
    assert_eq!(cpu.flags(), StatusFlags::CARRY);

    cpu.execute(false).unwrap();
    assert_eq!(f64::from_bits(cpu.register(Rg2)), f64::NEG_INFINITY);
    assert!(cpu.flags().contains(StatusFlags::SIGN));
}

#[test]
fn float_divide_with_remainder() {
    let program = asm()
        .op(I::FlptDvrRegRegLit, &[reg(Rg0), reg(Rg1), float(2.0)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 7.0f64.to_bits());
    cpu.execute(false).unwrap();
    assert_eq!(f64::from_bits(cpu.register(Rg0)), 3.5);
    assert_eq!(f64::from_bits(cpu.register(Rg1)), 1.0);
}

#[test]
fn float_compare() {
    let program = asm()
        .op(I::FlptCmpRegLit, &[reg(Rg0), float(2.0)])
        .op(I::FlptCmpRegLit, &[reg(Rg0), float(1.0)])
        .op(I::FlptCmpRegLit, &[reg(Rg0), float(f64::NAN)])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 1.0f64.to_bits());

    cpu.execute(false).unwrap();
    assert_eq!(cpu.flags(), StatusFlags::CARRY | StatusFlags::SIGN);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.flags(), StatusFlags::ZERO);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.flags(), StatusFlags::NONE);
    assert_eq!(f64::from_bits(cpu.register(Rg0)), 1.0);
}

#[test]
fn float_conversions() {
    let program = asm()
        .op(I::FlptFnsReg, &[reg(Rg0)])
        .op(I::FlptFtsReg, &[reg(Rg1)])
        .op(I::FlptStfReg, &[reg(Rg2)])
        .op(I::FlptShhReg, &[reg(Rg3)])
        .op(I::FlptExhReg, &[reg(Rg3)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 2.5f64.to_bits());
    cpu.set_register(Rg1, (-7.9f64).to_bits());
    cpu.set_register(Rg2, -3i64 as u64);
    cpu.set_register(Rg3, 1.0f64.to_bits());

    for _ in 0..3 {
        cpu.execute(false).unwrap();
    }
    assert_eq!(cpu.register(Rg0), 2);
    assert_eq!(cpu.register(Rg1) as i64, -7);
    assert_eq!(f64::from_bits(cpu.register(Rg2)), -3.0);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg3), 0x3C00);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(f64::from_bits(cpu.register(Rg3)), 1.0);
}

#[test]
fn float_trigonometry() {
    let program = asm()
        .op(I::FlptSinReg, &[reg(Rg0)])
        .op(I::FlptPtnRegLit, &[reg(Rg1), float(1.0)])
        .op(I::FlptLogRegLit, &[reg(Rg2), float(2.0)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 0.0f64.to_bits());
    cpu.set_register(Rg1, 1.0f64.to_bits());
    cpu.set_register(Rg2, 8.0f64.to_bits());
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(f64::from_bits(cpu.register(Rg0)), 0.0);
    assert!((f64::from_bits(cpu.register(Rg1)) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    assert!((f64::from_bits(cpu.register(Rg2)) - 3.0).abs() < 1e-12);
}

// ==================== Extended base ====================

#[test]
fn memory_address_of_pointer() {
    let pointer = Pointer {
        base: Rg7,
        width: Width::Qword,
        displacement: Displacement::Constant(0x10203040),
    };
    let program = asm()
        .op(I::ExtdMpaRegPtr, &[reg(Rg0), pointer.into()])
        .op(I::ExtdMpaAdrPtr, &[adr(0x300), pointer.into()])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg7, 0x140);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rg0), 0x10203180);
    assert_eq!(cpu.memory().read_u64(0x300), Ok(0x10203180));
    assert_eq!(cpu.flags(), StatusFlags::NONE);
}

#[test]
fn byte_swap_and_queries() {
    let program = asm()
        .op(I::ExtdBswReg, &[reg(Rg0)])
        .op(I::ExtdQpfReg, &[reg(Rg1)])
        .op(I::ExtdQpvRegReg, &[reg(Rg2), reg(Rg3)])
        .op(I::ExtdQpvReg, &[reg(Rg4)])
        .op(I::ExtdCssReg, &[reg(Rg5)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    cpu.set_register(Rg0, 0x0102030405060708);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rg0), 0x0807060504030201);
    assert_eq!(cpu.register(Rg1), 0b11_1110);
    assert_eq!(cpu.register(Rg2), 4);
    assert_eq!(cpu.register(Rg3), 1);
    assert_eq!(cpu.register(Rg4), 4);
    assert_eq!(cpu.register(Rg5), 16);
    assert_eq!(cpu.exit_code(), None);
}

#[test]
fn halt_with_exit_code() {
    let program = asm()
        .op(I::ExtdHltLit, &[lit(0x1_FFFF_FFFF)])
        .op(I::Nop, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.exit_code(), Some(-1));
    assert_eq!(cpu.register(Rpo), 11);
}

// ==================== Console ====================

#[test]
fn console_output_formats() {
    let program = asm()
        .op(I::WcnLit, &[lit(42)])
        .op(I::WcbLit, &[lit(0x1FF)])
        .op(I::WcxLit, &[lit(0xBEEF)])
        .op(I::WccLit, &[lit(b'!' as u64)])
        .op(I::SignWcnLit, &[lit(-5i64 as u64)])
        .op(I::SignWcbLit, &[lit(0xFE)])
        .op(I::FlptWcnLit, &[float(123.456)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, console) = boot(&program);
    cpu.set_register(Rsf, StatusFlags::ZERO.bits());
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(console.output_string(), "42255BEEF!-5-2123.456");
    assert_eq!(cpu.flags(), StatusFlags::ZERO);
}

#[test]
fn console_input() {
    let program = asm()
        .op(I::RccReg, &[reg(Rg0)])
        .op(I::RccReg, &[reg(Rg1)])
        .build();
    let console = BufferConsole::with_input("h");
    let config = ProcessorConfig::default().with_console(console.clone());
    let mut cpu = boot_with(config, &program);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg0), b'h' as u64);
    assert_eq!(step_err(&mut cpu), ProcessorError::ConsoleInputEnded);

    console.push_input("i");
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg1), b'i' as u64);
}

// ==================== Files ====================

#[test]
fn file_round_trip() {
    let path = temp_path("round_trip.txt");
    let _ = std::fs::remove_file(&path);
    let program = asm()
        .op(I::OflAdr, &[adr(0x400)])
        .op(I::WfnLit, &[lit(123)])
        .op(I::WfcLit, &[lit(b'x' as u64)])
        .op(I::Cfl, &[])
        .op(I::FszRegAdr, &[reg(Rg0), adr(0x400)])
        .op(I::FexRegAdr, &[reg(Rg1), adr(0x400)])
        .op(I::OflAdr, &[adr(0x400)])
        .op(I::RfcReg, &[reg(Rg2)])
        .op(I::RfcReg, &[reg(Rg3)])
        .op(I::RfcReg, &[reg(Rg4)])
        .op(I::RfcReg, &[reg(Rg5)])
        .op(I::Cfl, &[])
        .op(I::DflAdr, &[adr(0x400)])
        .op(I::FexRegAdr, &[reg(Rg6), adr(0x400)])
        .op(I::Hlt, &[])
        .build();
    let (mut cpu, _) = boot(&program);
    poke_str(&mut cpu, 0x400, &path);

    cpu.execute(false).unwrap();
    assert!(cpu.flags().contains(StatusFlags::FILE_END));

    for _ in 0..6 {
        cpu.execute(false).unwrap();
    }
    assert_eq!(cpu.register(Rg0), 4);
    assert_eq!(cpu.register(Rg1), 1);
    assert!(!cpu.flags().contains(StatusFlags::FILE_END));

    for _ in 0..3 {
        cpu.execute(false).unwrap();
    }
    assert!(!cpu.flags().contains(StatusFlags::FILE_END));
    cpu.execute(false).unwrap();
    assert!(cpu.flags().contains(StatusFlags::FILE_END));

    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(
        [Rg2, Rg3, Rg4, Rg5].map(|register| cpu.register(register) as u8),
        *b"123x"
    );
    assert_eq!(cpu.register(Rg6), 0);
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn file_misuse() {
    let (mut cpu, _) = boot(&asm().op(I::Cfl, &[]).build());
    assert!(matches!(
        step_err(&mut cpu),
        ProcessorError::FileOperation { .. }
    ));

    let (mut cpu, _) = boot(&asm().op(I::WfnLit, &[lit(1)]).build());
    assert!(matches!(
        step_err(&mut cpu),
        ProcessorError::FileOperation { .. }
    ));

    let path = temp_path("misuse.txt");
    let _ = std::fs::remove_file(&path);
    let program = asm()
        .op(I::OflAdr, &[adr(0x400)])
        .op(I::RfcReg, &[reg(Rg0)])
        .op(I::OflAdr, &[adr(0x400)])
        .build();
    let (mut cpu, _) = boot(&program);
    poke_str(&mut cpu, 0x400, &path);
    cpu.execute(false).unwrap();
    assert!(matches!(
        step_err(&mut cpu),
        ProcessorError::FileOperation { .. }
    ));
    cpu.set_register(Rpo, 11);
    assert!(matches!(
        step_err(&mut cpu),
        ProcessorError::FileOperation { .. }
    ));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn size_of_missing_file() {
    let path = temp_path("missing.txt");
    let _ = std::fs::remove_file(&path);
    let program = asm().op(I::FszRegAdr, &[reg(Rg0), adr(0x400)]).build();
    let (mut cpu, _) = boot(&program);
    poke_str(&mut cpu, 0x400, &path);
    assert!(matches!(
        step_err(&mut cpu),
        ProcessorError::FileOperation { .. }
    ));
    assert_eq!(cpu.register(Rg0), 0);
}

// ==================== External assembly ====================

fn math_library() -> InteropRegistry {
    let mut registry = InteropRegistry::new();
    registry
        .register("math", "add", |memory, registers, passed| {
            registers[Rrv.index()] = registers[Rg0.index()] + passed.unwrap_or(100);
            registers[Rpo.index()] = 999;
            memory[0x600] = 1;
            Ok(())
        })
        .register("math", "fail", |_, _, _| Err("bad input".to_string()));
    registry
}

fn boot_external(program: &[u8]) -> Processor {
    let config = ProcessorConfig::default().with_interop(math_library());
    let mut cpu = boot_with(config, program);
    poke_str(&mut cpu, 0x500, "math");
    poke_str(&mut cpu, 0x510, "add");
    poke_str(&mut cpu, 0x520, "fail");
    poke_str(&mut cpu, 0x530, "nope");
    cpu
}

#[test]
fn external_call() {
    let program = asm()
        .op(I::AsmxLdaAdr, &[adr(0x500)])
        .op(I::AsmxLdfAdr, &[adr(0x510)])
        .op(I::AsmxCalLit, &[lit(5)])
        .op(I::AsmxCal, &[])
        .op(I::AsmxClf, &[])
        .op(I::AsmxCla, &[])
        .op(I::Hlt, &[])
        .build();
    let mut cpu = boot_external(&program);
    cpu.set_register(Rg0, 10);
    cpu.set_register(Rsf, StatusFlags::CARRY.bits());

    cpu.execute(false).unwrap();
    cpu.execute(false).unwrap();
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rrv), 15);
    assert_eq!(cpu.register(Rpo), 33);
    assert_eq!(cpu.memory().read_u8(0x600), Ok(1));

    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rrv), 110);
    assert_eq!(cpu.flags(), StatusFlags::CARRY);
}

#[test]
fn external_existence_queries() {
    let program = asm()
        .op(I::AsmxAexRegAdr, &[reg(Rg0), adr(0x500)])
        .op(I::AsmxAexRegAdr, &[reg(Rg1), adr(0x530)])
        .op(I::AsmxLdaAdr, &[adr(0x500)])
        .op(I::AsmxFexRegAdr, &[reg(Rg2), adr(0x520)])
        .op(I::AsmxFexRegAdr, &[reg(Rg3), adr(0x530)])
        .op(I::Hlt, &[])
        .build();
    let mut cpu = boot_external(&program);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(
        [Rg0, Rg1, Rg2, Rg3].map(|register| cpu.register(register)),
        [1, 0, 1, 0]
    );
}

#[test]
fn external_misuse() {
    let mut cpu = boot_external(&asm().op(I::AsmxCal, &[]).build());
    assert!(matches!(
        step_err(&mut cpu),
        ProcessorError::ExternalOperation { .. }
    ));

    let mut cpu = boot_external(&asm().op(I::AsmxLdaAdr, &[adr(0x530)]).build());
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::InvalidLibrary {
            name: "nope".to_string()
        }
    );

    let program = asm()
        .op(I::AsmxLdaAdr, &[adr(0x500)])
        .op(I::AsmxLdfAdr, &[adr(0x530)])
        .build();
    let mut cpu = boot_external(&program);
    cpu.execute(false).unwrap();
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::InvalidFunction {
            name: "nope".to_string()
        }
    );

    let mut cpu = boot_external(&asm().op(I::AsmxClf, &[]).build());
    assert!(matches!(
        step_err(&mut cpu),
        ProcessorError::ExternalOperation { .. }
    ));
}

#[test]
fn external_function_failure() {
    let program = asm()
        .op(I::AsmxLdaAdr, &[adr(0x500)])
        .op(I::AsmxLdfAdr, &[adr(0x520)])
        .op(I::AsmxCal, &[])
        .build();
    let mut cpu = boot_external(&program);
    cpu.execute(false).unwrap();
    cpu.execute(false).unwrap();
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::ExternalFunctionFailed {
            function: "math::fail".to_string(),
            reason: "bad input".to_string()
        }
    );
    assert_eq!(cpu.register(Rpo), 22);
}

// ==================== Memory allocation ====================

fn boot_sized(memory_size: usize, program: &[u8]) -> Processor {
    let config = ProcessorConfig::default()
        .with_memory_size(memory_size)
        .with_console(BufferConsole::new())
        .with_random(FixedRandom::new(Vec::<u64>::new()));
    boot_with(config, program)
}

#[test]
fn heap_allocation_follows_program() {
    let program = asm()
        .op(I::HeapAlcRegReg, &[reg(Rg2), reg(Rg3)])
        .op(I::HeapAlcRegReg, &[reg(Rg4), reg(Rg3)])
        .build();
    let mut cpu = boot_sized(64, &program);
    cpu.set_register(Rsf, u64::MAX);
    cpu.set_register(Rg3, 16);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rpo), 11);
    assert_eq!(cpu.register(Rg2), 10);
    assert_eq!(cpu.register(Rg4), 26);
    assert_eq!(cpu.register(Rg3), 16);
    assert_eq!(cpu.register(Rsf), u64::MAX);
    assert_eq!(cpu.heap().blocks(), &[10..26, 26..42]);

    let program = asm().op(I::HeapAlcRegLit, &[reg(Rg2), lit(1024)]).build();
    let mut cpu = boot_sized(64, &program);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::MemoryAllocation { size: 1024 }
    );
    assert_eq!(cpu.register(Rg2), 0);
    assert_eq!(cpu.register(Rpo), 0);
    assert!(cpu.heap().blocks().is_empty());
}

#[test]
fn heap_try_reports_no_room() {
    let program = asm()
        .op(I::HeapTryRegLit, &[reg(Rg2), lit(16)])
        .op(I::HeapTryRegLit, &[reg(Rg4), lit(16)])
        .build();
    let mut cpu = boot_sized(64, &program);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rpo), 25);
    assert_eq!(cpu.register(Rg2), 24);
    assert_eq!(cpu.register(Rg4), 40);

    let program = asm().op(I::HeapTryRegLit, &[reg(Rg2), lit(1024)]).build();
    let mut cpu = boot_sized(64, &program);
    assert_eq!(cpu.execute(false), Ok(false));
    assert_eq!(cpu.register(Rpo), 12);
    assert_eq!(cpu.register(Rg2), u64::MAX);
    assert_eq!(cpu.flags(), StatusFlags::NONE);
}

#[test]
fn heap_blocks_stay_below_stack() {
    let program = asm()
        .op(I::PshLit, &[lit(7)])
        .op(I::HeapTryRegLit, &[reg(Rg2), lit(23)])
        .op(I::HeapTryRegLit, &[reg(Rg3), lit(22)])
        .op(I::Hlt, &[])
        .build();
    let mut cpu = boot_sized(64, &program);
    assert_eq!(cpu.execute(true), Ok(true));
    assert_eq!(cpu.register(Rg2), u64::MAX);
    assert_eq!(cpu.register(Rg3), 34);
    assert_eq!(cpu.heap().blocks(), &[34..56]);
    assert_eq!(cpu.memory().read_u64(56), Ok(7));
}

#[test]
fn heap_reallocate_in_place() {
    let program = asm().op(I::HeapReaRegReg, &[reg(Rg2), reg(Rg3)]).build();
    let mut cpu = boot_sized(64, &program);
    cpu.set_register(Rsf, u64::MAX);
    cpu.set_register(Rg3, 8);
    cpu.allocate_memory(16).unwrap();
    let block = cpu.allocate_memory(16).unwrap();
    let spare = cpu.allocate_memory(16).unwrap();
    cpu.free_memory(spare).unwrap();
    cpu.set_register(Rg2, block);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg2), 21);
    assert_eq!(cpu.heap().blocks(), &[5..21, 21..29]);
    assert_eq!(cpu.register(Rg3), 8);
    assert_eq!(cpu.register(Rsf), u64::MAX);
}

#[test]
fn heap_reallocate_moves_contents() {
    let program = asm().op(I::HeapReaRegLit, &[reg(Rg2), lit(32)]).build();
    let mut cpu = boot_sized(128, &program);
    let block = cpu.allocate_memory(16).unwrap();
    cpu.allocate_memory(16).unwrap();
    cpu.memory_mut().write_u64(block, 0x1122334455667788).unwrap();
    cpu.set_register(Rg2, block);

    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg2), 44);
    assert_eq!(cpu.memory().read_u64(44), Ok(0x1122334455667788));
    assert_eq!(cpu.heap().blocks(), &[28..44, 44..76]);
}

#[test]
fn heap_reallocate_errors() {
    let program = asm().op(I::HeapReaRegLit, &[reg(Rg2), lit(1024)]).build();
    let mut cpu = boot_sized(64, &program);
    let block = cpu.allocate_memory(16).unwrap();
    cpu.set_register(Rg2, block);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::MemoryAllocation { size: 1024 }
    );
    assert_eq!(cpu.register(Rg2), 12);
    assert_eq!(cpu.heap().blocks(), &[12..28]);

    let program = asm().op(I::HeapReaRegLit, &[reg(Rg2), lit(8)]).build();
    let mut cpu = boot_sized(64, &program);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::InvalidMemoryBlock { address: 0 }
    );
}

#[test]
fn heap_try_reallocate_reports_failures() {
    let program = asm().op(I::HeapTreRegLit, &[reg(Rg2), lit(1024)]).build();
    let mut cpu = boot_sized(64, &program);
    let block = cpu.allocate_memory(16).unwrap();
    cpu.set_register(Rg2, block);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg2), u64::MAX);
    assert_eq!(cpu.flags(), StatusFlags::NONE);
    assert_eq!(cpu.heap().blocks(), &[12..28]);

    let program = asm().op(I::HeapTreRegLit, &[reg(Rg2), lit(8)]).build();
    let mut cpu = boot_sized(64, &program);
    cpu.execute(false).unwrap();
    assert_eq!(cpu.register(Rg2), u64::MAX - 1);
}

#[test]
fn heap_free() {
    let program = asm().op(I::HeapFreReg, &[reg(Rg3)]).build();
    let mut cpu = boot_sized(64, &program);
    cpu.set_register(Rsf, u64::MAX);
    let block = cpu.allocate_memory(16).unwrap();
    cpu.set_register(Rg3, block);
    cpu.execute(false).unwrap();
    assert!(cpu.heap().blocks().is_empty());
    assert_eq!(cpu.register(Rg3), 4);
    assert_eq!(cpu.register(Rsf), u64::MAX);

    let mut cpu = boot_sized(64, &program);
    let block = cpu.allocate_memory(16).unwrap();
    cpu.set_register(Rg3, block + 6);
    assert_eq!(
        step_err(&mut cpu),
        ProcessorError::InvalidMemoryBlock { address: 10 }
    );
    assert_eq!(cpu.heap().blocks(), &[4..20]);
}
