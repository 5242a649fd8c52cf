use super::*;
use crate::disassembly::{Instruction, Operand, OperandNode};
use crate::executor::State;
use crate::reil::Opcode;
use crate::translator::{Options, OptionsBuilder, TranslationEnvironment, Translator};

fn translate(instruction: &Instruction) -> Vec<reil::Instruction> {
    let mut environment = TranslationEnvironment::default();
    Arm::new().translate(&mut environment, instruction).unwrap()
}

fn init_state(registers: &[(Register, u64)], memory: &[(u64, u64, usize)]) -> State {
    let mut state = State::new();
    for &(register, value) in registers {
        state.set_register(register, value);
    }
    for &(address, value, bytes) in memory {
        state.set_memory(address, value, bytes);
    }
    state
}

fn run(instruction: Instruction, registers: &[(Register, u64)]) -> State {
    run_memory(instruction, registers, &[])
}

fn run_memory(
    instruction: Instruction,
    registers: &[(Register, u64)],
    memory: &[(u64, u64, usize)],
) -> State {
    let mut state = init_state(registers, memory);
    state.execute(&translate(&instruction)).unwrap();
    state
}

fn opcodes(instructions: &[reil::Instruction]) -> Vec<Opcode> {
    instructions.iter().map(|i| i.opcode()).collect()
}

fn regs(names: &[&str]) -> Vec<Operand> {
    names.iter().map(|name| Operand::register(name)).collect()
}

fn with_immediates(names: &[&str], immediates: &[i64]) -> Vec<Operand> {
    let mut operands = regs(names);
    operands.extend(immediates.iter().map(|value| Operand::immediate(*value)));
    operands
}

fn jump(instructions: &[reil::Instruction]) -> &reil::Instruction {
    instructions
        .iter()
        .rev()
        .find(|i| i.is_jcc())
        .expect("no jcc emitted")
}

#[test]
fn mov_then_movs() {
    let mov = translate(&Instruction::new(0x1000, "MOV", regs(&["R1", "R2"])));
    assert_eq!(opcodes(&mov), vec![Opcode::Str]);
    assert_eq!(mov[0].address(), 0x10_0000);

    let movs = translate(&Instruction::new(0x1004, "MOVS", regs(&["R1", "R2"])));
    assert_eq!(opcodes(&movs), vec![Opcode::Bsh, Opcode::Bisz, Opcode::Str]);
    for (index, instruction) in movs.iter().enumerate() {
        assert_eq!(instruction.address(), 0x10_0400 + index as u64);
    }

    let state = run(
        Instruction::new(0x1004, "MOVS", regs(&["R1", "R2"])),
        &[(Register::R2, 0x8000_0000), (Register::Z, 1)],
    );
    assert_eq!(state.register(Register::R1), 0x8000_0000);
    assert_eq!(state.register(Register::N), 1);
    assert_eq!(state.register(Register::Z), 0);
}

#[test]
fn predication_envelope() {
    let bic = translate(&Instruction::new(0, "BIC", regs(&["R0", "R1", "R2"])));
    assert!(bic.iter().all(|i| !i.is_jcc() && !i.is_nop()));

    let biceq = translate(&Instruction::new(0, "BICEQ", regs(&["R0", "R1", "R2"])));
    let (skip, _) = biceq
        .iter()
        .enumerate()
        .find(|(_, i)| i.is_jcc())
        .unwrap();
    let landing = biceq.last().unwrap();
    assert!(landing.is_nop());
    assert_eq!(
        *biceq[skip].third(),
        reil::Operand::Address(landing.address())
    );
    // Everything between the jump and the landing is the unconditional body
    assert_eq!(biceq.len() - skip - 2, bic.len());

    let registers = [
        (Register::R0, 0x55),
        (Register::R1, 0xff),
        (Register::R2, 0x0f),
    ];
    let mut skipped = init_state(&registers, &[]);
    skipped.execute(&biceq).unwrap();
    assert_eq!(skipped.register(Register::R0), 0x55);

    let mut taken = init_state(&registers, &[]);
    taken.set_register(Register::Z, 1);
    taken.execute(&biceq).unwrap();
    assert_eq!(taken.register(Register::R0), 0xf0);
}

#[test]
fn always_is_unconditional() {
    let moval = translate(&Instruction::new(0, "MOVAL", regs(&["R0", "R1"])));
    assert_eq!(opcodes(&moval), vec![Opcode::Str]);
}

#[test]
fn subs_self_flags() {
    for value in [0, 1, 0x7fff_ffff, 0x8000_0000, 0xffff_ffff].iter() {
        let state = run(
            Instruction::new(0, "SUBS", regs(&["R0", "R0", "R0"])),
            &[(Register::R0, *value), (Register::N, 1), (Register::V, 1)],
        );
        assert_eq!(state.register(Register::R0), 0);
        assert_eq!(state.register(Register::Z), 1);
        assert_eq!(state.register(Register::N), 0);
        assert_eq!(state.register(Register::C), 1);
        assert_eq!(state.register(Register::V), 0);
    }
}

// (result, N, Z, C, V) of x + y + carry
fn add_with_carry(x: u64, y: u64, carry: u64) -> (u64, u64, u64, u64, u64) {
    let unsigned = x + y + carry;
    let signed = x as u32 as i32 as i64 + y as u32 as i32 as i64 + carry as i64;
    let result = unsigned & 0xffff_ffff;
    let n = result >> 31;
    let z = (result == 0) as u64;
    let c = (unsigned > 0xffff_ffff) as u64;
    let v = (result as u32 as i32 as i64 != signed) as u64;
    (result, n, z, c, v)
}

#[test]
fn arithmetic_flag_table() {
    let values = [
        (0, 0),
        (1, 0xffff_ffff),
        (0x7fff_ffff, 1),
        (0x8000_0000, 0x8000_0000),
        (0x8000_0000, 1),
        (5, 7),
        (0xffff_ffff, 0xffff_ffff),
    ];
    let not = |value: u64| !value & 0xffff_ffff;

    for &(a, b) in values.iter() {
        for carry in 0..2 {
            let cases = [
                ("ADDS", add_with_carry(a, b, 0)),
                ("ADCS", add_with_carry(a, b, carry)),
                ("SUBS", add_with_carry(a, not(b), 1)),
                ("SBCS", add_with_carry(a, not(b), carry)),
                ("RSBS", add_with_carry(b, not(a), 1)),
                ("RSCS", add_with_carry(b, not(a), carry)),
            ];
            for (mnemonic, (result, n, z, c, v)) in cases.iter() {
                let state = run(
                    Instruction::new(0, *mnemonic, regs(&["R0", "R1", "R2"])),
                    &[(Register::R1, a), (Register::R2, b), (Register::C, carry)],
                );
                let flags = [
                    state.register(Register::N),
                    state.register(Register::Z),
                    state.register(Register::C),
                    state.register(Register::V),
                ];
                assert_eq!(
                    state.register(Register::R0),
                    *result,
                    "{} 0x{:x}, 0x{:x}",
                    mnemonic,
                    a,
                    b
                );
                assert_eq!(
                    flags,
                    [*n, *z, *c, *v],
                    "{} 0x{:x}, 0x{:x} with C={}",
                    mnemonic,
                    a,
                    b,
                    carry
                );
            }

            let comparisons = [
                ("CMP", add_with_carry(a, not(b), 1)),
                ("CMN", add_with_carry(a, b, 0)),
            ];
            for (mnemonic, (_, n, z, c, v)) in comparisons.iter() {
                let state = run(
                    Instruction::new(0, *mnemonic, regs(&["R1", "R2"])),
                    &[(Register::R1, a), (Register::R2, b), (Register::C, carry)],
                );
                let flags = [
                    state.register(Register::N),
                    state.register(Register::Z),
                    state.register(Register::C),
                    state.register(Register::V),
                ];
                assert_eq!(flags, [*n, *z, *c, *v], "{} 0x{:x}, 0x{:x}", mnemonic, a, b);
                assert_eq!(state.register(Register::R1), a);
            }
        }
    }
}

#[test]
fn arithmetic_without_flags() {
    let state = run(
        Instruction::new(0, "ADD", regs(&["R0", "R1", "R2"])),
        &[
            (Register::R1, 0xffff_ffff),
            (Register::R2, 2),
            (Register::C, 0),
            (Register::Z, 1),
        ],
    );
    assert_eq!(state.register(Register::R0), 1);
    assert_eq!(state.register(Register::C), 0);
    assert_eq!(state.register(Register::Z), 1);
}

#[test]
fn shifter_operand_carry() {
    // LSRS R0, R1, #1 shifts bit 0 into C
    let state = run(
        Instruction::new(0, "MOVS", vec![
            Operand::register("R0"),
            Operand::shifted_immediate("LSR", "R1", 1),
        ]),
        &[(Register::R1, 3)],
    );
    assert_eq!(state.register(Register::R0), 1);
    assert_eq!(state.register(Register::C), 1);

    let state = run(
        Instruction::new(0, "ANDS", vec![
            Operand::register("R0"),
            Operand::register("R1"),
            Operand::shifted_register("LSL", "R2", "R3"),
        ]),
        &[
            (Register::R1, 0xffff_ffff),
            (Register::R2, 0x8000_0001),
            (Register::R3, 1),
        ],
    );
    assert_eq!(state.register(Register::R0), 2);
    assert_eq!(state.register(Register::C), 1);

    let state = run(
        Instruction::new(0, "LSLS", with_immediates(&["R0", "R1"], &[4])),
        &[(Register::R1, 0x1000_0001)],
    );
    assert_eq!(state.register(Register::R0), 0x10);
    assert_eq!(state.register(Register::C), 1);

    let state = run(
        Instruction::new(0, "RRXS", regs(&["R0", "R1"])),
        &[(Register::R1, 3), (Register::C, 1)],
    );
    assert_eq!(state.register(Register::R0), 0x8000_0001);
    assert_eq!(state.register(Register::C), 1);
}

#[test]
fn packed_saturation() {
    let qadd16 = || Instruction::new(0, "QADD16", regs(&["R0", "R1", "R2"]));

    let state = run(
        qadd16(),
        &[(Register::R1, 0x0001_7fff), (Register::R2, 0x0001_0001)],
    );
    assert_eq!(state.register(Register::R0), 0x0002_7fff);
    assert_eq!(state.register(Register::Q), 1);

    // Q starts clear in a fresh state, and only a clamp would set it
    let state = run(
        qadd16(),
        &[(Register::R1, 0x0001_0001), (Register::R2, 0x0001_0001)],
    );
    assert_eq!(state.register(Register::R0), 0x0002_0002);
    assert_eq!(state.register(Register::Q), 0);
}

#[test]
fn branch_with_link() {
    let bl = translate(&Instruction::new(0x2000, "BL", vec![Operand::immediate(0x1000)]));
    assert_eq!(jump(&bl).is_call(), Some(true));

    let state = run(
        Instruction::new(0x2000, "BL", vec![Operand::immediate(0x1000)]),
        &[],
    );
    assert_eq!(state.register(Register::Lr), 0x2004);
    assert_eq!(state.branch(), Some(0x1000));

    let state = run(
        Instruction::new(0x2000, "BL", vec![Operand::immediate(0x1000)]).with_thumb(true),
        &[],
    );
    assert_eq!(state.register(Register::Lr), 0x2005);
}

#[test]
fn branch_exchange() {
    let bx_lr = translate(&Instruction::new(0, "BX", regs(&["LR"])));
    assert_eq!(jump(&bx_lr).is_call(), Some(false));

    let bx_r3 = translate(&Instruction::new(0, "BX", regs(&["R3"])));
    assert_eq!(jump(&bx_r3).is_call(), Some(true));

    let state = run(
        Instruction::new(0, "BX", regs(&["LR"])),
        &[(Register::Lr, 0x3001)],
    );
    assert_eq!(state.register(Register::T), 1);
    assert_eq!(state.branch(), Some(0x3000));

    let state = run(
        Instruction::new(0x2000, "BLX", regs(&["R2"]))
            .with_length(2),
        &[(Register::R2, 0x4000), (Register::T, 1)],
    );
    assert_eq!(state.register(Register::T), 0);
    assert_eq!(state.register(Register::Lr), 0x2003);
    assert_eq!(state.branch(), Some(0x4000));

    // BLX label from ARM always switches to Thumb
    let state = run(
        Instruction::new(0x2000, "BLX", vec![Operand::immediate(0x3000)]),
        &[],
    );
    assert_eq!(state.register(Register::T), 1);
    assert_eq!(state.register(Register::Lr), 0x2004);
    assert_eq!(state.branch(), Some(0x3000));
}

#[test]
fn conditional_branch() {
    let b = translate(&Instruction::new(0x2000, "B", vec![Operand::immediate(0x3000)]));
    assert_eq!(jump(&b).is_call(), Some(false));

    let beq = || Instruction::new(0x2000, "BEQ", vec![Operand::immediate(0x3000)]);
    let state = run(beq(), &[(Register::Z, 1)]);
    assert_eq!(state.branch(), Some(0x3000));
    let state = run(beq(), &[(Register::Z, 0)]);
    assert_eq!(state.branch(), None);
}

#[test]
fn compare_and_branch() {
    let cbz = || {
        Instruction::new(0x2000, "CBZ", vec![Operand::register("R0"), Operand::immediate(0x2010)])
            .with_length(2)
    };
    assert_eq!(run(cbz(), &[(Register::R0, 0)]).branch(), Some(0x2010));
    assert_eq!(run(cbz(), &[(Register::R0, 1)]).branch(), None);

    let cbnz = || {
        Instruction::new(0x2000, "CBNZ", vec![Operand::register("R0"), Operand::immediate(0x2010)])
            .with_length(2)
    };
    assert_eq!(run(cbnz(), &[(Register::R0, 0)]).branch(), None);
    assert_eq!(run(cbnz(), &[(Register::R0, 7)]).branch(), Some(0x2010));
}

#[test]
fn table_branches() {
    let tbb = Instruction::new(
        0x2000,
        "TBB",
        vec![Operand::memory_offset("R0", OperandNode::register("R1"))],
    )
    .with_thumb(true);
    let state = run_memory(
        tbb,
        &[(Register::R0, 0x3000), (Register::R1, 2)],
        &[(0x3002, 5, 1)],
    );
    assert_eq!(state.branch(), Some(0x200e));

    let tbh = Instruction::new(
        0x2000,
        "TBH",
        vec![Operand::memory_offset(
            "R0",
            OperandNode::shifted_register("LSL", "R1", 1),
        )],
    )
    .with_thumb(true);
    let instructions = translate(&tbh);
    assert_eq!(jump(&instructions).is_call(), Some(false));
    let state = run_memory(
        tbh,
        &[(Register::R0, 0x3000), (Register::R1, 1)],
        &[(0x3002, 0x0010, 2)],
    );
    assert_eq!(state.branch(), Some(0x2024));
}

fn sign_extend(value: u64, width: usize) -> u64 {
    let shift = 64 - width;
    (((value << shift) as i64) >> shift) as u64 & 0xffff_ffff
}

#[test]
fn bitfield_round_trip() {
    let fields = [
        (4, 8, 0xff80),
        (0, 32, 0x1234_5678),
        (20, 12, 0x7ff),
        (28, 4, 0x9),
        (0, 1, 1),
    ];
    for &(lsb, width, value) in fields.iter() {
        let bfi = Instruction::new(0, "BFI", with_immediates(&["R0", "R1"], &[lsb, width]));
        let sbfx = Instruction::new(4, "SBFX", with_immediates(&["R2", "R0"], &[lsb, width]));

        let mut state = init_state(&[(Register::R0, 0xdead_beef), (Register::R1, value)], &[]);
        state.execute(&translate(&bfi)).unwrap();
        state.execute(&translate(&sbfx)).unwrap();

        let field = value & ((1u64 << width) - 1);
        assert_eq!(
            state.register(Register::R2),
            sign_extend(field, width as usize),
            "lsb {} width {}",
            lsb,
            width
        );
    }
}

#[test]
fn bitfield_insert_keeps_surroundings() {
    let state = run(
        Instruction::new(0, "BFI", with_immediates(&["R0", "R1"], &[8, 8])),
        &[(Register::R0, 0xffff_ffff), (Register::R1, 0x12)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_12ff);

    let state = run(
        Instruction::new(0, "UBFX", with_immediates(&["R0", "R1"], &[28, 4])),
        &[(Register::R1, 0x9000_0000)],
    );
    assert_eq!(state.register(Register::R0), 9);

    let state = run(
        Instruction::new(0, "BFC", with_immediates(&["R0"], &[4, 8])),
        &[(Register::R0, 0xffff_ffff)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_f00f);
}

#[test]
fn unpredictable_bitfields() {
    let sbfx = translate(&Instruction::new(0, "SBFX", with_immediates(&["R0", "R1"], &[24, 12])));
    assert_eq!(opcodes(&sbfx), vec![Opcode::Unkn]);

    // msb below lsb
    let bfc = translate(&Instruction::new(0, "BFC", with_immediates(&["R0"], &[8, 0])));
    assert_eq!(opcodes(&bfc), vec![Opcode::Unkn]);

    let bfi = translate(&Instruction::new(0, "BFI", with_immediates(&["R0", "R1"], &[31, 2])));
    assert_eq!(opcodes(&bfi), vec![Opcode::Unkn]);

    // lsb + width does not fit in an i64
    let ubfx = translate(&Instruction::new(
        0,
        "UBFX",
        with_immediates(&["R0", "R1"], &[i64::MAX, 2]),
    ));
    assert_eq!(opcodes(&ubfx), vec![Opcode::Unkn]);
}

#[test]
fn move_top() {
    let state = run(
        Instruction::new(0, "MOVT", with_immediates(&["R0"], &[0x1234])),
        &[(Register::R0, 0xffff_5678)],
    );
    assert_eq!(state.register(Register::R0), 0x1234_5678);

    let state = run(
        Instruction::new(0, "MOVW", with_immediates(&["R0"], &[0xabcd])),
        &[(Register::R0, 0xffff_ffff)],
    );
    assert_eq!(state.register(Register::R0), 0xabcd);
}

#[test]
fn doubleword_register_pairs() {
    let strd = |first: &str, second: &str| {
        Instruction::new(0, "STRD", vec![
            Operand::register(first),
            Operand::register(second),
            Operand::memory("R0"),
        ])
    };

    assert_eq!(opcodes(&translate(&strd("R1", "R2"))), vec![Opcode::Unkn]);
    assert_eq!(opcodes(&translate(&strd("LR", "PC"))), vec![Opcode::Unkn]);
    assert_eq!(opcodes(&translate(&strd("R2", "R4"))), vec![Opcode::Unkn]);
    // Thumb-2 has no pairing restriction
    assert!(translate(&strd("R1", "R2").with_thumb(true))
        .iter()
        .all(|i| !i.is_unknown()));

    let state = run(
        strd("R2", "R3"),
        &[
            (Register::R0, 0x100),
            (Register::R2, 0x1111_1111),
            (Register::R3, 0x2222_2222),
        ],
    );
    assert_eq!(state.memory(0x100, 4), 0x1111_1111);
    assert_eq!(state.memory(0x104, 4), 0x2222_2222);

    let ldrd = Instruction::new(0, "LDRD", vec![
        Operand::register("R4"),
        Operand::register("R5"),
        Operand::memory_offset("R0", OperandNode::immediate(8)),
    ]);
    let state = run_memory(
        ldrd,
        &[(Register::R0, 0x1000)],
        &[(0x1008, 0x1111_1111, 4), (0x100c, 0x2222_2222, 4)],
    );
    assert_eq!(state.register(Register::R4), 0x1111_1111);
    assert_eq!(state.register(Register::R5), 0x2222_2222);
    assert_eq!(state.register(Register::R0), 0x1000);
}

#[test]
fn push_and_pop() {
    let push = Instruction::new(0, "PUSH", vec![Operand::register_list(&["R4", "LR"])]);
    let state = run(
        push,
        &[
            (Register::Sp, 0x2000),
            (Register::R4, 0xaaaa),
            (Register::Lr, 0xbbbb),
        ],
    );
    assert_eq!(state.memory(0x1ff8, 4), 0xaaaa);
    assert_eq!(state.memory(0x1ffc, 4), 0xbbbb);
    assert_eq!(state.register(Register::Sp), 0x1ff8);

    let pop = Instruction::new(0, "POP", vec![Operand::register_list(&["R4", "PC"])]);
    let instructions = translate(&pop);
    assert_eq!(jump(&instructions).is_call(), Some(false));
    let state = run_memory(
        pop,
        &[(Register::Sp, 0x1ff8)],
        &[(0x1ff8, 0x1234, 4), (0x1ffc, 0x3001, 4)],
    );
    assert_eq!(state.register(Register::R4), 0x1234);
    assert_eq!(state.register(Register::Sp), 0x2000);
    assert_eq!(state.register(Register::T), 1);
    assert_eq!(state.branch(), Some(0x3000));
}

#[test]
fn block_transfers() {
    let memory = [(0x100, 0x11, 4), (0x104, 0x22, 4), (0x108, 0x33, 4)];

    let ldmia = Instruction::new(0, "LDMIA", vec![
        Operand::write_back("R0"),
        Operand::register_list(&["R1", "R2"]),
    ]);
    let state = run_memory(ldmia, &[(Register::R0, 0x100)], &memory);
    assert_eq!(state.register(Register::R1), 0x11);
    assert_eq!(state.register(Register::R2), 0x22);
    assert_eq!(state.register(Register::R0), 0x108);

    let ldmda = Instruction::new(0, "LDMDA", vec![
        Operand::register("R0"),
        Operand::register_list(&["R1", "R2"]),
    ]);
    let state = run_memory(ldmda, &[(Register::R0, 0x108)], &memory);
    assert_eq!(state.register(Register::R1), 0x22);
    assert_eq!(state.register(Register::R2), 0x33);
    assert_eq!(state.register(Register::R0), 0x108);

    // A loaded base register keeps the loaded value
    let ldm = Instruction::new(0, "LDM", vec![
        Operand::write_back("R0"),
        Operand::register_list(&["R0", "R1"]),
    ]);
    let state = run_memory(ldm, &[(Register::R0, 0x100)], &memory);
    assert_eq!(state.register(Register::R0), 0x11);
    assert_eq!(state.register(Register::R1), 0x22);

    let stmib = Instruction::new(0, "STMIB", vec![
        Operand::register("R0"),
        Operand::register_list(&["R2", "R1"]),
    ]);
    let state = run(
        stmib,
        &[(Register::R0, 0x200), (Register::R1, 0x44), (Register::R2, 0x55)],
    );
    assert_eq!(state.memory(0x204, 4), 0x44);
    assert_eq!(state.memory(0x208, 4), 0x55);
    assert_eq!(state.register(Register::R0), 0x200);

    let stmfd = Instruction::new(0, "STMFD", vec![
        Operand::write_back("SP"),
        Operand::register_list(&["R1"]),
    ]);
    let state = run(stmfd, &[(Register::Sp, 0x300), (Register::R1, 0x66)]);
    assert_eq!(state.memory(0x2fc, 4), 0x66);
    assert_eq!(state.register(Register::Sp), 0x2fc);
}

#[test]
fn single_loads() {
    let ldrb = Instruction::new(0, "LDRB", vec![
        Operand::register("R0"),
        Operand::memory_offset("R1", OperandNode::immediate(4)),
    ]);
    let state = run_memory(ldrb, &[(Register::R1, 0x100)], &[(0x104, 0x1234_5680, 4)]);
    assert_eq!(state.register(Register::R0), 0x80);

    let ldrsh = Instruction::new(0, "LDRSH", vec![
        Operand::register("R0"),
        Operand::memory_offset("R1", OperandNode::negated_register("R2")),
    ]);
    let state = run_memory(
        ldrsh,
        &[(Register::R1, 0x110), (Register::R2, 0x10)],
        &[(0x100, 0x8001, 2)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_8001);

    let scaled = Instruction::new(0, "LDR", vec![
        Operand::register("R0"),
        Operand::memory_offset("R1", OperandNode::shifted_register("LSL", "R2", 2)),
    ]);
    let state = run_memory(
        scaled,
        &[(Register::R1, 0x100), (Register::R2, 3)],
        &[(0x10c, 0xcafe_babe, 4)],
    );
    assert_eq!(state.register(Register::R0), 0xcafe_babe);

    // Literal loads use the word aligned PC
    let literal = Instruction::new(0x1000, "LDR", vec![
        Operand::register("R0"),
        Operand::memory_offset("PC", OperandNode::immediate(8)),
    ]);
    let state = run_memory(literal, &[], &[(0x1010, 0x1357, 4)]);
    assert_eq!(state.register(Register::R0), 0x1357);
}

#[test]
fn indexed_addressing() {
    let pre = Instruction::new(0, "LDR", vec![
        Operand::register("R0"),
        Operand::memory_pre_indexed("R1", OperandNode::immediate(4)),
    ]);
    let state = run_memory(pre, &[(Register::R1, 0x100)], &[(0x104, 7, 4)]);
    assert_eq!(state.register(Register::R0), 7);
    assert_eq!(state.register(Register::R1), 0x104);

    let post = Instruction::new(0, "LDR", vec![
        Operand::register("R0"),
        Operand::memory_post_indexed("R1", OperandNode::immediate(4)),
    ]);
    let state = run_memory(post, &[(Register::R1, 0x100)], &[(0x100, 9, 4)]);
    assert_eq!(state.register(Register::R0), 9);
    assert_eq!(state.register(Register::R1), 0x104);

    // The loaded value wins over the write-back
    let base = Instruction::new(0, "LDR", vec![
        Operand::register("R1"),
        Operand::memory_post_indexed("R1", OperandNode::immediate(4)),
    ]);
    let state = run_memory(base, &[(Register::R1, 0x100)], &[(0x100, 9, 4)]);
    assert_eq!(state.register(Register::R1), 9);

    let strb = Instruction::new(0, "STRB", vec![
        Operand::register("R0"),
        Operand::memory_post_indexed("R1", OperandNode::immediate(-1)),
    ]);
    let state = run_memory(
        strb,
        &[(Register::R0, 0x1234), (Register::R1, 0x100)],
        &[(0x100, 0xffff_ffff, 4)],
    );
    assert_eq!(state.memory(0x100, 4), 0xffff_ff34);
    assert_eq!(state.register(Register::R1), 0xff);
}

#[test]
fn load_into_pc_interworks() {
    let ldr = Instruction::new(0, "LDR", vec![
        Operand::register("PC"),
        Operand::memory("R0"),
    ]);
    let state = run_memory(ldr, &[(Register::R0, 0x100)], &[(0x100, 0x8001, 4)]);
    assert_eq!(state.register(Register::T), 1);
    assert_eq!(state.branch(), Some(0x8000));
}

#[test]
fn swap() {
    let swp = Instruction::new(0, "SWP", vec![
        Operand::register("R0"),
        Operand::register("R1"),
        Operand::memory("R2"),
    ]);
    let state = run_memory(
        swp,
        &[(Register::R1, 0x55), (Register::R2, 0x100)],
        &[(0x100, 0x66, 4)],
    );
    assert_eq!(state.register(Register::R0), 0x66);
    assert_eq!(state.memory(0x100, 4), 0x55);
}

#[test]
fn exclusive_transfers() {
    let source = [(0x100, 0x1234_5678, 4)];
    let state = run_memory(
        Instruction::new(0, "LDREX", vec![Operand::register("R0"), Operand::memory("R1")]),
        &[(Register::R1, 0x100)],
        &source,
    );
    assert_eq!(state.register(Register::R0), 0x1234_5678);

    let state = run_memory(
        Instruction::new(0, "LDREXB", vec![
            Operand::register("R0"),
            Operand::memory_offset("R1", OperandNode::immediate(1)),
        ]),
        &[(Register::R1, 0x100)],
        &source,
    );
    assert_eq!(state.register(Register::R0), 0x56);

    let state = run_memory(
        Instruction::new(0, "LDREXD", vec![
            Operand::register("R0"),
            Operand::register("R1"),
            Operand::memory("R2"),
        ]),
        &[(Register::R2, 0x100)],
        &[(0x100, 0x1111, 4), (0x104, 0x2222, 4)],
    );
    assert_eq!(state.register(Register::R0), 0x1111);
    assert_eq!(state.register(Register::R1), 0x2222);

    // Exclusive stores always succeed
    let state = run(
        Instruction::new(0, "STREXH", vec![
            Operand::register("R2"),
            Operand::register("R0"),
            Operand::memory("R1"),
        ]),
        &[(Register::R0, 0xaabb_ccdd), (Register::R1, 0x100), (Register::R2, 7)],
    );
    assert_eq!(state.register(Register::R2), 0);
    assert_eq!(state.memory(0x100, 4), 0xccdd);

    let state = run(
        Instruction::new(0, "STREXD", vec![
            Operand::register("R4"),
            Operand::register("R0"),
            Operand::register("R1"),
            Operand::memory("R2"),
        ]),
        &[
            (Register::R0, 0x3333),
            (Register::R1, 0x4444),
            (Register::R2, 0x100),
            (Register::R4, 1),
        ],
    );
    assert_eq!(state.register(Register::R4), 0);
    assert_eq!(state.memory(0x100, 4), 0x3333);
    assert_eq!(state.memory(0x104, 4), 0x4444);
}

#[test]
fn status_register_moves() {
    let msr = |value: u64| {
        run(
            Instruction::new(0, "MSR", regs(&["APSR_nzcvq", "R0"])),
            &[(Register::R0, value), (Register::C, 1)],
        )
    };

    let state = msr(0x1000_0000);
    assert_eq!(state.register(Register::V), 1);
    assert_eq!(state.register(Register::C), 0);
    assert_eq!(state.register(Register::N), 0);
    assert_eq!(state.register(Register::Z), 0);

    let state = msr(0x2000_0000);
    assert_eq!(state.register(Register::V), 0);
    assert_eq!(state.register(Register::C), 1);

    let state = run(
        Instruction::new(0, "MSR", vec![
            Operand::register("CPSR_f"),
            Operand::immediate(0xf000_0000),
        ]),
        &[(Register::Q, 1)],
    );
    for flag in [Register::N, Register::Z, Register::C, Register::V].iter() {
        assert_eq!(state.register(*flag), 1);
    }
    assert_eq!(state.register(Register::Q), 0);

    let state = run(
        Instruction::new(0, "MSR", regs(&["APSR_g", "R0"])),
        &[(Register::R0, 0x000a_0000), (Register::N, 1)],
    );
    assert_eq!(state.register(Register::Ge1), 1);
    assert_eq!(state.register(Register::Ge3), 1);
    assert_eq!(state.register(Register::Ge0), 0);
    assert_eq!(state.register(Register::N), 1);

    let state = run(
        Instruction::new(0, "MRS", regs(&["R1", "APSR"])),
        &[(Register::N, 1), (Register::Q, 1), (Register::Ge2, 1)],
    );
    assert_eq!(state.register(Register::R1), 0x8804_0000);
}

#[test]
fn saved_status_register_is_not_modeled() {
    let msr = Instruction::new(0, "MSR", vec![
        Operand::register("SPSR_f"),
        Operand::immediate(0xf000_0000),
    ]);
    assert_eq!(opcodes(&translate(&msr)), vec![Opcode::Unkn]);
    let state = run(msr, &[]);
    for flag in [Register::N, Register::Z, Register::C, Register::V, Register::Q].iter() {
        assert_eq!(state.register(*flag), 0);
    }
    assert!(state.hit_unknown());

    let state = run(
        Instruction::new(0, "MRS", regs(&["R0", "SPSR"])),
        &[(Register::R0, 5), (Register::N, 1)],
    );
    assert_eq!(state.register(Register::R0), 5);
    assert!(state.hit_unknown());

    let mut environment = TranslationEnvironment::default();
    let result = Arm::new().translate(
        &mut environment,
        &Instruction::new(0, "MRS", regs(&["R0", "R1"])),
    );
    assert!(matches!(result, Err(Error::InvalidOperand { .. })));
}

#[test]
fn multiplies() {
    let state = run(
        Instruction::new(0, "MLA", regs(&["R0", "R1", "R2", "R3"])),
        &[(Register::R1, 3), (Register::R2, 4), (Register::R3, 5)],
    );
    assert_eq!(state.register(Register::R0), 17);

    let state = run(
        Instruction::new(0, "MLS", regs(&["R0", "R1", "R2", "R3"])),
        &[(Register::R1, 3), (Register::R2, 4), (Register::R3, 5)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_fff9);

    let state = run(
        Instruction::new(0, "MULS", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 0x1_0000), (Register::R2, 0x1_0000), (Register::N, 1)],
    );
    assert_eq!(state.register(Register::R0), 0);
    assert_eq!(state.register(Register::Z), 1);
    assert_eq!(state.register(Register::N), 0);
}

#[test]
fn long_multiplies() {
    let operands = || regs(&["R0", "R1", "R2", "R3"]);

    let state = run(
        Instruction::new(0, "UMULL", operands()),
        &[(Register::R2, 0xffff_ffff), (Register::R3, 0xffff_ffff)],
    );
    assert_eq!(state.register(Register::R0), 1);
    assert_eq!(state.register(Register::R1), 0xffff_fffe);

    let state = run(
        Instruction::new(0, "UMAAL", operands()),
        &[
            (Register::R0, 0xffff_ffff),
            (Register::R1, 0xffff_ffff),
            (Register::R2, 0xffff_ffff),
            (Register::R3, 0xffff_ffff),
        ],
    );
    assert_eq!(state.register(Register::R0), 0xffff_ffff);
    assert_eq!(state.register(Register::R1), 0xffff_ffff);

    let state = run(
        Instruction::new(0, "SMULL", operands()),
        &[(Register::R2, 0xffff_fffe), (Register::R3, 3)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_fffa);
    assert_eq!(state.register(Register::R1), 0xffff_ffff);

    let state = run(
        Instruction::new(0, "SMLALS", operands()),
        &[
            (Register::R0, 6),
            (Register::R1, 0),
            (Register::R2, 0xffff_fffe),
            (Register::R3, 3),
        ],
    );
    assert_eq!(state.register(Register::R0), 0);
    assert_eq!(state.register(Register::R1), 0);
    assert_eq!(state.register(Register::Z), 1);

    let state = run(
        Instruction::new(0, "UMLAL", operands()),
        &[
            (Register::R0, 0xffff_ffff),
            (Register::R1, 0),
            (Register::R2, 1),
            (Register::R3, 1),
        ],
    );
    assert_eq!(state.register(Register::R0), 0);
    assert_eq!(state.register(Register::R1), 1);
}

#[test]
fn halfword_multiplies() {
    let operands = || regs(&["R0", "R1", "R2"]);
    let registers = [(Register::R1, 0x4000_0000), (Register::R2, 3)];

    let state = run(Instruction::new(0, "SMMUL", operands()), &registers);
    assert_eq!(state.register(Register::R0), 0);
    let state = run(Instruction::new(0, "SMMULR", operands()), &registers);
    assert_eq!(state.register(Register::R0), 1);

    let state = run(
        Instruction::new(0, "SMULWB", operands()),
        &[(Register::R1, 0x0002_0000), (Register::R2, 0x1234_fffe)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_fffc);

    let state = run(
        Instruction::new(0, "SMULTB", operands()),
        &[(Register::R1, 0xfffe_0000), (Register::R2, 3)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_fffa);

    let state = run(
        Instruction::new(0, "SMLABB", regs(&["R0", "R1", "R2", "R3"])),
        &[
            (Register::R1, 0x8000),
            (Register::R2, 0x8000),
            (Register::R3, 0x4000_0000),
        ],
    );
    assert_eq!(state.register(Register::R0), 0x8000_0000);
    assert_eq!(state.register(Register::Q), 1);
}

#[test]
fn halfword_accumulating_multiplies() {
    let state = run(
        Instruction::new(0, "SMLALBT", regs(&["R0", "R1", "R2", "R3"])),
        &[
            (Register::R0, 1),
            (Register::R1, 0),
            (Register::R2, 0x0000_fffe),
            (Register::R3, 0x0003_0000),
        ],
    );
    assert_eq!(state.register(Register::R0), 0xffff_fffb);
    assert_eq!(state.register(Register::R1), 0xffff_ffff);

    let state = run(
        Instruction::new(0, "SMLALTT", regs(&["R0", "R1", "R2", "R3"])),
        &[
            (Register::R0, 0xffff_ffff),
            (Register::R1, 0),
            (Register::R2, 0x7fff_0000),
            (Register::R3, 0x7fff_0000),
        ],
    );
    assert_eq!(state.register(Register::R0), 0x3fff_0000);
    assert_eq!(state.register(Register::R1), 1);

    let smlawb = |rn: u64, rm: u64, ra: u64| {
        run(
            Instruction::new(0, "SMLAWB", regs(&["R0", "R1", "R2", "R3"])),
            &[(Register::R1, rn), (Register::R2, rm), (Register::R3, ra)],
        )
    };
    let state = smlawb(0x0002_0000, 0x1234_fffe, 10);
    assert_eq!(state.register(Register::R0), 6);
    assert_eq!(state.register(Register::Q), 0);
    let state = smlawb(0x7fff_0000, 0x7fff, 0x7000_0000);
    assert_eq!(state.register(Register::R0), 0xafff_0001);
    assert_eq!(state.register(Register::Q), 1);
}

#[test]
fn dual_multiplies() {
    let dual = |mnemonic: &str, ra: u64| {
        let names: &[&str] = if mnemonic.contains("LA") || mnemonic.contains("LS") {
            &["R0", "R1", "R2", "R3"]
        } else {
            &["R0", "R1", "R2"]
        };
        run(
            Instruction::new(0, mnemonic, regs(names)),
            &[(Register::R1, 0x0003_0002), (Register::R2, 0x0005_0004), (Register::R3, ra)],
        )
    };

    let state = dual("SMUAD", 0);
    assert_eq!(state.register(Register::R0), 23);
    assert_eq!(state.register(Register::Q), 0);
    assert_eq!(dual("SMUADX", 0).register(Register::R0), 22);
    assert_eq!(dual("SMUSD", 0).register(Register::R0), 0xffff_fff9);
    assert_eq!(dual("SMUSDX", 0).register(Register::R0), 0xffff_fffe);
    assert_eq!(dual("SMLAD", 100).register(Register::R0), 123);
    assert_eq!(dual("SMLADX", 100).register(Register::R0), 122);
    assert_eq!(dual("SMLSD", 100).register(Register::R0), 93);
    assert_eq!(dual("SMLSDX", 100).register(Register::R0), 98);

    let state = run(
        Instruction::new(0, "SMUAD", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 0x8000_8000), (Register::R2, 0x8000_8000)],
    );
    assert_eq!(state.register(Register::R0), 0x8000_0000);
    assert_eq!(state.register(Register::Q), 1);

    let state = run(
        Instruction::new(0, "SMLSD", regs(&["R0", "R1", "R2", "R3"])),
        &[(Register::R1, 0x0000_0001), (Register::R2, 0x0000_0001), (Register::R3, 0x7fff_ffff)],
    );
    assert_eq!(state.register(Register::R0), 0x8000_0000);
    assert_eq!(state.register(Register::Q), 1);

    let long = |mnemonic: &str| {
        run(
            Instruction::new(0, mnemonic, regs(&["R0", "R1", "R2", "R3"])),
            &[
                (Register::R0, 0xffff_ffff),
                (Register::R1, 0),
                (Register::R2, 0x0003_0002),
                (Register::R3, 0x0005_0004),
            ],
        )
    };
    let state = long("SMLALD");
    assert_eq!(state.register(Register::R0), 0x16);
    assert_eq!(state.register(Register::R1), 1);
    let state = long("SMLALDX");
    assert_eq!(state.register(Register::R0), 0x15);
    assert_eq!(state.register(Register::R1), 1);
    let state = long("SMLSLD");
    assert_eq!(state.register(Register::R0), 0xffff_fff8);
    assert_eq!(state.register(Register::R1), 0);
    let state = long("SMLSLDX");
    assert_eq!(state.register(Register::R0), 0xffff_fffd);
    assert_eq!(state.register(Register::R1), 0);
}

#[test]
fn most_significant_word_multiplies() {
    let smml = |mnemonic: &str, rm: u64, ra: u64| {
        run(
            Instruction::new(0, mnemonic, regs(&["R0", "R1", "R2", "R3"])),
            &[(Register::R1, 0x4000_0000), (Register::R2, rm), (Register::R3, ra)],
        )
        .register(Register::R0)
    };
    assert_eq!(smml("SMMLA", 3, 1), 1);
    assert_eq!(smml("SMMLAR", 3, 1), 2);
    assert_eq!(smml("SMMLS", 2, 2), 1);
    assert_eq!(smml("SMMLSR", 2, 2), 2);
    assert_eq!(smml("SMMLS", 3, 0), 0xffff_ffff);
}

#[test]
fn divides() {
    let udiv = |n: u64, m: u64| {
        run(
            Instruction::new(0, "UDIV", regs(&["R0", "R1", "R2"])),
            &[(Register::R0, 0xdead), (Register::R1, n), (Register::R2, m)],
        )
        .register(Register::R0)
    };
    assert_eq!(udiv(7, 2), 3);
    assert_eq!(udiv(7, 0), 0);

    let sdiv = |n: u64, m: u64| {
        run(
            Instruction::new(0, "SDIV", regs(&["R0", "R1", "R2"])),
            &[(Register::R0, 0xdead), (Register::R1, n), (Register::R2, m)],
        )
        .register(Register::R0)
    };
    assert_eq!(sdiv(0xffff_fff9, 2), 0xffff_fffd);
    assert_eq!(sdiv(7, 0xffff_fffe), 0xffff_fffd);
    assert_eq!(sdiv(0xffff_fff9, 0xffff_fffe), 3);
    assert_eq!(sdiv(0xffff_fff9, 0), 0);
}

#[test]
fn saturate() {
    let ssat = |value: u64| {
        run(
            Instruction::new(0, "SSAT", vec![
                Operand::register("R0"),
                Operand::immediate(8),
                Operand::register("R1"),
            ]),
            &[(Register::R1, value)],
        )
    };
    let state = ssat(300);
    assert_eq!(state.register(Register::R0), 127);
    assert_eq!(state.register(Register::Q), 1);
    let state = ssat(0xffff_ff00);
    assert_eq!(state.register(Register::R0), 0xffff_ff80);
    assert_eq!(state.register(Register::Q), 1);
    let state = ssat(5);
    assert_eq!(state.register(Register::R0), 5);
    assert_eq!(state.register(Register::Q), 0);

    let usat = |value: u64| {
        run(
            Instruction::new(0, "USAT", vec![
                Operand::register("R0"),
                Operand::immediate(8),
                Operand::register("R1"),
            ]),
            &[(Register::R1, value)],
        )
    };
    assert_eq!(usat(300).register(Register::R0), 255);
    let state = usat(0xffff_fffb);
    assert_eq!(state.register(Register::R0), 0);
    assert_eq!(state.register(Register::Q), 1);

    let state = run(
        Instruction::new(0, "SSAT", vec![
            Operand::register("R0"),
            Operand::immediate(16),
            Operand::shifted_immediate("LSL", "R1", 4),
        ]),
        &[(Register::R1, 0x1000)],
    );
    assert_eq!(state.register(Register::R0), 0x7fff);
}

#[test]
fn halfword_saturate() {
    let saturate16 = |mnemonic: &str, bits: i64, value: u64| {
        run(
            Instruction::new(0, mnemonic, vec![
                Operand::register("R0"),
                Operand::immediate(bits),
                Operand::register("R1"),
            ]),
            &[(Register::R1, value)],
        )
    };

    let state = saturate16("SSAT16", 8, 0x0100_ff00);
    assert_eq!(state.register(Register::R0), 0x007f_ff80);
    assert_eq!(state.register(Register::Q), 1);
    let state = saturate16("SSAT16", 8, 0x0005_fffb);
    assert_eq!(state.register(Register::R0), 0x0005_fffb);
    assert_eq!(state.register(Register::Q), 0);

    let state = saturate16("USAT16", 8, 0x0100_fffb);
    assert_eq!(state.register(Register::R0), 0x00ff_0000);
    assert_eq!(state.register(Register::Q), 1);
    let state = saturate16("USAT16", 8, 0x0012_0034);
    assert_eq!(state.register(Register::R0), 0x0012_0034);
    assert_eq!(state.register(Register::Q), 0);

    let mut environment = TranslationEnvironment::default();
    let result = Arm::new().translate(
        &mut environment,
        &Instruction::new(0, "SSAT16", vec![
            Operand::register("R0"),
            Operand::immediate(17),
            Operand::register("R1"),
        ]),
    );
    assert!(matches!(result, Err(Error::InvalidOperand { .. })));
}

#[test]
fn saturating_arithmetic() {
    let state = run(
        Instruction::new(0, "QADD", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 0x7fff_ffff), (Register::R2, 1)],
    );
    assert_eq!(state.register(Register::R0), 0x7fff_ffff);
    assert_eq!(state.register(Register::Q), 1);

    let state = run(
        Instruction::new(0, "QSUB", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 0x8000_0000), (Register::R2, 1)],
    );
    assert_eq!(state.register(Register::R0), 0x8000_0000);
    assert_eq!(state.register(Register::Q), 1);

    let state = run(
        Instruction::new(0, "QDADD", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 1), (Register::R2, 0x4000_0000)],
    );
    assert_eq!(state.register(Register::R0), 0x7fff_ffff);
    assert_eq!(state.register(Register::Q), 1);

    // Q is sticky
    let state = run(
        Instruction::new(0, "QADD", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 1), (Register::R2, 1), (Register::Q, 1)],
    );
    assert_eq!(state.register(Register::R0), 2);
    assert_eq!(state.register(Register::Q), 1);
}

#[test]
fn bit_counting_and_reversal() {
    let unary = |mnemonic: &str, value: u64| {
        run(
            Instruction::new(0, mnemonic, regs(&["R0", "R1"])),
            &[(Register::R1, value)],
        )
        .register(Register::R0)
    };

    assert_eq!(unary("CLZ", 0x0001_0000), 15);
    assert_eq!(unary("CLZ", 0), 32);
    assert_eq!(unary("CLZ", 0x8000_0000), 0);
    assert_eq!(unary("CLZ", 1), 31);
    assert_eq!(unary("REV", 0x1234_5678), 0x7856_3412);
    assert_eq!(unary("REV16", 0x1234_5678), 0x3412_7856);
    assert_eq!(unary("REVSH", 0x0000_80ff), 0xffff_ff80);
    assert_eq!(unary("REVSH", 0x1234_0012), 0x1200);
    assert_eq!(unary("RBIT", 1), 0x8000_0000);
    assert_eq!(unary("RBIT", 0x1234_5678), 0x1e6a_2c48);
    assert_eq!(unary("SXTH", 0x0001_8000), 0xffff_8000);
    assert_eq!(unary("UXTB", 0x1234_5678), 0x78);
}

#[test]
fn extend_and_pack() {
    let state = run(
        Instruction::new(0, "UXTAB", vec![
            Operand::register("R0"),
            Operand::register("R1"),
            Operand::shifted_immediate("ROR", "R2", 8),
        ]),
        &[(Register::R1, 0x1000), (Register::R2, 0x0000_ab00)],
    );
    assert_eq!(state.register(Register::R0), 0x10ab);

    let state = run(
        Instruction::new(0, "SXTAB", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 0x1000), (Register::R2, 0xff)],
    );
    assert_eq!(state.register(Register::R0), 0xfff);

    let state = run(
        Instruction::new(0, "PKHBT", vec![
            Operand::register("R0"),
            Operand::register("R1"),
            Operand::shifted_immediate("LSL", "R2", 16),
        ]),
        &[(Register::R1, 0x1111_2222), (Register::R2, 0x3333)],
    );
    assert_eq!(state.register(Register::R0), 0x3333_2222);

    let state = run(
        Instruction::new(0, "PKHTB", vec![
            Operand::register("R0"),
            Operand::register("R1"),
            Operand::shifted_immediate("ASR", "R2", 16),
        ]),
        &[(Register::R1, 0x1111_2222), (Register::R2, 0x4444_0000)],
    );
    assert_eq!(state.register(Register::R0), 0x1111_4444);
}

#[test]
fn dual_byte_extend() {
    let state = run(
        Instruction::new(0, "UXTB16", regs(&["R0", "R1"])),
        &[(Register::R1, 0x1234_5678)],
    );
    assert_eq!(state.register(Register::R0), 0x0034_0078);

    let state = run(
        Instruction::new(0, "SXTB16", regs(&["R0", "R1"])),
        &[(Register::R1, 0x0080_00ff)],
    );
    assert_eq!(state.register(Register::R0), 0xff80_ffff);

    let state = run(
        Instruction::new(0, "SXTB16", vec![
            Operand::register("R0"),
            Operand::shifted_immediate("ROR", "R1", 8),
        ]),
        &[(Register::R1, 0x80ff_0000)],
    );
    assert_eq!(state.register(Register::R0), 0xff80_0000);

    // Each halfword wraps without carrying into the other
    let state = run(
        Instruction::new(0, "UXTAB16", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 0x0001_ffff), (Register::R2, 0x0002_0003)],
    );
    assert_eq!(state.register(Register::R0), 0x0003_0002);

    let state = run(
        Instruction::new(0, "SXTAB16", regs(&["R0", "R1", "R2"])),
        &[(Register::R1, 0x0010_0010), (Register::R2, 0x00ff_00fe)],
    );
    assert_eq!(state.register(Register::R0), 0x000f_000e);
}

#[test]
fn unmodeled_opcodes() {
    for mnemonic in ["BKPT", "BXJ", "SVC", "CPSID", "RFEIA", "SRSDB"].iter() {
        let instructions = translate(&Instruction::new(0, *mnemonic, vec![Operand::immediate(0)]));
        assert_eq!(opcodes(&instructions), vec![Opcode::Unkn], "{}", mnemonic);
    }

    for mnemonic in ["NOP", "DMB", "ITTE", "PLD", "CLREX"].iter() {
        let instructions = translate(&Instruction::new(0, *mnemonic, Vec::new()));
        assert_eq!(opcodes(&instructions), vec![Opcode::Nop], "{}", mnemonic);
    }
}

#[test]
fn thumb_negate_sets_flags() {
    let state = run(
        Instruction::new(0x100, "NEG", regs(&["R0", "R1"])).with_length(2),
        &[(Register::R1, 1), (Register::C, 1)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_ffff);
    assert_eq!(state.register(Register::N), 1);
    assert_eq!(state.register(Register::C), 0);

    let state = run(
        Instruction::new(0x100, "NEG", regs(&["R0", "R1"])),
        &[(Register::R1, 1), (Register::C, 1)],
    );
    assert_eq!(state.register(Register::R0), 0xffff_ffff);
    assert_eq!(state.register(Register::N), 0);
    assert_eq!(state.register(Register::C), 1);
}

#[test]
fn thumb_alu_sets_flags() {
    let state = run(
        Instruction::new(0x100, "LSL", with_immediates(&["R0", "R1"], &[4])).with_length(2),
        &[(Register::R1, 0x1000_0001)],
    );
    assert_eq!(state.register(Register::R0), 0x10);
    assert_eq!(state.register(Register::C), 1);

    let and = |mnemonic: &str| {
        Instruction::new(0x100, mnemonic, regs(&["R0", "R1", "R2"]))
            .with_length(2)
    };
    let registers = [(Register::R1, 0x8000_0000), (Register::R2, 0x8000_0001)];
    let state = run(and("AND"), &registers);
    assert_eq!(state.register(Register::R0), 0x8000_0000);
    assert_eq!(state.register(Register::N), 1);

    // Inside an IT block the same encoding leaves the flags alone
    let state = run(and("ANDEQ"), &[registers[0], registers[1], (Register::Z, 1)]);
    assert_eq!(state.register(Register::R0), 0x8000_0000);
    assert_eq!(state.register(Register::N), 0);
    assert_eq!(state.register(Register::Z), 1);

    let state = run(
        Instruction::new(0x100, "AND", regs(&["R0", "R1", "R2"]))
            .with_length(4)
            .with_thumb(true),
        &registers,
    );
    assert_eq!(state.register(Register::N), 0);

    // 16-bit ADD has encodings which leave the flags alone
    let state = run(
        Instruction::new(0x100, "ADD", regs(&["R0", "R1", "R2"])).with_length(2),
        &[(Register::R1, 0x8000_0000), (Register::R2, 0)],
    );
    assert_eq!(state.register(Register::N), 0);
}

#[test]
fn registry_spellings() {
    let arm = Arm::new();
    let opcode = |mnemonic: &str| arm.lookup(mnemonic, false).map(|t| t.opcode());

    assert_eq!(opcode("LDRSBEQ"), Some(ArmOpcode::Ldr));
    assert_eq!(opcode("LDREQSB"), Some(ArmOpcode::Ldr));
    assert_eq!(opcode("ADDSEQ"), Some(ArmOpcode::Add));
    assert_eq!(opcode("ADDEQS"), Some(ArmOpcode::Add));
    assert_eq!(opcode("ldmfd.w"), Some(ArmOpcode::Ldm));
    assert_eq!(opcode("BLS"), Some(ArmOpcode::B));
    assert_eq!(opcode("BLEQ"), Some(ArmOpcode::Bl));
    assert_eq!(opcode("BLX"), Some(ArmOpcode::Blx));
    assert_eq!(opcode("STRHS"), Some(ArmOpcode::Str));
    assert_eq!(opcode("ITTE"), Some(ArmOpcode::Nop));
    assert_eq!(
        opcode("UHADDSUBX"),
        Some(ArmOpcode::Parallel(
            ParallelKind::UnsignedHalving,
            LaneOperation::Asx
        ))
    );
    assert_eq!(opcode("UHADDSUBX"), opcode("UHASX"));
    assert_eq!(opcode("ADRL"), Some(ArmOpcode::Adr));
    assert_eq!(opcode("SMLAL"), Some(ArmOpcode::Smlal));
    assert_eq!(
        opcode("SMLALDX"),
        Some(ArmOpcode::DualMultiplyLong {
            subtract: false,
            exchange: true
        })
    );
    assert_eq!(
        opcode("SMLALTB"),
        Some(ArmOpcode::Smlalxy {
            top_n: true,
            top_m: false
        })
    );
    assert_eq!(opcode("LDREXBEQ"), Some(ArmOpcode::Ldrex));
    assert_eq!(opcode("STREXD"), Some(ArmOpcode::Strex));
    assert_eq!(opcode("SSAT16"), Some(ArmOpcode::Ssat16));
    assert_eq!(opcode("QSUBADDX"), opcode("QSAX"));
    assert_eq!(opcode("VADD.F32"), None);

    assert_eq!(
        arm.lookup("NEG", true).map(|t| t.implicit_flags()),
        Some(true)
    );
    assert_eq!(
        arm.lookup("NEG", false).map(|t| t.implicit_flags()),
        Some(false)
    );
    assert_eq!(arm.lookup("LDR", true).map(|t| t.prefix()), Some("LDR"));
}

#[test]
fn unsupported_mnemonics() {
    let instruction = Instruction::new(0, "VADD.F32", regs(&["S0", "S1", "S2"]));
    assert_eq!(opcodes(&translate(&instruction)), vec![Opcode::Unkn]);

    let options = OptionsBuilder::new().unsupported_are_unknown(false).build();
    let mut environment = TranslationEnvironment::new(options);
    assert!(Arm::new().translate(&mut environment, &instruction).is_err());
}

#[test]
fn malformed_operands() {
    let mut environment = TranslationEnvironment::default();
    let result = Arm::new().translate(
        &mut environment,
        &Instruction::new(0, "ADD", regs(&["R0"])),
    );
    match result {
        Err(Error::OperandCount { expected, actual, .. }) => {
            assert_eq!(expected, vec![3, 2]);
            assert_eq!(actual, 1);
        }
        other => panic!("expected an operand count error, got {:?}", other),
    }

    let result = Arm::new().translate(
        &mut environment,
        &Instruction::new(0, "LDR", regs(&["R0", "R1"])),
    );
    assert!(matches!(result, Err(Error::InvalidAddressingMode { mode: 2, .. })));
}

#[test]
fn batch_isolates_failures() {
    let instructions = vec![
        Instruction::new(0x1000, "MOV", regs(&["R0", "R1"])),
        Instruction::new(0x1004, "ADD", regs(&["R0"])),
        Instruction::new(0x1008, "MOV", regs(&["R1", "R0"])),
    ];

    let translated = Arm::new()
        .translate_batch(&Options::default(), &instructions)
        .unwrap();
    assert_eq!(
        opcodes(&translated),
        vec![Opcode::Str, Opcode::Unkn, Opcode::Str]
    );
    assert_eq!(translated[1].address(), 0x10_0400);

    let options = OptionsBuilder::new().isolate_failures(false).build();
    assert!(Arm::new().translate_batch(&options, &instructions).is_err());
}

#[test]
fn deterministic_and_monotonic() {
    let instructions = vec![
        Instruction::new(0x100, "ADDSNE", regs(&["R0", "R1", "R2"])),
        Instruction::new(0x104, "UQSUB8", regs(&["R0", "R1", "R2"])),
        Instruction::new(0x108, "SMLALGT", regs(&["R0", "R1", "R2", "R3"])),
        Instruction::new(0x10c, "LDMDBEQ", vec![
            Operand::write_back("R0"),
            Operand::register_list(&["R1", "R2", "PC"]),
        ]),
        Instruction::new(0x110, "SSATLT", vec![
            Operand::register("R0"),
            Operand::immediate(12),
            Operand::shifted_immediate("ASR", "R1", 3),
        ]),
    ];

    for instruction in instructions.iter() {
        let first = translate(instruction);
        let second = translate(instruction);
        assert_eq!(first, second, "{}", instruction);
        assert!(!first.is_empty());
        for pair in first.windows(2) {
            assert!(pair[0].address() < pair[1].address(), "{}", instruction);
        }
        assert_eq!(first[0].address(), instruction.address() * 0x100);
    }
}
