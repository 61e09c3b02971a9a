use lox::common::chunk::Chunk;
use lox::common::opcode::Opcode;

/// Prints a `Chunk` one instruction at a time: a byte offset, the source
/// line (blank when it repeats the line above), the opcode name, and any
/// operand bytes decoded into their meaning. Used by the `--disassemble`
/// flag.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) {
    println!("== {} ==", name);
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(chunk, offset);
    }
}

fn disassemble_instruction(chunk: &Chunk, offset: usize) -> usize {
    print!("{:04} ", offset);
    if offset > 0 && chunk.lines[offset] == chunk.lines[offset - 1] {
        print!("   | ");
    } else {
        print!("{:4} ", chunk.lines[offset]);
    }

    let op = Opcode::from_byte(chunk.code[offset]);
    match op {
        Opcode::Constant => constant_instruction(chunk, "OP_CONSTANT", offset),
        Opcode::DefineGlobal => constant_instruction(chunk, "OP_DEFINE_GLOBAL", offset),
        Opcode::GetGlobal => constant_instruction(chunk, "OP_GET_GLOBAL", offset),
        Opcode::SetGlobal => constant_instruction(chunk, "OP_SET_GLOBAL", offset),
        Opcode::GetLocal => byte_instruction(chunk, "OP_GET_LOCAL", offset),
        Opcode::SetLocal => byte_instruction(chunk, "OP_SET_LOCAL", offset),
        Opcode::Jump => jump_instruction(chunk, "OP_JUMP", 1, offset),
        Opcode::JumpIfFalse => jump_instruction(chunk, "OP_JUMP_IF_FALSE", 1, offset),
        Opcode::Loop => jump_instruction(chunk, "OP_LOOP", -1, offset),
        simple => {
            println!("{:?}", simple);
            offset + 1
        },
    }
}

fn constant_instruction(chunk: &Chunk, name: &str, offset: usize) -> usize {
    let index = chunk.code[offset + 1];
    println!("{:<18} {:4} '{}'", name, index, chunk.constants[index as usize]);
    offset + 2
}

fn byte_instruction(chunk: &Chunk, name: &str, offset: usize) -> usize {
    let slot = chunk.code[offset + 1];
    println!("{:<18} {:4}", name, slot);
    offset + 2
}

fn jump_instruction(chunk: &Chunk, name: &str, sign: i32, offset: usize) -> usize {
    let jump = chunk.read_u16(offset + 1) as i32;
    let target = offset as i32 + 3 + sign * jump;
    println!("{:<18} {:4} -> {}", name, offset, target);
    offset + 3
}
