//! IL instruction stream model.
//!
//! Method bodies are ordered sequences of [`Instruction`]s over a closed opcode set.
//! The opcode byte values are the real CIL single-byte encodings, so a body reads
//! naturally in any ECMA-335 opcode table; operands are stored structurally (method
//! references by name rather than token) because the container has no metadata
//! tables to index into.
//!
//! Order is semantically significant: inserting at index *i* shifts all subsequent
//! instructions down by one position, removing at index *i* shifts them up.

use std::fmt;

use crate::Result;

/// The opcodes a method body may contain.
///
/// The discriminating byte values follow ECMA-335 III; everything outside this set
/// is rejected by the image reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum OpCode {
    /// Do nothing
    #[strum(serialize = "nop")]
    Nop,
    /// Inform a debugger that a breakpoint has been reached
    #[strum(serialize = "break")]
    Break,
    /// Push a null reference
    #[strum(serialize = "ldnull")]
    LdNull,
    /// Push a 32-bit integer constant
    #[strum(serialize = "ldc.i4")]
    LdcI4,
    /// Duplicate the value on top of the stack
    #[strum(serialize = "dup")]
    Dup,
    /// Remove the value on top of the stack
    #[strum(serialize = "pop")]
    Pop,
    /// Call a method
    #[strum(serialize = "call")]
    Call,
    /// Return from the current method
    #[strum(serialize = "ret")]
    Ret,
    /// Call a method with virtual dispatch
    #[strum(serialize = "callvirt")]
    CallVirt,
    /// Push a string literal
    #[strum(serialize = "ldstr")]
    LdStr,
}

/// Shape of the operand an opcode requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand
    None,
    /// Inline 32-bit integer
    Int32,
    /// Inline string literal
    String,
    /// Inline method reference
    Method,
}

impl OpCode {
    /// The wire encoding of this opcode.
    #[must_use]
    pub fn byte(self) -> u8 {
        match self {
            OpCode::Nop => 0x00,
            OpCode::Break => 0x01,
            OpCode::LdNull => 0x14,
            OpCode::LdcI4 => 0x20,
            OpCode::Dup => 0x25,
            OpCode::Pop => 0x26,
            OpCode::Call => 0x28,
            OpCode::Ret => 0x2A,
            OpCode::CallVirt => 0x6F,
            OpCode::LdStr => 0x72,
        }
    }

    /// Decode an opcode from its wire encoding.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a byte outside the supported set.
    pub fn from_byte(byte: u8) -> Result<OpCode> {
        match byte {
            0x00 => Ok(OpCode::Nop),
            0x01 => Ok(OpCode::Break),
            0x14 => Ok(OpCode::LdNull),
            0x20 => Ok(OpCode::LdcI4),
            0x25 => Ok(OpCode::Dup),
            0x26 => Ok(OpCode::Pop),
            0x28 => Ok(OpCode::Call),
            0x2A => Ok(OpCode::Ret),
            0x6F => Ok(OpCode::CallVirt),
            0x72 => Ok(OpCode::LdStr),
            _ => Err(malformed_error!("Unknown opcode {:#04x}", byte)),
        }
    }

    /// The operand shape this opcode requires.
    #[must_use]
    pub fn operand_kind(self) -> OperandKind {
        match self {
            OpCode::LdcI4 => OperandKind::Int32,
            OpCode::LdStr => OperandKind::String,
            OpCode::Call | OpCode::CallVirt => OperandKind::Method,
            _ => OperandKind::None,
        }
    }
}

/// A structural reference to a method on some type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    /// Full name of the declaring type
    pub declaring_type: String,
    /// Name of the referenced method
    pub name: String,
}

impl MethodRef {
    /// Create a reference to `declaring_type::name`.
    #[must_use]
    pub fn new(declaring_type: &str, name: &str) -> Self {
        MethodRef {
            declaring_type: declaring_type.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// The operand attached to one instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// Inline 32-bit integer
    Int32(i32),
    /// Inline string literal
    String(String),
    /// Inline method reference
    Method(MethodRef),
}

impl Operand {
    /// The shape of this operand.
    #[must_use]
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::None => OperandKind::None,
            Operand::Int32(_) => OperandKind::Int32,
            Operand::String(_) => OperandKind::String,
            Operand::Method(_) => OperandKind::Method,
        }
    }
}

/// One element of a method body.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The operation
    pub opcode: OpCode,
    /// The operand, shaped per [`OpCode::operand_kind`]
    pub operand: Operand,
}

impl Instruction {
    /// Pair an opcode with an operand, enforcing the operand shape.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the operand shape does not match the
    /// opcode. Mismatched pairs are a caller contract violation and never reach the
    /// wire.
    pub fn new(opcode: OpCode, operand: Operand) -> Result<Instruction> {
        if opcode.operand_kind() != operand.kind() {
            return Err(malformed_error!(
                "Opcode '{}' requires a {:?} operand, found {:?}",
                opcode,
                opcode.operand_kind(),
                operand.kind()
            ));
        }

        Ok(Instruction { opcode, operand })
    }

    /// `nop`
    #[must_use]
    pub fn nop() -> Instruction {
        Instruction {
            opcode: OpCode::Nop,
            operand: Operand::None,
        }
    }

    /// `ret`
    #[must_use]
    pub fn ret() -> Instruction {
        Instruction {
            opcode: OpCode::Ret,
            operand: Operand::None,
        }
    }

    /// `ldstr <value>`
    #[must_use]
    pub fn ldstr(value: &str) -> Instruction {
        Instruction {
            opcode: OpCode::LdStr,
            operand: Operand::String(value.to_string()),
        }
    }

    /// `ldc.i4 <value>`
    #[must_use]
    pub fn ldc_i4(value: i32) -> Instruction {
        Instruction {
            opcode: OpCode::LdcI4,
            operand: Operand::Int32(value),
        }
    }

    /// `call <target>`
    #[must_use]
    pub fn call(target: MethodRef) -> Instruction {
        Instruction {
            opcode: OpCode::Call,
            operand: Operand::Method(target),
        }
    }

    /// `true` if this is a `call` whose target matches `target`.
    #[must_use]
    pub fn is_call_to(&self, target: &MethodRef) -> bool {
        self.opcode == OpCode::Call
            && matches!(&self.operand, Operand::Method(m) if m == target)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Operand::None => write!(f, "{}", self.opcode),
            Operand::Int32(value) => write!(f, "{} {}", self.opcode, value),
            Operand::String(value) => write!(f, "{} \"{}\"", self.opcode, value),
            Operand::Method(target) => write!(f, "{} {}", self.opcode, target),
        }
    }
}

/// Executable code of one method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    /// The ordered instruction sequence
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    /// A body holding the given instruction sequence.
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        MethodBody { instructions }
    }

    /// Number of instructions in the body.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// `true` if the body holds no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_byte_roundtrip() {
        let all = [
            OpCode::Nop,
            OpCode::Break,
            OpCode::LdNull,
            OpCode::LdcI4,
            OpCode::Dup,
            OpCode::Pop,
            OpCode::Call,
            OpCode::Ret,
            OpCode::CallVirt,
            OpCode::LdStr,
        ];

        for opcode in all {
            assert_eq!(OpCode::from_byte(opcode.byte()).unwrap(), opcode);
        }

        assert!(OpCode::from_byte(0xFE).is_err());
    }

    #[test]
    fn operand_shape_enforced() {
        assert!(Instruction::new(OpCode::Ret, Operand::None).is_ok());
        assert!(Instruction::new(OpCode::Call, Operand::Int32(1)).is_err());
        assert!(Instruction::new(OpCode::LdStr, Operand::None).is_err());
    }

    #[test]
    fn call_matching() {
        let target = MethodRef::new("StartupScreenController", "ModHostBootstrap");
        let instr = Instruction::call(target.clone());

        assert!(instr.is_call_to(&target));
        assert!(!instr.is_call_to(&MethodRef::new("Other", "ModHostBootstrap")));
        assert!(!Instruction::ret().is_call_to(&target));
    }

    #[test]
    fn display_mnemonics() {
        assert_eq!(Instruction::nop().to_string(), "nop");
        assert_eq!(Instruction::ldc_i4(-3).to_string(), "ldc.i4 -3");
        assert_eq!(
            Instruction::call(MethodRef::new("System.Runtime", "BootstrapModules")).to_string(),
            "call System.Runtime::BootstrapModules"
        );
    }
}
