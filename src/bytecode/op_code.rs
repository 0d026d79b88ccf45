use std::fmt;

use thiserror::Error;

/// Number of low bits of an instruction word that hold the opcode.
pub const OPCODE_BITS: u32 = 8;
const OPCODE_MASK: u32 = (1 << OPCODE_BITS) - 1;

/// Largest operand that fits in an instruction word.
pub const MAX_OPERAND: usize = (u32::MAX >> OPCODE_BITS) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Label = 0,
    Jump = 1,
    CondJump = 2,
    Return = 3,
    RetNull = 4,
    RetTrue = 5,
    RetFalse = 6,
    Panic = 7,
    Nil = 8,
    True = 9,
    False = 10,
    PosInt = 11,
    NegInt = 12,
    Const = 13,
    Arg = 14,
    ArgLen = 15,
    RestArg = 16,
    Load = 17,
    Store = 18,
    NewRef = 19,
    BindRef = 20,
    Deref = 21,
    Capture = 22,
    Current = 23,
    MakeClosure = 24,
    Pop = 25,
    Call0 = 26,
    Call1 = 27,
    Call = 28,
    TailCall = 29,
    PushArgs = 30,
    PopArgs = 31,
    Resolve = 32,
    Declare = 33,
    Private = 34,
    Bind = 35,
    Add = 36,
    Sub = 37,
    Mul = 38,
    Div = 39,
    Mod = 40,
    Neg = 41,
    NumEq = 42,
    NumLt = 43,
    NumLte = 44,
    NumGt = 45,
    NumGte = 46,
    Eq = 47,
    Not = 48,
    Car = 49,
    Cdr = 50,
    Cons = 51,
    Empty = 52,
    NoOp = 53,
}

const OPCODES: [OpCode; 54] = [
    OpCode::Label,
    OpCode::Jump,
    OpCode::CondJump,
    OpCode::Return,
    OpCode::RetNull,
    OpCode::RetTrue,
    OpCode::RetFalse,
    OpCode::Panic,
    OpCode::Nil,
    OpCode::True,
    OpCode::False,
    OpCode::PosInt,
    OpCode::NegInt,
    OpCode::Const,
    OpCode::Arg,
    OpCode::ArgLen,
    OpCode::RestArg,
    OpCode::Load,
    OpCode::Store,
    OpCode::NewRef,
    OpCode::BindRef,
    OpCode::Deref,
    OpCode::Capture,
    OpCode::Current,
    OpCode::MakeClosure,
    OpCode::Pop,
    OpCode::Call0,
    OpCode::Call1,
    OpCode::Call,
    OpCode::TailCall,
    OpCode::PushArgs,
    OpCode::PopArgs,
    OpCode::Resolve,
    OpCode::Declare,
    OpCode::Private,
    OpCode::Bind,
    OpCode::Add,
    OpCode::Sub,
    OpCode::Mul,
    OpCode::Div,
    OpCode::Mod,
    OpCode::Neg,
    OpCode::NumEq,
    OpCode::NumLt,
    OpCode::NumLte,
    OpCode::NumGt,
    OpCode::NumGte,
    OpCode::Eq,
    OpCode::Not,
    OpCode::Car,
    OpCode::Cdr,
    OpCode::Cons,
    OpCode::Empty,
    OpCode::NoOp,
];

impl From<u8> for OpCode {
    fn from(byte: u8) -> Self {
        match OPCODES.get(byte as usize) {
            Some(op) => *op,
            None => panic!("Unknown opcode {}", byte),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// What the operand of an opcode indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActOn {
    Nothing,
    /// A count of operand stack values consumed.
    Stack,
    Locals,
    Labels,
    Constants,
    Arguments,
    Captured,
    /// The operand is the value itself.
    Immediate,
}

/// Static stack and control-flow behavior of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub pop: usize,
    pub push: usize,
    /// The operand is added to `pop`.
    pub dynamic_pop: bool,
    pub operand: ActOn,
    /// Control never falls through to the next instruction.
    pub exits: bool,
    /// Anchors its label operand instead of jumping to it.
    pub anchors: bool,
}

const fn effect(pop: usize, push: usize, operand: ActOn) -> Effect {
    Effect {
        pop,
        push,
        dynamic_pop: false,
        operand,
        exits: false,
        anchors: false,
    }
}

const fn exiting(pop: usize, operand: ActOn) -> Effect {
    Effect {
        pop,
        push: 0,
        dynamic_pop: false,
        operand,
        exits: true,
        anchors: false,
    }
}

const fn counted(pop: usize, push: usize) -> Effect {
    Effect {
        pop,
        push,
        dynamic_pop: true,
        operand: ActOn::Stack,
        exits: false,
        anchors: false,
    }
}

impl OpCode {
    pub fn effect(self) -> Effect {
        use ActOn::*;
        match self {
            OpCode::Label => Effect {
                anchors: true,
                ..effect(0, 0, Labels)
            },
            OpCode::Jump => exiting(0, Labels),
            OpCode::CondJump => effect(1, 0, Labels),
            OpCode::Return | OpCode::Panic => exiting(1, Nothing),
            OpCode::RetNull | OpCode::RetTrue | OpCode::RetFalse => exiting(0, Nothing),
            OpCode::TailCall => Effect {
                dynamic_pop: true,
                ..exiting(1, Stack)
            },
            OpCode::Nil | OpCode::True | OpCode::False => effect(0, 1, Nothing),
            OpCode::PosInt | OpCode::NegInt => effect(0, 1, Immediate),
            OpCode::Const => effect(0, 1, Constants),
            OpCode::Arg | OpCode::RestArg => effect(0, 1, Arguments),
            OpCode::ArgLen => effect(0, 1, Nothing),
            OpCode::Load => effect(0, 1, Locals),
            OpCode::Store => effect(1, 0, Locals),
            OpCode::NewRef | OpCode::Current => effect(0, 1, Nothing),
            OpCode::BindRef => effect(2, 0, Nothing),
            OpCode::Deref => effect(1, 1, Nothing),
            OpCode::Capture => effect(0, 1, Captured),
            OpCode::MakeClosure => counted(1, 1),
            OpCode::Pop => effect(1, 0, Nothing),
            OpCode::Call0 => effect(1, 1, Nothing),
            OpCode::Call1 => effect(2, 1, Nothing),
            OpCode::Call => counted(1, 1),
            OpCode::PushArgs => counted(0, 0),
            OpCode::PopArgs | OpCode::NoOp => effect(0, 0, Nothing),
            OpCode::Resolve => effect(1, 1, Nothing),
            OpCode::Declare | OpCode::Private => effect(1, 0, Nothing),
            OpCode::Bind => effect(2, 0, Nothing),
            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Mod
            | OpCode::NumEq
            | OpCode::NumLt
            | OpCode::NumLte
            | OpCode::NumGt
            | OpCode::NumGte
            | OpCode::Eq
            | OpCode::Cons => effect(2, 1, Nothing),
            OpCode::Neg | OpCode::Not | OpCode::Car | OpCode::Cdr | OpCode::Empty => {
                effect(1, 1, Nothing)
            }
        }
    }

    pub fn has_operand(self) -> bool {
        self.effect().operand != ActOn::Nothing
    }

    /// Packs this opcode with an operand.
    pub fn with(self, operand: usize) -> Result<Instruction, EncodingError> {
        Instruction::new(self, operand)
    }

    /// Packs this opcode with a zero operand.
    pub fn instr(self) -> Instruction {
        Instruction((self as u8) as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operand {operand} for {op} exceeds the maximum of {max}", max = MAX_OPERAND)]
pub struct EncodingError {
    pub op: OpCode,
    pub operand: usize,
}

/// An opcode and its operand packed into one word: opcode in the low
/// `OPCODE_BITS`, operand in the rest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction(u32);

impl Instruction {
    pub fn new(op: OpCode, operand: usize) -> Result<Self, EncodingError> {
        if operand > MAX_OPERAND {
            return Err(EncodingError { op, operand });
        }
        Ok(Self(((operand as u32) << OPCODE_BITS) | op as u32))
    }

    #[inline(always)]
    pub fn opcode(self) -> OpCode {
        OpCode::from((self.0 & OPCODE_MASK) as u8)
    }

    #[inline(always)]
    pub fn operand(self) -> usize {
        (self.0 >> OPCODE_BITS) as usize
    }

    pub fn word(self) -> u32 {
        self.0
    }

    pub fn effect(self) -> Effect {
        self.opcode().effect()
    }

    /// Number of stack values this instruction consumes.
    pub fn pops(self) -> usize {
        let effect = self.effect();
        if effect.dynamic_pop {
            effect.pop + self.operand()
        } else {
            effect.pop
        }
    }
}

impl From<OpCode> for Instruction {
    fn from(op: OpCode) -> Self {
        op.instr()
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode();
        if op.has_operand() {
            write!(f, "{} {}", op, self.operand())
        } else {
            write!(f, "{}", op)
        }
    }
}

pub type Instructions = Vec<Instruction>;

pub fn disassemble(instructions: &[Instruction]) -> String {
    let mut result = String::new();
    for (i, instruction) in instructions.iter().enumerate() {
        result.push_str(&format!("{:04} {}\n", i, instruction));
    }
    result
}
