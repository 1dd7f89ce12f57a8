use std::collections::HashMap;

use crate::ir::block::BlockId;
use crate::ir::types::IrType;
use crate::ir::value::ValueId;

/// Index of an instruction within a block's instruction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstrId(pub u32);

/// Value of an `ArgLoad` whose index is not below `argc`.
pub const MISSING_ARG: &str = "";

/// Binary arithmetic operations on scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Comparisons yield an `i1`.
    CmpEq,
    CmpNe,
    CmpLt,
    CmpGt,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::CmpEq => "cmpeq",
            BinOp::CmpNe => "cmpne",
            BinOp::CmpLt => "cmplt",
            BinOp::CmpGt => "cmpgt",
        };
        f.write_str(s)
    }
}

/// A single instruction in SSA form.
///
/// Invariants:
/// - Every instruction that produces a value has exactly one result `ValueId`.
/// - Terminators (`Br`, `CondBr`, `Return`) are the last instruction in a block.
/// - No instruction may appear after a terminator.
#[derive(Debug, Clone, PartialEq)]
pub enum IrInstr {
    // ---- Scalar arithmetic ----
    BinOp {
        result: ValueId,
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
        ty: IrType,
    },

    // ---- Constants ----
    ConstInt {
        result: ValueId,
        value: i64,
        ty: IrType,
    },

    // ---- Memory ----
    /// Reserve a stack slot for one value of `ty`. Yields `ptr<ty>`.
    Alloca { result: ValueId, ty: IrType },
    /// Address of the first element of a module global. Yields `ptr<i8>` for
    /// string globals.
    GlobalAddr {
        result: ValueId,
        global: String,
        result_ty: IrType,
    },
    /// Read entry `index` of a command-line argument vector.
    ///
    /// Bounds-checked at run time against `argc`. An out-of-range read yields
    /// `MISSING_ARG`, a valid empty C string, so the result can always be
    /// handed to string routines.
    ArgLoad {
        result: ValueId,
        argc: ValueId,
        argv: ValueId,
        index: u32,
    },

    // ---- Function calls ----
    Call {
        result: Option<ValueId>,
        callee: String,
        args: Vec<ValueId>,
        result_ty: Option<IrType>,
    },

    // ---- Control flow (terminators) ----
    /// Unconditional branch with block arguments (SSA block params).
    Br { target: BlockId, args: Vec<ValueId> },
    /// Conditional branch.
    CondBr {
        cond: ValueId,
        then_block: BlockId,
        then_args: Vec<ValueId>,
        else_block: BlockId,
        else_args: Vec<ValueId>,
    },
    /// Return from function. Values must match the function's return type.
    Return { values: Vec<ValueId> },
}

impl IrInstr {
    /// Returns the `ValueId` produced by this instruction, if any.
    /// Terminators and void calls produce no value.
    pub fn result(&self) -> Option<ValueId> {
        match self {
            IrInstr::BinOp { result, .. } => Some(*result),
            IrInstr::ConstInt { result, .. } => Some(*result),
            IrInstr::Alloca { result, .. } => Some(*result),
            IrInstr::GlobalAddr { result, .. } => Some(*result),
            IrInstr::ArgLoad { result, .. } => Some(*result),
            IrInstr::Call { result, .. } => *result,
            IrInstr::Br { .. } => None,
            IrInstr::CondBr { .. } => None,
            IrInstr::Return { .. } => None,
        }
    }

    /// Returns the type of the produced value, if any.
    pub fn result_type(&self) -> Option<IrType> {
        match self {
            IrInstr::BinOp { op, ty, .. } => Some(match op {
                BinOp::CmpEq | BinOp::CmpNe | BinOp::CmpLt | BinOp::CmpGt => {
                    IrType::Scalar(crate::ir::types::DType::I1)
                }
                _ => ty.clone(),
            }),
            IrInstr::ConstInt { ty, .. } => Some(ty.clone()),
            IrInstr::Alloca { ty, .. } => Some(IrType::ptr(ty.clone())),
            IrInstr::GlobalAddr { result_ty, .. } => Some(result_ty.clone()),
            IrInstr::ArgLoad { .. } => Some(IrType::c_str()),
            IrInstr::Call {
                result: Some(_),
                result_ty,
                ..
            } => result_ty.clone(),
            _ => None,
        }
    }

    /// Returns `true` if this instruction is a block terminator.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            IrInstr::Br { .. } | IrInstr::CondBr { .. } | IrInstr::Return { .. }
        )
    }

    pub fn is_call(&self) -> bool {
        matches!(self, IrInstr::Call { .. })
    }

    /// Callee name if this is a direct call.
    pub fn callee(&self) -> Option<&str> {
        match self {
            IrInstr::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }

    /// Returns all `ValueId`s consumed by this instruction (operands).
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            IrInstr::BinOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            IrInstr::ConstInt { .. } => vec![],
            IrInstr::Alloca { .. } => vec![],
            IrInstr::GlobalAddr { .. } => vec![],
            IrInstr::ArgLoad { argc, argv, .. } => vec![*argc, *argv],
            IrInstr::Call { args, .. } => args.clone(),
            IrInstr::Br { args, .. } => args.clone(),
            IrInstr::CondBr {
                cond,
                then_args,
                else_args,
                ..
            } => {
                let mut ops = vec![*cond];
                ops.extend_from_slice(then_args);
                ops.extend_from_slice(else_args);
                ops
            }
            IrInstr::Return { values } => values.clone(),
        }
    }

    /// Rewrites every operand found in `reps` to its replacement.
    ///
    /// The result value is never touched.
    pub fn replace_operands(&mut self, reps: &HashMap<ValueId, ValueId>) {
        let replace = |v: &mut ValueId| {
            if let Some(&r) = reps.get(v) {
                *v = r;
            }
        };
        match self {
            IrInstr::BinOp { lhs, rhs, .. } => {
                replace(lhs);
                replace(rhs);
            }
            IrInstr::ConstInt { .. } | IrInstr::Alloca { .. } | IrInstr::GlobalAddr { .. } => {}
            IrInstr::ArgLoad { argc, argv, .. } => {
                replace(argc);
                replace(argv);
            }
            IrInstr::Call { args, .. } | IrInstr::Br { args, .. } => {
                for v in args {
                    replace(v);
                }
            }
            IrInstr::CondBr {
                cond,
                then_args,
                else_args,
                ..
            } => {
                replace(cond);
                for v in then_args {
                    replace(v);
                }
                for v in else_args {
                    replace(v);
                }
            }
            IrInstr::Return { values } => {
                for v in values {
                    replace(v);
                }
            }
        }
    }
}
