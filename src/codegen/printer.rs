//! IR pretty-printer.
//!
//! Emits a human-readable text representation of an `IrModule`.
//! Output is deterministic: globals first in insertion order, then functions
//! in `FunctionId` order, blocks in `BlockId` order, instructions in program
//! order. Declarations print as a single `declare` line.

use std::fmt::Write;

use crate::error::CodegenError;
use crate::ir::function::{IrFunction, Param};
use crate::ir::instr::{IrInstr, MISSING_ARG};
use crate::ir::module::{GlobalInit, IrModule};
use crate::ir::value::ValueId;

/// Emits a full text dump of the IR module.
pub fn emit_ir_text(module: &IrModule) -> Result<String, CodegenError> {
    let mut out = String::new();
    writeln!(out, "// module: {}", module.name)?;

    if !module.globals().is_empty() {
        writeln!(out)?;
    }
    for global in module.globals() {
        let kind = if global.constant { "constant" } else { "global" };
        match &global.init {
            GlobalInit::Str(s) => writeln!(
                out,
                "@{} = {} {} {} c\"{}\\00\"",
                global.name,
                global.linkage,
                kind,
                global.ty,
                s.escape_default()
            )?,
        }
    }

    for func in module.functions() {
        writeln!(out)?;
        emit_function(&mut out, func)?;
    }
    Ok(out)
}

fn emit_function(out: &mut String, func: &IrFunction) -> Result<(), CodegenError> {
    if func.is_declaration() {
        write!(out, "declare {}(", func.name)?;
        emit_params(out, &func.params)?;
        writeln!(out, ") -> {}", func.return_ty)?;
        return Ok(());
    }

    write!(out, "def {}(", func.name)?;
    emit_params(out, &func.params)?;
    writeln!(out, ") -> {} {{", func.return_ty)?;

    for block in func.blocks() {
        let label = block.name.as_deref().unwrap_or("bb");
        write!(out, "  {}{}(", label, block.id.0)?;
        for (i, param) in block.params.iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            let name = param.name.as_deref().unwrap_or("_");
            write!(out, "{} {}", param.id, name)?;
        }
        writeln!(out, "):")?;

        for instr in &block.instrs {
            write!(out, "    ")?;
            emit_instr(out, instr)?;
            writeln!(out)?;
        }
    }
    writeln!(out, "}}")?;
    Ok(())
}

fn emit_params(out: &mut String, params: &[Param]) -> Result<(), CodegenError> {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write!(out, "{}: ", param.name)?;
        for attr in &param.attrs {
            write!(out, "{} ", attr)?;
        }
        write!(out, "{}", param.ty)?;
    }
    Ok(())
}

fn emit_value_list(out: &mut String, values: &[ValueId]) -> Result<(), CodegenError> {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write!(out, "{}", v)?;
    }
    Ok(())
}

fn emit_instr(out: &mut String, instr: &IrInstr) -> Result<(), CodegenError> {
    match instr {
        IrInstr::BinOp {
            result,
            op,
            lhs,
            rhs,
            ..
        } => {
            write!(out, "{} = {} {}, {}", result, op, lhs, rhs)?;
        }

        IrInstr::ConstInt { result, value, ty } => {
            write!(out, "{} = const.i {} : {}", result, value, ty)?;
        }

        IrInstr::Alloca { result, ty } => {
            write!(out, "{} = alloca {}", result, ty)?;
        }

        IrInstr::GlobalAddr {
            result,
            global,
            result_ty,
        } => {
            write!(out, "{} = addr @{} : {}", result, global, result_ty)?;
        }

        IrInstr::ArgLoad {
            result,
            argc,
            argv,
            index,
        } => {
            write!(
                out,
                "{} = argload {}[{}] (argc {}) or c\"{}\"",
                result, argv, index, argc, MISSING_ARG
            )?;
        }

        IrInstr::Call {
            result,
            callee,
            args,
            ..
        } => {
            if let Some(r) = result {
                write!(out, "{} = ", r)?;
            }
            write!(out, "call @{}(", callee)?;
            emit_value_list(out, args)?;
            write!(out, ")")?;
        }

        IrInstr::Br { target, args } => {
            write!(out, "br {}", target)?;
            if !args.is_empty() {
                write!(out, "(")?;
                emit_value_list(out, args)?;
                write!(out, ")")?;
            }
        }

        IrInstr::CondBr {
            cond,
            then_block,
            then_args,
            else_block,
            else_args,
        } => {
            write!(out, "condbr {}, {}(", cond, then_block)?;
            emit_value_list(out, then_args)?;
            write!(out, "), {}(", else_block)?;
            emit_value_list(out, else_args)?;
            write!(out, ")")?;
        }

        IrInstr::Return { values } => {
            write!(out, "return")?;
            if !values.is_empty() {
                write!(out, " ")?;
                emit_value_list(out, values)?;
            }
        }
    }
    Ok(())
}
