//! SSA validation pass.
//!
//! Checks structural correctness of an `IrModule`. Never modifies the module.

use std::collections::HashSet;

use crate::error::PassError;
use crate::ir::module::IrModule;
use crate::ir::value::ValueId;
use crate::pass::Pass;

/// Validates SSA invariants across the entire module.
///
/// Checks, for every function with a body:
/// 1. Every value used in an instruction is defined before its first use
///    (linear scan in block order, sufficient for the block-param SSA the
///    builder produces).
/// 2. Every value is defined exactly once.
/// 3. Every block ends with exactly one terminator as its last instruction.
/// 4. Every direct call names a function present in the module.
pub struct ValidatePass;

impl Pass for ValidatePass {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn run(&mut self, module: &mut IrModule) -> Result<bool, PassError> {
        validate_module(module)?;
        Ok(false)
    }
}

/// Read-only entry point, usable without a `&mut` borrow.
pub fn validate_module(module: &IrModule) -> Result<(), PassError> {
    for func in module.functions() {
        if func.is_declaration() {
            continue;
        }
        let func_name = &func.name;
        let mut defined: HashSet<ValueId> = HashSet::new();

        for block in func.blocks() {
            for param in &block.params {
                if !defined.insert(param.id) {
                    return Err(PassError::MultipleDefinition {
                        func: func_name.clone(),
                        value: param.id.to_string(),
                    });
                }
            }

            let n = block.instrs.len();
            for (i, instr) in block.instrs.iter().enumerate() {
                if instr.is_terminator() && i != n - 1 {
                    return Err(PassError::MissingTerminator {
                        func: func_name.clone(),
                        block: block.label(),
                    });
                }

                for operand in instr.operands() {
                    if !defined.contains(&operand) {
                        return Err(PassError::UseBeforeDef {
                            func: func_name.clone(),
                            value: operand.to_string(),
                        });
                    }
                }

                if let Some(callee) = instr.callee() {
                    if module.function_by_name(callee).is_none() {
                        return Err(PassError::UnknownCallee {
                            func: func_name.clone(),
                            callee: callee.to_owned(),
                        });
                    }
                }

                if let Some(result) = instr.result() {
                    if !defined.insert(result) {
                        return Err(PassError::MultipleDefinition {
                            func: func_name.clone(),
                            value: result.to_string(),
                        });
                    }
                }
            }

            if !block.is_sealed() {
                return Err(PassError::MissingTerminator {
                    func: func_name.clone(),
                    block: block.label(),
                });
            }
        }
    }
    Ok(())
}
