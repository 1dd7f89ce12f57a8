//! Device selection at program start.
//!
//! The entry function gets, ahead of its first call (or its terminator when
//! the entry block makes no calls):
//!
//! ```text
//! %a = argload %argv[1] (argc %argc) or c""
//! %f = addr @.str : ptr<i8>          // "-cpu"
//! %c = call @strcmp(%a, %f)
//! call @set_device(%c)
//! ```

use tracing::debug;

use crate::ir::function::FunctionId;
use crate::ir::instr::IrInstr;
use crate::ir::module::IrModule;
use crate::ir::types::IrType;
use crate::pass::wrapper::{DiagnosticKind, WrapperConfig, WrapperDiagnostic};

/// Name given to the flag literal global; uniquified on collision.
const FLAG_GLOBAL: &str = ".str";

pub struct EntryPointPatcher<'a> {
    config: &'a WrapperConfig,
}

impl<'a> EntryPointPatcher<'a> {
    pub fn new(config: &'a WrapperConfig) -> Self {
        Self { config }
    }

    /// Inserts the device-selection sequence into function `id`.
    ///
    /// Returns `Ok(false)` when there is nothing to patch (no such function,
    /// or a declaration) and `Err` with an `ArgumentBoundsError` diagnostic
    /// when the function has no argument vector to read the flag from. The
    /// module is untouched in both cases.
    pub fn patch(&self, module: &mut IrModule, id: FunctionId) -> Result<bool, WrapperDiagnostic> {
        let Some(func) = module.function(id) else {
            return Ok(false);
        };
        if func.is_declaration() {
            debug!(function = %func.name, "entry function has no body, not patched");
            return Ok(false);
        }

        // main(argc, argv): argv must be the second parameter and a pointer.
        let argv_is_vector = func.params.get(1).is_some_and(|p| p.ty.pointee().is_some());
        let (Some(argc), Some(argv), true) = (func.param_value(0), func.param_value(1), argv_is_vector)
        else {
            return Err(WrapperDiagnostic::new(
                DiagnosticKind::ArgumentBoundsError,
                &func.name,
                format!(
                    "cannot read argument {} of the command line: the function takes {} parameter(s) and no argument vector",
                    self.config.flag_index,
                    func.params.len()
                ),
            ));
        };

        let c_str = IrType::c_str();
        module.get_or_insert_function(
            &self.config.string_compare,
            vec![c_str.clone(), c_str.clone()],
            IrType::i32(),
        );
        module.get_or_insert_function(&self.config.device_config, vec![IrType::i32()], IrType::Void);
        let flag_global = module.add_private_string(FLAG_GLOBAL, &self.config.cpu_flag);

        let func = &mut module.functions[id.0 as usize];
        let arg = func.fresh_value();
        let flag = func.fresh_value();
        let cmp = func.fresh_value();
        func.value_types.insert(arg, c_str.clone());
        func.value_types.insert(flag, c_str.clone());
        func.value_types.insert(cmp, IrType::i32());

        let patch = [
            IrInstr::ArgLoad {
                result: arg,
                argc,
                argv,
                index: self.config.flag_index,
            },
            IrInstr::GlobalAddr {
                result: flag,
                global: flag_global.clone(),
                result_ty: c_str,
            },
            IrInstr::Call {
                result: Some(cmp),
                callee: self.config.string_compare.clone(),
                args: vec![arg, flag],
                result_ty: Some(IrType::i32()),
            },
            IrInstr::Call {
                result: None,
                callee: self.config.device_config.clone(),
                args: vec![cmp],
                result_ty: None,
            },
        ];

        let entry = &mut func.blocks[0];
        let pos = entry.first_call_position().unwrap_or(if entry.is_sealed() {
            entry.instrs.len() - 1
        } else {
            entry.instrs.len()
        });
        entry.instrs.splice(pos..pos, patch);
        func.rebuild_value_defs();

        debug!(
            function = %func.name,
            position = pos,
            global = %flag_global,
            "patched entry function with device selection"
        );
        Ok(true)
    }
}
