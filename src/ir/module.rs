use std::collections::HashMap;

use crate::ir::block::{BlockId, IrBlock};
use crate::ir::function::{FunctionId, IrFunction, Param};
use crate::ir::instr::{InstrId, IrInstr};
use crate::ir::types::{DType, IrType};
use crate::ir::value::{BlockParam, ValueDef, ValueId};

/// Symbol visibility of a module global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// Visible only inside this module.
    Private,
    External,
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Linkage::Private => f.write_str("private"),
            Linkage::External => f.write_str("external"),
        }
    }
}

/// Initializer of a module global.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalInit {
    /// NUL-terminated byte string.
    Str(String),
}

/// A module-level global variable.
#[derive(Debug, Clone, PartialEq)]
pub struct IrGlobal {
    pub name: String,
    pub ty: IrType,
    pub init: GlobalInit,
    pub constant: bool,
    pub linkage: Linkage,
}

/// The top-level IR container.
///
/// Invariants:
/// - Function names are unique within a module.
/// - Global names are unique within a module.
/// - `FunctionId(n)` always indexes `functions[n]`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IrModule {
    pub name: String,
    pub(crate) functions: Vec<IrFunction>,
    pub(crate) function_index: HashMap<String, FunctionId>,
    pub(crate) globals: Vec<IrGlobal>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            function_index: HashMap::new(),
            globals: Vec::new(),
        }
    }

    pub fn function(&self, id: FunctionId) -> Option<&IrFunction> {
        self.functions.get(id.0 as usize)
    }

    pub fn function_id(&self, name: &str) -> Option<FunctionId> {
        self.function_index.get(name).copied()
    }

    pub fn function_by_name(&self, name: &str) -> Option<&IrFunction> {
        let id = self.function_index.get(name)?;
        self.functions.get(id.0 as usize)
    }

    pub fn functions(&self) -> &[IrFunction] {
        &self.functions
    }

    pub fn globals(&self) -> &[IrGlobal] {
        &self.globals
    }

    pub fn global_by_name(&self, name: &str) -> Option<&IrGlobal> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Registers a function built by `IrFunctionBuilder`.
    /// Returns `Err` if the name is already taken.
    pub fn add_function(&mut self, mut func: IrFunction) -> Result<FunctionId, String> {
        if self.function_index.contains_key(&func.name) {
            return Err(format!("function '{}' already defined", func.name));
        }
        let id = FunctionId(self.functions.len() as u32);
        func.id = id;
        self.function_index.insert(func.name.clone(), id);
        self.functions.push(func);
        Ok(id)
    }

    /// Returns the function named `name`, declaring it with the given
    /// signature first if the module has no such symbol.
    ///
    /// An existing function is returned as-is even if its signature differs.
    pub fn get_or_insert_function(
        &mut self,
        name: &str,
        param_types: Vec<IrType>,
        return_ty: IrType,
    ) -> FunctionId {
        if let Some(id) = self.function_id(name) {
            return id;
        }
        let params = param_types
            .into_iter()
            .enumerate()
            .map(|(i, ty)| Param::new(format!("arg{}", i), ty))
            .collect();
        let mut decl = IrFunctionBuilder::declaration(name, params, return_ty);
        let id = FunctionId(self.functions.len() as u32);
        decl.id = id;
        self.function_index.insert(name.to_owned(), id);
        self.functions.push(decl);
        id
    }

    /// Adds a private constant global holding `value` as a NUL-terminated
    /// byte string. The name is `base` or, if taken, `base.1`, `base.2`, ...
    /// Returns the name actually used.
    pub fn add_private_string(&mut self, base: &str, value: &str) -> String {
        let mut name = base.to_owned();
        let mut n = 0usize;
        while self.global_by_name(&name).is_some() {
            n += 1;
            name = format!("{}.{}", base, n);
        }
        self.globals.push(IrGlobal {
            name: name.clone(),
            ty: IrType::Array {
                elem: Box::new(IrType::Scalar(DType::I8)),
                len: value.len() + 1,
            },
            init: GlobalInit::Str(value.to_owned()),
            constant: true,
            linkage: Linkage::Private,
        });
        name
    }
}

/// Incremental construction of an `IrFunction`.
///
/// Blocks are created up front or on demand; instructions go to the block
/// under the cursor (`set_current_block`). Every `emit_*` helper allocates the
/// result value and records its type, so callers only deal in `ValueId`s.
/// `declaration` skips all of this and yields a bodiless function.
///
/// `build()` asserts in debug builds that every block was terminated.
pub struct IrFunctionBuilder {
    func: IrFunction,
    cursor: Option<BlockId>,
}

impl IrFunctionBuilder {
    pub fn new(name: impl Into<String>, params: Vec<Param>, return_ty: IrType) -> Self {
        Self {
            func: IrFunction {
                // add_function assigns the real id.
                id: FunctionId(0),
                name: name.into(),
                params,
                return_ty,
                blocks: Vec::new(),
                value_defs: HashMap::new(),
                value_types: HashMap::new(),
                next_value: 0,
            },
            cursor: None,
        }
    }

    /// An external symbol: the signature only, resolved when linking.
    pub fn declaration(name: impl Into<String>, params: Vec<Param>, return_ty: IrType) -> IrFunction {
        Self::new(name, params, return_ty).func
    }

    /// Appends an empty block. Does not move the cursor.
    pub fn create_block(&mut self, name: Option<&str>) -> BlockId {
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(IrBlock::new(id, name.map(str::to_owned)));
        id
    }

    /// Appends the `entry` block, binds one block param per function param,
    /// and moves the cursor there. Returns the param values in order.
    pub fn create_entry_block(&mut self) -> Vec<ValueId> {
        let entry = self.create_block(Some("entry"));
        let signature: Vec<(String, IrType)> = self
            .func
            .params
            .iter()
            .map(|p| (p.name.clone(), p.ty.clone()))
            .collect();
        let values = signature
            .into_iter()
            .map(|(name, ty)| self.add_block_param(entry, Some(&name), ty))
            .collect();
        self.cursor = Some(entry);
        values
    }

    pub fn add_block_param(&mut self, block: BlockId, name: Option<&str>, ty: IrType) -> ValueId {
        let id = self.func.fresh_value();
        self.func.value_defs.insert(id, ValueDef::BlockParam { block });
        self.func.value_types.insert(id, ty.clone());
        self.func.blocks[block.0 as usize].params.push(BlockParam {
            id,
            ty,
            name: name.map(str::to_owned),
        });
        id
    }

    pub fn set_current_block(&mut self, block: BlockId) {
        self.cursor = Some(block);
    }

    /// Appends `instr` at the cursor and records `result_ty` for its result.
    ///
    /// Panics without a cursor. In debug builds, also panics when the block
    /// under the cursor is already terminated.
    pub fn push_instr(&mut self, instr: IrInstr, result_ty: Option<IrType>) -> Option<ValueId> {
        let block = self
            .cursor
            .expect("IrFunctionBuilder: push_instr before set_current_block");
        let instrs = &mut self.func.blocks[block.0 as usize].instrs;
        debug_assert!(
            !instrs.last().is_some_and(IrInstr::is_terminator),
            "push_instr into terminated block {}",
            block
        );

        let position = InstrId(instrs.len() as u32);
        let result = instr.result();
        instrs.push(instr);

        if let (Some(id), Some(ty)) = (result, result_ty) {
            self.func.value_defs.insert(id, ValueDef::InstrResult { block, instr: position });
            self.func.value_types.insert(id, ty);
        }
        result
    }

    /// A value id not yet bound to any definition.
    pub fn fresh_value(&mut self) -> ValueId {
        self.func.fresh_value()
    }

    pub fn emit_const_int(&mut self, value: i64, ty: IrType) -> ValueId {
        let result = self.func.fresh_value();
        self.push_instr(IrInstr::ConstInt { result, value, ty: ty.clone() }, Some(ty));
        result
    }

    /// Stack slot for one `ty`; the result is a `ptr<ty>`.
    pub fn emit_alloca(&mut self, ty: IrType) -> ValueId {
        let result = self.func.fresh_value();
        let slot_ty = IrType::ptr(ty.clone());
        self.push_instr(IrInstr::Alloca { result, ty }, Some(slot_ty));
        result
    }

    /// Direct call to `callee`. A `Void` return type yields no value.
    pub fn emit_call(&mut self, callee: &str, args: Vec<ValueId>, return_ty: IrType) -> Option<ValueId> {
        let result = (!return_ty.is_void()).then(|| self.func.fresh_value());
        let result_ty = result.map(|_| return_ty);
        self.push_instr(
            IrInstr::Call {
                result,
                callee: callee.to_owned(),
                args,
                result_ty: result_ty.clone(),
            },
            result_ty,
        )
    }

    pub fn emit_return(&mut self, values: Vec<ValueId>) {
        self.push_instr(IrInstr::Return { values }, None);
    }

    pub fn build(self) -> IrFunction {
        #[cfg(debug_assertions)]
        for block in self.func.blocks() {
            assert!(block.is_sealed(), "block {} has no terminator", block.label());
        }
        self.func
    }
}
