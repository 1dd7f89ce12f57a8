use std::collections::HashMap;

use crate::ir::block::{BlockId, IrBlock};
use crate::ir::instr::InstrId;
use crate::ir::types::IrType;
use crate::ir::value::{ValueDef, ValueId};

/// Uniquely identifies a function within an `IrModule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub u32);

/// Calling-convention attributes attached to a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamAttr {
    /// Hidden output pointer through which an aggregate is returned.
    /// Precedes the user-visible arguments.
    StructRet,
    NoAlias,
    ReadOnly,
}

impl std::fmt::Display for ParamAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamAttr::StructRet => f.write_str("sret"),
            ParamAttr::NoAlias => f.write_str("noalias"),
            ParamAttr::ReadOnly => f.write_str("readonly"),
        }
    }
}

/// A named, typed parameter of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: IrType,
    pub attrs: Vec<ParamAttr>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: IrType) -> Self {
        Self {
            name: name.into(),
            ty,
            attrs: Vec::new(),
        }
    }

    /// Adds an attribute, builder style.
    pub fn with_attr(mut self, attr: ParamAttr) -> Self {
        if !self.attrs.contains(&attr) {
            self.attrs.push(attr);
        }
        self
    }

    pub fn has_attr(&self, attr: ParamAttr) -> bool {
        self.attrs.contains(&attr)
    }
}

/// A function in SSA form, or a declaration of an external one.
///
/// Internal representation uses flat `Vec`s indexed by `BlockId`. The entry
/// block is always `blocks[0]`; its block params are the function arguments.
/// A function with no blocks is a declaration.
///
/// Passes receive `&mut IrModule` and mutate through the `pub(crate)` fields.
/// After reshuffling instructions they must call `rebuild_value_defs()`.
#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub id: FunctionId,
    pub name: String,
    pub params: Vec<Param>,
    pub return_ty: IrType,
    /// Flat list of blocks. `BlockId(n)` indexes `blocks[n]`.
    pub(crate) blocks: Vec<IrBlock>,
    /// Maps `ValueId` → its definition site.
    pub(crate) value_defs: HashMap<ValueId, ValueDef>,
    /// Maps `ValueId` → its type.
    pub(crate) value_types: HashMap<ValueId, IrType>,
    /// Counter for allocating fresh `ValueId`s.
    pub(crate) next_value: u32,
}

impl IrFunction {
    /// Returns the entry block, or `None` for a declaration.
    pub fn entry_block(&self) -> Option<&IrBlock> {
        self.blocks.first()
    }

    pub fn block(&self, id: BlockId) -> Option<&IrBlock> {
        self.blocks.get(id.0 as usize)
    }

    pub fn blocks(&self) -> &[IrBlock] {
        &self.blocks
    }

    /// `true` if the function has no body.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Parameter types in declaration order.
    pub fn param_types(&self) -> Vec<IrType> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    /// Number of leading parameters carrying `attr`.
    pub fn leading_params_with(&self, attr: ParamAttr) -> usize {
        self.params.iter().take_while(|p| p.has_attr(attr)).count()
    }

    /// The SSA value bound to parameter `index` in the entry block.
    pub fn param_value(&self, index: usize) -> Option<ValueId> {
        self.entry_block()?.params.get(index).map(|p| p.id)
    }

    /// Returns the type of a value, if known.
    pub fn value_type(&self, v: ValueId) -> Option<&IrType> {
        self.value_types.get(&v)
    }

    /// Returns the definition site of a value.
    pub fn value_def(&self, v: ValueId) -> Option<&ValueDef> {
        self.value_defs.get(&v)
    }

    /// Allocates a fresh `ValueId`.
    pub(crate) fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    /// Redirects every use of `old` to `new` across all blocks.
    /// Returns the number of operands rewritten.
    pub fn replace_all_uses(&mut self, old: ValueId, new: ValueId) -> usize {
        let reps = HashMap::from([(old, new)]);
        self.replace_uses(&reps)
    }

    /// Batch form of `replace_all_uses`.
    pub(crate) fn replace_uses(&mut self, reps: &HashMap<ValueId, ValueId>) -> usize {
        if reps.is_empty() {
            return 0;
        }
        let mut count = 0;
        for block in &mut self.blocks {
            for instr in &mut block.instrs {
                let hits = instr
                    .operands()
                    .iter()
                    .filter(|v| reps.contains_key(v))
                    .count();
                if hits > 0 {
                    instr.replace_operands(reps);
                    count += hits;
                }
            }
        }
        count
    }

    /// Recomputes `value_defs` and `value_types` from the current block
    /// contents. Entries for values that no longer exist are dropped.
    pub(crate) fn rebuild_value_defs(&mut self) {
        let mut defs = HashMap::new();
        let mut types = HashMap::new();
        for block in &self.blocks {
            for param in &block.params {
                defs.insert(param.id, ValueDef::BlockParam { block: block.id });
                types.insert(param.id, param.ty.clone());
            }
            for (idx, instr) in block.instrs.iter().enumerate() {
                if let Some(result) = instr.result() {
                    defs.insert(
                        result,
                        ValueDef::InstrResult {
                            block: block.id,
                            instr: InstrId(idx as u32),
                        },
                    );
                    let ty = self
                        .value_types
                        .get(&result)
                        .cloned()
                        .or_else(|| instr.result_type());
                    if let Some(ty) = ty {
                        types.insert(result, ty);
                    }
                }
            }
        }
        self.value_defs = defs;
        self.value_types = types;
    }
}
