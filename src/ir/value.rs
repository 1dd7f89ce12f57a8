use crate::ir::block::BlockId;
use crate::ir::instr::InstrId;
use crate::ir::types::IrType;

/// A function-local SSA value, printed as `%n`.
///
/// Numbering restarts in every function, so a `ValueId` taken from one
/// function means nothing in another. Rewrites allocate new ids through the
/// owning function and never reuse a retired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub u32);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A value bound on entry to a block, filled by the branch that jumps there.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockParam {
    pub id: ValueId,
    pub ty: IrType,
    pub name: Option<String>,
}

/// Where a value comes from. Kept in `IrFunction::value_defs` and rebuilt
/// after each rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    BlockParam { block: BlockId },
    InstrResult { block: BlockId, instr: InstrId },
}
