use crate::ir::instr::IrInstr;
use crate::ir::value::{BlockParam, ValueId};

/// Position of a block in `IrFunction::blocks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Straight-line code ending in a single `Br`, `CondBr` or `Return`.
///
/// Passes that splice instructions in (call rewriting, the entry prologue)
/// must keep the terminator last. Values flowing in from predecessors arrive
/// as `params`; the entry block's params are the function arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct IrBlock {
    pub id: BlockId,
    pub params: Vec<BlockParam>,
    pub instrs: Vec<IrInstr>,
    /// Printed in place of `bbN` when set.
    pub name: Option<String>,
}

impl IrBlock {
    pub fn new(id: BlockId, name: Option<String>) -> Self {
        Self {
            id,
            params: Vec::new(),
            instrs: Vec::new(),
            name,
        }
    }

    pub fn terminator(&self) -> Option<&IrInstr> {
        self.instrs.last().filter(|i| i.is_terminator())
    }

    /// `true` once the block ends in a terminator.
    pub fn is_sealed(&self) -> bool {
        self.terminator().is_some()
    }

    /// Index into `instrs` of the earliest call, if the block makes any.
    pub fn first_call_position(&self) -> Option<usize> {
        self.instrs.iter().position(IrInstr::is_call)
    }

    /// Name for diagnostics: `name` if present, else `bbN`.
    pub fn label(&self) -> String {
        self.name
            .as_deref()
            .map(str::to_owned)
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Every value read by the block, in instruction order, with repeats.
    pub fn all_operands(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.instrs.iter().flat_map(|i| i.operands())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_and_label() {
        let mut block = IrBlock::new(BlockId(3), None);
        block.instrs.push(IrInstr::Return { values: vec![] });
        assert_eq!(block.first_call_position(), None);
        assert_eq!(block.label(), "bb3");
        assert!(block.is_sealed());

        block.instrs.insert(
            0,
            IrInstr::Call {
                result: None,
                callee: "tick".into(),
                args: vec![ValueId(0)],
                result_ty: None,
            },
        );
        block.name = Some("entry".into());
        assert_eq!(block.first_call_position(), Some(0));
        assert_eq!(block.label(), "entry");
        assert_eq!(block.all_operands().collect::<Vec<_>>(), vec![ValueId(0)]);
    }
}
