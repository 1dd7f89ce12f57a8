pub mod block;
pub mod function;
pub mod instr;
pub mod module;
pub mod types;
pub mod value;

pub use block::{BlockId, IrBlock};
pub use function::{FunctionId, IrFunction, Param, ParamAttr};
pub use instr::{BinOp, InstrId, IrInstr};
pub use module::{GlobalInit, IrFunctionBuilder, IrGlobal, IrModule, Linkage};
pub use types::{DType, IrType};
pub use value::{BlockParam, ValueDef, ValueId};
