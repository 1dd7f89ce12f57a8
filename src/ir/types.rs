/// Scalar element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    I1,
    I8,
    I32,
    I64,
    F32,
    F64,
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DType::I1 => "i1",
            DType::I8 => "i8",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        f.write_str(s)
    }
}

/// The type of an SSA value, parameter, or global.
///
/// Struct types are nominal: two `Struct` types are the same type iff their
/// names are equal. The IR never inspects struct bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    /// No value. Only valid as a function return type.
    Void,
    Scalar(DType),
    /// Pointer to a value of the inner type.
    Ptr(Box<IrType>),
    /// Named aggregate, e.g. `struct.Tensor`.
    Struct { name: String },
    /// Fixed-length array, used for global string constants.
    Array { elem: Box<IrType>, len: usize },
}

impl IrType {
    pub fn i32() -> Self {
        IrType::Scalar(DType::I32)
    }

    pub fn i64() -> Self {
        IrType::Scalar(DType::I64)
    }

    /// `ptr<i8>`, the C string type.
    pub fn c_str() -> Self {
        IrType::ptr(IrType::Scalar(DType::I8))
    }

    pub fn ptr(inner: IrType) -> Self {
        IrType::Ptr(Box::new(inner))
    }

    pub fn named_struct(name: impl Into<String>) -> Self {
        IrType::Struct { name: name.into() }
    }

    /// Returns the pointee if this is a pointer type.
    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the struct name if this is a struct type.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            IrType::Struct { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::Void => f.write_str("void"),
            IrType::Scalar(d) => write!(f, "{}", d),
            IrType::Ptr(inner) => write!(f, "ptr<{}>", inner),
            IrType::Struct { name } => f.write_str(name),
            IrType::Array { elem, len } => write!(f, "[{} x {}]", len, elem),
        }
    }
}
