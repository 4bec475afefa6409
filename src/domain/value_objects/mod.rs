mod batch_limits;
mod field_value;
mod operation_kind;

pub use batch_limits::{
    BatchLimits, LimitBoundary, BATCH_DELIMITER, BATCH_PREFIX, BATCH_SUFFIX, FRAMING_OVERHEAD,
};
pub use field_value::FieldValue;
pub use operation_kind::OperationKind;
