//! Blend modes and the kernels that apply them.

pub(crate) mod dispatch;
pub(crate) mod kernel;
pub(crate) mod mode;
pub(crate) mod ops;
