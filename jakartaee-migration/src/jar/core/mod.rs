//! Core class-file operations
//!
//! This module holds the low-level class-file reader and writer used by the
//! rewriters. It only decodes the constant pool; everything after the pool is
//! carried through byte for byte.

pub mod cpool;

#[cfg(test)]
pub(crate) mod fixture;

pub use cpool::{looks_like_class, ClassFile, ClassFormatError, Const, ConstPool};
