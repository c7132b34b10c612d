//! Typed, in-memory columns and their binary wire encoding.
//!
//! Every column implements the [Column] contract: a homogeneous sequence of
//! values of a single [DataType] that can be appended to, read by index,
//! sliced, swapped, and saved to or loaded from a byte stream.
//!
//! ```
//! use wirecol::{BufferOutput, Column, ColumnUInt32};
//!
//! let column: ColumnUInt32 = [1, 2, 3].into_iter().collect();
//!
//! let mut output = BufferOutput::new();
//! column.save(&mut output).unwrap();
//! assert_eq!(output.as_slice(), &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
//! ```
//!
//! Columns can also be created dynamically from their server type name
//! with [create_column_by_name] and grouped into a [Block].

mod block;
mod column;
mod config;
mod error;
mod factory;
mod types;
mod value;

pub use wirecol_io::{
    ArrayInput,
    ArrayOutput,
    BufferInput,
    BufferOutput,
    InputStream,
    OutputStream,
    SinkError,
    StreamInput,
    StreamOutput,
    WireRead,
    WireWrite,
};

pub use self::block::Block;
pub use self::column::*;
pub use self::config::LoadLimits;
pub use self::error::ColumnError;
pub use self::factory::{create_column, create_column_by_name};
pub use self::types::{DataType, EnumItem, MAX_DATETIME64_PRECISION, MAX_DECIMAL_PRECISION};
pub use self::value::{Uuid, Value};
