//! pxr-schemas
//!
//! Shared data types for ProxySQL admin reconciliation:
//! - Field values and stored rows
//! - Record-family schemas (keys, attributes, ranges, propagation family)
//! - Desired-record descriptors
//! - Persistence layers and LOAD/SAVE tokens
//!
//! Pure data. No IO.

mod descriptor;
mod error;
mod family;
mod layer;
mod value;

pub use descriptor::{DescriptorBuilder, RecordDescriptor};
pub use error::SchemaError;
pub use family::*;
pub use layer::{ConfigSettings, Direction, PersistenceLayer, TransferAction};
pub use value::{FieldKind, FieldValue, StoredRecord};
