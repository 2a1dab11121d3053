//! plughost Extension SDK
//!
//! This SDK provides the capability interface and the export macro for building
//! extension modules that the plughost discovery pass can load.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use plughost_extension_sdk::prelude::*;
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl Extension for Greeter {
//!     fn activate(&mut self) -> Result<(), ExtensionError> {
//!         Ok(())
//!     }
//!
//!     fn deactivate(&mut self) -> Result<(), ExtensionError> {
//!         Ok(())
//!     }
//! }
//!
//! export_types![TypeEntry::extension::<Greeter>("demo::Greeter")];
//! ```
//!
//! The crate is then built as a `cdylib` and packed into a `.bundle` archive
//! with `plughost pack`.

pub mod descriptor;
#[macro_use]
pub mod macros;
pub mod types;

pub use descriptor::{
    capabilities, take_instance, ConstructFn, TypeEntry, TypeTable, TypeTableFn, ABI_VERSION,
    TYPE_TABLE_SYMBOL,
};
pub use types::{Extension, ExtensionError, ExtensionResult};

/// Prelude module with common imports
pub mod prelude {
    pub use crate::descriptor::{capabilities, TypeEntry, TypeTable, ABI_VERSION};
    pub use crate::types::{Extension, ExtensionError, ExtensionResult};

    pub use crate::export_types;
}
