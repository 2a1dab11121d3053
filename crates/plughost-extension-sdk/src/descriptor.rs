//! C-compatible type table exported by extension modules.
//!
//! Every native module exports one symbol, `plughost_type_table`, returning a
//! [`TypeTable`]. Each [`TypeEntry`] names one compiled type, declares its
//! capabilities and optionally carries a zero-argument constructor.

use std::ffi::c_void;

use crate::types::Extension;

/// Type table ABI version (must match the plughost host)
pub const ABI_VERSION: u32 = 1;

/// Null-terminated name of the symbol every native module exports.
pub const TYPE_TABLE_SYMBOL: &[u8] = b"plughost_type_table\0";

/// Zero-argument constructor.
///
/// Returns a `Box<Box<dyn Extension>>` converted with `Box::into_raw`, or null
/// when construction failed.
pub type ConstructFn = unsafe extern "C" fn() -> *mut c_void;

/// Signature of the exported `plughost_type_table` symbol.
pub type TypeTableFn = unsafe extern "C" fn() -> TypeTable;

/// Capability flags
pub mod capabilities {
    /// Type implements the `Extension` capability interface
    pub const EXTENSION: u64 = 1 << 0;
}

/// One compiled type exported by a module.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TypeEntry {
    pub name: *const u8,
    pub name_len: usize,
    pub capabilities: u64,
    pub construct: Option<ConstructFn>,
}

// Entries only point at 'static data inside the exporting module.
unsafe impl Sync for TypeEntry {}
unsafe impl Send for TypeEntry {}

impl TypeEntry {
    /// Entry for an extension type constructed through `Default`.
    pub const fn extension<T: Extension + Default + 'static>(name: &'static str) -> Self {
        Self {
            name: name.as_ptr(),
            name_len: name.len(),
            capabilities: capabilities::EXTENSION,
            construct: Some(construct_default::<T> as ConstructFn),
        }
    }

    /// Entry for an extension type that exposes no zero-argument constructor.
    pub const fn without_constructor(name: &'static str) -> Self {
        Self {
            name: name.as_ptr(),
            name_len: name.len(),
            capabilities: capabilities::EXTENSION,
            construct: None,
        }
    }

    /// Entry for a helper type that is not an extension.
    pub const fn opaque(name: &'static str) -> Self {
        Self {
            name: name.as_ptr(),
            name_len: name.len(),
            capabilities: 0,
            construct: None,
        }
    }

    /// Whether the entry declares the extension capability.
    pub fn is_extension(&self) -> bool {
        self.capabilities & capabilities::EXTENSION != 0
    }

    /// Decode the entry name.
    ///
    /// # Safety
    /// `name`/`name_len` must describe readable memory that outlives `self`,
    /// which holds while the exporting module stays loaded.
    pub unsafe fn name(&self) -> Option<&str> {
        if self.name.is_null() {
            return None;
        }
        // SAFETY: Caller guarantees the pointer range is valid
        let bytes = unsafe { std::slice::from_raw_parts(self.name, self.name_len) };
        std::str::from_utf8(bytes).ok()
    }
}

/// C-compatible type table
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TypeTable {
    pub abi_version: u32,
    pub entries: *const TypeEntry,
    pub len: usize,
}

impl TypeTable {
    /// Build a table over a static entry slice.
    pub const fn new(entries: &'static [TypeEntry]) -> Self {
        Self {
            abi_version: ABI_VERSION,
            entries: entries.as_ptr(),
            len: entries.len(),
        }
    }

    /// View the table entries.
    ///
    /// # Safety
    /// `entries`/`len` must describe a live array of `TypeEntry`.
    pub unsafe fn entries(&self) -> &[TypeEntry] {
        if self.entries.is_null() || self.len == 0 {
            return &[];
        }
        // SAFETY: Caller guarantees the array is live
        unsafe { std::slice::from_raw_parts(self.entries, self.len) }
    }
}

/// Take ownership of an instance returned by a [`ConstructFn`].
///
/// # Safety
/// `raw` must be null or a pointer produced by a `ConstructFn` that has not
/// been taken before.
pub unsafe fn take_instance(raw: *mut c_void) -> Option<Box<dyn Extension>> {
    if raw.is_null() {
        return None;
    }
    // SAFETY: Caller guarantees raw came from Box::into_raw in a ConstructFn
    let boxed = unsafe { Box::from_raw(raw.cast::<Box<dyn Extension>>()) };
    Some(*boxed)
}

unsafe extern "C" fn construct_default<T: Extension + Default + 'static>() -> *mut c_void {
    // Panics must not unwind across the C boundary.
    match std::panic::catch_unwind(|| {
        let instance: Box<dyn Extension> = Box::new(T::default());
        Box::new(instance)
    }) {
        Ok(boxed) => Box::into_raw(boxed).cast(),
        Err(_) => std::ptr::null_mut(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtensionResult;

    #[derive(Default)]
    struct Sample;

    impl Extension for Sample {
        fn activate(&mut self) -> ExtensionResult<()> {
            Ok(())
        }

        fn deactivate(&mut self) -> ExtensionResult<()> {
            Ok(())
        }
    }

    struct Exploding;

    impl Default for Exploding {
        fn default() -> Self {
            panic!("refusing to construct");
        }
    }

    impl Extension for Exploding {
        fn activate(&mut self) -> ExtensionResult<()> {
            Ok(())
        }

        fn deactivate(&mut self) -> ExtensionResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_entry_kinds() {
        let ext = TypeEntry::extension::<Sample>("demo::Sample");
        assert!(ext.is_extension());
        assert!(ext.construct.is_some());

        let abstract_ext = TypeEntry::without_constructor("demo::Abstract");
        assert!(abstract_ext.is_extension());
        assert!(abstract_ext.construct.is_none());

        let opaque = TypeEntry::opaque("demo::Helper");
        assert!(!opaque.is_extension());
        assert_eq!(unsafe { opaque.name() }, Some("demo::Helper"));
    }

    #[test]
    fn test_construct_roundtrip() {
        let entry = TypeEntry::extension::<Sample>("demo::Sample");
        let construct = entry.construct.expect("constructor");
        let mut instance = unsafe { take_instance(construct()) }.expect("instance");
        assert!(instance.activate().is_ok());
    }

    #[test]
    fn test_construct_panic_returns_null() {
        let entry = TypeEntry::extension::<Exploding>("demo::Exploding");
        let construct = entry.construct.expect("constructor");
        let raw = unsafe { construct() };
        assert!(raw.is_null());
        assert!(unsafe { take_instance(raw) }.is_none());
    }

    #[test]
    fn test_empty_table() {
        static NONE: &[TypeEntry] = &[];
        let table = TypeTable::new(NONE);
        assert_eq!(table.abi_version, ABI_VERSION);
        assert!(unsafe { table.entries() }.is_empty());
    }

    #[test]
    fn test_symbol_is_nul_terminated() {
        assert_eq!(TYPE_TABLE_SYMBOL.last(), Some(&0));
    }
}
