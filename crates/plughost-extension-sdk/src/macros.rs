//! Declarative macros for extension modules.

/// Export the module's type table.
///
/// Generates the `plughost_type_table` symbol the host resolves when it opens
/// the module. Entries are listed in the order the host should see them.
///
/// # Example
///
/// ```rust,ignore
/// use plughost_extension_sdk::prelude::*;
///
/// export_types![
///     TypeEntry::opaque("demo::Helper"),
///     TypeEntry::extension::<Greeter>("demo::Greeter"),
/// ];
/// ```
#[macro_export]
macro_rules! export_types {
    ($($entry:expr),* $(,)?) => {
        #[no_mangle]
        pub extern "C" fn plughost_type_table() -> $crate::descriptor::TypeTable {
            static ENTRIES: &[$crate::descriptor::TypeEntry] = &[$($entry),*];
            $crate::descriptor::TypeTable::new(ENTRIES)
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::descriptor::TypeEntry;
    use crate::types::{Extension, ExtensionResult};

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

    export_types![
        TypeEntry::opaque("sample::Helper"),
        TypeEntry::extension::<Sample>("sample::Sample"),
    ];

    #[test]
    fn test_macro_exports_entries_in_order() {
        let table = plughost_type_table();
        let names: Vec<&str> = unsafe { table.entries() }
            .iter()
            .map(|entry| unsafe { entry.name() }.unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["sample::Helper", "sample::Sample"]);
    }
}
