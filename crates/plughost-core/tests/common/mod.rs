//! Shared fixtures for plughost-core integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use plughost_core::extension::{BundleWriter, HostTypes};
use plughost_extension_sdk::{Extension, ExtensionError, ExtensionResult};

/// Ordered record of lifecycle calls across all recorders.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Journal::default()
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Extension that appends every lifecycle call to a journal.
pub struct Recorder {
    name: String,
    journal: Journal,
    fail_activate: bool,
}

impl Extension for Recorder {
    fn activate(&mut self) -> ExtensionResult<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("activate {}", self.name));
        if self.fail_activate {
            return Err(ExtensionError::ActivationFailed(self.name.clone()));
        }
        Ok(())
    }

    fn deactivate(&mut self) -> ExtensionResult<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("deactivate {}", self.name));
        Ok(())
    }
}

/// Register a recording extension; construction is journaled too.
pub fn register_recorder(host: &mut HostTypes, name: &str, journal: &Journal) {
    register_recorder_with(host, name, journal, false);
}

/// Register a recording extension whose `activate` fails.
pub fn register_failing_recorder(host: &mut HostTypes, name: &str, journal: &Journal) {
    register_recorder_with(host, name, journal, true);
}

fn register_recorder_with(host: &mut HostTypes, name: &str, journal: &Journal, fail_activate: bool) {
    let type_name = name.to_string();
    let journal = journal.clone();
    host.register_constructor(name, move || {
        journal
            .lock()
            .unwrap()
            .push(format!("construct {}", type_name));
        Ok(Box::new(Recorder {
            name: type_name.clone(),
            journal: journal.clone(),
            fail_activate,
        }) as Box<dyn Extension>)
    });
}

/// Write a bundle listing `types` in order.
pub fn write_bundle(dir: &Path, file: &str, types: &[&str]) -> PathBuf {
    let path = dir.join(file);
    types
        .iter()
        .fold(BundleWriter::new(), |writer, name| writer.with_type(*name))
        .write_to(&path)
        .unwrap();
    path
}

/// Bundle paths as the directory lists them.
pub fn listing_order(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.path())
        .filter(|p| plughost_core::extension::is_bundle_file(p))
        .collect()
}
