// Internal utilities for documentation tests
// This file contains helper functions to generate test files for doctests

use crate::{EdfWriter, Result};
use std::path::Path;

/// Creates a single-channel test header file for documentation examples
pub fn create_simple_test_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let mut writer = EdfWriter::new();
    writer.set_patient_id("DOC001")?;
    writer.set_start_date("01.01.9010.00.00")?;
    writer.set_duration(1.0)?;
    writer.add_channel("EEG Fp1")?;
    writer.save(path)
}

/// Creates a multi-channel test header file for documentation examples
pub fn create_multi_channel_test_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let mut writer = EdfWriter::new();
    writer.set_patient_id("DOC002")?;
    writer.set_start_date("15.03.8509.15.00")?;
    writer.set_duration(300.0)?;
    writer.set_annotation_count(5)?;
    for label in ["EEG Fp1", "EEG Fp2", "EEG F7", "EEG F3", "EEG Fz"] {
        writer.add_channel(label)?;
    }
    writer.save(path)
}
