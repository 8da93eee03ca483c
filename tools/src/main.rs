use rtty_core::afsk::{IDLE_UNITS, UNITS_PER_CHAR};
use rtty_core::receiver::TRACE_LEN;
use rtty_core::*;
use std::fs;
use std::path::PathBuf;

fn main() -> std::io::Result<()> {
    let web_constants_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../web/src/constants/rtty.ts");

    let content = format!(
        r#"// AUTO-GENERATED FILE - DO NOT EDIT MANUALLY
// Generated from core/src/lib.rs constants
// Run `cargo run --manifest-path tools/Cargo.toml` to regenerate

export const SAMPLE_RATE = {}
export const DEFAULT_MARK_FREQ = {}
export const DEFAULT_SHIFT = {}
export const DEFAULT_BAUD_RATE = {}
export const DEFAULT_THRESHOLD = {}
export const DEFAULT_SUBSAMPLE_FACTOR = {}
export const IDLE_UNITS = {}
export const UNITS_PER_CHAR = {}
export const TRACE_LEN = {}
export const TEST_MESSAGE = {:?}
"#,
        SAMPLE_RATE,
        DEFAULT_MARK_FREQ,
        DEFAULT_SHIFT,
        DEFAULT_BAUD_RATE,
        DEFAULT_THRESHOLD,
        DEFAULT_SUBSAMPLE_FACTOR,
        IDLE_UNITS,
        UNITS_PER_CHAR,
        TRACE_LEN,
        TEST_MESSAGE
    );

    if let Some(dir) = web_constants_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&web_constants_path, content)?;

    println!("Generated: {}", web_constants_path.display());
    Ok(())
}
