//! JSON output on stdout; everything else goes to stderr via tracing.

use anyhow::Result;
use serde::Serialize;

use crate::opts::EmulatorOpts;

pub fn to_json<T: Serialize + ?Sized>(opts: &EmulatorOpts, value: &T) -> Result<String> {
    if opts.pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

pub fn print_json<T: Serialize + ?Sized>(opts: &EmulatorOpts, value: &T) -> Result<()> {
    println!("{}", to_json(opts, value)?);
    Ok(())
}
