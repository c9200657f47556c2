use std::io::Write;

use serde::Serialize;

pub(super) fn print_json<T: Serialize>(
    out: &mut dyn Write,
    value: &T,
) -> ncdrank_core::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    writeln!(out, "{rendered}")?;
    Ok(())
}

pub(super) fn print_json_compact<T: Serialize>(
    out: &mut dyn Write,
    value: &T,
) -> ncdrank_core::Result<()> {
    let rendered = serde_json::to_string(value)?;
    writeln!(out, "{rendered}")?;
    Ok(())
}
