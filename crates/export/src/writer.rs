//! Text layout for quantised tensors.
//!
//! # Format
//!
//! ```text
//! layer_1_dense_weights
//! -128, 64, 32, ..., 12,
//! 7, 0, -3
//!
//! layer_1_dense_bias
//! 5, -9
//! ```
//!
//! * One name line per block.
//! * Values in row-major order, base-10, joined by `", "`.
//! * A line break after every 20th value, except after the last one. The
//!   separator is written before the break, so each full line ends in
//!   `", "` and the text can be pasted straight into a VHDL aggregate.
//! * Blocks in one artifact are separated by one blank line.
//! * No trailing separator or line break after the final value.
//!
//! Layout depends only on element counts, never on the values.

use std::io::{self, Write};

use q07_core::{NamedBlock, QuantTensor};

/// Values per text line.
pub const VALUES_PER_LINE: usize = 20;
/// Separator between consecutive values.
pub const SEPARATOR: &str = ", ";

/// Write one named block: the name line, then the wrapped value list.
pub fn write_tensor<W: Write + ?Sized>(
    sink: &mut W,
    name: &str,
    tensor: &QuantTensor,
) -> io::Result<()> {
    writeln!(sink, "{name}")?;
    let values = tensor.values();
    let last = values.len().saturating_sub(1);
    for (i, v) in values.iter().enumerate() {
        write!(sink, "{v}")?;
        if i != last {
            sink.write_all(SEPARATOR.as_bytes())?;
            if (i + 1) % VALUES_PER_LINE == 0 {
                sink.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

/// Write several blocks into one artifact, blank-line separated.
pub fn write_blocks<W: Write + ?Sized>(
    sink: &mut W,
    blocks: &[NamedBlock],
) -> io::Result<()> {
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            sink.write_all(b"\n\n")?;
        }
        write_tensor(sink, &block.name, &block.tensor)?;
    }
    Ok(())
}
