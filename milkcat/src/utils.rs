use csv_core::ReadFieldResult;

use crate::errors::{MilkcatError, Result};

pub trait FromU32 {
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // The pointer width is at least 32 bits.
        src as Self
    }
}

/// Splits a CSV row into its cells, unquoting them.
pub fn parse_csv_row(row: &str) -> Result<Vec<String>> {
    let mut cells = vec![];
    let mut rdr = csv_core::Reader::new();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        let end = match result {
            ReadFieldResult::InputEmpty | ReadFieldResult::End => true,
            ReadFieldResult::Field { .. } => false,
            ReadFieldResult::OutputFull => {
                return Err(MilkcatError::invalid_format(
                    "row",
                    format!("a cell is too long: {row}"),
                ));
            }
        };
        let cell = std::str::from_utf8(&output[..nout])
            .map_err(|e| MilkcatError::invalid_format("row", e.to_string()))?;
        cells.push(cell.to_string());
        if end {
            break;
        }
        bytes = &bytes[nin..];
    }
    Ok(cells)
}

/// Iterates over the meaningful lines of a table, skipping blank lines
/// and `#` comments. Each item carries the 1-based line number.
pub fn table_lines<R>(rdr: R) -> impl Iterator<Item = Result<(usize, String)>>
where
    R: std::io::Read,
{
    use std::io::BufRead;

    std::io::BufReader::new(rdr)
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    None
                } else {
                    Some(Ok((i + 1, trimmed.to_string())))
                }
            }
            Err(e) => Some(Err(e.into())),
        })
}
