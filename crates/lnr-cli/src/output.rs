use serde::Serialize;

/// Explicit table projection for one record type.
pub trait Row {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print `records` as JSON or as a table, whichever the invocation asked for.
pub fn print_records<T: Row + Serialize>(records: &[T], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(records);
    }
    if records.is_empty() {
        println!("(none)");
        return Ok(());
    }
    print_table(T::HEADERS, records.iter().map(|r| r.cells()).collect());
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    println!("{}", format_row(headers, &widths));
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));
    for row in &rows {
        println!("{}", format_row(row.as_slice(), &widths));
    }
}

/// Key/value pairs, one per line, keys aligned.
pub fn print_fields(fields: &[(&str, String)]) {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in fields {
        println!("{key:width$}  {value}");
    }
}

/// One table line; cells past the end of `widths` are left unpadded.
pub fn format_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let w = widths.get(i).copied().unwrap_or(0);
            format!("{:width$}", cell.as_ref(), width = w)
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Shorten `s` to at most `max` characters for table cells.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

pub fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}
