use std::fmt::Write as _;

/// Renders rows as left-aligned plain-text columns separated by two spaces,
/// with a dashed rule under the header. Trailing padding is trimmed.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| cell_width(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let mut output = String::new();
    push_line(&mut output, headers.iter().copied(), &widths);
    let rules = widths.iter().map(|w| "-".repeat((*w).max(1))).collect::<Vec<_>>();
    push_line(&mut output, rules.iter().map(String::as_str), &widths);
    for row in rows {
        push_line(&mut output, row.iter().map(String::as_str), &widths);
    }
    output
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn push_line<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (cell, &width) in cells.zip(widths) {
        let flat = cell.replace(['\n', '\r', '\t'], " ");
        let _ = write!(line, "{flat:<width$}  ");
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}
