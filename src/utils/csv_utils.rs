/// Minimal CSV writer matching the legacy export format: strings always
/// quoted, booleans bare, rows joined by `\n` with no trailing newline. The
/// exact byte shape is load-bearing for downstream imports, which is why this
/// is not delegated to a generic writer with its own quoting policy.

pub enum CsvValue {
    Str(String),
    Bool(bool),
}

fn format_field(value: &CsvValue) -> String {
    match value {
        CsvValue::Str(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        CsvValue::Bool(b) => b.to_string(),
    }
}

pub fn write_rows(rows: &[Vec<CsvValue>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(format_field)
                .collect::<Vec<String>>()
                .join(",")
        })
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_strings_and_leaves_booleans_bare() {
        let rows = vec![
            vec![
                CsvValue::Str("email".to_string()),
                CsvValue::Str("managed".to_string()),
            ],
            vec![CsvValue::Str("a@b.co".to_string()), CsvValue::Bool(false)],
        ];
        assert_eq!(write_rows(&rows), "\"email\",\"managed\"\n\"a@b.co\",false");
    }

    #[test]
    fn escapes_embedded_quotes() {
        let rows = vec![vec![CsvValue::Str("she said \"hi\"".to_string())]];
        assert_eq!(write_rows(&rows), "\"she said \"\"hi\"\"\"");
    }

    #[test]
    fn no_trailing_newline() {
        let rows = vec![vec![CsvValue::Str("only".to_string())]];
        assert!(!write_rows(&rows).ends_with('\n'));
    }
}
