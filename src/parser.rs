use std::{
    error, fmt,
    io::{self, BufRead},
    iter, num,
};

#[derive(Debug)]
pub struct ParseError {
    line_number: usize,
    source: Box<dyn error::Error + Send + Sync + 'static>,
}

impl ParseError {
    fn new(line_number: usize, source: impl Into<Box<dyn error::Error + Send + Sync>>) -> Self {
        Self {
            line_number,
            source: source.into(),
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.source)
    }
}

impl error::Error for ParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&*self.source)
    }
}

#[derive(Debug)]
struct ColumnCountError {
    expected: usize,
    found: usize,
}

impl fmt::Display for ColumnCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {} columns, found {}",
            self.expected, self.found
        )
    }
}

impl error::Error for ColumnCountError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// Whitespace separated numbers of one data line.
#[derive(Debug)]
pub struct Row {
    pub line_number: usize,
    pub values: Vec<f64>,
}

impl Row {
    pub fn with_columns(self, expected: usize) -> ParseResult<Vec<f64>> {
        if self.values.len() == expected {
            Ok(self.values)
        } else {
            Err(ParseError::new(
                self.line_number,
                ColumnCountError {
                    expected,
                    found: self.values.len(),
                },
            ))
        }
    }
}

fn parse_row(line_number: usize, line: &str) -> ParseResult<Row> {
    let values = line
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, num::ParseFloatError>>()
        .map_err(|err| ParseError::new(line_number, err))?;
    Ok(Row {
        line_number,
        values,
    })
}

/// Yields numeric rows, skipping blank lines and `#` comments.
pub struct RowReader {
    iter: Box<dyn Iterator<Item = (usize, io::Result<String>)>>,
}

impl RowReader {
    pub fn new(reader: impl BufRead + 'static) -> Self {
        Self {
            iter: Box::new(iter::zip(1usize.., reader.lines())),
        }
    }

    /// Next row that must hold exactly `columns` values.
    pub fn next_columns(&mut self, columns: usize) -> Option<ParseResult<Vec<f64>>> {
        self.next().map(|row| row.and_then(|row| row.with_columns(columns)))
    }
}

impl Iterator for RowReader {
    type Item = ParseResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        for (line_number, line) in self.iter.by_ref() {
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(ParseError::new(line_number, err))),
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(parse_row(line_number, trimmed));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_rows_skip_comments() {
        let text = "# header\n1 2 3\n\n  4.5 -6e-3 7\n";
        let rows = RowReader::new(Cursor::new(text))
            .collect::<ParseResult<Vec<_>>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line_number, 2);
        assert_eq!(rows[1].line_number, 4);
        assert_eq!(rows[1].values, vec![4.5, -6e-3, 7.0]);
    }

    #[test]
    fn test_errors_carry_line_number() {
        let mut reader = RowReader::new(Cursor::new("1 2\n3 x\n"));
        assert!(reader.next_columns(2).unwrap().is_ok());
        let err = reader.next_columns(2).unwrap().unwrap_err();
        assert_eq!(err.line_number(), 2);

        let mut reader = RowReader::new(Cursor::new("1 2 3\n"));
        let err = reader.next_columns(2).unwrap().unwrap_err();
        assert_eq!(err.line_number(), 1);
        assert!(err.to_string().contains("expected 2 columns, found 3"));
        assert!(reader.next_columns(2).is_none());
    }
}
