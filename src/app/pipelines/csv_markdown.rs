use crate::core::{Pipeline, Storage};
use crate::utils::error::{FigureError, Result};
use std::path::Path;

/// Bytes inspected when deciding whether the first row is a header.
const SNIFF_BYTES: usize = 1024;
/// Rows compared against the candidate header.
const SNIFF_ROWS: usize = 21;

#[derive(Debug, Clone)]
pub struct CsvMarkdownOptions {
    pub inputs: Vec<String>,
    /// Used only when exactly one input is given.
    pub output: Option<String>,
    pub output_dir: String,
    /// Comma-separated `left`/`center`/`right` list, cycled over columns.
    pub align: Option<String>,
}

impl Default for CsvMarkdownOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: None,
            output_dir: "tables".to_string(),
            align: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion<T> {
    pub input: String,
    pub output: String,
    pub content: T,
}

pub struct CsvMarkdownPipeline<S: Storage> {
    storage: S,
    options: CsvMarkdownOptions,
}

impl<S: Storage> CsvMarkdownPipeline<S> {
    pub fn new(storage: S, options: CsvMarkdownOptions) -> Self {
        Self { storage, options }
    }

    pub fn output_for(&self, input: &str) -> String {
        match &self.options.output {
            Some(output) if self.options.inputs.len() == 1 => output.clone(),
            _ => {
                let stem = Path::new(input)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(input);
                format!("{}/{}.md", self.options.output_dir.trim_end_matches('/'), stem)
            }
        }
    }
}

impl<S: Storage> Pipeline for CsvMarkdownPipeline<S> {
    type Extracted = Vec<Conversion<CsvTable>>;
    type Transformed = Vec<Conversion<String>>;

    fn name(&self) -> &'static str {
        "csv-to-md"
    }

    fn extract(&self) -> Result<Vec<Conversion<CsvTable>>> {
        let mut tables = Vec::new();
        for input in &self.options.inputs {
            if !self.storage.exists(input) {
                tracing::warn!("File not found: {}", self.storage.display_path(input));
                continue;
            }
            let parsed = self.storage.read_file(input).and_then(|bytes| read_table(&bytes));
            match parsed {
                Ok(table) => tables.push(Conversion {
                    input: input.clone(),
                    output: self.output_for(input),
                    content: table,
                }),
                Err(e) => tracing::error!("Error converting {} to Markdown: {}", input, e),
            }
        }
        Ok(tables)
    }

    fn transform(&self, tables: Vec<Conversion<CsvTable>>) -> Result<Vec<Conversion<String>>> {
        let align = self.options.align.as_deref();
        Ok(tables
            .into_iter()
            .map(|c| Conversion {
                content: to_markdown(&c.content, align),
                input: c.input,
                output: c.output,
            })
            .collect())
    }

    fn load(&self, tables: Vec<Conversion<String>>) -> Result<Vec<String>> {
        if tables.is_empty() {
            tracing::warn!("No CSV files were converted");
        }
        let mut written = Vec::with_capacity(tables.len());
        for table in tables {
            self.storage.write_file(&table.output, table.content.as_bytes())?;
            let output = self.storage.display_path(&table.output);
            tracing::info!("Successfully converted {} to {}", table.input, output);
            written.push(output);
        }
        Ok(written)
    }
}

/// Markdown separator cells for `n` columns.
pub fn column_alignments(spec: Option<&str>, n: usize) -> Vec<&'static str> {
    let spec = spec.filter(|s| !s.is_empty());
    let Some(spec) = spec else {
        return vec![":---:"; n];
    };
    let choices: Vec<&str> = spec.split(',').collect();
    (0..n)
        .map(|i| match choices[i % choices.len()].trim().to_lowercase().as_str() {
            "left" => ":---",
            "right" => "---:",
            _ => ":---:",
        })
        .collect()
}

pub fn to_markdown(table: &CsvTable, align: Option<&str>) -> String {
    let header = table.columns.join(" | ");
    let separator = column_alignments(align, table.columns.len()).join(" | ");
    let rows: Vec<String> = table
        .rows
        .iter()
        .map(|row| format!("| {} |", row.join(" | ")))
        .collect();
    format!("| {} |\n| {} |\n{}", header, separator, rows.join("\n"))
}

pub fn read_table(bytes: &[u8]) -> Result<CsvTable> {
    let sample_len = bytes.len().min(SNIFF_BYTES);
    let header = has_header(&String::from_utf8_lossy(&bytes[..sample_len]));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        records.push(record.iter().map(|c| c.to_string()).collect::<Vec<_>>());
    }

    let mut records = records.into_iter();
    let columns = if header {
        records.next().unwrap_or_default()
    } else {
        let width = records.as_slice().first().map_or(0, |first| first.len());
        (1..=width).map(|i| format!("Column{}", i)).collect()
    };

    let width = columns.len();
    let mut rows = Vec::new();
    for (line, mut row) in records.enumerate() {
        if row.len() > width {
            return Err(FigureError::ProcessingError {
                message: format!(
                    "expected {} fields in data row {}, saw {}",
                    width,
                    line + 1,
                    row.len()
                ),
            });
        }
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(CsvTable { columns, rows })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Numeric,
    Length(usize),
}

fn kind_of(cell: &str) -> ColumnKind {
    if cell.trim().parse::<f64>().is_ok() {
        ColumnKind::Numeric
    } else {
        ColumnKind::Length(cell.chars().count())
    }
}

/// Votes on whether the first row of `sample` names the columns. Each column
/// whose body cells share one kind (numeric, or a fixed text length) votes
/// for a header when the first row breaks that pattern and against it when
/// the first row fits.
pub fn has_header(sample: &str) -> bool {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(sample.as_bytes());
    let mut rows = reader.records().filter_map(|r| r.ok());

    let Some(header) = rows.next() else {
        return false;
    };
    let width = header.len();
    let mut kinds: Vec<Option<Option<ColumnKind>>> = vec![Some(None); width];

    for row in rows.take(SNIFF_ROWS) {
        if row.len() != width {
            continue;
        }
        for (col, slot) in kinds.iter_mut().enumerate() {
            let kind = kind_of(&row[col]);
            *slot = match *slot {
                None => None,
                Some(None) => Some(Some(kind)),
                Some(Some(previous)) if previous == kind => Some(Some(previous)),
                Some(Some(_)) => None,
            };
        }
    }

    let mut votes = 0i32;
    for (col, kind) in kinds.iter().enumerate() {
        let Some(Some(kind)) = kind else {
            continue;
        };
        if kind_of(&header[col]) == *kind {
            votes -= 1;
        } else {
            votes += 1;
        }
    }
    votes > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::FigureEngine;
    use crate::utils::test_support::MockStorage;

    const WITH_HEADER: &str = "Format,Year,Size\nDICOM,1993,12.5\nOME-TIFF,2005,8.25\n";
    const WITHOUT_HEADER: &str = "1,2.5,abc\n2,3.5,xyz\n3,4.5,foo\n";

    fn options(inputs: &[&str]) -> CsvMarkdownOptions {
        CsvMarkdownOptions {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_column_alignments() {
        assert_eq!(column_alignments(None, 2), vec![":---:", ":---:"]);
        assert_eq!(
            column_alignments(Some("left, RIGHT"), 3),
            vec![":---", "---:", ":---"]
        );
        assert_eq!(column_alignments(Some("justify"), 1), vec![":---:"]);
    }

    #[test]
    fn test_header_detection() {
        assert!(has_header(WITH_HEADER));
        assert!(!has_header(WITHOUT_HEADER));
    }

    #[test]
    fn test_markdown_with_header() {
        let table = read_table(WITH_HEADER.as_bytes()).unwrap();
        assert_eq!(
            to_markdown(&table, Some("left,center,right")),
            "| Format | Year | Size |\n| :--- | :---: | ---: |\n| DICOM | 1993 | 12.5 |\n| OME-TIFF | 2005 | 8.25 |"
        );
    }

    #[test]
    fn test_generic_column_names() {
        let table = read_table(WITHOUT_HEADER.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["Column1", "Column2", "Column3"]);
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = read_table(b"Name,Value\nalpha,1\nbeta\n").unwrap();
        assert_eq!(table.rows[1], vec!["beta", ""]);
        assert!(read_table(b"Name,Value\nalpha,1\nbeta,2,3\n").is_err());
    }

    #[test]
    fn test_output_naming() {
        let storage = MockStorage::new();
        let mut opts = options(&["data/formats.csv"]);
        opts.output = Some("out.md".to_string());
        assert_eq!(CsvMarkdownPipeline::new(storage.clone(), opts).output_for("data/formats.csv"), "out.md");

        let mut opts = options(&["a.csv", "b.csv"]);
        opts.output = Some("out.md".to_string());
        assert_eq!(
            CsvMarkdownPipeline::new(storage, opts).output_for("data/b.csv"),
            "tables/b.md"
        );
    }

    #[test]
    fn test_missing_inputs_are_skipped() {
        let storage = MockStorage::new().with_file("formats.csv", WITH_HEADER);
        let pipeline = CsvMarkdownPipeline::new(storage.clone(), options(&["missing.csv", "formats.csv"]));

        let outputs = FigureEngine::new(pipeline).run().unwrap();

        assert_eq!(outputs, vec!["tables/formats.md"]);
        assert!(storage
            .get_text("tables/formats.md")
            .unwrap()
            .starts_with("| Format | Year | Size |\n| :---: | :---: | :---: |\n"));
    }
}
