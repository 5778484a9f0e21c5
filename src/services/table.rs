// src/services/table.rs

//! Ratio table decoding.
//!
//! Detail tables may start with a merged grouping column (usually the campus)
//! whose cell carries a `rowspan` and is absent from the rows it covers:
//!
//! ```text
//! | 캠퍼스 (rowspan=2) | 모집단위 | 모집인원 | 지원인원 | 경쟁률 |
//! |                    | 모집단위 | 모집인원 | 지원인원 | 경쟁률 |   <- one cell shorter
//! ```
//!
//! Tables are first reduced to plain [`RawCell`] rows so the grouping logic
//! can be exercised without any HTML.

use scraper::ElementRef;

use crate::error::RowParseError;
use crate::models::{DepartmentRecord, ExtractionConfig};
use crate::services::numeric::{parse_integer, parse_rate};

const RECRUIT_LABELS: &[&str] = &["모집인원", "recruit"];
const APPLY_LABELS: &[&str] = &["지원인원", "apply"];
const RATE_LABELS: &[&str] = &["경쟁률", "rate"];
const DETAIL_LABELS: &[&str] = &["세부", "전공", "detail"];

/// Text and span of one table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    pub rowspan: Option<String>,
}

impl RawCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rowspan: None,
        }
    }

    pub fn spanning(text: impl Into<String>, rows: usize) -> Self {
        Self {
            text: text.into(),
            rowspan: Some(rows.to_string()),
        }
    }

    /// Number of rows this cell covers; 1 when no span is declared.
    fn span(&self) -> Result<usize, RowParseError> {
        match self.rowspan.as_deref().map(str::trim) {
            None | Some("") => Ok(1),
            Some(value) => value
                .parse::<usize>()
                .map(|n| n.max(1))
                .map_err(|_| RowParseError::InvalidSpan(value.to_string())),
        }
    }
}

pub type RawRow = Vec<RawCell>;

/// Concatenated, trimmed text of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

/// Read every `<tr>` of a table into raw rows of its direct `th`/`td` cells.
pub fn read_rows(table: ElementRef<'_>) -> Vec<RawRow> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .map(|tr| {
            tr.children()
                .filter_map(ElementRef::wrap)
                .filter(|el| matches!(el.value().name(), "th" | "td"))
                .map(|cell| RawCell {
                    text: element_text(cell),
                    rowspan: cell.value().attr("rowspan").map(str::to_string),
                })
                .collect()
        })
        .collect()
}

/// One admission line of the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub recruit: u64,
    pub apply: u64,
    pub rate: f64,
}

/// Column positions relative to the first non-grouping cell of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    name: usize,
    detail: Option<usize>,
    recruit: usize,
    apply: usize,
    rate: usize,
}

impl ColumnMap {
    const POSITIONAL: ColumnMap = ColumnMap {
        name: 0,
        detail: None,
        recruit: 1,
        apply: 2,
        rate: 3,
    };

    /// Resolve positions from header labels, falling back to the fixed
    /// `name | recruit | apply | rate` layout when they are not recognised.
    fn from_header(header: &[String]) -> Self {
        let find = |labels: &[&str]| {
            header
                .iter()
                .position(|h| labels.iter().any(|label| h.contains(label)))
        };

        match (find(RECRUIT_LABELS), find(APPLY_LABELS), find(RATE_LABELS)) {
            (Some(recruit), Some(apply), Some(rate)) if recruit >= 1 => {
                let detail = find(DETAIL_LABELS).filter(|&d| d < recruit && d > 0);
                ColumnMap {
                    name: 0,
                    detail,
                    recruit,
                    apply,
                    rate,
                }
            }
            _ => Self::POSITIONAL,
        }
    }

    fn last(&self) -> usize {
        self.recruit.max(self.apply).max(self.rate)
    }
}

/// Where the current row's columns start and which group it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowLayout {
    group: Option<String>,
    offset: usize,
}

/// Tracks the grouping label of a merged first column.
///
/// `remaining` counts the physical rows still covered by `label`; every data
/// row consumes one unit, including skipped total rows.
#[derive(Debug, Default)]
struct GroupTracker {
    label: Option<String>,
    remaining: usize,
}

impl GroupTracker {
    /// Consume one row slot if a span is active. Returns the covering label.
    fn consume_spanned(&mut self) -> Option<Option<String>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.label.clone())
    }

    fn next_row(&mut self, row: &[RawCell]) -> Result<RowLayout, RowParseError> {
        if let Some(group) = self.consume_spanned() {
            return Ok(RowLayout { group, offset: 0 });
        }

        let cell = row
            .first()
            .ok_or(RowParseError::MissingCell { index: 0, len: 0 })?;
        let span = cell.span()?;
        self.label = Some(cell.text.clone());
        self.remaining = span - 1;

        Ok(RowLayout {
            group: self.label.clone(),
            offset: 1,
        })
    }
}

/// Decodes summary and detail ratio tables.
pub struct TableStructureParser<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> TableStructureParser<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// Parse the summary table: one row per admission, totals skipped.
    pub fn parse_summary_table(&self, table: ElementRef<'_>) -> Vec<SummaryRow> {
        self.decode_summary_rows(&read_rows(table))
    }

    /// Parse a detail table into department records in document order.
    pub fn parse_detail_table(&self, table: ElementRef<'_>) -> Vec<DepartmentRecord> {
        self.decode_detail_rows(&read_rows(table))
    }

    /// Summary rows after the header; rows shorter than four cells are ignored.
    pub fn decode_summary_rows(&self, rows: &[RawRow]) -> Vec<SummaryRow> {
        rows.iter()
            .skip(1)
            .filter(|cells| cells.len() >= 4)
            .filter(|cells| !self.config.is_reserved(&cells[0].text))
            .map(|cells| SummaryRow {
                name: cells[0].text.clone(),
                recruit: parse_integer(&cells[1].text),
                apply: parse_integer(&cells[2].text),
                rate: parse_rate(&cells[3].text),
            })
            .collect()
    }

    /// Detail rows after the header row.
    pub fn decode_detail_rows(&self, rows: &[RawRow]) -> Vec<DepartmentRecord> {
        let Some((header, body)) = rows.split_first() else {
            return Vec::new();
        };

        let header: Vec<String> = header.iter().map(|c| c.text.to_lowercase()).collect();
        let has_group = header.iter().any(|h| {
            self.config
                .group_header_labels
                .iter()
                .any(|label| h.contains(&label.to_lowercase()))
        });

        // Header positions include the grouping column; data positions are
        // relative to the first cell after it.
        let columns = if has_group {
            ColumnMap::from_header(header.get(1..).unwrap_or_default())
        } else {
            ColumnMap::from_header(&header)
        };

        let mut tracker = GroupTracker::default();
        let mut departments = Vec::new();

        for (row_index, cells) in body.iter().enumerate() {
            let first_text = cells.first().map(|c| c.text.as_str()).unwrap_or("");
            if cells.is_empty() || self.config.is_reserved(first_text) {
                if has_group {
                    tracker.consume_spanned();
                }
                continue;
            }

            let layout = if has_group {
                tracker.next_row(cells)
            } else {
                Ok(RowLayout {
                    group: None,
                    offset: 0,
                })
            };

            match layout.and_then(|layout| self.build_department(cells, &layout, &columns)) {
                Ok(Some(dept)) => departments.push(dept),
                Ok(None) => {}
                Err(e) => log::debug!("Skipping detail row {}: {}", row_index + 1, e),
            }
        }

        departments
    }

    fn build_department(
        &self,
        cells: &[RawCell],
        layout: &RowLayout,
        columns: &ColumnMap,
    ) -> Result<Option<DepartmentRecord>, RowParseError> {
        let needed = layout.offset + columns.last();
        if cells.len() <= needed {
            return Err(RowParseError::MissingCell {
                index: needed,
                len: cells.len(),
            });
        }

        let cell = |index: usize| cells[layout.offset + index].text.as_str();

        let name = cell(columns.name).trim();
        if name.is_empty() || self.is_reserved_name(name) {
            return Ok(None);
        }

        let detail = columns
            .detail
            .map(|i| cell(i).trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Some(DepartmentRecord {
            campus: layout.group.clone(),
            name: name.to_string(),
            detail,
            recruit_count: parse_integer(cell(columns.recruit)),
            apply_count: parse_integer(cell(columns.apply)),
            competition_rate: parse_rate(cell(columns.rate)),
        }))
    }

    fn is_reserved_name(&self, name: &str) -> bool {
        self.config.reserved_labels.iter().any(|label| label == name)
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::*;

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|t| RawCell::new(*t)).collect()
    }

    fn grouped(group: &str, span: usize, rest: &[&str]) -> RawRow {
        let mut cells = vec![RawCell::spanning(group, span)];
        cells.extend(rest.iter().map(|t| RawCell::new(*t)));
        cells
    }

    fn header() -> RawRow {
        row(&["캠퍼스", "모집단위", "모집인원", "지원인원", "경쟁률"])
    }

    #[test]
    fn test_group_spans_assign_exact_rows() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        let rows = vec![
            header(),
            grouped("A", 3, &["a1", "1", "2", "2.0 : 1"]),
            row(&["a2", "1", "3", "3.0 : 1"]),
            row(&["a3", "1", "4", "4.0 : 1"]),
            grouped("B", 2, &["b1", "2", "2", "1.0 : 1"]),
            row(&["b2", "2", "6", "3.0 : 1"]),
        ];

        let depts = parser.decode_detail_rows(&rows);
        let groups: Vec<_> = depts
            .iter()
            .map(|d| (d.campus.as_deref().unwrap(), d.name.as_str()))
            .collect();
        assert_eq!(
            groups,
            vec![("A", "a1"), ("A", "a2"), ("A", "a3"), ("B", "b1"), ("B", "b2")]
        );
        assert_eq!(depts[2].apply_count, 4);
        assert_eq!(depts[4].competition_rate, 3.0);
    }

    #[test]
    fn test_group_without_span_covers_one_row() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        let rows = vec![
            header(),
            row(&["서울", "경영학과", "10", "50", "5.0 : 1"]),
            row(&["세종", "물리학과", "5", "10", "2.0 : 1"]),
        ];

        let depts = parser.decode_detail_rows(&rows);
        assert_eq!(depts.len(), 2);
        assert_eq!(depts[0].campus.as_deref(), Some("서울"));
        assert_eq!(depts[1].campus.as_deref(), Some("세종"));
        assert_eq!(depts[1].name, "물리학과");
    }

    #[test]
    fn test_subtotal_inside_span_keeps_alignment() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        let rows = vec![
            header(),
            grouped("A", 3, &["a1", "1", "2", "2.0"]),
            row(&["a2", "1", "3", "3.0"]),
            row(&["소계", "2", "5", "2.5"]),
            grouped("B", 1, &["b1", "1", "1", "1.0"]),
        ];

        let depts = parser.decode_detail_rows(&rows);
        let names: Vec<_> = depts
            .iter()
            .map(|d| (d.campus.clone().unwrap(), d.name.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("A".to_string(), "a1".to_string()),
                ("A".to_string(), "a2".to_string()),
                ("B".to_string(), "b1".to_string()),
            ]
        );
    }

    #[test]
    fn test_reserved_rows_never_emitted() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        for size in 1..6 {
            let mut rows = vec![row(&["모집단위", "모집인원", "지원인원", "경쟁률"])];
            for i in 0..size {
                rows.push(row(&[&format!("학과{i}"), "1", "1", "1.0"]));
                rows.push(row(&["합계", "1", "1", "1.0"]));
                rows.push(row(&["정원외 소계", "1", "1", "1.0"]));
            }
            rows.push(row(&["총계", "9", "9", "1.0"]));

            let depts = parser.decode_detail_rows(&rows);
            assert_eq!(depts.len(), size);
            assert!(depts.iter().all(|d| !config.is_reserved(&d.name)));
        }
    }

    #[test]
    fn test_reserved_name_after_group_cell_is_dropped() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        let rows = vec![
            header(),
            grouped("A", 2, &["a1", "1", "2", "2.0"]),
            row(&["소계", "1", "2", "2.0"]),
            row(&["A", "합계", "1", "2", "2.0"]),
        ];

        let depts = parser.decode_detail_rows(&rows);
        assert_eq!(depts.len(), 1);
        assert_eq!(depts[0].name, "a1");
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        let mut bad_span = grouped("A", 1, &["a1", "1", "1", "1.0"]);
        bad_span[0].rowspan = Some("two".to_string());

        let rows = vec![
            header(),
            bad_span,
            row(&["B", "short"]),
            row(&["C", "  ", "1", "1", "1.0"]),
            row(&["D", "d1", "3", "9", "3.0 : 1"]),
        ];

        let depts = parser.decode_detail_rows(&rows);
        assert_eq!(depts.len(), 1);
        assert_eq!(depts[0].campus.as_deref(), Some("D"));
        assert_eq!(depts[0].apply_count, 9);
    }

    #[test]
    fn test_no_group_column() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        let rows = vec![
            row(&["모집단위", "모집인원", "지원인원", "경쟁률"]),
            row(&["CS", "5", "20", "4.0:1"]),
            row(&["EE", "5", "15", "3.0:1"]),
        ];

        let depts = parser.decode_detail_rows(&rows);
        assert_eq!(depts.len(), 2);
        assert!(depts.iter().all(|d| d.campus.is_none()));
        assert_eq!(depts[0].competition_rate, 4.0);
    }

    #[test]
    fn test_detail_column_from_header() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        let rows = vec![
            row(&["모집단위", "세부전공", "모집인원", "지원인원", "경쟁률"]),
            row(&["공학부", "기계공학", "10", "45", "4.5 : 1"]),
            row(&["공학부", "", "10", "20", "2.0 : 1"]),
        ];

        let depts = parser.decode_detail_rows(&rows);
        assert_eq!(depts[0].detail.as_deref(), Some("기계공학"));
        assert_eq!(depts[0].recruit_count, 10);
        assert_eq!(depts[1].detail, None);
    }

    #[test]
    fn test_empty_table() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);
        assert!(parser.decode_detail_rows(&[]).is_empty());
        assert!(parser.decode_detail_rows(&[header()]).is_empty());
        assert!(parser.decode_summary_rows(&[]).is_empty());
    }

    #[test]
    fn test_summary_rows() {
        let config = ExtractionConfig::default();
        let parser = TableStructureParser::new(&config);

        let rows = vec![
            row(&["전형명", "모집인원", "지원인원", "경쟁률"]),
            row(&["일반전형", "1,200", "4,800", "4.00 : 1"]),
            row(&["지역균형", "300", "900"]),
            row(&["합계", "1,200", "4,800", "4.00 : 1"]),
        ];

        let summary = parser.decode_summary_rows(&rows);
        assert_eq!(
            summary,
            vec![SummaryRow {
                name: "일반전형".to_string(),
                recruit: 1200,
                apply: 4800,
                rate: 4.0,
            }]
        );
    }

    #[test]
    fn test_read_rows_from_html() {
        let html = Html::parse_document(
            r#"<table class="tableRatio3">
                <tr><th>캠퍼스</th><th>모집단위</th><th>모집인원</th><th>지원인원</th><th>경쟁률</th></tr>
                <tr><td rowspan="2"> 서울 </td><td>국어<br>국문학과</td><td>3</td><td>9</td><td>3.0 : 1</td></tr>
                <tr><td>사학과</td><td>2</td><td>8</td><td>4.0 : 1</td></tr>
            </table>"#,
        );
        let selector = Selector::parse("table").unwrap();
        let table = html.select(&selector).next().unwrap();

        let rows = read_rows(table);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], RawCell::spanning("서울", 2));
        assert_eq!(rows[1][1].text, "국어국문학과");
        assert_eq!(rows[2].len(), 4);

        let config = ExtractionConfig::default();
        let depts = TableStructureParser::new(&config).parse_detail_table(table);
        assert_eq!(depts.len(), 2);
        assert_eq!(depts[1].campus.as_deref(), Some("서울"));
        assert_eq!(depts[1].name, "사학과");
    }
}
