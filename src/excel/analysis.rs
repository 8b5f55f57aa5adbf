//! Workbook analysis: summary metrics, recommendations, formula and
//! PowerQuery suggestions, data-quality findings.
//!
//! The suggestions are templated from the parsed structure rather than
//! computed by a model. [`AnalysisProvider`] is the seam for swapping in a
//! smarter backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::excel::model::{column_letter, ColumnType, ExcelWorkbook, ExcelWorksheet};

const MAX_SUGGESTED_FORMULAS: usize = 8;
const MAX_QUALITY_ISSUES: usize = 8;

/// Share of missing values above which a column is flagged.
const MISSING_THRESHOLD: f64 = 20.0;
const MISSING_HIGH_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_sheets: usize,
    pub total_rows: usize,
    pub total_columns: usize,
    pub total_formulas: usize,
    pub data_types: BTreeMap<String, usize>,
    pub complexity_score: u32,
    pub automation_potential: Level,
}

impl AnalysisSummary {
    /// Figures reported when no parsed workbook accompanies the request.
    fn placeholder() -> Self {
        Self {
            total_sheets: 3,
            total_rows: 1250,
            total_columns: 12,
            total_formulas: 45,
            data_types: BTreeMap::from([
                ("text".to_string(), 6),
                ("number".to_string(), 4),
                ("date".to_string(), 2),
            ]),
            complexity_score: 72,
            automation_potential: Level::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationType {
    #[serde(rename = "formula")]
    Formula,
    #[serde(rename = "powerquery")]
    PowerQuery,
    #[serde(rename = "data_validation")]
    DataValidation,
    #[serde(rename = "formatting")]
    Formatting,
    #[serde(rename = "structure")]
    Structure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Level,
    pub title: String,
    pub description: String,
    pub implementation: String,
    pub impact: String,
    pub effort: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaCategory {
    Lookup,
    Math,
    Text,
    Date,
    Logical,
    Statistical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaComplexity {
    Basic,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFormula {
    pub formula: String,
    pub description: String,
    pub cell_address: String,
    pub category: FormulaCategory,
    pub complexity: FormulaComplexity,
    pub dependencies: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOperation {
    Source,
    Headers,
    #[serde(rename = "dataTypes")]
    DataTypes,
    Filter,
    Group,
    Merge,
    Pivot,
    Unpivot,
    AddColumn,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerQueryStep {
    pub id: String,
    pub name: String,
    pub operation: StepOperation,
    pub m_code: String,
    pub description: String,
    pub is_applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    DataCleaning,
    Transformation,
    Analysis,
    Reporting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerQueryTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: QueryCategory,
    pub steps: Vec<PowerQueryStep>,
    pub required_columns: Vec<String>,
    pub output_columns: Vec<String>,
    pub m_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MissingData,
    InconsistentFormat,
    Duplicate,
    Outlier,
    InvalidData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityIssue {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub severity: Level,
    pub sheet: String,
    pub column: String,
    pub description: String,
    pub affected_cells: Vec<String>,
    pub suggested_fix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcelAnalysis {
    pub summary: AnalysisSummary,
    pub recommendations: Vec<Recommendation>,
    pub suggested_formulas: Vec<GeneratedFormula>,
    pub suggested_power_queries: Vec<PowerQueryTemplate>,
    pub data_quality_issues: Vec<DataQualityIssue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub workbook_id: Option<String>,
    #[serde(default)]
    pub workbook: Option<ExcelWorkbook>,
}

pub trait AnalysisProvider: Send + Sync {
    fn analyze(&self, workbook: Option<&ExcelWorkbook>) -> ExcelAnalysis;
}

/// Rule-based analysis derived from the parsed workbook structure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateAnalysis;

impl AnalysisProvider for TemplateAnalysis {
    fn analyze(&self, workbook: Option<&ExcelWorkbook>) -> ExcelAnalysis {
        let summary = workbook.map(summarize).unwrap_or_else(AnalysisSummary::placeholder);
        tracing::debug!(
            sheets = summary.total_sheets,
            formulas = summary.total_formulas,
            complexity = summary.complexity_score,
            "Workbook analysis metrics"
        );

        ExcelAnalysis {
            recommendations: recommendations(&summary, workbook),
            suggested_formulas: suggested_formulas(workbook),
            suggested_power_queries: power_query_templates(workbook),
            data_quality_issues: data_quality_issues(workbook),
            summary,
        }
    }
}

pub fn process_analyze(
    provider: &dyn AnalysisProvider,
    request: AnalyzeRequest,
) -> Result<ExcelAnalysis, AppError> {
    let workbook_id = request
        .workbook_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Workbook ID is required".into()))?;

    tracing::info!(
        %workbook_id,
        workbook = request.workbook.as_ref().map(|w| w.name.as_str()),
        "Analyzing workbook"
    );
    Ok(provider.analyze(request.workbook.as_ref()))
}

fn all_formulas(workbook: &ExcelWorkbook) -> impl Iterator<Item = &str> {
    workbook
        .sheets
        .iter()
        .flat_map(|s| s.formula_cells.iter().map(|f| f.formula.as_str()))
}

fn columns_of(sheet: &ExcelWorksheet, kind: ColumnType) -> impl Iterator<Item = &crate::excel::model::ColumnDataType> {
    sheet.data_types.iter().filter(move |c| c.data_type == kind)
}

fn has_column_type(workbook: &ExcelWorkbook, kind: ColumnType) -> bool {
    workbook.sheets.iter().any(|s| columns_of(s, kind).next().is_some())
}

fn summarize(workbook: &ExcelWorkbook) -> AnalysisSummary {
    let total_sheets = workbook.sheets.len();
    let total_rows: usize = workbook.sheets.iter().map(|s| s.row_count).sum();
    let total_columns = workbook
        .sheets
        .iter()
        .map(|s| s.column_count)
        .max()
        .unwrap_or(0)
        .max(1);
    let total_formulas: usize = workbook.sheets.iter().map(|s| s.formula_cells.len()).sum();

    let mut data_types = BTreeMap::from([
        ("text".to_string(), 0),
        ("number".to_string(), 0),
        ("date".to_string(), 0),
    ]);
    for column in workbook.sheets.iter().flat_map(|s| &s.data_types) {
        let key = match column.data_type {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            _ => continue,
        };
        *data_types.entry(key.to_string()).or_default() += 1;
    }

    let formula_density = if total_rows > 0 {
        total_formulas as f64 / total_rows as f64 * 100.0
    } else {
        0.0
    };
    let sheet_complexity = total_sheets as f64 * 10.0;
    let volume_complexity = (((total_rows + 1) as f64).log10() * 10.0).min(30.0);
    let complexity_score = (formula_density + sheet_complexity + volume_complexity)
        .round()
        .min(100.0) as u32;

    let complex = all_formulas(workbook).any(|f| {
        ["VLOOKUP", "INDEX", "MATCH", "SUMIFS", "COUNTIFS"]
            .iter()
            .any(|name| f.contains(name))
    });
    let multiple_sheets = total_sheets > 1;

    let automation_potential = if (complex && multiple_sheets) || total_formulas > 20 {
        Level::High
    } else if complex || multiple_sheets || total_formulas > 5 {
        Level::Medium
    } else {
        Level::Low
    };

    AnalysisSummary {
        total_sheets,
        total_rows,
        total_columns,
        total_formulas,
        data_types,
        complexity_score,
        automation_potential,
    }
}

fn recommendations(summary: &AnalysisSummary, workbook: Option<&ExcelWorkbook>) -> Vec<Recommendation> {
    let complex_lookups = workbook.is_some_and(|w| {
        all_formulas(w).any(|f| ["VLOOKUP", "INDEX", "SUMIFS"].iter().any(|name| f.contains(name)))
    });
    let formulas = summary.total_formulas;
    let sheets = summary.total_sheets;

    let mut recs = Vec::new();

    if formulas > 10 || complex_lookups {
        recs.push(Recommendation {
            id: "rec_1".into(),
            kind: RecommendationType::PowerQuery,
            priority: Level::High,
            title: "Automate Data Processing with PowerQuery".into(),
            description: format!(
                "{} detected. PowerQuery can automate these transformations",
                if complex_lookups {
                    "Complex lookup formulas".to_string()
                } else {
                    format!("{formulas} formulas")
                }
            ),
            implementation: "Use Data → Get Data → From Other Sources → Blank Query to create automated data pipelines".into(),
            impact: format!(
                "Reduce manual formula maintenance by {}",
                if complex_lookups { "80%" } else { "70%" }
            ),
            effort: if complex_lookups { Level::High } else { Level::Medium },
        });
    }

    if sheets > 1 {
        recs.push(Recommendation {
            id: "rec_2".into(),
            kind: RecommendationType::Formula,
            priority: Level::Medium,
            title: "Consolidate Sheet References".into(),
            description: format!(
                "Multiple sheets detected ({sheets}). Use dynamic references to improve maintainability"
            ),
            implementation: "Replace hard-coded sheet references with INDIRECT or structured references".into(),
            impact: "Improve workbook flexibility and reduce errors".into(),
            effort: Level::Low,
        });
    }

    recs.push(Recommendation {
        id: "rec_3".into(),
        kind: RecommendationType::DataValidation,
        priority: if summary.automation_potential == Level::High {
            Level::High
        } else {
            Level::Medium
        },
        title: "Implement Data Validation".into(),
        description: "Add validation rules to prevent data entry errors and improve data quality".into(),
        implementation: "Use Data → Data Validation for critical input fields".into(),
        impact: "Reduce data quality issues by 90%".into(),
        effort: Level::Low,
    });

    recs
}

fn default_formulas() -> Vec<GeneratedFormula> {
    vec![
        GeneratedFormula {
            formula: r#"=XLOOKUP(A2,Products[Product_ID],Products[Price],"")"#.into(),
            description: "Dynamic price lookup with error handling".into(),
            cell_address: "D2".into(),
            category: FormulaCategory::Lookup,
            complexity: FormulaComplexity::Intermediate,
            dependencies: vec!["A2".into(), "Products[Product_ID]".into(), "Products[Price]".into()],
            explanation: "This formula looks up prices dynamically and returns an empty string if not found.".into(),
        },
        GeneratedFormula {
            formula: r#"=SUMIFS(Sales[Amount],Sales[Date],">="&TODAY()-30)"#.into(),
            description: "Sum sales from last 30 days".into(),
            cell_address: "G2".into(),
            category: FormulaCategory::Math,
            complexity: FormulaComplexity::Intermediate,
            dependencies: vec!["Sales[Amount]".into(), "Sales[Date]".into()],
            explanation: "Calculates total sales for the last 30 days using dynamic date criteria.".into(),
        },
    ]
}

fn sheet_formulas(sheet: &ExcelWorksheet) -> Vec<GeneratedFormula> {
    let mut formulas = Vec::new();

    if let Some(col) = columns_of(sheet, ColumnType::Number).next() {
        let letter = col.letter();
        let range = format!("{letter}2:{letter}1000");
        formulas.push(GeneratedFormula {
            formula: format!("=SUM({range})"),
            description: format!("Sum all values in {} column", col.header),
            cell_address: format!("{letter}{}", sheet.row_count + 2),
            category: FormulaCategory::Math,
            complexity: FormulaComplexity::Basic,
            dependencies: vec![range.clone()],
            explanation: format!(
                "Calculates the total of all numeric values in the {} column.",
                col.header
            ),
        });
        formulas.push(GeneratedFormula {
            formula: format!("=AVERAGE({range})"),
            description: format!("Average of {} column", col.header),
            cell_address: format!("{letter}{}", sheet.row_count + 3),
            category: FormulaCategory::Math,
            complexity: FormulaComplexity::Basic,
            dependencies: vec![range],
            explanation: format!(
                "Calculates the average of all numeric values in the {} column.",
                col.header
            ),
        });
    }

    if let Some(col) = columns_of(sheet, ColumnType::Date).next() {
        let letter = col.letter();
        let next = column_letter(col.column_index + 1);
        formulas.push(GeneratedFormula {
            formula: format!(r#"=COUNTIFS({letter}:{letter},">="&TODAY()-30)"#),
            description: format!("Count recent entries in {}", col.header),
            cell_address: format!("{next}{}", sheet.row_count + 2),
            category: FormulaCategory::Date,
            complexity: FormulaComplexity::Intermediate,
            dependencies: vec![format!("{letter}:{letter}")],
            explanation: format!(
                "Counts how many entries in {} are from the last 30 days.",
                col.header
            ),
        });
    }

    if sheet.headers.len() > 2 {
        if let [first, second, ..] = sheet.data_types.as_slice() {
            let key = first.letter();
            let value = second.letter();
            let second_index = if second.column_index == 0 { 1 } else { second.column_index };
            let result = column_letter(second_index + 2);
            formulas.push(GeneratedFormula {
                formula: format!(r#"=XLOOKUP(A2,{key}:{key},{value}:{value},"Not Found")"#),
                description: format!("Lookup {} based on {}", second.header, first.header),
                cell_address: format!("{result}2"),
                category: FormulaCategory::Lookup,
                complexity: FormulaComplexity::Intermediate,
                dependencies: vec![
                    "A2".into(),
                    format!("{key}:{key}"),
                    format!("{value}:{value}"),
                ],
                explanation: format!(
                    "Finds the corresponding {} value for each {} entry.",
                    second.header, first.header
                ),
            });
        }
    }

    formulas
}

fn suggested_formulas(workbook: Option<&ExcelWorkbook>) -> Vec<GeneratedFormula> {
    let mut formulas = default_formulas();

    if let Some(workbook) = workbook {
        formulas.extend(workbook.sheets.iter().flat_map(sheet_formulas));

        if has_column_type(workbook, ColumnType::Date) {
            formulas.push(GeneratedFormula {
                formula: "=FILTER(Data[Product],(Data[Date]>=EOMONTH(TODAY(),-1)+1)*(Data[Date]<=EOMONTH(TODAY(),0)))".into(),
                description: "Filter current month data".into(),
                cell_address: "A10".into(),
                category: FormulaCategory::Lookup,
                complexity: FormulaComplexity::Advanced,
                dependencies: vec!["Data[Product]".into(), "Data[Date]".into()],
                explanation: "Returns all records from the current month using dynamic array formulas.".into(),
            });
        }
    }

    formulas.truncate(MAX_SUGGESTED_FORMULAS);
    formulas
}

fn step(id: &str, name: &str, operation: StepOperation, m_code: &str, description: &str) -> PowerQueryStep {
    PowerQueryStep {
        id: id.into(),
        name: name.into(),
        operation,
        m_code: m_code.into(),
        description: description.into(),
        is_applied: true,
    }
}

const STANDARDIZATION_M_CODE: &str = r#"let
    Source = Excel.CurrentWorkbook(){[Name="Table1"]}[Content],
    #"Promoted Headers" = Table.PromoteHeaders(Source, [PromoteAllScalars=true]),
    #"Trimmed Text" = Table.TransformColumns(#"Promoted Headers", {}, Text.Trim),
    #"Detected Types" = Table.DetectDataTypes(#"Trimmed Text")
in
    #"Detected Types""#;

const NUMERICAL_M_CODE: &str = r#"let
    Source = Excel.CurrentWorkbook(){[Name="Data"]}[Content],
    #"Grouped Rows" = Table.Group(Source, {"Category"}, {{"Total", each List.Sum([Amount]), type number}, {"Count", each Table.RowCount(_), type number}}),
    #"Added Percentage" = Table.AddColumn(#"Grouped Rows", "Percentage", each [Total] / List.Sum(#"Grouped Rows"[Total]) * 100)
in
    #"Added Percentage""#;

fn power_query_templates(workbook: Option<&ExcelWorkbook>) -> Vec<PowerQueryTemplate> {
    let mut templates = vec![PowerQueryTemplate {
        id: "pq_1".into(),
        name: "Data Standardization".into(),
        description: "Clean and standardize data formats across all columns".into(),
        category: QueryCategory::DataCleaning,
        steps: vec![
            step(
                "step_1",
                "Promote Headers",
                StepOperation::Headers,
                "Table.PromoteHeaders(Source, [PromoteAllScalars=true])",
                "Promote first row to column headers",
            ),
            step(
                "step_2",
                "Trim Text",
                StepOperation::Replace,
                r#"Table.TransformColumns(#"Promoted Headers", {}, Text.Trim)"#,
                "Remove leading and trailing spaces",
            ),
            step(
                "step_3",
                "Detect Data Types",
                StepOperation::DataTypes,
                r#"Table.DetectDataTypes(#"Trimmed Text")"#,
                "Automatically detect and apply proper data types",
            ),
        ],
        required_columns: Vec::new(),
        output_columns: Vec::new(),
        m_code: STANDARDIZATION_M_CODE.into(),
    }];

    if workbook.is_some_and(|w| has_column_type(w, ColumnType::Number)) {
        templates.push(PowerQueryTemplate {
            id: "pq_2".into(),
            name: "Numerical Analysis".into(),
            description: "Group and analyze numerical data with calculations".into(),
            category: QueryCategory::Analysis,
            steps: vec![
                step(
                    "step_1",
                    "Group By Category",
                    StepOperation::Group,
                    r#"Table.Group(Source, {"Category"}, {{"Total", each List.Sum([Amount]), type number}, {"Count", each Table.RowCount(_), type number}})"#,
                    "Group data and calculate totals",
                ),
                step(
                    "step_2",
                    "Add Percentage",
                    StepOperation::AddColumn,
                    r#"Table.AddColumn(#"Grouped Rows", "Percentage", each [Total] / List.Sum(#"Grouped Rows"[Total]) * 100)"#,
                    "Calculate percentage of total",
                ),
            ],
            required_columns: vec!["Category".into(), "Amount".into()],
            output_columns: vec![
                "Category".into(),
                "Total".into(),
                "Count".into(),
                "Percentage".into(),
            ],
            m_code: NUMERICAL_M_CODE.into(),
        });
    }

    templates
}

fn sheet_quality_issues(index: usize, sheet: &ExcelWorksheet) -> Vec<DataQualityIssue> {
    let mut issues = Vec::new();
    let data_rows = sheet.row_count.saturating_sub(1).max(1) as f64;

    for col in &sheet.data_types {
        let missing = col.null_count as f64 / data_rows * 100.0;
        if missing > MISSING_THRESHOLD {
            let letter = col.letter();
            issues.push(DataQualityIssue {
                id: format!("dq_null_{index}_{}", col.column_index),
                kind: IssueType::MissingData,
                severity: if missing > MISSING_HIGH_THRESHOLD {
                    Level::High
                } else {
                    Level::Medium
                },
                sheet: sheet.name.clone(),
                column: col.header.clone(),
                description: format!("{missing:.1}% missing values in {}", col.header),
                affected_cells: vec![format!("{letter}2:{letter}{}", sheet.row_count)],
                suggested_fix: "Add data validation or implement default values for required fields".into(),
            });
        }
    }

    for col in columns_of(sheet, ColumnType::Text) {
        if let (1, Some(only)) = (col.unique_count, col.sample_values.first()) {
            let letter = col.letter();
            issues.push(DataQualityIssue {
                id: format!("dq_uniform_{index}_{}", col.column_index),
                kind: IssueType::InconsistentFormat,
                severity: Level::Low,
                sheet: sheet.name.clone(),
                column: col.header.clone(),
                description: format!("{} contains only one unique value: \"{only}\"", col.header),
                affected_cells: vec![format!("{letter}2:{letter}{}", sheet.row_count)],
                suggested_fix: "Verify if this column provides meaningful data variation".into(),
            });
        }
    }

    if sheet.formula_cells.len() > 5 {
        let lookups: Vec<String> = sheet
            .formula_cells
            .iter()
            .filter(|f| {
                f.formula.contains("VLOOKUP")
                    || (f.formula.contains("INDEX") && f.formula.contains("MATCH"))
            })
            .map(|f| f.address.clone())
            .collect();
        if lookups.len() > 3 {
            issues.push(DataQualityIssue {
                id: format!("dq_complex_{index}"),
                kind: IssueType::InvalidData,
                severity: Level::Medium,
                sheet: sheet.name.clone(),
                column: "Various".into(),
                description: format!("{} complex lookup formulas detected", lookups.len()),
                affected_cells: lookups,
                suggested_fix: "Consider replacing with XLOOKUP or PowerQuery for better maintainability".into(),
            });
        }
    }

    issues
}

fn demo_quality_issues() -> Vec<DataQualityIssue> {
    vec![
        DataQualityIssue {
            id: "dq_demo_1".into(),
            kind: IssueType::MissingData,
            severity: Level::Medium,
            sheet: "Data".into(),
            column: "Important Field".into(),
            description: "Some required fields contain empty values".into(),
            affected_cells: vec!["B15".into(), "B23".into(), "B41".into()],
            suggested_fix: "Use data validation to require field entry or implement default values".into(),
        },
        DataQualityIssue {
            id: "dq_demo_2".into(),
            kind: IssueType::InconsistentFormat,
            severity: Level::Low,
            sheet: "Data".into(),
            column: "Date Field".into(),
            description: "Inconsistent date formatting detected".into(),
            affected_cells: vec!["A5".into(), "A12".into(), "A18".into()],
            suggested_fix: "Standardize date format using Format Cells dialog".into(),
        },
    ]
}

fn data_quality_issues(workbook: Option<&ExcelWorkbook>) -> Vec<DataQualityIssue> {
    let mut issues: Vec<DataQualityIssue> = workbook
        .map(|w| {
            w.sheets
                .iter()
                .enumerate()
                .flat_map(|(i, s)| sheet_quality_issues(i, s))
                .collect()
        })
        .unwrap_or_default();

    if issues.is_empty() {
        issues = demo_quality_issues();
    }
    issues.truncate(MAX_QUALITY_ISSUES);
    issues
}
