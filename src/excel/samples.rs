//! Downloadable sample workbooks for trying the analyzer.

use rust_xlsxwriter::Workbook;

use crate::error::AppError;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Sales,
    Inventory,
    Financial,
    /// Any unrecognised type: the sales data under a generic name.
    Generic,
}

impl SampleKind {
    /// Missing type means sales.
    pub fn from_query(kind: Option<&str>) -> Self {
        match kind.unwrap_or("sales") {
            "sales" => SampleKind::Sales,
            "inventory" => SampleKind::Inventory,
            "financial" => SampleKind::Financial,
            _ => SampleKind::Generic,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            SampleKind::Sales => "Sales_Report_Q1_2024.xlsx",
            SampleKind::Inventory => "Inventory_Management.xlsx",
            SampleKind::Financial => "Financial_Report_2024.xlsx",
            SampleKind::Generic => "Sample_Data.xlsx",
        }
    }

    fn sheets(&self) -> &'static [SheetSpec] {
        match self {
            SampleKind::Sales | SampleKind::Generic => SALES,
            SampleKind::Inventory => INVENTORY,
            SampleKind::Financial => FINANCIAL,
        }
    }
}

#[derive(Debug)]
pub struct SampleFile {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

enum Cell {
    T(&'static str),
    N(f64),
    F(&'static str),
    Blank,
}

use self::Cell::{Blank, F, N, T};

struct SheetSpec {
    name: &'static str,
    rows: &'static [&'static [Cell]],
}

const SALES: &[SheetSpec] = &[
    SheetSpec {
        name: "Sales Data",
        rows: &[
            &[T("Date"), T("Product"), T("Category"), T("Sales Rep"), T("Quantity"), T("Unit Price"), T("Total"), T("Region")],
            &[T("2024-01-15"), T("Laptop Pro"), T("Electronics"), T("John Smith"), N(2.0), N(1299.99), F("E2*F2"), T("North")],
            &[T("2024-01-16"), T("Wireless Mouse"), T("Electronics"), T("Sarah Johnson"), N(5.0), N(29.99), F("E3*F3"), T("North")],
            &[T("2024-01-17"), T("Office Chair"), T("Furniture"), T("Mike Davis"), N(3.0), N(249.99), F("E4*F4"), T("South")],
            &[T("2024-01-18"), T("Standing Desk"), T("Furniture"), T("Lisa Chen"), N(1.0), N(599.99), F("E5*F5"), T("West")],
            &[T("2024-01-19"), T("Monitor 24\""), T("Electronics"), T("John Smith"), N(4.0), N(199.99), F("E6*F6"), T("North")],
            &[T("2024-01-20"), T("Keyboard"), T("Electronics"), T("Sarah Johnson"), N(8.0), N(79.99), F("E7*F7"), T("East")],
            &[T("2024-01-21"), T("Bookshelf"), T("Furniture"), T("Mike Davis"), N(2.0), N(149.99), F("E8*F8"), T("South")],
            &[T("2024-01-22"), T("Tablet"), T("Electronics"), T("Lisa Chen"), N(3.0), N(399.99), F("E9*F9"), T("West")],
            &[T("2024-01-23"), T("Printer"), T("Electronics"), T("John Smith"), N(1.0), N(249.99), F("E10*F10"), T("North")],
            &[T("2024-01-24"), T("Desk Lamp"), T("Furniture"), T("Sarah Johnson"), N(6.0), N(39.99), F("E11*F11"), T("East")],
        ],
    },
    SheetSpec {
        name: "Summary",
        rows: &[
            &[T("Summary")],
            &[T("Total Sales"), F("SUM('Sales Data'!G2:G11)")],
            &[T("Average Sale"), F("AVERAGE('Sales Data'!G2:G11)")],
            &[T("Top Product"), F("INDEX('Sales Data'!B2:B11,MATCH(MAX('Sales Data'!G2:G11),'Sales Data'!G2:G11,0))")],
            &[],
            &[T("Sales by Category")],
            &[T("Electronics"), F("SUMIF('Sales Data'!C2:C11,\"Electronics\",'Sales Data'!G2:G11)")],
            &[T("Furniture"), F("SUMIF('Sales Data'!C2:C11,\"Furniture\",'Sales Data'!G2:G11)")],
        ],
    },
];

const INVENTORY: &[SheetSpec] = &[
    SheetSpec {
        name: "Inventory",
        rows: &[
            &[T("Product ID"), T("Product Name"), T("Category"), T("Current Stock"), T("Reorder Level"), T("Unit Cost"), T("Status")],
            &[T("P001"), T("Laptop Pro 15\""), T("Electronics"), N(25.0), N(10.0), N(899.99), F("IF(D2<=E2,\"Reorder\",\"OK\")")],
            &[T("P002"), T("Wireless Mouse"), T("Electronics"), N(150.0), N(50.0), N(19.99), F("IF(D3<=E3,\"Reorder\",\"OK\")")],
            &[T("P003"), T("Office Chair"), T("Furniture"), N(8.0), N(15.0), N(149.99), F("IF(D4<=E4,\"Reorder\",\"OK\")")],
            &[T("P004"), T("Standing Desk"), T("Furniture"), N(12.0), N(5.0), N(399.99), F("IF(D5<=E5,\"Reorder\",\"OK\")")],
            &[T("P005"), T("24\" Monitor"), T("Electronics"), N(35.0), N(20.0), N(149.99), F("IF(D6<=E6,\"Reorder\",\"OK\")")],
            &[T("P006"), T("Mechanical Keyboard"), T("Electronics"), N(45.0), N(25.0), N(89.99), F("IF(D7<=E7,\"Reorder\",\"OK\")")],
            &[T("P007"), T("Bookshelf 5-Tier"), T("Furniture"), N(6.0), N(10.0), N(99.99), F("IF(D8<=E8,\"Reorder\",\"OK\")")],
            &[T("P008"), T("Tablet 10\""), T("Electronics"), N(20.0), N(15.0), N(299.99), F("IF(D9<=E9,\"Reorder\",\"OK\")")],
        ],
    },
    SheetSpec {
        name: "Analysis",
        rows: &[
            &[T("Inventory Analysis")],
            &[T("Total Items"), F("COUNTA(Inventory!A2:A9)")],
            &[T("Items to Reorder"), F("COUNTIF(Inventory!G2:G9,\"Reorder\")")],
            &[T("Total Value"), F("SUMPRODUCT(Inventory!D2:D9,Inventory!F2:F9)")],
            &[],
            &[T("Low Stock Items")],
            &[T("Chair Products"), F("COUNTIFS(Inventory!B2:B9,\"*Chair*\")")],
        ],
    },
];

const FINANCIAL: &[SheetSpec] = &[
    SheetSpec {
        name: "Financial Data",
        rows: &[
            &[T("Month"), T("Revenue"), T("Expenses"), T("Net Income"), T("Growth %")],
            &[T("Jan 2024"), N(125000.0), N(85000.0), F("B2-C2"), Blank],
            &[T("Feb 2024"), N(132000.0), N(88000.0), F("B3-C3"), F("IF(ROW()=2,\"\",(D3-D2)/D2*100)")],
            &[T("Mar 2024"), N(145000.0), N(92000.0), F("B4-C4"), F("(D4-D3)/D3*100")],
            &[T("Apr 2024"), N(138000.0), N(89000.0), F("B5-C5"), F("(D5-D4)/D4*100")],
            &[T("May 2024"), N(156000.0), N(95000.0), F("B6-C6"), F("(D6-D5)/D5*100")],
            &[T("Jun 2024"), N(162000.0), N(98000.0), F("B7-C7"), F("(D7-D6)/D6*100")],
            &[],
            &[T("Totals"), F("SUM(B2:B7)"), F("SUM(C2:C7)"), F("SUM(D2:D7)")],
            &[T("Averages"), F("AVERAGE(B2:B7)"), F("AVERAGE(C2:C7)"), F("AVERAGE(D2:D7)"), F("AVERAGE(E3:E7)")],
        ],
    },
    SheetSpec {
        name: "KPIs",
        rows: &[
            &[T("Key Performance Indicators")],
            &[T("Metric"), T("Value"), T("Target"), T("Status")],
            &[T("Revenue Growth"), F("(('Financial Data'!B7-'Financial Data'!B2)/'Financial Data'!B2)*100"), N(15.0), F("IF(B3>C3,\"✓\",\"✗\")")],
            &[T("Profit Margin"), F("('Financial Data'!D9/'Financial Data'!B9)*100"), N(25.0), F("IF(B4>C4,\"✓\",\"✗\")")],
            &[T("Expense Ratio"), F("('Financial Data'!C9/'Financial Data'!B9)*100"), N(65.0), F("IF(B5<C5,\"✓\",\"✗\")")],
        ],
    },
];

/// Render the sample workbook for `kind` into xlsx bytes.
pub fn build_sample(kind: SampleKind) -> Result<SampleFile, AppError> {
    let bytes = render(kind.sheets()).map_err(|e| {
        tracing::error!("Error generating Excel file: {e}");
        AppError::Internal("Failed to generate Excel file".into())
    })?;

    Ok(SampleFile {
        file_name: kind.file_name(),
        bytes,
    })
}

fn render(sheets: &[SheetSpec]) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    for spec in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(spec.name)?;
        for (row, cells) in spec.rows.iter().enumerate() {
            let row = row as u32;
            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                match cell {
                    T(text) => {
                        worksheet.write_string(row, col, *text)?;
                    }
                    N(number) => {
                        worksheet.write_number(row, col, *number)?;
                    }
                    F(formula) => {
                        worksheet.write_formula(row, col, *formula)?;
                    }
                    Blank => {}
                }
            }
        }
    }
    workbook.save_to_buffer()
}
