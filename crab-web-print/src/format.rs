//! Output formats and their print stylesheets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrintError;

/// A4 sheet: fixed page size, exact colors.
const A4_STYLESHEET: &str = r#"
@media print {
  @page {
    size: 210mm 297mm;
    margin: 10px;
  }
  html, body {
    margin: 0;
    padding: 0;
  }
  body {
    font-size: 12pt;
    line-height: 1.4;
    -webkit-print-color-adjust: exact;
    print-color-adjust: exact;
    color-adjust: exact;
  }
}
"#;

/// 80mm receipt tape: page height follows content.
const THERMAL_STYLESHEET: &str = r#"
@media print {
  @page {
    size: 80mm auto;
    margin: 5mm 10px 10px 10px;
  }
  * {
    box-sizing: border-box;
  }
  html, body {
    margin: 0;
    padding: 0;
    width: 80mm;
  }
  body {
    font-size: 10px;
    line-height: 1.2;
    -webkit-print-color-adjust: exact;
    print-color-adjust: exact;
  }
  table {
    width: 100%;
    table-layout: fixed;
    border-collapse: collapse;
    word-break: break-word;
    overflow-wrap: break-word;
  }
  .no-print {
    display: none !important;
  }
  .break-before {
    page-break-before: always;
    break-before: page;
  }
  .break-after {
    page-break-after: always;
    break-after: page;
  }
  .thermal-content {
    padding: 2mm;
    white-space: pre-wrap;
  }
}
"#;

/// Physical output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintFormat {
    /// 210mm x 297mm document
    #[default]
    A4,
    /// 80mm receipt tape
    Thermal,
}

impl PrintFormat {
    /// Lowercase selector name (`a4`, `thermal`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A4 => "a4",
            Self::Thermal => "thermal",
        }
    }

    /// Uppercase name used in status messages (`A4`, `THERMAL`)
    pub fn label(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Thermal => "THERMAL",
        }
    }

    /// Print stylesheet injected into the staged document
    pub fn stylesheet(&self) -> &'static str {
        match self {
            Self::A4 => A4_STYLESHEET,
            Self::Thermal => THERMAL_STYLESHEET,
        }
    }
}

impl fmt::Display for PrintFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrintFormat {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "thermal" => Ok(Self::Thermal),
            other => Err(PrintError::InvalidConfig(format!(
                "Unknown print format: {}",
                other
            ))),
        }
    }
}
