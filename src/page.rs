//! Page geometry: paper formats, orientation, CSS lengths and margins.
//!
//! Options arrive as loose strings (`"A4"`, `"landscape"`, `"20mm"`) from
//! form fields and environment variables. They are parsed once into the
//! typed values here so that the PDF stage never has to re-validate them.
//! Chromium's print API wants inches, so [`CssLength`] keeps both the
//! original text (used verbatim in CSS) and its value in inches.

use crate::error::Md2PdfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Paper format of the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    /// ISO A4, 210 × 297 mm. (default)
    #[default]
    A4,
    /// US Letter, 8.5 × 11 in.
    Letter,
    /// US Legal, 8.5 × 14 in.
    Legal,
}

impl PageFormat {
    /// Portrait `(width, height)` in inches.
    pub fn size_inches(self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (210.0 / MM_PER_INCH, 297.0 / MM_PER_INCH),
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
        }
    }
}

impl FromStr for PageFormat {
    type Err = Md2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageFormat::A4),
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            _ => Err(Md2PdfError::InvalidOption {
                field: "pageSize",
                value: s.to_string(),
                hint: "expected A4, Letter or Legal",
            }),
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PageFormat::A4 => "A4",
            PageFormat::Letter => "Letter",
            PageFormat::Legal => "Legal",
        })
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn is_landscape(self) -> bool {
        self == Orientation::Landscape
    }
}

impl FromStr for Orientation {
    type Err = Md2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(Md2PdfError::InvalidOption {
                field: "orientation",
                value: s.to_string(),
                hint: "expected portrait or landscape",
            }),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        })
    }
}

const MM_PER_INCH: f64 = 25.4;

/// An absolute CSS length such as `20mm`, `1in` or `48px`.
///
/// Accepted units: `mm`, `cm`, `in`, `px` (1/96 in), `pt` (1/72 in),
/// `pc` (1/6 in). A bare number is taken as pixels, matching what
/// browser print APIs do with unitless margins.
#[derive(Debug, Clone, PartialEq)]
pub struct CssLength {
    raw: String,
    inches: f64,
}

impl CssLength {
    /// Parse a length, reporting failures against the option `field`.
    pub fn parse(field: &'static str, s: &str) -> Result<Self, Md2PdfError> {
        let invalid = || Md2PdfError::InvalidOption {
            field,
            value: s.to_string(),
            hint: "expected a length like 20mm, 1in, 2cm, 72pt or 96px",
        };

        let raw = s.trim();
        let split = raw
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(raw.len());
        let (number, unit) = raw.split_at(split);
        let value: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }

        let inches = match unit.to_ascii_lowercase().as_str() {
            "mm" => value / MM_PER_INCH,
            "cm" => value * 10.0 / MM_PER_INCH,
            "in" => value,
            "px" | "" => value / 96.0,
            "pt" => value / 72.0,
            "pc" => value / 6.0,
            _ => return Err(invalid()),
        };

        Ok(Self {
            raw: raw.to_string(),
            inches,
        })
    }

    /// A length in millimetres, written as `<n>mm`.
    pub fn mm(value: f64) -> Self {
        Self {
            raw: format!("{value}mm"),
            inches: value / MM_PER_INCH,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn inches(&self) -> f64 {
        self.inches
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A CSS font size; relative units are allowed here, unlike margins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSize(String);

impl FontSize {
    pub(crate) fn px(value: u32) -> Self {
        Self(format!("{value}px"))
    }

    pub fn parse(s: &str) -> Result<Self, Md2PdfError> {
        let raw = s.trim();
        let split = raw
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(raw.len());
        let (number, unit) = raw.split_at(split);
        let valid_number = number.parse::<f64>().map(|v| v > 0.0).unwrap_or(false);
        let valid_unit = matches!(
            unit.to_ascii_lowercase().as_str(),
            "px" | "pt" | "em" | "rem" | "%"
        );
        if valid_number && valid_unit {
            Ok(Self(raw.to_string()))
        } else {
            Err(Md2PdfError::InvalidOption {
                field: "fontSize",
                value: s.to_string(),
                hint: "expected a size like 16px, 12pt, 1.1em, 1rem or 100%",
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four page margins.
#[derive(Debug, Clone, PartialEq)]
pub struct Margins {
    pub top: CssLength,
    pub right: CssLength,
    pub bottom: CssLength,
    pub left: CssLength,
}

impl Margins {
    /// The same length on all four sides.
    pub fn uniform(length: CssLength) -> Self {
        Self {
            top: length.clone(),
            right: length.clone(),
            bottom: length.clone(),
            left: length,
        }
    }
}

/// Placeholder used for the missing half of a header/footer pair.
///
/// Chromium only draws header and footer together; supplying an empty
/// element keeps the other band visually blank.
pub const EMPTY_TEMPLATE: &str = "<span></span>";

/// Everything the PDF stage needs to lay out pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
    pub format: PageFormat,
    pub orientation: Orientation,
    pub margins: Margins,
    /// Header HTML; empty means "no header".
    pub header_template: String,
    /// Footer HTML; empty means "no footer".
    pub footer_template: String,
}

impl PageSetup {
    /// Whether the header/footer band should be printed at all.
    pub fn displays_header_footer(&self) -> bool {
        !self.header_template.trim().is_empty() || !self.footer_template.trim().is_empty()
    }

    /// `(header, footer)` templates to hand to the browser, or `None` when
    /// the band is suppressed entirely.
    pub fn header_footer(&self) -> Option<(String, String)> {
        if !self.displays_header_footer() {
            return None;
        }
        let pick = |t: &str| {
            if t.trim().is_empty() {
                EMPTY_TEMPLATE.to_string()
            } else {
                t.to_string()
            }
        };
        Some((pick(&self.header_template), pick(&self.footer_template)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn page_format_parsing_is_case_insensitive() {
        assert_eq!("a4".parse::<PageFormat>().unwrap(), PageFormat::A4);
        assert_eq!("LETTER".parse::<PageFormat>().unwrap(), PageFormat::Letter);
        assert_eq!(" Legal ".parse::<PageFormat>().unwrap(), PageFormat::Legal);
        assert!("A0".parse::<PageFormat>().is_err());
    }

    #[test]
    fn a4_is_210_by_297_mm() {
        let (w, h) = PageFormat::A4.size_inches();
        assert!(close(w * 25.4, 210.0));
        assert!(close(h * 25.4, 297.0));
    }

    #[test]
    fn orientation_parsing() {
        assert!("Landscape".parse::<Orientation>().unwrap().is_landscape());
        assert!(!"portrait".parse::<Orientation>().unwrap().is_landscape());
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn css_length_units() {
        assert!(close(CssLength::parse("m", "25.4mm").unwrap().inches(), 1.0));
        assert!(close(CssLength::parse("m", "2.54cm").unwrap().inches(), 1.0));
        assert!(close(CssLength::parse("m", "1in").unwrap().inches(), 1.0));
        assert!(close(CssLength::parse("m", "96px").unwrap().inches(), 1.0));
        assert!(close(CssLength::parse("m", "72pt").unwrap().inches(), 1.0));
        assert!(close(CssLength::parse("m", "6pc").unwrap().inches(), 1.0));
        assert!(close(CssLength::parse("m", "48").unwrap().inches(), 0.5));
        assert_eq!(CssLength::parse("m", " 20mm ").unwrap().as_str(), "20mm");
        assert_eq!(CssLength::mm(20.0), CssLength::parse("m", "20mm").unwrap());
    }

    #[test]
    fn css_length_rejects_garbage() {
        for bad in ["", "mm", "-5mm", "10furlongs", "1e999in", "20mm; color:red"] {
            assert!(CssLength::parse("marginTop", bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn font_size_validation() {
        for good in ["16px", "12pt", "1.1em", "1rem", "100%"] {
            assert!(FontSize::parse(good).is_ok(), "{good} should parse");
        }
        for bad in ["", "big", "16", "0px", "16px}body{"] {
            assert!(FontSize::parse(bad).is_err(), "{bad:?} should fail");
        }
    }

    fn setup(header: &str, footer: &str) -> PageSetup {
        PageSetup {
            format: PageFormat::A4,
            orientation: Orientation::Portrait,
            margins: Margins::uniform(CssLength::parse("m", "20mm").unwrap()),
            header_template: header.into(),
            footer_template: footer.into(),
        }
    }

    #[test]
    fn header_footer_suppressed_when_both_empty() {
        assert_eq!(setup("", "  ").header_footer(), None);
    }

    #[test]
    fn missing_half_gets_placeholder() {
        let (h, f) = setup("", "<span class=\"pageNumber\"></span>")
            .header_footer()
            .unwrap();
        assert_eq!(h, EMPTY_TEMPLATE);
        assert!(f.contains("pageNumber"));

        let (h, f) = setup("<b>Title</b>", "").header_footer().unwrap();
        assert_eq!(h, "<b>Title</b>");
        assert_eq!(f, EMPTY_TEMPLATE);
    }
}
