//! Records flowing through the harvest pipeline

use rust_decimal::Decimal;

/// Unvalidated text pulled from one listing block
///
/// A `None` field means the node was missing from the block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub name: Option<String>,
    pub link: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub price_details: Option<String>,
    pub year: Option<String>,
    pub mileage: Option<String>,
    pub engine_capacity: Option<String>,
    pub fuel_type: Option<String>,
    pub location: Option<String>,
}

/// One fully normalised advertisement
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedArticle {
    /// Content hash of the canonical link
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub year: i32,
    /// Kilometres
    pub mileage: i64,
    /// Litres, rounded up to one decimal place
    pub engine_capacity: f64,
    pub engine_type: String,
    pub price: Decimal,
    pub currency: String,
    pub brutto: bool,
    pub netto: bool,
    pub negotiation: bool,
    pub vat_invoice: bool,
    pub location: String,
    /// Link with the fragment removed
    pub link: String,
    pub seller_id: String,
    /// Phone numbers in reveal-index order
    pub phones: Vec<String>,
}

/// Outcome of one concurrent page unit
#[derive(Debug)]
pub enum PageUnitResult {
    /// Accepted articles of the page; empty for non-200 pages
    Articles(Vec<NormalizedArticle>),

    /// The unit could not complete
    Failed { url: String, error: String },
}

impl PageUnitResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Articles carried by this unit (none for a failure)
    pub fn articles(&self) -> &[NormalizedArticle] {
        match self {
            Self::Articles(articles) => articles,
            Self::Failed { .. } => &[],
        }
    }
}
