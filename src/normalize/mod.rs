//! Field normalisation for extracted listing blocks
//!
//! This module turns [`RawFields`] into a typed [`NormalizedArticle`]:
//! - Per-field parsing with local fallbacks (see [`fields`])
//! - Link canonicalisation and content-hash identity (see [`identity`])
//! - The accept/reject decision for a whole block

pub mod fields;
pub mod identity;

pub use identity::{article_id, canonical_link, seller_id};

use crate::models::{NormalizedArticle, RawFields};
use std::fmt;

/// Reason a listing block produced no article
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The block had no detail-page link
    MissingLink,

    /// The link carries no seller identifier
    MissingSellerId { link: String },

    /// The production year could not be read
    InvalidYear { link: String, raw: Option<String> },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLink => write!(f, "listing block has no link"),
            Self::MissingSellerId { link } => write!(f, "no seller id in {}", link),
            Self::InvalidYear { link, raw } => {
                write!(f, "invalid year {:?} for {}", raw, link)
            }
        }
    }
}

/// Normalises one listing block
///
/// # Returns
///
/// * `Ok(NormalizedArticle)` - The block was accepted; phones are still empty
/// * `Err(Rejection)` - The block must be skipped entirely
pub fn normalize_article(raw: &RawFields) -> Result<NormalizedArticle, Rejection> {
    let raw_link = raw
        .link
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(Rejection::MissingLink)?;

    tracing::trace!("Normalising {}", raw_link);

    let seller_id = seller_id(raw_link).ok_or_else(|| Rejection::MissingSellerId {
        link: raw_link.to_string(),
    })?;

    let year = fields::year(raw.year.as_deref()).ok_or_else(|| Rejection::InvalidYear {
        link: raw_link.to_string(),
        raw: raw.year.clone(),
    })?;

    let price = fields::price(raw.price.as_deref());
    if raw.price.is_some() && price.is_zero() {
        tracing::debug!("Unparsable price {:?} for {}, using 0.00", raw.price, raw_link);
    }

    let mileage = fields::mileage(raw.mileage.as_deref());
    if raw.mileage.is_some() && mileage == 0 {
        tracing::debug!("Unparsable mileage {:?} for {}, using 0", raw.mileage, raw_link);
    }

    let (name, manufacturer) = fields::name_and_manufacturer(raw.name.as_deref());
    let qualifiers = fields::qualifiers(&fields::qualifier_tokens(raw.price_details.as_deref()));
    let link = canonical_link(raw_link).to_string();

    Ok(NormalizedArticle {
        id: article_id(&link),
        name,
        manufacturer,
        year,
        mileage,
        engine_capacity: fields::engine_capacity(raw.engine_capacity.as_deref()),
        engine_type: fields::fuel_type(raw.fuel_type.as_deref()),
        price,
        currency: fields::currency(raw.currency.as_deref()),
        brutto: qualifiers.brutto,
        netto: qualifiers.netto,
        negotiation: qualifiers.negotiation,
        vat_invoice: qualifiers.vat_invoice,
        location: fields::location(raw.location.as_deref()),
        link,
        seller_id,
        phones: Vec::new(),
    })
}
