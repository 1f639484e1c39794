//! HTML parser for extracting listing blocks
//!
//! This module locates every article block of a listing page and pulls the
//! raw text of each field out of it. A missing node only blanks its own
//! field; the block is still emitted for the normaliser to judge.

use crate::models::RawFields;
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};

/// Compiled selectors for one listing page layout
#[derive(Debug)]
pub struct ArticleExtractor {
    article: Selector,
    title_link: Selector,
    price_number: Selector,
    price_currency: Selector,
    price_details: Selector,
    year: Selector,
    mileage: Selector,
    engine_capacity: Selector,
    fuel_type: Selector,
    location: Selector,
}

fn compile(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

impl ArticleExtractor {
    /// Compiles the selectors of the listing layout
    pub fn new() -> Result<Self, HarvestError> {
        const CONTENT: &str = "div.offer-item__content";
        const PRICE: &str = "div.offer-item__content > div.offer-item__price > div.offer-price";
        const PARAMS: &str = "div.offer-item__content > ul.offer-item__params";

        Ok(Self {
            article: compile("article")?,
            title_link: compile(&format!("{} > div.offer-item__title > h2 > a", CONTENT))?,
            price_number: compile(&format!("{} > span.offer-price__number", PRICE))?,
            price_currency: compile(&format!(
                "{} > span.offer-price__number > span.offer-price__currency",
                PRICE
            ))?,
            price_details: compile(&format!("{} > span.offer-price__details", PRICE))?,
            year: compile(&format!("{} > li[data-code=\"year\"] > span", PARAMS))?,
            mileage: compile(&format!("{} > li[data-code=\"mileage\"] > span", PARAMS))?,
            engine_capacity: compile(&format!(
                "{} > li[data-code=\"engine_capacity\"] > span",
                PARAMS
            ))?,
            fuel_type: compile(&format!("{} > li[data-code=\"fuel_type\"] > span", PARAMS))?,
            location: compile(&format!(
                "{} > div.offer-item__bottom-row > span.offer-item__location > h4",
                CONTENT
            ))?,
        })
    }

    /// Lazily walks the article blocks of a parsed page
    ///
    /// The iterator borrows the document and cannot be restarted.
    pub fn blocks<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = RawFields> + 'a {
        document
            .select(&self.article)
            .map(move |block| self.fields(block))
    }

    /// Parses a page body and collects its blocks
    ///
    /// The parsed document never outlives this call, so the result can be
    /// carried across await points.
    pub fn extract(&self, body: &str) -> Vec<RawFields> {
        let document = Html::parse_document(body);
        self.blocks(&document).collect()
    }

    fn fields(&self, block: ElementRef<'_>) -> RawFields {
        let link = block.select(&self.title_link).next();

        RawFields {
            name: link.map(all_text),
            link: link
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string),
            price: first_text(block, &self.price_number),
            currency: first_text(block, &self.price_currency),
            price_details: first_text(block, &self.price_details),
            year: first_text(block, &self.year),
            mileage: first_text(block, &self.mileage),
            engine_capacity: first_text(block, &self.engine_capacity),
            fuel_type: first_text(block, &self.fuel_type),
            location: first_text(block, &self.location),
        }
    }
}

fn all_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Leading text of the first matching node, excluding nested elements' text
fn first_text(block: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let element = block.select(selector).next()?;
    let text = element
        .children()
        .next()
        .and_then(|node| node.value().as_text())
        .map(|t| String::from(&**t))
        .unwrap_or_default();
    Some(text)
}
