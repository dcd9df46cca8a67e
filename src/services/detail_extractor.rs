use tokio::time;

use crate::{
    configuration::ScraperTimings,
    domain::{lead::normalize_phone, listing::ListingDetails},
    error::ListingSkipped,
    services::{Extraction, FieldSpec, ListingField, RenderingSurface},
};

const HEADING_SELECTOR: &str = "h1.DUwDvf, h1.fontHeadlineLarge";

pub const NAME_CHAIN: &[Extraction] = &[
    Extraction::Text("h1.DUwDvf"),
    Extraction::Text("h1.fontHeadlineLarge"),
];

pub const CATEGORY_CHAIN: &[Extraction] = &[
    Extraction::Text(r#"button[jsaction*="category"]"#),
    Extraction::Text(".DkEaL"),
];

pub const ADDRESS_CHAIN: &[Extraction] = &[
    Extraction::NestedText {
        outer: r#"button[data-item-id="address"]"#,
        inner: ".fontBodyMedium",
    },
    Extraction::Text(r#"button[data-item-id="address"]"#),
];

pub const PHONE_CHAIN: &[Extraction] = &[
    Extraction::NestedText {
        outer: r#"button[data-item-id*="phone"]"#,
        inner: ".fontBodyMedium",
    },
    Extraction::Text(r#"button[data-item-id*="phone"]"#),
];

pub const WEBSITE_CHAIN: &[Extraction] = &[Extraction::Href(r#"a[data-item-id="authority"]"#)];

pub const SOURCE_URL_CHAIN: &[Extraction] = &[Extraction::PageUrl];

pub const LISTING_FIELDS: [FieldSpec; 6] = [
    FieldSpec {
        field: ListingField::Name,
        chain: NAME_CHAIN,
    },
    FieldSpec {
        field: ListingField::Category,
        chain: CATEGORY_CHAIN,
    },
    FieldSpec {
        field: ListingField::Address,
        chain: ADDRESS_CHAIN,
    },
    FieldSpec {
        field: ListingField::Phone,
        chain: PHONE_CHAIN,
    },
    FieldSpec {
        field: ListingField::Website,
        chain: WEBSITE_CHAIN,
    },
    FieldSpec {
        field: ListingField::SourceUrl,
        chain: SOURCE_URL_CHAIN,
    },
];

/// Loads a listing's own page and reads its fields.
pub async fn extract_listing(
    surface: &mut dyn RenderingSurface,
    listing_ref: &str,
    timings: &ScraperTimings,
) -> Result<ListingDetails, ListingSkipped> {
    surface
        .navigate(listing_ref, timings.detail_navigation_timeout())
        .await?;

    if !surface
        .wait_for(HEADING_SELECTOR, timings.heading_timeout())
        .await?
    {
        time::sleep(timings.heading_grace()).await;
    }

    let mut fields = surface.extract_fields(&LISTING_FIELDS).await?;

    let Some(company_name) = fields.remove(&ListingField::Name) else {
        return Err(ListingSkipped::MissingName(listing_ref.to_string()));
    };

    Ok(ListingDetails {
        company_name: Some(company_name),
        category: fields.remove(&ListingField::Category),
        address: fields.remove(&ListingField::Address),
        phone_number: fields
            .remove(&ListingField::Phone)
            .and_then(|phone| normalize_phone(&phone)),
        website_url: fields.remove(&ListingField::Website),
        source_url: fields
            .remove(&ListingField::SourceUrl)
            .unwrap_or_else(|| listing_ref.to_string()),
    })
}
