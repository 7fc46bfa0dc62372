use crate::domain::model::{Business, Review};
use serde::Serialize;

/// A typed cell, so numeric columns stay numeric in the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

impl Cell<'_> {
    /// Display width used for column sizing.
    pub fn width(&self) -> usize {
        match self {
            Cell::Text(text) => text.lines().map(|line| line.chars().count()).max().unwrap_or(0),
            Cell::Number(value) => value.to_string().len(),
        }
    }
}

pub trait TabularRow: Serialize {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<Cell<'_>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessRow {
    #[serde(rename = "Business Name")]
    pub name: String,
    #[serde(rename = "Street Address")]
    pub street_address: String,
    #[serde(rename = "Postal Code")]
    pub postal_code: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Average Rating")]
    pub avg_rating: f64,
    #[serde(rename = "Number of Reviews")]
    pub num_ratings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    #[serde(rename = "Business Name")]
    pub business_name: String,
    #[serde(rename = "Review Text")]
    pub text: String,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Time Posted")]
    pub time_posted: String,
    #[serde(rename = "Positive Points")]
    pub positive_points: String,
    #[serde(rename = "Negative Points")]
    pub negative_points: String,
    #[serde(rename = "Services Used")]
    pub services_used: String,
}

impl TabularRow for BusinessRow {
    const HEADERS: &'static [&'static str] = &[
        "Business Name",
        "Street Address",
        "Postal Code",
        "City",
        "Phone",
        "Website",
        "Average Rating",
        "Number of Reviews",
    ];

    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(&self.name),
            Cell::Text(&self.street_address),
            Cell::Text(&self.postal_code),
            Cell::Text(&self.city),
            Cell::Text(&self.phone),
            Cell::Text(&self.website),
            Cell::Number(self.avg_rating),
            Cell::Number(self.num_ratings as f64),
        ]
    }
}

impl TabularRow for ReviewRow {
    const HEADERS: &'static [&'static str] = &[
        "Business Name",
        "Review Text",
        "Rating",
        "Time Posted",
        "Positive Points",
        "Negative Points",
        "Services Used",
    ];

    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(&self.business_name),
            Cell::Text(&self.text),
            Cell::Number(self.rating),
            Cell::Text(&self.time_posted),
            Cell::Text(&self.positive_points),
            Cell::Text(&self.negative_points),
            Cell::Text(&self.services_used),
        ]
    }
}

/// The two export tables derived from a business list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub businesses: Vec<BusinessRow>,
    pub reviews: Vec<ReviewRow>,
}

pub fn tabulate(businesses: &[Business]) -> Tables {
    let mut tables = Tables::default();

    for business in businesses {
        tables.businesses.push(BusinessRow {
            name: business.name.clone(),
            street_address: business.street_address.clone(),
            postal_code: business.postal_code.clone(),
            city: business.city.clone(),
            phone: business.phone.clone().unwrap_or_default(),
            website: business.website.clone().unwrap_or_default(),
            avg_rating: business.avg_rating,
            num_ratings: business.num_ratings,
        });

        tables
            .reviews
            .extend(business.reviews.iter().map(|review| review_row(&business.name, review)));
    }

    tables
}

fn review_row(business_name: &str, review: &Review) -> ReviewRow {
    ReviewRow {
        business_name: business_name.to_string(),
        text: review.text.clone(),
        rating: review.rating,
        time_posted: review.time_posted.clone(),
        positive_points: join_lines(&review.positive_points),
        negative_points: join_lines(&review.negative_points),
        services_used: join_lines(&review.services_used),
    }
}

fn join_lines(values: &Option<Vec<String>>) -> String {
    values
        .as_ref()
        .map(|values| values.join("\n"))
        .unwrap_or_default()
}

/// Column widths: longest cell (header included) plus padding.
pub fn column_widths<R: TabularRow>(rows: &[R]) -> Vec<usize> {
    let mut widths: Vec<usize> = R::HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.width());
        }
    }
    widths.into_iter().map(|w| w + 2).collect()
}
