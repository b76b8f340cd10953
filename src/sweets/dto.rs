use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateSweetRequest {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub quantity: i64,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
}

/// PATCH body; absent fields are left unchanged. An empty `image_url` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSweetRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}
