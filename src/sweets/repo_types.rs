use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Sweet record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Sweet {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: i32,
    #[serde(rename = "imageUrl", alias = "image_url")]
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated input for a new sweet.
#[derive(Debug, Clone)]
pub struct NewSweet {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
}

/// Validated partial update. `image_url: Some(None)` clears the image.
#[derive(Debug, Clone, Default)]
pub struct SweetPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub image_url: Option<Option<String>>,
}

impl SweetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.image_url.is_none()
    }

    /// Applies the provided fields onto `sweet`.
    pub fn apply(self, sweet: &mut Sweet) {
        if let Some(name) = self.name {
            sweet.name = name;
        }
        if let Some(category) = self.category {
            sweet.category = category;
        }
        if let Some(price) = self.price {
            sweet.price = price;
        }
        if let Some(quantity) = self.quantity {
            sweet.quantity = quantity;
        }
        if let Some(image_url) = self.image_url {
            sweet.image_url = image_url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladoo() -> Sweet {
        Sweet {
            id: Uuid::new_v4(),
            name: "Ladoo".into(),
            category: "Indian".into(),
            price: Decimal::new(1000, 2),
            quantity: 5,
            image_url: Some("https://img.example/ladoo.png".into()),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let mut s = ladoo();
        SweetPatch {
            price: Some(Decimal::new(1250, 2)),
            ..Default::default()
        }
        .apply(&mut s);
        assert_eq!(s.price, Decimal::new(1250, 2));
        assert_eq!(s.name, "Ladoo");
        assert_eq!(s.quantity, 5);
        assert!(s.image_url.is_some());
    }

    #[test]
    fn patch_can_clear_image() {
        let mut s = ladoo();
        SweetPatch {
            image_url: Some(None),
            ..Default::default()
        }
        .apply(&mut s);
        assert_eq!(s.image_url, None);
    }

    #[test]
    fn price_serializes_as_number() {
        let json = serde_json::to_value(ladoo()).unwrap();
        assert_eq!(json["price"], serde_json::json!(10.0));
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["imageUrl"], "https://img.example/ladoo.png");
        assert!(json.get("image_url").is_none());
    }
}
