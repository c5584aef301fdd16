//! Small catalogs shared by unit tests.

use super::{Catalog, ProductRecord, Review};

pub(crate) fn record(id: &str, title: &str, description: &str, price: f64) -> ProductRecord {
    ProductRecord {
        id: Some(id.into()),
        title: Some(title.into()),
        description: Some(description.into()),
        price: Some(price),
        ..Default::default()
    }
}

/// A single red shirt offered in S, M and L.
pub(crate) fn red_shirt() -> ProductRecord {
    let mut shirt = record("B001", "Red cotton shirt", "Soft cotton crew neck shirt", 15.0);
    shirt.attributes = vec!["color:red".into(), "cotton".into()];
    shirt
        .options
        .insert("size".into(), vec!["S".into(), "M".into(), "L".into()]);
    shirt.features = vec!["100% cotton".into(), "Machine washable".into()];
    shirt.reviews = vec![Review {
        rating: 5,
        text: "Fits well".into(),
    }];
    shirt
}

/// Shirt, jacket (two dimensions) and headphones (no options).
pub(crate) fn shop_catalog() -> Catalog {
    let mut jacket = record("B002", "Blue denim jacket", "Classic denim jacket", 60.0);
    jacket.attributes = vec!["denim".into()];
    jacket
        .options
        .insert("color".into(), vec!["blue".into(), "black".into()]);
    jacket
        .options
        .insert("size".into(), vec!["S".into(), "M".into(), "L".into()]);

    let mut headphones = record(
        "B003",
        "Wireless headphones",
        "Over-ear bluetooth headphones",
        80.0,
    );
    headphones.attributes = vec!["noise cancelling".into(), "color:black".into()];

    Catalog::from_records(vec![red_shirt(), jacket, headphones])
        .expect("fixture catalog is valid")
}
