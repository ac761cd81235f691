use rust_decimal::Decimal;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use super::{FormData, FormErrors, SelectOption, REQUIRED};
use crate::entities::{product_variant, ProductModel, ProductVariantModel};

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("Number must be at least 0.".into());
        return Err(err);
    }
    Ok(())
}

/// Select input for one product attribute, named `attribute_{id}`.
#[derive(Debug, Clone)]
pub struct AttributeField {
    pub attribute_id: i32,
    pub label: String,
    pub options: Vec<SelectOption>,
}

impl AttributeField {
    pub fn name(&self) -> String {
        attribute_field_name(self.attribute_id)
    }
}

pub fn attribute_field_name(attribute_id: i32) -> String {
    format!("attribute_{attribute_id}")
}

#[derive(Debug, Clone, Validate)]
pub struct ProductForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub title: String,
    #[validate(custom = "non_negative")]
    pub basic_price: Option<Decimal>,
    pub on_sale: bool,
    pub is_featured: bool,
    #[validate(range(min = 0.0, max = 5.0, message = "Number must be between 0 and 5."))]
    pub rating: f64,
    #[validate(range(min = 0, message = "Number must be at least 0."))]
    pub sold_count: i32,
    #[validate(range(min = 0, message = "Number must be at least 0."))]
    pub review_count: i32,
    /// `0` means no category
    pub category_id: i32,
    pub description: String,
    /// Attribute id to chosen value id; unset attributes are absent
    pub attributes: BTreeMap<i32, i32>,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            basic_price: None,
            on_sale: true,
            is_featured: false,
            rating: 0.0,
            sold_count: 0,
            review_count: 0,
            category_id: 0,
            description: String::new(),
            attributes: BTreeMap::new(),
        }
    }
}

impl ProductForm {
    /// Reads the body; `attribute_ids` are the attributes offered for the product type.
    pub fn from_data(data: &FormData, attribute_ids: &[i32], errors: &mut FormErrors) -> Self {
        let mut attributes = BTreeMap::new();
        for attribute_id in attribute_ids {
            let name = attribute_field_name(*attribute_id);
            if let Some(value_id) = data.int(&name, errors).filter(|v| *v != 0) {
                attributes.insert(*attribute_id, value_id);
            }
        }

        Self {
            title: data.text("title"),
            basic_price: data.decimal("basic_price", errors),
            on_sale: data.flag("on_sale"),
            is_featured: data.flag("is_featured"),
            rating: data.float("rating", errors).unwrap_or(0.0),
            sold_count: data.int("sold_count", errors).unwrap_or(0),
            review_count: data.int("review_count", errors).unwrap_or(0),
            category_id: data.int("category_id", errors).unwrap_or(0),
            description: data.get("description").unwrap_or_default().to_string(),
            attributes,
        }
    }

    pub fn from_model(product: &ProductModel) -> Self {
        Self {
            title: product.title.clone(),
            basic_price: Some(product.basic_price),
            on_sale: product.on_sale,
            is_featured: product.is_featured,
            rating: product.rating,
            sold_count: product.sold_count,
            review_count: product.review_count,
            category_id: product.category_id.unwrap_or(0),
            description: product.description.clone(),
            attributes: product.attribute_map(),
        }
    }

    pub fn category(&self) -> Option<i32> {
        (self.category_id != 0).then_some(self.category_id)
    }

    pub fn check(
        &self,
        category_choices: &[SelectOption],
        attribute_fields: &[AttributeField],
        errors: &mut FormErrors,
    ) {
        errors.validate(self);
        if self.basic_price.is_none() && !errors.has("basic_price") {
            errors.add("basic_price", REQUIRED);
        }
        errors.check_choice("category_id", self.category_id, category_choices);
        for field in attribute_fields {
            if let Some(value_id) = self.attributes.get(&field.attribute_id) {
                errors.check_choice(&field.name(), *value_id, &field.options);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductCreateForm {
    pub product_type_id: Option<i32>,
}

impl ProductCreateForm {
    pub fn from_data(data: &FormData, errors: &mut FormErrors) -> Self {
        Self {
            product_type_id: data.int("product_type_id", errors),
        }
    }

    pub fn check(&self, product_type_choices: &[SelectOption], errors: &mut FormErrors) {
        match self.product_type_id {
            Some(id) => errors.check_choice("product_type_id", id, product_type_choices),
            None if !errors.has("product_type_id") => errors.add("product_type_id", REQUIRED),
            None => {}
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct VariantForm {
    #[validate(range(min = 1, max = 9999, message = "Number must be between 1 and 9999."))]
    pub sku_id: Option<i32>,
    #[validate(length(min = 1, message = "This field is required."))]
    pub title: String,
    #[validate(custom = "non_negative")]
    pub price_override: Decimal,
    #[validate(range(min = 0, message = "Number must be at least 0."))]
    pub quantity: i32,
    #[validate(range(min = 0, message = "Number must be at least 0."))]
    pub quantity_allocated: i32,
}

impl Default for VariantForm {
    fn default() -> Self {
        Self {
            sku_id: None,
            title: String::new(),
            price_override: Decimal::ZERO,
            quantity: 0,
            quantity_allocated: 0,
        }
    }
}

impl VariantForm {
    pub fn from_data(data: &FormData, errors: &mut FormErrors) -> Self {
        Self {
            sku_id: data.int("sku_id", errors),
            title: data.text("title"),
            price_override: data
                .decimal("price_override", errors)
                .unwrap_or(Decimal::ZERO),
            quantity: data.int("quantity", errors).unwrap_or(0),
            quantity_allocated: data.int("quantity_allocated", errors).unwrap_or(0),
        }
    }

    pub fn from_model(variant: &ProductVariantModel) -> Self {
        Self {
            sku_id: variant.sku_suffix(),
            title: variant.title.clone(),
            price_override: variant.price_override,
            quantity: variant.quantity,
            quantity_allocated: variant.quantity_allocated,
        }
    }

    pub fn sku_for(&self, product_id: i32) -> Option<String> {
        self.sku_id
            .map(|suffix| product_variant::derive_sku(product_id, suffix))
    }

    pub fn check(&self, errors: &mut FormErrors) {
        errors.validate(self);
        if self.sku_id.is_none() && !errors.has("sku_id") {
            errors.add("sku_id", REQUIRED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{INVALID_CHOICE, INVALID_DECIMAL};
    use rust_decimal_macros::dec;

    fn categories() -> Vec<SelectOption> {
        vec![SelectOption::none(), SelectOption::new(1, "Shoes")]
    }

    fn size_field() -> AttributeField {
        AttributeField {
            attribute_id: 2,
            label: "Size".into(),
            options: vec![SelectOption::new(5, "S"), SelectOption::new(6, "M")],
        }
    }

    #[test]
    fn product_form_reads_attribute_selects() {
        let data = FormData::from_pairs([
            ("title", "Runner"),
            ("basic_price", "19.90"),
            ("on_sale", "y"),
            ("category_id", "1"),
            ("attribute_2", "6"),
            ("attribute_3", "0"),
        ]);
        let mut errors = FormErrors::default();
        let form = ProductForm::from_data(&data, &[2, 3], &mut errors);
        form.check(&categories(), &[size_field()], &mut errors);

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(form.basic_price, Some(dec!(19.90)));
        assert_eq!(form.category(), Some(1));
        assert_eq!(form.attributes, BTreeMap::from([(2, 6)]));
        assert!(form.on_sale);
        assert!(!form.is_featured);
    }

    #[test]
    fn product_form_reports_each_problem() {
        let data = FormData::from_pairs([
            ("title", ""),
            ("basic_price", "cheap"),
            ("rating", "7"),
            ("sold_count", "-1"),
            ("category_id", "9"),
            ("attribute_2", "99"),
        ]);
        let mut errors = FormErrors::default();
        let form = ProductForm::from_data(&data, &[2], &mut errors);
        form.check(&categories(), &[size_field()], &mut errors);

        assert_eq!(errors.messages("title"), vec![REQUIRED]);
        assert_eq!(errors.messages("basic_price"), vec![INVALID_DECIMAL]);
        assert!(errors.has("rating"));
        assert!(errors.has("sold_count"));
        assert_eq!(errors.messages("category_id"), vec![INVALID_CHOICE]);
        assert_eq!(errors.messages("attribute_2"), vec![INVALID_CHOICE]);
    }

    #[test]
    fn missing_price_is_required_and_negative_price_rejected() {
        let mut errors = FormErrors::default();
        let form = ProductForm {
            title: "x".into(),
            ..Default::default()
        };
        form.check(&categories(), &[], &mut errors);
        assert_eq!(errors.messages("basic_price"), vec![REQUIRED]);

        let mut errors = FormErrors::default();
        let form = ProductForm {
            title: "x".into(),
            basic_price: Some(dec!(-1)),
            ..Default::default()
        };
        form.check(&categories(), &[], &mut errors);
        assert_eq!(
            errors.messages("basic_price"),
            vec!["Number must be at least 0."]
        );
    }

    #[test]
    fn create_form_requires_a_listed_type() {
        let choices = vec![SelectOption::new(1, "Shoe")];

        let mut errors = FormErrors::default();
        ProductCreateForm::default().check(&choices, &mut errors);
        assert_eq!(errors.messages("product_type_id"), vec![REQUIRED]);

        let mut errors = FormErrors::default();
        ProductCreateForm {
            product_type_id: Some(4),
        }
        .check(&choices, &mut errors);
        assert_eq!(errors.messages("product_type_id"), vec![INVALID_CHOICE]);
    }

    #[test]
    fn variant_sku_bounds() {
        let mut errors = FormErrors::default();
        let form = VariantForm {
            sku_id: Some(10_000),
            title: "Large".into(),
            ..Default::default()
        };
        form.check(&mut errors);
        assert!(errors.has("sku_id"));

        let mut errors = FormErrors::default();
        let form = VariantForm {
            sku_id: Some(12),
            title: "Large".into(),
            quantity: 3,
            ..Default::default()
        };
        form.check(&mut errors);
        assert!(errors.is_empty());
        assert_eq!(form.sku_for(7).as_deref(), Some("7-12"));

        let mut errors = FormErrors::default();
        VariantForm::default().check(&mut errors);
        assert_eq!(errors.messages("sku_id"), vec![REQUIRED]);
        assert_eq!(errors.messages("title"), vec![REQUIRED]);
    }
}
