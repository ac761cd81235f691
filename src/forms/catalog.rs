use validator::Validate;

use super::{FormData, FormErrors, SelectOption};
use crate::entities::{CategoryModel, CollectionModel, ProductAttributeModel, ProductTypeModel};

#[derive(Debug, Clone, Default, Validate)]
pub struct AttributeForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub title: String,
    /// Comma-separated value titles
    pub values: String,
    pub product_types: Vec<i32>,
}

impl AttributeForm {
    pub fn from_data(data: &FormData, errors: &mut FormErrors) -> Self {
        Self {
            title: data.text("title"),
            values: data.text("values"),
            product_types: data.ints("product_types", errors),
        }
    }

    pub fn from_model(
        attribute: &ProductAttributeModel,
        value_titles: &[String],
        product_types: Vec<i32>,
    ) -> Self {
        Self {
            title: attribute.title.clone(),
            values: value_titles.join(","),
            product_types,
        }
    }

    /// Trimmed value titles, empties dropped, first occurrence wins.
    pub fn value_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for value in self.values.split(',').map(str::trim) {
            if !value.is_empty() && !titles.iter().any(|t| t == value) {
                titles.push(value.to_string());
            }
        }
        titles
    }

    pub fn check(&self, product_type_choices: &[SelectOption], errors: &mut FormErrors) {
        errors.validate(self);
        errors.check_choices("product_types", &self.product_types, product_type_choices);
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CollectionForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub title: String,
    pub products: Vec<i32>,
}

impl CollectionForm {
    pub fn from_data(data: &FormData, errors: &mut FormErrors) -> Self {
        Self {
            title: data.text("title"),
            products: data.ints("products", errors),
        }
    }

    pub fn from_model(collection: &CollectionModel, products: Vec<i32>) -> Self {
        Self {
            title: collection.title.clone(),
            products,
        }
    }

    pub fn check(&self, product_choices: &[SelectOption], errors: &mut FormErrors) {
        errors.validate(self);
        errors.check_choices("products", &self.products, product_choices);
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct CategoryForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub title: String,
    /// `0` means no parent
    pub parent_id: i32,
}

impl CategoryForm {
    pub fn from_data(data: &FormData, errors: &mut FormErrors) -> Self {
        Self {
            title: data.text("title"),
            parent_id: data.int("parent_id", errors).unwrap_or(0),
        }
    }

    pub fn from_model(category: &CategoryModel) -> Self {
        Self {
            title: category.title.clone(),
            parent_id: category.parent_id.unwrap_or(0),
        }
    }

    pub fn parent(&self) -> Option<i32> {
        (self.parent_id != 0).then_some(self.parent_id)
    }

    pub fn check(
        &self,
        editing: Option<i32>,
        parent_choices: &[SelectOption],
        errors: &mut FormErrors,
    ) {
        errors.validate(self);
        if editing.is_some() && editing == self.parent() {
            errors.add("parent_id", "A category cannot be its own parent.");
        } else {
            errors.check_choice("parent_id", self.parent_id, parent_choices);
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct ProductTypeForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub title: String,
    pub has_variants: bool,
    pub is_shipping_required: bool,
    pub product_attributes: Vec<i32>,
    /// `0` means no variant attribute
    pub variant_attr_id: i32,
}

impl Default for ProductTypeForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            has_variants: true,
            is_shipping_required: false,
            product_attributes: Vec::new(),
            variant_attr_id: 0,
        }
    }
}

impl ProductTypeForm {
    pub fn from_data(data: &FormData, errors: &mut FormErrors) -> Self {
        Self {
            title: data.text("title"),
            has_variants: data.flag("has_variants"),
            is_shipping_required: data.flag("is_shipping_required"),
            product_attributes: data.ints("product_attributes", errors),
            variant_attr_id: data.int("variant_attr_id", errors).unwrap_or(0),
        }
    }

    pub fn from_model(product_type: &ProductTypeModel, product_attributes: Vec<i32>) -> Self {
        Self {
            title: product_type.title.clone(),
            has_variants: product_type.has_variants,
            is_shipping_required: product_type.is_shipping_required,
            product_attributes,
            variant_attr_id: product_type.variant_attr_id.unwrap_or(0),
        }
    }

    pub fn variant_attr(&self) -> Option<i32> {
        (self.variant_attr_id != 0).then_some(self.variant_attr_id)
    }

    /// `attribute_choices` must not contain the `0 = None` entry.
    pub fn check(&self, attribute_choices: &[SelectOption], errors: &mut FormErrors) {
        errors.validate(self);
        errors.check_choices(
            "product_attributes",
            &self.product_attributes,
            attribute_choices,
        );
        if self.variant_attr_id != 0 {
            errors.check_choice("variant_attr_id", self.variant_attr_id, attribute_choices);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{INVALID_CHOICE, REQUIRED};

    #[test]
    fn attribute_values_are_normalised() {
        let form = AttributeForm {
            title: "Size".into(),
            values: " S, M ,,L, M ,".into(),
            product_types: vec![],
        };
        assert_eq!(form.value_titles(), vec!["S", "M", "L"]);
    }

    #[test]
    fn blank_title_is_required() {
        let data = FormData::from_pairs([("title", "   ")]);
        let mut errors = FormErrors::default();
        let form = CollectionForm::from_data(&data, &mut errors);
        form.check(&[], &mut errors);
        assert_eq!(errors.messages("title"), vec![REQUIRED]);
    }

    #[test]
    fn unknown_product_type_is_rejected() {
        let data = FormData::from_pairs([("title", "Color"), ("product_types", "5")]);
        let mut errors = FormErrors::default();
        let form = AttributeForm::from_data(&data, &mut errors);
        form.check(&[SelectOption::new(1, "Shirt")], &mut errors);
        assert_eq!(errors.messages("product_types"), vec![INVALID_CHOICE]);
        assert!(!errors.has("title"));
    }

    #[test]
    fn category_cannot_parent_itself() {
        let form = CategoryForm {
            title: "Shoes".into(),
            parent_id: 3,
        };
        let choices = vec![SelectOption::none(), SelectOption::new(3, "Shoes")];
        let mut errors = FormErrors::default();
        form.check(Some(3), &choices, &mut errors);
        assert!(errors.has("parent_id"));

        let mut errors = FormErrors::default();
        form.check(None, &choices, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(form.parent(), Some(3));
    }

    #[test]
    fn product_type_checkboxes_default_off_on_submit() {
        let data = FormData::from_pairs([("title", "Book"), ("variant_attr_id", "0")]);
        let mut errors = FormErrors::default();
        let form = ProductTypeForm::from_data(&data, &mut errors);
        assert!(!form.has_variants);
        assert!(!form.is_shipping_required);
        assert_eq!(form.variant_attr(), None);
        assert!(ProductTypeForm::default().has_variants);
    }

    #[test]
    fn variant_attribute_must_be_offered() {
        let form = ProductTypeForm {
            title: "Shirt".into(),
            variant_attr_id: 8,
            ..Default::default()
        };
        let mut errors = FormErrors::default();
        form.check(&[SelectOption::new(2, "Size")], &mut errors);
        assert_eq!(errors.messages("variant_attr_id"), vec![INVALID_CHOICE]);
    }
}
