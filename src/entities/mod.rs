//! Catalog entities persisted through sea-orm
pub mod attribute_choice_value;
pub mod category;
pub mod collection;
pub mod product;
pub mod product_attribute;
pub mod product_collection;
pub mod product_image;
pub mod product_type;
pub mod product_type_attribute;
pub mod product_variant;

// Re-export entities
pub use attribute_choice_value::{Entity as AttributeChoiceValue, Model as AttributeChoiceValueModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use collection::{Entity as Collection, Model as CollectionModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_attribute::{Entity as ProductAttribute, Model as ProductAttributeModel};
pub use product_collection::{Entity as ProductCollection, Model as ProductCollectionModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_type::{Entity as ProductType, Model as ProductTypeModel};
pub use product_type_attribute::{Entity as ProductTypeAttribute, Model as ProductTypeAttributeModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
