//! Product quick-create
//!
//! Creates a product (and its default variant) from a document line, and
//! lists the options the creation form offers.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use quickcreate_core::{LookupOption, NewProduct, VatException};
use quickcreate_persistence::{LookupKind, LookupRepo, ProductRepo};
use rust_decimal::Decimal;
use serde::Serialize;

/// Request to quick-create a product
#[derive(Debug, Clone, Default)]
pub struct CreateProduct {
    pub reference: String,
    pub description: String,
    pub price: Decimal,
    pub family: Option<String>,
    pub manufacturer: Option<String>,
    pub tax: Option<String>,
    pub vat_exception: Option<String>,
}

/// Created product, as returned to the document line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreated {
    pub reference: String,
    pub product_id: i64,
    pub variant_id: i64,
    pub description: String,
}

/// Select options for the product form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOptions {
    pub families: Vec<LookupOption>,
    pub manufacturers: Vec<LookupOption>,
    pub taxes: Vec<LookupOption>,
    pub vat_exceptions: Vec<LookupOption>,
    pub default_tax: Option<String>,
}

/// Product quick-create service
pub struct ProductService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProductService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    async fn check_lookup(&self, kind: LookupKind, code: Option<&str>) -> BusinessResult<()> {
        let Some(code) = code else {
            return Ok(());
        };
        if LookupRepo::exists(self.ctx.pool(), kind, code).await? {
            Ok(())
        } else {
            Err(BusinessError::UnknownLookup {
                kind: kind.as_str().to_string(),
                code: code.to_string(),
            })
        }
    }

    /// Create a product with its default variant
    pub async fn create_product(&self, request: CreateProduct) -> BusinessResult<ProductCreated> {
        let new = NewProduct::new(&request.reference, &request.description, request.price)
            .with_family(request.family.as_deref())
            .with_manufacturer(request.manufacturer.as_deref())
            .with_tax(request.tax.as_deref())
            .with_vat_exception(request.vat_exception.as_deref());

        if new.reference.is_empty() {
            return Err(BusinessError::ReferenceRequired);
        }

        let pool = self.ctx.pool();
        if ProductRepo::reference_exists(pool, &new.reference).await? {
            return Err(BusinessError::DuplicateReference(new.reference));
        }

        self.check_lookup(LookupKind::Family, new.family_code.as_deref())
            .await?;
        self.check_lookup(LookupKind::Manufacturer, new.manufacturer_code.as_deref())
            .await?;
        self.check_lookup(LookupKind::Tax, new.tax_code.as_deref())
            .await?;
        if let Some(code) = new.vat_exception.as_deref() {
            if VatException::from_code(code).is_none() {
                return Err(BusinessError::UnknownLookup {
                    kind: "vat exception".to_string(),
                    code: code.to_string(),
                });
            }
        }

        let (product, variant) = ProductRepo::insert(pool, &new).await.map_err(|e| {
            if e.is_already_exists() {
                BusinessError::DuplicateReference(new.reference.clone())
            } else {
                e.into()
            }
        })?;

        tracing::info!(
            reference = %product.reference,
            product_id = product.id,
            variant_id = variant.id,
            "Created product"
        );
        Ok(ProductCreated {
            reference: variant.reference,
            product_id: product.id,
            variant_id: variant.id,
            description: product.description,
        })
    }

    /// Families, manufacturers, taxes and VAT exemptions for the form
    pub async fn product_options(&self) -> BusinessResult<ProductOptions> {
        let pool = self.ctx.pool();
        let options = |rows: Vec<quickcreate_persistence::LookupRow>| -> Vec<LookupOption> {
            rows.into_iter()
                .map(|row| LookupOption {
                    value: row.code,
                    label: row.label,
                })
                .collect()
        };

        Ok(ProductOptions {
            families: options(LookupRepo::get_all(pool, LookupKind::Family).await?),
            manufacturers: options(LookupRepo::get_all(pool, LookupKind::Manufacturer).await?),
            taxes: options(LookupRepo::get_all(pool, LookupKind::Tax).await?),
            vat_exceptions: VatException::options(),
            default_tax: self.ctx.config().default_tax.clone(),
        })
    }
}
