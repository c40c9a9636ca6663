//! Product quick-create commands

use anyhow::{Context, Result};
use quickcreate_business::{CreateProduct, ProductService};
use quickcreate_core::{LookupOption, Product};
use quickcreate_persistence::ProductRepo;
use std::path::Path;

use super::open_context;
use crate::ProductAction;

/// Handle product subcommands
pub async fn handle(db_path: &Path, config: Option<&Path>, action: ProductAction) -> Result<()> {
    let (db, ctx) = open_context(db_path, config).await?;
    let service = ProductService::new(&ctx);

    match action {
        ProductAction::Create {
            reference,
            description,
            price,
            family,
            manufacturer,
            tax,
            vat_exception,
        } => {
            // Fall back to the configured default tax
            let tax = tax.or_else(|| ctx.config().default_tax.clone());
            let created = service
                .create_product(CreateProduct {
                    reference,
                    description,
                    price,
                    family,
                    manufacturer,
                    tax,
                    vat_exception,
                })
                .await?;

            println!("✅ Created product:");
            println!("   Reference:   {}", created.reference);
            println!("   Description: {}", created.description);
            println!("   Price:       {}", price);
            println!("   Product ID:  {}", created.product_id);
            println!("   Variant ID:  {}", created.variant_id);
        }

        ProductAction::Show { reference } => {
            let row = ProductRepo::find_by_reference(db.pool(), reference.trim())
                .await?
                .with_context(|| format!("Product '{}' not found", reference))?;
            let product = Product::try_from(row)?;
            let variants = ProductRepo::get_variants(db.pool(), product.id).await?;

            println!("📋 Product Details");
            println!("   Reference:     {}", product.reference);
            println!("   Description:   {}", product.description);
            println!("   Price:         {}", product.price);
            println!("   Family:        {}", product.family_code.as_deref().unwrap_or("-"));
            println!(
                "   Manufacturer:  {}",
                product.manufacturer_code.as_deref().unwrap_or("-")
            );
            println!("   Tax:           {}", product.tax_code.as_deref().unwrap_or("-"));
            println!(
                "   VAT exemption: {}",
                product.vat_exception.as_deref().unwrap_or("-")
            );

            println!("\n   Variants:");
            for variant in variants {
                println!("     - {} ({})", variant.reference, variant.price);
            }
        }

        ProductAction::Options => {
            let options = service.product_options().await?;
            print_options("Families", &options.families);
            print_options("Manufacturers", &options.manufacturers);
            print_options("Taxes", &options.taxes);
            print_options("VAT exemptions", &options.vat_exceptions);
            if let Some(tax) = options.default_tax {
                println!("Default tax: {}", tax);
            }
        }
    }

    db.close().await;
    Ok(())
}

fn print_options(title: &str, options: &[LookupOption]) {
    println!("📋 {}", title);
    if options.is_empty() {
        println!("   (none)");
    }
    for option in options {
        println!("   {:<8} {}", option.value, option.label);
    }
    println!();
}
