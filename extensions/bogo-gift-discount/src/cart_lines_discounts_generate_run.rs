use crate::schema::CartLineTarget;
use crate::schema::CartLinesDiscountsGenerateRunResult;
use crate::schema::CartOperation;
use crate::schema::DiscountClass;
use crate::schema::Percentage;
use crate::schema::ProductDiscountCandidate;
use crate::schema::ProductDiscountCandidateTarget;
use crate::schema::ProductDiscountCandidateValue;
use crate::schema::ProductDiscountSelectionStrategy;
use crate::schema::ProductDiscountsAddOperation;

use super::schema;
use crate::config;
use crate::engine::{self, CartLine, DiscountCandidate, Matches, Merchandise};
use shopify_function::prelude::*;
use shopify_function::Result;

// Where the admin app stores the configuration. Must match the input query.
pub const CONFIGURATION_NAMESPACE: &str = "$app:example-discounts--ui-extension";
pub const CONFIGURATION_KEY: &str = "function-configuration";

#[shopify_function]
pub fn cart_lines_discounts_generate_run(
    input: schema::cart_lines_discounts_generate_run::Input,
) -> Result<CartLinesDiscountsGenerateRunResult> {
    let has_product_discount_class = input
        .discount()
        .discount_classes()
        .contains(&DiscountClass::Product);

    if !has_product_discount_class {
        log!("Skipped: discount has no PRODUCT class");
        return Ok(empty_result());
    }

    let raw = input.discount().metafield().map(|m| m.value().as_str());
    let config = config::decode(raw, |err| {
        log!("{}/{}: {}", CONFIGURATION_NAMESPACE, CONFIGURATION_KEY, err);
    });
    log!(
        "Configuration: main product {:?}, {} gift products",
        config.main_product_id,
        config.gift_product_ids.len()
    );

    let lines: Vec<CartLine<'_>> = input
        .cart()
        .lines()
        .iter()
        .map(|line| {
            use schema::cart_lines_discounts_generate_run::input::cart::lines::Merchandise as Source;

            let merchandise = match line.merchandise() {
                Source::ProductVariant(variant) => {
                    Merchandise::Product(variant.product().id().as_str())
                }
                _ => Merchandise::Other,
            };

            CartLine {
                id: line.id().as_str(),
                quantity: line.quantity().to_owned(),
                merchandise,
            }
        })
        .collect();

    let operations = engine::compute(&config, &lines, log_matches);

    if operations.is_empty() {
        log!("No discount for {} cart lines", lines.len());
        return Ok(empty_result());
    }

    let candidates = operations.candidates();
    log!("Applying {} discount candidates", candidates.len());

    Ok(CartLinesDiscountsGenerateRunResult {
        operations: vec![CartOperation::ProductDiscountsAdd(
            ProductDiscountsAddOperation {
                selection_strategy: ProductDiscountSelectionStrategy::All,
                candidates: candidates.iter().map(product_candidate).collect(),
            },
        )],
    })
}

fn log_matches(matches: &Matches<'_>) {
    let main: Vec<&str> = matches.main_lines.iter().map(|line| line.id).collect();
    let gifts: Vec<&str> = matches.gift_lines.iter().map(|line| line.id).collect();
    log!("Matched main lines {:?}, gift lines {:?}", main, gifts);
}

fn product_candidate(candidate: &DiscountCandidate<'_>) -> ProductDiscountCandidate {
    ProductDiscountCandidate {
        targets: candidate
            .targets
            .iter()
            .map(|target| {
                ProductDiscountCandidateTarget::CartLine(CartLineTarget {
                    id: target.line_id.to_string(),
                    quantity: Some(target.quantity),
                })
            })
            .collect(),
        message: Some(candidate.message.to_string()),
        value: ProductDiscountCandidateValue::Percentage(Percentage {
            value: Decimal(candidate.percentage),
        }),
        associated_discount_code: None,
    }
}

fn empty_result() -> CartLinesDiscountsGenerateRunResult {
    CartLinesDiscountsGenerateRunResult { operations: vec![] }
}
