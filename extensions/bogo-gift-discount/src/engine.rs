use std::collections::HashSet;

use crate::config::DiscountConfiguration;

pub const BOGO_MESSAGE: &str = "Buy One Get One Free";
pub const GIFT_MESSAGE: &str = "Free Gift";
pub const FULL_MARKDOWN: f64 = 100.0;

// Every BOGO_GROUP_SIZE units of the main product, one is free.
const BOGO_GROUP_SIZE: i32 = 2;
const GIFT_UNITS: i32 = 1;

/// What a cart line is backed by. Only product variants take part in the discount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Merchandise<'a> {
    Product(&'a str),
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartLine<'a> {
    pub id: &'a str,
    pub quantity: i32,
    pub merchandise: Merchandise<'a>,
}

impl<'a> CartLine<'a> {
    fn product_id(&self) -> Option<&'a str> {
        match self.merchandise {
            Merchandise::Product(id) => Some(id),
            Merchandise::Other => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineTarget<'a> {
    pub line_id: &'a str,
    pub quantity: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiscountCandidate<'a> {
    pub message: &'static str,
    pub targets: Vec<LineTarget<'a>>,
    pub percentage: f64,
}

/// The engine's answer. `Empty` means no discount applies to this cart.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscountOperationSet<'a> {
    Empty,
    /// One product-discount operation; the host applies every candidate.
    ApplyAll(Vec<DiscountCandidate<'a>>),
}

impl<'a> DiscountOperationSet<'a> {
    pub fn candidates(&self) -> &[DiscountCandidate<'a>] {
        match self {
            Self::Empty => &[],
            Self::ApplyAll(candidates) => candidates,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Cart lines that matched the configuration, in cart order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Matches<'a> {
    pub main_lines: Vec<CartLine<'a>>,
    pub gift_lines: Vec<CartLine<'a>>,
}

/// Computes the discount for one cart. `trace` sees the classified lines
/// whenever the configuration is applicable; it cannot change the result.
pub fn compute<'a>(
    config: &DiscountConfiguration,
    lines: &[CartLine<'a>],
    trace: impl FnOnce(&Matches<'a>),
) -> DiscountOperationSet<'a> {
    let Some(main_product_id) = config.main_product_id.as_deref() else {
        return DiscountOperationSet::Empty;
    };
    if config.gift_product_ids.is_empty() {
        return DiscountOperationSet::Empty;
    }

    let gift_ids: HashSet<&str> = config.gift_product_ids.iter().map(String::as_str).collect();

    let mut matches = Matches::default();
    for line in lines {
        let Some(product_id) = line.product_id() else {
            continue;
        };
        if line.quantity <= 0 {
            continue;
        }

        if product_id == main_product_id {
            matches.main_lines.push(*line);
        }
        if gift_ids.contains(product_id) {
            matches.gift_lines.push(*line);
        }
    }
    trace(&matches);

    // No gifts without the qualifying purchase.
    if matches.main_lines.is_empty() {
        return DiscountOperationSet::Empty;
    }

    let mut candidates = vec![];

    let bogo_targets = allocate_free_units(&matches.main_lines);
    if !bogo_targets.is_empty() {
        candidates.push(DiscountCandidate {
            message: BOGO_MESSAGE,
            targets: bogo_targets,
            percentage: FULL_MARKDOWN,
        });
    }

    candidates.extend(matches.gift_lines.iter().map(|line| DiscountCandidate {
        message: GIFT_MESSAGE,
        targets: vec![LineTarget {
            line_id: line.id,
            quantity: GIFT_UNITS,
        }],
        percentage: FULL_MARKDOWN,
    }));

    if candidates.is_empty() {
        DiscountOperationSet::Empty
    } else {
        DiscountOperationSet::ApplyAll(candidates)
    }
}

/// Free units are counted over the main product's total quantity, then handed
/// out to its lines in cart order, never more than a line holds.
fn allocate_free_units<'a>(main_lines: &[CartLine<'a>]) -> Vec<LineTarget<'a>> {
    let total: i64 = main_lines.iter().map(|line| i64::from(line.quantity)).sum();
    let mut remaining = total / i64::from(BOGO_GROUP_SIZE);

    let mut targets = vec![];
    for line in main_lines {
        if remaining == 0 {
            break;
        }
        let units = remaining.min(i64::from(line.quantity));
        remaining -= units;
        targets.push(LineTarget {
            line_id: line.id,
            // Bounded by the line's own i32 quantity.
            quantity: units as i32,
        });
    }
    targets
}
