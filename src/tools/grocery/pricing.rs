//! Cart pricing rules
//!
//! line total = unit price × quantity
//! subtotal   = Σ line totals
//! fee        = DELIVERY_FEE when subtotal < FREE_DELIVERY_THRESHOLD, else 0
//! total      = subtotal + fee
//!
//! Every step is checked; a cart whose amounts do not fit in a `u64` has no
//! price.

use serde::{Deserialize, Serialize};

/// Flat delivery surcharge in yen
pub const DELIVERY_FEE: u64 = 350;

/// Subtotal from which delivery is free
pub const FREE_DELIVERY_THRESHOLD: u64 = 2000;

/// One line of a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub price: u64,
    pub quantity: u32,
    pub total: u64,
}

impl CartLine {
    /// `None` when the line total overflows
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: u64,
        quantity: u32,
    ) -> Option<Self> {
        let total = price.checked_mul(u64::from(quantity))?;
        Some(Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
            total,
        })
    }
}

/// Totals computed for a set of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: u64,
    pub delivery_fee: u64,
    pub total: u64,
}

pub fn delivery_fee(subtotal: u64) -> u64 {
    if subtotal < FREE_DELIVERY_THRESHOLD {
        DELIVERY_FEE
    } else {
        0
    }
}

pub fn totals(lines: &[CartLine]) -> Option<CartTotals> {
    let subtotal = lines
        .iter()
        .try_fold(0u64, |acc, l| acc.checked_add(l.total))?;
    let delivery_fee = delivery_fee(subtotal);
    Some(CartTotals {
        subtotal,
        delivery_fee,
        total: subtotal.checked_add(delivery_fee)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_cart_pays_delivery() {
        let lines = vec![
            CartLine::new("a", "A", 100, 2).unwrap(),
            CartLine::new("b", "B", 50, 1).unwrap(),
        ];
        let t = totals(&lines).unwrap();
        assert_eq!(t.subtotal, 250);
        assert_eq!(t.delivery_fee, 350);
        assert_eq!(t.total, 600);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(delivery_fee(1999), DELIVERY_FEE);
        assert_eq!(delivery_fee(2000), 0);

        let t = totals(&[CartLine::new("p4", "Rice 5kg", 1980, 2).unwrap()]).unwrap();
        assert_eq!(t, CartTotals { subtotal: 3960, delivery_fee: 0, total: 3960 });
    }

    #[test]
    fn empty_cart_still_has_fee() {
        assert_eq!(totals(&[]).unwrap().total, DELIVERY_FEE);
    }

    #[test]
    fn oversized_amounts_have_no_price() {
        assert!(CartLine::new("x", "X", u64::MAX, 2).is_none());

        let lines = vec![
            CartLine::new("x", "X", u64::MAX, 1).unwrap(),
            CartLine::new("y", "Y", 1, 1).unwrap(),
        ];
        assert!(totals(&lines).is_none());

        // subtotal fits but the delivery fee does not
        let near_max = CartLine::new("z", "Z", u64::MAX - 1, 1).unwrap();
        assert!(totals(&[near_max]).is_none());
    }
}
