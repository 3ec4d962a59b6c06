use rust_decimal::Decimal;
use uuid::Uuid;

use crate::products::repo::Product;

/// One line in the cart: a product reference plus the fields needed to
/// render and check out. Never persisted on its own; at checkout each line
/// becomes an order-item snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub subject_name: String,
    pub subject_code: String,
    pub price: Decimal,
    pub image: String,
}

impl From<&Product> for CartItem {
    fn from(p: &Product) -> Self {
        Self {
            product_id: p.id,
            name: p.name.clone(),
            subject_name: p.subject_name.clone(),
            subject_code: p.subject_code.clone(),
            price: p.price,
            image: p.image.clone(),
        }
    }
}

/// Ordered collection of selected items. Adding the same product twice
/// appends a second line; lines are removed first-match-wins.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: CartItem) {
        self.items.push(item);
    }

    /// Remove the first line matching `product_id`; no-op if absent.
    pub fn remove(&mut self, product_id: Uuid) {
        if let Some(pos) = self.items.iter().position(|i| i.product_id == product_id) {
            self.items.remove(pos);
        }
    }

    /// Empty the cart. Called after a successful checkout so navigating
    /// back cannot re-submit the same lines.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of line prices, recomputed on every call so it can never drift
    /// from the current contents.
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.price)
            .sum::<Decimal>()
            .round_dp(2)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(price: &str) -> CartItem {
        CartItem {
            product_id: Uuid::new_v4(),
            name: "Linear Algebra Notes".into(),
            subject_name: "Mathematics".into(),
            subject_code: "MATH-104".into(),
            price: Decimal::from_str(price).unwrap(),
            image: "https://cdn.example.com/la.png".into(),
        }
    }

    #[test]
    fn total_matches_current_contents() {
        let mut cart = Cart::new();
        assert_eq!(cart.total(), Decimal::ZERO);

        let first = item("19.99");
        let second = item("10.00");
        cart.add(first.clone());
        cart.add(second.clone());
        assert_eq!(cart.total().to_string(), "29.99");
        assert_eq!(cart.len(), 2);

        cart.remove(first.product_id);
        assert_eq!(cart.total().to_string(), "10.00");

        cart.remove(second.product_id);
        assert_eq!(cart.total(), Decimal::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_of_absent_id_is_a_noop() {
        let mut cart = Cart::new();
        cart.add(item("5.00"));
        cart.remove(Uuid::new_v4());
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total().to_string(), "5.00");
    }

    #[test]
    fn duplicate_adds_append_distinct_lines() {
        let mut cart = Cart::new();
        let line = item("7.50");
        cart.add(line.clone());
        cart.add(line.clone());
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total().to_string(), "15.00");

        // First-match removal drops exactly one of the duplicates.
        cart.remove(line.product_id);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total().to_string(), "7.50");
    }

    #[test]
    fn clear_resets_everything() {
        let mut cart = Cart::new();
        cart.add(item("19.99"));
        cart.add(item("10.00"));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert!(cart.items().is_empty());
    }

    #[test]
    fn order_of_addition_is_preserved() {
        let mut cart = Cart::new();
        let a = item("1.00");
        let b = item("2.00");
        let c = item("3.00");
        cart.add(a.clone());
        cart.add(b.clone());
        cart.add(c.clone());
        let ids: Vec<_> = cart.items().iter().map(|i| i.product_id).collect();
        assert_eq!(ids, vec![a.product_id, b.product_id, c.product_id]);
    }
}
