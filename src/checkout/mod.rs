//! Pure checkout domain: the in-memory cart and the single-attempt
//! checkout state machine. No I/O lives here; the orders module drives
//! these types against the payment provider and the database.

pub mod cart;
pub mod flow;

pub use cart::{Cart, CartItem};
pub use flow::CheckoutFlow;
