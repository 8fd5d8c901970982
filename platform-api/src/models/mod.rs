pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress};
pub use product::{Product, ProductKind, ProductStatus};
pub use user::{Identity, Permission, Role, SubscriptionPlan, User};
