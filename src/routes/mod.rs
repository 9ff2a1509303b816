pub mod address;
pub mod administrative;
pub mod cart;
pub mod checkout;
pub mod notification;
pub mod order;
pub mod product;
mod route;
pub mod user;
pub mod util;
pub mod voucher;
pub mod wishlist;

pub use address::address_route;
pub use administrative::administrative_route;
pub use cart::cart_route;
pub use checkout::checkout_route;
pub use notification::notification_route;
pub use order::order_route;
pub use product::product_route;
pub use route::main_route;
pub use user::user_route;
pub use util::util_route;
pub use voucher::voucher_route;
pub use wishlist::wishlist_route;
