//! 领域模型
//!
//! 订单、提现、用户与余额。数据库行通过 `sqlx::FromRow` 映射，
//! 状态字段使用封闭枚举，数据库中以大写字符串存储。

mod balance;
mod enums;
mod luhn;
mod order;
mod user;
mod withdrawal;

pub use balance::Balance;
pub use enums::{AccrualStatus, OrderStatus};
pub use luhn::validate_order_number;
pub use order::Order;
pub use user::User;
pub use withdrawal::Withdrawal;
