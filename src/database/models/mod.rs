pub mod account;
pub mod staff_user;

pub use account::{AccountRow, ContactRow};
pub use staff_user::StaffUserRow;
