mod privilege;
mod profile;
mod role;
mod user;

pub use privilege::{COMMON_SYSTEM_PRIVILEGES, PrivilegeService};
pub use profile::{ProfileService, ProfileUpdate};
pub use role::{RoleDetail, RoleService};
pub use user::{NewUser, UserDetail, UserService, UserUpdate};
