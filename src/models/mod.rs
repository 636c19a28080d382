pub mod role;
pub mod task;
pub mod user;

pub use role::{Role, RoleRecord, ADMIN_ROLE_NAME, MEMBER_ROLE_NAME};
pub use task::{
    NewTask, OwnerSummary, StatusFilterQuery, TaskChanges, TaskInput, TaskStatus, TaskUpdateInput,
    TaskView,
};
pub use user::{NewUser, User, UserChanges, UserInput, UserUpdateInput, UserView};
