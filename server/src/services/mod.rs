//! Services module
//!
//! Business logic services that coordinate between the API layer, the
//! repository and the upload store.

pub mod grids;
pub mod images;
pub mod items;
pub mod spaces;
pub mod users;

pub use grids::GridsService;
pub use images::ImageLifecycle;
pub use items::ItemsService;
pub use spaces::SpacesService;
pub use users::UsersService;
